use serde_json::Value;
use uuid::Uuid;

use super::row::{opt_str_field, str_field, uuid_field};
use crate::error::Result;
use crate::models::user::Profile;
use crate::store::{Filter, RecordStore, collections};

/// A helper function to map a row to a `Profile`.
fn row_to_profile(row: &Value) -> Result<Profile> {
    Ok(Profile {
        user_id: uuid_field(row, "user_id")?,
        role: str_field(row, "role")?,
        name: str_field(row, "name")?,
        avatar_url: opt_str_field(row, "avatar_url"),
    })
}

/// Finds the profile for an issuer principal.
pub async fn find_by_user_id(store: &dyn RecordStore, user_id: &Uuid) -> Result<Option<Profile>> {
    let rows = store
        .select(
            collections::PROFILES,
            &Filter::new().eq("user_id", user_id.to_string()),
        )
        .await?;
    rows.first().map(row_to_profile).transpose()
}
