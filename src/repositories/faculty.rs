use serde_json::Value;
use uuid::Uuid;

use super::row::{opt_str_field, str_field};
use crate::error::Result;
use crate::models::user::FacultyDetail;
use crate::store::{Filter, RecordStore, collections};

/// A helper function to map a row to a `FacultyDetail`.
fn row_to_detail(row: &Value) -> Result<FacultyDetail> {
    Ok(FacultyDetail {
        branch: opt_str_field(row, "branch"),
        abbreviation: str_field(row, "abbreviation")?,
        phone: opt_str_field(row, "phone"),
        status: opt_str_field(row, "status"),
    })
}

/// Finds the faculty detail record for an issuer principal.
pub async fn find_detail_by_user_id(
    store: &dyn RecordStore,
    user_id: &Uuid,
) -> Result<Option<FacultyDetail>> {
    let rows = store
        .select(
            collections::FACULTY,
            &Filter::new().eq("user_id", user_id.to_string()),
        )
        .await?;
    rows.first().map(row_to_detail).transpose()
}
