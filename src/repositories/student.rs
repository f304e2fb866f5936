use serde_json::Value;
use uuid::Uuid;

use super::row::{opt_str_field, opt_u8_field, str_field, u8_field, uuid_field};
use crate::error::Result;
use crate::models::user::{Student, StudentDetail};
use crate::store::{Filter, RecordStore, collections};

/// A helper function to map a row to a roster `Student`.
fn row_to_student(row: &Value) -> Result<Student> {
    Ok(Student {
        id: uuid_field(row, "id")?,
        name: str_field(row, "name")?,
        roll_no: str_field(row, "roll_no")?,
        semester: u8_field(row, "semester")?,
    })
}

/// A helper function to map a row to a `StudentDetail`.
fn row_to_detail(row: &Value) -> Result<StudentDetail> {
    Ok(StudentDetail {
        roll_no: str_field(row, "roll_no")?,
        semester: u8_field(row, "semester")?,
        year: opt_u8_field(row, "year"),
        status: opt_str_field(row, "status"),
        phone: opt_str_field(row, "phone"),
        address: opt_str_field(row, "address"),
    })
}

/// Finds the student detail record for an issuer principal.
pub async fn find_detail_by_user_id(
    store: &dyn RecordStore,
    user_id: &Uuid,
) -> Result<Option<StudentDetail>> {
    let rows = store
        .select(
            collections::STUDENTS,
            &Filter::new().eq("user_id", user_id.to_string()),
        )
        .await?;
    rows.first().map(row_to_detail).transpose()
}

/// Lists the roster for a semester, in roll-number order.
pub async fn list_roster_for_semester(
    store: &dyn RecordStore,
    semester: u8,
) -> Result<Vec<Student>> {
    let rows = store
        .select(
            collections::STUDENTS,
            &Filter::new().eq("semester", semester as i64),
        )
        .await?;
    let mut roster = rows
        .iter()
        .map(row_to_student)
        .collect::<Result<Vec<_>>>()?;
    roster.sort_by(|a, b| a.roll_no.cmp(&b.roll_no));
    Ok(roster)
}
