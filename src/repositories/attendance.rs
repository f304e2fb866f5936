use std::collections::HashMap;

use chrono::NaiveDate;
use serde_json::{Value, json};
use uuid::Uuid;

use super::row::{date_field, str_field, u8_field, uuid_field};
use crate::error::Result;
use crate::models::attendance::{AttendanceMark, AttendanceStatus};
use crate::store::{Filter, RecordStore, collections};

/// A helper function to map a row to an `AttendanceMark`.
fn row_to_mark(row: &Value) -> Result<AttendanceMark> {
    Ok(AttendanceMark {
        id: Some(uuid_field(row, "id")?),
        date: date_field(row, "date")?,
        period: u8_field(row, "period")?,
        student_id: uuid_field(row, "student_id")?,
        status: AttendanceStatus::from_raw(&str_field(row, "status")?),
        faculty_abbreviation: str_field(row, "faculty_abbreviation")?,
    })
}

/// Maps each already-recorded period on `date` to its authoring
/// abbreviation. The first row seen for a period wins; a period session has
/// a single author by construction.
pub async fn periods_taken_on(
    store: &dyn RecordStore,
    date: NaiveDate,
) -> Result<HashMap<u8, String>> {
    let rows = store
        .select(
            collections::ATTENDANCE,
            &Filter::new().eq("date", date.to_string()),
        )
        .await?;

    let mut taken = HashMap::new();
    for row in &rows {
        let period = u8_field(row, "period")?;
        let author = str_field(row, "faculty_abbreviation")?;
        taken.entry(period).or_insert(author);
    }
    Ok(taken)
}

/// The authoring abbreviation for `(date, period)`, if any row exists.
pub async fn period_author(
    store: &dyn RecordStore,
    date: NaiveDate,
    period: u8,
) -> Result<Option<String>> {
    let rows = store
        .select(
            collections::ATTENDANCE,
            &Filter::new()
                .eq("date", date.to_string())
                .eq("period", period as i64),
        )
        .await?;
    rows.first()
        .map(|row| str_field(row, "faculty_abbreviation"))
        .transpose()
}

/// Fetches, in one query, all marks for `(date, period)` restricted to the
/// given roster student ids.
pub async fn marks_for_period(
    store: &dyn RecordStore,
    date: NaiveDate,
    period: u8,
    student_ids: &[Uuid],
) -> Result<Vec<AttendanceMark>> {
    let ids = student_ids
        .iter()
        .map(|id| json!(id.to_string()))
        .collect::<Vec<_>>();
    let rows = store
        .select(
            collections::ATTENDANCE,
            &Filter::new()
                .eq("date", date.to_string())
                .eq("period", period as i64)
                .is_in("student_id", ids),
        )
        .await?;
    rows.iter().map(row_to_mark).collect()
}

/// Inserts a new mark, returning the persisted row.
pub async fn insert_mark(store: &dyn RecordStore, mark: &AttendanceMark) -> Result<AttendanceMark> {
    let row = store
        .insert(
            collections::ATTENDANCE,
            json!({
                "date": mark.date.to_string(),
                "period": mark.period as i64,
                "student_id": mark.student_id.to_string(),
                "status": mark.status.as_str(),
                "faculty_abbreviation": mark.faculty_abbreviation,
            }),
        )
        .await?;
    row_to_mark(&row)
}

/// Updates the status of an existing mark.
pub async fn update_mark_status(
    store: &dyn RecordStore,
    id: &Uuid,
    status: AttendanceStatus,
) -> Result<()> {
    store
        .update(
            collections::ATTENDANCE,
            id,
            json!({ "status": status.as_str() }),
        )
        .await?;
    Ok(())
}
