use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The first class period of a teaching day.
pub const FIRST_PERIOD: u8 = 1;
/// The last class period of a teaching day.
pub const LAST_PERIOD: u8 = 6;

/// One attendance decision for a `(date, period, student)` triple.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttendanceStatus {
    Present,
    Absent,
    Late,
}

impl AttendanceStatus {
    /// Parses a persisted status string; unknown values read as absent.
    pub fn from_raw(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "present" => AttendanceStatus::Present,
            "late" => AttendanceStatus::Late,
            _ => AttendanceStatus::Absent,
        }
    }

    /// The canonical lowercase name for this status.
    pub fn as_str(&self) -> &'static str {
        match self {
            AttendanceStatus::Present => "present",
            AttendanceStatus::Absent => "absent",
            AttendanceStatus::Late => "late",
        }
    }

    /// Whether this status pre-populates the roster toggle as present.
    ///
    /// `late` reads as present here, but the workflow never writes `late`;
    /// only `present`/`absent` are ever produced on submit.
    pub fn counts_as_present(&self) -> bool {
        matches!(self, AttendanceStatus::Present | AttendanceStatus::Late)
    }
}

/// One persisted (or pending) attendance mark.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttendanceMark {
    /// The row id, present only once persisted.
    pub id: Option<Uuid>,
    /// The calendar day, no time component.
    pub date: NaiveDate,
    /// The period number, 1 through 6.
    pub period: u8,
    /// The roster student this mark belongs to.
    pub student_id: Uuid,
    /// The attendance decision.
    pub status: AttendanceStatus,
    /// The authoring faculty abbreviation.
    pub faculty_abbreviation: String,
}

/// The set of marks sharing a `(date, period)`, characterized by its
/// authoring abbreviation. Derived, never persisted as its own entity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeriodSession {
    pub period: u8,
    /// The abbreviation that recorded this period.
    pub taken_by: String,
}

impl PeriodSession {
    /// Whether `operator` is the author of this period.
    pub fn is_owned_by(&self, operator: &str) -> bool {
        same_author(&self.taken_by, operator)
    }
}

/// Compares two authoring abbreviations as the same identity.
///
/// Abbreviations are user-entered uppercase codes that may carry incidental
/// whitespace, so both sides are trimmed and compared case-insensitively.
pub fn same_author(a: &str, b: &str) -> bool {
    a.trim().eq_ignore_ascii_case(b.trim())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn author_comparison_trims_and_ignores_case() {
        assert!(same_author("ABC", "abc "));
        assert!(same_author(" jdo", "JDO"));
        assert!(!same_author("ABC", "XYZ"));
    }

    #[test]
    fn late_reads_as_present() {
        assert!(AttendanceStatus::Late.counts_as_present());
        assert!(AttendanceStatus::Present.counts_as_present());
        assert!(!AttendanceStatus::Absent.counts_as_present());
    }

    #[test]
    fn unknown_status_reads_as_absent() {
        assert_eq!(AttendanceStatus::from_raw("unknown"), AttendanceStatus::Absent);
        assert_eq!(AttendanceStatus::from_raw(" Present"), AttendanceStatus::Present);
        assert_eq!(AttendanceStatus::from_raw("LATE"), AttendanceStatus::Late);
    }

    #[test]
    fn period_session_ownership_uses_normalized_identity() {
        let session = PeriodSession {
            period: 3,
            taken_by: "JDO".to_string(),
        };
        assert!(session.is_owned_by("jdo "));
        assert!(!session.is_owned_by("XYZ"));
    }
}
