use std::collections::HashMap;
use std::sync::Arc;

use chrono::NaiveDate;
use futures::future::join_all;
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::models::attendance::{
    AttendanceMark, AttendanceStatus, FIRST_PERIOD, LAST_PERIOD, PeriodSession, same_author,
};
use crate::models::user::Student;
use crate::notify::Notifier;
use crate::repositories::attendance as attendance_repo;
use crate::repositories::student as student_repo;
use crate::store::RecordStore;

/// How the currently selected period relates to the operator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PeriodMode {
    /// Date and/or period not yet chosen.
    Idle,
    /// Not previously recorded; every roster student defaults to absent.
    New,
    /// Previously recorded by this operator; marks are pre-populated.
    Edit,
    /// Recorded by a different operator; submission is disallowed.
    Locked(String),
}

/// Aggregate result of a submit fan-out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubmitOutcome {
    /// Rows written successfully.
    pub recorded: usize,
    /// Rows that failed to write. Already-written rows are not rolled back.
    pub failed: usize,
    /// Whether this submission edited an already-recorded period.
    pub updated: bool,
}

/// The attendance-taking workflow for one operator.
///
/// Derived state is keyed by the selected `(date, semester, period)`; every
/// input change tears down and re-derives the relevant state from scratch
/// rather than patching incrementally, so a stale in-flight fetch can never
/// apply to a newer selection. Roster and period sizes are bounded by
/// institution size, so the refetching is cheap.
pub struct AttendanceWorkflow {
    store: Arc<dyn RecordStore>,
    notifier: Arc<dyn Notifier>,
    operator_abbreviation: String,
    date: Option<NaiveDate>,
    semester: Option<u8>,
    period: Option<u8>,
    roster: Vec<Student>,
    taken_periods: HashMap<u8, String>,
    pending: HashMap<Uuid, bool>,
    mode: PeriodMode,
}

impl AttendanceWorkflow {
    /// Creates a workflow for the operator with the given authoring
    /// abbreviation.
    pub fn new(
        store: Arc<dyn RecordStore>,
        notifier: Arc<dyn Notifier>,
        operator_abbreviation: impl Into<String>,
    ) -> Self {
        Self {
            store,
            notifier,
            operator_abbreviation: operator_abbreviation.into(),
            date: None,
            semester: None,
            period: None,
            roster: Vec::new(),
            taken_periods: HashMap::new(),
            pending: HashMap::new(),
            mode: PeriodMode::Idle,
        }
    }

    /// The currently selected semester, if any.
    pub fn semester(&self) -> Option<u8> {
        self.semester
    }

    /// The roster for the selected semester, in roll-number order.
    pub fn roster(&self) -> &[Student] {
        &self.roster
    }

    /// The pending present/absent toggles, keyed by student id.
    pub fn pending(&self) -> &HashMap<Uuid, bool> {
        &self.pending
    }

    /// How the selected period relates to the operator.
    pub fn mode(&self) -> &PeriodMode {
        &self.mode
    }

    /// Which periods on the selected date are already recorded, and by whom.
    pub fn taken_periods(&self) -> &HashMap<u8, String> {
        &self.taken_periods
    }

    /// The recorded periods for the selected date, in period order.
    pub fn period_sessions(&self) -> Vec<PeriodSession> {
        let mut sessions: Vec<PeriodSession> = self
            .taken_periods
            .iter()
            .map(|(period, taken_by)| PeriodSession {
                period: *period,
                taken_by: taken_by.clone(),
            })
            .collect();
        sessions.sort_by_key(|session| session.period);
        sessions
    }

    /// The selector label for a period, naming the author when recorded.
    pub fn period_label(&self, period: u8) -> String {
        match self.taken_periods.get(&period) {
            Some(author) => format!("Period {} (Taken by {})", period, author),
            None => format!("Period {}", period),
        }
    }

    /// Selects the semester and reloads the roster.
    ///
    /// A failed roster fetch keeps the previously rendered roster intact.
    pub async fn set_semester(&mut self, semester: u8) -> Result<()> {
        self.semester = Some(semester);
        let roster = match student_repo::list_roster_for_semester(self.store.as_ref(), semester)
            .await
        {
            Ok(roster) => roster,
            Err(e) => {
                tracing::error!("Failed to load roster for semester {}: {}", semester, e);
                self.notifier.notify_error("Failed to load student roster");
                return Err(e);
            }
        };
        tracing::debug!("Loaded {} students for semester {}", roster.len(), semester);
        self.roster = roster;
        self.derive_period_state().await
    }

    /// Selects the date and reloads which periods are already recorded.
    pub async fn set_date(&mut self, date: NaiveDate) -> Result<()> {
        self.date = Some(date);
        let taken = match attendance_repo::periods_taken_on(self.store.as_ref(), date).await {
            Ok(taken) => taken,
            Err(e) => {
                tracing::error!("Failed to load taken periods for {}: {}", date, e);
                self.notifier.notify_error("Failed to load recorded periods");
                return Err(e);
            }
        };
        self.taken_periods = taken;
        self.derive_period_state().await
    }

    /// Selects the period and re-derives the free/own/locked state.
    pub async fn set_period(&mut self, period: u8) -> Result<()> {
        if !(FIRST_PERIOD..=LAST_PERIOD).contains(&period) {
            return Err(AppError::Validation(format!(
                "Period must be between {} and {}",
                FIRST_PERIOD, LAST_PERIOD
            )));
        }
        self.period = Some(period);
        self.derive_period_state().await
    }

    /// Flips a single student's pending mark in memory; no I/O.
    pub fn toggle_one(&mut self, student_id: Uuid, present: bool) {
        if matches!(self.mode, PeriodMode::Locked(_)) {
            tracing::warn!("Ignoring toggle on a locked period");
            return;
        }
        if self.roster.iter().any(|s| s.id == student_id) {
            self.pending.insert(student_id, present);
        }
    }

    /// Sets every roster student's pending mark to the same value; no I/O.
    pub fn mark_all(&mut self, present: bool) {
        if matches!(self.mode, PeriodMode::Locked(_)) {
            tracing::warn!("Ignoring mark-all on a locked period");
            return;
        }
        self.pending = self.roster.iter().map(|s| (s.id, present)).collect();
    }

    /// Reconciles every pending mark against the store.
    ///
    /// The lock is re-checked against the store immediately before writing;
    /// existing rows are updated and missing rows inserted, each write
    /// independent of the others. Partial failure is tolerated: written
    /// rows stay written and an aggregate warning is reported.
    pub async fn submit(&mut self) -> Result<SubmitOutcome> {
        let (Some(date), Some(period)) = (self.date, self.period) else {
            return Err(AppError::Validation(
                "Select a date and period before submitting".to_string(),
            ));
        };
        if self.roster.is_empty() {
            return Err(AppError::Validation(
                "No students found for the selected semester".to_string(),
            ));
        }

        // Another operator may have recorded this period since the state
        // was derived.
        if let Some(author) =
            attendance_repo::period_author(self.store.as_ref(), date, period).await?
            && !same_author(&author, &self.operator_abbreviation)
        {
            tracing::warn!("❌ Period {} already taken by {}", period, author);
            self.taken_periods.insert(period, author.clone());
            self.mode = PeriodMode::Locked(author.clone());
            self.notifier
                .notify_error(&format!("Period {} is already taken by {}", period, author));
            return Err(AppError::PeriodTaken {
                period,
                taken_by: author,
            });
        }

        let ids: Vec<Uuid> = self.roster.iter().map(|s| s.id).collect();
        let existing =
            attendance_repo::marks_for_period(self.store.as_ref(), date, period, &ids).await?;
        let existing_ids: HashMap<Uuid, Uuid> = existing
            .iter()
            .filter_map(|mark| mark.id.map(|id| (mark.student_id, id)))
            .collect();

        let was_edit = matches!(self.mode, PeriodMode::Edit);
        let store = self.store.as_ref();

        // Independent best-effort fan-out: one failed write must not abort
        // or roll back the others.
        let writes = self.roster.iter().map(|student| {
            let student_id = student.id;
            let status = if self.pending.get(&student_id).copied().unwrap_or(false) {
                AttendanceStatus::Present
            } else {
                AttendanceStatus::Absent
            };
            let existing_id = existing_ids.get(&student_id).copied();
            let faculty_abbreviation = self.operator_abbreviation.clone();
            async move {
                match existing_id {
                    Some(row_id) => {
                        attendance_repo::update_mark_status(store, &row_id, status).await
                    }
                    None => attendance_repo::insert_mark(
                        store,
                        &AttendanceMark {
                            id: None,
                            date,
                            period,
                            student_id,
                            status,
                            faculty_abbreviation,
                        },
                    )
                    .await
                    .map(|_| ()),
                }
            }
        });
        let results = join_all(writes).await;

        let failed = results.iter().filter(|r| r.is_err()).count();
        for error in results.iter().filter_map(|r| r.as_ref().err()) {
            tracing::error!("Attendance write failed: {}", error);
        }

        if failed > 0 {
            self.notifier
                .notify_error("Some attendance records failed to save");
        } else if was_edit {
            self.notifier.notify_success("Attendance updated!");
        } else {
            self.notifier.notify_success("Attendance submitted!");
        }
        tracing::info!(
            "✅ Attendance fan-out for {} period {}: {} written, {} failed",
            date,
            period,
            results.len() - failed,
            failed
        );

        // Optimistic local patch: reflect the period as our own immediately,
        // without a refetch; the next selection change reconciles.
        self.taken_periods
            .insert(period, self.operator_abbreviation.clone());
        self.mode = PeriodMode::Edit;

        Ok(SubmitOutcome {
            recorded: results.len() - failed,
            failed,
            updated: was_edit,
        })
    }

    /// Re-derives the free/own/locked state for the current selection.
    async fn derive_period_state(&mut self) -> Result<()> {
        let (Some(date), Some(period)) = (self.date, self.period) else {
            self.mode = PeriodMode::Idle;
            self.pending.clear();
            return Ok(());
        };

        match self.taken_periods.get(&period).cloned() {
            None => {
                self.mode = PeriodMode::New;
                self.pending = self.roster.iter().map(|s| (s.id, false)).collect();
            }
            Some(author) if same_author(&author, &self.operator_abbreviation) => {
                let ids: Vec<Uuid> = self.roster.iter().map(|s| s.id).collect();
                let marks = match attendance_repo::marks_for_period(
                    self.store.as_ref(),
                    date,
                    period,
                    &ids,
                )
                .await
                {
                    Ok(marks) => marks,
                    Err(e) => {
                        tracing::error!("Failed to load existing marks: {}", e);
                        self.notifier
                            .notify_error("Failed to load existing attendance");
                        return Err(e);
                    }
                };
                let by_student: HashMap<Uuid, AttendanceStatus> =
                    marks.iter().map(|m| (m.student_id, m.status)).collect();
                // `late` pre-populates as present; the toggle stays binary.
                self.pending = self
                    .roster
                    .iter()
                    .map(|s| {
                        let present = by_student
                            .get(&s.id)
                            .map(AttendanceStatus::counts_as_present)
                            .unwrap_or(false);
                        (s.id, present)
                    })
                    .collect();
                self.mode = PeriodMode::Edit;
            }
            Some(author) => {
                tracing::debug!("Period {} locked by {}", period, author);
                self.mode = PeriodMode::Locked(author);
                self.pending.clear();
            }
        }
        Ok(())
    }
}
