mod common;

use campus_core::AppError;
use campus_core::services::attendance::{AttendanceWorkflow, PeriodMode};
use chrono::NaiveDate;
use common::TestBackend;
use uuid::Uuid;

const DATE: &str = "2024-03-01";

fn date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 3, 1).expect("valid date")
}

fn workflow(backend: &TestBackend, operator: &str) -> AttendanceWorkflow {
    AttendanceWorkflow::new(backend.store.clone(), backend.notifier.clone(), operator)
}

fn seed_roster(backend: &TestBackend) -> (Uuid, Uuid, Uuid) {
    let s1 = backend.seed_roster_student(2, "21CS001", "Asha Rao");
    let s2 = backend.seed_roster_student(2, "21CS002", "Ben Thomas");
    let s3 = backend.seed_roster_student(2, "21CS003", "Chitra Nair");
    (s1, s2, s3)
}

fn status_of(backend: &TestBackend, student: Uuid) -> String {
    backend
        .marks_on(DATE, 3)
        .iter()
        .find(|row| row.get("student_id").and_then(|v| v.as_str()) == Some(student.to_string().as_str()))
        .and_then(|row| row.get("status").and_then(|v| v.as_str()))
        .expect("student row should exist")
        .to_string()
}

#[tokio::test]
async fn fresh_period_submits_inserts_for_the_whole_roster() {
    let backend = TestBackend::new();
    let (s1, _, _) = seed_roster(&backend);
    let mut workflow = workflow(&backend, "JDO");

    workflow.set_semester(2).await.expect("roster loads");
    workflow.set_date(date()).await.expect("periods load");
    workflow.set_period(3).await.expect("state derives");

    assert_eq!(workflow.semester(), Some(2));
    assert_eq!(*workflow.mode(), PeriodMode::New);
    assert_eq!(workflow.pending().len(), 3);
    assert!(workflow.pending().values().all(|present| !present));

    workflow.toggle_one(s1, true);
    let outcome = workflow.submit().await.expect("submit succeeds");

    assert_eq!(outcome.recorded, 3);
    assert_eq!(outcome.failed, 0);
    assert!(!outcome.updated);
    assert_eq!(
        backend.notifier.last_success().as_deref(),
        Some("Attendance submitted!")
    );
    assert_eq!(backend.marks_on(DATE, 3).len(), 3);
    assert_eq!(status_of(&backend, s1), "present");
    // Optimistic local patch: the period reads as ours without a refetch.
    assert_eq!(workflow.period_label(3), "Period 3 (Taken by JDO)");
    assert_eq!(*workflow.mode(), PeriodMode::Edit);
    let sessions = workflow.period_sessions();
    assert!(sessions.iter().any(|s| s.period == 3 && s.is_owned_by("jdo")));
}

#[tokio::test]
async fn revisiting_an_own_period_prepopulates_and_updates_in_place() {
    let backend = TestBackend::new();
    let (s1, s2, s3) = seed_roster(&backend);
    backend.seed_mark(DATE, 3, s1, "present", "JDO");
    backend.seed_mark(DATE, 3, s2, "absent", "JDO");
    backend.seed_mark(DATE, 3, s3, "absent", "JDO");

    let mut workflow = workflow(&backend, "JDO");
    workflow.set_semester(2).await.expect("roster loads");
    workflow.set_date(date()).await.expect("periods load");
    workflow.set_period(3).await.expect("state derives");

    assert_eq!(*workflow.mode(), PeriodMode::Edit);
    assert_eq!(workflow.pending().get(&s1), Some(&true));
    assert_eq!(workflow.pending().get(&s2), Some(&false));
    assert_eq!(workflow.pending().get(&s3), Some(&false));

    workflow.toggle_one(s2, true);
    let outcome = workflow.submit().await.expect("resubmit succeeds");

    assert!(outcome.updated);
    assert_eq!(
        backend.notifier.last_success().as_deref(),
        Some("Attendance updated!")
    );
    // Exactly one row per (date, period, student): updates, not duplicates.
    assert_eq!(backend.marks_on(DATE, 3).len(), 3);
    assert_eq!(status_of(&backend, s1), "present");
    assert_eq!(status_of(&backend, s2), "present");
    assert_eq!(status_of(&backend, s3), "absent");
}

#[tokio::test]
async fn late_marks_prepopulate_as_present_but_are_never_written_back() {
    let backend = TestBackend::new();
    let (s1, s2, _) = seed_roster(&backend);
    backend.seed_mark(DATE, 3, s1, "late", "JDO");
    backend.seed_mark(DATE, 3, s2, "absent", "JDO");

    let mut workflow = workflow(&backend, "JDO");
    workflow.set_semester(2).await.expect("roster loads");
    workflow.set_date(date()).await.expect("periods load");
    workflow.set_period(3).await.expect("state derives");

    // Reading treats late as present.
    assert_eq!(workflow.pending().get(&s1), Some(&true));

    workflow.submit().await.expect("resubmit succeeds");

    // Writing only ever produces present/absent.
    assert_eq!(status_of(&backend, s1), "present");
    assert!(
        backend
            .marks_on(DATE, 3)
            .iter()
            .all(|row| row.get("status").and_then(|v| v.as_str()) != Some("late"))
    );
}

#[tokio::test]
async fn foreign_period_is_locked_before_any_write() {
    let backend = TestBackend::new();
    let (s1, _, _) = seed_roster(&backend);
    backend.seed_mark(DATE, 3, s1, "present", "JDO");

    let mut workflow = workflow(&backend, "XYZ");
    workflow.set_semester(2).await.expect("roster loads");
    workflow.set_date(date()).await.expect("periods load");
    workflow.set_period(3).await.expect("state derives");

    assert_eq!(*workflow.mode(), PeriodMode::Locked("JDO".to_string()));
    assert_eq!(workflow.period_label(3), "Period 3 (Taken by JDO)");

    // Toggles on a locked period are inert.
    workflow.toggle_one(s1, true);
    assert!(workflow.pending().is_empty());

    let result = workflow.submit().await;
    assert!(matches!(
        result,
        Err(AppError::PeriodTaken { period: 3, ref taken_by }) if taken_by == "JDO"
    ));
    assert_eq!(
        backend.notifier.last_error().as_deref(),
        Some("Period 3 is already taken by JDO")
    );
    assert_eq!(backend.marks_on(DATE, 3).len(), 1);
}

#[tokio::test]
async fn author_identity_is_trimmed_and_case_insensitive() {
    let backend = TestBackend::new();
    let (s1, _, _) = seed_roster(&backend);
    backend.seed_mark(DATE, 3, s1, "present", "ABC");

    // Same identity after normalization: editable, submit allowed.
    let mut own = workflow(&backend, "abc ");
    own.set_semester(2).await.expect("roster loads");
    own.set_date(date()).await.expect("periods load");
    own.set_period(3).await.expect("state derives");
    assert_eq!(*own.mode(), PeriodMode::Edit);
    own.submit().await.expect("same identity may edit");

    // A different identity stays rejected.
    let mut other = workflow(&backend, "XYZ");
    other.set_semester(2).await.expect("roster loads");
    other.set_date(date()).await.expect("periods load");
    other.set_period(3).await.expect("state derives");
    assert!(matches!(
        other.submit().await,
        Err(AppError::PeriodTaken { .. })
    ));
}

#[tokio::test]
async fn lock_is_rechecked_immediately_before_writing() {
    let backend = TestBackend::new();
    let (s1, _, _) = seed_roster(&backend);

    let mut workflow = workflow(&backend, "XYZ");
    workflow.set_semester(2).await.expect("roster loads");
    workflow.set_date(date()).await.expect("periods load");
    workflow.set_period(3).await.expect("state derives");
    assert_eq!(*workflow.mode(), PeriodMode::New);

    // Another operator records the period after our state was derived.
    backend.seed_mark(DATE, 3, s1, "present", "JDO");

    let result = workflow.submit().await;
    assert!(matches!(result, Err(AppError::PeriodTaken { .. })));
    assert_eq!(*workflow.mode(), PeriodMode::Locked("JDO".to_string()));
    // No write of ours went through.
    assert!(
        backend
            .marks_on(DATE, 3)
            .iter()
            .all(|row| row.get("faculty_abbreviation").and_then(|v| v.as_str()) == Some("JDO"))
    );
}

#[tokio::test]
async fn one_failed_write_does_not_roll_back_the_others() {
    let backend = TestBackend::new();
    let s1 = backend.seed_roster_student(2, "21CS001", "Asha Rao");
    let s2 = backend.seed_roster_student(2, "21CS002", "Ben Thomas");
    backend
        .store
        .fail_when("attendance", "student_id", s1.to_string());

    let mut workflow = workflow(&backend, "JDO");
    workflow.set_semester(2).await.expect("roster loads");
    workflow.set_date(date()).await.expect("periods load");
    workflow.set_period(3).await.expect("state derives");
    workflow.mark_all(true);

    let outcome = workflow.submit().await.expect("partial failure still completes");

    assert_eq!(outcome.recorded, 1);
    assert_eq!(outcome.failed, 1);
    assert_eq!(
        backend.notifier.last_error().as_deref(),
        Some("Some attendance records failed to save")
    );
    let rows = backend.marks_on(DATE, 3);
    assert_eq!(rows.len(), 1);
    assert_eq!(
        rows[0].get("student_id").and_then(|v| v.as_str()),
        Some(s2.to_string().as_str())
    );
    // The period still flips to ours locally, even on partial failure.
    assert_eq!(*workflow.mode(), PeriodMode::Edit);
}

#[tokio::test]
async fn mark_all_round_trip_leaves_every_student_absent() {
    let backend = TestBackend::new();
    seed_roster(&backend);

    let mut workflow = workflow(&backend, "JDO");
    workflow.set_semester(2).await.expect("roster loads");
    workflow.set_date(date()).await.expect("periods load");
    workflow.set_period(3).await.expect("state derives");

    workflow.mark_all(true);
    assert!(workflow.pending().values().all(|present| *present));
    workflow.mark_all(false);

    assert_eq!(workflow.pending().len(), 3);
    assert!(workflow.pending().values().all(|present| !present));
}

#[tokio::test]
async fn submit_requires_a_selection_and_a_roster() {
    let backend = TestBackend::new();

    let mut unselected = workflow(&backend, "JDO");
    assert!(matches!(
        unselected.submit().await,
        Err(AppError::Validation(_))
    ));

    // Date and period chosen, but the semester has no students.
    let mut empty = workflow(&backend, "JDO");
    empty.set_semester(7).await.expect("empty roster loads");
    empty.set_date(date()).await.expect("periods load");
    empty.set_period(3).await.expect("state derives");
    assert!(matches!(empty.submit().await, Err(AppError::Validation(_))));
}

#[tokio::test]
async fn out_of_range_periods_are_rejected() {
    let backend = TestBackend::new();
    let mut workflow = workflow(&backend, "JDO");
    assert!(matches!(
        workflow.set_period(0).await,
        Err(AppError::Validation(_))
    ));
    assert!(matches!(
        workflow.set_period(7).await,
        Err(AppError::Validation(_))
    ));
}

#[tokio::test]
async fn reselecting_inputs_rederives_state_from_scratch() {
    let backend = TestBackend::new();
    let (s1, _, _) = seed_roster(&backend);
    backend.seed_mark(DATE, 2, s1, "present", "JDO");

    let mut workflow = workflow(&backend, "JDO");
    workflow.set_semester(2).await.expect("roster loads");
    workflow.set_date(date()).await.expect("periods load");

    workflow.set_period(2).await.expect("state derives");
    assert_eq!(*workflow.mode(), PeriodMode::Edit);
    assert_eq!(workflow.pending().get(&s1), Some(&true));

    // Moving to a free period resets the pending map to all-absent.
    workflow.set_period(4).await.expect("state derives");
    assert_eq!(*workflow.mode(), PeriodMode::New);
    assert!(workflow.pending().values().all(|present| !present));

    let taken = workflow.taken_periods();
    assert_eq!(taken.get(&2).map(String::as_str), Some("JDO"));
    assert!(!taken.contains_key(&4));
}

#[tokio::test]
async fn failed_roster_fetch_keeps_the_previous_roster() {
    let backend = TestBackend::new();
    seed_roster(&backend);

    let mut workflow = workflow(&backend, "JDO");
    workflow.set_semester(2).await.expect("roster loads");
    assert_eq!(workflow.roster().len(), 3);

    backend.store.fail_reads_for("students");
    assert!(workflow.set_semester(3).await.is_err());

    // The previously rendered roster is left intact.
    assert_eq!(workflow.roster().len(), 3);
    assert_eq!(
        backend.notifier.last_error().as_deref(),
        Some("Failed to load student roster")
    );
}
