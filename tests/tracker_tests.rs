use chrono::TimeDelta;
use rtimeclock::core::gateway::SessionGateway;
use rtimeclock::core::tracker::{ClockInInput, LoadOutcome, OpOutcome, SkipReason};
use rtimeclock::models::break_kind::BreakKind;
use rtimeclock::models::project_time::{ProjectTime, SessionNotes};
use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::Duration;

mod common;
use common::{at, fixture, key};

#[tokio::test]
async fn load_without_open_session_is_idle() {
    let fx = fixture(at(9, 0));

    let outcome = fx.tracker.load_employee("alice").await.unwrap();
    assert_eq!(outcome, LoadOutcome::Loaded);

    let state = fx.tracker.snapshot();
    assert_eq!(state.employee, Some(key("alice")));
    assert!(!state.is_tracking);
    assert!(state.current.is_none());
    assert_eq!(state.elapsed_seconds, 0);
}

#[tokio::test]
async fn clock_in_then_elapsed_follows_the_clock() {
    let fx = fixture(at(9, 0));
    fx.tracker.load_employee("alice").await.unwrap();

    let session = fx
        .tracker
        .clock_in(ClockInInput::default())
        .await
        .unwrap()
        .applied()
        .expect("clock-in applied");

    assert_eq!(session.clock_in, at(9, 0));
    assert!(fx.tracker.snapshot().is_tracking);

    fx.clock.advance(TimeDelta::minutes(90));
    assert_eq!(fx.tracker.elapsed_now(), 90 * 60);
}

#[tokio::test]
async fn break_sequence_matches_reference_scenario() {
    // in 09:00, break 09:30-09:45, read at 10:00 -> 45 min of work
    let fx = fixture(at(9, 0));
    fx.tracker.load_employee("alice").await.unwrap();
    fx.tracker.clock_in(ClockInInput::default()).await.unwrap();

    fx.clock.set(at(9, 30));
    let started = fx.tracker.start_break(BreakKind::Lunch).await.unwrap();
    assert!(started.is_applied());
    assert!(fx.tracker.snapshot().is_on_break);

    fx.clock.set(at(9, 40));
    assert_eq!(fx.tracker.elapsed_now(), 30 * 60);

    fx.clock.set(at(9, 45));
    assert!(fx.tracker.end_break().await.unwrap().is_applied());

    let state = fx.tracker.snapshot();
    assert!(!state.is_on_break);
    assert!(state.current_break.is_none());
    let b = &state.current.as_ref().unwrap().breaks[0];
    assert_eq!(b.duration_minutes, Some(15));

    fx.clock.set(at(10, 0));
    assert_eq!(fx.tracker.elapsed_now(), 2700);
}

#[tokio::test]
async fn rapid_double_clock_in_creates_one_session() {
    let fx = fixture(at(9, 0));
    fx.tracker.load_employee("alice").await.unwrap();

    fx.gateway.hold("alice");
    let tracker = Arc::clone(&fx.tracker);
    let first = tokio::spawn(async move { tracker.clock_in(ClockInInput::default()).await });
    fx.gateway.wait_for_parked(1).await;

    let second = fx.tracker.clock_in(ClockInInput::default()).await.unwrap();
    assert_eq!(second, OpOutcome::Skipped(SkipReason::Busy));
    assert!(fx.tracker.is_processing());

    fx.gateway.release();
    let first = first.await.unwrap().unwrap();
    assert!(first.is_applied());
    assert!(!fx.tracker.is_processing());

    let third = fx.tracker.clock_in(ClockInInput::default()).await.unwrap();
    assert_eq!(third, OpOutcome::Skipped(SkipReason::AlreadyTracking));

    assert_eq!(fx.gateway.clock_in_calls.load(Ordering::SeqCst), 1);
    assert_eq!(fx.gateway.fetch_time_logs(&key("alice")).await.unwrap().len(), 1);
}

#[tokio::test]
async fn failed_clock_in_releases_the_lock_and_keeps_state() {
    let fx = fixture(at(9, 0));
    fx.tracker.load_employee("alice").await.unwrap();

    // another device already opened a session behind our back
    let other = fx.restarted();
    other.load_employee("alice").await.unwrap();
    other.clock_in(ClockInInput::default()).await.unwrap();

    let err = fx.tracker.clock_in(ClockInInput::default()).await;
    assert!(err.is_err());
    assert!(!fx.tracker.is_processing());
    assert!(!fx.tracker.snapshot().is_tracking);
    assert_eq!(fx.notifier.errors().len(), 1);

    // reconciliation picks up the remote session
    fx.tracker.load_employee("alice").await.unwrap();
    assert!(fx.tracker.snapshot().is_tracking);
}

#[tokio::test]
async fn reconciliation_is_idempotent() {
    let fx = fixture(at(9, 0));
    fx.tracker.load_employee("alice").await.unwrap();
    fx.tracker.clock_in(ClockInInput::default()).await.unwrap();
    fx.clock.set(at(10, 0));
    fx.tracker.start_break(BreakKind::Short).await.unwrap();
    fx.clock.set(at(10, 5));

    fx.tracker.load_employee("alice").await.unwrap();
    let once = fx.tracker.snapshot();
    fx.tracker.load_employee("alice").await.unwrap();
    let twice = fx.tracker.snapshot();

    assert_eq!(once, twice);
    assert!(twice.is_on_break);
    assert_eq!(twice.elapsed_seconds, 3600);
}

#[tokio::test]
async fn restart_restores_open_session_and_break() {
    let fx = fixture(at(9, 0));
    fx.tracker
        .load_employee("alice")
        .await
        .unwrap();
    fx.tracker
        .clock_in(ClockInInput {
            notes: "sprint work".into(),
            projects: vec![ProjectTime::parse("backend=3").unwrap()],
        })
        .await
        .unwrap();
    fx.clock.set(at(11, 0));
    fx.tracker.start_break(BreakKind::Personal).await.unwrap();

    fx.clock.set(at(11, 20));
    let restarted = fx.restarted();
    restarted.load_employee("alice").await.unwrap();

    let state = restarted.snapshot();
    assert!(state.is_tracking);
    assert!(state.is_on_break);
    assert_eq!(state.current_break.as_ref().unwrap().kind, BreakKind::Personal);
    assert_eq!(state.notes.text, "sprint work");
    assert_eq!(state.notes.projects.len(), 1);
    assert_eq!(state.elapsed_seconds, 2 * 3600);
    assert_eq!(state.history.len(), 1);
}

#[tokio::test]
async fn employee_switch_discards_stale_load() {
    let fx = fixture(at(9, 0));

    // alice has an open session
    fx.tracker.load_employee("alice").await.unwrap();
    fx.tracker.clock_in(ClockInInput::default()).await.unwrap();

    fx.gateway.hold("alice");
    let tracker = Arc::clone(&fx.tracker);
    let stale = tokio::spawn(async move { tracker.load_employee("alice").await });
    fx.gateway.wait_for_parked(1).await;

    // a second load for alice while hers is in flight is not re-issued
    assert_eq!(
        fx.tracker.load_employee("alice").await.unwrap(),
        LoadOutcome::AlreadyLoading
    );

    assert_eq!(
        fx.tracker.load_employee("bob").await.unwrap(),
        LoadOutcome::Loaded
    );

    fx.gateway.release();
    assert_eq!(stale.await.unwrap().unwrap(), LoadOutcome::Stale);

    let state = fx.tracker.snapshot();
    assert_eq!(state.employee, Some(key("bob")));
    assert!(!state.is_tracking);
    assert!(state.current.is_none());
    assert!(state.history.is_empty());
}

#[tokio::test]
async fn abandoned_load_does_not_block_later_loads() {
    let fx = fixture(at(9, 0));
    fx.tracker.load_employee("alice").await.unwrap();
    fx.tracker.clock_in(ClockInInput::default()).await.unwrap();

    fx.gateway.hold("alice");
    let timed_out = tokio::time::timeout(
        Duration::from_millis(50),
        fx.tracker.load_employee("alice"),
    )
    .await;
    assert!(timed_out.is_err());
    fx.gateway.release();

    assert_eq!(
        fx.tracker.load_employee("alice").await.unwrap(),
        LoadOutcome::Loaded
    );
    assert_eq!(
        fx.tracker.load_employee("alice").await.unwrap(),
        LoadOutcome::Loaded
    );
    assert!(fx.tracker.snapshot().is_tracking);
}

#[tokio::test]
async fn clock_out_prepares_request_without_closing() {
    let fx = fixture(at(9, 0));
    fx.tracker.load_employee("alice").await.unwrap();
    fx.tracker.clock_in(ClockInInput::default()).await.unwrap();

    fx.clock.set(at(12, 30));
    fx.clock.advance(TimeDelta::seconds(59));

    let request = fx.tracker.clock_out().applied().expect("request");
    assert_eq!(request.elapsed_seconds, 3 * 3600 + 30 * 60 + 59);
    assert_eq!(request.duration_minutes, 210);

    // still open in the store and locally
    assert!(fx.tracker.snapshot().is_tracking);
    assert!(
        fx.gateway
            .check_active_time_log(&key("alice"))
            .await
            .unwrap()
            .is_some()
    );

    let submission = request
        .into_submission(Some(SessionNotes::new("done", vec![])))
        .unwrap();
    assert_eq!(submission.total_hours, 3.5);

    let closed = fx
        .tracker
        .submit_clock_out(submission)
        .await
        .unwrap()
        .applied()
        .unwrap();

    assert_eq!(closed.clock_out, Some(at(12, 30) + TimeDelta::seconds(59)));
    assert_eq!(closed.notes, "done");
    assert!(!closed.auto_terminated);

    let state = fx.tracker.snapshot();
    assert!(!state.is_tracking);
    assert_eq!(state.elapsed_seconds, 0);
    assert_eq!(state.history.len(), 1);
    assert!(state.history[0].clock_out.is_some());
}

#[tokio::test]
async fn project_breakdown_sets_total_hours() {
    let fx = fixture(at(9, 0));
    fx.tracker.load_employee("alice").await.unwrap();
    fx.tracker
        .clock_in(ClockInInput {
            notes: String::new(),
            projects: vec![
                ProjectTime::parse("api=2.5").unwrap(),
                ProjectTime::parse("ops=1").unwrap(),
            ],
        })
        .await
        .unwrap();

    fx.clock.set(at(10, 0));
    let submission = fx
        .tracker
        .clock_out()
        .applied()
        .unwrap()
        .into_submission(None)
        .unwrap();

    assert_eq!(submission.total_hours, 3.5);
    let decoded = SessionNotes::decode(&submission.notes);
    assert_eq!(decoded.projects.len(), 2);
}

#[tokio::test]
async fn operations_without_session_are_skipped() {
    let fx = fixture(at(9, 0));

    assert_eq!(
        fx.tracker.clock_in(ClockInInput::default()).await.unwrap(),
        OpOutcome::Skipped(SkipReason::NoEmployee)
    );

    fx.tracker.load_employee("alice").await.unwrap();

    assert_eq!(
        fx.tracker.clock_out(),
        OpOutcome::Skipped(SkipReason::NoOpenSession)
    );
    assert_eq!(
        fx.tracker.start_break(BreakKind::Short).await.unwrap(),
        OpOutcome::Skipped(SkipReason::NoOpenSession)
    );
    assert_eq!(
        fx.tracker.end_break().await.unwrap(),
        OpOutcome::Skipped(SkipReason::NoOpenBreak)
    );

    // skips are silent
    assert!(fx.notifier.errors().is_empty());
    assert!(fx.notifier.warnings().is_empty());
}

#[tokio::test]
async fn second_break_is_skipped_locally() {
    let fx = fixture(at(9, 0));
    fx.tracker.load_employee("alice").await.unwrap();
    fx.tracker.clock_in(ClockInInput::default()).await.unwrap();

    fx.tracker.start_break(BreakKind::Short).await.unwrap();
    assert_eq!(
        fx.tracker.start_break(BreakKind::Lunch).await.unwrap(),
        OpOutcome::Skipped(SkipReason::AlreadyOnBreak)
    );
}

#[tokio::test]
async fn ending_a_break_closed_elsewhere_resyncs() {
    let fx = fixture(at(9, 0));
    fx.tracker.load_employee("alice").await.unwrap();
    fx.tracker.clock_in(ClockInInput::default()).await.unwrap();
    fx.clock.set(at(9, 10));
    let b = fx
        .tracker
        .start_break(BreakKind::Short)
        .await
        .unwrap()
        .applied()
        .unwrap();

    // closed by another client
    fx.clock.set(at(9, 20));
    assert!(fx.gateway.end_break(b.id).await.unwrap());

    assert_eq!(
        fx.tracker.end_break().await.unwrap(),
        OpOutcome::Skipped(SkipReason::NoOpenBreak)
    );
    let state = fx.tracker.snapshot();
    assert!(!state.is_on_break);
    assert!(state.is_tracking);
}
