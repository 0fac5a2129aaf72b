use chrono::TimeDelta;
use rtimeclock::config::Config;
use rtimeclock::core::calculator::expected::{GracePhase, GracePolicy};
use rtimeclock::core::gateway::SessionGateway;
use rtimeclock::core::monitor::{GraceAction, GraceMonitor, GracePoller};
use rtimeclock::core::tracker::ClockInInput;
use rtimeclock::models::break_kind::BreakKind;
use std::sync::atomic::Ordering;
use std::time::Duration;

mod common;
use common::{at, fixture, key};

#[test]
fn policy_boundaries_for_eight_hours_and_thirty_minutes() {
    let policy = GracePolicy::default();
    let start = at(9, 0);

    assert_eq!(policy.expected_clock_out_time(start), at(17, 0));
    assert_eq!(policy.grace_deadline(start), at(17, 30));

    assert_eq!(policy.phase(start, at(16, 59)), GracePhase::Normal);
    assert!(policy.is_within_grace_period(start, at(17, 0)));
    assert!(policy.is_within_grace_period(start, at(17, 29)));
    assert!(!policy.has_grace_period_ended(start, at(17, 29)));
    assert!(policy.has_grace_period_ended(start, at(17, 30)));
    assert!(!policy.is_within_grace_period(start, at(17, 30)));
}

#[test]
fn policy_from_config() {
    let cfg = Config::from_yaml(
        "database: /tmp/x.sqlite\nexpected_work_duration: 7h 30m\ngrace_allowance_minutes: 15\n",
    )
    .unwrap();
    let policy = GracePolicy::from_config(&cfg).unwrap();

    assert_eq!(policy.expected_work, TimeDelta::minutes(450));
    assert_eq!(policy.allowance, TimeDelta::minutes(15));

    let bad = Config::from_yaml("database: x\ngrace_allowance_minutes: -5\n").unwrap();
    assert!(GracePolicy::from_config(&bad).is_err());
}

#[test]
fn policy_rejects_spans_out_of_range() {
    let huge_allowance = Config::from_yaml(&format!(
        "database: x\ngrace_allowance_minutes: {}\n",
        i64::MAX / 2
    ))
    .unwrap();
    assert!(GracePolicy::from_config(&huge_allowance).is_err());

    let huge_day = Config::from_yaml("database: x\nexpected_work_duration: 999999999999999999h\n")
        .unwrap();
    assert!(GracePolicy::from_config(&huge_day).is_err());

    let two_weeks = Config::from_yaml("database: x\nexpected_work_duration: 336h\n").unwrap();
    assert!(GracePolicy::from_config(&two_weeks).is_err());

    // a policy built in code saturates instead of overflowing
    let policy = GracePolicy::new(TimeDelta::MAX, TimeDelta::MAX);
    assert_eq!(policy.phase(at(9, 0), at(17, 0)), GracePhase::Normal);
}

#[test]
fn monitor_warns_once_and_terminates_once() {
    let policy = GracePolicy::default();
    let mut monitor = GraceMonitor::default();
    let start = at(9, 0);

    assert_eq!(monitor.evaluate(&policy, 1, start, at(16, 0)), GraceAction::None);
    assert_eq!(
        monitor.evaluate(&policy, 1, start, at(17, 0)),
        GraceAction::EnterGrace {
            expected_end: at(17, 0),
            deadline: at(17, 30),
        }
    );
    assert!(monitor.is_warned());
    assert_eq!(monitor.evaluate(&policy, 1, start, at(17, 15)), GraceAction::None);
    assert_eq!(
        monitor.evaluate(&policy, 1, start, at(17, 30)),
        GraceAction::AutoTerminate
    );
    assert_eq!(monitor.evaluate(&policy, 1, start, at(17, 31)), GraceAction::None);

    // failed attempt: the next evaluation may try again
    monitor.release(1);
    assert_eq!(
        monitor.evaluate(&policy, 1, start, at(17, 32)),
        GraceAction::AutoTerminate
    );
}

#[test]
fn monitor_starts_fresh_for_a_new_session() {
    let policy = GracePolicy::default();
    let mut monitor = GraceMonitor::default();

    monitor.evaluate(&policy, 1, at(9, 0), at(17, 5));
    assert!(monitor.is_warned());

    assert!(matches!(
        monitor.evaluate(&policy, 2, at(9, 0), at(17, 5)),
        GraceAction::EnterGrace { .. }
    ));
}

#[tokio::test]
async fn tracker_grace_scenario() {
    let fx = fixture(at(9, 0));
    fx.tracker.load_employee("alice").await.unwrap();
    let session = fx
        .tracker
        .clock_in(ClockInInput::default())
        .await
        .unwrap()
        .applied()
        .unwrap();

    fx.clock.set(at(16, 59));
    assert_eq!(fx.tracker.check_grace().await.unwrap(), GraceAction::None);
    assert!(fx.notifier.warnings().is_empty());

    fx.clock.set(at(17, 0));
    assert!(matches!(
        fx.tracker.check_grace().await.unwrap(),
        GraceAction::EnterGrace { .. }
    ));
    assert!(fx.tracker.snapshot().in_grace_period);
    assert_eq!(fx.notifier.warnings().len(), 1);
    assert!(fx.notifier.warnings()[0].contains("Please clock out"));

    fx.clock.set(at(17, 20));
    assert_eq!(fx.tracker.check_grace().await.unwrap(), GraceAction::None);
    assert_eq!(fx.notifier.warnings().len(), 1);

    fx.clock.set(at(17, 30));
    assert_eq!(
        fx.tracker.check_grace().await.unwrap(),
        GraceAction::AutoTerminate
    );

    let state = fx.tracker.snapshot();
    assert!(!state.is_tracking);
    assert!(!state.is_on_break);
    assert!(!state.in_grace_period);
    assert!(state.current.is_none());
    assert_eq!(state.elapsed_seconds, 0);
    assert_eq!(fx.notifier.warnings().len(), 2);

    let stored = &state.history[0];
    assert_eq!(stored.id, session.id);
    assert!(stored.auto_terminated);
    assert_eq!(stored.clock_out, Some(at(17, 30)));
    assert_eq!(stored.total_hours, Some(8.5));

    fx.clock.set(at(17, 31));
    assert_eq!(fx.tracker.check_grace().await.unwrap(), GraceAction::None);
    assert_eq!(fx.gateway.auto_terminate_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn auto_termination_closes_running_break() {
    let fx = fixture(at(9, 0));
    fx.tracker.load_employee("alice").await.unwrap();
    fx.tracker.clock_in(ClockInInput::default()).await.unwrap();

    fx.clock.set(at(17, 10));
    fx.tracker.start_break(BreakKind::Other).await.unwrap();

    fx.clock.set(at(17, 30));
    fx.tracker.check_grace().await.unwrap();

    let history = fx.gateway.fetch_time_logs(&key("alice")).await.unwrap();
    let b = &history[0].breaks[0];
    assert_eq!(b.end, Some(at(17, 30)));
    assert_eq!(b.duration_minutes, Some(20));
    // 8h30m wall minus the 20 min break
    assert_eq!(history[0].total_hours, Some(8.17));
}

#[tokio::test]
async fn failed_auto_termination_is_retried() {
    let fx = fixture(at(9, 0));
    fx.tracker.load_employee("alice").await.unwrap();
    fx.tracker.clock_in(ClockInInput::default()).await.unwrap();
    fx.gateway.fail_next_auto_terminations(1);

    fx.clock.set(at(17, 40));
    assert!(fx.tracker.check_grace().await.is_err());
    assert_eq!(fx.notifier.errors().len(), 1);
    assert!(fx.tracker.snapshot().is_tracking);

    fx.clock.set(at(17, 41));
    assert_eq!(
        fx.tracker.check_grace().await.unwrap(),
        GraceAction::AutoTerminate
    );
    assert!(!fx.tracker.snapshot().is_tracking);
    assert_eq!(fx.gateway.auto_terminate_calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn overdue_session_is_closed_on_load() {
    let fx = fixture(at(9, 0));
    fx.tracker.load_employee("alice").await.unwrap();
    fx.tracker.clock_in(ClockInInput::default()).await.unwrap();

    fx.clock.set(at(20, 0));
    let restarted = fx.restarted();
    restarted.load_employee("alice").await.unwrap();

    assert!(!restarted.snapshot().is_tracking);
    assert!(
        fx.gateway
            .check_active_time_log(&key("alice"))
            .await
            .unwrap()
            .is_none()
    );
}

#[tokio::test]
async fn store_refuses_second_auto_termination() {
    let fx = fixture(at(9, 0));
    fx.tracker.load_employee("alice").await.unwrap();
    let session = fx
        .tracker
        .clock_in(ClockInInput::default())
        .await
        .unwrap()
        .applied()
        .unwrap();

    fx.clock.set(at(17, 30));
    assert!(fx.tracker.auto_terminate(session.id, 8 * 3600).await.unwrap());
    assert!(!fx.tracker.auto_terminate(session.id, 8 * 3600).await.unwrap());
}

#[tokio::test(start_paused = true)]
async fn poller_drives_warning_and_termination() {
    let fx = fixture(at(9, 0));
    fx.tracker.load_employee("alice").await.unwrap();
    let session = fx
        .tracker
        .clock_in(ClockInInput::default())
        .await
        .unwrap()
        .applied()
        .unwrap();

    let mut poller = GracePoller::new(Duration::from_secs(60));
    poller.sync(&fx.tracker);
    assert_eq!(poller.session_id(), Some(session.id));

    // same session: sync keeps the running poll
    poller.sync(&fx.tracker);
    assert_eq!(poller.session_id(), Some(session.id));

    tokio::time::sleep(Duration::from_secs(1)).await;
    assert!(fx.notifier.warnings().is_empty());

    fx.clock.set(at(17, 0) + TimeDelta::seconds(30));
    tokio::time::sleep(Duration::from_secs(60)).await;
    assert_eq!(fx.notifier.warnings().len(), 1);

    fx.clock.set(at(17, 30) + TimeDelta::seconds(30));
    tokio::time::sleep(Duration::from_secs(60)).await;
    assert_eq!(fx.notifier.warnings().len(), 2);
    assert!(!fx.tracker.snapshot().is_tracking);

    // the poll ends on its own once the session is no longer tracked
    tokio::time::sleep(Duration::from_secs(1)).await;
    assert_eq!(poller.session_id(), None);

    tokio::time::sleep(Duration::from_secs(300)).await;
    assert_eq!(fx.gateway.auto_terminate_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn poller_stops_when_tracking_stops() {
    let fx = fixture(at(9, 0));
    fx.tracker.load_employee("alice").await.unwrap();
    fx.tracker.clock_in(ClockInInput::default()).await.unwrap();

    let mut poller = GracePoller::new(Duration::from_secs(60));
    poller.sync(&fx.tracker);

    let request = fx.tracker.clock_out().applied().unwrap();
    fx.tracker
        .submit_clock_out(request.into_submission(None).unwrap())
        .await
        .unwrap();

    poller.sync(&fx.tracker);
    assert_eq!(poller.session_id(), None);

    fx.clock.set(at(18, 0));
    tokio::time::sleep(Duration::from_secs(600)).await;
    assert!(fx.notifier.warnings().is_empty());
    assert_eq!(fx.gateway.auto_terminate_calls.load(Ordering::SeqCst), 0);
}
