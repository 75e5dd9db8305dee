//! End-to-end behaviour of FinitMachine against scripted collaborators
//!
//! Timing-sensitive tests run on tokio's paused clock, so "5 seconds" of
//! polling completes instantly while still being measured in virtual time.

use std::sync::Arc;
use std::time::Duration;

use finit_harness_core::domain::{Condition, LegacyOperation, Runlevel};
use finit_harness_core::port::console::mocks::MockConsole;
use finit_harness_core::port::execution_channel::mocks::MockExecutionChannel;
use finit_harness_core::{FinitMachine, HarnessError, Step};
use tokio::time::Instant;

fn machine_with(channel: Arc<MockExecutionChannel>, console: Arc<MockConsole>) -> FinitMachine {
    FinitMachine::new(channel, console)
}

/// Scenario 1: condition already set, wait returns on the first query
#[tokio::test(start_paused = true)]
async fn test_wait_for_service_immediate() {
    let channel = Arc::new(MockExecutionChannel::new_exit(1).with_response(
        "initctl cond get service/nginx/running",
        0,
        "",
    ));
    let machine = machine_with(channel.clone(), Arc::new(MockConsole::new()));
    let start = Instant::now();

    let outcome = machine
        .wait_for_service("nginx", Duration::from_secs(5))
        .await
        .unwrap();

    assert_eq!(outcome.attempts, 1);
    assert_eq!(start.elapsed(), Duration::ZERO);
    assert_eq!(channel.call_count(), 1);
}

/// Scenario 2: condition never set, ConditionTimeout after the full bound
#[tokio::test(start_paused = true)]
async fn test_wait_for_service_timeout() {
    let channel = Arc::new(MockExecutionChannel::new_exit(1));
    let machine = machine_with(channel.clone(), Arc::new(MockConsole::new()));
    let start = Instant::now();

    let err = machine
        .wait_for_service("nginx", Duration::from_secs(5))
        .await
        .unwrap_err();

    let elapsed = start.elapsed();
    assert!(elapsed >= Duration::from_secs(5), "failed early: {elapsed:?}");
    assert!(elapsed < Duration::from_secs(6), "overran: {elapsed:?}");
    assert!(matches!(err, HarnessError::ConditionTimeout { .. }));
    assert!(err.to_string().contains("service/nginx/running"));
    assert!(channel.call_count() > 1);
}

/// Scenario 3: console announces the runlevel at t=1s, wait returns then
#[tokio::test(start_paused = true)]
async fn test_wait_for_runlevel_returns_when_line_appears() {
    let console = Arc::new(
        MockConsole::new().with_line(Duration::from_secs(1), "[ OK ] finit: entering runlevel 2"),
    );
    let machine = machine_with(Arc::new(MockExecutionChannel::new_success()), console);
    let start = Instant::now();

    machine
        .wait_for_runlevel(Runlevel::try_from(2u8).unwrap(), Duration::from_secs(10))
        .await
        .unwrap();

    assert_eq!(start.elapsed(), Duration::from_secs(1));
}

/// Scenario 4: systemd-era operations are rejected without reaching the target
#[tokio::test]
async fn test_legacy_operations_rejected() {
    let channel = Arc::new(MockExecutionChannel::new_success());
    let machine = machine_with(channel.clone(), Arc::new(MockConsole::new()));

    let steps = Step::parse_list(
        r#"[
            {"op": "wait_for_unit", "unit": "nginx"},
            {"op": "systemctl", "q": "list-units"},
            {"op": "get_unit_info", "unit": "nginx"}
        ]"#,
    )
    .unwrap();

    let expected = [
        (LegacyOperation::WaitForUnit, "wait_for_service"),
        (LegacyOperation::Systemctl, "initctl"),
        (LegacyOperation::GetUnitInfo, "get_service_status"),
    ];

    for (step, (legacy, replacement)) in steps.iter().zip(expected) {
        let err = machine.run_step(step).await.unwrap_err();
        match &err {
            HarnessError::UnsupportedProtocol { operation, .. } => assert_eq!(*operation, legacy),
            other => panic!("unexpected error: {other}"),
        }
        assert!(err.to_string().contains(replacement), "{err}");
    }

    assert_eq!(channel.call_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_wait_for_service_equals_condition_wait() {
    let via_service = Arc::new(MockExecutionChannel::new_succeed_after(2));
    let via_condition = Arc::new(MockExecutionChannel::new_succeed_after(2));
    let timeout = Duration::from_secs(10);

    let a = machine_with(via_service.clone(), Arc::new(MockConsole::new()))
        .wait_for_service("sshd", timeout)
        .await
        .unwrap();
    let condition: Condition = "service/sshd/running".parse().unwrap();
    let b = machine_with(via_condition.clone(), Arc::new(MockConsole::new()))
        .wait_for_condition(&condition, timeout)
        .await
        .unwrap();

    assert_eq!(a, b);
    assert_eq!(via_service.commands(), via_condition.commands());
}

#[tokio::test(start_paused = true)]
async fn test_wait_for_task_equals_condition_wait() {
    let via_task = Arc::new(MockExecutionChannel::new_exit(1));
    let via_condition = Arc::new(MockExecutionChannel::new_exit(1));
    let timeout = Duration::from_secs(3);

    let a = machine_with(via_task.clone(), Arc::new(MockConsole::new()))
        .wait_for_task("resolvconf", timeout)
        .await
        .unwrap_err();
    let condition: Condition = "task/resolvconf/success".parse().unwrap();
    let b = machine_with(via_condition.clone(), Arc::new(MockConsole::new()))
        .wait_for_condition(&condition, timeout)
        .await
        .unwrap_err();

    assert_eq!(a.to_string(), b.to_string());
    assert_eq!(via_task.commands(), via_condition.commands());
}

#[tokio::test]
async fn test_runlevel_validation_happens_before_any_wait() {
    let console = Arc::new(MockConsole::new());
    let machine = machine_with(Arc::new(MockExecutionChannel::new_success()), console.clone());

    let err = machine
        .run_step(&Step::parse_list(r#"[{"op": "wait_for_runlevel", "level": "7x"}]"#).unwrap()[0])
        .await
        .unwrap_err();

    assert!(matches!(err, HarnessError::Validation(_)));
    assert_eq!(console.wait_count(), 0);
}
