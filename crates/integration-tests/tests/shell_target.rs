//! FinitMachine over the real system adapters
//!
//! A fake `initctl` shell script stands in for finit: it keeps conditions as
//! files under a temp directory, so start/stop/status and `cond get` behave
//! like the real thing from the harness's point of view.

#![cfg(unix)]

use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use finit_harness_core::domain::Runlevel;
use finit_harness_core::{FinitMachine, HarnessError, PollPolicy};
use finit_harness_infra_system::{LogFileConsole, ShellChannel};

fn target_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!(
        "finit_harness_target_{}_{}",
        name,
        std::process::id()
    ));
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(dir.join("bin")).unwrap();
    std::fs::create_dir_all(dir.join("cond")).unwrap();
    dir
}

fn install_fake_initctl(dir: &Path) {
    let cond = dir.join("cond");
    let script = format!(
        r#"#!/bin/sh
COND="{cond}"
case "$1" in
  cond)
    [ "$2" = "get" ] || exit 2
    test -e "$COND/$3"
    ;;
  start)
    mkdir -p "$COND/service/$2"
    : > "$COND/service/$2/running"
    echo "Starting $2"
    ;;
  stop)
    rm -f "$COND/service/$2/running"
    ;;
  status)
    if test -e "$COND/service/$2/running"; then
      echo "$2 running"
    else
      echo "$2 stopped"
      exit 3
    fi
    ;;
  *)
    echo "initctl: unknown command $1" >&2
    exit 1
    ;;
esac
"#,
        cond = cond.display()
    );

    let path = dir.join("bin").join("initctl");
    std::fs::write(&path, script).unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
}

fn machine_for(dir: &Path, console_log: &Path) -> FinitMachine {
    let search_path = format!(
        "{}:{}",
        dir.join("bin").display(),
        std::env::var("PATH").unwrap_or_default()
    );
    // `env PATH=... sh -c <command>` plays the role of `ssh root@vm <command>`
    let transport = vec![
        "env".to_string(),
        format!("PATH={search_path}"),
        "sh".to_string(),
        "-c".to_string(),
    ];
    let channel = ShellChannel::with_transport(transport, vec!["PATH".to_string()])
        .with_command_timeout(Duration::from_secs(10));
    let console = LogFileConsole::new(console_log).with_follow_interval(Duration::from_millis(20));

    FinitMachine::new(Arc::new(channel), Arc::new(console))
        .with_poll_policy(PollPolicy::fixed(Duration::from_millis(50)))
}

#[tokio::test]
async fn test_service_lifecycle() {
    let dir = target_dir("lifecycle");
    install_fake_initctl(&dir);
    let machine = machine_for(&dir, &dir.join("console.log"));

    let status = machine.get_service_status("nginx").await.unwrap();
    assert_eq!(status.exit_code(), 3);
    assert_eq!(status.output(), "nginx stopped\n");

    let err = machine
        .wait_for_service("nginx", Duration::from_millis(200))
        .await
        .unwrap_err();
    assert!(matches!(err, HarnessError::ConditionTimeout { .. }));

    let started = machine.start_service("nginx").await.unwrap();
    assert!(started.succeeded());
    assert_eq!(started.output(), "Starting nginx\n");

    let outcome = machine
        .wait_for_service("nginx", Duration::from_secs(5))
        .await
        .unwrap();
    assert_eq!(outcome.attempts, 1);

    let status = machine.get_service_status("nginx").await.unwrap();
    assert_eq!(status.exit_code(), 0);

    machine.stop_service("nginx").await.unwrap();
    let status = machine.get_service_status("nginx").await.unwrap();
    assert_eq!(status.exit_code(), 3);

    let _ = std::fs::remove_dir_all(&dir);
}

#[tokio::test]
async fn test_wait_observes_asynchronous_start() {
    let dir = target_dir("async");
    install_fake_initctl(&dir);
    let machine = machine_for(&dir, &dir.join("console.log"));

    let cond_dir = dir.join("cond").join("task").join("setup");
    let setter = tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(300)).await;
        std::fs::create_dir_all(&cond_dir).unwrap();
        std::fs::write(cond_dir.join("success"), b"").unwrap();
    });

    let outcome = machine
        .wait_for_task("setup", Duration::from_secs(5))
        .await
        .unwrap();

    assert!(outcome.attempts > 1);
    assert!(outcome.elapsed >= Duration::from_millis(300));
    setter.await.unwrap();
    let _ = std::fs::remove_dir_all(&dir);
}

#[tokio::test]
async fn test_unknown_subcommand_passed_through() {
    let dir = target_dir("passthrough");
    install_fake_initctl(&dir);
    let machine = machine_for(&dir, &dir.join("console.log"));

    let result = machine.initctl("frobnicate --all").await.unwrap();

    assert_eq!(result.exit_code(), 1);
    assert_eq!(result.output(), "");
    let _ = std::fs::remove_dir_all(&dir);
}

#[tokio::test]
async fn test_runlevel_from_console_log() {
    let dir = target_dir("runlevel");
    install_fake_initctl(&dir);
    let console_log = dir.join("console.log");
    let machine = machine_for(&dir, &console_log);

    let writer_log = console_log.clone();
    let writer = tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(200)).await;
        std::fs::write(&writer_log, "finit: entering runlevel S\nfinit: entering runlevel 2\n")
            .unwrap();
    });

    let started = std::time::Instant::now();
    machine
        .wait_for_runlevel(Runlevel::try_from(2u8).unwrap(), Duration::from_secs(10))
        .await
        .unwrap();

    assert!(started.elapsed() < Duration::from_secs(5));
    writer.await.unwrap();

    let err = machine
        .wait_for_runlevel(Runlevel::try_from(4u8).unwrap(), Duration::from_millis(200))
        .await
        .unwrap_err();
    assert!(matches!(err, HarnessError::TextTimeout { .. }));

    let _ = std::fs::remove_dir_all(&dir);
}
