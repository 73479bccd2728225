mod helpers;

use helpers::{TestEnvironment, ToolProcess};
use std::time::Duration;

const STARTUP: Duration = Duration::from_secs(5);
const DETECTION: Duration = Duration::from_secs(5);
const BANNER_END: &str = "Press Ctrl+C to stop monitoring.";

fn base_args(env: &TestEnvironment) -> Vec<String> {
    vec![
        "-c".to_string(),
        env.config_path().display().to_string(),
        "-i".to_string(),
        "0.05".to_string(),
    ]
}

fn spawn(args: Vec<String>) -> ToolProcess {
    let args: Vec<&str> = args.iter().map(String::as_str).collect();
    ToolProcess::watch(&args)
}

#[test]
fn test_naive_mode_detects_appended_mac() {
    let env = TestEnvironment::new();
    env.append_log("old entry aa:aa:aa:aa:aa:aa before start");

    let mut args = base_args(&env);
    args.push(env.log_path().display().to_string());
    let mut watcher = spawn(args);
    assert!(watcher.wait_for_stdout(BANNER_END, STARTUP));

    env.append_log("Login incorrect: [DE:AD:BE:EF:00:01] (from client ap1)");

    assert!(
        watcher.wait_for_stdout("Command output: Processing MAC: DE:AD:BE:EF:00:01", DETECTION),
        "stdout was: {}",
        watcher.stdout()
    );
    let stdout = watcher.stdout();
    assert!(stdout.contains("MAC Address found: DE:AD:BE:EF:00:01 (normalized: deadbeef0001)"));
    assert!(!stdout.contains("aa:aa:aa:aa:aa:aa"));
    assert!(watcher.is_running());

    watcher.send_sigint();
    let status = watcher.wait_with_timeout(Duration::from_secs(5)).expect("watcher did not stop");
    assert!(status.success());
    assert!(watcher.stdout().contains("Monitoring stopped."));
}

#[test]
fn test_authorized_mac_keeps_running_without_action() {
    let env = TestEnvironment::new();
    env.write_users("deadbeef0001 Cleartext-Password := \"deadbeef0001\"\n");

    let mut args = base_args(&env);
    args.extend([
        "--authorize".to_string(),
        "-f".to_string(),
        env.users_path().display().to_string(),
        env.log_path().display().to_string(),
    ]);
    let mut watcher = spawn(args);
    assert!(watcher.wait_for_stdout(BANNER_END, STARTUP));

    env.append_log("Login OK: de-ad-be-ef-00-01");

    assert!(watcher.wait_for_stdout("- authorized", DETECTION), "stdout was: {}", watcher.stdout());
    assert!(!watcher.stdout().contains("Unauthorized MAC"));
    assert!(watcher.is_running());

    watcher.send_sigint();
    let status = watcher.wait_with_timeout(Duration::from_secs(5)).expect("watcher did not stop");
    assert!(status.success());
}

#[test]
fn test_unauthorized_mac_runs_action_and_exits() {
    let env = TestEnvironment::new();
    env.write_users("aabbccddeeff Cleartext-Password := \"aabbccddeeff\"\n");

    let mut args = base_args(&env);
    args.extend([
        "--authorize".to_string(),
        "-f".to_string(),
        env.users_path().display().to_string(),
        env.log_path().display().to_string(),
    ]);
    let mut watcher = spawn(args);
    assert!(watcher.wait_for_stdout(BANNER_END, STARTUP));

    env.append_log("Login incorrect: DE:AD:BE:EF:00:01");

    let status = watcher
        .wait_with_timeout(DETECTION)
        .expect("watcher should stop after the first unauthorized MAC");
    assert!(status.success());
    let stdout = watcher.stdout();
    assert!(stdout.contains("NOT authorized"), "stdout was: {}", stdout);
    assert!(stdout.contains("Command output: Unauthorized MAC: deadbeef0001"));
}

#[test]
fn test_failed_action_exit_status() {
    let env = TestEnvironment::new();
    env.write_users("");

    let mut args = base_args(&env);
    args.extend([
        "--authorize".to_string(),
        "-f".to_string(),
        env.users_path().display().to_string(),
        env.log_path().display().to_string(),
        "--exec".to_string(),
        "false".to_string(),
    ]);
    let mut watcher = spawn(args);
    assert!(watcher.wait_for_stdout(BANNER_END, STARTUP));

    env.append_log("Login incorrect: 00:11:22:33:44:55");

    let status = watcher.wait_with_timeout(DETECTION).expect("watcher did not stop");
    assert!(!status.success());
    assert!(watcher.stderr().contains("Error executing command"));
}

#[test]
fn test_continuous_mode_acts_once_per_mac() {
    let env = TestEnvironment::new();
    env.write_users("");

    let mut args = base_args(&env);
    args.extend([
        "--authorize".to_string(),
        "--continuous".to_string(),
        "-f".to_string(),
        env.users_path().display().to_string(),
        env.log_path().display().to_string(),
        "--exec".to_string(),
        "echo".to_string(),
        "acted".to_string(),
        "{mac}".to_string(),
    ]);
    let mut watcher = spawn(args);
    assert!(watcher.wait_for_stdout(BANNER_END, STARTUP));

    env.append_log("Login incorrect: 00:11:22:33:44:55");
    env.append_log("Login incorrect: 00-11-22-33-44-55");
    env.append_log("Login incorrect: 66:77:88:99:aa:bb");

    assert!(
        watcher.wait_for_stdout("Command output: acted 66778899aabb", DETECTION),
        "stdout was: {}",
        watcher.stdout()
    );
    let stdout = watcher.stdout();
    assert_eq!(stdout.matches("Command output: acted 001122334455").count(), 1);
    assert!(stdout.contains("(already handled)"));
    assert!(watcher.is_running());

    watcher.send_sigint();
    assert!(watcher.wait_with_timeout(Duration::from_secs(5)).is_some());
}

#[test]
fn test_json_output_lines() {
    let env = TestEnvironment::new();

    let mut args = base_args(&env);
    args.extend(["--json".to_string(), env.log_path().display().to_string()]);
    let watcher = spawn(args);
    assert!(watcher.wait_for_stdout(BANNER_END, STARTUP));

    env.append_log("Login incorrect: AA-BB-CC-DD-EE-FF");

    assert!(watcher.wait_for_stdout("\"event_type\":\"action_executed\"", DETECTION));
    let detection = watcher
        .stdout()
        .lines()
        .find(|line| line.contains("\"mac_detected\""))
        .map(str::to_string)
        .expect("no detection line");
    let value: serde_json::Value = serde_json::from_str(&detection).unwrap();
    assert_eq!(value["mac"], "aabbccddeeff");
    assert_eq!(value["raw"], "AA-BB-CC-DD-EE-FF");
    assert_eq!(value["verdict"], "detected");
}

#[test]
fn test_missing_users_file_is_warned_about() {
    let env = TestEnvironment::new();
    let missing = env.path().join("no-such-users");

    let mut args = base_args(&env);
    args.extend([
        "--authorize".to_string(),
        "-f".to_string(),
        missing.display().to_string(),
        env.log_path().display().to_string(),
    ]);
    let mut watcher = spawn(args);
    assert!(watcher.wait_for_stdout(BANNER_END, STARTUP));

    env.append_log("Login incorrect: DE:AD:BE:EF:00:01");

    assert!(watcher.wait_with_timeout(DETECTION).is_some());
    let stderr = watcher.stderr();
    assert!(stderr.contains("Users file"), "stderr was: {}", stderr);
    assert!(stderr.contains("not found"));
    assert!(stderr.contains(&missing.display().to_string()));
}
