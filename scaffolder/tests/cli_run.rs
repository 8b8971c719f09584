//! CLI tests for `scaffolder run`, `scaffolder status` and `scaffolder plan`.
//!
//! Spawns the binary in a temp directory with a custom plan and verifies exit
//! codes and the checkpoint file.

use std::fs;
use std::path::Path;
use std::process::{Command, Stdio};

use scaffolder::exit_codes;

const CONFIG: &str = r#"{"common": {"folder_name": "shop"}, "github": {"token": "t0k"}}"#;

fn write_fixture(root: &Path, plan: &str) {
    fs::write(root.join("setup_config.json"), CONFIG).expect("config");
    fs::write(root.join("plan.toml"), plan).expect("plan");
    fs::write(root.join("scaffolder.toml"), "plan_path = \"plan.toml\"\n").expect("settings");
}

fn scaffolder(root: &Path, args: &[&str]) -> std::process::Output {
    Command::new(env!("CARGO_BIN_EXE_scaffolder"))
        .current_dir(root)
        .args(args)
        .stdin(Stdio::null())
        .output()
        .expect("spawn scaffolder")
}

#[test]
fn run_completes_plan_and_records_checkpoint() {
    let temp = tempfile::tempdir().expect("tempdir");
    write_fixture(
        temp.path(),
        r#"
[env]
TOKEN = "{{ github.token }}"

[[step]]
number = 1
commands = [
  { run = ["mkdir", "-p", "{{ common.folder_name }}"] },
  { cd = "{{ common.folder_name }}" },
  { run = ["sh", "-c", "printf %s \"$TOKEN\" > token.txt"] },
]

[[step]]
number = 2
commands = []
"#,
    );

    let output = scaffolder(temp.path(), &["run"]);

    assert_eq!(output.status.code(), Some(exit_codes::OK));
    assert_eq!(
        fs::read_to_string(temp.path().join("script_status.txt"))
            .expect("checkpoint")
            .trim(),
        "2"
    );
    assert_eq!(
        fs::read_to_string(temp.path().join("shop/token.txt")).expect("token"),
        "t0k"
    );
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Executing Step 1..."));
}

#[test]
fn failed_step_exits_with_step_failed_code() {
    let temp = tempfile::tempdir().expect("tempdir");
    write_fixture(
        temp.path(),
        r#"
[[step]]
number = 1
commands = [{ run = ["true"] }]

[[step]]
number = 2
commands = [{ run = ["false"] }]
"#,
    );

    let output = scaffolder(temp.path(), &["run"]);
    assert_eq!(output.status.code(), Some(exit_codes::STEP_FAILED));
    assert_eq!(
        fs::read_to_string(temp.path().join("script_status.txt"))
            .expect("checkpoint")
            .trim(),
        "1"
    );

    let again = scaffolder(temp.path(), &["run"]);
    assert_eq!(again.status.code(), Some(exit_codes::STEP_FAILED));
    let stdout = String::from_utf8_lossy(&again.stdout);
    assert!(stdout.contains("Step 1 already completed. Skipping..."));
}

#[test]
fn missing_config_key_exits_invalid_before_running() {
    let temp = tempfile::tempdir().expect("tempdir");
    write_fixture(
        temp.path(),
        r#"
[[step]]
number = 1
commands = [{ run = ["touch", "ran"] }, { run = ["echo", "{{ backend.project_slug }}"] }]
"#,
    );

    let output = scaffolder(temp.path(), &["run"]);

    assert_eq!(output.status.code(), Some(exit_codes::INVALID));
    assert!(!temp.path().join("ran").exists());
    assert!(!temp.path().join("script_status.txt").exists());
}

#[test]
fn status_reports_pending_steps() {
    let temp = tempfile::tempdir().expect("tempdir");
    write_fixture(
        temp.path(),
        "[[step]]\nnumber = 1\nname = \"backend\"\n\n[[step]]\nnumber = 2\n",
    );
    fs::write(temp.path().join("script_status.txt"), "1\n").expect("checkpoint");

    let output = scaffolder(temp.path(), &["status"]);

    assert_eq!(output.status.code(), Some(exit_codes::OK));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("checkpoint: 1"));
    assert!(stdout.contains("done     Step 1 (backend)"));
    assert!(stdout.contains("pending  Step 2"));
    assert!(stdout.contains("next: Step 2"));
}

#[test]
fn status_after_last_step_has_no_next_step() {
    let temp = tempfile::tempdir().expect("tempdir");
    write_fixture(temp.path(), "[[step]]\nnumber = 1\n");
    fs::write(temp.path().join("script_status.txt"), "1\n").expect("checkpoint");

    let output = scaffolder(temp.path(), &["status"]);

    assert_eq!(output.status.code(), Some(exit_codes::OK));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("next: none"));
}

#[test]
fn plan_lists_env_keys_without_values() {
    let temp = tempfile::tempdir().expect("tempdir");
    write_fixture(
        temp.path(),
        r#"
[env]
T = "{{ github.token }}"

[[step]]
number = 1
commands = [{ run = ["echo", "x"] }]
"#,
    );

    let output = scaffolder(temp.path(), &["plan"]);

    assert_eq!(output.status.code(), Some(exit_codes::OK));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("echo x  [env: T]"), "stdout: {stdout}");
    assert!(!stdout.contains("t0k"));
    assert!(!temp.path().join("script_status.txt").exists());
}
