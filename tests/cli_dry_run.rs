use assert_cmd::prelude::*;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

fn script(dir: &TempDir, body: &str) -> PathBuf {
    let path = dir.path().join("script.txt");
    std::fs::write(&path, body).expect("write script");
    path
}

fn soulscript(dir: &Path, args: &[&str]) -> Output {
    let missing_config = dir.join("absent.yaml");
    Command::cargo_bin("soulscript")
        .expect("binary built")
        .current_dir(dir)
        .env_remove("RUST_LOG")
        .arg("--config")
        .arg(&missing_config)
        .args(args)
        .output()
        .expect("run soulscript")
}

fn stdout(output: &Output) -> String {
    String::from_utf8(output.stdout.clone()).expect("utf8 stdout")
}

fn stderr(output: &Output) -> String {
    String::from_utf8(output.stderr.clone()).expect("utf8 stderr")
}

#[test]
fn dry_run_prints_script_output() {
    let dir = tempfile::tempdir().unwrap();
    let path = script(
        &dir,
        "# greeting\nset_var who world\necho hello ${who}\nL_click ID go\ncookie_set sid 1\ncookie_get sid\n",
    );
    let output = soulscript(dir.path(), &["run", "--dry-run", path.to_str().unwrap()]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert_eq!(
        stdout(&output),
        "hello world\n{\"name\":\"sid\",\"value\":\"1\"}\n"
    );
}

#[test]
fn dry_run_abort_exits_non_zero() {
    let dir = tempfile::tempdir().unwrap();
    let path = script(&dir, "echo before\nassert_title_contains Dashboard\necho after\n");
    let output = soulscript(dir.path(), &["run", "--dry-run", path.to_str().unwrap()]);
    assert_eq!(output.status.code(), Some(1));
    assert_eq!(stdout(&output), "before\n");
    assert!(stderr(&output).contains("line 2: assertion failed"));
}

#[test]
fn ignore_error_runs_to_the_end() {
    let dir = tempfile::tempdir().unwrap();
    let path = script(&dir, "fly away\necho after\n");
    let output = soulscript(
        dir.path(),
        &["run", "--dry-run", "--ignore-error", path.to_str().unwrap()],
    );
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert_eq!(stdout(&output), "after\n");
}

#[test]
fn vars_seed_the_script() {
    let dir = tempfile::tempdir().unwrap();
    let path = script(&dir, "echo ${user}@${host}\n");
    let output = soulscript(
        dir.path(),
        &[
            "run",
            "--dry-run",
            "--var",
            "user=alice",
            "--var",
            "host=example.test",
            path.to_str().unwrap(),
        ],
    );
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert_eq!(stdout(&output), "alice@example.test\n");
}

#[test]
fn check_accepts_a_valid_script() {
    let dir = tempfile::tempdir().unwrap();
    let path = script(
        &dir,
        "set_var base https://example.test\ngoto ${base}\nassert_text CSS h1 Example Domain\n",
    );
    let output = soulscript(dir.path(), &["check", path.to_str().unwrap()]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert!(stdout(&output).ends_with(": ok\n"));
}

#[test]
fn check_reports_every_bad_line() {
    let dir = tempfile::tempdir().unwrap();
    let path = script(&dir, "click ID\necho ${missing}\ngoto ${base}\n");
    let output = soulscript(
        dir.path(),
        &["check", "--var", "base=https://example.test", path.to_str().unwrap()],
    );
    assert_eq!(output.status.code(), Some(1));
    let out = stdout(&output);
    assert!(out.contains("line 1:"));
    assert!(out.contains("line 2: undefined variable `missing`"));
    assert!(!out.contains("line 3:"));
}

#[test]
fn commands_lists_the_registry() {
    let dir = tempfile::tempdir().unwrap();
    let output = soulscript(dir.path(), &["commands"]);
    assert!(output.status.success());
    let out = stdout(&output);
    assert!(out.lines().any(|line| line.starts_with("click") && line.contains("L_click")));
    assert!(out.lines().any(|line| line.starts_with("set_var")));
}

#[test]
fn version_includes_build_metadata() {
    let dir = tempfile::tempdir().unwrap();
    let output = soulscript(dir.path(), &["--version"]);
    assert!(output.status.success());
    let out = stdout(&output);
    assert!(out.contains(env!("CARGO_PKG_VERSION")));
    assert!(out.contains("built"));
}

#[cfg(unix)]
#[test]
fn interrupt_during_pause_exits_130() {
    use std::process::Stdio;
    use std::time::{Duration, Instant};

    let dir = tempfile::tempdir().unwrap();
    let path = script(&dir, "pause\necho after\n");
    let mut child = Command::cargo_bin("soulscript")
        .expect("binary built")
        .current_dir(dir.path())
        .env_remove("RUST_LOG")
        .arg("--config")
        .arg(dir.path().join("absent.yaml"))
        .args(["run", "--dry-run"])
        .arg(&path)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .expect("spawn soulscript");
    // keep the pipe open so `pause` blocks on the operator
    let _operator = child.stdin.take();

    std::thread::sleep(Duration::from_millis(1500));
    let sent = Command::new("kill")
        .args(["-INT", &child.id().to_string()])
        .status()
        .expect("run kill");
    assert!(sent.success());

    let deadline = Instant::now() + Duration::from_secs(10);
    let status = loop {
        if let Some(status) = child.try_wait().expect("poll soulscript") {
            break status;
        }
        if Instant::now() >= deadline {
            let _ = child.kill();
            panic!("soulscript did not exit after SIGINT");
        }
        std::thread::sleep(Duration::from_millis(50));
    };
    assert_eq!(status.code(), Some(130));

    let mut out = String::new();
    std::io::Read::read_to_string(&mut child.stdout.take().unwrap(), &mut out).unwrap();
    assert!(!out.contains("after"));
}
