//! Integration tests for the `backup` and `send-email` binaries.
//!
//! These tests spawn the compiled binaries and assert on exit codes, stdout,
//! and stderr.  Neither tar nor an SMTP server is required: the archiver is
//! replaced with `--tar <stand-in>`, and mail is pointed at a closed local
//! port.
//!
//! # Running
//!
//! ```sh
//! cargo test --test integration
//! ```

use std::{fs, net::TcpListener, path::Path, process::Command};

const BACKUP: &str = env!("CARGO_BIN_EXE_backup");
const SEND_EMAIL: &str = env!("CARGO_BIN_EXE_send-email");

// ─── Helpers ─────────────────────────────────────────────────────────────────

/// Run `bin` with `args`.  Returns `(exit_code, stdout, stderr)`.
fn run(bin: &str, args: &[&str]) -> (Option<i32>, String, String) {
    let out = Command::new(bin)
        .args(args)
        .current_dir(std::env::temp_dir())
        .output()
        .unwrap_or_else(|e| panic!("failed to spawn {bin}: {e}"));

    (
        out.status.code(),
        String::from_utf8_lossy(&out.stdout).into_owned(),
        String::from_utf8_lossy(&out.stderr).into_owned(),
    )
}

/// Write an executable shell script standing in for tar.
#[cfg(unix)]
fn fake_tar(dir: &Path, body: &str) -> String {
    use std::os::unix::fs::PermissionsExt;

    let path = dir.join("fake-tar");
    fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
    path.to_str().unwrap().to_string()
}

/// A localhost port with nothing listening on it.
fn closed_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap().port()
}

// ─── backup: --help / --version ───────────────────────────────────────────────

#[test]
fn backup_help_exits_zero() {
    let (code, stdout, _) = run(BACKUP, &["--help"]);
    assert_eq!(code, Some(0));
    assert!(stdout.contains("--source"));
    assert!(stdout.contains("--snapshot"));
}

#[test]
fn backup_version_exits_zero() {
    let (code, stdout, _) = run(BACKUP, &["--version"]);
    assert_eq!(code, Some(0));
    assert!(stdout.contains("0.1.0"));
}

// ─── backup: usage errors ─────────────────────────────────────────────────────

#[test]
fn backup_blank_source_exits_one() {
    let (code, _, stderr) = run(BACKUP, &["--source", "  ", "--output", "/tmp/x.tgz"]);
    assert_eq!(code, Some(1));
    assert!(stderr.contains("No sources provided"), "stderr: {stderr}");
}

#[test]
fn backup_without_output_is_a_clap_error() {
    let (code, _, _) = run(BACKUP, &["--source", "/tmp"]);
    assert_eq!(code, Some(2));
}

#[test]
fn backup_unknown_flag_exits_nonzero() {
    let (code, _, _) = run(BACKUP, &["--this-flag-does-not-exist"]);
    assert_ne!(code, Some(0));
}

// ─── backup: archiver outcomes ────────────────────────────────────────────────

#[test]
fn backup_missing_archiver_exits_one() {
    let (code, _, stderr) = run(BACKUP, &[
        "--source",
        "/tmp",
        "--output",
        "/tmp/x.tgz",
        "--tar",
        "definitely-not-a-real-tar-7f3a",
    ]);
    assert_eq!(code, Some(1));
    assert!(
        stderr.contains("Failed executing definitely-not-a-real-tar-7f3a"),
        "stderr: {stderr}"
    );
}

#[cfg(unix)]
#[test]
fn backup_relays_archiver_stderr_on_failure() {
    let dir = tempfile::tempdir().unwrap();
    let tar = fake_tar(dir.path(), "echo 'tar: /nope: Cannot stat' >&2\nexit 2");

    let (code, stdout, stderr) = run(BACKUP, &[
        "--source", "/srv/a", "--output", "/tmp/x.tgz", "--tar", &tar,
    ]);
    assert_eq!(code, Some(1));
    assert!(stdout.is_empty());
    assert!(
        stderr.starts_with("tar: /nope: Cannot stat\n"),
        "stderr: {stderr}"
    );
}

#[cfg(unix)]
#[test]
fn backup_success_is_silent() {
    let dir = tempfile::tempdir().unwrap();
    let tar = fake_tar(dir.path(), "exit 0");

    let (code, stdout, stderr) = run(BACKUP, &[
        "--source", "/srv/a", "--output", "/tmp/x.tgz", "--tar", &tar,
    ]);
    assert_eq!(code, Some(0));
    assert!(stdout.is_empty(), "stdout: {stdout}");
    assert!(stderr.is_empty(), "stderr: {stderr}");
}

#[cfg(unix)]
#[test]
fn backup_to_stdout_streams_the_archive() {
    let dir = tempfile::tempdir().unwrap();
    // Echo the output argument so the test sees tar was told to write to `-`.
    let tar = fake_tar(dir.path(), "printf 'ARCHIVE-BYTES:%s' \"$2\"");

    let (code, stdout, stderr) = run(BACKUP, &[
        "--source", "/srv/a", "--output", "-", "--tar", &tar,
    ]);
    assert_eq!(code, Some(0), "stderr: {stderr}");
    assert_eq!(stdout, "ARCHIVE-BYTES:-");
    assert!(stderr.is_empty(), "stderr: {stderr}");
}

#[cfg(unix)]
#[test]
fn backup_passes_the_built_arguments() {
    let dir = tempfile::tempdir().unwrap();
    let argv = dir.path().join("argv");
    let tar = fake_tar(
        dir.path(),
        &format!("printf '%s\\n' \"$@\" > '{}'", argv.display()),
    );

    let (code, _, _) = run(BACKUP, &[
        "--source",
        "/srv/www /srv/mail",
        "--output",
        "/backups/srv.tgz",
        "--snapshot",
        "/var/lib/backup/srv.snar",
        "--exclude",
        "*.log",
        "cache",
        "--tar",
        &tar,
    ]);
    assert_eq!(code, Some(0));

    let recorded = fs::read_to_string(argv).unwrap();
    assert_eq!(
        recorded.lines().collect::<Vec<_>>(),
        vec![
            "--listed-incremental=/var/lib/backup/srv.snar",
            "-czf",
            "/backups/srv.tgz",
            "--exclude=*.log",
            "--exclude=cache",
            "-C",
            "/srv",
            "www",
            "mail",
        ]
    );
}

// ─── send-email ───────────────────────────────────────────────────────────────

const FULL_CONFIG: &str = "\
EMAIL:
  ENABLED: true
  TO: ops@example.com
  FROM: backup@example.com
  SMTP_SERVER: 127.0.0.1
  SMTP_PORT: {port}
  USER: backup
  PASS: s3cret
";

#[test]
fn send_email_help_exits_zero() {
    let (code, stdout, _) = run(SEND_EMAIL, &["--help"]);
    assert_eq!(code, Some(0));
    assert!(stdout.contains("--smtp-server"));
}

#[test]
fn send_email_requires_log() {
    let (code, _, _) = run(SEND_EMAIL, &[]);
    assert_eq!(code, Some(2));
}

#[test]
fn send_email_without_config_is_silent() {
    let (code, stdout, stderr) = run(SEND_EMAIL, &["--log", "/nonexistent/backup.log"]);
    assert_eq!(code, Some(0));
    assert!(stdout.is_empty());
    assert!(stderr.is_empty(), "stderr: {stderr}");
}

#[test]
fn send_email_reports_missing_fields() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = dir.path().join("config.yaml");
    fs::write(&cfg, "EMAIL:\n  ENABLED: true\n  TO: ops@example.com\n").unwrap();

    let (code, _, stderr) = run(SEND_EMAIL, &[
        "--config",
        cfg.to_str().unwrap(),
        "--log",
        "/nonexistent/backup.log",
        "--user",
        "backup",
    ]);
    assert_eq!(code, Some(0));
    // Mail failures are reported untagged.
    assert_eq!(
        stderr,
        "Email not sent; missing fields: FROM, SMTP_SERVER, SMTP_PORT, PASS\n"
    );
}

#[test]
fn send_email_warns_on_broken_config() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = dir.path().join("config.toml");
    fs::write(&cfg, "not valid toml ][[[").unwrap();

    let (code, _, stderr) = run(SEND_EMAIL, &[
        "--config",
        cfg.to_str().unwrap(),
        "--log",
        "/nonexistent/backup.log",
    ]);
    assert_eq!(code, Some(0));
    assert!(
        stderr.starts_with("WARN: Failed to load config"),
        "stderr: {stderr}"
    );
}

#[test]
fn send_email_reports_unreadable_log() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = dir.path().join("config.yaml");
    fs::write(&cfg, FULL_CONFIG.replace("{port}", "587")).unwrap();

    let (code, _, stderr) = run(SEND_EMAIL, &[
        "--config",
        cfg.to_str().unwrap(),
        "--log",
        dir.path().join("missing.log").to_str().unwrap(),
    ]);
    assert_eq!(code, Some(0));
    assert!(stderr.contains("Could not read log file"), "stderr: {stderr}");
}

#[test]
fn send_email_connection_failure_still_exits_zero() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = dir.path().join("config.yaml");
    let log = dir.path().join("backup.log");
    fs::write(&cfg, FULL_CONFIG.replace("{port}", &closed_port().to_string())).unwrap();
    fs::write(&log, "backup finished\n").unwrap();

    let (code, _, stderr) = run(SEND_EMAIL, &[
        "--config",
        cfg.to_str().unwrap(),
        "--log",
        log.to_str().unwrap(),
    ]);
    assert_eq!(code, Some(0));
    assert!(stderr.contains("Email send failed"), "stderr: {stderr}");
}
