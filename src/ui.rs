//! Terminal output: the archiver spinner, captured command execution, and
//! the stderr reporting used by both binaries.
//!
//! # Design goals
//!
//! - **Silent on success.** Both tools run from cron; a clean run prints nothing. The spinner is
//!   drawn on stderr only when it is a terminal and is cleared before returning.
//! - **Informative on failure.** If tar exits non-zero its captured stderr is relayed verbatim so the
//!   operator sees tar's own diagnosis.
//! - **Stdout untouched.** The child writes straight to our stdout, so `--output -` can stream an
//!   archive into a pipe.
//! - **Plain when piped.** Styling goes through [`console::StyledObject::for_stderr`], so colour
//!   codes only appear when stderr is a terminal and log files stay readable.

use std::{
    ffi::OsString,
    io::Write,
    process::{Command, Output, Stdio},
    time::Duration,
};

use anyhow::{Context, Result};
use console::style;
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};

// ─── Spinner ──────────────────────────────────────────────────────────────────

/// Braille spinner frames — same style as indicatif's default.
static SPINNER_CHARS: &str = "⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏";

/// Create and start an indeterminate spinner for `label` on stderr.
///
/// indicatif hides the bar automatically when stderr is not a terminal.
fn make_spinner(label: &str) -> ProgressBar {
    let pb = ProgressBar::with_draw_target(None, ProgressDrawTarget::stderr());
    if let Ok(template) = ProgressStyle::with_template("  {spinner:.cyan}  {msg}") {
        pb.set_style(template.tick_chars(SPINNER_CHARS));
    }
    pb.set_message(format!("{}", style(label).dim().for_stderr()));
    pb.enable_steady_tick(Duration::from_millis(80));
    pb
}

// ─── Captured execution ───────────────────────────────────────────────────────

/// What a finished child process left behind on stderr.
#[derive(Debug)]
pub struct CapturedRun {
    pub success: bool,
    /// Human-readable exit status, e.g. `exit status: 2`.
    pub status: String,
    pub stderr: String,
}

/// Run a command, capturing its stderr.
///
/// `args[0]` is the program.  Stdout is inherited so the child can stream
/// data to whoever reads ours; stderr is buffered so the spinner can own the
/// terminal while the command runs.
pub fn run_captured(args: &[OsString]) -> Result<CapturedRun> {
    let (prog, rest) = args.split_first().context("cannot run an empty command")?;

    let output: Output = Command::new(prog)
        .args(rest)
        .stdin(Stdio::null())
        .stdout(Stdio::inherit())
        .stderr(Stdio::piped())
        .output()
        .with_context(|| format!("failed to spawn: {}", prog.to_string_lossy()))?;

    Ok(CapturedRun {
        success: output.status.success(),
        status: output.status.to_string(),
        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
    })
}

/// [`run_captured`] behind a spinner labelled `label`.
///
/// The spinner is cleared before this returns, whatever the outcome.
pub fn run_stage(label: &str, args: &[OsString]) -> Result<CapturedRun> {
    let spinner = make_spinner(label);
    let result = run_captured(args);
    spinner.finish_and_clear();
    result
}

// ─── Reporting ────────────────────────────────────────────────────────────────

/// Print a red `Error:` line to stderr.
pub fn error(msg: &str) {
    eprintln!("{} {msg}", style("Error:").red().bold().for_stderr());
}

/// Print a line with a yellow `WARN:` tag to stderr.
pub fn warn(msg: &str) {
    eprintln!("{} {msg}", style("WARN:").yellow().bold().for_stderr());
}

/// Print an untagged yellow line to stderr.
pub fn notice(msg: &str) {
    eprintln!("{}", style(msg).yellow().for_stderr());
}

/// Copy a child's captured stderr to our stderr byte for byte.
pub fn relay_stderr(captured: &str) {
    let mut err = std::io::stderr().lock();
    // Nothing sensible is left to do if stderr itself is gone.
    let _ = err.write_all(captured.as_bytes());
    let _ = err.flush();
}

// ─── Tests ────────────────────────────────────────────────────────────────────
