//! `backup` — build one compressed archive with tar.
//!
//! # Steps
//!
//! | # | Step     | Failure                                   |
//! |---|----------|-------------------------------------------|
//! | 1 | Resolve  | no sources → `No sources provided`        |
//! | 2 | Build    | (pure, cannot fail)                       |
//! | 3 | Archive  | spawn error or non-zero exit from tar     |
//!
//! tar runs behind a spinner with its stderr captured; stdout is passed
//! through so `--output -` streams the archive.  A clean run prints nothing
//! else; a failed one replays tar's stderr.

use crate::{
    archive::{ArchiveError, BackupRequest, build_tar_args},
    cli::ArchiveCli,
    ui::run_stage,
};

/// Resolve the request from `cli`, run tar, and map the outcome.
pub fn run(cli: &ArchiveCli) -> Result<(), ArchiveError> {
    let request = BackupRequest::new(
        &cli.sources,
        cli.output.clone(),
        cli.snapshot.clone(),
        cli.excludes.clone(),
    )?;
    execute(&cli.tar, &request)
}

/// Run the archiver for an already-validated request.
pub fn execute(program: &str, request: &BackupRequest) -> Result<(), ArchiveError> {
    let args = build_tar_args(program, request);

    let label = format!("Archiving to {}", request.output.display());
    let captured = run_stage(&label, &args).map_err(|e| ArchiveError::Launch {
        program: program.into(),
        reason: format!("{e:#}"),
    })?;

    if captured.success {
        Ok(())
    } else {
        Err(ArchiveError::Failed {
            program: program.into(),
            status: captured.status,
            stderr: captured.stderr,
        })
    }
}

// ─── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use std::path::Path;

    use clap::Parser;

    use super::*;

    fn make_cli(extra: &[&str]) -> ArchiveCli {
        ArchiveCli::parse_from(std::iter::once("backup").chain(extra.iter().copied()))
    }

    fn request(dir: &Path) -> BackupRequest {
        BackupRequest::resolve_in(
            dir,
            &["src".to_string()],
            dir.join("out.tar.gz"),
            None,
            vec![],
        )
        .unwrap()
    }

    #[test]
    fn blank_source_is_a_usage_error() {
        let cli = make_cli(&["--source", " ", "--output", "/tmp/x.tar.gz"]);
        assert!(matches!(run(&cli), Err(ArchiveError::NoSources)));
    }

    #[test]
    fn successful_program_is_ok() {
        let dir = tempfile::tempdir().unwrap();
        assert!(execute("true", &request(dir.path())).is_ok());
    }

    #[test]
    fn failing_program_is_reported_with_status() {
        let dir = tempfile::tempdir().unwrap();
        let err = execute("false", &request(dir.path())).unwrap_err();
        match err {
            ArchiveError::Failed { program, status, .. } => {
                assert_eq!(program, "false");
                assert!(!status.is_empty());
            },
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn missing_program_is_a_launch_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = execute("definitely-not-a-real-tar-7f3a", &request(dir.path())).unwrap_err();
        assert!(matches!(err, ArchiveError::Launch { .. }));
        assert!(
            err.to_string()
                .starts_with("Failed executing definitely-not-a-real-tar-7f3a:")
        );
    }
}
