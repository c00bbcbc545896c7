//! Command-line interface definitions for both binaries.
//!
//! All argument parsing lives here so the rest of the codebase can stay
//! agnostic to `clap`.  Each binary parses its struct once in `main` and
//! passes it (by reference) into the matching handler in
//! [`crate::commands`].

use std::path::PathBuf;

use clap::Parser;

/// Arguments for the `backup` binary.
#[derive(Parser, Debug)]
#[command(
    name    = "backup",
    about   = "Create a compressed archive of directories (incremental supported)",
    version,
    // Show a compact two-column help layout.
    help_template = "\
{before-help}{name} {version}
{about}

{usage-heading} {usage}

{all-args}{after-help}"
)]
pub struct ArchiveCli {
    /// Directory to back up.  Repeat the flag for several directories.
    ///
    /// A single value may also hold several whitespace-separated paths;
    /// each one is treated as its own source.
    #[arg(long = "source", value_name = "DIR", required = true)]
    pub sources: Vec<String>,

    /// Output `.tar.gz` file.
    #[arg(long, value_name = "PATH")]
    pub output: PathBuf,

    /// Snapshot file for incremental backups.
    ///
    /// tar records file state here; the first run with a fresh snapshot is
    /// a full backup, later runs only pick up changes.
    #[arg(long, value_name = "PATH")]
    pub snapshot: Option<PathBuf>,

    /// Patterns to exclude from the backup, passed to tar verbatim.
    #[arg(long = "exclude", value_name = "PATTERN", num_args = 0..)]
    pub excludes: Vec<String>,

    /// Archiver executable to invoke.
    ///
    /// Must accept GNU tar's `--listed-incremental`, `-czf`, `--exclude` and
    /// `-C` flags (use `gtar` on BSD or macOS hosts).
    #[arg(long, value_name = "PROGRAM", default_value = "tar")]
    pub tar: String,
}

/// Arguments for the `send-email` binary.
///
/// Every mail flag is optional and overrides the matching configuration
/// file entry when given.
#[derive(Parser, Debug)]
#[command(name = "send-email", about = "Send a log file via email", version)]
pub struct MailCli {
    /// Path to config.yaml (or a `.toml` file).
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Recipient address.
    #[arg(long)]
    pub to: Option<String>,

    /// Sender address.
    #[arg(long)]
    pub from: Option<String>,

    /// SMTP server host name.
    #[arg(long)]
    pub smtp_server: Option<String>,

    /// SMTP submission port, usually 587.
    #[arg(long)]
    pub smtp_port: Option<u16>,

    /// SMTP login user.
    #[arg(long)]
    pub user: Option<String>,

    /// SMTP login password.
    #[arg(long = "pass")]
    pub password: Option<String>,

    /// Path to the log file to send.
    #[arg(long, value_name = "PATH")]
    pub log: PathBuf,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn archive(extra: &[&str]) -> ArchiveCli {
        ArchiveCli::parse_from(std::iter::once("backup").chain(extra.iter().copied()))
    }

    #[test]
    fn source_flag_repeats() {
        let cli = archive(&["--source", "/a", "--source", "/b c", "--output", "out.tgz"]);
        assert_eq!(cli.sources, vec!["/a", "/b c"]);
        assert_eq!(cli.tar, "tar");
    }

    #[test]
    fn exclude_takes_many_values() {
        let cli = archive(&[
            "--source", "/a", "--exclude", "*.log", "tmp", "--output", "out.tgz",
        ]);
        assert_eq!(cli.excludes, vec!["*.log", "tmp"]);
    }

    #[test]
    fn exclude_accepts_zero_values() {
        let cli = archive(&["--source", "/a", "--output", "out.tgz", "--exclude"]);
        assert!(cli.excludes.is_empty());
    }

    #[test]
    fn missing_output_is_rejected() {
        let res = ArchiveCli::try_parse_from(["backup", "--source", "/a"]);
        assert!(res.is_err());
    }

    #[test]
    fn mail_flags_are_optional_except_log() {
        let cli = MailCli::parse_from(["send-email", "--log", "run.log"]);
        assert!(cli.config.is_none());
        assert!(cli.to.is_none());
        assert!(cli.smtp_port.is_none());
        assert!(MailCli::try_parse_from(["send-email"]).is_err());
    }

    #[test]
    fn mail_pass_flag_maps_to_password() {
        let cli = MailCli::parse_from(["send-email", "--log", "l", "--pass", "pw", "--smtp-port", "587"]);
        assert_eq!(cli.password.as_deref(), Some("pw"));
        assert_eq!(cli.smtp_port, Some(587));
    }
}
