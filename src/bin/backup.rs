//! `backup` — create a compressed archive of directories with tar.

use std::process::ExitCode;

use backup_notify::{archive::ArchiveError, cli::ArchiveCli, commands, ui};
use clap::Parser;

fn main() -> ExitCode {
    let cli = ArchiveCli::parse();

    match commands::archive::run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            // tar's own diagnosis comes first; our summary line follows it.
            if let ArchiveError::Failed { stderr, .. } = &e {
                ui::relay_stderr(stderr);
            }
            ui::error(&e.to_string());
            ExitCode::FAILURE
        },
    }
}
