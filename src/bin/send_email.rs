//! `send-email` — mail a backup log.  Always exits 0 once arguments parse.

use backup_notify::{cli::MailCli, commands, mail::SmtpMailer, ui};
use clap::Parser;

fn main() {
    let cli = MailCli::parse();

    if let Err(e) = commands::mail::run(&cli, &SmtpMailer::default()) {
        ui::notice(&e.to_string());
    }
}
