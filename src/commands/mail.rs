//! `send-email` — mail the tail of a backup log.
//!
//! # Steps
//!
//! | # | Step     | Stops with                                           |
//! |---|----------|------------------------------------------------------|
//! | 1 | Config   | never (bad files degrade to empty, with a warning)   |
//! | 2 | Merge    | [`MailOutcome::Disabled`] when `ENABLED` isn't true  |
//! | 3 | Require  | [`MailError::MissingFields`]                         |
//! | 4 | Read log | [`MailError::ReadLog`]                               |
//! | 5 | Send     | any transport error                                  |
//!
//! Every stop is soft.  The binary reports the error and still exits 0, so a
//! mail outage can never be mistaken for a failed backup.

use crate::{
    cli::MailCli,
    config::load_email_section,
    mail::{
        MailError, MailSettings, MailTransport, OutboundMessage, local_hostname, read_log_body,
    },
};

/// What happened when nothing went wrong.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MailOutcome {
    /// `ENABLED` is not true; nothing was read or sent.
    Disabled,
    Sent,
}

/// Load config, merge flags, and hand the report to `transport`.
pub fn run(cli: &MailCli, transport: &dyn MailTransport) -> Result<MailOutcome, MailError> {
    let file = load_email_section(cli.config.as_deref());
    let settings = MailSettings::merge(cli, &file);

    if !settings.enabled {
        return Ok(MailOutcome::Disabled);
    }

    let target = settings.require()?;
    let body = read_log_body(&cli.log)?;
    let message = OutboundMessage::new(&target, &local_hostname(), body);

    transport.deliver(&target, &message)?;
    Ok(MailOutcome::Sent)
}

// ─── Tests ────────────────────────────────────────────────────────────────────
