//! Log mailer building blocks: merged settings, the outbound message, and
//! the SMTP transport.
//!
//! Nothing in here decides *policy*.  Every failure is returned as a
//! [`MailError`]; the `send-email` binary turns all of them into a warning
//! and a zero exit status.

use std::{fmt, path::Path, time::Duration};

use lettre::{
    Message, SmtpTransport, Transport,
    message::{Mailbox, header::ContentType},
    transport::smtp::{
        authentication::{Credentials, Mechanism},
        response::Response,
    },
};
use thiserror::Error;

use crate::{cli::MailCli, config::EmailSection};

/// Only the tail of a long log is mailed.
pub const MAX_BODY_CHARS: usize = 100_000;

/// Body used when the log file is empty.
pub const EMPTY_LOG_BODY: &str = "Log file empty";

/// Connect timeout for the SMTP session.
pub const SMTP_TIMEOUT: Duration = Duration::from_secs(30);

type BoxError = Box<dyn std::error::Error + Send + Sync>;

// ─── Errors ───────────────────────────────────────────────────────────────────

/// Reasons a mail was not sent.  None of them are fatal to the process.
#[derive(Debug, Error)]
pub enum MailError {
    #[error("Email not sent; missing fields: {}", .0.join(", "))]
    MissingFields(Vec<&'static str>),

    #[error("Could not read log file {path}: {source}")]
    ReadLog {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Email send failed: invalid {field} address {value:?}: {source}")]
    Address {
        field: &'static str,
        value: String,
        #[source]
        source: lettre::address::AddressError,
    },

    #[error("Email send failed: {0}")]
    Build(#[from] lettre::error::Error),

    #[error("Email send failed: {0}")]
    Transport(#[source] BoxError),
}

// ─── Secret ───────────────────────────────────────────────────────────────────

/// Password wrapper that never shows up in `Debug` output.
#[derive(Clone, PartialEq, Eq)]
pub struct Secret(String);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("***")
    }
}

// ─── Settings ─────────────────────────────────────────────────────────────────

/// CLI flags merged over the configuration file, field by field.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MailSettings {
    pub enabled: bool,
    pub to: Option<String>,
    pub from: Option<String>,
    pub smtp_server: Option<String>,
    pub smtp_port: Option<u16>,
    pub user: Option<String>,
    pub password: Option<Secret>,
}

/// Settings with every required field present.
#[derive(Debug, Clone, PartialEq)]
pub struct SmtpTarget {
    pub to: String,
    pub from: String,
    pub server: String,
    pub port: u16,
    pub user: String,
    pub password: Secret,
}

impl MailSettings {
    /// Merge `cli` over `file`.  Empty CLI values do not override.
    ///
    /// `enabled` only comes from the file and is true when it reads `true`
    /// in any letter case.
    pub fn merge(cli: &MailCli, file: &EmailSection) -> Self {
        let pick = |flag: &Option<String>, key: &str| {
            non_empty(flag.clone()).or_else(|| non_empty(file.get(key).cloned()))
        };

        // An unparsable port is reported later as a missing SMTP_PORT; a
        // disabled mailer must stay silent.
        let file_port = file
            .get("SMTP_PORT")
            .and_then(|raw| raw.trim().parse::<u16>().ok());

        Self {
            enabled: file
                .get("ENABLED")
                .is_some_and(|v| v.eq_ignore_ascii_case("true")),
            to: pick(&cli.to, "TO"),
            from: pick(&cli.from, "FROM"),
            smtp_server: pick(&cli.smtp_server, "SMTP_SERVER"),
            smtp_port: cli
                .smtp_port
                .filter(|&p| p != 0)
                .or(file_port.filter(|&p| p != 0)),
            user: pick(&cli.user, "USER"),
            password: pick(&cli.password, "PASS").map(Secret::new),
        }
    }

    /// Names of required fields that are absent, in a fixed order.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        [
            ("TO", self.to.is_none()),
            ("FROM", self.from.is_none()),
            ("SMTP_SERVER", self.smtp_server.is_none()),
            ("SMTP_PORT", self.smtp_port.is_none()),
            ("USER", self.user.is_none()),
            ("PASS", self.password.is_none()),
        ]
        .into_iter()
        .filter_map(|(name, missing)| missing.then_some(name))
        .collect()
    }

    /// Check every required field is present.
    pub fn require(&self) -> Result<SmtpTarget, MailError> {
        match (
            &self.to,
            &self.from,
            &self.smtp_server,
            self.smtp_port,
            &self.user,
            &self.password,
        ) {
            (Some(to), Some(from), Some(server), Some(port), Some(user), Some(password)) => {
                Ok(SmtpTarget {
                    to: to.clone(),
                    from: from.clone(),
                    server: server.clone(),
                    port,
                    user: user.clone(),
                    password: password.clone(),
                })
            },
            _ => Err(MailError::MissingFields(self.missing_fields())),
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

// ─── Log body ─────────────────────────────────────────────────────────────────

/// Read the log, decoding invalid UTF-8 as U+FFFD, and keep the trailing
/// [`MAX_BODY_CHARS`] characters.
pub fn read_log_body(path: &Path) -> Result<String, MailError> {
    let bytes = std::fs::read(path).map_err(|source| MailError::ReadLog {
        path: path.display().to_string(),
        source,
    })?;
    let text = String::from_utf8_lossy(&bytes);
    Ok(body_from_log(&text))
}

/// Trailing [`MAX_BODY_CHARS`] of `text`, or [`EMPTY_LOG_BODY`].
pub fn body_from_log(text: &str) -> String {
    let tail = tail_chars(text, MAX_BODY_CHARS);
    if tail.is_empty() {
        EMPTY_LOG_BODY.into()
    } else {
        tail.into()
    }
}

/// The last `max` characters of `text`.
pub fn tail_chars(text: &str, max: usize) -> &str {
    if max == 0 {
        return "";
    }
    match text.char_indices().rev().nth(max - 1) {
        Some((start, _)) => &text[start..],
        None => text,
    }
}

// ─── Message ──────────────────────────────────────────────────────────────────

/// A plain-text report, ready to hand to a [`MailTransport`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundMessage {
    pub subject: String,
    pub from: String,
    pub to: String,
    pub body: String,
}

impl OutboundMessage {
    pub fn new(target: &SmtpTarget, hostname: &str, body: String) -> Self {
        Self {
            subject: format!("Backup Report - {hostname}"),
            from: target.from.clone(),
            to: target.to.clone(),
            body,
        }
    }

    /// Build the wire message, validating both addresses.
    pub fn to_email(&self) -> Result<Message, MailError> {
        let from = parse_mailbox("FROM", &self.from)?;
        let to = parse_mailbox("TO", &self.to)?;
        Ok(Message::builder()
            .from(from)
            .to(to)
            .subject(self.subject.clone())
            .header(ContentType::TEXT_PLAIN)
            .body(self.body.clone())?)
    }
}

fn parse_mailbox(field: &'static str, value: &str) -> Result<Mailbox, MailError> {
    value.parse().map_err(|source| MailError::Address {
        field,
        value: value.into(),
        source,
    })
}

/// Name of this machine for the subject line.
pub fn local_hostname() -> String {
    hostname::get()
        .ok()
        .and_then(|h| h.into_string().ok())
        .filter(|h| !h.is_empty())
        .or_else(|| std::env::var("COMPUTERNAME").ok())
        .or_else(|| std::env::var("HOSTNAME").ok())
        .unwrap_or_else(|| "host".into())
}

// ─── Transport ────────────────────────────────────────────────────────────────

/// Something that can deliver an [`OutboundMessage`].
pub trait MailTransport {
    fn deliver(&self, target: &SmtpTarget, message: &OutboundMessage) -> Result<(), MailError>;
}

/// STARTTLS submission with username/password auth.
#[derive(Debug, Clone)]
pub struct SmtpMailer {
    pub timeout: Duration,
}

impl Default for SmtpMailer {
    fn default() -> Self {
        Self {
            timeout: SMTP_TIMEOUT,
        }
    }
}

impl MailTransport for SmtpMailer {
    fn deliver(&self, target: &SmtpTarget, message: &OutboundMessage) -> Result<(), MailError> {
        let email = message.to_email()?;

        let creds = Credentials::new(target.user.clone(), target.password.expose().to_owned());

        // starttls_relay uses the platform's default trust roots and refuses
        // to continue unless the upgrade succeeds.
        let mailer = SmtpTransport::starttls_relay(&target.server)
            .map_err(|e| MailError::Transport(e.into()))?
            .port(target.port)
            .timeout(Some(self.timeout))
            .credentials(creds)
            .authentication(vec![Mechanism::Login, Mechanism::Plain])
            .build();

        let response = mailer
            .send(&email)
            .map_err(|e| MailError::Transport(e.into()))?;
        check_reply(&response)
    }
}

/// Turn a non-positive final reply into a transport error.
fn check_reply(response: &Response) -> Result<(), MailError> {
    if response.is_positive() {
        return Ok(());
    }
    let text = response.message().collect::<Vec<_>>().join(" ");
    Err(MailError::Transport(
        format!("server replied {}: {text}", response.code()).into(),
    ))
}

// ─── Tests ────────────────────────────────────────────────────────────────────
