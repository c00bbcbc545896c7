//! `backup-notify` — two small cron companions for a backup pipeline.
//!
//! # Overview
//!
//! `backup` is a thin wrapper around `tar` that produces full or incremental
//! `.tar.gz` archives of one or more directories.  `send-email` mails the
//! tail of the resulting log over STARTTLS-authenticated SMTP.  They share no
//! state; a scheduler runs one after the other.
//!
//! # Usage
//!
//! ```text
//! backup --source /srv/www --source /srv/mail --output /backups/srv.tar.gz \
//!        --snapshot /var/lib/backup/srv.snar --exclude '*.log' cache
//! send-email --config /etc/backup/config.yaml --log /var/log/backup.log
//! ```
//!
//! # Failure policy
//!
//! `backup` exits 1 whenever no archive was produced.  `send-email` always
//! exits 0: every problem is reported on stderr and the run ends quietly.
//!
//! # Module layout
//!
//! | Module                   | Responsibility                              |
//! |--------------------------|---------------------------------------------|
//! | [`cli`]                  | Argument types parsed by clap               |
//! | [`archive`]              | Backup request + tar argument construction  |
//! | [`config`]               | Config file loader, `EMAIL` section         |
//! | [`mail`]                 | Merged settings, message, SMTP transport    |
//! | [`ui`]                   | Spinner, captured execution, stderr output  |
//! | [`commands::archive`]    | `backup` handler                            |
//! | [`commands::mail`]       | `send-email` handler                        |

pub mod archive;
pub mod cli;
pub mod commands;
pub mod config;
pub mod mail;
pub mod ui;
