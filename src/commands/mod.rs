//! Command handlers.
//!
//! Each file in this module corresponds to one binary:
//!
//! | File          | Invocation     | Description                             |
//! |---------------|----------------|-----------------------------------------|
//! | `archive.rs`  | `backup`       | Build a full or incremental tar archive |
//! | `mail.rs`     | `send-email`   | Mail the tail of a log file             |

pub mod archive;
pub mod mail;
