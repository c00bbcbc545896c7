//! Mail configuration loading.
//!
//! The mailer shares its configuration file with the rest of the backup
//! pipeline, so only the email section is of interest here.  Two shapes are
//! accepted, with keys matched case-insensitively:
//!
//! ```yaml
//! EMAIL:
//!   ENABLED: true
//!   TO: ops@example.com
//!   FROM: backup@example.com
//!   SMTP_SERVER: smtp.example.com
//!   SMTP_PORT: 587
//!   USER: backup
//!   PASS: secret
//! ```
//!
//! or the flat form `EMAIL_ENABLED: true`, `EMAIL_TO: ...`, and so on.
//!
//! Files ending in `.toml` are parsed as TOML; anything else as YAML.

use std::{collections::BTreeMap, path::Path};

use anyhow::{Context, Result};
use serde::{Deserialize, de::IgnoredAny};

// ─── Value tree ───────────────────────────────────────────────────────────────

/// Format-neutral view of a configuration document.
///
/// Only mappings and scalars matter; sequences, nulls and datetimes collapse
/// into [`ConfigValue::Other`].
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ConfigValue {
    Map(BTreeMap<String, ConfigValue>),
    Text(String),
    Bool(bool),
    Int(i64),
    Float(f64),
    Other(IgnoredAny),
}

impl ConfigValue {
    /// Scalar rendered as text, the way it would read in the file.
    pub fn as_text(&self) -> Option<String> {
        match self {
            Self::Text(s) => Some(s.clone()),
            Self::Bool(b) => Some(b.to_string()),
            Self::Int(i) => Some(i.to_string()),
            Self::Float(f) => Some(f.to_string()),
            Self::Map(_) | Self::Other(_) => None,
        }
    }
}

/// Upper-cased email keys (`TO`, `SMTP_PORT`, ...) mapped to their values.
pub type EmailSection = BTreeMap<String, String>;

// ─── Loader ───────────────────────────────────────────────────────────────────

/// Read and parse the configuration file at `path`.
///
/// Returns `Ok(None)` when no path was given or the file does not exist;
/// both simply mean "no configuration".  Returns an error if the file exists
/// but cannot be read or parsed.
pub fn load_config(path: Option<&Path>) -> Result<Option<BTreeMap<String, ConfigValue>>> {
    let Some(path) = path else {
        return Ok(None);
    };

    let text = match std::fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e).with_context(|| format!("reading {}", path.display())),
    };

    parse_document(path, &text).map(Some)
}

/// Load the configuration, downgrading every failure to a warning.
///
/// This is the mailer's policy: a broken config file must never stop the
/// run, it just means no file-based settings.
pub fn load_email_section(path: Option<&Path>) -> EmailSection {
    match load_config(path) {
        Ok(Some(doc)) => extract_email(&doc),
        Ok(None) => EmailSection::new(),
        Err(e) => {
            let shown = path.map(|p| p.display().to_string()).unwrap_or_default();
            crate::ui::warn(&format!("Failed to load config {shown}: {e:#}"));
            EmailSection::new()
        },
    }
}

fn parse_document(path: &Path, text: &str) -> Result<BTreeMap<String, ConfigValue>> {
    let is_toml = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("toml"));

    let root: Option<ConfigValue> = if is_toml {
        let table: ConfigValue =
            toml::from_str(text).with_context(|| format!("parsing {}", path.display()))?;
        Some(table)
    } else {
        serde_yml::from_str(text).with_context(|| format!("parsing {}", path.display()))?
    };

    // An empty YAML document or a top-level scalar carries no settings.
    Ok(match root {
        Some(ConfigValue::Map(map)) => map,
        _ => BTreeMap::new(),
    })
}

// ─── Email section ────────────────────────────────────────────────────────────

/// Pull the email settings out of a parsed document.
///
/// A non-empty `EMAIL` mapping wins; otherwise `EMAIL_*` keys at the top
/// level are collected with the prefix stripped.  Keys come back upper-case.
pub fn extract_email(doc: &BTreeMap<String, ConfigValue>) -> EmailSection {
    let nested = doc
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case("EMAIL"))
        .map(|(_, v)| v);

    match nested {
        Some(ConfigValue::Map(section)) if !section.is_empty() => scalars(section.iter()),
        // `EMAIL: "yes"` and friends are not a usable section.
        Some(v) if is_truthy(v) => EmailSection::new(),
        _ => scalars(doc.iter().filter_map(|(k, v)| {
            let head = k.get(..6)?;
            head.eq_ignore_ascii_case("EMAIL_").then(|| (&k[6..], v))
        })),
    }
}

fn scalars<'a, K, I>(entries: I) -> EmailSection
where
    K: AsRef<str> + 'a,
    I: Iterator<Item = (K, &'a ConfigValue)>,
{
    entries
        .filter_map(|(k, v)| Some((k.as_ref().to_ascii_uppercase(), v.as_text()?)))
        .collect()
}

/// Mirrors how an empty or false `EMAIL` entry falls through to the flat
/// keys.
fn is_truthy(v: &ConfigValue) -> bool {
    match v {
        ConfigValue::Map(m) => !m.is_empty(),
        ConfigValue::Text(s) => !s.is_empty(),
        ConfigValue::Bool(b) => *b,
        ConfigValue::Int(i) => *i != 0,
        ConfigValue::Float(f) => *f != 0.0,
        ConfigValue::Other(_) => false,
    }
}

// ─── Tests ────────────────────────────────────────────────────────────────────
