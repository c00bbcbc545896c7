//! tar argument construction.
//!
//! This module is responsible for *building* the argument list that will be
//! passed to tar.  It does **not** execute anything; process execution lives
//! in [`crate::ui`] so the spinner can own the terminal while tar runs.
//!
//! Everything here is pure and unit-testable without spawning a child
//! process.  Paths stay [`OsString`]s all the way to `exec`, so names that
//! are not valid UTF-8 reach tar byte for byte.
//!
//! # Path layout
//!
//! When every source shares one parent directory, tar is run with
//! `-C <parent>` and the base names, so archive entries are relative.  Mixed
//! parents fall back to absolute paths and the entries keep them.

use std::{
    collections::BTreeSet,
    ffi::OsString,
    path::{Component, Path, PathBuf},
};

use thiserror::Error;

// ─── Errors ───────────────────────────────────────────────────────────────────

/// Every way the `backup` binary can fail.  All of them exit with status 1.
#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("No sources provided")]
    NoSources,

    #[error("Failed executing {program}: {reason}")]
    Launch { program: String, reason: String },

    #[error("cannot resolve the current directory: {0}")]
    WorkingDir(#[source] std::io::Error),

    /// tar ran but exited non-zero.  `stderr` is relayed verbatim.
    #[error("{program} exited with {status}")]
    Failed {
        program: String,
        status: String,
        stderr: String,
    },
}

// ─── Request ──────────────────────────────────────────────────────────────────

/// A validated backup request.  `sources` is never empty and every entry is
/// absolute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupRequest {
    pub sources: Vec<PathBuf>,
    pub output: PathBuf,
    pub snapshot: Option<PathBuf>,
    pub excludes: Vec<String>,
}

/// Where tar should find the sources.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceLayout {
    /// `-C <parent>` followed by base names.
    SharedParent { parent: PathBuf, names: Vec<OsString> },
    /// Literal absolute paths.
    Absolute(Vec<PathBuf>),
}

impl BackupRequest {
    /// Build a request from raw `--source` values.
    ///
    /// Each value is split on whitespace, so `--source "/srv/a /srv/b"`
    /// yields two sources.  Relative tokens are resolved against the current
    /// working directory.
    pub fn new(
        raw_sources: &[String],
        output: PathBuf,
        snapshot: Option<PathBuf>,
        excludes: Vec<String>,
    ) -> Result<Self, ArchiveError> {
        let cwd = std::env::current_dir().map_err(ArchiveError::WorkingDir)?;
        Self::resolve_in(&cwd, raw_sources, output, snapshot, excludes)
    }

    /// Same as [`BackupRequest::new`] with an explicit base directory.
    pub fn resolve_in(
        base: &Path,
        raw_sources: &[String],
        output: PathBuf,
        snapshot: Option<PathBuf>,
        excludes: Vec<String>,
    ) -> Result<Self, ArchiveError> {
        let sources: Vec<PathBuf> = raw_sources
            .iter()
            .flat_map(|group| group.split_whitespace())
            .map(|token| absolutize(base, Path::new(token)))
            .collect();

        if sources.is_empty() {
            return Err(ArchiveError::NoSources);
        }

        Ok(Self {
            sources,
            output,
            snapshot,
            excludes,
        })
    }

    /// Decide between the `-C` layout and absolute paths.
    pub fn layout(&self) -> SourceLayout {
        let parents: BTreeSet<&Path> = self.sources.iter().map(|s| parent_of(s)).collect();

        match parents.into_iter().collect::<Vec<_>>().as_slice() {
            [parent] => SourceLayout::SharedParent {
                parent: parent.to_path_buf(),
                names: self.sources.iter().map(|s| base_name(s)).collect(),
            },
            _ => SourceLayout::Absolute(self.sources.clone()),
        }
    }
}

// ─── tar command ──────────────────────────────────────────────────────────────

/// Builds the full argument list, program first:
///
/// ```text
/// tar  [--listed-incremental=<snap>]  -czf <output>  [--exclude=<p>...]  (-C <parent> <names...> | <paths...>)
/// ```
///
/// The snapshot flag must precede `-czf`, and excludes must precede every
/// path argument, or tar ignores them.
pub fn build_tar_args(program: &str, req: &BackupRequest) -> Vec<OsString> {
    let mut cmd: Vec<OsString> = vec![program.into()];

    if let Some(snapshot) = &req.snapshot {
        let mut flag = OsString::from("--listed-incremental=");
        flag.push(snapshot);
        cmd.push(flag);
    }
    cmd.extend(["-czf".into(), req.output.clone().into_os_string()]);

    for pattern in &req.excludes {
        cmd.push(format!("--exclude={pattern}").into());
    }

    match req.layout() {
        SourceLayout::SharedParent { parent, names } => {
            cmd.extend(["-C".into(), parent.into_os_string()]);
            cmd.extend(names);
        },
        SourceLayout::Absolute(paths) => {
            cmd.extend(paths.into_iter().map(PathBuf::into_os_string));
        },
    }
    cmd
}

// ─── Path helpers ─────────────────────────────────────────────────────────────

/// Join `path` onto `base` (when relative) and fold `.`/`..` lexically,
/// without touching the filesystem or resolving symlinks.
pub fn absolutize(base: &Path, path: &Path) -> PathBuf {
    let joined = if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    };

    let mut out = PathBuf::new();
    for component in joined.components() {
        match component {
            Component::CurDir => {},
            Component::ParentDir => {
                // `pop` refuses to remove the root, so `/..` stays `/`.
                out.pop();
            },
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// The filesystem root is its own parent.
fn parent_of(path: &Path) -> &Path {
    path.parent().unwrap_or(path)
}

fn base_name(path: &Path) -> OsString {
    path.file_name().map_or_else(|| ".".into(), |n| n.to_os_string())
}

// ─── Tests ────────────────────────────────────────────────────────────────────
