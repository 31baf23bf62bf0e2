use crate::mapping::{Mapping, Status};
use crate::RenameError;
use std::fmt;
use std::fs;
use std::io;
use std::path::Path;
use std::str::FromStr;
use tracing::{debug, info, warn};

const IDENTICAL_PATHS_NOTE: &str = "source and destination are identical";

/// How [`apply_mapping`] selects and executes entries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Mode {
    /// Rename everything that is not already an error.
    #[default]
    Normal,
    /// Only retry entries currently marked as errors.
    ErrorRetry,
    /// Rename every entry back from `new_path` to `old_path`.
    Undo,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Normal => "normal",
            Self::ErrorRetry => "error",
            Self::Undo => "undo",
        };
        f.write_str(s)
    }
}

impl FromStr for Mode {
    type Err = RenameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "normal" => Ok(Self::Normal),
            "error" | "error-retry" | "retry" => Ok(Self::ErrorRetry),
            "undo" => Ok(Self::Undo),
            _ => Err(RenameError::InvalidMode(s.to_string())),
        }
    }
}

/// Renames `from` to `to`, refusing to replace anything already at `to`.
pub fn rename_no_clobber(from: &Path, to: &Path) -> io::Result<()> {
    if fs::symlink_metadata(to).is_ok() {
        return Err(io::Error::new(
            io::ErrorKind::AlreadyExists,
            format!("destination already exists: {}", to.display()),
        ));
    }
    fs::rename(from, to)
}

/// Executes `mappings` against the filesystem and returns the updated copy. The input is never
/// modified, and in dry run it is returned as is.
pub fn apply_mapping(mappings: &[Mapping], mode: Mode, dry_run: bool) -> Vec<Mapping> {
    apply_mapping_with(mappings, mode, dry_run, rename_no_clobber)
}

/// Like [`apply_mapping`], with the mode given by name. An unknown mode fails every entry.
pub fn apply_mapping_named(mappings: &[Mapping], mode: &str, dry_run: bool) -> Vec<Mapping> {
    if dry_run {
        return mappings.to_vec();
    }
    match mode.parse::<Mode>() {
        Ok(mode) => apply_mapping(mappings, mode, dry_run),
        Err(e) => {
            warn!("Refusing to apply {} mapping(s): {}", mappings.len(), e);
            mappings
                .iter()
                .cloned()
                .map(|mut m| {
                    m.mark_error(&e);
                    m
                })
                .collect()
        }
    }
}

/// Like [`apply_mapping`], with the rename primitive supplied by the caller. A failure of one
/// entry is recorded on that entry and processing continues with the next.
pub fn apply_mapping_with<F>(
    mappings: &[Mapping],
    mode: Mode,
    dry_run: bool,
    mut rename: F,
) -> Vec<Mapping>
where
    F: FnMut(&Path, &Path) -> io::Result<()>,
{
    if dry_run {
        info!("Dry run: {} mapping(s) left unapplied", mappings.len());
        return mappings.to_vec();
    }

    info!("Applying {} mapping(s) in {} mode", mappings.len(), mode);
    let mut results = mappings.to_vec();

    for result in &mut results {
        let selected = match mode {
            Mode::Normal => result.status != Status::Error,
            Mode::ErrorRetry => result.status == Status::Error,
            Mode::Undo => true,
        };
        if !selected {
            continue;
        }

        let (from, to) = match mode {
            Mode::Undo => (result.new_path.clone(), result.old_path.clone()),
            Mode::Normal | Mode::ErrorRetry => (result.old_path.clone(), result.new_path.clone()),
        };

        if from.as_os_str().is_empty() || to.as_os_str().is_empty() {
            result.mark_error(&RenameError::InvalidPath);
            continue;
        }

        if from == to {
            debug!("Unchanged: {:?}", from);
            result.mark_success(Some(IDENTICAL_PATHS_NOTE.to_string()));
            continue;
        }

        match rename(&from, &to) {
            Ok(()) => {
                info!("Renamed: {:?} -> {:?}", from, to);
                result.mark_success(None);
            }
            Err(e) => {
                warn!("Failed to rename {:?} -> {:?}: {}", from, to, e);
                result.mark_error(&RenameError::Filesystem(e.to_string()));
            }
        }
    }

    results
}
