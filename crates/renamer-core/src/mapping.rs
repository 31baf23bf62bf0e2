use crate::chain::RuleChain;
use crate::template::{Clock, DateFormats, TemplateContext};
use crate::RenameError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{is_separator, Path, PathBuf};
use tracing::debug;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    #[default]
    Pending,
    Success,
    Error,
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Pending => "pending",
            Self::Success => "success",
            Self::Error => "error",
        };
        f.write_str(s)
    }
}

/// A proposed or executed `old_path -> new_path` rename.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Mapping {
    pub old_path: PathBuf,
    #[serde(default)]
    pub new_path: PathBuf,
    #[serde(default)]
    pub status: Status,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl Mapping {
    pub fn pending(old_path: impl Into<PathBuf>, new_path: impl Into<PathBuf>) -> Self {
        Self {
            old_path: old_path.into(),
            new_path: new_path.into(),
            status: Status::Pending,
            message: None,
        }
    }

    pub fn failed(old_path: impl Into<PathBuf>, error: &RenameError) -> Self {
        let mut mapping = Self::pending(old_path, PathBuf::new());
        mapping.mark_error(error);
        mapping
    }

    pub fn mark_success(&mut self, note: Option<String>) {
        self.status = Status::Success;
        self.message = note;
    }

    pub fn mark_error(&mut self, error: &RenameError) {
        self.status = Status::Error;
        self.message = Some(error.to_string());
    }

    pub fn is_error(&self) -> bool {
        self.status == Status::Error
    }
}

/// Single-use generation context. Owns the per-file counter behind `{index}`, which advances
/// exactly once for every path passed to [`Generator::generate`].
pub struct Generator<'a> {
    chain: &'a RuleChain,
    process_extension: bool,
    clock: &'a dyn Clock,
    formats: &'a DateFormats,
    counter: u64,
}

impl<'a> Generator<'a> {
    pub fn new(
        chain: &'a RuleChain,
        process_extension: bool,
        clock: &'a dyn Clock,
        formats: &'a DateFormats,
    ) -> Self {
        Self {
            chain,
            process_extension,
            clock,
            formats,
            counter: 0,
        }
    }

    /// Start the counter at `counter` instead of zero, e.g. to continue a previous run.
    pub fn with_counter(mut self, counter: u64) -> Self {
        self.counter = counter;
        self
    }

    pub fn counter(&self) -> u64 {
        self.counter
    }

    /// Builds the mapping for one path. Never touches the filesystem.
    pub fn generate(&mut self, path: &Path) -> Mapping {
        let ordinal = self.counter;
        self.counter += 1;

        match self.new_path(path, ordinal) {
            Ok(new_path) => {
                debug!("Generated mapping: {:?} -> {:?}", path, new_path);
                Mapping::pending(path, new_path)
            }
            Err(e) => {
                debug!("Generation failed for {:?}: {}", path, e);
                Mapping::failed(path, &e)
            }
        }
    }

    pub fn generate_all<P: AsRef<Path>>(&mut self, paths: &[P]) -> Vec<Mapping> {
        paths.iter().map(|p| self.generate(p.as_ref())).collect()
    }

    fn new_path(&self, path: &Path, ordinal: u64) -> Result<PathBuf, RenameError> {
        let file_name = file_name(path)?;
        let (stem, ext) = split_extension(file_name);

        let mut current = if self.process_extension {
            file_name.to_string()
        } else {
            stem.to_string()
        };

        for entry in self.chain.entries() {
            let compiled = entry.compiled().map_err(Clone::clone)?;
            let ctx = TemplateContext {
                name: &current,
                ext: ext.unwrap_or_default(),
                ordinal,
                clock: self.clock,
                formats: self.formats,
            };
            let next = compiled.apply(&current, &ctx);
            if next.is_empty() {
                return Err(RenameError::EmptyName {
                    rule: entry.rule().name.clone(),
                });
            }
            current = next;
        }

        if !self.process_extension {
            if let Some(ext) = ext {
                current.push('.');
                current.push_str(ext);
            }
        }

        Ok(path.with_file_name(current))
    }
}

fn file_name(path: &Path) -> Result<&str, RenameError> {
    let raw = path.as_os_str();
    if raw.is_empty() {
        return Err(RenameError::EmptyPath);
    }
    if raw.to_string_lossy().ends_with(is_separator) {
        return Err(RenameError::InvalidPath);
    }
    path.file_name()
        .and_then(|name| name.to_str())
        .ok_or(RenameError::InvalidPath)
}

/// Splits at the last dot. A leading dot belongs to the stem, so `.bashrc` has no extension.
fn split_extension(file_name: &str) -> (&str, Option<&str>) {
    match file_name.rfind('.') {
        Some(0) | None => (file_name, None),
        Some(i) => (&file_name[..i], Some(&file_name[i + 1..])),
    }
}
