pub mod apply;
pub mod chain;
pub mod mapping;
pub mod persist;
pub mod renamer;
pub mod rule;
pub mod template;

pub use apply::{apply_mapping, apply_mapping_named, apply_mapping_with, rename_no_clobber, Mode};
pub use chain::{ChainEntry, RuleChain};
pub use mapping::{Generator, Mapping, Status};
pub use persist::PersistError;
pub use renamer::Renamer;
pub use rule::{factory, CompiledRule, Rule};
pub use template::{expand, Clock, DateFormats, FixedClock, SystemClock, Template, TemplateContext};

/// Failures attached to individual mapping entries. None of these abort a batch.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum RenameError {
    #[error("empty file path")]
    EmptyPath,
    #[error("invalid file path")]
    InvalidPath,
    #[error("invalid regex pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },
    #[error("rule '{rule}' generated an empty file name")]
    EmptyName { rule: String },
    #[error("rename failed: {0}")]
    Filesystem(String),
    #[error("invalid mode: {0}")]
    InvalidMode(String),
}

impl RenameError {
    pub fn invalid_pattern(pattern: &str, err: &regex::Error) -> Self {
        Self::InvalidPattern {
            pattern: pattern.to_string(),
            reason: err.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ApplySummary {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub pending: usize,
}

impl ApplySummary {
    pub fn from_results(results: &[Mapping]) -> Self {
        let mut summary = Self {
            total: results.len(),
            ..Self::default()
        };
        for mapping in results {
            match mapping.status {
                Status::Pending => summary.pending += 1,
                Status::Success => summary.succeeded += 1,
                Status::Error => summary.failed += 1,
            }
        }
        summary
    }

    pub fn has_failures(&self) -> bool {
        self.failed > 0
    }
}
