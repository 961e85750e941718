use std::path::PathBuf;
use std::process::ExitStatus;

use thiserror::Error;

/// Crate-wide result type.
pub type Result<T> = std::result::Result<T, Error>;

/// Crate-wide error type.
///
/// Variants follow the failure taxonomy of the three passes. Whether a failure ends the
/// whole run or only the current unit (one PDF, one audio batch, one language) is decided
/// by the pass that observes it; [`Error::is_fatal_for_run`] captures the variants that are
/// never recoverable without user action.
///
/// This is intentionally decoupled from `anyhow` so library callers aren't forced to adopt
/// `anyhow` in their own public APIs.
#[derive(Debug, Error)]
pub enum Error {
    #[error("input directory {} was missing; populate it and re-run", path.display())]
    MissingInput { path: PathBuf },

    #[error("file name does not match the expected pattern: {name}")]
    UnrecognizedFilename { name: String },

    #[error("required tool '{tool}' was not found on PATH")]
    ToolNotFound { tool: String },

    #[error("'{tool}' exited unsuccessfully ({status})")]
    ToolFailed { tool: String, status: ExitStatus },

    #[error("{what}: expected {expected}, found {found}")]
    StructuralMismatch {
        what: String,
        expected: usize,
        found: usize,
    },

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("failed to write deck package: {0}")]
    Package(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Toml(#[from] toml::de::Error),

    #[error(transparent)]
    Walk(#[from] walkdir::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub(crate) fn mismatch(what: impl Into<String>, expected: usize, found: usize) -> Self {
        Self::StructuralMismatch {
            what: what.into(),
            expected,
            found,
        }
    }

    /// Whether this failure must end the run rather than skip a single unit.
    pub fn is_fatal_for_run(&self) -> bool {
        matches!(
            self,
            Self::MissingInput { .. } | Self::Config(_) | Self::Toml(_) | Self::ToolNotFound { .. }
        )
    }
}
