use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::info;

use crate::{Error, Result};

/// Directory layout shared by the three passes.
///
/// ```text
/// <base>/glossika_source/pdf      course PDFs
/// <base>/glossika_source/audio    GMS-C recordings (sub-folders allowed)
/// <base>/glossika_output          sentence tables and finished decks
/// <base>/glossika_output/audio    per-phrase clips
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Layout {
    pub pdf_source: PathBuf,
    pub audio_source: PathBuf,
    pub output: PathBuf,
    pub clips: PathBuf,
}

impl Layout {
    /// The standard layout under `base`.
    pub fn new(base: impl AsRef<Path>) -> Self {
        let base = base.as_ref();
        let source = base.join("glossika_source");
        let output = base.join("glossika_output");

        Self {
            pdf_source: source.join("pdf"),
            audio_source: source.join("audio"),
            clips: output.join("audio"),
            output,
        }
    }

    /// Make sure a source directory exists.
    ///
    /// A missing directory is created so the user knows where to put their files, and the
    /// run stops with [`Error::MissingInput`].
    pub fn require_source(dir: &Path) -> Result<()> {
        if dir.is_dir() {
            return Ok(());
        }

        fs::create_dir_all(dir)?;
        info!(dir = %dir.display(), "created missing input directory");
        Err(Error::MissingInput {
            path: dir.to_path_buf(),
        })
    }
}
