//! External tools the passes delegate to.
//!
//! PDF rendering and silence detection are done by `pdftotext` and `mp3splt`. Each sits
//! behind a small trait so the passes can be driven by fakes in tests.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use tracing::debug;

use crate::opts::SilenceParams;
use crate::{Error, Result};

/// Renders a PDF into plain text that preserves the page's column layout.
pub trait TextConverter {
    /// Write the UTF-8 text rendering of `pdf` to `text_out`.
    fn convert(&self, pdf: &Path, text_out: &Path) -> Result<()>;
}

/// Splits a recording into numbered clips at silences.
pub trait Splitter {
    /// Split `recording` into `out_dir`, naming clips `001.mp3`, `002.mp3`, ...
    fn split(&self, recording: &Path, out_dir: &Path, params: &SilenceParams) -> Result<()>;
}

/// `pdftotext` from poppler.
#[derive(Debug, Clone)]
pub struct Pdftotext {
    program: PathBuf,
}

impl Pdftotext {
    pub const TOOL: &'static str = "pdftotext";

    /// Find `pdftotext` on `PATH`.
    pub fn locate() -> Result<Self> {
        Ok(Self {
            program: locate(Self::TOOL)?,
        })
    }
}

impl TextConverter for Pdftotext {
    fn convert(&self, pdf: &Path, text_out: &Path) -> Result<()> {
        let mut cmd = Command::new(&self.program);
        cmd.arg("-layout")
            .args(["-enc", "UTF-8"])
            .arg(pdf)
            .arg(text_out);
        run(Self::TOOL, &mut cmd)
    }
}

/// `mp3splt` in silence-detection mode.
///
/// Tested with mp3splt 2.6.2 / libmp3splt 0.9.2.
#[derive(Debug, Clone)]
pub struct Mp3Splt {
    program: PathBuf,
}

impl Mp3Splt {
    pub const TOOL: &'static str = "mp3splt";

    /// Find `mp3splt` on `PATH`.
    pub fn locate() -> Result<Self> {
        Ok(Self {
            program: locate(Self::TOOL)?,
        })
    }
}

impl Splitter for Mp3Splt {
    fn split(&self, recording: &Path, out_dir: &Path, params: &SilenceParams) -> Result<()> {
        let recording = std::path::absolute(recording)?;
        let out_dir = std::path::absolute(out_dir)?;

        // mp3splt drops its log into the working directory; keep it with the clips so it is
        // swept together with the other residue.
        let mut cmd = Command::new(&self.program);
        cmd.args(mp3splt_args(&recording, &out_dir, params))
            .current_dir(&out_dir);
        run(Self::TOOL, &mut cmd)
    }
}

/// Arguments for one mp3splt run.
///
/// - `-n -x`: no tags and no Xing header, so clips can be concatenated later
/// - `-s -p ...`: silence mode with the given detection parameters
/// - `-o @N3`: three-digit sequence numbers as file names
fn mp3splt_args(recording: &Path, out_dir: &Path, params: &SilenceParams) -> Vec<OsString> {
    let mut args: Vec<OsString> = ["-n", "-x", "-s", "-p"].map(OsString::from).to_vec();
    args.push(params.to_splitter_arg().into());
    args.push("-o".into());
    args.push(params.output_pattern.as_str().into());
    args.push("-d".into());
    args.push(out_dir.into());
    args.push(recording.into());
    args
}

fn locate(tool: &str) -> Result<PathBuf> {
    which::which(tool).map_err(|_| Error::ToolNotFound {
        tool: tool.to_owned(),
    })
}

/// Run a tool to completion with its output discarded.
fn run(tool: &str, cmd: &mut Command) -> Result<()> {
    debug!(tool, command = ?cmd, "running external tool");

    let status = cmd
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()?;

    if !status.success() {
        return Err(Error::ToolFailed {
            tool: tool.to_owned(),
            status,
        });
    }
    Ok(())
}
