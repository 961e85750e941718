//! Audio segmentation pass.
//!
//! Each GMS-C recording narrates a contiguous range of phrases, framed by a short intro and
//! outro. The splitter cuts it at silences; the intro and outro always come out as the first
//! and last few clips, and the clips in between are renamed to `<LANG>-<NNNN>.mp3` so they
//! line up with the rows of the sentence tables.
//!
//! Recordings are processed in ascending phrase order. Any batch that fails aborts the run:
//! guessing which clips are real would silently misalign audio and text.
//!
//! Every recording is split into its own staging directory under the clip directory, so
//! one batch's count never includes another batch's filler. Staging directories, and the
//! filler left in them, are removed once the whole set has been processed.

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::filenames::{AudioFile, SPLITTER_LOG, STAGING_PREFIX, clip_name, file_name, is_raw_clip};
use crate::layout::Layout;
use crate::opts::Opts;
use crate::report::{BatchSplit, Skipped, SplitReport};
use crate::tools::Splitter;
use crate::{Error, Result};

/// The segmentation pass, parameterized over the silence splitter.
pub struct Segmenter<'a, S: Splitter> {
    splitter: S,
    opts: &'a Opts,
}

/// A recording found under the audio source directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recording {
    pub path: PathBuf,
    pub audio: AudioFile,
}

impl<'a, S: Splitter> Segmenter<'a, S> {
    pub fn new(splitter: S, opts: &'a Opts) -> Self {
        Self { splitter, opts }
    }

    /// Split every recording under the layout's audio source directory.
    pub fn run(&self, layout: &Layout) -> Result<SplitReport> {
        Layout::require_source(&layout.audio_source)?;
        self.opts.validate()?;

        let mut report = SplitReport::default();
        let (recordings, unrecognized) = discover(&layout.audio_source)?;
        for name in unrecognized {
            warn!(file = %name, "file name does not match; skipping");
            report
                .skipped
                .push(Skipped::new(name.clone(), Error::UnrecognizedFilename { name }));
        }

        if recordings.is_empty() {
            info!(
                dir = %layout.audio_source.display(),
                "no audio files found; expected names like ENZS-F1-GMS-C-0001.mp3"
            );
            return Ok(report);
        }

        fs::create_dir_all(&layout.clips)?;

        // Raw clips or staging directories left behind by an aborted run.
        let stale = sweep(&layout.clips)?;
        if stale > 0 {
            debug!(count = stale, "removed stale splitter output");
        }

        info!(count = recordings.len(), "processing audio files");
        let mut next_expected: Option<(String, u32)> = None;
        let mut staging_dirs: Vec<TempDir> = Vec::with_capacity(recordings.len());

        for recording in &recordings {
            let name = file_name(&recording.path).unwrap_or_default().to_owned();

            if let Some((language, phrase)) = &next_expected {
                if *language == recording.audio.language && *phrase != recording.audio.start_phrase {
                    warn!(
                        file = %name,
                        expected = phrase,
                        found = recording.audio.start_phrase,
                        "recording does not continue the previous phrase range"
                    );
                }
            }

            info!(file = %name, "splitting");
            let staging = tempfile::Builder::new()
                .prefix(STAGING_PREFIX)
                .tempdir_in(&layout.clips)?;
            let batch = self.split_batch(recording, staging.path(), &layout.clips)?;
            staging_dirs.push(staging);

            next_expected = Some((batch.language.clone(), batch.last_phrase + 1));
            report.batches.push(batch);
        }

        for staging in staging_dirs {
            report.swept += discard_staging(staging)?;
        }
        report.swept += sweep(&layout.clips)?;
        Ok(report)
    }

    /// Split one recording into the empty directory `staging` and move its phrase clips
    /// into `clips_dir`.
    ///
    /// Filler clips stay in `staging` under their raw names.
    pub fn split_batch(&self, recording: &Recording, staging: &Path, clips_dir: &Path) -> Result<BatchSplit> {
        let name = file_name(&recording.path).unwrap_or_default().to_owned();

        self.splitter
            .split(&recording.path, staging, &self.opts.silence)?;

        let raw = list_raw_clips(staging)?;
        if raw.len() != self.opts.expected_raw_clips {
            return Err(Error::mismatch(
                format!("split clips from {name}"),
                self.opts.expected_raw_clips,
                raw.len(),
            ));
        }

        let renames = plan_renames(
            &raw,
            self.opts.head_filler,
            self.opts.tail_filler,
            recording.audio.start_phrase,
        );
        for (from, phrase) in &renames {
            let to = clips_dir.join(clip_name(&recording.audio.language, *phrase));
            fs::rename(from, &to)?;
        }

        let first_phrase = recording.audio.start_phrase;
        Ok(BatchSplit {
            recording: name,
            language: recording.audio.language.clone(),
            first_phrase,
            last_phrase: first_phrase + renames.len().saturating_sub(1) as u32,
        })
    }
}

/// Pair the real clips of a sorted split with their phrase numbers.
///
/// The first `head` and last `tail` clips are filler and get no number.
pub fn plan_renames(sorted_raw: &[PathBuf], head: usize, tail: usize, start_phrase: u32) -> Vec<(PathBuf, u32)> {
    let end = sorted_raw.len().saturating_sub(tail);
    sorted_raw
        .get(head..end)
        .unwrap_or_default()
        .iter()
        .zip(start_phrase..)
        .map(|(path, phrase)| (path.clone(), phrase))
        .collect()
}

/// Find recordings under `root`, sorted by language and starting phrase.
///
/// Returns the parsed recordings and the names of GMS-C files whose names could not be
/// parsed.
pub fn discover(root: &Path) -> Result<(Vec<Recording>, Vec<String>)> {
    let mut recordings = Vec::new();
    let mut unrecognized = Vec::new();

    for entry in WalkDir::new(root).follow_links(true) {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }

        let Some(name) = entry.file_name().to_str().map(str::to_owned) else {
            continue;
        };
        if !(name.starts_with("EN") && name.contains("-GMS-C-") && name.ends_with(".mp3")) {
            continue;
        }

        match AudioFile::from_name(&name) {
            Ok(audio) => recordings.push(Recording {
                path: entry.into_path(),
                audio,
            }),
            Err(_) => unrecognized.push(name),
        }
    }

    recordings.sort_by(|a, b| {
        (&a.audio.language, a.audio.start_phrase, &a.path)
            .cmp(&(&b.audio.language, b.audio.start_phrase, &b.path))
    });
    unrecognized.sort();

    Ok((recordings, unrecognized))
}

/// Raw splitter output in `dir`, sorted by name.
fn list_raw_clips(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut raw = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if file_name(&path).is_some_and(is_raw_clip) {
            raw.push(path);
        }
    }
    raw.sort();
    Ok(raw)
}

/// Delete a staging directory; returns how many files it still held.
fn discard_staging(staging: TempDir) -> Result<usize> {
    let left = fs::read_dir(staging.path())?.count();
    staging.close()?;
    Ok(left)
}

/// Delete raw clips, splitter logs and abandoned staging directories from `dir`; returns
/// how many entries were removed.
fn sweep(dir: &Path) -> Result<usize> {
    let mut removed = 0;
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        let Some(name) = file_name(&path) else {
            continue;
        };

        if entry.file_type()?.is_dir() {
            if name.starts_with(STAGING_PREFIX) {
                fs::remove_dir_all(&path)?;
                removed += 1;
            }
        } else if is_raw_clip(name) || name == SPLITTER_LOG {
            fs::remove_file(&path)?;
            removed += 1;
        }
    }
    Ok(removed)
}
