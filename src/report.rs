//! Per-pass outcome reports.
//!
//! Every pass returns a report describing what it wrote and what it skipped. The CLI
//! prints them as text for people or as JSON for scripts.

use std::io::Write;
use std::path::PathBuf;

use serde::Serialize;

use crate::Result;

/// The supported report formats.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
pub enum ReportFormat {
    /// One line per written or skipped unit.
    #[default]
    Text,

    /// A single JSON object.
    Json,
}

/// A unit of work that was abandoned, with the reason.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Skipped {
    pub unit: String,
    pub reason: String,
}

impl Skipped {
    pub fn new(unit: impl Into<String>, reason: impl ToString) -> Self {
        Self {
            unit: unit.into(),
            reason: reason.to_string(),
        }
    }
}

/// A sentence table written by the extractor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableWritten {
    pub path: PathBuf,
    pub language: String,
    pub groups: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExtractReport {
    pub tables: Vec<TableWritten>,
    pub skipped: Vec<Skipped>,
}

/// One recording split into clips.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchSplit {
    pub recording: String,
    pub language: String,
    pub first_phrase: u32,
    pub last_phrase: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SplitReport {
    pub batches: Vec<BatchSplit>,
    pub skipped: Vec<Skipped>,

    /// Raw clips and splitter logs removed by the final sweep.
    pub swept: usize,
}

/// One deck package written by the assembler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeckWritten {
    pub language: String,
    pub deck_name: String,
    pub deck_id: i64,
    pub records: usize,
    pub package: PathBuf,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AssembleReport {
    pub decks: Vec<DeckWritten>,
    pub skipped: Vec<Skipped>,
}

/// Reports of every pass that ran.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunReport {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extract: Option<ExtractReport>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub split: Option<SplitReport>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub assemble: Option<AssembleReport>,
}

impl RunReport {
    /// Whether any pass abandoned a unit of work.
    pub fn has_skips(&self) -> bool {
        self.extract.as_ref().is_some_and(|r| !r.skipped.is_empty())
            || self.split.as_ref().is_some_and(|r| !r.skipped.is_empty())
            || self.assemble.as_ref().is_some_and(|r| !r.skipped.is_empty())
    }

    /// Write the report in the requested format.
    pub fn write<W: Write>(&self, mut w: W, format: ReportFormat) -> Result<()> {
        match format {
            ReportFormat::Json => {
                serde_json::to_writer_pretty(&mut w, self)?;
                writeln!(w)?;
            }
            ReportFormat::Text => self.write_text(&mut w)?,
        }
        w.flush()?;
        Ok(())
    }

    fn write_text<W: Write>(&self, w: &mut W) -> Result<()> {
        if let Some(extract) = &self.extract {
            writeln!(w, "extract: {} table(s) written", extract.tables.len())?;
            for t in &extract.tables {
                writeln!(w, "  wrote {} ({} groups)", t.path.display(), t.groups)?;
            }
            write_skipped(w, &extract.skipped)?;
        }

        if let Some(split) = &self.split {
            writeln!(w, "split: {} recording(s) split", split.batches.len())?;
            for b in &split.batches {
                writeln!(
                    w,
                    "  {} -> {} phrases {:04}-{:04}",
                    b.recording, b.language, b.first_phrase, b.last_phrase
                )?;
            }
            write_skipped(w, &split.skipped)?;
        }

        if let Some(assemble) = &self.assemble {
            writeln!(w, "assemble: {} deck(s) written", assemble.decks.len())?;
            for d in &assemble.decks {
                writeln!(
                    w,
                    "  {} ({} records) -> {}",
                    d.deck_name,
                    d.records,
                    d.package.display()
                )?;
            }
            write_skipped(w, &assemble.skipped)?;
        }

        Ok(())
    }
}

fn write_skipped<W: Write>(w: &mut W, skipped: &[Skipped]) -> Result<()> {
    for s in skipped {
        writeln!(w, "  skipped {}: {}", s.unit, s.reason)?;
    }
    Ok(())
}
