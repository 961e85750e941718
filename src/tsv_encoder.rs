use std::fs::File;
use std::io::Write;
use std::path::Path;

use crate::group_encoder::GroupEncoder;
use crate::sentence_parser::SentenceGroup;
use crate::{Error, Result};

/// A `GroupEncoder` that writes one tab-separated row per sentence group.
///
/// Fields are quoted only when they contain a tab, quote or line break, so the output
/// opens cleanly in spreadsheet tools.
pub struct TsvEncoder<W: Write> {
    /// The CSV writer configured for tab-separated output.
    w: csv::Writer<W>,

    /// Rows written so far.
    rows: usize,

    /// Whether the encoder has been closed.
    closed: bool,
}

impl<W: Write> TsvEncoder<W> {
    /// Create a new TSV encoder that writes to the provided writer.
    pub fn new(w: W) -> Self {
        let w = csv::WriterBuilder::new()
            .delimiter(b'\t')
            .has_headers(false)
            .flexible(false)
            .terminator(csv::Terminator::Any(b'\n'))
            .from_writer(w);

        Self {
            w,
            rows: 0,
            closed: false,
        }
    }

    /// Rows written so far.
    pub fn rows(&self) -> usize {
        self.rows
    }
}

impl<W: Write> GroupEncoder for TsvEncoder<W> {
    fn write_group(&mut self, group: &SentenceGroup) -> Result<()> {
        if self.closed {
            return Err(std::io::Error::other("cannot write group: encoder is already closed").into());
        }

        self.w.write_record(group.fields())?;
        self.rows += 1;
        Ok(())
    }

    /// Flush the underlying writer. This is idempotent.
    fn close(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }

        self.w.flush()?;
        self.closed = true;
        Ok(())
    }
}

/// Read every row of a sentence table.
///
/// Each row must carry exactly `fields_per_row` fields; anything else means the table no
/// longer lines up with its language profile.
pub fn read_groups(path: &Path, fields_per_row: usize) -> Result<Vec<SentenceGroup>> {
    let file = File::open(path)?;
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(false)
        .flexible(true)
        .from_reader(file);

    let mut groups = Vec::new();
    for record in reader.records() {
        let record = record?;
        if record.len() != fields_per_row {
            let line = record.position().map_or(0, |p| p.line());
            return Err(Error::mismatch(
                format!("fields in {} line {line}", path.display()),
                fields_per_row,
                record.len(),
            ));
        }
        groups.push(SentenceGroup(record.iter().map(str::to_owned).collect()));
    }

    Ok(groups)
}
