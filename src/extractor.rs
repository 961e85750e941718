//! PDF sentence extraction pass.
//!
//! Converts every course PDF to layout-preserving text, parses it into sentence groups and
//! writes one sentence table per book. A book that does not yield exactly the expected
//! number of groups produces no table at all: row order is what later lines sentences up
//! with audio clips, so a partial table is worse than none.

use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::filenames::{CourseFile, file_name};
use crate::group_encoder::GroupEncoder;
use crate::layout::Layout;
use crate::opts::Opts;
use crate::profile::ProfileTable;
use crate::report::{ExtractReport, Skipped, TableWritten};
use crate::sentence_parser::{SentenceGroup, parse_sentences};
use crate::tools::TextConverter;
use crate::tsv_encoder::TsvEncoder;
use crate::{Error, Result};

/// The extraction pass, parameterized over the PDF-to-text tool.
pub struct Extractor<'a, C: TextConverter> {
    converter: C,
    profiles: &'a ProfileTable,
    opts: &'a Opts,
}

impl<'a, C: TextConverter> Extractor<'a, C> {
    pub fn new(converter: C, profiles: &'a ProfileTable, opts: &'a Opts) -> Self {
        Self {
            converter,
            profiles,
            opts,
        }
    }

    /// Process every PDF in the layout's PDF source directory, in file name order.
    pub fn run(&self, layout: &Layout) -> Result<ExtractReport> {
        Layout::require_source(&layout.pdf_source)?;

        let pdfs = list_pdfs(&layout.pdf_source)?;
        let mut report = ExtractReport::default();
        if pdfs.is_empty() {
            info!(
                dir = %layout.pdf_source.display(),
                "no PDF files found; expected names like GLOSSIKA-ENZS-F1-EBK.pdf"
            );
            return Ok(report);
        }

        fs::create_dir_all(&layout.output)?;
        info!(count = pdfs.len(), "processing PDF files");

        for pdf in pdfs {
            let name = file_name(&pdf).unwrap_or_default().to_owned();

            let result = CourseFile::from_pdf_name(&name)
                .and_then(|course| self.extract_one(&pdf, &course, &layout.output));

            match result {
                Ok(table) => {
                    info!(file = %name, groups = table.groups, "extracted");
                    report.tables.push(table);
                }
                Err(err) if err.is_fatal_for_run() => return Err(err),
                Err(err) => {
                    warn!(file = %name, error = %err, "skipping PDF");
                    report.skipped.push(Skipped::new(name, err));
                }
            }
        }

        Ok(report)
    }

    /// Extract one book into `<out_dir>/<stem>.tsv`.
    pub fn extract_one(&self, pdf: &Path, course: &CourseFile, out_dir: &Path) -> Result<TableWritten> {
        let text_path = out_dir.join(course.text_name());
        self.render_text(pdf, &text_path)?;

        let text = fs::read_to_string(&text_path)?;
        let markers = self.profiles.markers_for(&course.language);
        let groups = parse_sentences(&text, &markers)?;

        if groups.len() != self.opts.expected_groups_per_pdf {
            // The rendered text stays behind for inspection.
            return Err(Error::mismatch(
                "sentence groups",
                self.opts.expected_groups_per_pdf,
                groups.len(),
            ));
        }

        let table_path = out_dir.join(course.tsv_name());
        write_table(&table_path, &groups)?;
        fs::remove_file(&text_path)?;

        Ok(TableWritten {
            path: table_path,
            language: course.language.clone(),
            groups: groups.len(),
        })
    }

    fn render_text(&self, pdf: &Path, text_path: &Path) -> Result<()> {
        if text_path.exists() {
            if let Err(err) = fs::remove_file(text_path) {
                // A locked rendering from an earlier run is still a rendering.
                warn!(file = %text_path.display(), error = %err, "using existing text rendering");
                return Ok(());
            }
        }
        self.converter.convert(pdf, text_path)
    }
}

/// Write a table atomically: rows go to `<path>.part`, which is renamed into place once
/// complete.
fn write_table(path: &Path, groups: &[SentenceGroup]) -> Result<()> {
    let tmp_path = PathBuf::from(format!("{}.part", path.display()));

    let result = (|| -> Result<()> {
        let mut encoder = TsvEncoder::new(BufWriter::new(File::create(&tmp_path)?));
        for group in groups {
            encoder.write_group(group)?;
        }
        encoder.close()?;
        drop(encoder);

        fs::rename(&tmp_path, path)?;
        Ok(())
    })();

    if result.is_err() {
        let _ = fs::remove_file(&tmp_path);
    }

    result
}

/// PDF files directly inside `dir`, sorted by name.
fn list_pdfs(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut pdfs = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        let is_pdf = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"));
        if is_pdf && path.is_file() {
            pdfs.push(path);
        }
    }
    pdfs.sort();
    Ok(pdfs)
}
