use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use glossika_anki::tsv_encoder::read_groups;
use glossika_anki::{Error, Extractor, Layout, Opts, ProfileTable, TextConverter};

/// Writes a fixed number of Mandarin phrase blocks regardless of the PDF.
struct FakeConverter {
    groups: usize,
}

impl TextConverter for FakeConverter {
    fn convert(&self, _pdf: &Path, text_out: &Path) -> glossika_anki::Result<()> {
        let mut text = String::from("GLOSSIKA MANDARIN FLUENCY 1\n\n");
        for i in 1..=self.groups {
            writeln!(text, "  {i:04}").ok();
            writeln!(text, "   EN    Sentence number {i},").ok();
            writeln!(text, "         continued.").ok();
            writeln!(text, "   简    第{i}句。").ok();
            writeln!(text, "   PIN   dì {i} jù.").ok();
            writeln!(text).ok();
        }
        fs::write(text_out, text)?;
        Ok(())
    }
}

fn seed_pdf(layout: &Layout, name: &str) -> anyhow::Result<()> {
    fs::create_dir_all(&layout.pdf_source)?;
    fs::write(layout.pdf_source.join(name), b"%PDF-1.4")?;
    Ok(())
}

#[test]
fn writes_one_table_per_complete_book() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let layout = Layout::new(dir.path());
    seed_pdf(&layout, "GLOSSIKA-ENZS-F1-EBK.pdf")?;

    let profiles = ProfileTable::builtin();
    let opts = Opts::default();
    let report = Extractor::new(FakeConverter { groups: 1000 }, &profiles, &opts).run(&layout)?;

    assert_eq!(report.tables.len(), 1);
    assert!(report.skipped.is_empty());

    let table = layout.output.join("GLOSSIKA-ENZS-F1-EBK.tsv");
    assert_eq!(report.tables[0].path, table);
    assert!(!layout.output.join("GLOSSIKA-ENZS-F1-EBK.txt").exists());

    let groups = read_groups(&table, 3)?;
    assert_eq!(groups.len(), 1000);
    assert_eq!(
        groups[0].fields(),
        ["Sentence number 1, continued.", "第1句。", "dì 1 jù."]
    );
    assert_eq!(groups[999].fields()[0], "Sentence number 1000, continued.");
    Ok(())
}

#[test]
fn short_book_is_rejected_and_its_text_kept() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let layout = Layout::new(dir.path());
    seed_pdf(&layout, "GLOSSIKA-ENZS-F2-EBK.pdf")?;

    let profiles = ProfileTable::builtin();
    let opts = Opts::default();
    let report = Extractor::new(FakeConverter { groups: 999 }, &profiles, &opts).run(&layout)?;

    assert!(report.tables.is_empty());
    assert_eq!(report.skipped.len(), 1);
    assert_eq!(report.skipped[0].unit, "GLOSSIKA-ENZS-F2-EBK.pdf");
    assert!(report.skipped[0].reason.contains("expected 1000"));
    assert!(report.skipped[0].reason.contains("found 999"));

    assert!(!layout.output.join("GLOSSIKA-ENZS-F2-EBK.tsv").exists());
    assert!(!layout.output.join("GLOSSIKA-ENZS-F2-EBK.tsv.part").exists());
    assert!(layout.output.join("GLOSSIKA-ENZS-F2-EBK.txt").exists());
    Ok(())
}

#[test]
fn unrecognized_pdf_is_skipped_without_stopping_the_pass() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let layout = Layout::new(dir.path());
    seed_pdf(&layout, "course-book.pdf")?;
    seed_pdf(&layout, "GLOSSIKA-ENZS-F1-EBK.pdf")?;

    let profiles = ProfileTable::builtin();
    let opts = Opts::default();
    let report = Extractor::new(FakeConverter { groups: 1000 }, &profiles, &opts).run(&layout)?;

    assert_eq!(report.tables.len(), 1);
    assert_eq!(report.skipped.len(), 1);
    assert_eq!(report.skipped[0].unit, "course-book.pdf");
    Ok(())
}

#[test]
fn missing_source_directory_is_created_and_stops_the_pass() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let layout = Layout::new(dir.path());

    let profiles = ProfileTable::builtin();
    let opts = Opts::default();
    let err = Extractor::new(FakeConverter { groups: 1000 }, &profiles, &opts)
        .run(&layout)
        .unwrap_err();

    assert!(matches!(err, Error::MissingInput { .. }));
    assert!(layout.pdf_source.is_dir());
    assert!(!layout.output.exists());
    Ok(())
}

#[test]
fn empty_source_directory_writes_nothing() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let layout = Layout::new(dir.path());
    fs::create_dir_all(&layout.pdf_source)?;

    let profiles = ProfileTable::builtin();
    let opts = Opts::default();
    let report = Extractor::new(FakeConverter { groups: 1000 }, &profiles, &opts).run(&layout)?;

    assert!(report.tables.is_empty());
    assert!(report.skipped.is_empty());
    Ok(())
}
