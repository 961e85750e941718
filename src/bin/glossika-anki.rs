// Command-line front end: runs the extract, split and assemble passes over a working
// directory laid out as glossika_source/ and glossika_output/.

use std::io;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::warn;

use glossika_anki::{
    Assembler, Extractor, Layout, Mp3Splt, Opts, Pdftotext, ProfileTable, ReportFormat, RunReport,
    Segmenter,
};

#[derive(Parser, Debug)]
#[command(name = "glossika-anki")]
#[command(about = "Convert Glossika course PDFs and audio into Anki decks")]
struct Params {
    /// Directory holding glossika_source/ and glossika_output/.
    #[arg(short = 'b', long = "base-dir", default_value = ".", global = true)]
    base_dir: PathBuf,

    /// TOML file with additional or replacement language profiles.
    #[arg(short = 'p', long = "profiles", global = true)]
    profiles: Option<PathBuf>,

    /// How to print the run report on stdout.
    #[arg(
        short = 'r',
        long = "report",
        value_enum,
        default_value_t = ReportFormat::Text,
        global = true
    )]
    report: ReportFormat,

    /// Emit logs as JSON lines instead of plain text.
    #[arg(long = "log-json", default_value_t = false, global = true)]
    log_json: bool,

    /// Raw clips the splitter must produce per recording (2 intro + 50 phrases + 2 outro).
    ///
    /// Depends on the mp3splt version; revalidate after upgrading it.
    #[arg(long = "expected-clips", default_value_t = 54, global = true)]
    expected_clips: usize,

    #[command(subcommand)]
    pass: Pass,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
enum Pass {
    /// Extract sentence tables from course PDFs.
    Extract,

    /// Split GMS-C recordings into one clip per phrase.
    Split,

    /// Assemble sentence tables and clips into Anki packages.
    Assemble,

    /// Run extract, split and assemble in order.
    All,
}

impl Pass {
    fn includes(self, other: Pass) -> bool {
        self == other || self == Pass::All
    }
}

fn main() -> Result<()> {
    let params = Params::parse();
    glossika_anki::init_logging(params.log_json);

    let profiles = load_profiles(params.profiles.as_deref())?;
    let opts = Opts {
        expected_raw_clips: params.expected_clips,
        ..Opts::default()
    };
    opts.validate().context("invalid options")?;

    let layout = Layout::new(&params.base_dir);
    let mut report = RunReport::default();
    let outcome = run(params.pass, &layout, &profiles, &opts, &mut report);

    // Passes that finished before a failure are still reported.
    report
        .write(io::stdout().lock(), params.report)
        .context("failed to write report")?;
    if report.has_skips() {
        warn!("some inputs were skipped; see the report for reasons");
    }
    outcome.context("run aborted")?;
    Ok(())
}

fn load_profiles(path: Option<&Path>) -> Result<ProfileTable> {
    match path {
        Some(path) => ProfileTable::load(path)
            .with_context(|| format!("failed to load profiles from {}", path.display())),
        None => Ok(ProfileTable::builtin()),
    }
}

/// Run the selected passes, recording each finished pass in `report`.
fn run(
    pass: Pass,
    layout: &Layout,
    profiles: &ProfileTable,
    opts: &Opts,
    report: &mut RunReport,
) -> glossika_anki::Result<()> {
    if pass.includes(Pass::Extract) {
        let converter = Pdftotext::locate()?;
        report.extract = Some(Extractor::new(converter, profiles, opts).run(layout)?);
    }

    if pass.includes(Pass::Split) {
        let splitter = Mp3Splt::locate()?;
        report.split = Some(Segmenter::new(splitter, opts).run(layout)?);
    }

    if pass.includes(Pass::Assemble) {
        report.assemble = Some(Assembler::new(profiles).run(layout)?);
    }

    Ok(())
}
