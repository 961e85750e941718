//! Deck assembly pass.
//!
//! For every language with sentence tables in the output directory, pairs the table rows
//! with that language's clips and writes one Anki package. Tables and clips are consumed:
//! once the package is in place they are deleted.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::deck::{bind, build_deck, write_package};
use crate::filenames::{CourseFile, file_name, is_clip_for, package_name};
use crate::layout::Layout;
use crate::profile::ProfileTable;
use crate::report::{AssembleReport, DeckWritten, Skipped};
use crate::tsv_encoder::read_groups;
use crate::{Error, Result};

/// The assembly pass.
pub struct Assembler<'a> {
    profiles: &'a ProfileTable,
}

impl<'a> Assembler<'a> {
    pub fn new(profiles: &'a ProfileTable) -> Self {
        Self { profiles }
    }

    /// Assemble a deck for every language that has sentence tables.
    pub fn run(&self, layout: &Layout) -> Result<AssembleReport> {
        if !layout.clips.is_dir() {
            return Err(Error::MissingInput {
                path: layout.clips.clone(),
            });
        }

        let mut report = AssembleReport::default();
        for (language, tables) in list_tables(&layout.output)? {
            match self.assemble_language(&language, &tables, layout) {
                Ok(deck) => {
                    info!(
                        language = %language,
                        records = deck.records,
                        package = %deck.package.display(),
                        "deck written"
                    );
                    report.decks.push(deck);
                }
                Err(err) if err.is_fatal_for_run() => return Err(err),
                Err(err) => {
                    warn!(language = %language, error = %err, "skipping language");
                    report.skipped.push(Skipped::new(language, err));
                }
            }
        }

        Ok(report)
    }

    /// Build, package and clean up one language.
    ///
    /// `tables` must already be sorted. Nothing is deleted unless the package was written.
    pub fn assemble_language(&self, language: &str, tables: &[PathBuf], layout: &Layout) -> Result<DeckWritten> {
        let deck_config = self.profiles.deck_for(language);
        let width = self.profiles.markers_for(language).len();

        if let Some(max_column) = deck_config.schema.max_column() {
            if max_column >= width {
                return Err(Error::mismatch(
                    format!("sentence columns required by deck '{}'", deck_config.deck_name),
                    max_column + 1,
                    width,
                ));
            }
        }

        let mut groups = Vec::new();
        for table in tables {
            groups.extend(read_groups(table, width)?);
        }

        let clips = list_clips(&layout.clips, language)?;
        debug!(language, sentences = groups.len(), clips = clips.len(), "binding records");
        let records = bind(groups, clips.clone())?;

        let deck = build_deck(&deck_config, &records)?;
        let package_file = package_name(&deck_config.deck_name);
        let built = write_package(deck, &clips, &layout.clips, &package_file)?;

        for table in tables {
            fs::remove_file(table)?;
        }
        for clip in &clips {
            fs::remove_file(layout.clips.join(clip))?;
        }

        let package = layout.output.join(&package_file);
        fs::rename(&built, &package)?;

        // Other languages' clips may still be waiting.
        let _ = fs::remove_dir(&layout.clips);

        Ok(DeckWritten {
            language: language.to_owned(),
            deck_name: deck_config.deck_name,
            deck_id: deck_config.deck_id,
            records: records.len(),
            package,
        })
    }
}

/// Sentence tables in `dir`, grouped by language, each group sorted by file name.
pub fn list_tables(dir: &Path) -> Result<BTreeMap<String, Vec<PathBuf>>> {
    let mut languages: BTreeMap<String, Vec<PathBuf>> = BTreeMap::new();
    if !dir.is_dir() {
        return Ok(languages);
    }

    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if !path.is_file() {
            continue;
        }
        let Some(course) = file_name(&path).and_then(|n| CourseFile::from_tsv_name(n).ok()) else {
            continue;
        };
        languages.entry(course.language).or_default().push(path);
    }

    for tables in languages.values_mut() {
        tables.sort();
    }
    Ok(languages)
}

/// Clip file names for `language` in `dir`, sorted.
pub fn list_clips(dir: &Path, language: &str) -> Result<Vec<String>> {
    let mut clips = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if let Some(name) = entry.file_name().to_str() {
            if is_clip_for(name, language) {
                clips.push(name.to_owned());
            }
        }
    }
    clips.sort();
    Ok(clips)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn list_tables_groups_by_language_in_name_order() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        for name in [
            "GLOSSIKA-ENZS-F2-EBK.tsv",
            "GLOSSIKA-ENZS-F1-EBK.tsv",
            "GLOSSIKA-ENJA-F1-EBK.tsv",
            "GLOSSIKA-ENJA-F1-EBK.tsv.part",
            "GLOSSIKA-ENJA-F1-EBK.txt",
        ] {
            fs::write(dir.path().join(name), b"")?;
        }

        let tables = list_tables(dir.path())?;
        let languages: Vec<_> = tables.keys().map(String::as_str).collect();
        assert_eq!(languages, ["JA", "ZS"]);

        let zs: Vec<_> = tables["ZS"].iter().filter_map(|p| file_name(p)).collect();
        assert_eq!(zs, ["GLOSSIKA-ENZS-F1-EBK.tsv", "GLOSSIKA-ENZS-F2-EBK.tsv"]);
        assert_eq!(tables["JA"].len(), 1);
        Ok(())
    }

    #[test]
    fn list_clips_only_returns_the_requested_language() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        for name in ["ZS-0002.mp3", "ZS-0001.mp3", "ZH-0001.mp3", "001.mp3"] {
            fs::write(dir.path().join(name), b"")?;
        }

        assert_eq!(list_clips(dir.path(), "ZS")?, ["ZS-0001.mp3", "ZS-0002.mp3"]);
        Ok(())
    }

    #[test]
    fn missing_clip_directory_stops_the_pass() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let layout = Layout::new(dir.path());
        let profiles = ProfileTable::builtin();

        let err = Assembler::new(&profiles).run(&layout).unwrap_err();
        assert!(matches!(err, Error::MissingInput { .. }));
        assert!(!layout.clips.exists());
        Ok(())
    }
}
