//! Binding sentence groups and clips into Anki notes, and writing the package.

use std::path::{Path, PathBuf};

use genanki_rs::{Deck, Field, Model, Note, Package, Template};
use serde::Serialize;

use crate::profile::{DeckConfig, DeckSchema, FieldSource};
use crate::sentence_parser::SentenceGroup;
use crate::workdir::WorkingDir;
use crate::{Error, Result};

/// One flashcard: a sentence group and the clip that narrates it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeckRecord {
    pub group: SentenceGroup,

    /// Clip file name, relative to the clip directory.
    pub clip: String,
}

impl DeckRecord {
    /// Field values in schema order.
    pub fn fields(&self, schema: &DeckSchema) -> Vec<String> {
        schema
            .fields
            .iter()
            .map(|field| match field.source {
                FieldSource::Audio => sound_tag(&self.clip),
                FieldSource::Column(ix) => self.group.fields().get(ix).cloned().unwrap_or_default(),
                FieldSource::Blank => String::new(),
            })
            .collect()
    }
}

/// Anki's media reference for an audio file.
pub fn sound_tag(clip: &str) -> String {
    format!("[sound:{clip}]")
}

/// Pair sentence row `i` with clip `i`.
///
/// Both sides must already be in canonical order. Unequal lengths are refused outright:
/// a deck whose audio is off by one row is worse than no deck.
pub fn bind(groups: Vec<SentenceGroup>, clips: Vec<String>) -> Result<Vec<DeckRecord>> {
    if groups.len() != clips.len() {
        return Err(Error::mismatch(
            format!("clips for {} sentence rows", groups.len()),
            groups.len(),
            clips.len(),
        ));
    }

    Ok(groups
        .into_iter()
        .zip(clips)
        .map(|(group, clip)| DeckRecord { group, clip })
        .collect())
}

/// Build the Anki note type for a schema.
pub fn build_model(schema: &DeckSchema) -> Model {
    let fields = schema.fields.iter().map(|f| Field::new(&f.name)).collect();
    let templates = schema
        .templates
        .iter()
        .map(|t| Template::new(&t.name).qfmt(&t.front).afmt(&t.back))
        .collect();

    Model::new_with_options(
        schema.model_id,
        &schema.model_name,
        fields,
        templates,
        Some(schema.css.as_str()),
        None,
        None,
        None,
        None,
    )
}

/// Build a deck holding one note per record.
pub fn build_deck(config: &DeckConfig, records: &[DeckRecord]) -> Result<Deck> {
    let model = build_model(&config.schema);
    let mut deck = Deck::new(config.deck_id, &config.deck_name, "");

    for record in records {
        let values = record.fields(&config.schema);
        let note = Note::new(model.clone(), values.iter().map(String::as_str).collect())
            .map_err(package_error)?;
        deck.add_note(note);
    }

    Ok(deck)
}

/// Write `deck` and its media to `<media_dir>/<file_name>`.
///
/// The packager resolves media names against the working directory, so the write happens
/// with `media_dir` entered and the previous directory restored afterwards.
pub fn write_package(deck: Deck, media: &[String], media_dir: &Path, file_name: &str) -> Result<PathBuf> {
    {
        let _cwd = WorkingDir::enter(media_dir)?;
        let mut package = Package::new(vec![deck], media.iter().map(String::as_str).collect())
            .map_err(package_error)?;
        package.write_to_file(file_name).map_err(package_error)?;
    }

    Ok(media_dir.join(file_name))
}

fn package_error(err: impl std::fmt::Display) -> Error {
    Error::Package(err.to_string())
}
