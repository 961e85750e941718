//! Language profiles: how each course is laid out in the PDF and how its deck looks in Anki.
//!
//! The table is built once at start-up (built-in entries plus an optional TOML file) and is
//! then passed by reference into every pass. Nothing mutates it afterwards.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::{Error, Result};

/// Marker that introduces the English sentence in every course.
pub const SOURCE_MARKER: &str = "EN";

/// Where a deck field takes its content from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FieldSource {
    /// The `[sound:...]` reference for the record's clip.
    Audio,

    /// One column of the sentence group, in marker order.
    Column(usize),

    /// Left empty for the learner to fill in.
    Blank,
}

/// A named deck field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldSpec {
    pub name: String,
    pub source: FieldSource,
}

impl FieldSpec {
    fn new(name: impl Into<String>, source: FieldSource) -> Self {
        Self {
            name: name.into(),
            source,
        }
    }
}

/// A card template (front and back HTML).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CardTemplate {
    pub name: String,
    pub front: String,
    pub back: String,
}

/// The Anki note type used for a deck: fields, templates and style sheet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeckSchema {
    pub model_id: i64,
    pub model_name: String,
    pub fields: Vec<FieldSpec>,
    pub templates: Vec<CardTemplate>,
    pub css: String,
}

impl DeckSchema {
    /// Highest sentence column this schema reads, if any.
    pub fn max_column(&self) -> Option<usize> {
        self.fields
            .iter()
            .filter_map(|f| match f.source {
                FieldSource::Column(ix) => Some(ix),
                _ => None,
            })
            .max()
    }
}

/// A deck with a fixed identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeckConfig {
    pub deck_id: i64,
    pub deck_name: String,
    pub schema: DeckSchema,
}

/// One language course.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LanguageProfile {
    /// Literal tokens that introduce each column's text in the PDF, in column order.
    pub markers: Vec<String>,

    /// Configured deck; `None` falls back to the generic schema.
    pub deck: Option<DeckConfig>,
}

/// The immutable language table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileTable {
    profiles: BTreeMap<String, LanguageProfile>,
}

impl Default for ProfileTable {
    fn default() -> Self {
        Self::builtin()
    }
}

impl ProfileTable {
    /// The languages this tool knows about out of the box.
    pub fn builtin() -> Self {
        let mandarin = mandarin_schema();
        let entries = [
            (
                "ZS",
                ["EN", "简", "PIN"],
                Some((1_507_569_441, "Glossika Mandarin (Mainland)")),
            ),
            (
                "ZH",
                ["EN", "繁", "PIN"],
                Some((1_435_687_014, "Glossika Mandarin (Taiwan)")),
            ),
            ("ZT", ["EN", "繁", "PIN"], None),
            // Swap YALE for JYUT when the course uses Jyutping.
            ("YUE", ["EN", "粵", "YALE"], None),
            ("JA", ["EN", "日", "ROM"], None),
        ];

        let profiles = entries
            .into_iter()
            .map(|(code, markers, deck)| {
                let profile = LanguageProfile {
                    markers: markers.iter().map(|m| (*m).to_owned()).collect(),
                    deck: deck.map(|(deck_id, deck_name)| DeckConfig {
                        deck_id,
                        deck_name: deck_name.to_owned(),
                        schema: mandarin.clone(),
                    }),
                };
                (code.to_owned(), profile)
            })
            .collect();

        Self { profiles }
    }

    /// Built-in table with the entries of a TOML profile file layered on top.
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        Self::builtin().with_overrides(&text)
    }

    /// Add or replace languages from a TOML document.
    ///
    /// ```toml
    /// [languages.KO]
    /// markers = ["EN", "韓", "ROM"]
    /// deck_name = "Glossika Korean"
    /// back = "{{FrontSide}}<hr id=answer>{{韓}}<br>{{EN}}"
    /// css = ".card { font-size: 24px; }"
    /// ```
    ///
    /// An entry replaces the built-in profile of the same code entirely. `front`, `back`
    /// and `css` replace the matching parts of the generic schema; field names stay the
    /// generic ones (`Audio`, the first two markers, `Notes`).
    pub fn with_overrides(mut self, toml_text: &str) -> Result<Self> {
        let file: ProfileFile = toml::from_str(toml_text)?;

        for (code, entry) in file.languages {
            validate_code(&code)?;
            validate_markers(&code, &entry.markers)?;

            let deck = entry.deck(&code);
            let profile = LanguageProfile {
                markers: entry.markers,
                deck,
            };
            self.profiles.insert(code, profile);
        }

        Ok(self)
    }

    /// Look up a configured language.
    pub fn get(&self, code: &str) -> Option<&LanguageProfile> {
        self.profiles.get(code)
    }

    /// Column markers for a language.
    ///
    /// Unconfigured languages use the English marker followed by the language code itself,
    /// which is how the course PDFs label the target-language line.
    pub fn markers_for(&self, code: &str) -> Vec<String> {
        match self.get(code) {
            Some(profile) => profile.markers.clone(),
            None => vec![SOURCE_MARKER.to_owned(), code.to_owned()],
        }
    }

    /// The deck a language is assembled into.
    ///
    /// Languages without a configured deck get the generic schema, with deck and model
    /// identifiers derived from the language code so repeated runs reuse them.
    pub fn deck_for(&self, code: &str) -> DeckConfig {
        if let Some(deck) = self.get(code).and_then(|p| p.deck.clone()) {
            return deck;
        }

        let markers = self.markers_for(code);
        DeckConfig {
            deck_id: derive_id("deck", code),
            deck_name: format!("Glossika {code}"),
            schema: generic_schema(code, &markers),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ProfileFile {
    #[serde(default)]
    languages: BTreeMap<String, ProfileEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ProfileEntry {
    markers: Vec<String>,
    #[serde(default)]
    deck_name: Option<String>,
    #[serde(default)]
    deck_id: Option<i64>,
    #[serde(default)]
    front: Option<String>,
    #[serde(default)]
    back: Option<String>,
    #[serde(default)]
    css: Option<String>,
}

impl ProfileEntry {
    /// The deck this entry configures, if it sets any deck key.
    fn deck(&self, code: &str) -> Option<DeckConfig> {
        let customized = self.deck_name.is_some()
            || self.deck_id.is_some()
            || self.front.is_some()
            || self.back.is_some()
            || self.css.is_some();
        if !customized {
            return None;
        }

        let mut schema = generic_schema(code, &self.markers);
        if let Some(template) = schema.templates.first_mut() {
            if let Some(front) = &self.front {
                template.front.clone_from(front);
            }
            if let Some(back) = &self.back {
                template.back.clone_from(back);
            }
        }
        if let Some(css) = &self.css {
            schema.css.clone_from(css);
        }

        Some(DeckConfig {
            deck_id: self.deck_id.unwrap_or_else(|| derive_id("deck", code)),
            deck_name: self
                .deck_name
                .clone()
                .unwrap_or_else(|| format!("Glossika {code}")),
            schema,
        })
    }
}

/// Field names the generic schema uses for its own columns.
const RESERVED_FIELD_NAMES: [&str; 2] = ["Audio", "Notes"];

fn validate_code(code: &str) -> Result<()> {
    let len = code.chars().count();
    if !(2..=4).contains(&len) || !code.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(Error::Config(format!(
            "language code '{code}' must be 2-4 ASCII letters or digits"
        )));
    }
    Ok(())
}

fn validate_markers(code: &str, markers: &[String]) -> Result<()> {
    if markers.len() < 2 {
        return Err(Error::Config(format!(
            "language '{code}' needs at least two markers, got {}",
            markers.len()
        )));
    }
    if let Some(bad) = markers
        .iter()
        .find(|m| m.is_empty() || m.chars().any(char::is_whitespace))
    {
        return Err(Error::Config(format!(
            "language '{code}' has an invalid marker {bad:?}"
        )));
    }
    // Markers double as deck field names, which Anki requires to be unique.
    if let Some(bad) = markers
        .iter()
        .find(|m| RESERVED_FIELD_NAMES.contains(&m.as_str()))
    {
        return Err(Error::Config(format!(
            "language '{code}' uses reserved field name {bad:?} as a marker"
        )));
    }
    if let Some((ix, bad)) = markers
        .iter()
        .enumerate()
        .find(|&(ix, m)| markers[..ix].contains(m))
    {
        return Err(Error::Config(format!(
            "language '{code}' repeats marker {bad:?} at position {}",
            ix + 1
        )));
    }
    Ok(())
}

/// Derive a stable Anki identifier from a language code.
///
/// Anki wants identifiers that are unique but fixed for a given deck; hashing the code
/// keeps them fixed across runs. The result lies in `[2^30, 2^31)`.
pub fn derive_id(kind: &str, code: &str) -> i64 {
    let digest = Sha256::digest(format!("glossika-anki:{kind}:{code}").as_bytes());
    let mut head = [0u8; 8];
    head.copy_from_slice(&digest[..8]);
    let value = u64::from_be_bytes(head) % (1 << 30);
    (1i64 << 30) + value as i64
}

const MANDARIN_CSS: &str = "\
.card {
  font-family: arial;
  font-size: 20px;
  text-align: center;
  color: black;
  background-color: white;
}
.hanzi { font-size: 40px; }
.pinyin { color: #555; }
.notes { font-size: 16px; color: #777; }
";

const GENERAL_CSS: &str = "\
.card {
  font-family: arial;
  font-size: 20px;
  text-align: center;
  color: black;
  background-color: white;
}
.target { font-size: 30px; }
.notes { font-size: 16px; color: #777; }
";

fn mandarin_schema() -> DeckSchema {
    DeckSchema {
        model_id: 1_546_318_185,
        model_name: "Glossika ZS".to_owned(),
        fields: vec![
            FieldSpec::new("Audio", FieldSource::Audio),
            FieldSpec::new("English", FieldSource::Column(0)),
            FieldSpec::new("Hanzi", FieldSource::Column(1)),
            FieldSpec::new("Pinyin", FieldSource::Column(2)),
            FieldSpec::new("Notes", FieldSource::Blank),
        ],
        templates: vec![CardTemplate {
            name: "Listening".to_owned(),
            front: "{{Audio}}".to_owned(),
            back: concat!(
                "{{FrontSide}}<hr id=answer>",
                "<div class=hanzi>{{Hanzi}}</div>",
                "<div class=pinyin>{{Pinyin}}</div>",
                "<div>{{English}}</div>",
                "{{#Notes}}<div class=notes>{{Notes}}</div>{{/Notes}}"
            )
            .to_owned(),
        }],
        css: MANDARIN_CSS.to_owned(),
    }
}

/// Two-column schema labelled with the course's own markers.
fn generic_schema(code: &str, markers: &[String]) -> DeckSchema {
    let label = |ix: usize, fallback: &str| {
        markers
            .get(ix)
            .cloned()
            .unwrap_or_else(|| fallback.to_owned())
    };
    let source = label(0, SOURCE_MARKER);
    let target = label(1, code);

    DeckSchema {
        model_id: derive_id("model", code),
        model_name: format!("Glossika General {code}"),
        fields: vec![
            FieldSpec::new("Audio", FieldSource::Audio),
            FieldSpec::new(source.clone(), FieldSource::Column(0)),
            FieldSpec::new(target.clone(), FieldSource::Column(1)),
            FieldSpec::new("Notes", FieldSource::Blank),
        ],
        templates: vec![CardTemplate {
            name: "Listening".to_owned(),
            front: "{{Audio}}".to_owned(),
            back: format!(
                "{{{{FrontSide}}}}<hr id=answer><div class=target>{{{{{target}}}}}</div>\
                 <div>{{{{{source}}}}}</div>\
                 {{{{#Notes}}}}<div class=notes>{{{{Notes}}}}</div>{{{{/Notes}}}}"
            ),
        }],
        css: GENERAL_CSS.to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_mandarin_decks_share_one_schema() {
        let table = ProfileTable::builtin();
        let zs = table.deck_for("ZS");
        let zh = table.deck_for("ZH");

        assert_eq!(zs.deck_id, 1_507_569_441);
        assert_eq!(zh.deck_id, 1_435_687_014);
        assert_eq!(zs.schema, zh.schema);
        assert_eq!(zs.schema.fields.len(), 5);
        assert_eq!(zs.schema.max_column(), Some(2));
    }

    #[test]
    fn unconfigured_language_uses_code_as_target_marker() {
        let table = ProfileTable::builtin();
        assert_eq!(table.markers_for("XY"), vec!["EN", "XY"]);
        assert_eq!(table.markers_for("JA"), vec!["EN", "日", "ROM"]);
    }

    #[test]
    fn fallback_deck_identity_is_deterministic() {
        let first = ProfileTable::builtin().deck_for("XY");
        let second = ProfileTable::builtin().deck_for("XY");

        assert_eq!(first.deck_id, second.deck_id);
        assert_eq!(first.schema.model_id, second.schema.model_id);
        assert_eq!(first.deck_name, "Glossika XY");
        assert_ne!(first.deck_id, ProfileTable::builtin().deck_for("XZ").deck_id);
    }

    #[test]
    fn derived_ids_stay_in_range() {
        for code in ["XY", "KO", "YUE", "JA", "ES", "DE"] {
            let id = derive_id("deck", code);
            assert!((1i64 << 30..1i64 << 31).contains(&id), "{code}: {id}");
        }
        assert_ne!(derive_id("deck", "KO"), derive_id("model", "KO"));
    }

    #[test]
    fn generic_schema_labels_fields_with_markers() {
        let deck = ProfileTable::builtin().deck_for("JA");
        let names: Vec<_> = deck.schema.fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, ["Audio", "EN", "日", "Notes"]);
        assert!(deck.schema.templates[0].back.contains("{{日}}"));
        assert!(deck.schema.templates[0].back.contains("{{FrontSide}}"));
    }

    #[test]
    fn toml_overrides_add_and_replace_languages() -> anyhow::Result<()> {
        let table = ProfileTable::builtin().with_overrides(
            r#"
            [languages.KO]
            markers = ["EN", "韓", "ROM"]
            deck_name = "Glossika Korean"

            [languages.ZT]
            markers = ["EN", "台", "PIN"]
            "#,
        )?;

        let ko = table.deck_for("KO");
        assert_eq!(ko.deck_name, "Glossika Korean");
        assert_eq!(ko.deck_id, derive_id("deck", "KO"));
        assert_eq!(table.markers_for("ZT"), vec!["EN", "台", "PIN"]);
        assert!(table.get("ZS").is_some());
        Ok(())
    }

    #[test]
    fn toml_overrides_reject_bad_entries() {
        let err = ProfileTable::builtin()
            .with_overrides("[languages.KO]\nmarkers = [\"EN\"]\n")
            .unwrap_err();
        assert!(err.to_string().contains("at least two markers"));

        let err = ProfileTable::builtin()
            .with_overrides("[languages.TOOLONG]\nmarkers = [\"EN\", \"X\"]\n")
            .unwrap_err();
        assert!(err.to_string().contains("2-4"));

        let err = ProfileTable::builtin()
            .with_overrides("[languages.KO]\nmarkers = [\"EN\", \"X\"]\ncolour = 1\n")
            .unwrap_err();
        assert!(matches!(err, Error::Toml(_)));
    }

    #[test]
    fn markers_that_collide_with_field_names_are_rejected() {
        for markers in [r#"["EN", "Audio"]"#, r#"["Notes", "XY"]"#, r#"["EN", "EN"]"#] {
            let err = ProfileTable::builtin()
                .with_overrides(&format!("[languages.KO]\nmarkers = {markers}\n"))
                .unwrap_err();
            assert!(matches!(err, Error::Config(_)), "{markers}: {err}");
        }
    }

    #[test]
    fn toml_overrides_customize_template_and_style() -> anyhow::Result<()> {
        let table = ProfileTable::builtin().with_overrides(
            r#"
            [languages.KO]
            markers = ["EN", "韓"]
            back = "{{FrontSide}}<hr id=answer>{{韓}}"
            css = ".card { font-size: 24px; }"
            "#,
        )?;

        let ko = table.deck_for("KO");
        assert_eq!(ko.deck_name, "Glossika KO");
        assert_eq!(ko.deck_id, derive_id("deck", "KO"));
        assert_eq!(ko.schema.templates[0].front, "{{Audio}}");
        assert_eq!(ko.schema.templates[0].back, "{{FrontSide}}<hr id=answer>{{韓}}");
        assert_eq!(ko.schema.css, ".card { font-size: 24px; }");
        Ok(())
    }
}
