//! `glossika_anki` turns Glossika course material into Anki flashcard decks.
//!
//! Three independent passes run over a fixed directory layout:
//! - [`extractor`]: course PDFs → sentence tables (one TSV row per phrase)
//! - [`segmenter`]: GMS-C recordings → one numbered clip per phrase
//! - [`assembler`]: sentence tables + clips → one `.apkg` deck per language
//!
//! The passes share nothing in memory; each reads what the previous one left on disk.

// Shared configuration and errors.
pub mod error;
pub mod layout;
pub mod opts;
pub mod profile;

// Naming conventions.
pub mod filenames;

// PDF layout parsing and sentence tables.
pub mod group_encoder;
pub mod sentence_parser;
pub mod tsv_encoder;

// External tools and process-level state.
pub mod tools;
pub mod workdir;

// Deck construction.
pub mod deck;

// The passes and their reports.
pub mod assembler;
pub mod extractor;
pub mod report;
pub mod segmenter;

// Logging configuration.
#[cfg(feature = "logging")]
pub mod logging;

pub use error::{Error, Result};
pub use layout::Layout;
pub use opts::{Opts, SilenceParams};
pub use profile::ProfileTable;
pub use report::{ReportFormat, RunReport};

pub use assembler::Assembler;
pub use extractor::Extractor;
pub use segmenter::Segmenter;
pub use tools::{Mp3Splt, Pdftotext, Splitter, TextConverter};

#[cfg(feature = "logging")]
pub use logging::init as init_logging;
