//! File naming conventions shared by the three passes.
//!
//! Every pass keys its work off file names alone, so the patterns here are matched exactly.

use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;

use crate::{Error, Result};

static PDF_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^GLOSSIKA-EN([^-]{2,4})-([^-]{2})-EBK\.pdf$").expect("valid pdf name pattern")
});

static TSV_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^GLOSSIKA-EN([^-]{2,4})-([^-]{2})-EBK\.tsv$").expect("valid tsv name pattern")
});

static AUDIO_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^EN([^-]{2,4})-([^-]{2})-GMS-C-(\d{4})\.mp3$").expect("valid audio name pattern")
});

static CLIP_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([^-]{2,4})-(\d{4})\.mp3$").expect("valid clip name pattern")
});

static RAW_CLIP_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{3}\.mp3$").expect("valid raw clip pattern"));

/// Log file mp3splt leaves in its working directory.
pub const SPLITTER_LOG: &str = "mp3splt.log";

/// Name prefix of the per-recording directories the splitter writes into.
pub const STAGING_PREFIX: &str = ".split-";

/// A course book, identified by its PDF or TSV name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CourseFile {
    /// Name without extension, e.g. `GLOSSIKA-ENZS-F1-EBK`.
    pub stem: String,

    /// Course language code, e.g. `ZS`.
    pub language: String,
}

impl CourseFile {
    /// Parse a source PDF name (`GLOSSIKA-EN<LANG>-<XX>-EBK.pdf`).
    pub fn from_pdf_name(name: &str) -> Result<Self> {
        Self::parse(&PDF_NAME, name)
    }

    /// Parse an intermediate table name (`GLOSSIKA-EN<LANG>-<XX>-EBK.tsv`).
    pub fn from_tsv_name(name: &str) -> Result<Self> {
        Self::parse(&TSV_NAME, name)
    }

    fn parse(pattern: &Regex, name: &str) -> Result<Self> {
        let caps = pattern
            .captures(name)
            .ok_or_else(|| unrecognized(name))?;
        let language = caps[1].to_owned();

        Ok(Self {
            stem: format!("GLOSSIKA-EN{language}-{}-EBK", &caps[2]),
            language,
        })
    }

    pub fn tsv_name(&self) -> String {
        format!("{}.tsv", self.stem)
    }

    pub fn text_name(&self) -> String {
        format!("{}.txt", self.stem)
    }
}

/// A long-form GMS-C recording covering one range of phrases.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioFile {
    pub language: String,

    /// Number of the first phrase narrated in this recording.
    pub start_phrase: u32,
}

impl AudioFile {
    /// Parse `EN<LANG>-<XX>-GMS-C-<NNNN>.mp3`.
    pub fn from_name(name: &str) -> Result<Self> {
        let caps = AUDIO_NAME.captures(name).ok_or_else(|| unrecognized(name))?;
        let start_phrase = caps[3].parse().map_err(|_| unrecognized(name))?;

        Ok(Self {
            language: caps[1].to_owned(),
            start_phrase,
        })
    }
}

/// Name of the clip holding one phrase: `<LANG>-<NNNN>.mp3`.
pub fn clip_name(language: &str, phrase: u32) -> String {
    format!("{language}-{phrase:04}.mp3")
}

/// Whether `name` is a renamed clip belonging to `language`.
pub fn is_clip_for(name: &str, language: &str) -> bool {
    CLIP_NAME
        .captures(name)
        .is_some_and(|caps| &caps[1] == language)
}

/// Whether `name` is a numbered splitter output that has not been renamed yet.
pub fn is_raw_clip(name: &str) -> bool {
    RAW_CLIP_NAME.is_match(name)
}

/// Final file name of a deck package.
pub fn package_name(deck_name: &str) -> String {
    format!("{deck_name}.apkg")
}

/// File name component of a path, if it is valid UTF-8.
pub fn file_name(path: &Path) -> Option<&str> {
    path.file_name().and_then(|n| n.to_str())
}

fn unrecognized(name: &str) -> Error {
    Error::UnrecognizedFilename {
        name: name.to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_pdf_names() -> anyhow::Result<()> {
        let zs = CourseFile::from_pdf_name("GLOSSIKA-ENZS-F1-EBK.pdf")?;
        assert_eq!(zs.language, "ZS");
        assert_eq!(zs.tsv_name(), "GLOSSIKA-ENZS-F1-EBK.tsv");
        assert_eq!(zs.text_name(), "GLOSSIKA-ENZS-F1-EBK.txt");

        let yue = CourseFile::from_pdf_name("GLOSSIKA-ENYUE-F3-EBK.pdf")?;
        assert_eq!(yue.language, "YUE");
        Ok(())
    }

    #[test]
    fn rejects_foreign_pdf_names() {
        for name in [
            "GLOSSIKA-ENZS-F1-EBK.txt",
            "GLOSSIKA-ENTOOLONG-F1-EBK.pdf",
            "GLOSSIKA-ENZS-F12-EBK.pdf",
            "notes.pdf",
        ] {
            let err = CourseFile::from_pdf_name(name).unwrap_err();
            assert!(matches!(err, Error::UnrecognizedFilename { .. }), "{name}");
        }
    }

    #[test]
    fn tsv_names_round_back_to_course() -> anyhow::Result<()> {
        let course = CourseFile::from_tsv_name("GLOSSIKA-ENJA-F2-EBK.tsv")?;
        assert_eq!(course.language, "JA");
        assert_eq!(course.stem, "GLOSSIKA-ENJA-F2-EBK");
        Ok(())
    }

    #[test]
    fn parses_audio_names() -> anyhow::Result<()> {
        let audio = AudioFile::from_name("ENZS-F1-GMS-C-0051.mp3")?;
        assert_eq!(audio.language, "ZS");
        assert_eq!(audio.start_phrase, 51);

        assert!(AudioFile::from_name("ENZS-F1-GMS-A-0051.mp3").is_err());
        assert!(AudioFile::from_name("ENZS-F1-GMS-C-51.mp3").is_err());
        Ok(())
    }

    #[test]
    fn clip_names_are_zero_padded_and_language_scoped() {
        assert_eq!(clip_name("ZS", 7), "ZS-0007.mp3");
        assert_eq!(clip_name("YUE", 1000), "YUE-1000.mp3");

        assert!(is_clip_for("ZS-0007.mp3", "ZS"));
        assert!(!is_clip_for("ZS-0007.mp3", "ZH"));
        assert!(!is_clip_for("ZS-007.mp3", "ZS"));
        assert!(!is_clip_for("GLOSSIKA-ENZS-F1-EBK.tsv", "ZS"));
    }

    #[test]
    fn raw_clips_are_three_digit_names() {
        assert!(is_raw_clip("001.mp3"));
        assert!(is_raw_clip("054.mp3"));
        assert!(!is_raw_clip("ZS-0001.mp3"));
        assert!(!is_raw_clip("0001.mp3"));
        assert!(!is_raw_clip(SPLITTER_LOG));
    }
}
