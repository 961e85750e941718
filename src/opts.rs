use serde::Serialize;

use crate::{Error, Result};

/// Options that control how the three passes behave.
///
/// This struct represents *library-level configuration*, not CLI flags directly.
/// The CLI is responsible for mapping user input into this type so that other
/// frontends (tests, scripts) can construct options programmatically.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Opts {
    /// Number of sentence groups every source PDF must yield.
    ///
    /// A document that parses to any other count is rejected as a whole.
    pub expected_groups_per_pdf: usize,

    /// Parameters handed to the silence splitter.
    pub silence: SilenceParams,

    /// Number of raw clips the splitter must produce for one recording.
    ///
    /// This is an empirical constant tied to mp3splt 2.6.2 / libmp3splt 0.9.2 with the
    /// default `silence` parameters. Revalidate it when either changes.
    pub expected_raw_clips: usize,

    /// Raw clips at the start of each recording that are narration, not phrases.
    pub head_filler: usize,

    /// Raw clips at the end of each recording that are narration, not phrases.
    pub tail_filler: usize,
}

impl Default for Opts {
    fn default() -> Self {
        Self {
            expected_groups_per_pdf: 1000,
            silence: SilenceParams::default(),
            expected_raw_clips: 54,
            head_filler: 2,
            tail_filler: 2,
        }
    }
}

impl Opts {
    /// Phrases covered by one recording once filler is discarded.
    pub fn phrases_per_batch(&self) -> usize {
        self.expected_raw_clips
            .saturating_sub(self.head_filler + self.tail_filler)
    }

    /// Reject option sets that could never produce a usable result.
    pub fn validate(&self) -> Result<()> {
        if self.expected_groups_per_pdf == 0 {
            return Err(Error::Config(
                "expected groups per PDF must be positive".to_owned(),
            ));
        }
        if self.phrases_per_batch() == 0 {
            return Err(Error::Config(format!(
                "{} raw clips leave no phrases after discarding {} head and {} tail clips",
                self.expected_raw_clips, self.head_filler, self.tail_filler
            )));
        }
        Ok(())
    }
}

/// Silence-detection parameters for the splitter.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SilenceParams {
    /// Silence kept at the start and end of each clip, as `<start>_<end>` seconds.
    pub remove_silence: String,

    /// Minimum silence length (seconds) that counts as a split point.
    pub min_silence_secs: f32,

    /// Level (dB) below which audio counts as silence.
    pub threshold_db: i32,

    /// Shots of non-silence needed after a silence for it to qualify.
    ///
    /// Lowered from the splitter's default of 24 so short sentences are kept.
    pub min_shots: u32,

    /// Output naming pattern; `@N3` yields three-digit sequence numbers.
    pub output_pattern: String,
}

impl Default for SilenceParams {
    fn default() -> Self {
        Self {
            remove_silence: "0.2_0".to_owned(),
            min_silence_secs: 1.9,
            threshold_db: -64,
            min_shots: 12,
            output_pattern: "@N3".to_owned(),
        }
    }
}

impl SilenceParams {
    /// Render the `-p` argument understood by mp3splt.
    pub fn to_splitter_arg(&self) -> String {
        format!(
            "rm={},min={},th={},shots={}",
            self.remove_silence, self.min_silence_secs, self.threshold_db, self.min_shots
        )
    }
}
