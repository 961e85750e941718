//! Reconstructs sentence groups from the column layout of a course book.
//!
//! `pdftotext -layout` renders every phrase as a block of marker lines:
//!
//! ```text
//!    EN    I'm going to the store now, and I'll
//!          be back soon.
//!    简    我现在去商店，很快就回来。
//!    PIN   wǒ xiànzài qù shāngdiàn, hěn kuài jiù huílái.
//! ```
//!
//! A marker line opens a sentence; its content column fixes the indentation that
//! continuation lines must match exactly. The first line that does not match closes the
//! sentence and is then tested against the next marker. Once every marker of the profile has
//! produced a sentence, the sentences form one [`SentenceGroup`].
//!
//! The parser is a pure state machine so it can be driven line by line from any source.

use serde::Serialize;

use crate::{Error, Result};

/// One studied phrase: one sentence per profile marker, in marker order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SentenceGroup(pub Vec<String>);

impl SentenceGroup {
    pub fn fields(&self) -> &[String] {
        &self.0
    }
}

/// Line-at-a-time parser state.
#[derive(Debug, Clone)]
pub struct SentenceParser {
    markers: Vec<String>,

    // Index into `markers` of the block we are waiting for.
    expected_marker: usize,

    // Content column of the sentence in progress; zero when no sentence is open.
    continuation_indent: usize,

    sentence: String,
    group: Vec<String>,
    groups: Vec<SentenceGroup>,
}

impl SentenceParser {
    /// Create a parser for the given column markers.
    pub fn new(markers: Vec<String>) -> Result<Self> {
        if markers.is_empty() {
            return Err(Error::Config(
                "sentence parser needs at least one marker".to_owned(),
            ));
        }

        Ok(Self {
            group: Vec::with_capacity(markers.len()),
            markers,
            expected_marker: 0,
            continuation_indent: 0,
            sentence: String::new(),
            groups: Vec::new(),
        })
    }

    /// Advance the state machine by one line of text.
    pub fn push_line(&mut self, line: &str) {
        let line = line.trim_end_matches(['\n', '\r']);

        if self.continuation_indent > 0 {
            if let Some(rest) = continuation(line, self.continuation_indent) {
                self.sentence.push(' ');
                self.sentence.push_str(rest);
                return;
            }
            // The sentence ended; this line may still open the next block.
            self.close_sentence();
        }

        if let Some((indent, content)) = marker_line(line, &self.markers[self.expected_marker]) {
            self.sentence.clear();
            self.sentence.push_str(content);
            self.continuation_indent = indent;
        }
    }

    /// Number of groups completed so far.
    pub fn completed(&self) -> usize {
        self.groups.len()
    }

    /// Close any sentence still open at end of input and return the completed groups.
    ///
    /// A group missing some of its markers at end of input is dropped.
    pub fn finish(mut self) -> Vec<SentenceGroup> {
        if self.continuation_indent > 0 {
            self.close_sentence();
        }
        self.groups
    }

    fn close_sentence(&mut self) {
        self.group.push(std::mem::take(&mut self.sentence));
        self.continuation_indent = 0;
        self.expected_marker += 1;

        if self.expected_marker >= self.markers.len() {
            self.expected_marker = 0;
            let group = std::mem::replace(&mut self.group, Vec::with_capacity(self.markers.len()));
            self.groups.push(SentenceGroup(group));
        }
    }
}

/// Parse a whole document.
pub fn parse_sentences(text: &str, markers: &[String]) -> Result<Vec<SentenceGroup>> {
    let mut parser = SentenceParser::new(markers.to_vec())?;
    for line in text.lines() {
        parser.push_line(line);
    }
    Ok(parser.finish())
}

/// Match exactly `indent` whitespace characters followed by content.
fn continuation(line: &str, indent: usize) -> Option<&str> {
    let mut chars = line.char_indices();
    for _ in 0..indent {
        let (_, c) = chars.next()?;
        if !c.is_whitespace() {
            return None;
        }
    }

    let (start, c) = chars.next()?;
    if c.is_whitespace() {
        return None;
    }
    Some(&line[start..])
}

/// Match `<whitespace><marker><whitespace><content>`.
///
/// Returns the content and the character column it starts at.
fn marker_line<'a>(line: &'a str, marker: &str) -> Option<(usize, &'a str)> {
    let after_lead = line.trim_start();
    if after_lead.len() == line.len() {
        return None;
    }

    let after_marker = after_lead.strip_prefix(marker)?;
    let content = after_marker.trim_start();
    if content.len() == after_marker.len() || content.is_empty() {
        return None;
    }

    let prefix = &line[..line.len() - content.len()];
    Some((prefix.chars().count(), content))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn markers(list: &[&str]) -> Vec<String> {
        list.iter().map(|m| (*m).to_owned()).collect()
    }

    fn group(fields: &[&str]) -> SentenceGroup {
        SentenceGroup(fields.iter().map(|f| (*f).to_owned()).collect())
    }

    const MANDARIN_BLOCK: &str = "
   EN    I'm going to the store now, and I'll
         be back soon.
   简    我现在去商店，很快就回来。
   PIN   wǒ xiànzài qù shāngdiàn,
         hěn kuài jiù huílái.
";

    #[test]
    fn fields_follow_marker_order_with_continuations() -> anyhow::Result<()> {
        let groups = parse_sentences(MANDARIN_BLOCK, &markers(&["EN", "简", "PIN"]))?;
        assert_eq!(
            groups,
            vec![group(&[
                "I'm going to the store now, and I'll be back soon.",
                "我现在去商店，很快就回来。",
                "wǒ xiànzài qù shāngdiàn, hěn kuài jiù huílái.",
            ])]
        );
        Ok(())
    }

    #[test]
    fn continuation_must_align_to_the_content_column() -> anyhow::Result<()> {
        let text = "
  EN  first line
       over-indented
  XY  target
";
        let groups = parse_sentences(text, &markers(&["EN", "XY"]))?;
        assert_eq!(groups, vec![group(&["first line", "target"])]);
        Ok(())
    }

    #[test]
    fn noise_between_blocks_is_ignored() -> anyhow::Result<()> {
        let text = "
GLOSSIKA  Mass Sentences                     page 12

  1
  EN   Hello.
  XY   Bonjour.
\x0c
  2
  EN   Thanks.
  XY   Merci.
";
        let groups = parse_sentences(text, &markers(&["EN", "XY"]))?;
        assert_eq!(
            groups,
            vec![group(&["Hello.", "Bonjour."]), group(&["Thanks.", "Merci."])]
        );
        Ok(())
    }

    #[test]
    fn markers_out_of_turn_are_skipped() -> anyhow::Result<()> {
        let text = "
  XY   stray target before any English
  EN   Hello.
  EN   Not awaited.
  XY   Bonjour.
";
        let groups = parse_sentences(text, &markers(&["EN", "XY"]))?;
        assert_eq!(groups, vec![group(&["Hello.", "Bonjour."])]);
        Ok(())
    }

    #[test]
    fn marker_needs_leading_whitespace_and_content() -> anyhow::Result<()> {
        let text = "
EN   flush left is body text
  EN
  ENGLISH is not a marker
  EN   Hello.
  XY   Bonjour.
";
        let groups = parse_sentences(text, &markers(&["EN", "XY"]))?;
        assert_eq!(groups, vec![group(&["Hello.", "Bonjour."])]);
        Ok(())
    }

    #[test]
    fn incomplete_trailing_group_is_dropped() -> anyhow::Result<()> {
        let text = "
  EN   Hello.
  XY   Bonjour.
  EN   Dangling.
";
        let groups = parse_sentences(text, &markers(&["EN", "XY"]))?;
        assert_eq!(groups.len(), 1);
        Ok(())
    }

    #[test]
    fn completed_counts_groups_as_lines_arrive() -> anyhow::Result<()> {
        let mut parser = SentenceParser::new(markers(&["EN", "XY"]))?;
        parser.push_line("  EN   Hello.");
        parser.push_line("  XY   Bonjour.");
        assert_eq!(parser.completed(), 0);
        parser.push_line("");
        assert_eq!(parser.completed(), 1);
        Ok(())
    }

    #[test]
    fn continuation_matching_counts_characters_not_bytes() {
        assert_eq!(continuation("\u{3000}\u{3000}next", 2), Some("next"));
        assert_eq!(continuation("   next", 2), None);
        assert_eq!(continuation("  ", 2), None);
        assert_eq!(marker_line("   简    我", "简"), Some((8, "我")));
    }

    #[test]
    fn empty_marker_list_is_rejected() {
        assert!(SentenceParser::new(Vec::new()).is_err());
    }
}
