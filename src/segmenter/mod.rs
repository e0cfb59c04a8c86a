pub mod markers;

pub use markers::*;

use std::sync::LazyLock;

use serde::Serialize;

use crate::models::{next_state, LineClass, Speaker, SpeakerState};

/// Configuration for turn-marker recognition
#[derive(Debug, Clone)]
pub struct SegmenterConfig {
    /// Colon-style speaker names that hand the turn to the human
    pub human_aliases: Vec<String>,
    /// Colon-style speaker names that hand the turn to the assistant
    pub assistant_aliases: Vec<String>,
    /// Speaker token that marks the human in said-style transcripts
    pub human_said_marker: String,
}

impl Default for SegmenterConfig {
    fn default() -> Self {
        Self {
            human_aliases: vec!["You".to_string(), "User".to_string()],
            assistant_aliases: vec![
                "Assistant".to_string(),
                "ChatGPT".to_string(),
                "AI".to_string(),
            ],
            human_said_marker: "You".to_string(),
        }
    }
}

impl SegmenterConfig {
    /// Add a branded assistant name (e.g. a custom GPT) as a colon-style alias
    pub fn with_product_name(mut self, name: impl Into<String>) -> Self {
        let name = name.into();
        if !name.trim().is_empty() {
            self.assistant_aliases.push(name);
        }
        self
    }
}

/// Counters collected while segmenting one transcript
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SegmentStats {
    pub lines: usize,
    pub marker_lines: usize,
    pub human_lines: usize,
    pub turns_human: usize,
    pub turns_assistant: usize,
}

/// Human-only text plus the counters gathered producing it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segmentation {
    pub text: String,
    pub stats: SegmentStats,
}

/// Separates the human participant's lines from a chat transcript
#[derive(Debug, Clone)]
pub struct Segmenter {
    classifier: MarkerClassifier,
}

impl Segmenter {
    pub fn new(config: &SegmenterConfig) -> Result<Self, regex::Error> {
        Ok(Self {
            classifier: MarkerClassifier::new(config)?,
        })
    }

    pub fn classifier(&self) -> &MarkerClassifier {
        &self.classifier
    }

    /// Return the human-only text of a transcript
    pub fn segment<I, S>(&self, lines: I) -> String
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.segment_with_stats(lines).text
    }

    /// Walk the lines once, tracking whose turn it is
    ///
    /// Marker lines switch the state and are dropped. Content lines are kept
    /// only while the human holds the turn; nothing is kept before the first
    /// marker. The joined result is trimmed at both ends.
    pub fn segment_with_stats<I, S>(&self, lines: I) -> Segmentation
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut state: SpeakerState = None;
        let mut stats = SegmentStats::default();
        let mut kept: Vec<String> = Vec::new();

        for raw in lines {
            let line = raw.as_ref().trim_end_matches(['\n', '\r']);
            stats.lines += 1;

            let class = self.classifier.classify(line);
            state = next_state(state, class);

            match class {
                LineClass::HumanMarker => {
                    stats.marker_lines += 1;
                    stats.turns_human += 1;
                }
                LineClass::AssistantMarker => {
                    stats.marker_lines += 1;
                    stats.turns_assistant += 1;
                }
                LineClass::Content => {
                    if state == Some(Speaker::Human) {
                        stats.human_lines += 1;
                        kept.push(line.to_string());
                    }
                }
            }
        }

        Segmentation {
            text: kept.join("\n").trim().to_string(),
            stats,
        }
    }
}

static DEFAULT_SEGMENTER: LazyLock<Segmenter> = LazyLock::new(|| {
    Segmenter::new(&SegmenterConfig::default()).expect("default marker patterns compile")
});

/// Segment with the default marker dialects
pub fn segment<I, S>(lines: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    DEFAULT_SEGMENTER.segment(lines)
}

/// Segment already-normalized transcript text
pub fn segment_text(text: &str) -> String {
    DEFAULT_SEGMENTER.segment(text.split('\n'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_said_style_conversation() {
        let lines = [
            "You said:",
            "hello there",
            "ChatGPT said:",
            "hi back",
            "You said:",
            "my name is Jane Doe",
            "email: jane@example.com",
        ];
        assert_eq!(
            segment(lines),
            "hello there\nmy name is Jane Doe\nemail: jane@example.com"
        );
    }

    #[test]
    fn test_empty_input() {
        let lines: Vec<String> = Vec::new();
        assert_eq!(segment(lines), "");
        assert_eq!(segment_text(""), "");
    }

    #[test]
    fn test_no_markers_yields_nothing() {
        let lines = ["just some text", "with no speaker markers", "at all"];
        assert_eq!(segment(lines), "");
    }

    #[test]
    fn test_mixed_marker_styles() {
        let text = "User:\nfirst question\nChatGPT said:\nanswer\nYou said:\nfollow up\nAssistant:\nmore answer";
        assert_eq!(segment_text(text), "first question\nfollow up");
    }

    #[test]
    fn test_marker_lines_never_emitted() {
        let lines = ["You said:", "You said:", "User:", "real text", "You:"];
        let out = segment(lines);
        assert_eq!(out, "real text");
        assert!(!out.contains("said:"));
    }

    #[test]
    fn test_inner_blank_lines_kept_outer_trimmed() {
        let lines = ["You said:", "", "  first", "", "second  ", "", "AI:", "x"];
        assert_eq!(segment(lines), "first\n\nsecond");
    }

    #[test]
    fn test_segment_is_repeatable() {
        let lines = vec!["You said:", "a", "ChatGPT said:", "b"];
        assert_eq!(segment(lines.clone()), segment(lines));
    }

    #[test]
    fn test_stats() {
        let segmenter = Segmenter::new(&SegmenterConfig::default()).unwrap();
        let result = segmenter.segment_with_stats(["intro", "You said:", "a", "b", "ChatGPT said:", "c"]);
        assert_eq!(result.text, "a\nb");
        assert_eq!(
            result.stats,
            SegmentStats {
                lines: 6,
                marker_lines: 2,
                human_lines: 2,
                turns_human: 1,
                turns_assistant: 1,
            }
        );
    }

    #[test]
    fn test_ambiguous_marker_keeps_human_text() {
        let mut config = SegmenterConfig::default();
        config.assistant_aliases.push("User".to_string());
        let segmenter = Segmenter::new(&config).unwrap();
        assert_eq!(segmenter.segment(["User:", "hi", "AI:", "x"]), "hi");
    }

    #[test]
    fn test_custom_product_name() {
        let config = SegmenterConfig::default().with_product_name("Breakeven");
        let segmenter = Segmenter::new(&config).unwrap();
        let out = segmenter.segment(["User:", "hi", "Breakeven:", "hello", "User:", "bye"]);
        assert_eq!(out, "hi\nbye");
    }
}
