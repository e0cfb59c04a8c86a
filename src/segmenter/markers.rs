use regex::{Regex, RegexBuilder};

use crate::models::LineClass;

use super::SegmenterConfig;

/// Compiled turn-marker patterns for one marker dialect configuration
///
/// Two families are recognised: said-style (`You said:` / `ChatGPT said:`)
/// and colon-style (`User:` / `Assistant:`). Every pattern is anchored to the
/// whole line so prose containing "said" or a colon stays content.
#[derive(Debug, Clone)]
pub struct MarkerClassifier {
    human_said: Regex,
    any_said: Regex,
    human_colon: Option<Regex>,
    assistant_colon: Option<Regex>,
    human_said_marker: String,
}

impl MarkerClassifier {
    pub fn new(config: &SegmenterConfig) -> Result<Self, regex::Error> {
        let marker = config.human_said_marker.trim();
        let human_said = build(&format!(r"^\s*{}\s+said:\s*$", regex::escape(marker)))?;
        let any_said = build(r"^\s*[\w\s]+said:\s*$")?;
        let human_colon = build_alias_pattern(&config.human_aliases)?;
        let assistant_colon = build_alias_pattern(&config.assistant_aliases)?;

        Ok(Self {
            human_said,
            any_said,
            human_colon,
            assistant_colon,
            human_said_marker: marker.to_lowercase(),
        })
    }

    /// Classify a line; human markers take priority over assistant markers
    pub fn classify(&self, line: &str) -> LineClass {
        if self.is_human_marker(line) {
            LineClass::HumanMarker
        } else if self.is_assistant_marker(line) {
            LineClass::AssistantMarker
        } else {
            LineClass::Content
        }
    }

    fn is_human_marker(&self, line: &str) -> bool {
        self.human_said.is_match(line)
            || self.human_colon.as_ref().is_some_and(|re| re.is_match(line))
    }

    fn is_assistant_marker(&self, line: &str) -> bool {
        (self.any_said.is_match(line) && !self.led_by_human_marker(line))
            || self.assistant_colon.as_ref().is_some_and(|re| re.is_match(line))
    }

    /// True when the line opens with the human said-marker as a whole word,
    /// e.g. "You all said:", which is neither speaker
    fn led_by_human_marker(&self, line: &str) -> bool {
        let lowered = line.trim_start().to_lowercase();
        match lowered.strip_prefix(self.human_said_marker.as_str()) {
            Some(rest) => !rest.chars().next().is_some_and(is_word_char),
            None => false,
        }
    }
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

fn build(pattern: &str) -> Result<Regex, regex::Error> {
    RegexBuilder::new(pattern).case_insensitive(true).build()
}

fn build_alias_pattern(aliases: &[String]) -> Result<Option<Regex>, regex::Error> {
    let alternatives: Vec<String> = aliases
        .iter()
        .map(|a| a.trim())
        .filter(|a| !a.is_empty())
        .map(regex::escape)
        .collect();

    if alternatives.is_empty() {
        return Ok(None);
    }

    build(&format!(r"^\s*(?:{})\s*:\s*$", alternatives.join("|"))).map(Some)
}
