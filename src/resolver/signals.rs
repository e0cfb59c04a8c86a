use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;

use crate::models::IdentitySignals;

static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[A-Za-z0-9._%+\-]+@[A-Za-z0-9.\-]+\.[A-Za-z]{2,}").unwrap());

/// Self-declaration patterns, tried in order on each trimmed line
static NAME_HINTS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    vec![
        Regex::new(r"(?i)^\s*name\b\s*:?\s*(.+)$").unwrap(),
        Regex::new(r"(?i)^\s*my\s+name\s+is\s+(.+)$").unwrap(),
        Regex::new(r"(?i)^\s*i\s*am\s+(.+)$").unwrap(),
    ]
});

/// Secondary contact label that ends a declared name ("Jane Doe email: ...")
static CONTACT_LABEL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(?:e-?mail|mail)\b\s*:?").unwrap());

/// How many lines above the first email are searched for a bare name
const EMAIL_PROXIMITY_LINES: usize = 3;

const EDGE_TRIM: &[char] = &[' ', ':', '-', '\t'];

/// Extract email addresses and a plausible personal name from transcript text
pub fn extract_signals(text: &str) -> IdentitySignals {
    let emails = extract_emails(text);
    let name = declared_name(text).or_else(|| {
        emails
            .first()
            .and_then(|email| name_near_email(text, email))
    });

    IdentitySignals { emails, name }
}

/// All email-like substrings, deduplicated in order of first appearance
pub fn extract_emails(text: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    EMAIL_RE
        .find_iter(text)
        .map(|m| m.as_str())
        .filter(|e| seen.insert(*e))
        .map(str::to_string)
        .collect()
}

/// First explicit "my name is ..." style declaration that looks like a name
fn declared_name(text: &str) -> Option<String> {
    for line in text.lines() {
        let line = line.trim();
        for pattern in NAME_HINTS.iter() {
            let Some(caps) = pattern.captures(line) else {
                continue;
            };
            let candidate = caps[1].trim_matches(EDGE_TRIM);
            let candidate = CONTACT_LABEL_RE
                .split(candidate)
                .next()
                .unwrap_or_default()
                .trim();
            if looks_like_name(candidate) {
                return Some(clean_name(candidate));
            }
        }
    }
    None
}

/// A bare name on one of the lines just above the first mention of `email`
fn name_near_email(text: &str, email: &str) -> Option<String> {
    let lines: Vec<&str> = text.lines().collect();
    let at = lines.iter().position(|line| line.contains(email))?;
    let from = at.saturating_sub(EMAIL_PROXIMITY_LINES);

    lines[from..at]
        .iter()
        .rev()
        .map(|line| line.trim_matches(EDGE_TRIM))
        .find(|candidate| looks_like_name(candidate))
        .map(clean_name)
}

/// Loose personal-name check: 2-4 words of letters (plus `'` and `-`)
///
/// Sentence punctuation and `@` anywhere reject the candidate, which keeps
/// sentence fragments and emails out.
pub fn looks_like_name(text: &str) -> bool {
    let text = text.trim();
    if text.contains(['.', '!', '?', '@']) {
        return false;
    }

    let tokens: Vec<&str> = text.split_whitespace().collect();
    if !(2..=4).contains(&tokens.len()) {
        return false;
    }

    tokens.iter().all(|token| {
        let mut chars = token.chars();
        chars.next().is_some_and(char::is_alphabetic)
            && chars.all(|c| c.is_alphabetic() || matches!(c, '.' | '\'' | '-'))
    })
}

/// Strip trailing commas/whitespace and capitalize each word
pub fn clean_name(name: &str) -> String {
    name.trim()
        .trim_end_matches(|c: char| c == ',' || c.is_whitespace())
        .split_whitespace()
        .map(capitalize)
        .collect::<Vec<_>>()
        .join(" ")
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_declared_name_truncated_before_email() {
        let text = "hello there\nmy name is Jane Doe\nemail: jane@example.com";
        let signals = extract_signals(text);
        assert_eq!(signals.emails, vec!["jane@example.com"]);
        assert_eq!(signals.name.as_deref(), Some("Jane Doe"));
    }

    #[test]
    fn test_same_line_contact_label() {
        let signals = extract_signals("Name: jane DOE email: jane@example.com");
        assert_eq!(signals.name.as_deref(), Some("Jane Doe"));

        let signals = extract_signals("I am Ismail Khan mail: jk@uni.edu");
        assert_eq!(signals.name.as_deref(), Some("Ismail Khan"));
    }

    #[test]
    fn test_emails_deduplicated_in_order() {
        let text = "b@two.org then a@one.com then b@two.org again";
        assert_eq!(extract_emails(text), vec!["b@two.org", "a@one.com"]);
    }

    #[test]
    fn test_email_requires_tld() {
        assert!(extract_emails("user@localhost and x@y.c").is_empty());
        assert_eq!(extract_emails("mail first.last+tag@dept.school.edu."), vec!["first.last+tag@dept.school.edu"]);
    }

    #[test]
    fn test_sentence_declaration_rejected() {
        // "I am going to ask..." is not a name; no email means no fallback
        let signals = extract_signals("I am going to ask you something.\nI am so very very tired today");
        assert_eq!(signals.name, None);
    }

    #[test]
    fn test_name_near_email_nearest_first() {
        let text = "Mary Major\nsome filler text here ok\nJohn Q Public\n  jqp@example.com";
        let signals = extract_signals(text);
        assert_eq!(signals.name.as_deref(), Some("John Q Public"));
    }

    #[test]
    fn test_name_hint_needs_whole_word() {
        let signals = extract_signals("jane@x.com\nNamely the Big Apple\nNames are Jim Bob");
        assert_eq!(signals.name, None);

        assert_eq!(extract_signals("Name Jane Doe").name.as_deref(), Some("Jane Doe"));
        assert_eq!(extract_signals("name:jane doe").name.as_deref(), Some("Jane Doe"));
    }

    #[test]
    fn test_name_near_email_window_is_three_lines() {
        let text = "Mary Major\none\ntwo\nthree\nmm@example.com";
        assert_eq!(extract_signals(text).name, None);
    }

    #[test]
    fn test_declaration_beats_proximity() {
        let text = "Mary Major\nmm@example.com\nmy name is Anna Berg";
        assert_eq!(extract_signals(text).name.as_deref(), Some("Anna Berg"));
    }

    #[test]
    fn test_looks_like_name() {
        assert!(looks_like_name("Jane Doe"));
        assert!(looks_like_name("Mary-Kate O'Neil"));
        assert!(looks_like_name("Ana Maria de Souza"));
        assert!(!looks_like_name("Jane"));
        assert!(!looks_like_name("One Two Three Four Five"));
        assert!(!looks_like_name("J. Doe"));
        assert!(!looks_like_name("Hello there!"));
        assert!(!looks_like_name("jane doe@x"));
        assert!(!looks_like_name("Agent 47"));
        assert!(!looks_like_name("-Jane Doe"));
    }

    #[test]
    fn test_clean_name() {
        assert_eq!(clean_name("  jANE doe ,  "), "Jane Doe");
        assert_eq!(clean_name("mary-kate o'neil"), "Mary-kate O'neil");
    }

    #[test]
    fn test_empty_text() {
        assert!(extract_signals("").is_empty());
    }
}
