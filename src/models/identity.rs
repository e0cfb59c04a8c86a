use std::fmt;

use serde::{Deserialize, Serialize};

use super::RosterRecord;

/// Identity signals extracted from a transcript
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IdentitySignals {
    /// Email addresses, deduplicated in order of first appearance
    pub emails: Vec<String>,
    /// Inferred personal name, title-cased
    pub name: Option<String>,
}

impl IdentitySignals {
    pub fn new(emails: Vec<String>, name: Option<String>) -> Self {
        Self { emails, name }
    }

    pub fn is_empty(&self) -> bool {
        self.emails.is_empty() && self.name.is_none()
    }

    /// Emails joined the way the link report expects them
    pub fn joined_emails(&self) -> String {
        self.emails.join(";")
    }
}

/// Which strategy produced a match
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchMethod {
    EmailExact,
    EmailUsername,
    NameFuzzy,
    None,
}

impl MatchMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchMethod::EmailExact => "email_exact",
            MatchMethod::EmailUsername => "email_username",
            MatchMethod::NameFuzzy => "name_fuzzy",
            MatchMethod::None => "none",
        }
    }

    /// Report column value: empty when nothing matched
    pub fn report_value(&self) -> &'static str {
        match self {
            MatchMethod::None => "",
            other => other.as_str(),
        }
    }
}

impl fmt::Display for MatchMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of running the matching cascade for one transcript
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
    pub method: MatchMethod,
    pub record: Option<RosterRecord>,
    /// Similarity for fuzzy matches, 1.0 for exact identifier matches
    pub score: Option<f64>,
}

impl MatchResult {
    pub fn none() -> Self {
        Self {
            method: MatchMethod::None,
            record: None,
            score: None,
        }
    }

    pub fn exact(method: MatchMethod, record: RosterRecord) -> Self {
        Self {
            method,
            record: Some(record),
            score: Some(1.0),
        }
    }

    pub fn fuzzy(record: RosterRecord, score: f64) -> Self {
        Self {
            method: MatchMethod::NameFuzzy,
            record: Some(record),
            score: Some(score),
        }
    }

    pub fn is_match(&self) -> bool {
        self.record.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_strings() {
        assert_eq!(MatchMethod::EmailExact.as_str(), "email_exact");
        assert_eq!(MatchMethod::NameFuzzy.to_string(), "name_fuzzy");
        assert_eq!(MatchMethod::None.report_value(), "");
        assert_eq!(
            serde_json::to_string(&MatchMethod::EmailUsername).unwrap(),
            "\"email_username\""
        );
    }

    #[test]
    fn test_joined_emails() {
        let signals = IdentitySignals::new(
            vec!["a@x.com".to_string(), "b@y.org".to_string()],
            None,
        );
        assert_eq!(signals.joined_emails(), "a@x.com;b@y.org");
        assert!(!signals.is_empty());
        assert!(IdentitySignals::default().is_empty());
    }
}
