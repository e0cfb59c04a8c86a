use crate::models::{normalize_email, username_part, IdentitySignals, MatchMethod, MatchResult, Roster};

use super::similarity::ratio;

/// One step of the matching cascade
pub trait MatchStrategy: Send + Sync {
    /// Method reported when this strategy produces the match
    fn method(&self) -> MatchMethod;

    /// Try to match the signals against the roster
    fn attempt(&self, signals: &IdentitySignals, roster: &Roster) -> Option<MatchResult>;
}

/// Normalized transcript email equals a roster email
#[derive(Debug, Clone, Copy, Default)]
pub struct EmailExact;

impl MatchStrategy for EmailExact {
    fn method(&self) -> MatchMethod {
        MatchMethod::EmailExact
    }

    fn attempt(&self, signals: &IdentitySignals, roster: &Roster) -> Option<MatchResult> {
        signals
            .emails
            .iter()
            .find_map(|email| roster.find_by_email(&normalize_email(email)))
            .map(|record| MatchResult::exact(self.method(), record.clone()))
    }
}

/// Email local part equals a roster email's local part (domain ignored)
#[derive(Debug, Clone, Copy, Default)]
pub struct EmailUsername;

impl MatchStrategy for EmailUsername {
    fn method(&self) -> MatchMethod {
        MatchMethod::EmailUsername
    }

    fn attempt(&self, signals: &IdentitySignals, roster: &Roster) -> Option<MatchResult> {
        signals
            .emails
            .iter()
            .map(|email| username_part(email))
            .filter(|user| !user.is_empty())
            .find_map(|user| roster.find_by_username(&user))
            .map(|record| MatchResult::exact(self.method(), record.clone()))
    }
}

/// Closest roster name by sequence similarity, if it clears the threshold
#[derive(Debug, Clone, Copy)]
pub struct NameFuzzy {
    pub threshold: f64,
}

impl NameFuzzy {
    pub fn new(threshold: f64) -> Self {
        Self { threshold }
    }
}

impl MatchStrategy for NameFuzzy {
    fn method(&self) -> MatchMethod {
        MatchMethod::NameFuzzy
    }

    fn attempt(&self, signals: &IdentitySignals, roster: &Roster) -> Option<MatchResult> {
        let candidate = signals.name.as_deref()?.trim().to_lowercase();
        if candidate.is_empty() {
            return None;
        }

        let mut best: Option<(usize, f64)> = None;
        for (index, name) in roster.names().iter().enumerate() {
            if name.is_empty() {
                continue;
            }
            let score = ratio(&candidate, name);
            // Strict comparison keeps the earliest row on ties
            if score >= self.threshold && best.is_none_or(|(_, s)| score > s) {
                best = Some((index, score));
            }
        }

        let (index, score) = best?;
        roster
            .get(index)
            .map(|record| MatchResult::fuzzy(record.clone(), score))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RosterRecord;

    fn roster() -> Roster {
        Roster::new(vec![
            RosterRecord::with_id("Jane Doe", "j.doe@school.edu", "1"),
            RosterRecord::with_id("Anna Berg", "aberg@school.edu", "2"),
            RosterRecord::with_id("Jane Doe", "jane.doe2@school.edu", "3"),
        ])
    }

    fn signals(emails: &[&str], name: Option<&str>) -> IdentitySignals {
        IdentitySignals::new(
            emails.iter().map(|e| e.to_string()).collect(),
            name.map(str::to_string),
        )
    }

    #[test]
    fn test_email_exact_uses_extraction_order() {
        let s = signals(&["nobody@x.com", "ABerg@School.edu", "j.doe@school.edu"], None);
        let result = EmailExact.attempt(&s, &roster()).unwrap();
        assert_eq!(result.method, MatchMethod::EmailExact);
        assert_eq!(result.record.unwrap().id, "2");
    }

    #[test]
    fn test_email_username_ignores_domain() {
        let s = signals(&["aberg@gmail.com"], None);
        assert!(EmailExact.attempt(&s, &roster()).is_none());
        let result = EmailUsername.attempt(&s, &roster()).unwrap();
        assert_eq!(result.method, MatchMethod::EmailUsername);
        assert_eq!(result.record.unwrap().id, "2");
    }

    #[test]
    fn test_fuzzy_threshold_boundary() {
        let s = signals(&[], Some("Anne Bergen"));
        // ratio("anne bergen", "anna berg") == 0.8
        assert!(NameFuzzy::new(0.86).attempt(&s, &roster()).is_none());
        let result = NameFuzzy::new(0.8).attempt(&s, &roster()).unwrap();
        assert_eq!(result.record.unwrap().id, "2");
    }

    #[test]
    fn test_fuzzy_tie_goes_to_first_row() {
        let s = signals(&[], Some("jane doe"));
        let result = NameFuzzy::new(0.86).attempt(&s, &roster()).unwrap();
        assert_eq!(result.record.unwrap().id, "1");
        assert_eq!(result.score, Some(1.0));
    }

    #[test]
    fn test_fuzzy_without_name() {
        let s = signals(&["j.doe@school.edu"], None);
        assert!(NameFuzzy::new(0.0).attempt(&s, &roster()).is_none());
        let s = signals(&[], Some("   "));
        assert!(NameFuzzy::new(0.0).attempt(&s, &roster()).is_none());
    }
}
