use std::collections::HashSet;

use serde::{Deserialize, Serialize};

/// One row of the external identity roster
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RosterRecord {
    pub name: String,
    pub email: String,
    /// Student or account id; empty when the roster has no id column
    #[serde(default)]
    pub id: String,
}

impl RosterRecord {
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            id: String::new(),
        }
    }

    pub fn with_id(name: impl Into<String>, email: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            id: id.into(),
        }
    }
}

/// Trimmed, lower-cased email
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Local part of a normalized email (the whole value when there is no '@')
pub fn username_part(email: &str) -> String {
    let normalized = normalize_email(email);
    match normalized.split_once('@') {
        Some((local, _)) => local.to_string(),
        None => normalized,
    }
}

/// Counts of rows whose normalized key repeats an earlier row
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RosterCollisions {
    pub duplicate_emails: usize,
    pub duplicate_names: usize,
}

impl RosterCollisions {
    pub fn total(&self) -> usize {
        self.duplicate_emails + self.duplicate_names
    }
}

/// Roster snapshot with normalized lookup columns
///
/// The normalized views are computed once here and never change, so a
/// `Roster` can be shared across threads behind an `Arc` without locking.
#[derive(Debug, Clone, Default)]
pub struct Roster {
    records: Vec<RosterRecord>,
    name_norm: Vec<String>,
    email_norm: Vec<String>,
    user_norm: Vec<String>,
    collisions: RosterCollisions,
}

impl Roster {
    pub fn new(records: Vec<RosterRecord>) -> Self {
        let name_norm: Vec<String> = records.iter().map(|r| r.name.trim().to_lowercase()).collect();
        let email_norm: Vec<String> = records.iter().map(|r| normalize_email(&r.email)).collect();
        let user_norm: Vec<String> = email_norm
            .iter()
            .map(|e| e.split('@').next().unwrap_or_default().to_string())
            .collect();

        let collisions = RosterCollisions {
            duplicate_emails: count_duplicates(&email_norm),
            duplicate_names: count_duplicates(&name_norm),
        };

        Self {
            records,
            name_norm,
            email_norm,
            user_norm,
            collisions,
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[RosterRecord] {
        &self.records
    }

    pub fn get(&self, index: usize) -> Option<&RosterRecord> {
        self.records.get(index)
    }

    /// Normalized names in row order
    pub fn names(&self) -> &[String] {
        &self.name_norm
    }

    /// First row whose normalized email equals `email_norm`
    pub fn find_by_email(&self, email_norm: &str) -> Option<&RosterRecord> {
        first_equal(&self.email_norm, email_norm).map(|i| &self.records[i])
    }

    /// First row whose email local part equals `user_norm`
    pub fn find_by_username(&self, user_norm: &str) -> Option<&RosterRecord> {
        first_equal(&self.user_norm, user_norm).map(|i| &self.records[i])
    }

    pub fn collisions(&self) -> RosterCollisions {
        self.collisions
    }
}

fn first_equal(column: &[String], key: &str) -> Option<usize> {
    if key.is_empty() {
        return None;
    }
    column.iter().position(|v| v == key)
}

/// Non-empty values seen more than once (every repeat counts)
fn count_duplicates(column: &[String]) -> usize {
    let mut seen = HashSet::new();
    column
        .iter()
        .filter(|v| !v.is_empty())
        .filter(|v| !seen.insert(v.as_str()))
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Roster {
        Roster::new(vec![
            RosterRecord::with_id("Jane Doe", " J.Doe@School.edu ", "S1"),
            RosterRecord::with_id("John Roe", "jroe@school.edu", "S2"),
            RosterRecord::with_id("jane doe", "j.doe@school.edu", "S3"),
        ])
    }

    #[test]
    fn test_normalize_email() {
        assert_eq!(normalize_email("  Jane@Example.COM "), "jane@example.com");
        assert_eq!(username_part("Jane.Doe@Example.com"), "jane.doe");
        assert_eq!(username_part("no-at-sign"), "no-at-sign");
    }

    #[test]
    fn test_lookup_first_row_wins() {
        let roster = sample();
        let hit = roster.find_by_email("j.doe@school.edu").unwrap();
        assert_eq!(hit.id, "S1");
        let hit = roster.find_by_username("jroe").unwrap();
        assert_eq!(hit.id, "S2");
        assert!(roster.find_by_email("").is_none());
    }

    #[test]
    fn test_collisions_counted() {
        let roster = sample();
        let collisions = roster.collisions();
        assert_eq!(collisions.duplicate_emails, 1);
        assert_eq!(collisions.duplicate_names, 1);
        assert_eq!(collisions.total(), 2);
    }

    #[test]
    fn test_empty_cells_never_match() {
        let roster = Roster::new(vec![RosterRecord::new("No Email", "")]);
        assert!(roster.find_by_username("").is_none());
        assert_eq!(roster.collisions().duplicate_emails, 0);
    }
}
