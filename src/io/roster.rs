use std::path::{Path, PathBuf};

use calamine::{open_workbook_auto, Data, Reader};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::models::{Roster, RosterRecord};

const NAME_ALIASES: &[&str] = &["name", "student_name", "fullname"];
const EMAIL_ALIASES: &[&str] = &["email", "e-mail", "mail"];
const ID_ALIASES: &[&str] = &["studentid", "student_id", "id"];

#[derive(Debug, Error)]
pub enum RosterError {
    #[error("failed to read roster {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse roster CSV: {0}")]
    Csv(#[from] csv::Error),
    #[error("failed to parse roster JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("failed to read roster workbook: {0}")]
    Excel(#[from] calamine::Error),
    #[error("roster JSON must be an array of objects")]
    JsonShape,
    #[error("roster workbook has no sheets")]
    NoSheets,
    #[error("unsupported roster format {0:?} (expected .xlsx, .xls, .csv or .json)")]
    UnsupportedFormat(String),
    #[error("roster has no columns")]
    NoColumns,
}

/// Column positions resolved from the roster header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RosterColumns {
    pub name: usize,
    pub email: Option<usize>,
    pub id: Option<usize>,
}

impl RosterColumns {
    /// Resolve columns by case-insensitive header alias
    ///
    /// The name column falls back to the first column. Email and id are
    /// optional; a missing column yields empty cells.
    pub fn from_headers<S: AsRef<str>>(headers: &[S]) -> Result<Self, RosterError> {
        if headers.is_empty() {
            return Err(RosterError::NoColumns);
        }
        let lowered: Vec<String> = headers
            .iter()
            .map(|h| h.as_ref().trim().to_lowercase())
            .collect();

        Ok(Self {
            name: find_column(&lowered, NAME_ALIASES).unwrap_or(0),
            email: find_column(&lowered, EMAIL_ALIASES),
            id: find_column(&lowered, ID_ALIASES),
        })
    }

    fn record(&self, cells: &[String]) -> RosterRecord {
        let cell = |index: Option<usize>| {
            index
                .and_then(|i| cells.get(i))
                .cloned()
                .unwrap_or_default()
        };
        RosterRecord {
            name: cell(Some(self.name)),
            email: cell(self.email),
            id: cell(self.id),
        }
    }
}

fn find_column(lowered: &[String], aliases: &[&str]) -> Option<usize> {
    aliases
        .iter()
        .find_map(|alias| lowered.iter().position(|h| h == alias))
}

/// Load a roster from an Excel workbook, `.csv` or `.json` file
pub fn load_roster(path: &Path) -> Result<Roster, RosterError> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase)
        .unwrap_or_default();

    let roster = match extension.as_str() {
        "xlsx" | "xlsm" | "xls" | "ods" => load_roster_workbook(path)?,
        "csv" => parse_roster_csv(&read_roster_text(path)?)?,
        "json" => parse_roster_json(&read_roster_text(path)?)?,
        other => return Err(RosterError::UnsupportedFormat(other.to_string())),
    };

    info!("Loaded roster with {} records from {:?}", roster.len(), path);
    let collisions = roster.collisions();
    if collisions.total() > 0 {
        warn!(
            "Roster has {} duplicate emails and {} duplicate names; first row wins",
            collisions.duplicate_emails, collisions.duplicate_names
        );
    }

    Ok(roster)
}

fn read_roster_text(path: &Path) -> Result<String, RosterError> {
    std::fs::read_to_string(path).map_err(|source| RosterError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Read the first sheet of a workbook; its first row is the header
pub fn load_roster_workbook(path: &Path) -> Result<Roster, RosterError> {
    let mut workbook = open_workbook_auto(path)?;
    let range = workbook.worksheet_range_at(0).ok_or(RosterError::NoSheets)??;

    let mut rows = range.rows();
    let Some(header_row) = rows.next() else {
        return Ok(Roster::default());
    };
    let headers: Vec<String> = header_row.iter().map(workbook_cell_text).collect();
    let columns = RosterColumns::from_headers(&headers)?;
    debug!("Roster workbook columns: {:?}", columns);

    let records = rows
        .map(|row| {
            let cells: Vec<String> = row.iter().map(workbook_cell_text).collect();
            columns.record(&cells)
        })
        .collect();

    Ok(Roster::new(records))
}

/// Spreadsheet cell as roster text
///
/// Whole-number floats drop the fraction so numeric ids read as `100`, not
/// `100.0`. Dates, error cells and blanks become empty cells.
fn workbook_cell_text(cell: &Data) -> String {
    match cell {
        Data::String(s) | Data::DateTimeIso(s) | Data::DurationIso(s) => s.clone(),
        Data::Int(i) => i.to_string(),
        Data::Float(f) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", *f as i64),
        Data::Float(f) => f.to_string(),
        Data::Bool(b) => b.to_string(),
        Data::DateTime(_) | Data::Error(_) | Data::Empty => String::new(),
    }
}

/// Parse a CSV roster with a header row
pub fn parse_roster_csv(content: &str) -> Result<Roster, RosterError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::Headers)
        .from_reader(content.as_bytes());

    let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
    let columns = RosterColumns::from_headers(&headers)?;
    debug!("Roster CSV columns: {:?}", columns);

    let mut records = Vec::new();
    for row in reader.records() {
        let row = row?;
        let cells: Vec<String> = row.iter().map(str::to_string).collect();
        records.push(columns.record(&cells));
    }

    Ok(Roster::new(records))
}

/// Parse a JSON roster: an array of objects keyed by column header
///
/// Keys of the first object define the column order. Strings are taken as-is,
/// numbers and booleans are stringified, anything else becomes an empty cell.
pub fn parse_roster_json(content: &str) -> Result<Roster, RosterError> {
    let value: Value = serde_json::from_str(content)?;
    let Value::Array(rows) = value else {
        return Err(RosterError::JsonShape);
    };

    let Some(first) = rows.first() else {
        return Ok(Roster::default());
    };
    let headers: Vec<String> = first
        .as_object()
        .ok_or(RosterError::JsonShape)?
        .keys()
        .cloned()
        .collect();
    let columns = RosterColumns::from_headers(&headers)?;
    debug!("Roster JSON columns: {:?}", columns);

    let mut records = Vec::with_capacity(rows.len());
    for row in &rows {
        let object = row.as_object().ok_or(RosterError::JsonShape)?;
        let cells: Vec<String> = headers
            .iter()
            .map(|h| object.get(h).map(cell_text).unwrap_or_default())
            .collect();
        records.push(columns.record(&cells));
    }

    Ok(Roster::new(records))
}

fn cell_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null | Value::Array(_) | Value::Object(_) => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_aliases() {
        let columns = RosterColumns::from_headers(&["Student_ID", " Full Name", "E-Mail", "FullName"]).unwrap();
        assert_eq!(columns.name, 3);
        assert_eq!(columns.email, Some(2));
        assert_eq!(columns.id, Some(0));
    }

    #[test]
    fn test_name_falls_back_to_first_column() {
        let columns = RosterColumns::from_headers(&["Learner", "Mail"]).unwrap();
        assert_eq!(columns.name, 0);
        assert_eq!(columns.email, Some(1));
        assert_eq!(columns.id, None);
        assert!(matches!(
            RosterColumns::from_headers::<&str>(&[]),
            Err(RosterError::NoColumns)
        ));
    }

    #[test]
    fn test_parse_csv() {
        let csv = "Name,Email,StudentID\nJane Doe,J.Doe@School.edu,100\nSam Lee,slee@school.edu\n";
        let roster = parse_roster_csv(csv).unwrap();
        assert_eq!(roster.len(), 2);
        assert_eq!(roster.records()[0], RosterRecord::with_id("Jane Doe", "J.Doe@School.edu", "100"));
        assert_eq!(roster.records()[1].id, "");
        assert!(roster.find_by_email("j.doe@school.edu").is_some());
    }

    #[test]
    fn test_parse_csv_without_email_column() {
        let roster = parse_roster_csv("student_name,id\nJane Doe,7\n").unwrap();
        assert_eq!(roster.records()[0], RosterRecord::with_id("Jane Doe", "", "7"));
    }

    #[test]
    fn test_parse_json_coerces_cells() {
        let json = r#"[
            {"id": 42, "name": "Jane Doe", "email": "jane@school.edu"},
            {"id": null, "name": ["not", "a", "string"], "email": true}
        ]"#;
        let roster = parse_roster_json(json).unwrap();
        assert_eq!(roster.records()[0], RosterRecord::with_id("Jane Doe", "jane@school.edu", "42"));
        assert_eq!(roster.records()[1], RosterRecord::with_id("", "true", ""));
    }

    #[test]
    fn test_parse_json_shape_errors() {
        assert!(matches!(parse_roster_json(r#"{"name": "x"}"#), Err(RosterError::JsonShape)));
        assert!(matches!(parse_roster_json("[1, 2]"), Err(RosterError::JsonShape)));
        assert!(parse_roster_json("[]").unwrap().is_empty());
    }

    #[test]
    fn test_load_roster_by_extension() {
        let dir = tempfile::tempdir().unwrap();
        let csv_path = dir.path().join("roster.CSV");
        std::fs::write(&csv_path, "name,email\nJane Doe,jane@school.edu\n").unwrap();
        assert_eq!(load_roster(&csv_path).unwrap().len(), 1);

        let odt_path = dir.path().join("roster.odt");
        std::fs::write(&odt_path, b"PK\x03\x04\xff").unwrap();
        assert!(matches!(
            load_roster(&odt_path),
            Err(RosterError::UnsupportedFormat(ext)) if ext == "odt"
        ));

        assert!(matches!(
            load_roster(&dir.path().join("missing.csv")),
            Err(RosterError::Io { .. })
        ));
    }

    #[test]
    fn test_load_roster_xlsx() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/roster.xlsx");
        let roster = load_roster(&path).unwrap();

        assert_eq!(roster.len(), 2);
        assert_eq!(roster.records()[0], RosterRecord::with_id("Jane Doe", "j.doe@school.edu", "100"));
        assert_eq!(roster.records()[1].id, "200.5");
        assert_eq!(roster.find_by_username("slee").unwrap().name, "Sam Lee");
    }

    #[test]
    fn test_corrupt_workbook_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("master.xlsx");
        std::fs::write(&path, b"not a zip archive").unwrap();
        assert!(matches!(load_roster(&path), Err(RosterError::Excel(_))));
    }

    #[test]
    fn test_workbook_cell_text() {
        assert_eq!(workbook_cell_text(&Data::Float(12345.0)), "12345");
        assert_eq!(workbook_cell_text(&Data::Float(1.5)), "1.5");
        assert_eq!(workbook_cell_text(&Data::Int(7)), "7");
        assert_eq!(workbook_cell_text(&Data::String("Jane".into())), "Jane");
        assert_eq!(workbook_cell_text(&Data::Empty), "");
    }
}
