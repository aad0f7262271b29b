// 🏗️ Source Parsers - CSV exports → roster / form / meeting rows
//
// Every export has a header row. Only the roster has a fixed layout; the form
// and meeting exports are located by header tokens (see ColumnHints), falling
// back to the usual column positions when no header matches.

use crate::config::ColumnHints;
use anyhow::{bail, Context, Result};
use csv::{ReaderBuilder, StringRecord};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::{debug, warn};

// ============================================================================
// CORE TYPES
// ============================================================================

/// SourceKind - Which export a file comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SourceKind {
    Roster,
    Form,
    Meeting,
}

impl SourceKind {
    /// Human-readable name for display
    pub fn name(&self) -> &str {
        match self {
            SourceKind::Roster => "Official roster",
            SourceKind::Form => "Form responses",
            SourceKind::Meeting => "Meeting participants",
        }
    }

    /// Short code for logs and the manifest
    pub fn code(&self) -> &str {
        match self {
            SourceKind::Roster => "roster",
            SourceKind::Form => "form",
            SourceKind::Meeting => "meeting",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RosterRow {
    pub last_name: String,
    pub first_name: String,
    pub line_number: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormRow {
    pub name: String,
    pub line_number: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeetingRow {
    pub name: String,
    pub duration_text: String,
    pub hours: f64,
    pub line_number: usize,
}

/// SourceParser - One implementation per export kind
pub trait SourceParser {
    type Row;

    /// Which export this parser handles
    fn source_kind(&self) -> SourceKind;

    /// Parse rows from a CSV reader positioned before the header
    fn parse_reader<R: Read>(&self, reader: R, label: &str) -> Result<Vec<Self::Row>>;

    /// Parse a CSV file
    fn parse(&self, file_path: &Path) -> Result<Vec<Self::Row>> {
        let file = File::open(file_path).with_context(|| {
            format!(
                "Failed to open {} file: {}",
                self.source_kind().code(),
                file_path.display()
            )
        })?;

        let label = file_path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("unknown.csv")
            .to_string();

        self.parse_reader(file, &label)
    }

    /// Parse CSV text already in memory
    fn parse_str(&self, data: &str) -> Result<Vec<Self::Row>> {
        self.parse_reader(data.as_bytes(), "<memory>")
    }
}

/// Read header + all records; lines are 1-indexed with the header on line 1
fn read_table<R: Read>(reader: R, label: &str) -> Result<(StringRecord, Vec<(usize, StringRecord)>)> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let headers = reader
        .headers()
        .with_context(|| format!("Failed to read header row in {}", label))?
        .clone();

    if headers.is_empty() {
        bail!("{} has no header row", label);
    }

    let mut records = Vec::new();
    for (index, result) in reader.records().enumerate() {
        let record = result.with_context(|| {
            format!("Failed to parse CSV line {} in {}", index + 2, label)
        })?;
        records.push((index + 2, record));
    }

    Ok((headers, records))
}

fn field(record: &StringRecord, index: usize) -> &str {
    record.get(index).map(str::trim).unwrap_or("")
}

/// `header` must already be lowercase
fn contains_any(header: &str, tokens: &[String]) -> bool {
    tokens.iter().any(|t| header.contains(&t.to_lowercase()))
}

// ============================================================================
// DURATION
// ============================================================================

/// Convert a meeting duration like "4 h 30 min" into hours
///
/// Numbers are paired with the unit that follows them, with or without a space
/// ("4h 30min" works too). Units starting with `h` are hours, units starting
/// with `min` are minutes; anything else is ignored. Missing or malformed parts
/// count as 0.
pub fn parse_duration_hours(text: &str) -> f64 {
    let mut hours = 0.0;
    let mut minutes = 0.0;
    let mut pending: Option<f64> = None;

    for token in text.split_whitespace() {
        let split = token
            .find(|c: char| !(c.is_ascii_digit() || c == '.' || c == ','))
            .unwrap_or(token.len());
        let (number, unit) = token.split_at(split);

        if !number.is_empty() {
            pending = number.replace(',', ".").parse::<f64>().ok();
        }

        if unit.is_empty() {
            continue;
        }

        let unit = unit.to_lowercase();
        let value = pending.take().unwrap_or(0.0);
        if unit.starts_with("min") {
            minutes += value;
        } else if unit.starts_with('h') {
            hours += value;
        }
    }

    hours + minutes / 60.0
}

// ============================================================================
// ROSTER PARSER
// ============================================================================

/// Official roster: column 0 = last names, column 1 = first names
#[derive(Debug, Clone, Default)]
pub struct RosterParser;

impl RosterParser {
    pub fn new() -> Self {
        RosterParser
    }
}

impl SourceParser for RosterParser {
    type Row = RosterRow;

    fn source_kind(&self) -> SourceKind {
        SourceKind::Roster
    }

    fn parse_reader<R: Read>(&self, reader: R, label: &str) -> Result<Vec<RosterRow>> {
        let (_, records) = read_table(reader, label)?;

        let rows: Vec<RosterRow> = records
            .iter()
            .filter(|(_, record)| record.len() >= 2)
            .filter_map(|(line_number, record)| {
                let last_name = field(record, 0);
                let first_name = field(record, 1);
                if last_name.is_empty() && first_name.is_empty() {
                    return None;
                }
                Some(RosterRow {
                    last_name: last_name.to_string(),
                    first_name: first_name.to_string(),
                    line_number: *line_number,
                })
            })
            .collect();

        debug!(file = label, rows = rows.len(), "parsed roster");
        Ok(rows)
    }
}

// ============================================================================
// FORM PARSER
// ============================================================================

/// Form responses: one submitted name per row
#[derive(Debug, Clone, Default)]
pub struct FormParser {
    hints: ColumnHints,
}

impl FormParser {
    pub fn new(hints: ColumnHints) -> Self {
        FormParser { hints }
    }

    /// Index of the column holding the submitted name
    pub fn detect_name_column(&self, headers: &StringRecord) -> usize {
        let detected = headers.iter().position(|header| {
            let header = header.to_uppercase();
            self.hints
                .form_name_tokens
                .iter()
                .any(|token| header.contains(&token.to_uppercase()))
        });

        match detected {
            Some(index) => index,
            None => {
                warn!(
                    fallback = self.hints.form_name_fallback,
                    "no name header found in form export, using fallback column"
                );
                self.hints.form_name_fallback
            }
        }
    }
}

impl SourceParser for FormParser {
    type Row = FormRow;

    fn source_kind(&self) -> SourceKind {
        SourceKind::Form
    }

    fn parse_reader<R: Read>(&self, reader: R, label: &str) -> Result<Vec<FormRow>> {
        let (headers, records) = read_table(reader, label)?;
        let name_col = self.detect_name_column(&headers);

        let rows: Vec<FormRow> = records
            .iter()
            .filter(|(_, record)| record.len() > name_col)
            .filter_map(|(line_number, record)| {
                let name = field(record, name_col);
                if name.is_empty() {
                    return None;
                }
                Some(FormRow {
                    name: name.to_string(),
                    line_number: *line_number,
                })
            })
            .collect();

        debug!(file = label, column = name_col, rows = rows.len(), "parsed form responses");
        Ok(rows)
    }
}

// ============================================================================
// MEETING PARSER
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MeetingColumns {
    pub name_cols: Vec<usize>,
    pub duration_col: usize,
}

impl MeetingColumns {
    /// Records shorter than this are skipped
    pub fn min_len(&self) -> usize {
        self.name_cols
            .iter()
            .copied()
            .chain(std::iter::once(self.duration_col))
            .max()
            .unwrap_or(0)
            + 1
    }
}

/// Meeting participant export: name spread over one or more columns + duration
#[derive(Debug, Clone, Default)]
pub struct MeetingParser {
    hints: ColumnHints,
}

impl MeetingParser {
    pub fn new(hints: ColumnHints) -> Self {
        MeetingParser { hints }
    }

    /// Locate name and duration columns
    ///
    /// A header is claimed by the name role first. When several headers look like
    /// a duration, the last one wins.
    pub fn detect_columns(&self, headers: &StringRecord) -> MeetingColumns {
        let mut name_cols = Vec::new();
        let mut duration_col = None;

        for (i, header) in headers.iter().enumerate() {
            let header = header.to_lowercase();
            if contains_any(&header, &self.hints.meeting_name_tokens) {
                name_cols.push(i);
            } else if contains_any(&header, &self.hints.meeting_duration_tokens) {
                duration_col = Some(i);
            }
        }

        if name_cols.is_empty() {
            warn!(fallback = ?self.hints.meeting_name_fallback, "no name headers found in meeting export");
            name_cols = self.hints.meeting_name_fallback.clone();
        }

        let duration_col = duration_col.unwrap_or_else(|| {
            warn!(
                fallback = self.hints.meeting_duration_fallback,
                "no duration header found in meeting export"
            );
            self.hints.meeting_duration_fallback
        });

        MeetingColumns { name_cols, duration_col }
    }

    /// Monitors and supervisors join the call but are not students
    pub fn is_supervisor(&self, name: &str) -> bool {
        let upper = name.to_uppercase();
        self.hints
            .supervisor_markers
            .iter()
            .any(|marker| upper.starts_with(&marker.to_uppercase()))
    }
}

impl SourceParser for MeetingParser {
    type Row = MeetingRow;

    fn source_kind(&self) -> SourceKind {
        SourceKind::Meeting
    }

    fn parse_reader<R: Read>(&self, reader: R, label: &str) -> Result<Vec<MeetingRow>> {
        let (headers, records) = read_table(reader, label)?;
        let columns = self.detect_columns(&headers);
        let min_len = columns.min_len();

        let mut rows = Vec::new();
        let mut supervisors = 0;

        for (line_number, record) in &records {
            if record.len() < min_len {
                continue;
            }

            let name = columns
                .name_cols
                .iter()
                .map(|&i| field(record, i))
                .filter(|part| !part.is_empty())
                .collect::<Vec<_>>()
                .join(" ");

            if name.is_empty() {
                continue;
            }

            if self.is_supervisor(&name) {
                supervisors += 1;
                continue;
            }

            let duration_text = field(record, columns.duration_col).to_string();
            rows.push(MeetingRow {
                hours: parse_duration_hours(&duration_text),
                name,
                duration_text,
                line_number: *line_number,
            });
        }

        debug!(
            file = label,
            name_cols = ?columns.name_cols,
            duration_col = columns.duration_col,
            rows = rows.len(),
            supervisors,
            "parsed meeting participants"
        );
        Ok(rows)
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_kind_names() {
        assert_eq!(SourceKind::Roster.code(), "roster");
        assert_eq!(SourceKind::Form.code(), "form");
        assert_eq!(SourceKind::Meeting.name(), "Meeting participants");
    }

    #[test]
    fn test_duration_full() {
        assert!((parse_duration_hours("4 h 30 min") - 4.5).abs() < 1e-9);
        assert!((parse_duration_hours("3 h 50 min") - 3.8333).abs() < 1e-3);
    }

    #[test]
    fn test_duration_partial() {
        assert_eq!(parse_duration_hours("2 h"), 2.0);
        assert_eq!(parse_duration_hours("45 min"), 0.75);
        assert_eq!(parse_duration_hours("4h 30min"), 4.5);
    }

    #[test]
    fn test_duration_malformed() {
        assert_eq!(parse_duration_hours(""), 0.0);
        assert_eq!(parse_duration_hours("abc"), 0.0);
        assert_eq!(parse_duration_hours("x h 30 min"), 0.5);
        assert_eq!(parse_duration_hours("4"), 0.0);
    }

    #[test]
    fn test_roster_parser() {
        let csv = "APELLIDOS,NOMBRES\n\
                   GARCIA, ANA \n\
                   ,\n\
                   PEREZ\n\
                   ,LUIS\n";
        let rows = RosterParser::new().parse_str(csv).unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].last_name, "GARCIA");
        assert_eq!(rows[0].first_name, "ANA");
        assert_eq!(rows[0].line_number, 2);
        assert_eq!(rows[1].first_name, "LUIS");
        assert_eq!(rows[1].line_number, 5);
    }

    #[test]
    fn test_empty_file_is_error() {
        assert!(RosterParser::new().parse_str("").is_err());
    }

    #[test]
    fn test_form_detects_name_column() {
        let csv = "Marca temporal,Correo,Apellidos y nombres del postulante\n\
                   2025-05-19,a@x.com,Ana Garcia\n\
                   2025-05-19,b@x.com,  \n\
                   2025-05-19\n\
                   2025-05-19,c@x.com,Luis Perez\n";
        let rows = FormParser::default().parse_str(csv).unwrap();

        let names: Vec<&str> = rows.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["Ana Garcia", "Luis Perez"]);
    }

    #[test]
    fn test_form_first_matching_header_wins() {
        let parser = FormParser::default();
        let headers = StringRecord::from(vec!["Timestamp", "Nombre", "Apellido"]);
        assert_eq!(parser.detect_name_column(&headers), 1);
    }

    #[test]
    fn test_form_fallback_column() {
        let csv = "A,B,C\n1,2,Ana Garcia\n";
        let rows = FormParser::default().parse_str(csv).unwrap();
        assert_eq!(rows[0].name, "Ana Garcia");
    }

    #[test]
    fn test_meeting_detects_columns() {
        let parser = MeetingParser::default();
        let headers = StringRecord::from(vec!["Apellido", "Nombre", "Correo", "Duración"]);
        let columns = parser.detect_columns(&headers);

        assert_eq!(columns.name_cols, vec![0, 1]);
        assert_eq!(columns.duration_col, 3);
        assert_eq!(columns.min_len(), 4);
    }

    #[test]
    fn test_meeting_last_duration_header_wins() {
        let parser = MeetingParser::default();
        let headers = StringRecord::from(vec![
            "Nombre",
            "Apellido",
            "Duración (aprox)",
            "Correo",
            "Duración",
        ]);
        let columns = parser.detect_columns(&headers);

        assert_eq!(columns.name_cols, vec![0, 1]);
        assert_eq!(columns.duration_col, 4);
    }

    #[test]
    fn test_meeting_english_headers() {
        let parser = MeetingParser::default();
        let headers = StringRecord::from(vec!["Duration", "Email", "Full Name"]);
        let columns = parser.detect_columns(&headers);

        assert_eq!(columns.name_cols, vec![2]);
        assert_eq!(columns.duration_col, 0);
    }

    #[test]
    fn test_meeting_parser_rows() {
        let csv = "Apellido,Nombre,Correo,Duración\n\
                   Garcia,Ana,a@x.com,4 h 30 min\n\
                   Monitor,Sala 1,m@x.com,5 h 0 min\n\
                   supervisor general,,s@x.com,5 h\n\
                   ,,x@x.com,1 h\n\
                   Perez,Luis,l@x.com\n\
                   Diaz,,d@x.com,45 min\n";
        let rows = MeetingParser::default().parse_str(csv).unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].name, "Garcia Ana");
        assert_eq!(rows[0].hours, 4.5);
        assert_eq!(rows[0].duration_text, "4 h 30 min");
        assert_eq!(rows[1].name, "Diaz");
        assert_eq!(rows[1].hours, 0.75);
        assert_eq!(rows[1].line_number, 7);
    }

    #[test]
    fn test_supervisor_markers() {
        let parser = MeetingParser::default();
        assert!(parser.is_supervisor("MONITOR 2"));
        assert!(parser.is_supervisor("supervisor Juan"));
        assert!(!parser.is_supervisor("Ana Monitor"));
    }
}
