use chrono::{Duration, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt::Display;

/// Sheet header names, in column order (A through I)
pub const COLUMNS: [&str; 9] = [
    "Date",
    "Title",
    "Platform",
    "Rating",
    "Comment",
    "ReleaseDate",
    "Image",
    "RunningTime",
    "CastCrew",
];

/// Last column letter of the log
pub const LAST_COLUMN: char = 'I';

/// Row 1 holds the header; data starts on row 2
pub const FIRST_DATA_ROW: usize = 2;

const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%Y/%m/%d", "%Y.%m.%d"];

/// Personal rating on a 0.0–5.0 scale in half-point steps
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct Rating(f64);

impl Rating {
    pub const MAX: f64 = 5.0;

    /// Clamps into range and snaps to the nearest half point
    pub fn new(value: f64) -> Option<Self> {
        if !value.is_finite() {
            return None;
        }
        let snapped = (value.clamp(0.0, Self::MAX) * 2.0).round() / 2.0;
        Some(Self(snapped))
    }

    pub fn value(self) -> f64 {
        self.0
    }

    /// Mean of two ratings, snapped back to the half-point grid
    pub fn average(a: Rating, b: Rating) -> Rating {
        Rating(((a.0 + b.0) / 2.0 * 2.0).round() / 2.0)
    }

    /// "⭐" per whole point, plus "½" for a trailing half
    pub fn stars(self) -> String {
        let full = self.0.trunc() as usize;
        let half = self.0 - self.0.trunc() >= 0.5;
        let mut stars = "⭐".repeat(full);
        if half {
            stars.push('½');
        }
        stars
    }
}

impl TryFrom<f64> for Rating {
    type Error = String;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Rating::new(value).ok_or_else(|| format!("invalid rating: {}", value))
    }
}

impl From<Rating> for f64 {
    fn from(rating: Rating) -> Self {
        rating.0
    }
}

impl Display for Rating {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.1}", self.0)
    }
}

/// One logged viewing, one sheet row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaEntry {
    pub watched_on: Option<NaiveDate>,
    pub title: String,
    pub platform: String,
    pub rating: Option<Rating>,
    pub comment: String,
    pub release_date: Option<NaiveDate>,
    pub image_url: String,
    /// Minutes; 0 when unknown
    pub running_time: u32,
    /// Comma-separated cast and crew
    pub cast_crew: String,
}

/// An entry together with the sheet row it was read from
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoredEntry {
    pub row: usize,
    pub entry: MediaEntry,
}

impl MediaEntry {
    /// Creates an entry with only a title and comment set
    pub fn new(title: impl Into<String>, comment: impl Into<String>) -> Self {
        Self {
            watched_on: None,
            title: title.into(),
            platform: String::new(),
            rating: None,
            comment: comment.into(),
            release_date: None,
            image_url: String::new(),
            running_time: 0,
            cast_crew: String::new(),
        }
    }

    /// Cell values in column order
    pub fn to_row(&self) -> Vec<Value> {
        vec![
            Value::String(format_date(self.watched_on)),
            Value::String(self.title.clone()),
            Value::String(self.platform.clone()),
            self.rating
                .map(|r| Value::from(r.value()))
                .unwrap_or_else(|| Value::String(String::new())),
            Value::String(self.comment.clone()),
            Value::String(format_date(self.release_date)),
            Value::String(self.image_url.clone()),
            Value::from(self.running_time),
            Value::String(self.cast_crew.clone()),
        ]
    }

    /// Decodes one sheet row using the header row to locate columns.
    /// Cells the row does not reach, or whose header is missing, default.
    pub fn from_record(header: &[String], cells: &[Value]) -> Self {
        let cell = |name: &str| -> Option<&Value> {
            header
                .iter()
                .position(|h| h.trim() == name)
                .and_then(|idx| cells.get(idx))
        };
        let text = |name: &str| cell(name).map(cell_text).unwrap_or_default();

        Self {
            watched_on: cell("Date").and_then(parse_date_cell),
            title: text("Title").trim().to_string(),
            platform: text("Platform"),
            rating: cell("Rating").and_then(parse_number_cell).and_then(Rating::new),
            comment: text("Comment"),
            release_date: cell("ReleaseDate").and_then(parse_date_cell),
            image_url: text("Image"),
            running_time: cell("RunningTime")
                .and_then(parse_number_cell)
                .filter(|m| *m >= 0.0)
                .map(|m| m.round() as u32)
                .unwrap_or(0),
            cast_crew: text("CastCrew"),
        }
    }

    /// Individual names from the cast/crew column
    pub fn cast_names(&self) -> Vec<String> {
        self.cast_crew
            .split(',')
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(str::to_string)
            .collect()
    }

    /// Whether the image column holds a usable URL
    pub fn has_image(&self) -> bool {
        self.image_url.starts_with("http")
    }
}

/// Title is the log's key; surrounding whitespace is not significant
pub fn same_title(a: &str, b: &str) -> bool {
    a.trim() == b.trim()
}

/// Header row written when the sheet is rewritten
pub fn header_row() -> Vec<Value> {
    COLUMNS.iter().map(|c| Value::String(c.to_string())).collect()
}

/// Worksheet contents exactly as read: the header row and every row below it.
/// Cells are never reinterpreted, so writing a `SheetRows` back is lossless.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SheetRows {
    pub header: Vec<Value>,
    pub rows: Vec<Vec<Value>>,
}

impl SheetRows {
    /// Splits raw API values into header and data rows
    pub fn from_values(values: Vec<Vec<Value>>) -> Self {
        let mut rows = values.into_iter();
        let header = rows.next().unwrap_or_default();
        Self {
            header,
            rows: rows.collect(),
        }
    }

    /// Header followed by the data rows, ready to be written from A1
    pub fn to_values(&self) -> Vec<Vec<Value>> {
        let mut values = Vec::with_capacity(self.rows.len() + 1);
        values.push(self.header.clone());
        values.extend(self.rows.iter().cloned());
        values
    }

    fn header_names(&self) -> Vec<String> {
        self.header.iter().map(cell_text).collect()
    }

    /// Zero-based position of a named column
    pub fn column(&self, name: &str) -> Option<usize> {
        self.header.iter().position(|h| cell_text(h).trim() == name)
    }

    /// Trimmed title of a data row; empty when the row has none
    pub fn title_of(&self, cells: &[Value]) -> String {
        self.column("Title")
            .and_then(|idx| cells.get(idx))
            .map(|cell| cell_text(cell).trim().to_string())
            .unwrap_or_default()
    }

    /// Decodes the titled rows, keeping each one's sheet row number
    pub fn entries(&self) -> Vec<StoredEntry> {
        let header = self.header_names();
        self.rows
            .iter()
            .enumerate()
            .map(|(idx, cells)| StoredEntry {
                row: idx + FIRST_DATA_ROW,
                entry: MediaEntry::from_record(&header, cells),
            })
            .filter(|stored| !stored.entry.title.is_empty())
            .collect()
    }
}

fn format_date(date: Option<NaiveDate>) -> String {
    date.map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_default()
}

fn cell_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => String::new(),
    }
}

fn parse_number_cell(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

/// Accepts ISO-like strings, date-times, and spreadsheet serial numbers
fn parse_date_cell(value: &Value) -> Option<NaiveDate> {
    match value {
        Value::String(s) => parse_date(s),
        Value::Number(n) => n.as_f64().and_then(from_serial),
        _ => None,
    }
}

/// Parses the date formats found in hand-edited sheets
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
        .or_else(|| {
            NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S")
                .ok()
                .map(|dt| dt.date())
        })
}

fn from_serial(serial: f64) -> Option<NaiveDate> {
    if !serial.is_finite() || serial < 1.0 {
        return None;
    }
    NaiveDate::from_ymd_opt(1899, 12, 30)
        .and_then(|epoch| epoch.checked_add_signed(Duration::days(serial.trunc() as i64)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn header() -> Vec<String> {
        COLUMNS.iter().map(|c| c.to_string()).collect()
    }

    #[test]
    fn test_rating_snaps_to_half_points() {
        assert_eq!(Rating::new(3.74).unwrap().value(), 3.5);
        assert_eq!(Rating::new(3.76).unwrap().value(), 4.0);
        assert_eq!(Rating::new(7.0).unwrap().value(), 5.0);
        assert_eq!(Rating::new(-1.0).unwrap().value(), 0.0);
        assert!(Rating::new(f64::NAN).is_none());
    }

    #[test]
    fn test_rating_average() {
        let a = Rating::new(4.5).unwrap();
        let b = Rating::new(3.0).unwrap();
        // 3.75 rounds half away from zero onto the grid
        assert_eq!(Rating::average(a, b).value(), 4.0);
        assert_eq!(Rating::average(a, a).value(), 4.5);
    }

    #[test]
    fn test_star_string() {
        assert_eq!(Rating::new(3.5).unwrap().stars(), "⭐⭐⭐½");
        assert_eq!(Rating::new(5.0).unwrap().stars(), "⭐⭐⭐⭐⭐");
        assert_eq!(Rating::new(0.0).unwrap().stars(), "");
    }

    #[test]
    fn test_rating_deserialize_snaps_to_grid() {
        let rating: Rating = serde_json::from_value(json!(4.2)).unwrap();
        assert_eq!(rating.value(), 4.0);
    }

    #[test]
    fn test_from_record_full_row() {
        let cells = vec![
            json!("2025-01-03"),
            json!("Squid Game 2"),
            json!("Netflix"),
            json!(4.5),
            json!("great"),
            json!("2024-12-26"),
            json!("https://image.tmdb.org/t/p/w500/a.jpg"),
            json!(60),
            json!("Hwang Dong-hyuk (director), Lee Jung-jae"),
        ];
        let entry = MediaEntry::from_record(&header(), &cells);

        assert_eq!(entry.watched_on, NaiveDate::from_ymd_opt(2025, 1, 3));
        assert_eq!(entry.title, "Squid Game 2");
        assert_eq!(entry.rating.unwrap().value(), 4.5);
        assert_eq!(entry.running_time, 60);
        assert!(entry.has_image());
        assert_eq!(
            entry.cast_names(),
            vec!["Hwang Dong-hyuk (director)", "Lee Jung-jae"]
        );
    }

    #[test]
    fn test_from_record_missing_columns_default() {
        let header: Vec<String> = ["Date", "Title", "Platform", "Rating", "Comment"]
            .iter()
            .map(|c| c.to_string())
            .collect();
        let cells = vec![json!("not a date"), json!(" Dune "), json!("Cinema"), json!("n/a")];
        let entry = MediaEntry::from_record(&header, &cells);

        assert_eq!(entry.watched_on, None);
        assert_eq!(entry.title, "Dune");
        assert_eq!(entry.rating, None);
        assert_eq!(entry.comment, "");
        assert_eq!(entry.running_time, 0);
        assert_eq!(entry.cast_crew, "");
    }

    #[test]
    fn test_from_record_string_numbers_and_serial_dates() {
        let cells = vec![
            json!(45658),
            json!("Dune"),
            json!(""),
            json!("3.5"),
            json!(""),
            json!(""),
            json!(""),
            json!("155.4"),
            json!(""),
        ];
        let entry = MediaEntry::from_record(&header(), &cells);

        assert_eq!(entry.watched_on, NaiveDate::from_ymd_opt(2025, 1, 1));
        assert_eq!(entry.rating.unwrap().value(), 3.5);
        assert_eq!(entry.running_time, 155);
    }

    #[test]
    fn test_to_row_matches_column_order() {
        let mut entry = MediaEntry::new("Dune", "sand");
        entry.watched_on = NaiveDate::from_ymd_opt(2025, 2, 1);
        entry.rating = Rating::new(4.0);
        entry.running_time = 155;

        let row = entry.to_row();
        assert_eq!(row.len(), COLUMNS.len());
        assert_eq!(row[0], json!("2025-02-01"));
        assert_eq!(row[1], json!("Dune"));
        assert_eq!(row[3], json!(4.0));
        assert_eq!(row[5], json!(""));
        assert_eq!(row[7], json!(155));

        let decoded = MediaEntry::from_record(&header(), &row);
        assert_eq!(decoded, entry);
    }

    #[test]
    fn test_sheet_rows_split_and_rejoin() {
        let values = vec![
            vec![json!("Date"), json!("Title"), json!("Rating"), json!("Notes")],
            vec![json!("01/03/2025"), json!("Dune"), json!(4.3), json!("extra")],
            vec![],
            vec![json!("2025-01-05"), json!(" Arrival "), json!(5)],
        ];

        let sheet = SheetRows::from_values(values.clone());

        assert_eq!(sheet.rows.len(), 3);
        assert_eq!(sheet.column("Notes"), Some(3));
        assert_eq!(sheet.title_of(&sheet.rows[2]), "Arrival");
        assert_eq!(sheet.title_of(&sheet.rows[1]), "");
        assert_eq!(sheet.to_values(), values);
    }

    #[test]
    fn test_sheet_rows_entries_skip_untitled_but_keep_numbering() {
        let sheet = SheetRows::from_values(vec![
            vec![json!("Date"), json!("Title"), json!("Rating")],
            vec![json!("2025-01-01"), json!("Dune"), json!(4.5)],
            vec![],
            vec![json!("2025-01-05"), json!("Arrival"), json!(5)],
        ]);

        let entries = sheet.entries();

        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].row, 2);
        assert_eq!(entries[1].row, 4);
        assert_eq!(entries[1].entry.rating.unwrap().value(), 5.0);
        assert!(SheetRows::default().entries().is_empty());
    }

    #[test]
    fn test_parse_date_formats() {
        let expected = NaiveDate::from_ymd_opt(2025, 3, 9);
        assert_eq!(parse_date("2025-03-09"), expected);
        assert_eq!(parse_date("2025/03/09"), expected);
        assert_eq!(parse_date("2025-03-09 21:15:00"), expected);
        assert_eq!(parse_date(""), None);
    }
}
