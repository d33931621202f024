//! Movie gallery and record lists loaded from static JSON files.
//!
//! Both files are JSON arrays of flat objects. Movies have a fixed shape;
//! records are free-form and a [`RecordsView`] from the configuration decides
//! which fields become the meta line, the note line and the detail text.

use anyhow::{Context, Result, bail};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::cmp::Ordering;
use std::fs;
use std::path::Path;

use crate::constants::{
    DEFAULT_COUNT_TEMPLATE, DEFAULT_EMPTY_MAIN, DEFAULT_ERROR_MAIN, DEFAULT_FOOTER_TEMPLATE,
    POSTER_FALLBACK, UNKNOWN_TIME, UNTITLED,
};

/// How one records list is labelled and which fields it shows.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct RecordsView {
    pub name: String,
    #[serde(default)]
    pub json_path: String,
    #[serde(default)]
    pub subtitle: String,
    #[serde(default = "default_count_template")]
    pub count_template: String,
    #[serde(default = "default_empty_main")]
    pub empty_main: String,
    #[serde(default)]
    pub empty_sub: String,
    #[serde(default = "default_error_main")]
    pub error_main: String,
    #[serde(default)]
    pub error_sub: String,
    #[serde(default = "default_footer_template")]
    pub footer_template: String,
    #[serde(default)]
    pub show_thumb: bool,
    /// Field shown under the time; `status` shows a badge instead.
    #[serde(default)]
    pub primary_meta: String,
    #[serde(default)]
    pub secondary_meta: String,
    /// Field holding the long-form detail text.
    #[serde(default)]
    pub detail_key: String,
}

fn default_count_template() -> String {
    DEFAULT_COUNT_TEMPLATE.to_string()
}

fn default_empty_main() -> String {
    DEFAULT_EMPTY_MAIN.to_string()
}

fn default_error_main() -> String {
    DEFAULT_ERROR_MAIN.to_string()
}

fn default_footer_template() -> String {
    DEFAULT_FOOTER_TEMPLATE.to_string()
}

impl RecordsView {
    pub fn new(name: &str, json_path: &str) -> Self {
        Self {
            name: name.to_string(),
            json_path: json_path.to_string(),
            subtitle: String::new(),
            count_template: default_count_template(),
            empty_main: default_empty_main(),
            empty_sub: String::new(),
            error_main: default_error_main(),
            error_sub: String::new(),
            footer_template: default_footer_template(),
            show_thumb: false,
            primary_meta: String::new(),
            secondary_meta: String::new(),
            detail_key: String::new(),
        }
    }

    pub fn count_line(&self, count: usize) -> String {
        apply_template(&self.count_template, count)
    }

    pub fn footer_line(&self, count: usize) -> String {
        apply_template(&self.footer_template, count)
    }
}

/// Replace the first `{count}` placeholder.
pub fn apply_template(template: &str, count: usize) -> String {
    template.replacen("{count}", &count.to_string(), 1)
}

/// One entry of the movie gallery.
#[derive(Debug, Default, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Movie {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub alt: Option<String>,
    #[serde(default)]
    pub time: Option<String>,
}

impl Movie {
    pub fn display_title(&self) -> &str {
        non_empty(self.title.as_deref()).unwrap_or(UNTITLED)
    }

    pub fn display_time(&self) -> &str {
        non_empty(self.time.as_deref()).unwrap_or(UNKNOWN_TIME)
    }

    /// Text describing the poster: the alt text, else the title.
    pub fn poster_label(&self) -> &str {
        non_empty(self.alt.as_deref())
            .or_else(|| non_empty(self.title.as_deref()))
            .unwrap_or(POSTER_FALLBACK)
    }
}

/// Progress of a record, from the numeric `status` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Pending,
    InProgress,
    Done,
}

impl Status {
    /// Map 1, 2 or 3 (number or numeric string) to a status.
    pub fn from_value(value: &Value) -> Option<Self> {
        let code = match value {
            Value::Number(n) => n.as_f64()?,
            Value::String(s) => s.trim().parse::<f64>().ok()?,
            _ => return None,
        };

        if code == 1.0 {
            Some(Status::Pending)
        } else if code == 2.0 {
            Some(Status::InProgress)
        } else if code == 3.0 {
            Some(Status::Done)
        } else {
            None
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Status::Pending => "to do",
            Status::InProgress => "in progress",
            Status::Done => "done",
        }
    }
}

/// A free-form record: one flat JSON object.
#[derive(Debug, Default, Deserialize, Clone, PartialEq)]
#[serde(transparent)]
pub struct Record(Map<String, Value>);

impl Record {
    pub fn from_map(map: Map<String, Value>) -> Self {
        Self(map)
    }

    /// Non-empty text form of a field. Empty strings, zero, false and null
    /// count as absent.
    pub fn field(&self, key: &str) -> Option<String> {
        match self.0.get(key)? {
            Value::String(s) if !s.is_empty() => Some(s.clone()),
            Value::Number(n) if n.as_f64() != Some(0.0) => Some(n.to_string()),
            Value::Bool(true) => Some("true".to_string()),
            _ => None,
        }
    }

    pub fn title(&self) -> String {
        self.field("title").unwrap_or_else(|| UNTITLED.to_string())
    }

    pub fn time(&self) -> Option<String> {
        self.field("time")
    }

    pub fn status(&self) -> Option<Status> {
        self.0.get("status").and_then(Status::from_value)
    }

    fn parsed_time(&self) -> Option<NaiveDateTime> {
        self.time().as_deref().and_then(parse_time)
    }
}

/// What a records list shows for one record.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordEntry {
    pub title: String,
    pub time: String,
    pub badge: Option<Status>,
    pub meta: Option<String>,
    pub note: Option<String>,
    pub thumb: Option<String>,
    pub detail: Option<String>,
}

impl RecordEntry {
    pub fn from_record(record: &Record, view: &RecordsView) -> Self {
        let status_primary = view.primary_meta == "status";

        let thumb = if view.show_thumb {
            record.field("imageUrl")
        } else {
            None
        };

        let detail = if view.detail_key.is_empty() {
            None
        } else {
            record.field(&view.detail_key)
        };

        Self {
            title: record.title(),
            time: record.time().unwrap_or_else(|| UNKNOWN_TIME.to_string()),
            badge: if status_primary { record.status() } else { None },
            meta: if status_primary {
                None
            } else {
                meta_value(record, &view.primary_meta)
            },
            note: meta_value(record, &view.secondary_meta),
            thumb,
            detail,
        }
    }
}

/// Meta text for a configured field; `location` gets a label.
pub fn meta_value(record: &Record, key: &str) -> Option<String> {
    if key.is_empty() {
        return None;
    }
    let value = record.field(key)?;
    if key == "location" {
        Some(format!("Location: {}", value))
    } else {
        Some(value)
    }
}

/// Parse the date formats used in the data files.
///
/// Offsets are normalized to UTC; naive forms are taken as written.
pub fn parse_time(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_utc());
    }
    for format in [
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%d %H:%M",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%dT%H:%M",
    ] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, format) {
            return Some(dt);
        }
    }
    for format in ["%Y-%m-%d", "%Y/%m/%d"] {
        if let Ok(date) = NaiveDate::parse_from_str(s, format) {
            return date.and_hms_opt(0, 0, 0);
        }
    }
    None
}

/// Newest first; records without a parseable time go last, in input order.
pub fn sort_by_time_desc(records: &mut [Record]) {
    records.sort_by(|a, b| match (a.parsed_time(), b.parsed_time()) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        (Some(ta), Some(tb)) => tb.cmp(&ta),
    });
}

fn load_json_array<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    if path.as_os_str().is_empty() {
        bail!("json path is missing");
    }

    let content = fs::read_to_string(path)
        .with_context(|| format!("failed to load {}", path.display()))?;
    let value: Value = serde_json::from_str(&content)
        .with_context(|| format!("failed to parse {}", path.display()))?;
    if !value.is_array() {
        bail!("{} must be an array", path.display());
    }

    serde_json::from_value(value).with_context(|| format!("unexpected entry in {}", path.display()))
}

pub fn load_movies(path: &Path) -> Result<Vec<Movie>> {
    load_json_array(path)
}

pub fn load_records(path: &Path) -> Result<Vec<Record>> {
    load_json_array(path)
}

fn non_empty(s: Option<&str>) -> Option<&str> {
    s.filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::tempdir;

    fn record(value: Value) -> Record {
        match value {
            Value::Object(map) => Record::from_map(map),
            _ => panic!("test records must be objects"),
        }
    }

    #[test]
    fn test_apply_template_replaces_first_placeholder() {
        assert_eq!(apply_template("{count} items", 3), "3 items");
        assert_eq!(apply_template("{count}/{count}", 2), "2/{count}");
        assert_eq!(apply_template("no placeholder", 5), "no placeholder");
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(Status::from_value(&json!(1)), Some(Status::Pending));
        assert_eq!(Status::from_value(&json!("2")), Some(Status::InProgress));
        assert_eq!(Status::from_value(&json!(3.0)), Some(Status::Done));
        assert_eq!(Status::from_value(&json!(4)), None);
        assert_eq!(Status::from_value(&json!("done")), None);
        assert_eq!(Status::from_value(&json!(null)), None);
    }

    #[test]
    fn test_meta_value() {
        let r = record(json!({"location": "Hangzhou", "mood": "happy", "empty": ""}));
        assert_eq!(meta_value(&r, "location").as_deref(), Some("Location: Hangzhou"));
        assert_eq!(meta_value(&r, "mood").as_deref(), Some("happy"));
        assert_eq!(meta_value(&r, "empty"), None);
        assert_eq!(meta_value(&r, "missing"), None);
        assert_eq!(meta_value(&r, ""), None);
    }

    #[test]
    fn test_parse_time_formats() {
        let expected = NaiveDate::from_ymd_opt(2025, 12, 5)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        assert_eq!(parse_time("2025-12-05"), Some(expected));
        assert_eq!(parse_time("2025/12/05"), Some(expected));
        assert_eq!(parse_time("2025-12-05T08:00:00+08:00"), Some(expected));
        assert!(parse_time("2025-12-05 18:30").is_some());
        assert!(parse_time("last summer").is_none());
    }

    #[test]
    fn test_sort_by_time_desc_puts_unparseable_last() {
        let mut records = vec![
            record(json!({"title": "a", "time": "2025-01-01"})),
            record(json!({"title": "b", "time": "sometime"})),
            record(json!({"title": "c", "time": "2025-06-01"})),
            record(json!({"title": "d"})),
            record(json!({"title": "e", "time": "2025-03-01 12:00"})),
        ];
        sort_by_time_desc(&mut records);

        let titles: Vec<String> = records.iter().map(Record::title).collect();
        assert_eq!(titles, vec!["c", "e", "a", "b", "d"]);
    }

    #[test]
    fn test_entry_with_status_primary_meta() {
        let mut view = RecordsView::new("todo", "todo.json");
        view.primary_meta = "status".to_string();
        view.secondary_meta = "note".to_string();

        let entry = RecordEntry::from_record(
            &record(json!({"title": "Aquarium", "status": 2, "note": "bring a camera"})),
            &view,
        );
        assert_eq!(entry.badge, Some(Status::InProgress));
        assert_eq!(entry.meta, None);
        assert_eq!(entry.note.as_deref(), Some("bring a camera"));
        assert_eq!(entry.time, UNKNOWN_TIME);
    }

    #[test]
    fn test_entry_thumb_and_detail() {
        let mut view = RecordsView::new("trips", "trips.json");
        view.primary_meta = "location".to_string();
        view.detail_key = "story".to_string();

        let r = record(json!({
            "title": "West Lake",
            "time": "2025-12-01",
            "location": "Hangzhou",
            "imageUrl": "img/lake.jpg",
            "story": "Rain all day"
        }));

        let entry = RecordEntry::from_record(&r, &view);
        assert_eq!(entry.meta.as_deref(), Some("Location: Hangzhou"));
        assert_eq!(entry.thumb, None);
        assert_eq!(entry.detail.as_deref(), Some("Rain all day"));

        view.show_thumb = true;
        view.detail_key.clear();
        let entry = RecordEntry::from_record(&r, &view);
        assert_eq!(entry.thumb.as_deref(), Some("img/lake.jpg"));
        assert_eq!(entry.detail, None);
    }

    #[test]
    fn test_load_records_requires_array() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("records.json");
        fs::write(&path, r#"{"title": "not a list"}"#).unwrap();

        let err = load_records(&path).unwrap_err();
        assert!(err.to_string().contains("must be an array"));
    }

    #[test]
    fn test_load_records_missing_path() {
        let err = load_records(Path::new("")).unwrap_err();
        assert_eq!(err.to_string(), "json path is missing");
    }

    #[test]
    fn test_load_movies() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("movies.json");
        fs::write(
            &path,
            r#"[{"title": "Spirited Away", "imageUrl": "img/sa.jpg", "time": "2025-12-01"},
                {"imageUrl": "img/unknown.jpg"}]"#,
        )
        .unwrap();

        let movies = load_movies(&path).unwrap();
        assert_eq!(movies.len(), 2);
        assert_eq!(movies[0].display_title(), "Spirited Away");
        assert_eq!(movies[0].image_url.as_deref(), Some("img/sa.jpg"));
        assert_eq!(movies[1].display_title(), UNTITLED);
        assert_eq!(movies[1].display_time(), UNKNOWN_TIME);
        assert_eq!(movies[0].poster_label(), "Spirited Away");
        assert_eq!(movies[1].poster_label(), POSTER_FALLBACK);
    }

    #[test]
    fn test_movie_poster_label_prefers_alt() {
        let movie: Movie = serde_json::from_value(json!({
            "title": "Your Name",
            "alt": "Poster of Your Name",
            "imageUrl": "img/yn.jpg"
        }))
        .unwrap();
        assert_eq!(movie.poster_label(), "Poster of Your Name");
        assert_eq!(movie.display_title(), "Your Name");
    }
}
