//! Seed data shipped by modules.
//!
//! A module may carry `fixtures/data.json`: a JSON object mapping a model
//! path to the list of objects to create for it.
//!
//! ```json
//! {
//!   "blog.pages.Page": [
//!     { "title": "Welcome", "body": "_file:welcome.html", "created_date": "2024-03-01" }
//!   ]
//! }
//! ```
//!
//! Two value conventions apply while building rows:
//!
//! - a string starting with `_file:` is replaced by the contents of
//!   `fixtures/_files/<name>`;
//! - a field whose key contains `date` is parsed into a UTC timestamp.
//!
//! A model whose table already has rows is skipped, so installing twice is a
//! no-op. All rows of one fixture file go to the store in a single
//! [`DataStore::insert_atomic`] call.

use std::fs;
use std::path::Path;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use indexmap::IndexMap;
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{debug, info};

use crate::error::ModhostError;
use crate::file;
use crate::module::Module;

/// Directory, under a module's root directory, that holds its fixtures.
pub const FIXTURES_DIR: &str = "fixtures";
pub const FIXTURES_FILE: &str = "data.json";
/// Directory, under [`FIXTURES_DIR`], that `_file:` values are read from.
pub const FILES_DIR: &str = "_files";

const FILE_MARKER: &str = "_file:";

/// A field value ready for insertion.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Json(Value),
    /// Contents of a `_file:` reference.
    Text(String),
    DateTime(DateTime<Utc>),
}

impl FieldValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            FieldValue::Json(Value::String(s)) => Some(s),
            _ => None,
        }
    }

    pub fn as_datetime(&self) -> Option<DateTime<Utc>> {
        match self {
            FieldValue::DateTime(dt) => Some(*dt),
            _ => None,
        }
    }
}

/// Field name → value, in fixture order.
pub type Row = IndexMap<String, FieldValue>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct StoreError {
    message: String,
}

impl StoreError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// The relational store fixtures are installed into.
pub trait DataStore {
    /// Whether `model` names a table this store knows.
    fn has_model(&self, model: &str) -> bool;

    /// Number of rows currently in the table of `model`.
    fn count(&self, model: &str) -> Result<usize, StoreError>;

    /// Insert every `(model, row)` pair, or none of them.
    fn insert_atomic(&mut self, rows: Vec<(String, Row)>) -> Result<(), StoreError>;
}

/// An in-memory [`DataStore`] with explicitly declared models.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    tables: IndexMap<String, Vec<Row>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_model(mut self, model: &str) -> Self {
        self.declare(model);
        self
    }

    pub fn declare(&mut self, model: &str) {
        self.tables.entry(model.to_string()).or_default();
    }

    /// Rows of `model`; empty for unknown models.
    pub fn rows(&self, model: &str) -> &[Row] {
        self.tables.get(model).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn models(&self) -> impl Iterator<Item = &str> {
        self.tables.keys().map(String::as_str)
    }
}

impl DataStore for MemoryStore {
    fn has_model(&self, model: &str) -> bool {
        self.tables.contains_key(model)
    }

    fn count(&self, model: &str) -> Result<usize, StoreError> {
        self.tables
            .get(model)
            .map(Vec::len)
            .ok_or_else(|| StoreError::new(format!("no table for model '{model}'")))
    }

    fn insert_atomic(&mut self, rows: Vec<(String, Row)>) -> Result<(), StoreError> {
        if let Some((model, _)) = rows.iter().find(|(model, _)| !self.has_model(model)) {
            return Err(StoreError::new(format!("no table for model '{model}'")));
        }
        for (model, row) in rows {
            self.tables.entry(model).or_default().push(row);
        }
        Ok(())
    }
}

/// Outcome of installing one module's fixtures.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FixtureReport {
    pub module: String,
    /// Models that received rows, with the number of rows, in file order.
    pub installed: Vec<(String, usize)>,
    /// Models skipped because their table already had rows.
    pub skipped: Vec<String>,
}

impl FixtureReport {
    pub fn total_installed(&self) -> usize {
        self.installed.iter().map(|(_, n)| n).sum()
    }
}

type FixtureFile = IndexMap<String, Vec<Map<String, Value>>>;

/// Install the fixtures of `module` into `store`.
pub fn install(module: &Module, store: &mut dyn DataStore) -> Result<FixtureReport, ModhostError> {
    let mut report = FixtureReport {
        module: module.name().to_string(),
        ..Default::default()
    };

    let dir = module.fixtures_dir();
    let Some(content) = file::read_optional(&dir.join(FIXTURES_FILE))? else {
        debug!(module = module.name(), "no fixtures");
        return Ok(report);
    };
    let fixtures: FixtureFile =
        serde_json::from_str(&content).map_err(|source| ModhostError::BadlyFormattedFixture {
            module: module.name().to_string(),
            source,
        })?;

    let mut batch = Vec::new();
    for (model, objects) in fixtures {
        if !store.has_model(&model) {
            return Err(ModhostError::UnknownModel {
                module: module.name().to_string(),
                model,
            });
        }
        if store.count(&model)? > 0 {
            info!(
                module = module.name(),
                %model,
                "skipping the installation of fixtures, table is not empty"
            );
            report.skipped.push(model);
            continue;
        }
        let count = objects.len();
        for object in objects {
            batch.push((model.clone(), build_row(module.name(), &dir, object)?));
        }
        report.installed.push((model, count));
    }

    if !batch.is_empty() {
        store.insert_atomic(batch)?;
    }
    info!(
        module = module.name(),
        rows = report.total_installed(),
        skipped = report.skipped.len(),
        "fixtures installed"
    );
    Ok(report)
}

fn build_row(module: &str, dir: &Path, object: Map<String, Value>) -> Result<Row, ModhostError> {
    object
        .into_iter()
        .map(|(key, value)| -> Result<(String, FieldValue), ModhostError> {
            let value = match value {
                Value::String(s) if s.starts_with(FILE_MARKER) => {
                    FieldValue::Text(read_file_ref(module, &key, dir, &s[FILE_MARKER.len()..])?)
                }
                value if key.contains("date") => date_field(module, &key, value)?,
                value => FieldValue::Json(value),
            };
            Ok((key, value))
        })
        .collect()
}

fn read_file_ref(module: &str, key: &str, dir: &Path, name: &str) -> Result<String, ModhostError> {
    let path = file::join_within(&dir.join(FILES_DIR), name).ok_or_else(|| {
        ModhostError::InvalidFixtureValue {
            module: module.to_string(),
            field: key.to_string(),
            reason: format!("'{name}' is outside {FIXTURES_DIR}/{FILES_DIR}"),
        }
    })?;
    fs::read_to_string(&path).map_err(|source| ModhostError::IoError { path, source })
}

fn date_field(module: &str, key: &str, value: Value) -> Result<FieldValue, ModhostError> {
    let invalid = |reason: String| ModhostError::InvalidFixtureValue {
        module: module.to_string(),
        field: key.to_string(),
        reason,
    };
    match value {
        Value::Null => Ok(FieldValue::Json(Value::Null)),
        Value::String(s) => parse_datetime(&s)
            .map(FieldValue::DateTime)
            .ok_or_else(|| invalid(format!("'{s}' is not a recognizable date"))),
        other => Err(invalid(format!("expected a date string, got {other}"))),
    }
}

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y", "%d %B %Y", "%B %d, %Y"];

/// Parse the date shapes fixtures commonly use. Values without an offset are
/// taken as UTC; date-only values are midnight.
pub fn parse_datetime(input: &str) -> Option<DateTime<Utc>> {
    let input = input.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(input) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(input) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Some(dt) = DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(input, fmt).ok())
    {
        return Some(dt.and_utc());
    }
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(input, fmt).ok())
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};
    use std::fs;
    use tempfile::TempDir;

    const PAGE: &str = "blog.pages.Page";
    const TAG: &str = "blog.pages.Tag";

    fn module_with(data: &str) -> (TempDir, Module) {
        let dir = TempDir::new().unwrap();
        let fixtures = dir.path().join(FIXTURES_DIR);
        fs::create_dir_all(fixtures.join(FILES_DIR)).unwrap();
        fs::write(fixtures.join(FIXTURES_FILE), data).unwrap();
        let module = Module::new("pages", "blog.pages", dir.path());
        (dir, module)
    }

    fn store() -> MemoryStore {
        MemoryStore::new().with_model(PAGE).with_model(TAG)
    }

    #[test]
    fn installs_once_then_skips() {
        let (_dir, module) = module_with(r#"{"blog.pages.Page": [{"title": "a"}, {"title": "b"}]}"#);
        let mut store = store();

        let first = module.install_fixtures(&mut store).unwrap();
        assert_eq!(first.installed, vec![(PAGE.to_string(), 2)]);
        assert_eq!(store.rows(PAGE).len(), 2);

        let second = module.install_fixtures(&mut store).unwrap();
        assert_eq!(second.total_installed(), 0);
        assert_eq!(second.skipped, vec![PAGE.to_string()]);
        assert_eq!(store.rows(PAGE).len(), 2);
    }

    #[test]
    fn file_reference_is_inlined() {
        let (dir, module) = module_with(r#"{"blog.pages.Page": [{"body": "_file:welcome.txt"}]}"#);
        fs::write(
            dir.path().join(FIXTURES_DIR).join(FILES_DIR).join("welcome.txt"),
            "Hello",
        )
        .unwrap();
        let mut store = store();

        module.install_fixtures(&mut store).unwrap();
        assert_eq!(store.rows(PAGE)[0]["body"].as_str(), Some("Hello"));
    }

    #[test]
    fn missing_file_reference_is_io_error() {
        let (_dir, module) = module_with(r#"{"blog.pages.Page": [{"body": "_file:gone.txt"}]}"#);
        let mut store = store();

        let err = module.install_fixtures(&mut store).unwrap_err();
        assert!(matches!(err, ModhostError::IoError { .. }));
        assert!(store.rows(PAGE).is_empty());
    }

    #[test]
    fn file_reference_cannot_leave_files_dir() {
        let (dir, module) = module_with(r#"{"blog.pages.Page": [{"body": "_file:../data.json"}]}"#);
        let mut store = store();

        let err = module.install_fixtures(&mut store).unwrap_err();
        assert!(matches!(&err, ModhostError::InvalidFixtureValue { field, .. } if field == "body"));

        let absolute = dir.path().join("secret.txt");
        fs::write(&absolute, "secret").unwrap();
        fs::write(
            dir.path().join(FIXTURES_DIR).join(FIXTURES_FILE),
            format!(r#"{{"blog.pages.Page": [{{"body": "_file:{}"}}]}}"#, absolute.display()),
        )
        .unwrap();
        let err = module.install_fixtures(&mut store).unwrap_err();
        assert!(matches!(err, ModhostError::InvalidFixtureValue { .. }));
        assert!(store.rows(PAGE).is_empty());
    }

    #[test]
    fn malformed_json_inserts_nothing() {
        let (_dir, module) = module_with(r#"{"blog.pages.Page": [{"title": "a"}"#);
        let mut store = store();

        let err = module.install_fixtures(&mut store).unwrap_err();
        assert!(matches!(&err, ModhostError::BadlyFormattedFixture { module, .. } if module == "pages"));
        assert_eq!(err.to_string(), "Error deserializing fixtures for: pages");
        assert!(store.rows(PAGE).is_empty());
    }

    #[test]
    fn wrong_shape_is_badly_formatted() {
        let (_dir, module) = module_with(r#"{"blog.pages.Page": {"title": "a"}}"#);
        let mut store = store();
        let err = module.install_fixtures(&mut store).unwrap_err();
        assert!(matches!(err, ModhostError::BadlyFormattedFixture { .. }));
    }

    #[test]
    fn no_fixture_file_is_noop() {
        let dir = TempDir::new().unwrap();
        let module = Module::new("pages", "blog.pages", dir.path());
        let mut store = store();

        let report = module.install_fixtures(&mut store).unwrap();
        assert_eq!(report, FixtureReport {
            module: "pages".into(),
            ..Default::default()
        });
    }

    #[test]
    fn unknown_model_fails_before_insert() {
        let (_dir, module) = module_with(
            r#"{"blog.pages.Page": [{"title": "a"}], "blog.pages.Missing": [{"x": 1}]}"#,
        );
        let mut store = store();

        let err = module.install_fixtures(&mut store).unwrap_err();
        assert!(matches!(err, ModhostError::UnknownModel { model, .. } if model == "blog.pages.Missing"));
        assert!(store.rows(PAGE).is_empty());
    }

    #[test]
    fn non_empty_table_skipped_others_installed() {
        let (_dir, module) = module_with(
            r#"{"blog.pages.Page": [{"title": "a"}], "blog.pages.Tag": [{"name": "rust"}]}"#,
        );
        let mut store = store();
        store
            .insert_atomic(vec![(TAG.to_string(), Row::new())])
            .unwrap();

        let report = module.install_fixtures(&mut store).unwrap();
        assert_eq!(report.installed, vec![(PAGE.to_string(), 1)]);
        assert_eq!(report.skipped, vec![TAG.to_string()]);
        assert_eq!(store.rows(TAG).len(), 1);
    }

    #[test]
    fn date_keys_are_parsed() {
        let (_dir, module) = module_with(
            r#"{"blog.pages.Page": [{"created_date": "2024-03-01", "update_date": null, "title": "2024-03-01"}]}"#,
        );
        let mut store = store();
        module.install_fixtures(&mut store).unwrap();

        let row = &store.rows(PAGE)[0];
        let created = row["created_date"].as_datetime().unwrap();
        assert_eq!((created.year(), created.month(), created.day()), (2024, 3, 1));
        assert_eq!(row["update_date"], FieldValue::Json(Value::Null));
        assert_eq!(row["title"].as_str(), Some("2024-03-01"));
    }

    #[test]
    fn unparseable_date_is_invalid_value() {
        let (_dir, module) = module_with(r#"{"blog.pages.Page": [{"pub_date": "someday"}]}"#);
        let mut store = store();
        let err = module.install_fixtures(&mut store).unwrap_err();
        assert!(matches!(err, ModhostError::InvalidFixtureValue { field, .. } if field == "pub_date"));
    }

    #[test]
    fn parses_common_date_shapes() {
        let with_offset = parse_datetime("2024-03-01T10:30:00+02:00").unwrap();
        assert_eq!(with_offset.hour(), 8);

        let naive = parse_datetime("2024-03-01 10:30:15").unwrap();
        assert_eq!((naive.hour(), naive.minute(), naive.second()), (10, 30, 15));

        assert!(parse_datetime("Fri, 01 Mar 2024 10:30:00 +0000").is_some());
        assert!(parse_datetime("2024/03/01").is_some());
        assert!(parse_datetime("03/01/2024").is_some());
        assert!(parse_datetime("1 March 2024").is_some());
        assert!(parse_datetime("March 1, 2024").is_some());
        assert!(parse_datetime("not a date").is_none());
    }

    #[test]
    fn memory_store_insert_is_all_or_nothing() {
        let mut store = store();
        let result = store.insert_atomic(vec![
            (PAGE.to_string(), Row::new()),
            ("nope".to_string(), Row::new()),
        ]);
        assert!(result.is_err());
        assert!(store.rows(PAGE).is_empty());
    }
}
