//! Batch manifests: the metadata file that turns a directory of raw
//! components into one library entry.

use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::ManifestError;

pub const MANIFEST_FILE: &str = "manifest.json";

static RE_TITLE_SALE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?P<heading>.*?) - Sale (?P<sale>.+) \((?P<year>-?\d+)\)$").unwrap());

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Manifest {
    pub location: String,
    pub report_type: String,
    pub sale_number: String,
    pub year: i64,
    pub week_number: String,
    pub date_range: String,
    pub prompt_date: String,
    pub currency: String,
}

impl Manifest {
    pub fn from_path(path: &Path) -> Result<Self, ManifestError> {
        let content = std::fs::read_to_string(path).map_err(|e| ManifestError::Read {
            path: path.to_path_buf(),
            source: e,
        })?;

        let fields: Map<String, Value> =
            serde_json::from_str(&content).map_err(|e| ManifestError::Malformed {
                path: path.to_path_buf(),
                source: e,
            })?;

        Self::from_fields(&fields)
    }

    /// Validates the required fields. Unknown keys are ignored.
    pub fn from_fields(fields: &Map<String, Value>) -> Result<Self, ManifestError> {
        Ok(Self {
            location: non_empty(text_field(fields, "location")?, "location")?,
            report_type: non_empty(text_field(fields, "report_type")?, "report_type")?,
            sale_number: id_field(fields, "sale_number")?,
            year: year_field(fields)?,
            week_number: id_field(fields, "week_number")?,
            date_range: text_field(fields, "date_range")?,
            prompt_date: text_field(fields, "prompt_date")?,
            currency: text_field(fields, "currency")?,
        })
    }

    /// `"{location} {report_type} - Sale {sale_number} ({year})"`
    pub fn title(&self) -> String {
        format!(
            "{} {} - Sale {} ({})",
            self.location, self.report_type, self.sale_number, self.year
        )
    }

    pub fn description(&self) -> String {
        format!(
            "Week: {} | Dates: {} | Prompt Date: {} | Currency: {}",
            self.week_number, self.date_range, self.prompt_date, self.currency
        )
    }
}

/// Heading, sale number and year recovered from a library title.
///
/// The heading is everything before `" - Sale"`, i.e. `"{location} {report_type}"`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TitleSale {
    pub heading: String,
    pub sale_number: String,
    pub year: i64,
}

impl TitleSale {
    pub fn parse(title: &str) -> Option<Self> {
        let caps = RE_TITLE_SALE.captures(title)?;
        Some(Self {
            heading: caps["heading"].to_string(),
            sale_number: caps["sale"].to_string(),
            year: caps["year"].parse().ok()?,
        })
    }

    /// The report type, given the location the entry is filed under.
    ///
    /// Falls back to the whole heading when it does not start with the location.
    pub fn report_type(&self, location: &str) -> &str {
        self.heading
            .strip_prefix(location)
            .map(str::trim)
            .filter(|rest| !rest.is_empty())
            .unwrap_or(self.heading.as_str())
    }
}

fn required<'a>(fields: &'a Map<String, Value>, field: &'static str) -> Result<&'a Value, ManifestError> {
    match fields.get(field) {
        None | Some(Value::Null) => Err(ManifestError::MissingRequiredField { field }),
        Some(value) => Ok(value),
    }
}

fn text_field(fields: &Map<String, Value>, field: &'static str) -> Result<String, ManifestError> {
    match required(fields, field)? {
        Value::String(s) => Ok(s.trim().to_string()),
        other => Err(ManifestError::InvalidField {
            field,
            reason: format!("expected a string, found {}", other),
        }),
    }
}

/// Fields that may be written either as a string or an integer.
fn id_field(fields: &Map<String, Value>, field: &'static str) -> Result<String, ManifestError> {
    match required(fields, field)? {
        Value::String(s) if !s.trim().is_empty() => Ok(s.trim().to_string()),
        Value::Number(n) if n.is_i64() || n.is_u64() => Ok(n.to_string()),
        other => Err(ManifestError::InvalidField {
            field,
            reason: format!("expected a string or integer, found {}", other),
        }),
    }
}

fn year_field(fields: &Map<String, Value>) -> Result<i64, ManifestError> {
    let field = "year";
    let value = required(fields, field)?;
    let parsed = match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    };
    parsed.ok_or_else(|| ManifestError::InvalidField {
        field,
        reason: format!("expected an integer year, found {}", value),
    })
}

fn non_empty(value: String, field: &'static str) -> Result<String, ManifestError> {
    if value.is_empty() {
        return Err(ManifestError::InvalidField {
            field,
            reason: "must not be empty".to_string(),
        });
    }
    Ok(value)
}
