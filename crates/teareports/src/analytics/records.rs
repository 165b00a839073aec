use serde::Serialize;
use serde_json::{Map, Value};

use crate::config::AnalyticsConfig;
use crate::consolidate::{Library, TitleSale};

/// Grade assigned to lot rows that carry none.
pub const UNGRADED: &str = "Ungraded";

/// One auction line item pulled out of a lot-level library component.
///
/// `price` and `packages` are kept as found; validity is decided when summarising.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LotRecord {
    pub location: String,
    pub report_type: String,
    pub sale_number: String,
    pub year: i64,
    pub grade: String,
    pub price: Value,
    pub packages: Value,
    pub lot_no: Option<String>,
}

impl LotRecord {
    /// `(price, packages)` when both coerce to numbers and the lot was sold.
    pub fn sold_values(&self) -> Option<(f64, f64)> {
        let price = coerce_number(&self.price)?;
        let packages = coerce_number(&self.packages)?;
        (price > 0.0).then_some((price, packages))
    }
}

/// Numeric value of a JSON number or numeric string.
///
/// Strings are trimmed and `,` thousands separators removed. Non-finite values
/// are rejected.
pub fn coerce_number(value: &Value) -> Option<f64> {
    let number = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => {
            let cleaned: String = s.trim().chars().filter(|c| *c != ',').collect();
            if cleaned.is_empty() {
                return None;
            }
            cleaned.parse::<f64>().ok()?
        }
        _ => return None,
    };
    number.is_finite().then_some(number)
}

pub fn is_lot_component(key: &str, config: &AnalyticsConfig) -> bool {
    config
        .lot_component_patterns
        .iter()
        .any(|pattern| key.contains(pattern.as_str()))
}

/// All lot rows in `library`, in library key order.
///
/// Entries whose title carries no sale number are passed over.
pub fn extract_lot_records(library: &Library, config: &AnalyticsConfig) -> Vec<LotRecord> {
    let mut records = Vec::new();

    for (location, title, entry) in library.entries() {
        let Some(sale) = TitleSale::parse(title) else {
            tracing::debug!("No sale number in '{}', skipping", title);
            continue;
        };

        for (key, component) in &entry.data {
            if !is_lot_component(key, config) {
                continue;
            }
            let Value::Array(rows) = component else {
                tracing::warn!(
                    "Lot component '{}' in '{}' is not an array, skipping",
                    key,
                    title
                );
                continue;
            };

            records.extend(
                rows.iter()
                    .filter_map(Value::as_object)
                    .map(|row| lot_record(location, &sale, row, config)),
            );
        }
    }

    records
}

fn lot_record(
    location: &str,
    sale: &TitleSale,
    row: &Map<String, Value>,
    config: &AnalyticsConfig,
) -> LotRecord {
    let price = config
        .price_fields
        .iter()
        .find_map(|field| row.get(field).filter(|v| !v.is_null()))
        .cloned()
        .unwrap_or(Value::Null);

    let grade = row
        .get(&config.grade_field)
        .and_then(scalar_text)
        .filter(|g| !g.is_empty())
        .unwrap_or_else(|| UNGRADED.to_string());

    LotRecord {
        location: location.to_string(),
        report_type: sale.report_type(location).to_string(),
        sale_number: sale.sale_number.clone(),
        year: sale.year,
        grade,
        price,
        packages: row
            .get(&config.packages_field)
            .cloned()
            .unwrap_or(Value::Null),
        lot_no: row.get(&config.lot_no_field).and_then(scalar_text),
    }
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
