use std::collections::BTreeMap;

use serde::Serialize;

use super::records::LotRecord;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct SummaryStats {
    pub total_lots_sold: u64,
    pub total_packages_sold: i64,
    /// Volume-weighted average price, rounded to two decimals.
    pub weighted_average_price: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GradeStats {
    pub grade: String,
    pub avg_price: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Summary {
    pub overall: SummaryStats,
    /// Sorted by grade.
    pub by_grade: Vec<GradeStats>,
}

/// One row of the overall statistics file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MetricRow {
    pub metric: String,
    pub value: String,
}

impl SummaryStats {
    pub fn to_metrics(&self) -> Vec<MetricRow> {
        vec![
            MetricRow {
                metric: "Total Lots Sold".to_string(),
                value: group_thousands(&self.total_lots_sold.to_string()),
            },
            MetricRow {
                metric: "Total Packages Sold".to_string(),
                value: group_thousands(&self.total_packages_sold.to_string()),
            },
            MetricRow {
                metric: "Auction Average".to_string(),
                value: format_decimal(self.weighted_average_price),
            },
        ]
    }
}

#[derive(Default)]
struct WeightedSum {
    lots: u64,
    weighted_price: f64,
    packages: f64,
}

impl WeightedSum {
    fn add(&mut self, price: f64, packages: f64) {
        self.lots += 1;
        self.weighted_price += price * packages;
        self.packages += packages;
    }

    fn average(&self) -> f64 {
        if self.packages > 0.0 {
            round2(self.weighted_price / self.packages)
        } else {
            0.0
        }
    }
}

/// Weighted statistics over the sold lots in `records`.
///
/// Lots whose price or package count is not numeric, and lots with a price of
/// zero or less, take no part in any figure.
pub fn summarize(records: &[LotRecord]) -> Summary {
    let mut overall = WeightedSum::default();
    let mut grades: BTreeMap<&str, WeightedSum> = BTreeMap::new();

    for record in records {
        let Some((price, packages)) = record.sold_values() else {
            continue;
        };
        overall.add(price, packages);
        grades
            .entry(record.grade.as_str())
            .or_default()
            .add(price, packages);
    }

    Summary {
        overall: SummaryStats {
            total_lots_sold: overall.lots,
            total_packages_sold: overall.packages.trunc() as i64,
            weighted_average_price: overall.average(),
        },
        by_grade: grades
            .into_iter()
            .map(|(grade, sum)| GradeStats {
                grade: grade.to_string(),
                avg_price: sum.average(),
            })
            .collect(),
    }
}

pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// `1234567.891` -> `"1,234,567.89"`
pub fn format_decimal(value: f64) -> String {
    let fixed = format!("{:.2}", value);
    match fixed.split_once('.') {
        Some((int_part, frac)) => format!("{}.{}", group_thousands(int_part), frac),
        None => group_thousands(&fixed),
    }
}

/// Inserts `,` between groups of three digits in an integer string.
pub fn group_thousands(digits: &str) -> String {
    let (sign, digits) = match digits.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", digits),
    };

    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    format!("{}{}", sign, grouped)
}
