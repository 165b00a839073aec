//! Lot statistics computed from a consolidated library.

mod common;

use serde_json::json;

use common::{lots_json, ManifestBuilder, TestHarness};
use teareports::analytics::{extract_lot_records, summarize};
use teareports::config::AnalyticsConfig;

#[test]
fn test_weighted_average_from_consolidated_lots() {
    let harness = TestHarness::new();
    harness.write_batch(
        "kolkata_s37",
        &ManifestBuilder::new().build(),
        &[(
            "JT_auction_lots_stealth_S37.json",
            lots_json(&[
                ("BOP", json!(100), json!(10)),
                ("BOP", json!(200), json!(5)),
                ("PD", json!(0), json!(50)),
            ])
            .as_str(),
        )],
    );

    let (library, _) = harness.consolidate().unwrap();
    let records = extract_lot_records(&library, &AnalyticsConfig::default());
    assert_eq!(records.len(), 3);

    let summary = summarize(&records);
    assert_eq!(summary.overall.total_lots_sold, 2);
    assert_eq!(summary.overall.total_packages_sold, 15);
    assert_eq!(summary.overall.weighted_average_price, 133.33);
    assert_eq!(summary.by_grade.len(), 1);
    assert_eq!(summary.by_grade[0].grade, "BOP");
}

#[test]
fn test_output_files_per_sale() {
    let harness = TestHarness::new();
    harness.write_batch(
        "kolkata_s37",
        &ManifestBuilder::new().build(),
        &[(
            "auction_lots_S37.json",
            lots_json(&[
                ("BOP", json!("1,000"), json!("1,200")),
                ("BP", json!("900"), json!(800)),
                ("BP", json!("withdrawn"), json!(100)),
            ])
            .as_str(),
        )],
    );
    harness.write_batch(
        "kolkata_s38",
        &ManifestBuilder::new().sale_number(38).build(),
        &[(
            "auction_lots_S38.json",
            lots_json(&[("BOP", json!(0), json!(10))]).as_str(),
        )],
    );

    let (library, _) = harness.consolidate().unwrap();
    let report = harness.analyze(&library);

    assert_eq!(report.groups.len(), 2);
    assert_eq!(
        harness.read_json("Data/analysis/Kolkata/CTC Leaf/2025/summary_statistics_S37.json"),
        json!([
            {"metric": "Total Lots Sold", "value": "2"},
            {"metric": "Total Packages Sold", "value": "2,000"},
            {"metric": "Auction Average", "value": "960.00"}
        ])
    );
    assert_eq!(
        harness.read_json("Data/analysis/Kolkata/CTC Leaf/2025/grade_category_statistics_S37.json"),
        json!([
            {"grade": "BOP", "avg_price": 1000.0},
            {"grade": "BP", "avg_price": 900.0}
        ])
    );

    // Sale 38 had no sold lots but still gets zeroed output.
    assert_eq!(
        harness.read_json("Data/analysis/Kolkata/CTC Leaf/2025/summary_statistics_S38.json"),
        json!([
            {"metric": "Total Lots Sold", "value": "0"},
            {"metric": "Total Packages Sold", "value": "0"},
            {"metric": "Auction Average", "value": "0.00"}
        ])
    );
    assert_eq!(
        harness.read_json("Data/analysis/Kolkata/CTC Leaf/2025/grade_category_statistics_S38.json"),
        json!([])
    );
}

#[test]
fn test_library_without_lot_components_yields_no_groups() {
    let harness = TestHarness::new();
    harness.write_batch(
        "colombo",
        &ManifestBuilder::new().location("Colombo").build(),
        &[("synopsis_S37.json", r#""quiet week""#)],
    );

    let (library, _) = harness.consolidate().unwrap();
    let report = harness.analyze(&library);

    assert_eq!(report.records_seen, 0);
    assert!(report.groups.is_empty());
}

#[test]
fn test_same_sale_number_in_two_years_is_reported_separately() {
    let harness = TestHarness::new();
    harness.write_batch(
        "kolkata_s37_2024",
        &ManifestBuilder::new().year(2024).build(),
        &[(
            "auction_lots_S37.json",
            lots_json(&[("BOP", json!(100), json!(10))]).as_str(),
        )],
    );
    harness.write_batch(
        "kolkata_s37_2025",
        &ManifestBuilder::new().build(),
        &[(
            "auction_lots_S37.json",
            lots_json(&[("BOP", json!(300), json!(10))]).as_str(),
        )],
    );

    let (library, _) = harness.consolidate().unwrap();
    let report = harness.analyze(&library);

    assert_eq!(report.groups.len(), 2);
    for (year, average) in [(2024, "100.00"), (2025, "300.00")] {
        assert_eq!(
            harness.read_json(&format!(
                "Data/analysis/Kolkata/CTC Leaf/{}/summary_statistics_S37.json",
                year
            )),
            json!([
                {"metric": "Total Lots Sold", "value": "1"},
                {"metric": "Total Packages Sold", "value": "10"},
                {"metric": "Auction Average", "value": average}
            ])
        );
    }
}
