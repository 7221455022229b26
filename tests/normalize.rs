mod common;

use serde_json::{Map, Value, json};

use understat_terminal::category::Category;
use understat_terminal::decode::{TeamStatistics, decode_payload};
use understat_terminal::normalize::normalize_category;
use understat_terminal::page::{PageKind, RawPage};

use common::read_fixture;

fn section(value: Value) -> Map<String, Value> {
    value.as_object().cloned().expect("section should be an object")
}

fn fixture_stats() -> TeamStatistics {
    let page = RawPage::parse(read_fixture("team_page.html")).unwrap();
    let record = decode_payload(&page.payload(PageKind::TeamStats).unwrap()).unwrap();
    TeamStatistics::from_record(record).unwrap()
}

#[test]
fn open_play_scenario() {
    let situation = section(json!({
        "OpenPlay": {"goals": 5, "xG": 4.1, "against": {"goals": 2, "xG": 1.9}}
    }));
    let table = normalize_category(Category::Situation, &situation);

    assert_eq!(table.columns, ["goals", "xG", "goalsA", "xGA"]);
    assert_eq!(table.rows.len(), 1);
    assert_eq!(table.rows[0].bucket, "OpenPlay");
    assert_eq!(
        table.rows[0].values,
        vec![Some(5.0), Some(4.1), Some(2.0), Some(1.9)]
    );
}

#[test]
fn label_fields_are_not_metrics() {
    let stats = fixture_stats();
    let table = normalize_category(
        Category::Formation,
        stats.category(Category::Formation).unwrap(),
    );
    assert_eq!(
        table.columns,
        ["shots", "goals", "xG", "shotsA", "goalsA", "xGA"]
    );
    assert_eq!(table.value("4-3-3", "shots"), Some(280.0));
    assert_eq!(table.value("4-2-3-1", "xGA"), Some(6.3));
}

#[test]
fn rows_keep_source_order() {
    let stats = fixture_stats();
    let table = normalize_category(
        Category::Situation,
        stats.category(Category::Situation).unwrap(),
    );
    let buckets: Vec<&str> = table.rows.iter().map(|r| r.bucket.as_str()).collect();
    assert_eq!(buckets, ["OpenPlay", "FromCorner", "SetPiece", "Penalty"]);

    let sorted = table.sorted_by_bucket_desc();
    let buckets: Vec<&str> = sorted.rows.iter().map(|r| r.bucket.as_str()).collect();
    assert_eq!(buckets, ["SetPiece", "Penalty", "OpenPlay", "FromCorner"]);
}

#[test]
fn missing_against_leaves_empty_cells() {
    let stats = fixture_stats();
    let table = normalize_category(
        Category::AttackSpeed,
        stats.category(Category::AttackSpeed).unwrap(),
    );
    assert_eq!(table.columns.len(), 6);
    let fast = table.row("Fast").expect("fast bucket");
    assert_eq!(fast.values[..3], [Some(40.0), Some(9.0), Some(7.2)]);
    assert_eq!(fast.values[3..], [None::<f64>; 3]);
    assert_eq!(table.value("Normal", "goalsA"), Some(15.0));
}

#[test]
fn no_against_anywhere_means_no_against_columns() {
    let raw = section(json!({
        "Normal": {"shots": 10, "goals": 1},
        "Fast": {"shots": 4, "goals": 2, "xG": 0.9}
    }));
    let table = normalize_category(Category::AttackSpeed, &raw);
    assert_eq!(table.columns, ["shots", "goals", "xG"]);
    assert_eq!(table.value("Normal", "xG"), None);
    assert_eq!(table.value("Fast", "xG"), Some(0.9));
}

#[test]
fn numeric_strings_are_coerced() {
    let stats = fixture_stats();
    let table = normalize_category(Category::Result, stats.category(Category::Result).unwrap());
    assert_eq!(table.value("Win", "shots"), Some(5.0));
    assert_eq!(table.value("Win", "xG"), Some(1.8));
    assert_eq!(table.value("Win", "xGA"), Some(0.4));
}

#[test]
fn column_count_matches_metrics_present() {
    let stats = fixture_stats();
    for category in Category::ALL {
        let raw = stats.category(category).unwrap();
        let mut for_metrics = Vec::new();
        let mut against_metrics = Vec::new();
        for record in raw.values() {
            let record = record.as_object().unwrap();
            for key in record.keys() {
                if !["stat", "time", "against"].contains(&key.as_str()) && !for_metrics.contains(key) {
                    for_metrics.push(key.clone());
                }
            }
            if let Some(against) = record.get("against").and_then(Value::as_object) {
                for key in against.keys() {
                    if !against_metrics.contains(key) {
                        against_metrics.push(key.clone());
                    }
                }
            }
        }
        let table = normalize_category(category, raw);
        assert_eq!(
            table.columns.len(),
            for_metrics.len() + against_metrics.len(),
            "{category}"
        );
        assert!(table.rows.iter().all(|r| r.values.len() == table.columns.len()));
    }
}

#[test]
fn empty_section_gives_empty_table() {
    let table = normalize_category(Category::Timing, &Map::new());
    assert!(table.is_empty());
    assert!(table.columns.is_empty());
}
