mod common;

use serde_json::{Value, json};

use understat_terminal::category::Category;
use understat_terminal::decode::{
    LeagueTeams, TeamStatistics, decode_payload, escape_payload, parse_team_fixtures,
    unescape_payload,
};
use understat_terminal::error::StatsError;
use understat_terminal::page::{EmbeddedPayload, PageKind, RawPage};

use common::read_fixture;

#[test]
fn team_page_exposes_script_blocks_in_order() {
    let page = RawPage::parse(read_fixture("team_page.html")).expect("page should parse");
    assert_eq!(page.scripts.len(), 3);
    assert!(page.scripts[0].trim().is_empty());
    assert!(page.scripts[1].contains("datesData"));
    assert!(page.scripts[2].contains("statisticsData"));
}

#[test]
fn team_stats_block_decodes_to_categories() {
    let page = RawPage::parse(read_fixture("team_page.html")).unwrap();
    let record = decode_payload(&page.payload(PageKind::TeamStats).unwrap()).unwrap();
    let stats = TeamStatistics::from_record(record).unwrap();
    assert_eq!(stats.available_categories(), Category::ALL.to_vec());

    let situation = stats.category(Category::Situation).unwrap();
    let keys: Vec<&str> = situation.keys().map(String::as_str).collect();
    assert_eq!(keys, ["OpenPlay", "FromCorner", "SetPiece", "Penalty"]);
}

#[test]
fn team_dates_block_decodes_to_fixtures() {
    let page = RawPage::parse(read_fixture("team_page.html")).unwrap();
    let record = decode_payload(&page.payload(PageKind::TeamFixtures).unwrap()).unwrap();
    let fixtures = parse_team_fixtures(&record).unwrap();
    assert_eq!(fixtures.len(), 4);
    assert_eq!(fixtures[0].home.title, "Barcelona");
    assert_eq!(fixtures[0].home_goals, Some(2));
    assert_eq!(fixtures[1].away_xg, Some(0.5));
    assert_eq!(fixtures[2].away.title, "Atlético Madrid");
    assert!(!fixtures[3].is_result);
    assert_eq!(fixtures[3].home_goals, None);
}

#[test]
fn league_block_decodes_team_histories() {
    let page = RawPage::parse(read_fixture("league_page.html")).unwrap();
    let record = decode_payload(&page.payload(PageKind::LeagueTeams).unwrap()).unwrap();
    let teams = LeagueTeams::from_record(&record).unwrap();
    assert_eq!(teams.teams.len(), 2);
    let barca = teams.by_key("148").expect("barcelona entry");
    assert_eq!(barca.title, "Barcelona");
    assert_eq!(barca.history.len(), 3);
    assert_eq!(teams.by_title("Real Madrid").map(|t| t.id.as_str()), Some("150"));
}

#[test]
fn too_few_blocks_is_malformed_page() {
    let page = RawPage::parse(read_fixture("short_page.html")).unwrap();
    assert_eq!(page.scripts.len(), 2);
    assert!(matches!(
        page.payload(PageKind::TeamStats),
        Err(StatsError::MalformedPage(_))
    ));
    assert!(matches!(
        page.payload(PageKind::LeagueTeams),
        Err(StatsError::MalformedPage(_))
    ));
    let dates = page.payload(PageKind::TeamFixtures).expect("dates block exists");
    assert_eq!(decode_payload(&dates).unwrap().0, json!([]));
}

#[test]
fn page_without_scripts_is_malformed_not_a_panic() {
    let page = RawPage::parse("<html><body><p>maintenance</p></body></html>").unwrap();
    let err = page.payload(PageKind::TeamFixtures).unwrap_err();
    assert!(err.is_no_data());
}

#[test]
fn block_without_delimiters_is_malformed() {
    let page = RawPage::parse(
        "<script></script><script>var x = 1;</script><script>window.ready()</script>",
    )
    .unwrap();
    assert!(matches!(
        page.payload(PageKind::TeamStats),
        Err(StatsError::MalformedPage(_))
    ));
}

#[test]
fn invalid_json_is_decode_error() {
    let payload = EmbeddedPayload(escape_payload("{\"situation\": "));
    assert!(matches!(decode_payload(&payload), Err(StatsError::Decode(_))));

    let payload = EmbeddedPayload("\\x7".to_string());
    assert!(matches!(decode_payload(&payload), Err(StatsError::Decode(_))));
}

#[test]
fn non_object_statistics_are_rejected() {
    let record = decode_payload(&EmbeddedPayload(escape_payload("[1,2]"))).unwrap();
    assert!(matches!(
        TeamStatistics::from_record(record),
        Err(StatsError::Decode(_))
    ));
}

#[test]
fn escape_then_decode_round_trips() {
    let samples = [
        json!({"situation": {"OpenPlay": {"goals": 5, "xG": 4.1, "against": {"goals": 2}}}}),
        json!([{"title": "Atlético Madrid", "note": "it's \"quoted\" \\ and\nnew"}]),
        json!({"unicode": "Ñandú ⚽", "empty": {}, "list": [null, true, -1.5e3]}),
    ];
    for value in samples {
        let text = value.to_string();
        let escaped = escape_payload(&text);
        assert!(!escaped.contains("')"));
        let decoded = decode_payload(&EmbeddedPayload(escaped)).unwrap();
        assert_eq!(decoded.0, value);
    }
}

#[test]
fn unescape_accepts_unicode_escapes() {
    let text = unescape_payload(r#"{"team":"Bayern M\u00FCnchen"}"#).unwrap();
    let v: Value = serde_json::from_str(&text).unwrap();
    assert_eq!(v["team"], "Bayern München");
}
