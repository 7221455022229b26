use std::fs;
use std::path::PathBuf;

use criterion::{Criterion, criterion_group, criterion_main};
use std::hint::black_box;

use understat_terminal::category::Category;
use understat_terminal::decode::{LeagueTeams, TeamStatistics, decode_payload};
use understat_terminal::derived::xg_differentials;
use understat_terminal::normalize::normalize_category;
use understat_terminal::page::{PageKind, RawPage};

fn fixture(name: &str) -> String {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests");
    path.push("fixtures");
    path.push(name);
    fs::read_to_string(path).expect("fixture file should be readable")
}

fn bench_page_extract(c: &mut Criterion) {
    let markup = fixture("team_page.html");
    c.bench_function("team_page_extract_decode", |b| {
        b.iter(|| {
            let page = RawPage::parse(black_box(markup.as_str())).unwrap();
            let record = decode_payload(&page.payload(PageKind::TeamStats).unwrap()).unwrap();
            black_box(record);
        })
    });
}

fn bench_normalize_all(c: &mut Criterion) {
    let page = RawPage::parse(fixture("team_page.html")).unwrap();
    let record = decode_payload(&page.payload(PageKind::TeamStats).unwrap()).unwrap();
    let stats = TeamStatistics::from_record(record).unwrap();

    c.bench_function("normalize_all_categories", |b| {
        b.iter(|| {
            for category in Category::ALL {
                if let Some(section) = stats.category(category) {
                    let table = normalize_category(category, black_box(section));
                    black_box(table.sorted_by_bucket_desc());
                }
            }
        })
    });
}

fn bench_league_differentials(c: &mut Criterion) {
    let page = RawPage::parse(fixture("league_page.html")).unwrap();
    let record = decode_payload(&page.payload(PageKind::LeagueTeams).unwrap()).unwrap();

    c.bench_function("league_decode_differentials", |b| {
        b.iter(|| {
            let teams = LeagueTeams::from_record(black_box(&record)).unwrap();
            for (_, team) in &teams.teams {
                black_box(xg_differentials(&team.history).unwrap());
            }
        })
    });
}

criterion_group!(
    benches,
    bench_page_extract,
    bench_normalize_all,
    bench_league_differentials
);
criterion_main!(benches);
