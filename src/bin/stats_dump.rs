use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};

use understat_terminal::config::AppConfig;
use understat_terminal::dashboard::{DashboardState, LaunchArgs, Mode};
use understat_terminal::derived::partition_differentials;
use understat_terminal::export::export_tables;
use understat_terminal::fetch::HttpPageSource;
use understat_terminal::league::LeagueDirectory;
use understat_terminal::normalize::StatTable;
use understat_terminal::session::StatsSession;
use understat_terminal::{logging, persist};

fn main() -> Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");
    logging::init_stderr();

    let config = AppConfig::from_env();
    let args = std::env::args().skip(1).collect::<Vec<_>>();
    let launch = LaunchArgs::parse(&args);

    let leagues = match config.leagues_file.as_deref() {
        Some(path) => LeagueDirectory::with_overrides(path)?,
        None => LeagueDirectory::builtin(),
    };
    let source = HttpPageSource::new(&config)?;
    let mut session = StatsSession::new(source, config.base_url.clone(), leagues);

    let mut conn = if launch.no_db {
        None
    } else {
        let path = launch
            .db_path
            .as_deref()
            .map(PathBuf::from)
            .or_else(|| config.db_path.clone())
            .context("unable to resolve sqlite path")?;
        Some(persist::open_db(&path)?)
    };

    let mut state = DashboardState::new(&launch);
    state.refresh(&mut session, conn.as_mut());

    match state.mode {
        Mode::CompareTeams | Mode::CompareYears => {
            if !state.has_comparison_data() {
                for line in &state.logs {
                    println!("{line}");
                }
                return Err(anyhow!("no data to compare"));
            }
            let sides = [
                (&state.left_table, &state.left),
                (&state.right_table, &state.right),
            ];
            for (table, sel) in sides {
                if let Some(table) = table {
                    println!("### {} {} - {} Data", sel.team, sel.year, state.category);
                    print_table(&table.sorted_by_bucket_desc());
                    println!();
                }
            }
            if let Some(metric) = state.selected_metric() {
                println!("### {} - {} Comparison", state.category, metric);
                for row in state.comparison() {
                    println!(
                        "{:<16} {:>10} {:>10}",
                        row.bucket,
                        fmt_cell(row.left),
                        fmt_cell(row.right)
                    );
                }
            }
        }
        Mode::SingleTeam => {
            let Some(overview) = &state.overview else {
                return Err(anyhow!(
                    "no overview data for {} {}",
                    state.left.team,
                    state.left.year
                ));
            };
            let (positive, negative) = partition_differentials(&overview.differentials);
            println!(
                "### {} {} Season xG Differential ({} positive, {} negative)",
                overview.team,
                overview.year,
                positive.len(),
                negative.len()
            );
            for d in &overview.differentials {
                println!(
                    "{:>2} {:<24} {:>5.2} {:>5.2} {:+.2}",
                    d.match_index,
                    overview.opponent(d.match_index).unwrap_or("?"),
                    d.xg,
                    d.xga,
                    d.diff
                );
            }
        }
    }

    if let Some(path) = launch.export_path.as_deref() {
        let mut sheets: Vec<(String, &StatTable)> = Vec::new();
        for (table, sel) in [(&state.left_table, &state.left), (&state.right_table, &state.right)] {
            if let Some(table) = table {
                sheets.push((format!("{} {} {}", sel.team, sel.year, state.category), table));
            }
        }
        let report = export_tables(&PathBuf::from(path), &sheets)?;
        println!("Exported {} sheets ({} rows) to {path}", report.sheets, report.rows);
    }

    Ok(())
}

fn print_table(table: &StatTable) {
    print!("{:<16}", table.category.label());
    for c in &table.columns {
        print!(" {c:>9}");
    }
    println!();
    for row in &table.rows {
        print!("{:<16}", row.bucket);
        for v in &row.values {
            print!(" {:>9}", fmt_cell(*v));
        }
        println!();
    }
}

fn fmt_cell(v: Option<f64>) -> String {
    v.map(|v| format!("{v:.2}")).unwrap_or_else(|| "-".to_string())
}
