//! State behind the terminal dashboard. Rendering lives in the binary; this
//! module holds selections, loaded tables and the load/persist flow so it can
//! be driven without a terminal.

use std::collections::{HashSet, VecDeque};
use std::ops::RangeInclusive;

use rusqlite::Connection;

use crate::category::Category;
use crate::compare::{ComparisonRow, compare_metric, shared_metrics};
use crate::derived::OVERVIEW_STATS;
use crate::fetch::PageSource;
use crate::normalize::StatTable;
use crate::persist;
use crate::session::{StatsSession, TeamOverview};

pub const SEASONS: RangeInclusive<u16> = 2014..=2024;
const MAX_LOGS: usize = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    CompareTeams,
    CompareYears,
    SingleTeam,
}

impl Mode {
    pub fn from_arg(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "teams" | "two-teams" => Some(Mode::CompareTeams),
            "years" | "across-years" => Some(Mode::CompareYears),
            "single" | "overview" => Some(Mode::SingleTeam),
            _ => None,
        }
    }

    pub fn next(self) -> Self {
        match self {
            Mode::CompareTeams => Mode::CompareYears,
            Mode::CompareYears => Mode::SingleTeam,
            Mode::SingleTeam => Mode::CompareTeams,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Mode::CompareTeams => "Compare Two Teams (Any Year)",
            Mode::CompareYears => "Compare One Team Across Years",
            Mode::SingleTeam => "Single Team Stat Overview",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tab {
    Tables,
    Plot,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TeamSlot {
    Left,
    Right,
}

/// Team name being typed in the dashboard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TeamPrompt {
    pub slot: TeamSlot,
    pub buffer: String,
}

/// How the single-team overview charts the selected stats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverviewView {
    Differential,
    Series,
    Totals,
}

pub fn overview_view(stats: &[String]) -> OverviewView {
    if stats.len() == 1 && stats[0] == "xG" {
        OverviewView::Differential
    } else if matches!(stats.len(), 1 | 2) {
        OverviewView::Series
    } else {
        OverviewView::Totals
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    pub team: String,
    pub year: u16,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchArgs {
    pub mode: Mode,
    pub left: Selection,
    pub right: Selection,
    pub category: Category,
    pub stats: Vec<String>,
    pub no_db: bool,
    pub db_path: Option<String>,
    pub export_path: Option<String>,
}

impl Default for LaunchArgs {
    fn default() -> Self {
        Self {
            mode: Mode::CompareTeams,
            left: Selection {
                team: "Barcelona".to_string(),
                year: *SEASONS.end(),
            },
            right: Selection {
                team: "Real Madrid".to_string(),
                year: *SEASONS.end(),
            },
            category: Category::Situation,
            stats: vec!["xG".to_string()],
            no_db: false,
            db_path: None,
            export_path: None,
        }
    }
}

impl LaunchArgs {
    /// Accepts `--flag value` and `--flag=value`. Unknown or unparsable values keep defaults.
    pub fn parse(args: &[String]) -> Self {
        let mut out = Self::default();
        if let Some(mode) = arg_value(args, "--mode").and_then(|m| Mode::from_arg(&m)) {
            out.mode = mode;
        }
        if let Some(team) = arg_value(args, "--team1") {
            out.left.team = team;
        }
        if let Some(year) = arg_value(args, "--year1").and_then(|y| parse_season(&y)) {
            out.left.year = year;
        }
        if let Some(team) = arg_value(args, "--team2") {
            out.right.team = team;
        }
        if let Some(year) = arg_value(args, "--year2").and_then(|y| parse_season(&y)) {
            out.right.year = year;
        }
        if let Some(category) = arg_value(args, "--category").and_then(|c| Category::from_name(&c)) {
            out.category = category;
        }
        if let Some(raw) = arg_value(args, "--stats") {
            let stats: Vec<String> = raw
                .split(',')
                .map(str::trim)
                .filter(|s| OVERVIEW_STATS.contains(s))
                .map(str::to_string)
                .collect();
            if !stats.is_empty() {
                out.stats = stats;
            }
        }
        out.no_db = args.iter().any(|a| a == "--no-db");
        out.db_path = arg_value(args, "--db");
        out.export_path = arg_value(args, "--export");

        if out.mode == Mode::CompareYears {
            out.right.team = out.left.team.clone();
        }
        out
    }
}

fn arg_value(args: &[String], name: &str) -> Option<String> {
    let prefix = format!("{name}=");
    for (idx, arg) in args.iter().enumerate() {
        if let Some(value) = arg.strip_prefix(&prefix) {
            let trimmed = value.trim();
            if !trimmed.is_empty() {
                return Some(trimmed.to_string());
            }
        }
        if arg == name {
            let Some(next) = args.get(idx + 1) else {
                continue;
            };
            if !next.trim().is_empty() && !next.starts_with("--") {
                return Some(next.trim().to_string());
            }
        }
    }
    None
}

fn parse_season(raw: &str) -> Option<u16> {
    raw.trim().parse::<u16>().ok().filter(|y| SEASONS.contains(y))
}

pub struct DashboardState {
    pub mode: Mode,
    pub tab: Tab,
    pub left: Selection,
    pub right: Selection,
    pub category: Category,
    pub metric_selected: usize,
    pub stats: Vec<String>,
    pub left_table: Option<StatTable>,
    pub right_table: Option<StatTable>,
    pub overview: Option<TeamOverview>,
    pub logs: VecDeque<String>,
    pub help_overlay: bool,
    pub prompt: Option<TeamPrompt>,
    persisted: HashSet<(String, u16, Category)>,
}

impl DashboardState {
    pub fn new(args: &LaunchArgs) -> Self {
        Self {
            mode: args.mode,
            tab: Tab::Tables,
            left: args.left.clone(),
            right: args.right.clone(),
            category: args.category,
            metric_selected: 0,
            stats: args.stats.clone(),
            left_table: None,
            right_table: None,
            overview: None,
            logs: VecDeque::new(),
            help_overlay: false,
            prompt: None,
            persisted: HashSet::new(),
        }
    }

    pub fn push_log(&mut self, msg: impl Into<String>) {
        self.logs.push_back(msg.into());
        while self.logs.len() > MAX_LOGS {
            self.logs.pop_front();
        }
    }

    pub fn toggle_tab(&mut self) {
        self.tab = match self.tab {
            Tab::Tables => Tab::Plot,
            Tab::Plot => Tab::Tables,
        };
    }

    /// Moves to the next dashboard mode. Loaded data is kept until the next refresh.
    pub fn cycle_mode(&mut self) {
        self.mode = self.mode.next();
        self.tab = Tab::Tables;
        self.metric_selected = 0;
        if self.mode == Mode::CompareYears {
            self.right.team = self.left.team.clone();
        }
    }

    /// Opens the team prompt prefilled with the current name. Only comparing
    /// two teams has a separate right-hand team.
    pub fn begin_team_prompt(&mut self, slot: TeamSlot) {
        let slot = if self.mode == Mode::CompareTeams {
            slot
        } else {
            TeamSlot::Left
        };
        let current = match slot {
            TeamSlot::Left => &self.left.team,
            TeamSlot::Right => &self.right.team,
        };
        self.prompt = Some(TeamPrompt {
            slot,
            buffer: current.clone(),
        });
    }

    pub fn prompt_push(&mut self, ch: char) {
        if let Some(prompt) = self.prompt.as_mut() {
            prompt.buffer.push(ch);
        }
    }

    pub fn prompt_backspace(&mut self) {
        if let Some(prompt) = self.prompt.as_mut() {
            prompt.buffer.pop();
        }
    }

    pub fn cancel_prompt(&mut self) {
        self.prompt = None;
    }

    /// Applies the typed name. Returns true when a team changed and data
    /// should be reloaded; a blank name is rejected with a log line.
    pub fn commit_prompt(&mut self) -> bool {
        let Some(prompt) = self.prompt.take() else {
            return false;
        };
        let name = prompt.buffer.trim();
        if name.is_empty() {
            self.push_log("[WARN] Please enter valid teams and years to compare data.");
            return false;
        }
        let target = match prompt.slot {
            TeamSlot::Left => &mut self.left.team,
            TeamSlot::Right => &mut self.right.team,
        };
        if target.as_str() == name {
            return false;
        }
        *target = name.to_string();
        if self.mode == Mode::CompareYears {
            self.right.team = self.left.team.clone();
        }
        self.push_log(format!("[INFO] Team set to {name}"));
        true
    }

    pub fn next_category(&mut self) {
        self.category = self.category.next();
        self.metric_selected = 0;
    }

    pub fn prev_category(&mut self) {
        self.category = self.category.prev();
        self.metric_selected = 0;
    }

    pub fn metrics(&self) -> Vec<String> {
        match (&self.left_table, &self.right_table) {
            (Some(l), Some(r)) => shared_metrics(l, r),
            (Some(t), None) | (None, Some(t)) => t.columns.clone(),
            (None, None) => Vec::new(),
        }
    }

    pub fn selected_metric(&self) -> Option<String> {
        self.metrics().get(self.metric_selected).cloned()
    }

    pub fn next_metric(&mut self) {
        let n = self.metrics().len();
        if n > 0 {
            self.metric_selected = (self.metric_selected + 1) % n;
        }
    }

    pub fn prev_metric(&mut self) {
        let n = self.metrics().len();
        if n > 0 {
            self.metric_selected = (self.metric_selected + n - 1) % n;
        }
    }

    pub fn shift_left_year(&mut self, forward: bool) {
        self.left.year = shift_season(self.left.year, forward);
    }

    pub fn shift_right_year(&mut self, forward: bool) {
        self.right.year = shift_season(self.right.year, forward);
    }

    /// Adds or removes an overview stat. The last selected stat cannot be removed.
    pub fn toggle_stat(&mut self, stat: &str) {
        if !OVERVIEW_STATS.contains(&stat) {
            return;
        }
        if let Some(pos) = self.stats.iter().position(|s| s == stat) {
            if self.stats.len() > 1 {
                self.stats.remove(pos);
            }
        } else {
            self.stats.push(stat.to_string());
        }
    }

    pub fn comparison(&self) -> Vec<ComparisonRow> {
        let (Some(left), Some(right), Some(metric)) =
            (&self.left_table, &self.right_table, self.selected_metric())
        else {
            return Vec::new();
        };
        compare_metric(
            &left.sorted_by_bucket_desc(),
            &right.sorted_by_bucket_desc(),
            &metric,
        )
    }

    pub fn has_comparison_data(&self) -> bool {
        self.left_table.is_some() && self.right_table.is_some()
    }

    /// Loads whatever the current mode shows. Category tables are persisted
    /// the first time each (team, year, category) is loaded in this session.
    pub fn refresh<S: PageSource>(
        &mut self,
        session: &mut StatsSession<S>,
        mut conn: Option<&mut Connection>,
    ) {
        if self.mode == Mode::CompareYears {
            self.right.team = self.left.team.clone();
        }
        match self.mode {
            Mode::CompareTeams | Mode::CompareYears => {
                let left = self.left.clone();
                let right = self.right.clone();
                self.left_table = self.load_table(session, conn.as_deref_mut(), &left);
                self.right_table = self.load_table(session, conn.as_deref_mut(), &right);
                self.overview = None;
                if !self.has_comparison_data() {
                    self.push_log("[WARN] Please enter valid teams and years to compare data.");
                }
                let n = self.metrics().len();
                if self.metric_selected >= n {
                    self.metric_selected = 0;
                }
            }
            Mode::SingleTeam => {
                let team = self.left.team.clone();
                let year = self.left.year;
                self.left_table = None;
                self.right_table = None;
                self.overview = session.team_overview(&team, year).cloned();
                let msg = match &self.overview {
                    Some(o) => format!(
                        "[INFO] Loaded {} matches for {team} {year} ({})",
                        o.history.len(),
                        o.league
                    ),
                    None => format!("[WARN] No overview data for {team} {year}"),
                };
                self.push_log(msg);
            }
        }
    }

    fn load_table<S: PageSource>(
        &mut self,
        session: &mut StatsSession<S>,
        conn: Option<&mut Connection>,
        sel: &Selection,
    ) -> Option<StatTable> {
        let Some(table) = session.category_table(&sel.team, sel.year, self.category) else {
            self.push_log(format!(
                "[WARN] No {} data for {} {}",
                self.category, sel.team, sel.year
            ));
            return None;
        };
        self.push_log(format!(
            "[INFO] {} {} {}: {} rows",
            sel.team,
            sel.year,
            self.category,
            table.rows.len()
        ));

        let key = (sel.team.clone(), sel.year, self.category);
        if let Some(conn) = conn {
            if !self.persisted.contains(&key) {
                match persist::save_table(conn, &table, self.category.label(), &sel.team, sel.year)
                {
                    Ok(report) => {
                        self.persisted.insert(key);
                        if report.conflicts > 0 {
                            self.push_log(format!(
                                "[WARN] {} records were not inserted due to duplicates",
                                report.conflicts
                            ));
                        }
                    }
                    Err(err) => self.push_log(format!("[WARN] Save failed: {err}")),
                }
            }
        }
        Some(table)
    }
}

fn shift_season(year: u16, forward: bool) -> u16 {
    let (lo, hi) = (*SEASONS.start(), *SEASONS.end());
    match (forward, year) {
        (true, y) if y >= hi => lo,
        (true, y) => y + 1,
        (false, y) if y <= lo => hi,
        (false, y) => y - 1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seasons_wrap_both_ways() {
        assert_eq!(shift_season(2024, true), 2014);
        assert_eq!(shift_season(2014, false), 2024);
        assert_eq!(shift_season(2020, true), 2021);
    }

    #[test]
    fn arg_value_handles_both_forms() {
        let args: Vec<String> = ["--team1", "Real Madrid", "--year1=2019", "--db"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(arg_value(&args, "--team1").as_deref(), Some("Real Madrid"));
        assert_eq!(arg_value(&args, "--year1").as_deref(), Some("2019"));
        assert_eq!(arg_value(&args, "--db"), None);
    }
}
