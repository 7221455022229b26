use std::collections::HashMap;

use serde_json::{Map, Value};
use tracing::{info, warn};

use crate::category::Category;
use crate::decode::{self, LeagueTeams, TeamFixture, TeamStatistics};
use crate::derived::{self, MatchDifferential};
use crate::error::{Result, StatsError};
use crate::fetch::{PageSource, league_url, team_url};
use crate::league::LeagueDirectory;
use crate::normalize::{StatTable, normalize_category};
use crate::page::{PageKind, RawPage};

type TeamYear = (String, u16);

/// Everything the single-team overview needs for one season.
#[derive(Debug, Clone)]
pub struct TeamOverview {
    pub team: String,
    pub year: u16,
    pub league: String,
    pub team_key: String,
    pub opponents: Vec<String>,
    pub history: Vec<Map<String, Value>>,
    pub differentials: Vec<MatchDifferential>,
}

impl TeamOverview {
    /// Opponent for a 1-based match index, if the fixture list has one.
    pub fn opponent(&self, match_index: usize) -> Option<&str> {
        self.opponents
            .get(match_index.checked_sub(1)?)
            .map(String::as_str)
    }
}

/// One interactive session: a page source plus decoded data cached by (team, year).
pub struct StatsSession<S: PageSource> {
    source: S,
    base_url: String,
    leagues: LeagueDirectory,
    stats_cache: HashMap<TeamYear, TeamStatistics>,
    overview_cache: HashMap<TeamYear, TeamOverview>,
}

impl<S: PageSource> StatsSession<S> {
    pub fn new(source: S, base_url: impl Into<String>, leagues: LeagueDirectory) -> Self {
        Self {
            source,
            base_url: base_url.into(),
            leagues,
            stats_cache: HashMap::new(),
            overview_cache: HashMap::new(),
        }
    }

    pub fn cached_teams(&self) -> usize {
        self.stats_cache.len()
    }

    /// Season statistics, or `None` when the page could not be fetched or read.
    pub fn team_statistics(&mut self, team: &str, year: u16) -> Option<&TeamStatistics> {
        match self.try_team_statistics(team, year) {
            Ok(stats) => Some(stats),
            Err(err) => {
                warn!(team, year, error = %err, "failed to load team statistics");
                None
            }
        }
    }

    pub fn try_team_statistics(&mut self, team: &str, year: u16) -> Result<&TeamStatistics> {
        let key = cache_key(team, year)?;
        if !self.stats_cache.contains_key(&key) {
            let page = self.load_page(&team_url(&self.base_url, &key.0, year))?;
            let record = decode::decode_payload(&page.payload(PageKind::TeamStats)?)?;
            let stats = TeamStatistics::from_record(record)?;
            info!(team = %key.0, year, "loaded team statistics");
            self.stats_cache.insert(key.clone(), stats);
        }
        self.stats_cache
            .get(&key)
            .ok_or_else(|| StatsError::Decode("statistics cache miss".into()))
    }

    pub fn category_table(
        &mut self,
        team: &str,
        year: u16,
        category: Category,
    ) -> Option<StatTable> {
        let stats = self.team_statistics(team, year)?;
        let Some(section) = stats.category(category) else {
            warn!(team, year, category = category.label(), "category missing from statistics");
            return None;
        };
        Some(normalize_category(category, section))
    }

    pub fn fixtures(&self, team: &str, year: u16) -> Result<Vec<TeamFixture>> {
        let (team, year) = cache_key(team, year)?;
        let page = self.load_page(&team_url(&self.base_url, &team, year))?;
        let record = decode::decode_payload(&page.payload(PageKind::TeamFixtures)?)?;
        decode::parse_team_fixtures(&record)
    }

    pub fn league_teams(&self, league: &str, year: u16) -> Result<LeagueTeams> {
        let page = self.load_page(&league_url(&self.base_url, league, year))?;
        let record = decode::decode_payload(&page.payload(PageKind::LeagueTeams)?)?;
        LeagueTeams::from_record(&record)
    }

    /// Fixtures, league history and xG differentials for one team season.
    pub fn team_overview(&mut self, team: &str, year: u16) -> Option<&TeamOverview> {
        match self.try_team_overview(team, year) {
            Ok(overview) => Some(overview),
            Err(err) => {
                warn!(team, year, error = %err, "failed to load team overview");
                None
            }
        }
    }

    pub fn try_team_overview(&mut self, team: &str, year: u16) -> Result<&TeamOverview> {
        let key = cache_key(team, year)?;
        if !self.overview_cache.contains_key(&key) {
            let overview = self.build_overview(&key.0, year)?;
            self.overview_cache.insert(key.clone(), overview);
        }
        self.overview_cache
            .get(&key)
            .ok_or_else(|| StatsError::Decode("overview cache miss".into()))
    }

    fn build_overview(&self, team: &str, year: u16) -> Result<TeamOverview> {
        let league = self
            .leagues
            .league_for(team)
            .ok_or_else(|| StatsError::UnknownTeam(team.to_string()))?
            .to_string();
        let fixtures = self.fixtures(team, year)?;
        let team_key = derived::team_key(&fixtures, team).ok_or_else(|| {
            StatsError::Decode(format!("{team} does not appear in its own fixtures"))
        })?;
        let teams = self.league_teams(&league, year)?;
        let entry = teams.by_key(&team_key).ok_or_else(|| {
            StatsError::Decode(format!("team key {team_key} missing from {league} {year}"))
        })?;
        let differentials = derived::xg_differentials(&entry.history)?;

        Ok(TeamOverview {
            team: team.to_string(),
            year,
            league,
            team_key,
            opponents: derived::opponents(&fixtures, team),
            history: entry.history.clone(),
            differentials,
        })
    }

    fn load_page(&self, url: &str) -> Result<RawPage> {
        let markup = self.source.fetch(url)?;
        RawPage::parse(markup)
    }
}

fn cache_key(team: &str, year: u16) -> Result<TeamYear> {
    let team = team.trim();
    if team.is_empty() {
        return Err(StatsError::InvalidSelection(format!(
            "empty team name for season {year}"
        )));
    }
    Ok((team.to_string(), year))
}
