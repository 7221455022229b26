use std::collections::HashMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result, bail};
use serde::Deserialize;

/// League codes as they appear in the site's league URLs.
pub const LEAGUES: [&str; 6] = ["EPL", "La_liga", "Bundesliga", "Serie_A", "Ligue_1", "RFPL"];

const BUILTIN_TEAMS: &[(&str, &str)] = &[
    ("Arsenal", "EPL"),
    ("Aston Villa", "EPL"),
    ("Chelsea", "EPL"),
    ("Liverpool", "EPL"),
    ("Manchester City", "EPL"),
    ("Manchester United", "EPL"),
    ("Newcastle United", "EPL"),
    ("Tottenham", "EPL"),
    ("Athletic Club", "La_liga"),
    ("Atletico Madrid", "La_liga"),
    ("Barcelona", "La_liga"),
    ("Real Betis", "La_liga"),
    ("Real Madrid", "La_liga"),
    ("Real Sociedad", "La_liga"),
    ("Sevilla", "La_liga"),
    ("Valencia", "La_liga"),
    ("Villarreal", "La_liga"),
    ("Bayer Leverkusen", "Bundesliga"),
    ("Bayern Munich", "Bundesliga"),
    ("Borussia Dortmund", "Bundesliga"),
    ("RasenBallsport Leipzig", "Bundesliga"),
    ("AC Milan", "Serie_A"),
    ("Atalanta", "Serie_A"),
    ("Inter", "Serie_A"),
    ("Juventus", "Serie_A"),
    ("Lazio", "Serie_A"),
    ("Napoli", "Serie_A"),
    ("Roma", "Serie_A"),
    ("Lille", "Ligue_1"),
    ("Lyon", "Ligue_1"),
    ("Marseille", "Ligue_1"),
    ("Monaco", "Ligue_1"),
    ("Paris Saint Germain", "Ligue_1"),
    ("CSKA Moscow", "RFPL"),
    ("Spartak Moscow", "RFPL"),
    ("Zenit St. Petersburg", "RFPL"),
];

/// Override file layout: either a flat `{"Team": "League"}` object or a list
/// of `{"team": ..., "league": ...}` entries.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum LeagueOverrides {
    Map(HashMap<String, String>),
    List(Vec<LeagueEntry>),
}

#[derive(Debug, Deserialize)]
struct LeagueEntry {
    team: String,
    league: String,
}

/// Team name → league code lookup.
#[derive(Debug, Clone, Default)]
pub struct LeagueDirectory {
    teams: HashMap<String, String>,
}

impl LeagueDirectory {
    pub fn builtin() -> Self {
        Self {
            teams: BUILTIN_TEAMS
                .iter()
                .map(|(team, league)| (team.to_string(), league.to_string()))
                .collect(),
        }
    }

    /// Built-in table with entries from a JSON override file laid over it.
    pub fn with_overrides(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("read league map {}", path.display()))?;
        let mut dir = Self::builtin();
        dir.merge_json(&raw)?;
        Ok(dir)
    }

    pub fn merge_json(&mut self, raw: &str) -> Result<usize> {
        let extra = serde_json::from_str::<LeagueOverrides>(raw)
            .context("invalid league map json")?;
        let pairs: Vec<(String, String)> = match extra {
            LeagueOverrides::Map(map) => map.into_iter().collect(),
            LeagueOverrides::List(entries) => {
                entries.into_iter().map(|e| (e.team, e.league)).collect()
            }
        };
        if let Some((team, league)) = pairs.iter().find(|(_, l)| !LEAGUES.contains(&l.trim())) {
            bail!("unknown league code {league:?} for {team}; expected one of {LEAGUES:?}");
        }
        let n = pairs.len();
        for (team, league) in pairs {
            self.insert(team.trim(), league.trim());
        }
        Ok(n)
    }

    pub fn insert(&mut self, team: impl Into<String>, league: impl Into<String>) {
        self.teams.insert(team.into(), league.into());
    }

    pub fn league_for(&self, team: &str) -> Option<&str> {
        self.teams.get(team.trim()).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.teams.len()
    }

    pub fn is_empty(&self) -> bool {
        self.teams.is_empty()
    }
}
