use serde_json::{Map, Value};

use crate::decode::{TeamFixture, as_f64_any};
use crate::error::{Result, StatsError};

pub type MatchHistory = [Map<String, Value>];

/// Stats the single-team overview can chart from a league history.
pub const OVERVIEW_STATS: [&str; 6] = ["xG", "xGA", "npxG", "npxGA", "xpts", "npxGD"];

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatchDifferential {
    /// 1-based position in the season history.
    pub match_index: usize,
    pub xg: f64,
    pub xga: f64,
    /// `xg - xga` rounded to two decimals, halves to even.
    pub diff: f64,
}

/// Two-decimal rounding, halves to even.
pub fn round2(v: f64) -> f64 {
    (v * 100.0).round_ties_even() / 100.0
}

pub fn xg_differentials(history: &MatchHistory) -> Result<Vec<MatchDifferential>> {
    history
        .iter()
        .enumerate()
        .map(|(i, m)| {
            let xg = numeric_field(m, "xG")
                .ok_or_else(|| StatsError::Decode(format!("match {} has no numeric xG", i + 1)))?;
            let xga = numeric_field(m, "xGA")
                .ok_or_else(|| StatsError::Decode(format!("match {} has no numeric xGA", i + 1)))?;
            Ok(MatchDifferential {
                match_index: i + 1,
                xg,
                xga,
                diff: round2(xg - xga),
            })
        })
        .collect()
}

/// Splits into strictly positive and strictly negative differentials.
/// Level matches land in neither.
pub fn partition_differentials(
    diffs: &[MatchDifferential],
) -> (Vec<MatchDifferential>, Vec<MatchDifferential>) {
    let positive = diffs.iter().filter(|d| d.diff > 0.0).copied().collect();
    let negative = diffs.iter().filter(|d| d.diff < 0.0).copied().collect();
    (positive, negative)
}

/// `(match_index, value)` for matches that carry `stat`.
pub fn stat_series(history: &MatchHistory, stat: &str) -> Vec<(usize, f64)> {
    history
        .iter()
        .enumerate()
        .filter_map(|(i, m)| numeric_field(m, stat).map(|v| (i + 1, v)))
        .collect()
}

/// Season sums for the requested stats that appear in the history at all.
pub fn stat_totals(history: &MatchHistory, stats: &[&str]) -> Vec<(String, f64)> {
    stats
        .iter()
        .filter(|stat| history.iter().any(|m| m.contains_key(**stat)))
        .map(|stat| {
            let total = history.iter().filter_map(|m| numeric_field(m, stat)).sum();
            (stat.to_string(), total)
        })
        .collect()
}

/// Scales by the largest value. A non-positive maximum leaves the values as they are.
pub fn normalize_by_max(values: &[f64]) -> Vec<f64> {
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if max.is_nan() || max <= 0.0 {
        return values.to_vec();
    }
    values.iter().map(|v| v / max).collect()
}

/// Opponent title for each fixture, in fixture order.
pub fn opponents(fixtures: &[TeamFixture], team: &str) -> Vec<String> {
    fixtures
        .iter()
        .map(|f| {
            if f.home.title == team {
                f.away.title.clone()
            } else {
                f.home.title.clone()
            }
        })
        .collect()
}

/// The site's id for `team`, read from whichever side of a fixture it played on.
pub fn team_key(fixtures: &[TeamFixture], team: &str) -> Option<String> {
    fixtures.iter().find_map(|f| {
        if f.home.title == team {
            Some(f.home.id.clone())
        } else if f.away.title == team {
            Some(f.away.id.clone())
        } else {
            None
        }
    })
}

fn numeric_field(m: &Map<String, Value>, key: &str) -> Option<f64> {
    m.get(key).and_then(as_f64_any)
}
