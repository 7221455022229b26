//! Script-block extraction for Understat pages.
//!
//! The site embeds its data as `JSON.parse('...')` calls inside inline
//! `<script>` elements. Which element carries which dataset is only known by
//! position, so each page kind maps to one fixed block index below.

use scraper::{Html, Selector};

use crate::error::{Result, StatsError};

/// Team page block holding the season's fixtures (`datesData`).
pub const TEAM_DATES_BLOCK: usize = 1;
/// Team page block holding the season statistics (`statisticsData`).
pub const TEAM_STATS_BLOCK: usize = 2;
/// League page block holding per-team match history (`teamsData`).
pub const LEAGUE_TEAMS_BLOCK: usize = 2;

const PAYLOAD_OPEN: &str = "('";
const PAYLOAD_CLOSE: &str = "')";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageKind {
    TeamFixtures,
    TeamStats,
    LeagueTeams,
}

impl PageKind {
    pub fn block_index(self) -> usize {
        match self {
            PageKind::TeamFixtures => TEAM_DATES_BLOCK,
            PageKind::TeamStats => TEAM_STATS_BLOCK,
            PageKind::LeagueTeams => LEAGUE_TEAMS_BLOCK,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RawPage {
    pub markup: String,
    pub scripts: Vec<String>,
}

impl RawPage {
    /// Splits markup into its `<script>` blocks, in document order.
    /// Blocks without inline text (e.g. `src=` includes) are kept as empty strings
    /// so positions stay stable.
    pub fn parse(markup: impl Into<String>) -> Result<Self> {
        let markup = markup.into();
        let selector = Selector::parse("script")
            .map_err(|err| StatsError::MalformedPage(format!("bad script selector: {err}")))?;
        let scripts = {
            let document = Html::parse_document(&markup);
            document
                .select(&selector)
                .map(|el| el.text().collect::<String>())
                .collect::<Vec<_>>()
        };
        Ok(Self { markup, scripts })
    }

    pub fn block(&self, index: usize) -> Result<&str> {
        self.scripts.get(index).map(String::as_str).ok_or_else(|| {
            StatsError::MalformedPage(format!(
                "expected at least {} script blocks, found {}",
                index + 1,
                self.scripts.len()
            ))
        })
    }

    pub fn payload(&self, kind: PageKind) -> Result<EmbeddedPayload> {
        let block = self.block(kind.block_index())?;
        extract_between_delimiters(block).map(|s| EmbeddedPayload(s.to_string()))
    }
}

/// Still-escaped text found between the payload delimiters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbeddedPayload(pub String);

impl EmbeddedPayload {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Returns the text between the first `('` and the first `')` that follows it.
pub fn extract_between_delimiters(block: &str) -> Result<&str> {
    let open = block
        .find(PAYLOAD_OPEN)
        .ok_or_else(|| StatsError::MalformedPage("payload opening delimiter missing".into()))?;
    let start = open + PAYLOAD_OPEN.len();
    let len = block[start..]
        .find(PAYLOAD_CLOSE)
        .ok_or_else(|| StatsError::MalformedPage("payload closing delimiter missing".into()))?;
    Ok(&block[start..start + len])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_close_after_open_wins() {
        let block = "var a = JSON.parse('abc'); var b = JSON.parse('def');";
        assert_eq!(extract_between_delimiters(block).unwrap(), "abc");
    }

    #[test]
    fn close_before_open_is_ignored() {
        let block = "x') y('payload') z";
        assert_eq!(extract_between_delimiters(block).unwrap(), "payload");
    }

    #[test]
    fn missing_delimiters_are_malformed() {
        assert!(matches!(
            extract_between_delimiters("no payload here"),
            Err(StatsError::MalformedPage(_))
        ));
        assert!(matches!(
            extract_between_delimiters("JSON.parse('unterminated"),
            Err(StatsError::MalformedPage(_))
        ));
    }
}
