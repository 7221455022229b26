use thiserror::Error;

/// Errors raised by the fetch → extract → decode → persist pipeline.
///
/// `Fetch`, `MalformedPage` and `Decode` are terminal for a request: callers
/// treat them as "no data" and do not try to salvage partial results.
#[derive(Error, Debug)]
pub enum StatsError {
    #[error("fetch failed for {url}: {reason}")]
    Fetch { url: String, reason: String },

    #[error("malformed page: {0}")]
    MalformedPage(String),

    #[error("decode failed: {0}")]
    Decode(String),

    #[error("no league known for team {0}")]
    UnknownTeam(String),

    #[error("invalid selection: {0}")]
    InvalidSelection(String),

    #[error("persistence error: {0}")]
    Persistence(#[from] rusqlite::Error),
}

impl StatsError {
    pub fn fetch(url: &str, reason: impl std::fmt::Display) -> Self {
        StatsError::Fetch {
            url: url.to_string(),
            reason: reason.to_string(),
        }
    }

    /// True for the errors that mean "nothing to display" rather than a local fault.
    pub fn is_no_data(&self) -> bool {
        matches!(
            self,
            StatsError::Fetch { .. }
                | StatsError::MalformedPage(_)
                | StatsError::Decode(_)
                | StatsError::UnknownTeam(_)
                | StatsError::InvalidSelection(_)
        )
    }
}

impl From<serde_json::Error> for StatsError {
    fn from(err: serde_json::Error) -> Self {
        StatsError::Decode(format!("invalid json: {err}"))
    }
}

pub type Result<T> = std::result::Result<T, StatsError>;
