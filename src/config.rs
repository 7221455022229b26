use std::path::PathBuf;

pub const DEFAULT_BASE_URL: &str = "https://understat.com";
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0";
const DEFAULT_TIMEOUT_SECS: u64 = 30;
const APP_DIR: &str = "understat_terminal";
const DB_FILE: &str = "stats.sqlite";
const LOG_FILE: &str = "understat_terminal.log";

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub base_url: String,
    pub db_path: Option<PathBuf>,
    pub timeout_secs: u64,
    pub user_agent: String,
    pub leagues_file: Option<PathBuf>,
    pub log_file: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            db_path: app_cache_dir().map(|dir| dir.join(DB_FILE)),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            leagues_file: None,
            log_file: app_cache_dir().map(|dir| dir.join(LOG_FILE)),
        }
    }
}

impl AppConfig {
    /// Reads the process environment. Call `dotenvy` first if `.env` files should apply.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let get = |key: &str| lookup(key).and_then(|v| non_empty(&v));

        let base_url = get("UNDERSTAT_BASE_URL")
            .map(|url| url.trim_end_matches('/').to_string())
            .unwrap_or(defaults.base_url);
        let timeout_secs = get("UNDERSTAT_TIMEOUT_SECS")
            .and_then(|val| val.parse::<u64>().ok())
            .unwrap_or(DEFAULT_TIMEOUT_SECS)
            .max(1);

        Self {
            base_url,
            db_path: get("UNDERSTAT_DB_PATH")
                .map(PathBuf::from)
                .or(defaults.db_path),
            timeout_secs,
            user_agent: get("UNDERSTAT_USER_AGENT").unwrap_or(defaults.user_agent),
            leagues_file: get("UNDERSTAT_LEAGUES_FILE").map(PathBuf::from),
            log_file: get("UNDERSTAT_LOG_FILE")
                .map(PathBuf::from)
                .or(defaults.log_file),
        }
    }
}

pub fn app_cache_dir() -> Option<PathBuf> {
    if let Ok(base) = std::env::var("XDG_CACHE_HOME") {
        if !base.trim().is_empty() {
            return Some(PathBuf::from(base).join(APP_DIR));
        }
    }
    let home = std::env::var("HOME").ok()?;
    if home.trim().is_empty() {
        return None;
    }
    Some(PathBuf::from(home).join(".cache").join(APP_DIR))
}

fn non_empty(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
