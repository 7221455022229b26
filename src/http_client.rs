use std::time::Duration;

use once_cell::sync::OnceCell;
use reqwest::blocking::Client;

use crate::config::AppConfig;
use crate::error::{Result, StatsError};

static CLIENT: OnceCell<Client> = OnceCell::new();

/// Shared blocking client. Timeout and user agent come from the first config
/// passed in; later calls reuse the same client.
pub fn http_client(config: &AppConfig) -> Result<&'static Client> {
    CLIENT.get_or_try_init(|| {
        Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|err| StatsError::fetch(&config.base_url, format!("failed to build http client: {err}")))
    })
}
