use reqwest::blocking::Client;
use tracing::debug;

use crate::config::AppConfig;
use crate::error::{Result, StatsError};
use crate::http_client::http_client;

/// Anything that can turn a URL into page markup.
pub trait PageSource {
    fn fetch(&self, url: &str) -> Result<String>;
}

/// Live source: one blocking GET per call, no retry, no caching.
pub struct HttpPageSource {
    client: &'static Client,
}

impl HttpPageSource {
    pub fn new(config: &AppConfig) -> Result<Self> {
        Ok(Self {
            client: http_client(config)?,
        })
    }

    pub fn with_client(client: &'static Client) -> Self {
        Self { client }
    }
}

impl PageSource for HttpPageSource {
    fn fetch(&self, url: &str) -> Result<String> {
        debug!(url, "fetching page");
        let resp = self
            .client
            .get(url)
            .send()
            .map_err(|err| StatsError::fetch(url, err))?;
        let status = resp.status();
        if !status.is_success() {
            return Err(StatsError::fetch(url, format!("http {status}")));
        }
        resp.text()
            .map_err(|err| StatsError::fetch(url, format!("failed reading body: {err}")))
    }
}

pub fn team_url(base_url: &str, team: &str, year: u16) -> String {
    format!("{base_url}/team/{}/{year}", underscore_whitespace(team))
}

pub fn league_url(base_url: &str, league: &str, year: u16) -> String {
    format!("{base_url}/league/{}/{year}", underscore_whitespace(league))
}

/// Replaces every run of whitespace with a single `_`, leading and trailing runs included.
pub fn underscore_whitespace(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut in_space = false;
    for ch in name.chars() {
        if ch.is_whitespace() {
            if !in_space {
                out.push('_');
                in_space = true;
            }
        } else {
            out.push(ch);
            in_space = false;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use std::io::{Read, Write};
    use std::net::TcpListener;
    use std::thread;

    use super::*;

    /// Answers a single request with `status_line` and `body`, returning the URL to hit.
    fn serve_once(status_line: &'static str, body: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 1024];
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = stream.read(&mut buf).unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
            }
            let response = format!(
                "HTTP/1.1 {status_line}\r\nContent-Type: text/html\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            stream.write_all(response.as_bytes()).unwrap();
        });
        format!("http://{addr}/team/Barcelona/2023")
    }

    fn local_source() -> HttpPageSource {
        let client = Client::builder().no_proxy().build().unwrap();
        HttpPageSource::with_client(Box::leak(Box::new(client)))
    }

    #[test]
    fn non_success_status_is_fetch_error() {
        let url = serve_once("404 Not Found", "");
        let err = local_source().fetch(&url).unwrap_err();
        match err {
            StatsError::Fetch { url: failed, reason } => {
                assert_eq!(failed, url);
                assert!(reason.contains("404"), "{reason}");
            }
            other => panic!("expected fetch error, got {other:?}"),
        }
    }

    #[test]
    fn success_returns_markup() {
        let url = serve_once("200 OK", "<script>var x = JSON.parse('\\x5B\\x5D')</script>");
        let body = local_source().fetch(&url).unwrap();
        assert!(body.contains("JSON.parse"));
    }

    #[test]
    fn unreachable_host_is_fetch_error() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        let err = local_source()
            .fetch(&format!("http://{addr}/league/EPL/2023"))
            .unwrap_err();
        assert!(matches!(err, StatsError::Fetch { .. }));
    }

    #[test]
    fn whitespace_runs_collapse_to_one_underscore() {
        assert_eq!(underscore_whitespace("Real Madrid"), "Real_Madrid");
        assert_eq!(underscore_whitespace("Manchester  \tUnited"), "Manchester_United");
        assert_eq!(underscore_whitespace(" Lazio"), "_Lazio");
        assert_eq!(underscore_whitespace("Barcelona"), "Barcelona");
    }

    #[test]
    fn urls_follow_site_templates() {
        assert_eq!(
            team_url("https://understat.com", "Real Madrid", 2023),
            "https://understat.com/team/Real_Madrid/2023"
        );
        assert_eq!(
            league_url("https://understat.com", "La_liga", 2019),
            "https://understat.com/league/La_liga/2019"
        );
    }
}
