#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

use understat_terminal::error::{Result, StatsError};
use understat_terminal::fetch::PageSource;

pub const BASE_URL: &str = "https://understat.test";

pub fn read_fixture(name: &str) -> String {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests");
    path.push("fixtures");
    path.push(name);
    fs::read_to_string(path).expect("fixture file should be readable")
}

/// Serves fixture pages by URL path and records every request.
pub struct FixtureSource {
    pages: HashMap<String, String>,
    pub requests: RefCell<Vec<String>>,
}

impl FixtureSource {
    pub fn new() -> Self {
        Self {
            pages: HashMap::new(),
            requests: RefCell::new(Vec::new()),
        }
    }

    /// Barcelona and Real Madrid 2023 team pages plus the La Liga 2023 league page.
    pub fn laliga_2023() -> Self {
        Self::new()
            .with_page("/team/Barcelona/2023", "team_page.html")
            .with_page("/team/Real_Madrid/2023", "team_page.html")
            .with_page("/team/Barcelona/2022", "short_page.html")
            .with_page("/league/La_liga/2023", "league_page.html")
    }

    pub fn with_page(mut self, path: &str, fixture: &str) -> Self {
        self.pages
            .insert(format!("{BASE_URL}{path}"), read_fixture(fixture));
        self
    }

    pub fn request_count(&self, url_suffix: &str) -> usize {
        self.requests
            .borrow()
            .iter()
            .filter(|u| u.ends_with(url_suffix))
            .count()
    }
}

impl PageSource for FixtureSource {
    fn fetch(&self, url: &str) -> Result<String> {
        self.requests.borrow_mut().push(url.to_string());
        self.pages
            .get(url)
            .cloned()
            .ok_or_else(|| StatsError::fetch(url, "http 404 Not Found"))
    }
}

impl PageSource for &FixtureSource {
    fn fetch(&self, url: &str) -> Result<String> {
        (*self).fetch(url)
    }
}
