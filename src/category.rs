use std::fmt;

/// The for/against bucketed sections of a team's season statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Situation,
    Formation,
    AttackSpeed,
    GameState,
    Timing,
    ShotZone,
    Result,
}

impl Category {
    /// Dashboard order.
    pub const ALL: [Category; 7] = [
        Category::Situation,
        Category::Formation,
        Category::AttackSpeed,
        Category::GameState,
        Category::Timing,
        Category::ShotZone,
        Category::Result,
    ];

    /// Key of the section inside the decoded statistics payload.
    pub fn json_key(self) -> &'static str {
        match self {
            Category::Situation => "situation",
            Category::Formation => "formation",
            Category::AttackSpeed => "attackSpeed",
            Category::GameState => "gameState",
            Category::Timing => "timing",
            Category::ShotZone => "shotZone",
            Category::Result => "result",
        }
    }

    /// Display label; also the persistence collection name.
    pub fn label(self) -> &'static str {
        match self {
            Category::Situation => "Situation",
            Category::Formation => "Formation",
            Category::AttackSpeed => "AttackSpeed",
            Category::GameState => "GameState",
            Category::Timing => "Timing",
            Category::ShotZone => "ShotZone",
            Category::Result => "Result",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        let wanted = name.trim();
        Self::ALL.into_iter().find(|c| {
            c.label().eq_ignore_ascii_case(wanted) || c.json_key().eq_ignore_ascii_case(wanted)
        })
    }

    pub fn next(self) -> Self {
        let idx = Self::ALL.iter().position(|c| *c == self).unwrap_or(0);
        Self::ALL[(idx + 1) % Self::ALL.len()]
    }

    pub fn prev(self) -> Self {
        let idx = Self::ALL.iter().position(|c| *c == self).unwrap_or(0);
        Self::ALL[(idx + Self::ALL.len() - 1) % Self::ALL.len()]
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
