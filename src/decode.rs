use serde_json::{Map, Value};

use crate::category::Category;
use crate::error::{Result, StatsError};
use crate::page::EmbeddedPayload;

/// A decoded payload. Use the typed views below to read it.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedRecord(pub Value);

pub fn decode_payload(payload: &EmbeddedPayload) -> Result<DecodedRecord> {
    let text = unescape_payload(payload.as_str())?;
    let value: Value = serde_json::from_str(text.trim())?;
    Ok(DecodedRecord(value))
}

/// Reverses the site's escaping.
///
/// `\xHH` and octal escapes are bytes, `\u`/`\U` escapes and literal text are
/// characters. Each contiguous run of byte escapes is read as UTF-8 and falls
/// back to Latin-1 when that run alone is not valid UTF-8.
pub fn unescape_payload(raw: &str) -> Result<String> {
    let mut out = String::with_capacity(raw.len());
    let mut run: Vec<u8> = Vec::new();
    let mut chars = raw.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch != '\\' {
            flush_byte_run(&mut run, &mut out);
            out.push(ch);
            continue;
        }
        let Some(esc) = chars.next() else {
            return Err(StatsError::Decode("trailing backslash in payload".into()));
        };
        match esc {
            '\\' => run.push(b'\\'),
            '\'' => run.push(b'\''),
            '"' => run.push(b'"'),
            'n' => run.push(b'\n'),
            'r' => run.push(b'\r'),
            't' => run.push(b'\t'),
            'b' => run.push(0x08),
            'f' => run.push(0x0c),
            'v' => run.push(0x0b),
            'a' => run.push(0x07),
            '\n' => {}
            'x' => {
                let code = read_hex(&mut chars, 2)?;
                run.push(code as u8);
            }
            'u' | 'U' => {
                let width = if esc == 'u' { 4 } else { 8 };
                let code = read_hex(&mut chars, width)?;
                let decoded = char::from_u32(code).ok_or_else(|| {
                    StatsError::Decode(format!("invalid unicode escape U+{code:X}"))
                })?;
                flush_byte_run(&mut run, &mut out);
                out.push(decoded);
            }
            '0'..='7' => {
                let mut code = esc.to_digit(8).unwrap_or(0);
                for _ in 0..2 {
                    match chars.peek().and_then(|c| c.to_digit(8)) {
                        Some(d) => {
                            code = code * 8 + d;
                            chars.next();
                        }
                        None => break,
                    }
                }
                // three octal digits top out at 0o777
                if code <= 0xFF {
                    run.push(code as u8);
                } else if let Some(decoded) = char::from_u32(code) {
                    flush_byte_run(&mut run, &mut out);
                    out.push(decoded);
                }
            }
            other => {
                flush_byte_run(&mut run, &mut out);
                out.push('\\');
                out.push(other);
            }
        }
    }
    flush_byte_run(&mut run, &mut out);
    Ok(out)
}

fn flush_byte_run(run: &mut Vec<u8>, out: &mut String) {
    if run.is_empty() {
        return;
    }
    match std::str::from_utf8(run) {
        Ok(text) => out.push_str(text),
        Err(_) => out.extend(run.iter().copied().map(char::from)),
    }
    run.clear();
}

fn read_hex(chars: &mut std::iter::Peekable<std::str::Chars<'_>>, width: usize) -> Result<u32> {
    let mut code = 0u32;
    for _ in 0..width {
        let digit = chars
            .next()
            .and_then(|c| c.to_digit(16))
            .ok_or_else(|| StatsError::Decode(format!("truncated {width}-digit hex escape")))?;
        code = code * 16 + digit;
    }
    Ok(code)
}

/// Escapes text the way the site embeds it: ASCII letters, digits and spaces
/// stay literal, every other byte becomes `\xHH`.
pub fn escape_payload(text: &str) -> String {
    let mut out = String::with_capacity(text.len() * 2);
    for byte in text.bytes() {
        if byte.is_ascii_alphanumeric() || byte == b' ' {
            out.push(byte as char);
        } else {
            out.push_str(&format!("\\x{byte:02X}"));
        }
    }
    out
}

/// Season statistics from a team page: category key → bucket → record.
#[derive(Debug, Clone, PartialEq)]
pub struct TeamStatistics {
    sections: Map<String, Value>,
}

impl TeamStatistics {
    pub fn from_record(record: DecodedRecord) -> Result<Self> {
        match record.0 {
            Value::Object(sections) => Ok(Self { sections }),
            other => Err(StatsError::Decode(format!(
                "team statistics should be an object, got {}",
                json_kind(&other)
            ))),
        }
    }

    pub fn category(&self, category: Category) -> Option<&Map<String, Value>> {
        self.sections.get(category.json_key())?.as_object()
    }

    pub fn available_categories(&self) -> Vec<Category> {
        Category::ALL
            .into_iter()
            .filter(|c| self.category(*c).is_some())
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FixtureSide {
    pub id: String,
    pub title: String,
    pub short_title: String,
}

/// One entry of a team page's fixture list.
#[derive(Debug, Clone, PartialEq)]
pub struct TeamFixture {
    pub id: String,
    pub is_result: bool,
    pub home: FixtureSide,
    pub away: FixtureSide,
    pub home_goals: Option<u32>,
    pub away_goals: Option<u32>,
    pub home_xg: Option<f64>,
    pub away_xg: Option<f64>,
    pub datetime: String,
}

pub fn parse_team_fixtures(record: &DecodedRecord) -> Result<Vec<TeamFixture>> {
    let arr = record
        .0
        .as_array()
        .ok_or_else(|| StatsError::Decode("fixtures payload should be an array".into()))?;
    Ok(arr.iter().filter_map(parse_fixture).collect())
}

fn parse_fixture(v: &Value) -> Option<TeamFixture> {
    let home = parse_side(v.get("h")?)?;
    let away = parse_side(v.get("a")?)?;
    let goals = v.get("goals");
    let xg = v.get("xG");
    Some(TeamFixture {
        id: as_string_any(v.get("id")?)?,
        is_result: v.get("isResult").and_then(Value::as_bool).unwrap_or(false),
        home,
        away,
        home_goals: goals.and_then(|g| g.get("h")).and_then(as_f64_any).map(|n| n as u32),
        away_goals: goals.and_then(|g| g.get("a")).and_then(as_f64_any).map(|n| n as u32),
        home_xg: xg.and_then(|x| x.get("h")).and_then(as_f64_any),
        away_xg: xg.and_then(|x| x.get("a")).and_then(as_f64_any),
        datetime: v
            .get("datetime")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
    })
}

fn parse_side(v: &Value) -> Option<FixtureSide> {
    Some(FixtureSide {
        id: as_string_any(v.get("id")?)?,
        title: v.get("title")?.as_str()?.to_string(),
        short_title: v
            .get("short_title")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
    })
}

/// A team's entry on a league page.
#[derive(Debug, Clone, PartialEq)]
pub struct LeagueTeam {
    pub id: String,
    pub title: String,
    pub history: Vec<Map<String, Value>>,
}

/// League page teams, keyed by the site's team id, in source order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LeagueTeams {
    pub teams: Vec<(String, LeagueTeam)>,
}

impl LeagueTeams {
    pub fn from_record(record: &DecodedRecord) -> Result<Self> {
        let obj = record
            .0
            .as_object()
            .ok_or_else(|| StatsError::Decode("league teams payload should be an object".into()))?;
        let mut teams = Vec::with_capacity(obj.len());
        for (key, entry) in obj {
            let history = entry
                .get("history")
                .and_then(Value::as_array)
                .map(|arr| {
                    arr.iter()
                        .filter_map(|m| m.as_object().cloned())
                        .collect::<Vec<_>>()
                })
                .unwrap_or_default();
            let team = LeagueTeam {
                id: entry
                    .get("id")
                    .and_then(as_string_any)
                    .unwrap_or_else(|| key.clone()),
                title: entry
                    .get("title")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string(),
                history,
            };
            teams.push((key.clone(), team));
        }
        Ok(Self { teams })
    }

    pub fn by_key(&self, key: &str) -> Option<&LeagueTeam> {
        self.teams.iter().find(|(k, _)| k == key).map(|(_, t)| t)
    }

    pub fn by_title(&self, title: &str) -> Option<&LeagueTeam> {
        self.teams
            .iter()
            .find(|(_, t)| t.title == title)
            .map(|(_, t)| t)
    }
}

/// Numbers, or strings holding numbers (the site mixes both).
pub fn as_f64_any(v: &Value) -> Option<f64> {
    if let Some(n) = v.as_f64() {
        return Some(n);
    }
    v.as_str()?.trim().parse::<f64>().ok()
}

fn as_string_any(v: &Value) -> Option<String> {
    match v {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn json_kind(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unescapes_hex_and_simple_escapes() {
        assert_eq!(unescape_payload(r"\x7B\x22a\x22\x3A1\x7D").unwrap(), r#"{"a":1}"#);
        assert_eq!(unescape_payload(r"it\'s\n").unwrap(), "it's\n");
        assert_eq!(unescape_payload(r"é").unwrap(), "é");
        assert_eq!(unescape_payload(r"\101").unwrap(), "A");
        assert_eq!(unescape_payload(r"\q").unwrap(), r"\q");
    }

    #[test]
    fn utf8_byte_escapes_rejoin() {
        assert_eq!(unescape_payload(r"Atl\xC3\xA9tico").unwrap(), "Atlético");
    }

    #[test]
    fn lone_latin1_byte_falls_back() {
        assert_eq!(unescape_payload(r"caf\xE9").unwrap(), "café");
    }

    #[test]
    fn invalid_byte_run_does_not_spread() {
        let text = unescape_payload(r"Espa\u00F1a M\xFCnchen Atl\xC3\xA9tico Ni\xF1o").unwrap();
        assert_eq!(text, "España München Atlético Niño");

        let literal = unescape_payload(r"Málaga \xE9").unwrap();
        assert_eq!(literal, "Málaga é");
    }

    #[test]
    fn broken_escapes_are_decode_errors() {
        assert!(matches!(unescape_payload(r"abc\"), Err(StatsError::Decode(_))));
        assert!(matches!(unescape_payload(r"\x4"), Err(StatsError::Decode(_))));
        assert!(matches!(unescape_payload(r"\uD800"), Err(StatsError::Decode(_))));
    }
}
