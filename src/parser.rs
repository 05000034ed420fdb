use std::sync::atomic::{AtomicU64, Ordering};

use once_cell::sync::Lazy;
use regex::Regex;

use crate::model::{DEFAULT_CONFIDENCE, MAX_GROUNDING_URLS, Prediction};

pub const BLOCK_START: &str = "||MATCH_START||";
pub const BLOCK_END: &str = "||MATCH_END||";
pub const PLACEHOLDER: &str = "N/A";
const TEAMS_SEPARATOR: &str = " vs ";

/// Source of record identifiers.
pub trait IdGenerator {
    fn next_id(&self) -> String;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct UuidIds;

impl IdGenerator for UuidIds {
    fn next_id(&self) -> String {
        uuid::Uuid::new_v4().to_string()
    }
}

/// Deterministic ids: `{prefix}-1`, `{prefix}-2`, ...
#[derive(Debug)]
pub struct SequentialIds {
    prefix: String,
    next: AtomicU64,
}

impl SequentialIds {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            next: AtomicU64::new(1),
        }
    }
}

impl IdGenerator for SequentialIds {
    fn next_id(&self) -> String {
        let n = self.next.fetch_add(1, Ordering::Relaxed);
        format!("{}-{n}", self.prefix)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    League,
    Teams,
    Time,
    Prediction,
    Confidence,
    Reasoning,
    H2h,
    Standings,
}

impl Field {
    const ALL: [Field; 8] = [
        Field::League,
        Field::Teams,
        Field::Time,
        Field::Prediction,
        Field::Confidence,
        Field::Reasoning,
        Field::H2h,
        Field::Standings,
    ];

    fn label(self) -> &'static str {
        match self {
            Field::League => "LEAGUE",
            Field::Teams => "TEAMS",
            Field::Time => "TIME",
            Field::Prediction => "PREDICTION",
            Field::Confidence => "CONFIDENCE",
            Field::Reasoning => "REASONING",
            Field::H2h => "H2H",
            Field::Standings => "STANDINGS",
        }
    }
}

// Indexed by `Field as usize`.
static FIELD_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    Field::ALL
        .iter()
        .map(|field| {
            Regex::new(&format!(r"(?i){}:[ \t]*([^\r\n]*)", field.label()))
                .expect("valid field regex")
        })
        .collect()
});

/// Outcome of one parse, with the block accounting the records alone hide.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParseReport {
    pub predictions: Vec<Prediction>,
    /// Blocks that had both delimiters.
    pub blocks_seen: usize,
    /// Complete blocks skipped for a missing home team or prediction.
    pub blocks_dropped: usize,
}

pub fn parse_predictions(text: &str, urls: &[String], ids: &dyn IdGenerator) -> Vec<Prediction> {
    parse_report(text, urls, ids).predictions
}

pub fn parse_report(text: &str, urls: &[String], ids: &dyn IdGenerator) -> ParseReport {
    let grounding_urls = urls
        .iter()
        .take(MAX_GROUNDING_URLS)
        .cloned()
        .collect::<Vec<_>>();

    let mut report = ParseReport::default();
    for segment in text.split(BLOCK_START) {
        let Some((content, _)) = segment.split_once(BLOCK_END) else {
            continue;
        };
        report.blocks_seen += 1;
        match parse_block(content, &grounding_urls, ids) {
            Some(prediction) => report.predictions.push(prediction),
            None => report.blocks_dropped += 1,
        }
    }
    report
}

fn parse_block(
    content: &str,
    grounding_urls: &[String],
    ids: &dyn IdGenerator,
) -> Option<Prediction> {
    let teams = field(content, Field::Teams);
    let (home_team, away_team) = split_teams(&teams);
    let prediction_market = field(content, Field::Prediction);

    if home_team.is_empty() || home_team == PLACEHOLDER || prediction_market == PLACEHOLDER {
        return None;
    }

    Some(Prediction {
        id: ids.next_id(),
        league: field(content, Field::League),
        home_team,
        away_team,
        match_time: field(content, Field::Time),
        prediction_market,
        confidence: parse_confidence(&field(content, Field::Confidence)),
        reasoning: field(content, Field::Reasoning),
        h2h_summary: field(content, Field::H2h),
        standings_summary: field(content, Field::Standings),
        grounding_urls: grounding_urls.to_vec(),
    })
}

fn field(content: &str, field: Field) -> String {
    FIELD_PATTERNS[field as usize]
        .captures(content)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim())
        .unwrap_or(PLACEHOLDER)
        .to_string()
}

// "A vs B vs C" keeps the first two names.
fn split_teams(raw: &str) -> (String, String) {
    let mut parts = raw.split(TEAMS_SEPARATOR);
    let home = parts.next().unwrap_or_default().trim().to_string();
    let away = parts.next().unwrap_or_default().trim().to_string();
    (home, away)
}

/// Leading signed integer once the first `%` is removed; zero or garbage falls back to the default.
pub fn parse_confidence(raw: &str) -> i32 {
    let cleaned = raw.replacen('%', "", 1);
    let cleaned = cleaned.trim_start();
    let (sign, rest) = match cleaned.as_bytes().first() {
        Some(b'-') => ("-", &cleaned[1..]),
        Some(b'+') => ("", &cleaned[1..]),
        _ => ("", cleaned),
    };
    let digits = rest
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect::<String>();
    format!("{sign}{digits}")
        .parse::<i32>()
        .ok()
        .filter(|value| *value != 0)
        .unwrap_or(DEFAULT_CONFIDENCE)
}
