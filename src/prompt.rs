use chrono::NaiveDate;

use crate::model::{MAX_MATCHES, PredictionMarket};
use crate::parser::{BLOCK_END, BLOCK_START};

pub fn system_instruction() -> String {
    let markets = PredictionMarket::ALL
        .iter()
        .map(|m| m.label())
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        "You are 'GoalKick AI', a world-class professional soccer analyst and bettor.
Your task is to analyze soccer matches based on REAL-TIME data including current standings, head-to-head (H2H) records, team form, and injuries.

RULES:
1. You must select exactly {MAX_MATCHES} high-value matches if the user does not provide specific ones. If the user provides matches, analyze those (up to {MAX_MATCHES}).
2. For each match, you MUST select the single best prediction from this list:
   [{markets}].
3. You must use Google Search to find the latest stats.
4. Your reasoning must be thorough, citing specific recent results and standing positions.
5. You must output the result in a strict custom format for parsing.

OUTPUT FORMAT:
For each match, output a block like this:
{BLOCK_START}
LEAGUE: [League Name]
TEAMS: [Home Team] vs [Away Team]
TIME: [Match Time/Date]
PREDICTION: [Selected Option from List]
CONFIDENCE: [Number between 75 and 99]
REASONING: [2-3 sentences explaining the choice based on form and stats]
H2H: [Summary of last 5 meetings]
STANDINGS: [Brief summary of league positions]
{BLOCK_END}

Do not add markdown formatting like bolding or italics inside the fields. Keep it plain text within the blocks.
"
    )
}

/// `Saturday, March 14, 2026`
pub fn format_today(date: NaiveDate) -> String {
    date.format("%A, %B %-d, %Y").to_string()
}

/// The custom matches a standard prompt actually carries: trimmed, blanks dropped, at most `MAX_MATCHES`.
pub fn custom_matches_sent(custom_matches: &[String]) -> Vec<&str> {
    custom_matches
        .iter()
        .map(|m| m.trim())
        .filter(|m| !m.is_empty())
        .take(MAX_MATCHES)
        .collect()
}

pub fn standard_prompt(today: NaiveDate, custom_matches: &[String]) -> String {
    let today = format_today(today);
    let picked = custom_matches_sent(custom_matches);

    if picked.is_empty() {
        return format!(
            "Today is {today}. Find the {MAX_MATCHES} best, high-confidence soccer matches playing today \
(or tomorrow if today's schedule is sparse) from major leagues (Premier League, La Liga, Serie A, \
Bundesliga, Champions League, or other top tier leagues). Analyze them and provide predictions."
        );
    }

    let list = picked
        .iter()
        .enumerate()
        .map(|(i, m)| format!("{}. {m}", i + 1))
        .collect::<Vec<_>>()
        .join("\n");
    format!(
        "Today is {today}. Analyze these specific matches and give me the best prediction for each:\n{list}"
    )
}

pub fn sniper_prompt(today: NaiveDate) -> String {
    let today = format_today(today);
    let target = PredictionMarket::FirstHalfNilNil.label();
    format!(
        "Today is {today}. I need 3-4 matches with the HIGHEST probability of ending 0-0 at Half Time (Correct Score First Half 0-0).
Look for:
1. Teams with strong defenses and weak attacks.
2. Matches expected to be tactical and cagey (e.g., derbies, bottom table clashes, or defensive managers).
3. High frequency of 0-0 halftime scores in their last 5 games.

Find these matches from major leagues globally.
PREDICTION field MUST be '{target}'."
    )
}
