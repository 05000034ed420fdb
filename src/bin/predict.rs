use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use goalkick_terminal::config::{GeminiConfig, load_dotenv};
use goalkick_terminal::gemini::{GeminiClient, GeneratedText, parse_generate_response_json};
use goalkick_terminal::model::{GenerationMode, MAX_MATCHES, Prediction};
use goalkick_terminal::parser::{ParseReport, UuidIds, parse_report};
use goalkick_terminal::service::PredictionService;

fn main() -> Result<()> {
    load_dotenv();
    let args = std::env::args().skip(1).collect::<Vec<_>>();
    let json = args.iter().any(|a| a == "--json");
    let mode = if args.iter().any(|a| a == "--sniper") {
        GenerationMode::Sniper
    } else {
        GenerationMode::Standard
    };

    let (predictions, dropped) = if let Some(path) = parse_path_arg(&args, "--from-file") {
        let report = parse_saved_response(&path)?;
        (report.predictions, report.blocks_dropped)
    } else {
        let custom_matches = parse_match_args(&args);
        if custom_matches.len() > MAX_MATCHES {
            eprintln!(
                "warning: only the first {MAX_MATCHES} of {} matches are analyzed",
                custom_matches.len()
            );
        }
        let cfg = GeminiConfig::from_env();
        let client = GeminiClient::new(&cfg)?;
        let service =
            PredictionService::new(client, UuidIds).with_search_grounding(cfg.search_grounding);
        let batch = service.generate(mode, &custom_matches)?;
        (batch.predictions, batch.blocks_dropped)
    };

    if dropped > 0 {
        eprintln!("warning: dropped {dropped} match blocks missing teams or prediction");
    }

    if json {
        let out = serde_json::to_string_pretty(&predictions).context("serialize predictions")?;
        println!("{out}");
        return Ok(());
    }

    if predictions.is_empty() {
        println!("No predictions parsed.");
        return Ok(());
    }
    for (idx, p) in predictions.iter().enumerate() {
        print_card(idx, p);
    }
    Ok(())
}

// A saved file is either the raw generateContent JSON or the plain model text.
fn parse_saved_response(path: &Path) -> Result<ParseReport> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed reading {}", path.display()))?;
    let generated = if raw.trim_start().starts_with('{') {
        parse_generate_response_json(&raw)?
    } else {
        GeneratedText {
            text: raw,
            urls: Vec::new(),
        }
    };
    Ok(parse_report(&generated.text, &generated.urls, &UuidIds))
}

fn print_card(idx: usize, p: &Prediction) {
    println!("#{} {} | {}", idx + 1, p.league, p.match_time);
    if p.away_team.is_empty() {
        println!("  {}", p.home_team);
    } else {
        println!("  {} vs {}", p.home_team, p.away_team);
    }
    let tag = if p.market().is_some() { "" } else { " (off-list)" };
    println!("  Prediction: {}{tag} @ {}%", p.prediction_market, p.confidence);
    println!("  Reasoning: {}", p.reasoning);
    println!("  H2H: {}", p.h2h_summary);
    println!("  Table: {}", p.standings_summary);
    for (i, url) in p.grounding_urls.iter().enumerate() {
        println!("  Source {}: {url}", i + 1);
    }
    println!();
}

fn parse_path_arg(args: &[String], flag: &str) -> Option<PathBuf> {
    let prefix = format!("{flag}=");
    for (idx, arg) in args.iter().enumerate() {
        if let Some(path) = arg.strip_prefix(&prefix) {
            let trimmed = path.trim();
            if !trimmed.is_empty() {
                return Some(PathBuf::from(trimmed));
            }
        }
        if arg == flag
            && let Some(next) = args.get(idx + 1)
            && !next.trim().is_empty()
        {
            return Some(PathBuf::from(next));
        }
    }
    None
}

fn parse_match_args(args: &[String]) -> Vec<String> {
    let mut out = Vec::new();
    for (idx, arg) in args.iter().enumerate() {
        if let Some(raw) = arg.strip_prefix("--match=") {
            push_match(&mut out, raw);
        }
        if arg == "--match"
            && let Some(next) = args.get(idx + 1)
        {
            push_match(&mut out, next);
        }
    }
    out
}

fn push_match(out: &mut Vec<String>, raw: &str) {
    let trimmed = raw.trim();
    if !trimmed.is_empty() {
        out.push(trimmed.to_string());
    }
}
