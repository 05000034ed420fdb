use std::sync::Mutex;

use anyhow::{Result, anyhow};
use chrono::NaiveDate;

use goalkick_terminal::gemini::{GeneratedText, GenerationRequest, TextGenerator};
use goalkick_terminal::model::GenerationMode;
use goalkick_terminal::parser::SequentialIds;
use goalkick_terminal::service::PredictionService;

const ONE_BLOCK: &str = "||MATCH_START||\nLEAGUE: EPL\nTEAMS: Arsenal vs Chelsea\nTIME: Today\nPREDICTION: Home win\nCONFIDENCE: 88%\nREASONING: r\nH2H: h\nSTANDINGS: s\n||MATCH_END||\n||MATCH_START||\nTEAMS: Broken\n||MATCH_END||";

struct StubGenerator {
    reply: Result<GeneratedText, String>,
    seen: Mutex<Vec<GenerationRequest>>,
}

impl StubGenerator {
    fn ok(text: &str, urls: &[&str]) -> Self {
        Self {
            reply: Ok(GeneratedText {
                text: text.to_string(),
                urls: urls.iter().map(|s| s.to_string()).collect(),
            }),
            seen: Mutex::new(Vec::new()),
        }
    }

    fn failing(cause: &str) -> Self {
        Self {
            reply: Err(cause.to_string()),
            seen: Mutex::new(Vec::new()),
        }
    }
}

impl TextGenerator for &StubGenerator {
    fn generate(&self, request: &GenerationRequest) -> Result<GeneratedText> {
        self.seen.lock().expect("stub lock").push(request.clone());
        match &self.reply {
            Ok(out) => Ok(out.clone()),
            Err(cause) => Err(anyhow!("{cause}")),
        }
    }
}

fn day() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 10, 16).expect("valid date")
}

#[test]
fn standard_generation_parses_and_reports() {
    let stub = StubGenerator::ok(ONE_BLOCK, &["u1", "u2", "u3", "u4"]);
    let service = PredictionService::new(&stub, SequentialIds::new("s")).with_today(day());

    let batch = service
        .generate(GenerationMode::Standard, &[])
        .expect("stub succeeds");
    assert_eq!(batch.mode, GenerationMode::Standard);
    assert_eq!(batch.predictions.len(), 1);
    assert_eq!(batch.predictions[0].id, "s-1");
    assert_eq!(batch.predictions[0].grounding_urls.len(), 3);
    assert_eq!(batch.grounding_urls.len(), 4);
    assert_eq!(batch.blocks_seen, 2);
    assert_eq!(batch.blocks_dropped, 1);

    let seen = stub.seen.lock().expect("stub lock");
    assert_eq!(seen.len(), 1);
    assert!((seen[0].temperature - 0.4).abs() < f32::EPSILON);
    assert!(seen[0].search_grounding);
    assert!(seen[0].user_prompt.starts_with("Today is Friday, October 16, 2026."));
    assert!(seen[0].system_instruction.contains("||MATCH_START||"));
}

#[test]
fn custom_matches_are_capped_at_four() {
    let stub = StubGenerator::ok("", &[]);
    let service = PredictionService::new(&stub, SequentialIds::new("s")).with_today(day());
    let matches = (1..=6)
        .map(|i| format!("Home{i} vs Away{i}"))
        .collect::<Vec<_>>();

    let out = service.generate_predictions(&matches).expect("stub succeeds");
    assert!(out.is_empty());

    let seen = stub.seen.lock().expect("stub lock");
    let prompt = &seen[0].user_prompt;
    assert!(prompt.contains("4. Home4 vs Away4"));
    assert!(!prompt.contains("Home5"));
}

#[test]
fn sniper_uses_lower_temperature_and_pinned_market() {
    let stub = StubGenerator::ok(ONE_BLOCK, &[]);
    let service = PredictionService::new(&stub, SequentialIds::new("s"))
        .with_today(day())
        .with_search_grounding(false);

    let out = service
        .generate_zero_zero_predictions()
        .expect("stub succeeds");
    assert_eq!(out.len(), 1);

    let seen = stub.seen.lock().expect("stub lock");
    assert!((seen[0].temperature - 0.3).abs() < f32::EPSILON);
    assert!(!seen[0].search_grounding);
    assert!(seen[0].user_prompt.contains("'First Half 0-0'"));
}

#[test]
fn transport_failure_surfaces_generic_message() {
    let stub = StubGenerator::failing("connection reset");
    let service = PredictionService::new(&stub, SequentialIds::new("s")).with_today(day());

    let err = service
        .generate(GenerationMode::Standard, &[])
        .expect_err("stub fails");
    assert_eq!(
        err.to_string(),
        "Failed to generate predictions. Please try again."
    );
    assert!(format!("{err:#}").contains("connection reset"));

    let err = service
        .generate_zero_zero_predictions()
        .expect_err("stub fails");
    assert_eq!(err.to_string(), "Failed to generate 0-0 predictions.");
}
