use std::time::Duration;

use goalkick_terminal::model::{GenerationMode, Prediction};
use goalkick_terminal::state::{
    AppState, Delta, LOADING_STEPS, PredictionState, ProviderCommand, apply_delta,
    loading_step_for,
};

fn prediction(id: &str, home: &str) -> Prediction {
    Prediction {
        id: id.to_string(),
        league: "Premier League".to_string(),
        home_team: home.to_string(),
        away_team: "Away".to_string(),
        match_time: "Today".to_string(),
        prediction_market: "Home win".to_string(),
        confidence: 88,
        reasoning: "r".to_string(),
        h2h_summary: "h".to_string(),
        standings_summary: "s".to_string(),
        grounding_urls: Vec::new(),
    }
}

#[test]
fn loading_gates_a_second_request() {
    let mut state = AppState::new();
    let first = state.begin_generation(GenerationMode::Standard);
    assert!(first.is_some());
    assert_eq!(state.status, PredictionState::Loading);

    assert!(state.begin_generation(GenerationMode::Sniper).is_none());
    assert_eq!(state.mode, GenerationMode::Standard);
    assert!(state.retry_command().is_none());
}

#[test]
fn success_resets_selection_and_expansion() {
    let mut state = AppState::new();
    state.begin_generation(GenerationMode::Standard);
    apply_delta(
        &mut state,
        Delta::SetPredictions {
            mode: GenerationMode::Standard,
            predictions: vec![prediction("a", "LIV"), prediction("b", "MCI")],
        },
    );
    assert_eq!(state.status, PredictionState::Success);

    state.select_next();
    state.select_next();
    assert_eq!(state.selected, 1);
    state.toggle_expanded();
    assert!(state.is_expanded("b"));
    state.toggle_expanded();
    assert!(!state.is_expanded("b"));
    state.toggle_expanded();

    let cmd = state.retry_command().expect("refresh allowed after success");
    assert!(matches!(
        cmd,
        ProviderCommand::Generate {
            mode: GenerationMode::Standard,
            ..
        }
    ));
    apply_delta(
        &mut state,
        Delta::SetPredictions {
            mode: GenerationMode::Standard,
            predictions: vec![prediction("c", "ARS")],
        },
    );
    assert_eq!(state.selected, 0);
    assert!(state.expanded.is_empty());
    assert_eq!(
        state.selected_prediction().map(|p| p.home_team.as_str()),
        Some("ARS")
    );
}

#[test]
fn failure_then_retry_reuses_mode() {
    let mut state = AppState::new();
    state.begin_generation(GenerationMode::Sniper);
    apply_delta(
        &mut state,
        Delta::GenerationFailed {
            mode: GenerationMode::Sniper,
            message: "Failed to generate 0-0 predictions.".to_string(),
        },
    );
    assert_eq!(state.status, PredictionState::Error);
    assert_eq!(
        state.error.as_deref(),
        Some("Failed to generate 0-0 predictions.")
    );

    let cmd = state.retry_command().expect("retry allowed after error");
    let ProviderCommand::Generate {
        mode,
        custom_matches,
    } = cmd;
    assert_eq!(mode, GenerationMode::Sniper);
    assert!(custom_matches.is_empty());
    assert_eq!(state.status, PredictionState::Loading);
    assert!(state.error.is_none());
}

#[test]
fn custom_matches_are_trimmed_and_capped() {
    let mut state = AppState::new();
    assert!(!state.add_custom_match("   "));
    for i in 1..=4 {
        assert!(state.add_custom_match(&format!("  Home{i} vs Away{i} ")));
    }
    assert!(!state.add_custom_match("Home5 vs Away5"));
    assert_eq!(state.custom_matches.len(), 4);
    assert_eq!(state.custom_matches[0], "Home1 vs Away1");
    assert!(state.logs.iter().any(|l| l.starts_with("[WARN]")));

    let Some(ProviderCommand::Generate { custom_matches, .. }) =
        state.begin_generation(GenerationMode::Standard)
    else {
        panic!("expected a command");
    };
    assert_eq!(custom_matches.len(), 4);

    state.back_to_idle();
    assert_eq!(state.status, PredictionState::Loading);
}

#[test]
fn back_to_idle_clears_error() {
    let mut state = AppState::new();
    state.begin_generation(GenerationMode::Standard);
    apply_delta(
        &mut state,
        Delta::GenerationFailed {
            mode: GenerationMode::Standard,
            message: "boom".to_string(),
        },
    );
    state.back_to_idle();
    assert_eq!(state.status, PredictionState::Idle);
    assert!(state.error.is_none());
}

#[test]
fn loading_steps_advance_and_hold() {
    assert_eq!(loading_step_for(Duration::ZERO), 0);
    assert_eq!(loading_step_for(Duration::from_millis(1199)), 0);
    assert_eq!(loading_step_for(Duration::from_millis(1200)), 1);
    assert_eq!(loading_step_for(Duration::from_secs(4)), 3);
    assert_eq!(loading_step_for(Duration::from_secs(60)), LOADING_STEPS.len() - 1);
}

#[test]
fn console_log_is_bounded() {
    let mut state = AppState::new();
    for i in 0..250 {
        apply_delta(&mut state, Delta::Log(format!("[INFO] {i}")));
    }
    assert_eq!(state.logs.len(), 200);
    assert_eq!(state.logs.front().map(String::as_str), Some("[INFO] 50"));
}
