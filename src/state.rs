use std::collections::{HashSet, VecDeque};
use std::time::{Duration, Instant};

use crate::model::{GenerationMode, MAX_MATCHES, Prediction};

pub const LOADING_STEPS: [&str; 5] = [
    "Connecting to live sports data feeds...",
    "Analyzing Head-to-Head records...",
    "Evaluating recent team form and injuries...",
    "Simulating match outcomes 10,000 times...",
    "Finalizing high-confidence selections...",
];
pub const LOADING_STEP_INTERVAL: Duration = Duration::from_millis(1200);
const MAX_LOGS: usize = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PredictionState {
    #[default]
    Idle,
    Loading,
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum InputMode {
    #[default]
    Normal,
    AddingMatch { buffer: String },
}

#[derive(Debug, Clone)]
pub enum ProviderCommand {
    Generate {
        mode: GenerationMode,
        custom_matches: Vec<String>,
    },
}

#[derive(Debug, Clone)]
pub enum Delta {
    SetPredictions {
        mode: GenerationMode,
        predictions: Vec<Prediction>,
    },
    GenerationFailed {
        mode: GenerationMode,
        message: String,
    },
    Log(String),
}

#[derive(Debug, Clone, Default)]
pub struct AppState {
    pub status: PredictionState,
    pub mode: GenerationMode,
    pub predictions: Vec<Prediction>,
    pub error: Option<String>,
    pub selected: usize,
    pub expanded: HashSet<String>,
    pub custom_matches: Vec<String>,
    pub input: InputMode,
    pub loading_started: Option<Instant>,
    pub logs: VecDeque<String>,
    pub help_overlay: bool,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    /// `None` while a request is already in flight.
    pub fn begin_generation(&mut self, mode: GenerationMode) -> Option<ProviderCommand> {
        if self.status == PredictionState::Loading {
            self.push_log("[INFO] Analysis already running");
            return None;
        }
        self.status = PredictionState::Loading;
        self.mode = mode;
        self.error = None;
        self.loading_started = Some(Instant::now());
        let custom_matches = match mode {
            GenerationMode::Standard => self.custom_matches.clone(),
            GenerationMode::Sniper => Vec::new(),
        };
        Some(ProviderCommand::Generate {
            mode,
            custom_matches,
        })
    }

    /// Re-issues the last mode, from either the error or the results screen.
    pub fn retry_command(&mut self) -> Option<ProviderCommand> {
        match self.status {
            PredictionState::Error | PredictionState::Success => self.begin_generation(self.mode),
            PredictionState::Idle | PredictionState::Loading => None,
        }
    }

    pub fn back_to_idle(&mut self) {
        if self.status == PredictionState::Loading {
            return;
        }
        self.status = PredictionState::Idle;
        self.error = None;
    }

    pub fn loading_step(&self, now: Instant) -> usize {
        let elapsed = self
            .loading_started
            .map(|started| now.saturating_duration_since(started))
            .unwrap_or_default();
        loading_step_for(elapsed)
    }

    pub fn selected_prediction(&self) -> Option<&Prediction> {
        self.predictions.get(self.selected)
    }

    pub fn select_next(&mut self) {
        if self.selected + 1 < self.predictions.len() {
            self.selected += 1;
        }
    }

    pub fn select_prev(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    pub fn toggle_expanded(&mut self) {
        let Some(id) = self.selected_prediction().map(|p| p.id.clone()) else {
            return;
        };
        if !self.expanded.remove(&id) {
            self.expanded.insert(id);
        }
    }

    pub fn is_expanded(&self, id: &str) -> bool {
        self.expanded.contains(id)
    }

    pub fn add_custom_match(&mut self, raw: &str) -> bool {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return false;
        }
        if self.custom_matches.len() >= MAX_MATCHES {
            self.push_log(format!("[WARN] At most {MAX_MATCHES} custom matches"));
            return false;
        }
        self.custom_matches.push(trimmed.to_string());
        self.push_log(format!("[INFO] Added match: {trimmed}"));
        true
    }

    pub fn clear_custom_matches(&mut self) {
        if !self.custom_matches.is_empty() {
            self.custom_matches.clear();
            self.push_log("[INFO] Custom matches cleared");
        }
    }

    pub fn push_log(&mut self, msg: impl Into<String>) {
        self.logs.push_back(msg.into());
        while self.logs.len() > MAX_LOGS {
            self.logs.pop_front();
        }
    }
}

/// Advances one step per interval and holds on the last one.
pub fn loading_step_for(elapsed: Duration) -> usize {
    let step = elapsed.as_millis() / LOADING_STEP_INTERVAL.as_millis();
    (step as usize).min(LOADING_STEPS.len() - 1)
}

pub fn apply_delta(state: &mut AppState, delta: Delta) {
    match delta {
        Delta::SetPredictions { mode, predictions } => {
            state.mode = mode;
            state.predictions = predictions;
            state.selected = 0;
            state.expanded.clear();
            state.error = None;
            state.loading_started = None;
            state.status = PredictionState::Success;
        }
        Delta::GenerationFailed { mode, message } => {
            state.mode = mode;
            state.error = Some(message);
            state.loading_started = None;
            state.status = PredictionState::Error;
        }
        Delta::Log(msg) => state.push_log(msg),
    }
}
