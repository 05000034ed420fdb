use serde::{Deserialize, Serialize};

pub const DEFAULT_CONFIDENCE: i32 = 85;
pub const MAX_MATCHES: usize = 4;
pub const MAX_GROUNDING_URLS: usize = 3;

/// One parsed match analysis, as rendered on a card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Prediction {
    pub id: String,
    pub league: String,
    pub home_team: String,
    pub away_team: String,
    pub match_time: String,
    pub prediction_market: String,
    pub confidence: i32,
    pub reasoning: String,
    pub h2h_summary: String,
    pub standings_summary: String,
    pub grounding_urls: Vec<String>,
}

impl Prediction {
    pub fn market(&self) -> Option<PredictionMarket> {
        PredictionMarket::from_label(&self.prediction_market)
    }

    pub fn tier(&self) -> ConfidenceTier {
        ConfidenceTier::from_confidence(self.confidence)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PredictionMarket {
    HomeWin,
    AwayWin,
    HomeOrDraw,
    AwayOrDraw,
    Over15Goals,
    Over25Goals,
    Under35Goals,
    HomeWinEitherHalf,
    AwayWinEitherHalf,
    BothTeamsToScore,
    FirstHalfNilNil,
}

impl PredictionMarket {
    pub const ALL: [PredictionMarket; 11] = [
        PredictionMarket::HomeWin,
        PredictionMarket::AwayWin,
        PredictionMarket::HomeOrDraw,
        PredictionMarket::AwayOrDraw,
        PredictionMarket::Over15Goals,
        PredictionMarket::Over25Goals,
        PredictionMarket::Under35Goals,
        PredictionMarket::HomeWinEitherHalf,
        PredictionMarket::AwayWinEitherHalf,
        PredictionMarket::BothTeamsToScore,
        PredictionMarket::FirstHalfNilNil,
    ];

    // Labels are what the model is asked to emit, casing included.
    pub fn label(self) -> &'static str {
        match self {
            PredictionMarket::HomeWin => "Home win",
            PredictionMarket::AwayWin => "Away win",
            PredictionMarket::HomeOrDraw => "Home or Draw",
            PredictionMarket::AwayOrDraw => "Away or Draw",
            PredictionMarket::Over15Goals => "Over 1.5 Goals",
            PredictionMarket::Over25Goals => "Over 2.5 Goals",
            PredictionMarket::Under35Goals => "Under 3.5 Goals",
            PredictionMarket::HomeWinEitherHalf => "Home win either Half",
            PredictionMarket::AwayWinEitherHalf => "Away win Either Half",
            PredictionMarket::BothTeamsToScore => "Both teams to Score",
            PredictionMarket::FirstHalfNilNil => "First Half 0-0",
        }
    }

    pub fn from_label(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        Self::ALL
            .into_iter()
            .find(|market| market.label().eq_ignore_ascii_case(raw))
    }
}

/// Display bucket for a confidence score.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfidenceTier {
    Elite,
    Strong,
    Moderate,
}

impl ConfidenceTier {
    pub fn from_confidence(confidence: i32) -> Self {
        if confidence >= 90 {
            ConfidenceTier::Elite
        } else if confidence >= 80 {
            ConfidenceTier::Strong
        } else {
            ConfidenceTier::Moderate
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GenerationMode {
    #[default]
    Standard,
    Sniper,
}

impl GenerationMode {
    pub fn temperature(self) -> f32 {
        match self {
            GenerationMode::Standard => 0.4,
            GenerationMode::Sniper => 0.3,
        }
    }

    pub fn failure_message(self) -> &'static str {
        match self {
            GenerationMode::Standard => "Failed to generate predictions. Please try again.",
            GenerationMode::Sniper => "Failed to generate 0-0 predictions.",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            GenerationMode::Standard => "STANDARD",
            GenerationMode::Sniper => "SNIPER",
        }
    }
}
