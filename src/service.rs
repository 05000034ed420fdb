use anyhow::Result;
use chrono::{Local, NaiveDate};

use crate::gemini::{GenerationRequest, TextGenerator};
use crate::model::{GenerationMode, Prediction};
use crate::parser::{IdGenerator, parse_report};
use crate::prompt;

/// Everything one generation call produced.
#[derive(Debug, Clone)]
pub struct PredictionBatch {
    pub mode: GenerationMode,
    pub predictions: Vec<Prediction>,
    pub grounding_urls: Vec<String>,
    pub blocks_seen: usize,
    pub blocks_dropped: usize,
}

pub struct PredictionService<G, I> {
    generator: G,
    ids: I,
    search_grounding: bool,
    today: Option<NaiveDate>,
}

impl<G: TextGenerator, I: IdGenerator> PredictionService<G, I> {
    pub fn new(generator: G, ids: I) -> Self {
        Self {
            generator,
            ids,
            search_grounding: true,
            today: None,
        }
    }

    pub fn with_search_grounding(mut self, enabled: bool) -> Self {
        self.search_grounding = enabled;
        self
    }

    /// Pins the date written into prompts instead of the local clock.
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = Some(today);
        self
    }

    pub fn generate_predictions(&self, custom_matches: &[String]) -> Result<Vec<Prediction>> {
        self.generate(GenerationMode::Standard, custom_matches)
            .map(|batch| batch.predictions)
    }

    pub fn generate_zero_zero_predictions(&self) -> Result<Vec<Prediction>> {
        self.generate(GenerationMode::Sniper, &[])
            .map(|batch| batch.predictions)
    }

    /// Sniper mode ignores `custom_matches`.
    pub fn generate(
        &self,
        mode: GenerationMode,
        custom_matches: &[String],
    ) -> Result<PredictionBatch> {
        let request = self.request_for(mode, custom_matches);
        let generated = self
            .generator
            .generate(&request)
            .map_err(|err| err.context(mode.failure_message()))?;

        let report = parse_report(&generated.text, &generated.urls, &self.ids);
        Ok(PredictionBatch {
            mode,
            predictions: report.predictions,
            grounding_urls: generated.urls,
            blocks_seen: report.blocks_seen,
            blocks_dropped: report.blocks_dropped,
        })
    }

    pub fn request_for(&self, mode: GenerationMode, custom_matches: &[String]) -> GenerationRequest {
        let today = self.today.unwrap_or_else(|| Local::now().date_naive());
        let user_prompt = match mode {
            GenerationMode::Standard => prompt::standard_prompt(today, custom_matches),
            GenerationMode::Sniper => prompt::sniper_prompt(today),
        };
        GenerationRequest {
            system_instruction: prompt::system_instruction(),
            user_prompt,
            temperature: mode.temperature(),
            search_grounding: self.search_grounding,
        }
    }
}
