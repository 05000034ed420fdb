use anyhow::{Context, Result, anyhow};
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};

use crate::config::GeminiConfig;
use crate::http_client::build_http_client;

#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub system_instruction: String,
    pub user_prompt: String,
    pub temperature: f32,
    pub search_grounding: bool,
}

/// Raw model output plus the citation links it was grounded on.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GeneratedText {
    pub text: String,
    pub urls: Vec<String>,
}

pub trait TextGenerator {
    fn generate(&self, request: &GenerationRequest) -> Result<GeneratedText>;
}

pub struct GeminiClient {
    client: Client,
    endpoint: String,
    api_key: String,
}

impl GeminiClient {
    pub fn new(cfg: &GeminiConfig) -> Result<Self> {
        let api_key = cfg.require_api_key()?.to_string();
        let client = build_http_client(cfg.timeout_secs)?;
        Ok(Self {
            client,
            endpoint: cfg.endpoint(),
            api_key,
        })
    }
}

impl TextGenerator for GeminiClient {
    fn generate(&self, request: &GenerationRequest) -> Result<GeneratedText> {
        let body = GenerateBody::from_request(request);
        let resp = self
            .client
            .post(&self.endpoint)
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .context("gemini request failed")?;
        let status = resp.status();
        let raw = resp.text().context("failed reading gemini body")?;
        if !status.is_success() {
            let snippet = raw
                .trim()
                .replace(['\n', '\r'], " ")
                .chars()
                .take(220)
                .collect::<String>();
            return Err(anyhow!("gemini http {}: {}", status, snippet));
        }
        parse_generate_response_json(&raw)
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateBody<'a> {
    system_instruction: Content<'a>,
    contents: Vec<Content<'a>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<Tool>,
    generation_config: GenerationConfig,
}

impl<'a> GenerateBody<'a> {
    fn from_request(request: &'a GenerationRequest) -> Self {
        let tools = if request.search_grounding {
            vec![Tool {
                google_search: GoogleSearch {},
            }]
        } else {
            Vec::new()
        };
        Self {
            system_instruction: Content {
                role: None,
                parts: vec![Part {
                    text: &request.system_instruction,
                }],
            },
            contents: vec![Content {
                role: Some("user"),
                parts: vec![Part {
                    text: &request.user_prompt,
                }],
            }],
            tools,
            generation_config: GenerationConfig {
                temperature: request.temperature,
            },
        }
    }
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'static str>,
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
struct Tool {
    google_search: GoogleSearch,
}

#[derive(Debug, Serialize)]
struct GoogleSearch {}

#[derive(Debug, Serialize)]
struct GenerationConfig {
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
    #[serde(default)]
    grounding_metadata: Option<GroundingMetadata>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GroundingMetadata {
    #[serde(default)]
    grounding_chunks: Vec<GroundingChunk>,
}

#[derive(Debug, Deserialize)]
struct GroundingChunk {
    #[serde(default)]
    web: Option<WebChunk>,
}

#[derive(Debug, Deserialize)]
struct WebChunk {
    #[serde(default)]
    uri: Option<String>,
}

/// Text of the first candidate and its grounding URIs; a body with no candidates is empty, not an error.
pub fn parse_generate_response_json(raw: &str) -> Result<GeneratedText> {
    let resp: GenerateResponse = serde_json::from_str(raw).context("invalid gemini json")?;
    let Some(first) = resp.candidates.into_iter().next() else {
        return Ok(GeneratedText::default());
    };

    let text = first
        .content
        .map(|c| {
            c.parts
                .into_iter()
                .filter_map(|p| p.text)
                .collect::<String>()
        })
        .unwrap_or_default();

    let urls = first
        .grounding_metadata
        .map(|meta| {
            meta.grounding_chunks
                .into_iter()
                .filter_map(|chunk| chunk.web.and_then(|w| w.uri))
                .filter(|uri| !uri.is_empty())
                .collect::<Vec<_>>()
        })
        .unwrap_or_default();

    Ok(GeneratedText { text, urls })
}

#[cfg(test)]
mod tests {
    use super::{GenerateBody, GenerationRequest, parse_generate_response_json};

    fn request(search_grounding: bool) -> GenerationRequest {
        GenerationRequest {
            system_instruction: "sys".to_string(),
            user_prompt: "hello".to_string(),
            temperature: 0.3,
            search_grounding,
        }
    }

    #[test]
    fn body_matches_rest_shape() {
        let req = request(true);
        let value = serde_json::to_value(GenerateBody::from_request(&req)).expect("serializable");
        assert_eq!(value["systemInstruction"]["parts"][0]["text"], "sys");
        assert!(value["systemInstruction"].get("role").is_none());
        assert_eq!(value["contents"][0]["role"], "user");
        assert_eq!(value["contents"][0]["parts"][0]["text"], "hello");
        assert!(value["tools"][0]["google_search"].is_object());
        let temp = value["generationConfig"]["temperature"]
            .as_f64()
            .expect("temperature");
        assert!((temp - 0.3).abs() < 1e-6);
    }

    #[test]
    fn body_omits_tools_without_grounding() {
        let req = request(false);
        let value = serde_json::to_value(GenerateBody::from_request(&req)).expect("serializable");
        assert!(value.get("tools").is_none());
    }

    #[test]
    fn no_candidates_is_empty_text() {
        let out = parse_generate_response_json(r#"{"candidates":[]}"#).expect("valid");
        assert!(out.text.is_empty());
        assert!(out.urls.is_empty());
    }

    #[test]
    fn garbage_is_an_error() {
        assert!(parse_generate_response_json("<html>").is_err());
    }
}
