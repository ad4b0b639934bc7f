//! AI reading of documents through the Gemini `generateContent` API.
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::GeminiConfig;

/// Number of characters of a document sent to the model.
pub const PROMPT_CHAR_LIMIT: usize = 5000;

/// Harm categories relaxed for study material, which routinely discusses
/// medicine, history and crime.
const RELAXED_HARM_CATEGORIES: &[&str] = &[
    "HARM_CATEGORY_HARASSMENT",
    "HARM_CATEGORY_HATE_SPEECH",
    "HARM_CATEGORY_SEXUALLY_EXPLICIT",
    "HARM_CATEGORY_DANGEROUS_CONTENT",
];

/// Generates text from a prompt.
#[async_trait]
pub trait Generator: Send + Sync {
    /// Run `prompt` through the model and return its answer.
    ///
    /// # Errors
    /// Errors on transport failures, rejected requests and malformed responses.
    async fn generate(&self, prompt: &str) -> anyhow::Result<String>;
}

/// What the model should do with a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReadMode {
    /// Concise summary.
    #[default]
    Summary,
    /// Plain-language explanation.
    Explain,
    /// Numbered key points.
    KeyPoints,
    /// A handful of quiz questions with answers.
    Quiz,
}

impl ReadMode {
    /// Parse a requested mode. Unknown or missing modes read as a summary.
    #[must_use]
    pub fn parse(mode: Option<&str>) -> Self {
        match mode {
            Some("explain") => Self::Explain,
            Some("key_points") => Self::KeyPoints,
            Some("quiz") => Self::Quiz,
            _ => Self::Summary,
        }
    }
}

/// The first [`PROMPT_CHAR_LIMIT`] characters of `text`.
#[must_use]
pub fn truncate_chars(text: &str) -> &str {
    text.char_indices()
        .nth(PROMPT_CHAR_LIMIT)
        .map_or(text, |(index, _)| &text[..index])
}

/// Build the prompt for `mode` around the beginning of `text`.
#[must_use]
pub fn build_prompt(mode: ReadMode, text: &str, language: &str) -> String {
    let chunk = truncate_chars(text);
    let (instructions, heading) = match mode {
        ReadMode::Summary => (
            "Please provide a concise summary of the following document content.\n\
             Make it clear, well-structured, and easy to understand. Include the main points and key takeaways.",
            "Summary:",
        ),
        ReadMode::Explain => (
            "Please explain the following document content in simple, easy-to-understand language.\n\
             Break down complex concepts and provide examples where helpful.",
            "Explanation:",
        ),
        ReadMode::KeyPoints => (
            "Extract and list the key points and main ideas from the following document.\n\
             Format them as a clear, numbered list with brief explanations.",
            "Key Points:",
        ),
        ReadMode::Quiz => (
            "Based on the following document, create 3-5 interesting quiz questions that test understanding.\n\
             Format as: Question 1: [question]\\nAnswer: [answer]\\n",
            "Quiz Questions:",
        ),
    };
    let language_line = if language.eq_ignore_ascii_case("en") {
        String::new()
    } else {
        format!("\nRespond in the language with code '{language}'.")
    };
    format!("{instructions}{language_line}\n\nDocument:\n{chunk}\n\n{heading}")
}

/// Client for the Gemini REST API.
#[derive(Debug, Clone)]
pub struct GeminiClient {
    /// HTTP client with the configured timeout.
    client: reqwest::Client,
    /// Server-side API key.
    api_key: String,
    /// Model name.
    model: String,
    /// Base URL of the REST API.
    base_url: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    contents: Vec<RequestContent<'a>>,
    safety_settings: Vec<SafetySetting<'a>>,
}

#[derive(Serialize)]
struct RequestContent<'a> {
    parts: Vec<RequestPart<'a>>,
}

#[derive(Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Serialize)]
struct SafetySetting<'a> {
    category: &'a str,
    threshold: &'a str,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<ResponseContent>,
}

#[derive(Deserialize)]
struct ResponseContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

impl GenerateResponse {
    /// Concatenated text of the first candidate.
    fn text(self) -> Option<String> {
        let content = self.candidates.into_iter().next()?.content?;
        let text: String = content
            .parts
            .into_iter()
            .filter_map(|part| part.text)
            .collect();
        (!text.trim().is_empty()).then_some(text)
    }
}

impl GeminiClient {
    /// Build a client from configuration. Returns `None` when no key is set.
    ///
    /// # Errors
    /// Errors if the HTTP client cannot be constructed.
    pub fn from_config(config: &GeminiConfig) -> anyhow::Result<Option<Self>> {
        let Some(api_key) = config
            .api_key
            .as_deref()
            .filter(|key| !key.trim().is_empty())
        else {
            return Ok(None);
        };
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Some(Self {
            client,
            api_key: api_key.to_owned(),
            model: config.model.clone(),
            base_url: config.base_url.trim_end_matches('/').to_owned(),
        }))
    }
}

#[async_trait]
impl Generator for GeminiClient {
    #[tracing::instrument(name = "Calling Gemini", skip(self, prompt), fields(model = %self.model))]
    async fn generate(&self, prompt: &str) -> anyhow::Result<String> {
        let url = format!("{}/v1beta/models/{}:generateContent", self.base_url, self.model);
        let body = GenerateRequest {
            contents: vec![RequestContent {
                parts: vec![RequestPart { text: prompt }],
            }],
            safety_settings: RELAXED_HARM_CATEGORIES
                .iter()
                .map(|&category| SafetySetting {
                    category,
                    threshold: "BLOCK_NONE",
                })
                .collect(),
        };
        let response = self
            .client
            .post(url)
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|err| anyhow::anyhow!("request failed: {err}"))?
            .error_for_status()
            .map_err(|err| anyhow::anyhow!("request rejected: {err}"))?;
        let parsed = response
            .json::<GenerateResponse>()
            .await
            .map_err(|err| anyhow::anyhow!("malformed response: {err}"))?;
        parsed
            .text()
            .ok_or_else(|| anyhow::anyhow!("the model returned no text"))
    }
}
