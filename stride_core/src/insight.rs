//! Motivational insights from an external text-generation service.
//!
//! [`daily_insight`] always produces a message: service errors, timeouts and
//! empty replies turn into fixed fallback strings.

use crate::config::InsightConfig;
use crate::{Error, Result, UserProfile};
use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

/// Returned when the service answers with no text
pub const EMPTY_RESPONSE_FALLBACK: &str =
    "Keep moving! Every step counts towards a healthier you. 🏃‍♂️";

/// Returned when the service cannot be reached or fails
pub const ERROR_FALLBACK: &str = "Great job tracking your steps today! Keep it up! 💪";

/// Today's numbers sent to the service
#[derive(Clone, Debug, PartialEq)]
pub struct InsightRequest {
    pub steps: u64,
    pub calories: u64,
    pub profile: UserProfile,
}

impl InsightRequest {
    /// Coaching prompt for the text-generation model
    pub fn prompt(&self) -> String {
        format!(
            "You are an enthusiastic fitness coach named RoboFit.\n\
             \n\
             User Stats for today:\n\
             - Steps: {steps} / Goal: {goal}\n\
             - Calories Burned: {calories}\n\
             - User: {age} years old, {weight}kg.\n\
             \n\
             Task: Provide a ONE-SENTENCE, punchy, motivational insight or summary.\n\
             If they met the goal, celebrate wildly.\n\
             If they are close, push them.\n\
             If they are low, be gentle but encouraging.\n\
             Use emojis.",
            steps = self.steps,
            goal = self.profile.daily_step_goal,
            calories = self.calories,
            age = self.profile.age,
            weight = self.profile.weight,
        )
    }
}

/// Anything that can turn today's numbers into a short message
#[async_trait]
pub trait InsightGenerator: Send + Sync {
    async fn generate(&self, request: &InsightRequest) -> Result<String>;
}

/// Ask the generator for a message, substituting a fallback on any failure
pub async fn daily_insight<G>(generator: &G, request: &InsightRequest) -> String
where
    G: InsightGenerator + ?Sized,
{
    match generator.generate(request).await {
        Ok(text) if !text.trim().is_empty() => text.trim().to_string(),
        Ok(_) => {
            tracing::warn!("Insight service returned no text, using fallback");
            EMPTY_RESPONSE_FALLBACK.to_string()
        }
        Err(e) => {
            tracing::warn!("Insight request failed: {}", e);
            ERROR_FALLBACK.to_string()
        }
    }
}

// ============================================================================
// Gemini REST client
// ============================================================================

#[derive(Serialize)]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
}

#[derive(Serialize)]
struct Content<'a> {
    parts: Vec<RequestPart<'a>>,
}

#[derive(Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Deserialize, Default)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize, Default)]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
}

#[derive(Deserialize, Default)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Deserialize, Default)]
struct ResponsePart {
    #[serde(default)]
    text: Option<String>,
}

impl GenerateContentResponse {
    /// Concatenated text of the first candidate
    fn text(&self) -> String {
        self.candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .map(|content| {
                content
                    .parts
                    .iter()
                    .filter_map(|p| p.text.as_deref())
                    .collect::<String>()
            })
            .unwrap_or_default()
    }
}

/// Client for the Gemini `generateContent` endpoint using reqwest
#[derive(Clone, Debug)]
pub struct GeminiClient {
    base_url: String,
    model: String,
    api_key: SecretString,
    client: reqwest::Client,
}

impl GeminiClient {
    /// Build a client from configuration and an API key
    pub fn new(config: &InsightConfig, api_key: SecretString) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()?;
        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            api_key,
            client,
        })
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        )
    }
}

#[async_trait]
impl InsightGenerator for GeminiClient {
    async fn generate(&self, request: &InsightRequest) -> Result<String> {
        let prompt = request.prompt();
        let body = GenerateContentRequest {
            contents: vec![Content {
                parts: vec![RequestPart { text: &prompt }],
            }],
        };

        tracing::debug!("Requesting insight from model {}", self.model);
        let resp = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", self.api_key.expose_secret())
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            let snippet: String = body.chars().take(256).collect();
            return Err(Error::Other(format!(
                "insight service returned {}: {}",
                status.as_u16(),
                snippet
            )));
        }

        let parsed: GenerateContentResponse = resp.json().await?;
        Ok(parsed.text())
    }
}
