use crate::{
    config::Config,
    constants::{GEMINI_API_URL, GEMINI_API_VERSION},
    context::SystemInstruction,
    errors::{ConsejeroError, ConsejeroResult},
    logging::log_api_call,
    models::{
        ApiCallLog, Content, ErrorEnvelope, GenerateContentRequest, GenerateContentResponse,
        GenerationConfig,
    },
};
use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use std::time::Instant;

/// The two operations the controller needs from a hosted model.
#[async_trait]
pub trait ModelService: Send + Sync {
    type Session: Send;

    /// Opens a conversation constrained by `instruction`.
    fn create(
        &self,
        api_key: &str,
        instruction: &SystemInstruction,
    ) -> ConsejeroResult<Self::Session>;

    /// Sends one user message and returns the reply text, if the service
    /// produced any.
    async fn send(&self, session: &mut Self::Session, text: &str)
        -> ConsejeroResult<Option<String>>;
}

/// Conversation state kept on the client: the instruction and every
/// completed turn, replayed with each request.
#[derive(Debug, Clone)]
pub struct GeminiSession {
    api_key: String,
    system_instruction: Content,
    history: Vec<Content>,
}

impl GeminiSession {
    pub fn history(&self) -> &[Content] {
        &self.history
    }
}

#[derive(Debug, Clone)]
pub struct GeminiService {
    client: Client,
    base_url: String,
    model: String,
    generation_config: GenerationConfig,
}

impl GeminiService {
    pub fn new(client: Client, model: impl Into<String>) -> Self {
        Self {
            client,
            base_url: GEMINI_API_URL.to_string(),
            model: model.into(),
            generation_config: GenerationConfig::default(),
        }
    }

    pub fn from_config(client: Client, config: &Config) -> Self {
        Self::new(client, config.model.clone())
            .with_base_url(config.api_base_url.clone())
            .with_generation_config(GenerationConfig {
                temperature: config.temperature,
                max_output_tokens: config.max_output_tokens,
            })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_generation_config(mut self, generation_config: GenerationConfig) -> Self {
        self.generation_config = generation_config;
        self
    }

    pub fn endpoint(&self) -> String {
        format!(
            "{}/{}/models/{}:generateContent",
            self.base_url, GEMINI_API_VERSION, self.model
        )
    }
}

#[async_trait]
impl ModelService for GeminiService {
    type Session = GeminiSession;

    fn create(
        &self,
        api_key: &str,
        instruction: &SystemInstruction,
    ) -> ConsejeroResult<GeminiSession> {
        if api_key.trim().is_empty() {
            return Err(ConsejeroError::config_error("API key is required"));
        }

        Ok(GeminiSession {
            api_key: api_key.to_string(),
            system_instruction: Content::text(None, instruction.as_str()),
            history: Vec::new(),
        })
    }

    async fn send(
        &self,
        session: &mut GeminiSession,
        text: &str,
    ) -> ConsejeroResult<Option<String>> {
        let mut contents = session.history.clone();
        contents.push(Content::user(text));

        let payload = GenerateContentRequest {
            system_instruction: session.system_instruction.clone(),
            contents: &contents,
            generation_config: (!self.generation_config.is_empty())
                .then(|| self.generation_config.clone()),
        };

        let endpoint = self.endpoint();
        let start_time = Instant::now();
        let response = self
            .client
            .post(&endpoint)
            .header("x-goog-api-key", &session.api_key)
            .json(&payload)
            .send()
            .await
            .map_err(|e| ConsejeroError::send_error(format!("Request failed: {}", e)))?;

        let status = response.status();
        log_api_call(&ApiCallLog {
            timestamp: Utc::now(),
            endpoint: format!("models/{}:generateContent", self.model),
            request_summary: format!("send_message (turn {})", session.history.len() / 2 + 1),
            response_status: status.as_u16(),
            response_time_ms: start_time.elapsed().as_millis(),
        });

        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            let detail = match serde_json::from_str::<ErrorEnvelope>(&error_text) {
                Ok(envelope) if !envelope.error.message.is_empty() => {
                    format!("{}: {}", envelope.error.status, envelope.error.message)
                }
                _ => error_text,
            };
            return Err(ConsejeroError::send_error(format!(
                "API returned error: {} - {}",
                status, detail
            )));
        }

        let body: GenerateContentResponse = response.json().await.map_err(|e| {
            ConsejeroError::send_error(format!("Failed to parse API response: {}", e))
        })?;

        if let Some(usage) = &body.usage_metadata {
            log::debug!(
                "Token usage: {} prompt, {} candidates",
                usage.prompt_token_count,
                usage.candidates_token_count
            );
        }

        // A turn without reply text is not replayable: the service rejects
        // empty parts, so neither side of it is kept.
        let reply = body.text();
        match reply.as_deref() {
            Some(reply_text) if !reply_text.is_empty() => {
                session.history.push(Content::user(text));
                session.history.push(Content::model(reply_text));
            }
            _ => log::warn!("Model returned no text; turn not kept in session history"),
        }

        Ok(reply)
    }
}
