// src/context.rs

//! Loads the knowledge document and turns it into the system instruction
//! that constrains the model's answers.

use crate::{
    constants::{DEFAULT_INSTITUTION, LOAD_FAILURE},
    errors::{ConsejeroError, ConsejeroResult},
};
use reqwest::Client;
use serde_json::Value;
use std::{fmt, path::PathBuf};

/// Where the knowledge document lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContextSource {
    Url(String),
    File(PathBuf),
}

impl ContextSource {
    pub fn parse(source: &str) -> Self {
        let source = source.trim();
        if source.starts_with("http://") || source.starts_with("https://") {
            ContextSource::Url(source.to_string())
        } else {
            ContextSource::File(PathBuf::from(source))
        }
    }
}

impl fmt::Display for ContextSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContextSource::Url(url) => write!(f, "{}", url),
            ContextSource::File(path) => write!(f, "{}", path.display()),
        }
    }
}

/// The fixed preamble plus the serialized document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SystemInstruction(String);

impl SystemInstruction {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SystemInstruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone)]
pub struct ContextLoader {
    client: Client,
    source: ContextSource,
    institution: String,
}

impl ContextLoader {
    pub fn new(client: Client, source: ContextSource) -> Self {
        Self {
            client,
            source,
            institution: DEFAULT_INSTITUTION.to_string(),
        }
    }

    pub fn with_institution(mut self, institution: impl Into<String>) -> Self {
        self.institution = institution.into();
        self
    }

    /// Fetches the document and builds the system instruction from it.
    /// Touches nothing but the document source, so retrying is safe.
    pub async fn load(&self) -> ConsejeroResult<SystemInstruction> {
        let document = self.fetch().await?;
        let context = serde_json::to_string_pretty(&document)?;
        log::debug!(
            "Loaded knowledge document from {} ({} bytes)",
            self.source,
            context.len()
        );
        Ok(build_system_instruction(&self.institution, &context))
    }

    async fn fetch(&self) -> ConsejeroResult<Value> {
        let body = match &self.source {
            ContextSource::Url(url) => {
                let response = self.client.get(url).send().await.map_err(|e| {
                    log::error!("Request for {} failed: {}", url, e);
                    ConsejeroError::load_error(LOAD_FAILURE)
                })?;

                let status = response.status();
                if !status.is_success() {
                    log::error!("{} returned {}", url, status);
                    return Err(ConsejeroError::load_error(LOAD_FAILURE));
                }

                response.text().await.map_err(|e| {
                    log::error!("Failed to read body from {}: {}", url, e);
                    ConsejeroError::load_error(LOAD_FAILURE)
                })?
            }
            ContextSource::File(path) => tokio::fs::read_to_string(path).await.map_err(|e| {
                log::error!("Failed to read {}: {}", path.display(), e);
                ConsejeroError::load_error(LOAD_FAILURE)
            })?,
        };

        serde_json::from_str(&body).map_err(|e| {
            ConsejeroError::load_error(format!("{} ({})", LOAD_FAILURE, e))
        })
    }
}

/// Interpolates the pretty-printed document into the answering rules.
pub fn build_system_instruction(institution: &str, context: &str) -> SystemInstruction {
    SystemInstruction(format!(
        "Eres un chatbot servicial y amigable del {institution}.\n\
         Tu objetivo es responder a las preguntas de los estudiantes actuales o potenciales.\n\
         Debes basar tus respuestas *únicamente* en la información proporcionada en los siguientes datos JSON.\n\
         No utilices ningún conocimiento externo ni inventes información.\n\
         Las respuestas pueden ser formulaciones con base en la información proporcionada de los datos JSON.\n\
         Si la respuesta a una pregunta no se encuentra en los datos proporcionados, debes indicar claramente que no dispones de esa información y sugerir que se pongan en contacto directamente con la universidad.\n\
         Aquí tienes la información de la universidad:\n\
         --- {context} ---"
    ))
}
