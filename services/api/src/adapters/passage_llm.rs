//! services/api/src/adapters/passage_llm.rs
//!
//! This module contains the adapter for the passage-generating LLM.
//! It implements the `PassageGenerationService` port from the `core` crate.

use std::sync::LazyLock;

use assessment_core::{
    domain::{GeneratedPassage, PassageRequest},
    ports::{PassageGenerationService, PortError, PortResult},
};
use async_openai::{
    config::OpenAIConfig,
    error::OpenAIError,
    types::chat::{
        ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
        ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs,
    },
    Client,
};
use async_trait::async_trait;
use regex::Regex;
use tracing::debug;

const SYSTEM_INSTRUCTIONS: &str = r#"You write short reading passages for spoken language-proficiency assessments.

Rules:
- Write natural, everyday prose entirely in the requested language and its usual script.
- 150 to 200 words, 2 or 3 paragraphs, on a neutral general-interest topic.
- No lists, no headings, no dialogue, no translations.
- Give the passage a short title in the same language.
- Estimate how many seconds an average speaker needs to read it aloud.

Respond with ONLY a JSON object of this exact shape:
{"text": "...", "title": "...", "estimatedDuration": 60}"#;

const USER_INPUT_TEMPLATE: &str = r#"Language: {language_name} (ISO code "{language_code}")
{variation}"#;

/// Matches the outermost JSON object in a response, even when wrapped in prose or code fences.
static JSON_OBJECT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)\{.*\}").expect("static regex is valid")
});

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements `PassageGenerationService` using an OpenAI-compatible LLM.
#[derive(Clone)]
pub struct OpenAiPassageAdapter {
    client: Client<OpenAIConfig>,
    model: String,
}

impl OpenAiPassageAdapter {
    /// Creates a new `OpenAiPassageAdapter`.
    pub fn new(client: Client<OpenAIConfig>, model: String) -> Self {
        Self { client, model }
    }

    fn user_input(request: &PassageRequest) -> String {
        let variation = if request.regenerate {
            "Write a different passage on a new topic."
        } else {
            "Write a passage."
        };
        USER_INPUT_TEMPLATE
            .replace("{language_name}", &request.language_name)
            .replace("{language_code}", request.language_code.as_str())
            .replace("{variation}", variation)
    }

    /// Pulls the `{text, title, estimatedDuration}` object out of the model's answer.
    fn parse_passage(raw: &str) -> PortResult<GeneratedPassage> {
        let json = JSON_OBJECT
            .find(raw)
            .map(|m| m.as_str())
            .ok_or_else(|| {
                PortError::InvalidResponse("Passage LLM response contained no JSON object.".to_string())
            })?;

        serde_json::from_str::<GeneratedPassage>(json)
            .map_err(|e| PortError::InvalidResponse(format!("Malformed passage JSON: {}", e)))
    }
}

//=========================================================================================
// `PassageGenerationService` Trait Implementation
//=========================================================================================

#[async_trait]
impl PassageGenerationService for OpenAiPassageAdapter {
    async fn generate_passage(&self, request: &PassageRequest) -> PortResult<GeneratedPassage> {
        let messages: Vec<ChatCompletionRequestMessage> = vec![
            ChatCompletionRequestSystemMessageArgs::default()
                .content(SYSTEM_INSTRUCTIONS)
                .build()
                .map_err(|e| PortError::Unexpected(e.to_string()))?
                .into(),
            ChatCompletionRequestUserMessageArgs::default()
                .content(Self::user_input(request))
                .build()
                .map_err(|e| PortError::Unexpected(e.to_string()))?
                .into(),
        ];

        // Regeneration runs hotter so the new passage is noticeably different.
        let temperature: f32 = if request.regenerate { 1.0 } else { 0.7 };

        let request_body = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(messages)
            .temperature(temperature)
            .build()
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        let response = self
            .client
            .chat()
            .create(request_body)
            .await
            .map_err(|e: OpenAIError| PortError::Unexpected(e.to_string()))?;

        let content = response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| {
                PortError::InvalidResponse("Passage LLM returned no content.".to_string())
            })?;

        debug!(
            "Passage LLM answered {} bytes for '{}'",
            content.len(),
            request.language_code
        );
        Self::parse_passage(&content)
    }
}
