//! services/api/src/adapters/language_llm.rs
//!
//! This module contains the adapter for the language-identification LLM.
//! It implements the `LanguageIdentificationService` port from the `core` crate.

use assessment_core::ports::{LanguageIdentificationService, PortError, PortResult};
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
use tracing::debug;

const SYSTEM_INSTRUCTIONS: &str = r#"You are a language expert. Given a language name or identifier, return ONLY the corresponding ISO 639-1 two-letter language code.
For example:
- "English" -> "en"
- "français" -> "fr"
- "中文" -> "zh"
- "العربية" -> "ar"
Return ONLY the two-letter code, nothing else."#;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements `LanguageIdentificationService` using an OpenAI-compatible LLM.
#[derive(Clone)]
pub struct OpenAiLanguageAdapter {
    client: Client<OpenAIConfig>,
    model: String,
}

impl OpenAiLanguageAdapter {
    /// Creates a new `OpenAiLanguageAdapter`.
    pub fn new(client: Client<OpenAIConfig>, model: String) -> Self {
        Self { client, model }
    }
}

//=========================================================================================
// `LanguageIdentificationService` Trait Implementation
//=========================================================================================

#[async_trait]
impl LanguageIdentificationService for OpenAiLanguageAdapter {
    /// Asks the model for the code of `descriptor`. The raw answer is returned;
    /// the resolver decides whether it is an acceptable code.
    async fn identify_language(&self, descriptor: &str) -> PortResult<String> {
        let messages: Vec<ChatCompletionRequestMessage> = vec![
            ChatCompletionRequestSystemMessageArgs::default()
                .content(SYSTEM_INSTRUCTIONS)
                .build()
                .map_err(|e| PortError::Unexpected(e.to_string()))?
                .into(),
            ChatCompletionRequestUserMessageArgs::default()
                .content(descriptor)
                .build()
                .map_err(|e| PortError::Unexpected(e.to_string()))?
                .into(),
        ];

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(messages)
            .temperature(0.1_f32)
            .build()
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e: OpenAIError| PortError::Unexpected(e.to_string()))?;

        let answer = response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| {
                PortError::InvalidResponse(
                    "Language identification LLM returned no content.".to_string(),
                )
            })?;

        debug!("Language identification for '{}' answered '{}'", descriptor, answer.trim());
        Ok(answer)
    }
}
