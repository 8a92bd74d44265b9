//! Provider-backed personas

use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, trace};

use selfcall_provider::{ChatParams, Provider};

use crate::persona::{Persona, PersonaContext, PersonaInvoker};
use crate::prompts::PromptBuilder;
use crate::AgentError;

/// Default ceiling for one persona call
pub const DEFAULT_PERSONA_TIMEOUT: Duration = Duration::from_secs(60);

/// Voices every persona through one chat-completion provider
pub struct LlmPersonas<P: Provider> {
    provider: P,
    prompts: PromptBuilder,
    model: String,
    max_tokens: u32,
    temperature: f32,
    timeout: Duration,
}

impl<P: Provider> LlmPersonas<P> {
    pub fn new(provider: P, prompts: PromptBuilder) -> Self {
        let defaults = ChatParams::default();
        Self {
            model: provider.default_model(),
            provider,
            prompts,
            max_tokens: defaults.max_tokens,
            temperature: defaults.temperature,
            timeout: DEFAULT_PERSONA_TIMEOUT,
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_sampling(mut self, max_tokens: u32, temperature: f32) -> Self {
        self.max_tokens = max_tokens;
        self.temperature = temperature;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl<P: Provider> PersonaInvoker for LlmPersonas<P> {
    async fn invoke(&self, persona: Persona, ctx: PersonaContext<'_>) -> crate::Result<String> {
        let params = ChatParams {
            max_tokens: self.max_tokens,
            temperature: self.temperature,
            ..ChatParams::for_model(
                self.model.clone(),
                self.prompts.build_messages(persona, &ctx).await,
            )
        };
        trace!("{} prompt: {:?}", persona, params.messages);

        let response = tokio::time::timeout(self.timeout, self.provider.chat(params))
            .await
            .map_err(|_| AgentError::Timeout {
                persona,
                after: self.timeout,
            })??;

        debug!(
            "{} replied ({}, {} tokens)",
            persona, response.finish_reason, response.usage.total_tokens
        );

        response
            .text_content()
            .map(str::to_string)
            .ok_or_else(|| AgentError::Malformed {
                persona,
                reason: format!("no text in completion ({})", response.finish_reason),
            })
    }
}
