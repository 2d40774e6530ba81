//! Model gateway: turns a conversation context into a chat-completion call.

use std::time::Duration;

use async_openai::{
    config::OpenAIConfig,
    types::{
        ChatCompletionRequestAssistantMessageArgs, ChatCompletionRequestMessage,
        ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs,
    },
    Client,
};
use async_trait::async_trait;
use tracing::info;

use crate::config::BotConfig;
use crate::context::{Role, Turn};
use crate::error::{BotError, Result};

/// Invokes the external model with an ordered turn list and a model id,
/// returning the generated text.
#[async_trait]
pub trait ModelGateway: Send + Sync {
    async fn call(&self, turns: &[Turn], model: &str) -> Result<String>;
}

/// [`ModelGateway`] backed by async-openai against an OpenAI-compatible
/// endpoint. Every call carries a fixed output-token cap and a timeout; an
/// expired timeout surfaces as a model-call error like any other API failure.
pub struct OpenAiGateway {
    client: Client<OpenAIConfig>,
    max_tokens: u32,
    timeout: Duration,
}

impl OpenAiGateway {
    pub fn new(config: &BotConfig) -> Self {
        let api_config = OpenAIConfig::new()
            .with_api_key(config.api_key.clone())
            .with_api_base(config.api_base_url.trim_end_matches('/').to_string());
        Self {
            client: Client::with_config(api_config),
            max_tokens: config.max_tokens,
            timeout: Duration::from_secs(config.model_timeout_secs),
        }
    }
}

fn to_request_messages(turns: &[Turn]) -> Result<Vec<ChatCompletionRequestMessage>> {
    turns
        .iter()
        .map(|turn| {
            let message = match turn.role {
                Role::User => ChatCompletionRequestUserMessageArgs::default()
                    .content(turn.content.clone())
                    .build()
                    .map(ChatCompletionRequestMessage::from),
                Role::Assistant => ChatCompletionRequestAssistantMessageArgs::default()
                    .content(turn.content.clone())
                    .build()
                    .map(ChatCompletionRequestMessage::from),
            };
            message.map_err(|e| BotError::ModelCall(e.to_string()))
        })
        .collect()
}

#[async_trait]
impl ModelGateway for OpenAiGateway {
    async fn call(&self, turns: &[Turn], model: &str) -> Result<String> {
        let messages = to_request_messages(turns)?;

        info!(
            model = %model,
            message_count = messages.len(),
            "Chat completion request"
        );

        let request = CreateChatCompletionRequestArgs::default()
            .model(model)
            .messages(messages)
            .max_tokens(self.max_tokens)
            .build()
            .map_err(|e| BotError::ModelCall(e.to_string()))?;

        let response = tokio::time::timeout(self.timeout, self.client.chat().create(request))
            .await
            .map_err(|_| {
                BotError::ModelCall(format!("timed out after {}s", self.timeout.as_secs()))
            })?
            .map_err(|e| BotError::ModelCall(e.to_string()))?;

        if let Some(ref usage) = response.usage {
            info!(
                prompt_tokens = usage.prompt_tokens,
                completion_tokens = usage.completion_tokens,
                "Chat completion usage"
            );
        }

        Ok(response
            .choices
            .first()
            .and_then(|choice| choice.message.content.clone())
            .unwrap_or_default())
    }
}
