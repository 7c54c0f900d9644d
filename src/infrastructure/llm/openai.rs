use std::sync::Arc;
use std::time::Duration;

use async_openai::config::OpenAIConfig;
use async_openai::error::OpenAIError;
use async_openai::types::{
    ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
    CreateChatCompletionRequest, CreateChatCompletionRequestArgs, CreateChatCompletionResponse,
};
use async_openai::Client;
use async_trait::async_trait;
use tracing::debug;

use crate::domain::{
    ports::{ChatCompletionClient, ClientFactory},
    ChatCompletion, ChatError, ChatMessage, ChatRequest, ChatRole, Choice, Credential,
    UpstreamError,
};

/// Builds [`OpenAiChatClient`]s for a fixed API base.
#[derive(Debug, Clone, Default)]
pub struct OpenAiConnector {
    api_base: Option<String>,
}

impl OpenAiConnector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = Some(api_base.into());
        self
    }
}

impl ClientFactory for OpenAiConnector {
    fn connect(&self, credential: &Credential) -> Result<Arc<dyn ChatCompletionClient>, ChatError> {
        let mut config = OpenAIConfig::new().with_api_key(credential.expose());
        if let Some(base) = &self.api_base {
            config = config.with_api_base(base);
        }
        Ok(Arc::new(OpenAiChatClient::new(config)))
    }
}

/// Chat-completion client backed by `async-openai`.
///
/// Every request is attempted once; rate-limit and server errors come back as-is.
/// Does not derive Debug: the config holds the bearer token.
#[derive(Clone)]
pub struct OpenAiChatClient {
    client: Client<OpenAIConfig>,
}

impl OpenAiChatClient {
    pub fn new(config: OpenAIConfig) -> Self {
        Self {
            client: Client::with_config(config).with_backoff(single_attempt()),
        }
    }
}

fn single_attempt() -> backoff::ExponentialBackoff {
    backoff::ExponentialBackoffBuilder::new()
        .with_max_elapsed_time(Some(Duration::ZERO))
        .build()
}

#[async_trait]
impl ChatCompletionClient for OpenAiChatClient {
    async fn complete(&self, request: &ChatRequest) -> Result<ChatCompletion, UpstreamError> {
        let request = to_openai_request(request).map_err(UpstreamError::new)?;

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(UpstreamError::new)?;

        debug!(id = %response.id, choices = response.choices.len(), "chat completion received");
        Ok(from_openai_response(response))
    }
}

fn to_openai_message(message: &ChatMessage) -> Result<ChatCompletionRequestMessage, OpenAIError> {
    let content = message.content.as_str();
    Ok(match message.role {
        ChatRole::System => ChatCompletionRequestSystemMessageArgs::default()
            .content(content)
            .build()?
            .into(),
        ChatRole::User => ChatCompletionRequestUserMessageArgs::default()
            .content(content)
            .build()?
            .into(),
    })
}

pub(crate) fn to_openai_request(
    request: &ChatRequest,
) -> Result<CreateChatCompletionRequest, OpenAIError> {
    let messages = request
        .messages
        .iter()
        .map(to_openai_message)
        .collect::<Result<Vec<_>, _>>()?;

    CreateChatCompletionRequestArgs::default()
        .model(&request.model)
        .messages(messages)
        .build()
}

pub(crate) fn from_openai_response(response: CreateChatCompletionResponse) -> ChatCompletion {
    ChatCompletion::new(
        response
            .choices
            .into_iter()
            .map(|choice| Choice {
                content: choice.message.content,
            })
            .collect(),
    )
}
