use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::{ChatCompletion, ChatError, ChatRequest, Credential, UpstreamError};

/// Remote chat-completion endpoint.
///
/// Implementations are shared across overlapping calls and must not hold
/// per-call mutable state.
#[async_trait]
pub trait ChatCompletionClient: Send + Sync {
    async fn complete(&self, request: &ChatRequest) -> Result<ChatCompletion, UpstreamError>;
}

/// Builds a client authenticated with the given bearer token.
pub trait ClientFactory: Send + Sync {
    fn connect(&self, credential: &Credential) -> Result<Arc<dyn ChatCompletionClient>, ChatError>;
}
