use std::error::Error as StdError;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ChatError {
    #[error("Missing API key.")]
    MissingApiKey,

    #[error("Input text is empty.")]
    EmptyInput,

    /// Reserved; no code path raises it.
    #[error("OpenAI response is empty.")]
    EmptyResponse,

    #[error("API Key provided is invalid or does not match")]
    InvalidApiKey,

    #[error("environment variable not set: {key}")]
    EnvironmentVariableNotSet { key: String },

    #[error("The API call returned without any content. Please try again.")]
    NoResponseContent,

    #[error(transparent)]
    Upstream(#[from] UpstreamError),
}

impl ChatError {
    pub fn env_not_set(key: impl Into<String>) -> Self {
        Self::EnvironmentVariableNotSet { key: key.into() }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::MissingApiKey => "missing_api_key",
            Self::EmptyInput => "empty_input",
            Self::EmptyResponse => "empty_response",
            Self::InvalidApiKey => "invalid_api_key",
            Self::EnvironmentVariableNotSet { .. } => "environment_variable_not_set",
            Self::NoResponseContent => "no_response_content",
            Self::Upstream(_) => "upstream",
        }
    }
}

/// Construction failures share the chat taxonomy.
pub type InitError = ChatError;

/// A failure raised by the remote completion client.
///
/// Displays the underlying error's message unchanged and keeps it as the source.
#[derive(Error, Debug)]
#[error("{inner}")]
pub struct UpstreamError {
    #[source]
    inner: Box<dyn StdError + Send + Sync + 'static>,
}

impl UpstreamError {
    pub fn new<E>(err: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        Self {
            inner: Box::new(err),
        }
    }

    pub fn msg(message: impl Into<String>) -> Self {
        let message: String = message.into();
        Self {
            inner: message.into(),
        }
    }

    pub fn downcast_ref<E: StdError + 'static>(&self) -> Option<&E> {
        self.inner.downcast_ref::<E>()
    }
}

pub type Result<T> = std::result::Result<T, ChatError>;
