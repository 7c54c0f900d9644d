mod chat_completion;
mod config;

pub use chat_completion::{ChatCompletionClient, ClientFactory};
pub use config::ConfigSource;
