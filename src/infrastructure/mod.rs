pub mod config;
pub mod llm;

pub use config::{AppConfig, ConfigError, EnvConfigSource, MapConfigSource};
pub use llm::{OpenAiChatClient, OpenAiConnector};
