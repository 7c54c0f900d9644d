mod chat;

pub use chat::{ChatService, ChatSettings, DEFAULT_CREDENTIAL_KEY, DEFAULT_MODEL};
