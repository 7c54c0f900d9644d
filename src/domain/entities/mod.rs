mod chat;
mod credential;
mod persona;

pub use chat::{ChatCompletion, ChatMessage, ChatRequest, ChatRole, Choice};
pub use credential::Credential;
pub use persona::{PersonaPrompt, RAPBOT_PROMPT};
