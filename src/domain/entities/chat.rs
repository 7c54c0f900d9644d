use serde::{Deserialize, Serialize};

use super::PersonaPrompt;

/// One outgoing chat-completion call: the persona instruction followed by the user's text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
}

impl ChatRequest {
    pub fn for_persona(model: impl Into<String>, persona: &PersonaPrompt, text: &str) -> Self {
        Self {
            model: model.into(),
            messages: vec![
                ChatMessage::new(ChatRole::System, persona.prompt()),
                ChatMessage::new(ChatRole::User, text),
            ],
        }
    }

    pub fn user_message(&self) -> Option<&str> {
        self.messages
            .iter()
            .find(|m| m.role == ChatRole::User)
            .map(|m| m.content.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn new(role: ChatRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    System,
    User,
}

/// The part of a completion response the service consults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatCompletion {
    pub choices: Vec<Choice>,
}

impl ChatCompletion {
    pub fn new(choices: Vec<Choice>) -> Self {
        Self { choices }
    }

    pub fn with_reply(content: impl Into<String>) -> Self {
        Self::new(vec![Choice::new(content)])
    }

    /// Content of the first choice, if it carries any.
    pub fn first_content(&self) -> Option<&str> {
        self.choices.first()?.content.as_deref()
    }

    pub fn into_first_content(self) -> Option<String> {
        self.choices.into_iter().next()?.content
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Choice {
    pub content: Option<String>,
}

impl Choice {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
        }
    }

    pub fn empty() -> Self {
        Self { content: None }
    }
}
