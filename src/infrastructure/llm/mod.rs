mod openai;

pub use openai::{OpenAiChatClient, OpenAiConnector};
