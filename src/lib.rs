//! Persona chat service: sends a user prompt behind a fixed persona
//! instruction to an OpenAI-compatible chat-completion endpoint and returns
//! the first reply.

pub mod api;
pub mod application;
pub mod domain;
pub mod infrastructure;
