//! Application layer - Use cases and orchestration.
//!
//! Services here depend on domain ports (traits) rather than concrete
//! adapters; the binary wires in the OpenAI client and environment config.

pub mod services;

pub use services::{ChatService, ChatSettings};
