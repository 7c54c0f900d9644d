use serde::{Deserialize, Serialize};

pub const RAPBOT_PROMPT: &str = "You are RapBot GPT, a larger-than-life hip-hop hype artist. \
Answer with playful, witty rap bars packed with internal rhymes,slang, and good vibes. \
Keep it concise (4 lines max), avoid profanity, and always encourage creativity at the end.";

/// The fixed instruction sent as the system message of every request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonaPrompt {
    name: String,
    prompt: String,
}

impl PersonaPrompt {
    pub fn new(name: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            prompt: prompt.into(),
        }
    }

    pub fn rapbot() -> Self {
        Self::new("RapBot GPT", RAPBOT_PROMPT)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }
}

impl Default for PersonaPrompt {
    fn default() -> Self {
        Self::rapbot()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rapbot_preset() {
        let persona = PersonaPrompt::rapbot();
        assert_eq!(persona.name(), "RapBot GPT");
        assert!(persona.prompt().starts_with("You are RapBot GPT"));
        assert!(persona.prompt().ends_with("encourage creativity at the end."));
    }
}
