use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use serde::Deserialize;

use crate::application::services::{ChatSettings, DEFAULT_CREDENTIAL_KEY, DEFAULT_MODEL};
use crate::domain::{ports::ConfigSource, PersonaPrompt, RAPBOT_PROMPT};

pub const DEFAULT_CONFIG_PATH: &str = "config/app.yaml";
pub const DEFAULT_PERSONA: &str = "rapbot";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },
    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: String,
        source: serde_yaml::Error,
    },
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Reads configuration values from the process environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvConfigSource;

impl ConfigSource for EnvConfigSource {
    fn get(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

/// Fixed in-memory configuration values.
#[derive(Debug, Clone, Default)]
pub struct MapConfigSource {
    values: HashMap<String, String>,
}

impl MapConfigSource {
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.insert(key.into(), value.into());
        self
    }
}

impl ConfigSource for MapConfigSource {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub llm: LlmConfig,
    pub cors: CorsConfig,
    pub default_persona: String,
    pub personas: BTreeMap<String, PersonaConfig>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    pub model: String,
    pub api_base: Option<String>,
    pub credential_key: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CorsConfig {
    pub allowed_origins: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PersonaConfig {
    pub name: String,
    pub prompt: String,
    #[serde(default)]
    pub model: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            api_base: None,
            credential_key: DEFAULT_CREDENTIAL_KEY.to_string(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            llm: LlmConfig::default(),
            cors: CorsConfig::default(),
            default_persona: DEFAULT_PERSONA.to_string(),
            personas: BTreeMap::new(),
        }
        .with_builtin_personas()
    }
}

impl AppConfig {
    /// Loads YAML from `path`. A missing file yields the defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let shown = path.display().to_string();

        if !path.exists() {
            tracing::info!(path = %shown, "config file not found, using defaults");
            return Ok(Self::default());
        }

        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: shown.clone(),
            source,
        })?;
        Self::from_yaml(&raw).map_err(|e| match e {
            ConfigError::Parse { source, .. } => ConfigError::Parse {
                path: shown,
                source,
            },
            other => other,
        })
    }

    pub fn from_yaml(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(raw).map_err(|source| ConfigError::Parse {
            path: "<inline>".to_string(),
            source,
        })?;
        let config = config.with_builtin_personas();
        config.validate()?;
        Ok(config)
    }

    /// Applies `SERVER_HOST` / `SERVER_PORT` from `source` over the file values.
    pub fn with_overrides(mut self, source: &dyn ConfigSource) -> Result<Self, ConfigError> {
        if let Some(host) = source.get("SERVER_HOST") {
            self.server.host = host;
        }
        if let Some(port) = source.get("SERVER_PORT") {
            self.server.port = port
                .parse()
                .map_err(|_| ConfigError::Invalid(format!("SERVER_PORT is not a port: {port}")))?;
        }
        Ok(self)
    }

    /// Construction settings for every configured persona, keyed by preset id.
    pub fn chat_settings(&self) -> BTreeMap<String, ChatSettings> {
        self.personas
            .iter()
            .map(|(id, persona)| {
                let settings =
                    ChatSettings::new(PersonaPrompt::new(&persona.name, &persona.prompt))
                        .with_model(persona.model.as_deref().unwrap_or(&self.llm.model))
                        .with_credential_key(&self.llm.credential_key);
                (id.clone(), settings)
            })
            .collect()
    }

    fn with_builtin_personas(mut self) -> Self {
        self.personas
            .entry(DEFAULT_PERSONA.to_string())
            .or_insert_with(|| PersonaConfig {
                name: PersonaPrompt::rapbot().name().to_string(),
                prompt: RAPBOT_PROMPT.to_string(),
                model: None,
            });
        self
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if !self.personas.contains_key(&self.default_persona) {
            return Err(ConfigError::Invalid(format!(
                "default_persona '{}' is not a configured persona",
                self.default_persona
            )));
        }
        if let Some((id, _)) = self.personas.iter().find(|(_, p)| p.prompt.trim().is_empty()) {
            return Err(ConfigError::Invalid(format!("persona '{id}' has an empty prompt")));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.llm.model, "gpt-5");
        assert_eq!(config.llm.credential_key, "OPEN_API_KEY");
        assert_eq!(config.default_persona, "rapbot");

        let settings = config.chat_settings();
        let rapbot = &settings["rapbot"];
        assert_eq!(rapbot.persona, PersonaPrompt::rapbot());
        assert_eq!(rapbot.model, "gpt-5");
    }

    #[test]
    fn test_yaml_personas_and_model_override() {
        let raw = r#"
llm:
  model: gpt-4o
personas:
  poet:
    name: Verse Bot
    prompt: Answer in a haiku.
    model: gpt-4o-mini
"#;
        let config = AppConfig::from_yaml(raw).unwrap();
        let settings = config.chat_settings();

        assert_eq!(settings.len(), 2);
        assert_eq!(settings["poet"].persona.prompt(), "Answer in a haiku.");
        assert_eq!(settings["poet"].model, "gpt-4o-mini");
        assert_eq!(settings["rapbot"].model, "gpt-4o");
    }

    #[test]
    fn test_unknown_default_persona_is_rejected() {
        let err = AppConfig::from_yaml("default_persona: ghost\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_empty_prompt_is_rejected() {
        let raw = "personas:\n  blank:\n    name: Blank\n    prompt: '  '\n";
        assert!(matches!(AppConfig::from_yaml(raw), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_load_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig::load(dir.path().join("absent.yaml")).unwrap();
        assert!(config.personas.contains_key("rapbot"));
    }

    #[test]
    fn test_load_reports_path_on_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("app.yaml");
        std::fs::write(&path, "server: [not, a, map]\n").unwrap();

        let err = AppConfig::load(&path).unwrap_err();
        assert!(err.to_string().contains("app.yaml"));
    }

    #[test]
    fn test_env_overrides() {
        let source = MapConfigSource::default()
            .with("SERVER_HOST", "127.0.0.1")
            .with("SERVER_PORT", "9000");
        let config = AppConfig::default().with_overrides(&source).unwrap();
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 9000);

        let bad = MapConfigSource::default().with("SERVER_PORT", "eighty");
        assert!(AppConfig::default().with_overrides(&bad).is_err());
    }

    #[test]
    fn test_map_source_lookup() {
        let source = MapConfigSource::default().with("OPEN_API_KEY", "abc");
        assert_eq!(source.get("OPEN_API_KEY").as_deref(), Some("abc"));
        assert_eq!(source.get("MISSING"), None);
    }
}
