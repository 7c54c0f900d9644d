use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::{info, warn};

use crate::application::{ChatService, ChatSettings};
use crate::domain::ports::{ClientFactory, ConfigSource};
use crate::infrastructure::AppConfig;

/// A persona's service, or the reason it could not be constructed.
pub enum PersonaSlot {
    Ready(Arc<ChatService>),
    Unavailable {
        name: String,
        kind: &'static str,
        reason: String,
    },
}

impl PersonaSlot {
    pub fn name(&self) -> &str {
        match self {
            Self::Ready(service) => service.persona().name(),
            Self::Unavailable { name, .. } => name,
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready(_))
    }
}

/// One service per configured persona, built once at startup.
pub struct PersonaRegistry {
    default_id: String,
    slots: BTreeMap<String, PersonaSlot>,
}

impl PersonaRegistry {
    pub fn build(
        config: &AppConfig,
        expected: &dyn ConfigSource,
        candidate: Option<&str>,
        factory: &dyn ClientFactory,
    ) -> Self {
        let slots = config
            .chat_settings()
            .into_iter()
            .map(|(id, settings)| {
                let slot = Self::construct(&id, settings, expected, candidate, factory);
                (id, slot)
            })
            .collect();

        Self {
            default_id: config.default_persona.clone(),
            slots,
        }
    }

    fn construct(
        id: &str,
        settings: ChatSettings,
        expected: &dyn ConfigSource,
        candidate: Option<&str>,
        factory: &dyn ClientFactory,
    ) -> PersonaSlot {
        let name = settings.persona.name().to_string();
        match ChatService::construct(settings, expected, candidate, factory) {
            Ok(service) => {
                info!(persona = id, model = service.model(), "persona ready");
                PersonaSlot::Ready(Arc::new(service))
            }
            Err(e) => {
                warn!(persona = id, error = %e, "persona unavailable");
                PersonaSlot::Unavailable {
                    name,
                    kind: e.kind(),
                    reason: e.to_string(),
                }
            }
        }
    }

    pub fn default_id(&self) -> &str {
        &self.default_id
    }

    pub fn get(&self, id: &str) -> Option<&PersonaSlot> {
        self.slots.get(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &PersonaSlot)> {
        self.slots.iter().map(|(id, slot)| (id.as_str(), slot))
    }
}

#[derive(Clone)]
pub struct AppState {
    pub personas: Arc<PersonaRegistry>,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub fn new(personas: PersonaRegistry, config: AppConfig) -> Self {
        Self {
            personas: Arc::new(personas),
            config: Arc::new(config),
        }
    }
}
