use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

use crate::api::error::ApiError;
use crate::api::state::{AppState, PersonaSlot};
use crate::domain::ChatError;

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    pub persona: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub persona: String,
    pub name: String,
    pub reply: String,
}

#[derive(Debug, Serialize)]
pub struct PersonaStatus {
    pub id: String,
    pub name: String,
    pub model: Option<String>,
    pub available: bool,
    pub error: Option<String>,
}

pub async fn chat_handler(
    State(state): State<AppState>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, ApiError> {
    if request.message.is_empty() {
        return Err(ChatError::EmptyInput.into());
    }

    let id = request
        .persona
        .unwrap_or_else(|| state.personas.default_id().to_string());

    let service = match state.personas.get(&id) {
        Some(PersonaSlot::Ready(service)) => service.clone(),
        Some(PersonaSlot::Unavailable { kind, reason, .. }) => {
            return Err(ApiError::unavailable(*kind, reason))
        }
        None => return Err(ApiError::unknown_persona(&id)),
    };

    let reply = service.respond(&request.message).await?;

    Ok(Json(ChatResponse {
        persona: id,
        name: service.persona().name().to_string(),
        reply,
    }))
}

pub async fn list_personas(State(state): State<AppState>) -> Json<Vec<PersonaStatus>> {
    let personas = state
        .personas
        .iter()
        .map(|(id, slot)| match slot {
            PersonaSlot::Ready(service) => PersonaStatus {
                id: id.to_string(),
                name: slot.name().to_string(),
                model: Some(service.model().to_string()),
                available: true,
                error: None,
            },
            PersonaSlot::Unavailable { reason, .. } => PersonaStatus {
                id: id.to_string(),
                name: slot.name().to_string(),
                model: None,
                available: false,
                error: Some(reason.clone()),
            },
        })
        .collect();

    Json(personas)
}
