use axum::body::Bytes;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;
use serde::de::DeserializeOwned;
use tracing::info;

use coinbot_application::commands::config_commands;
use coinbot_application::queries::config_queries;
use coinbot_application::AppState;
use coinbot_domain::{BotConfigDocument, SlotMachineConfig};

use crate::error::{HttpError, MessageBody, DATA_REQUIRED};
use crate::middleware::authorize;

fn parse_body<T: DeserializeOwned>(body: &Bytes) -> Result<T, HttpError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Err(HttpError::BadRequest(DATA_REQUIRED.to_string()));
    }
    serde_json::from_slice(body).map_err(|err| HttpError::BadRequest(format!("Invalid data: {}", err)))
}

pub async fn get_slot_machine_config(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<SlotMachineConfig>, HttpError> {
    info!("received request to get slot machine config");
    authorize(&state.config, &headers)?;
    let config = config_queries::get_slot_machine_config(&state).await?;
    Ok(Json(config))
}

pub async fn set_slot_machine_config(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<MessageBody>, HttpError> {
    info!("received request to set slot machine config");
    authorize(&state.config, &headers)?;
    let config: SlotMachineConfig = parse_body(&body)?;
    config_commands::set_slot_machine_config(&state, config).await?;
    Ok(MessageBody::new("Slot machine config updated."))
}

pub async fn get_bot_config(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<BotConfigDocument>, HttpError> {
    info!("received request to get bot config");
    authorize(&state.config, &headers)?;
    let document = config_queries::get_bot_config(&state).await?;
    Ok(Json(document))
}

pub async fn set_bot_config(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<MessageBody>, HttpError> {
    info!("received request to set bot config");
    authorize(&state.config, &headers)?;
    let document: BotConfigDocument = parse_body(&body)?;
    config_commands::set_bot_config(&state, document).await?;
    Ok(MessageBody::new("Bot config updated."))
}

pub async fn delete_checkpoints(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<MessageBody>, HttpError> {
    info!("received request to delete checkpoints");
    authorize(&state.config, &headers)?;
    config_commands::delete_checkpoints(&state).await?;
    Ok(MessageBody::new("Checkpoints deleted."))
}
