use coinbot_domain::services::validate_config;
use coinbot_domain::{BotConfigDocument, BotConfiguration, SlotMachineConfig};
use tracing::info;

use crate::{AppError, AppState};

/// Stores a new slot machine document. Takes effect on the next start.
pub async fn set_slot_machine_config(
    state: &AppState,
    config: SlotMachineConfig,
) -> Result<(), AppError> {
    validate_config(&config).map_err(|err| AppError::ConfigInvalid(err.to_string()))?;
    state.config_repo.save_slot_machine(&config).await?;
    info!("slot machine configuration replaced; restart to apply");
    Ok(())
}

/// Stores a new bot document. Takes effect on the next start.
pub async fn set_bot_config(state: &AppState, document: BotConfigDocument) -> Result<(), AppError> {
    BotConfiguration::from_document(&document)
        .map_err(|err| AppError::ConfigInvalid(err.to_string()))?;
    state.config_repo.save_bot_config(&document).await?;
    info!("bot configuration replaced; restart to apply");
    Ok(())
}

pub async fn delete_checkpoints(state: &AppState) -> Result<(), AppError> {
    state.checkpoint_repo.delete_all().await?;
    info!("all channel checkpoints deleted");
    Ok(())
}
