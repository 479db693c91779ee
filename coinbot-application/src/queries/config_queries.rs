use coinbot_domain::{BotConfigDocument, SlotMachineConfig};

use crate::{AppError, AppState};

/// Reads the stored slot machine document, which may differ from the running
/// machine until the next restart.
pub async fn get_slot_machine_config(state: &AppState) -> Result<SlotMachineConfig, AppError> {
    Ok(state.config_repo.load_slot_machine().await?)
}

pub async fn get_bot_config(state: &AppState) -> Result<BotConfigDocument, AppError> {
    Ok(state.config_repo.load_bot_config().await?)
}
