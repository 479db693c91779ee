use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use coinbot_domain::ports::{
    ChatPlatform, CheckpointRepository, ConfigRepository, Ledger, SaveDataRepository,
};
use coinbot_domain::services::SlotMachine;
use coinbot_domain::{BotConfiguration, RuntimeConfig};
use tokio::sync::RwLock;

use crate::{Metrics, Shutdown};

#[derive(Clone)]
pub struct AppState {
    pub config: RuntimeConfig,
    pub bot: BotConfiguration,
    pub checkpoint_repo: Arc<dyn CheckpointRepository>,
    pub save_repo: Arc<dyn SaveDataRepository>,
    pub config_repo: Arc<dyn ConfigRepository>,
    pub ledger: Arc<dyn Ledger>,
    pub platform: Arc<dyn ChatPlatform>,
    pub slot_machine: Arc<RwLock<SlotMachine>>,
    /// Users with a pull in flight.
    pub active_players: Arc<Mutex<HashSet<u64>>>,
    pub metrics: Arc<Metrics>,
    pub shutdown: Shutdown,
}
