use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use anyhow::{anyhow, Result};
use tokio::sync::RwLock;
use tracing::info;

use coinbot_application::{AppState, ChannelWorkers, Metrics, Shutdown};
use coinbot_domain::{BotConfiguration, ConfigRepository, SlotMachine};
use coinbot_infrastructure::{
    apply_bot_env_overrides, warn_unset_bot_ids, AppConfig, CheckpointFileRepository,
    ConfigFileRepository, DiscordRestClient, HttpLedger, SaveDataFileRepository,
};

pub struct AppContext {
    pub config: AppConfig,
    pub state: AppState,
    pub discord: Arc<DiscordRestClient>,
    pub workers: Arc<ChannelWorkers>,
}

impl AppContext {
    pub async fn from_config(config: AppConfig) -> Result<Self> {
        let runtime_config = config.to_runtime_config();
        let discord_token = config
            .discord_token
            .clone()
            .ok_or_else(|| anyhow!("DISCORD_TOKEN is not set"))?;

        let config_repo = Arc::new(ConfigFileRepository::new(
            &config.slot_machine_path,
            &config.bot_config_path,
        ));

        let mut bot_document = config_repo.load_bot_config().await?;
        apply_bot_env_overrides(&mut bot_document);
        let bot = BotConfiguration::from_document(&bot_document)?;
        warn_unset_bot_ids(&bot);

        let slot_config = config_repo.load_slot_machine().await?;
        let slot_machine = SlotMachine::calibrated(slot_config);
        slot_machine
            .validate()
            .map_err(|err| anyhow!("invalid slot machine config: {}", err))?;
        config_repo.save_slot_machine(slot_machine.config()).await?;
        info!(
            "slot machine calibrated, rtp multiplier {:.4}",
            slot_machine.config().rtp_multiplier
        );

        let ledger = Arc::new(HttpLedger::new(
            &config.ledger_url,
            config.request_timeout_seconds,
        )?);
        let discord = Arc::new(DiscordRestClient::new(
            &config.discord_api_base,
            &discord_token,
            config.request_timeout_seconds,
        )?);

        let state = AppState {
            config: runtime_config,
            bot,
            checkpoint_repo: Arc::new(CheckpointFileRepository::new(
                &config.checkpoints_dir,
                config.checkpoint_capacity,
            )),
            save_repo: Arc::new(SaveDataFileRepository::new(&config.save_data_dir)),
            config_repo,
            ledger,
            platform: discord.clone(),
            slot_machine: Arc::new(RwLock::new(slot_machine)),
            active_players: Arc::new(Mutex::new(HashSet::new())),
            metrics: Arc::new(Metrics::default()),
            shutdown: Shutdown::new(),
        };

        Ok(Self {
            config,
            state,
            discord,
            workers: Arc::new(ChannelWorkers::default()),
        })
    }
}
