// File-backed state for handler tests

use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tempfile::TempDir;
use tokio::sync::RwLock;

use coinbot_application::{AppState, Metrics, Shutdown};
use coinbot_domain::services::SlotMachine;
use coinbot_domain::{
    BotConfigDocument, BotConfiguration, ChannelRef, ChatPlatform, EmojiRef, HistoryMessage,
    Ledger, LedgerTransactionRequest, PlatformUser, RuntimeConfig, SlotMachineConfig, UserHash,
};
use coinbot_infrastructure::{
    CheckpointFileRepository, ConfigFileRepository, SaveDataFileRepository,
};

pub const TOKEN: &str = "secret";

struct IdleLedger;

#[async_trait]
impl Ledger for IdleLedger {
    async fn submit_transaction(&self, _request: &LedgerTransactionRequest) -> anyhow::Result<()> {
        Ok(())
    }

    async fn get_balance(&self, _user: &UserHash) -> anyhow::Result<Option<i64>> {
        Ok(None)
    }

    async fn last_transaction_timestamp(&self) -> anyhow::Result<Option<DateTime<Utc>>> {
        Ok(Some(Utc::now()))
    }

    async fn validate_chain(&self) -> anyhow::Result<bool> {
        Ok(true)
    }
}

struct IdlePlatform;

#[async_trait]
impl ChatPlatform for IdlePlatform {
    async fn history(
        &self,
        _channel_id: u64,
        _before: Option<u64>,
        _limit: usize,
    ) -> anyhow::Result<Vec<HistoryMessage>> {
        Ok(Vec::new())
    }

    async fn reaction_users(
        &self,
        _channel_id: u64,
        _message_id: u64,
        _emoji: &EmojiRef,
    ) -> anyhow::Result<Vec<PlatformUser>> {
        Ok(Vec::new())
    }

    async fn fetch_user(&self, _user_id: u64) -> anyhow::Result<Option<PlatformUser>> {
        Ok(None)
    }

    async fn channel(&self, _channel_id: u64) -> anyhow::Result<Option<ChannelRef>> {
        Ok(None)
    }

    async fn text_channels(&self) -> anyhow::Result<Vec<ChannelRef>> {
        Ok(Vec::new())
    }

    async fn resolve_emoji(&self, _emoji_id: u64) -> anyhow::Result<Option<String>> {
        Ok(None)
    }

    async fn send_message(&self, _channel_id: u64, _content: &str) -> anyhow::Result<()> {
        Ok(())
    }
}

pub struct TestServer {
    pub state: AppState,
    dir: TempDir,
}

impl TestServer {
    pub async fn new() -> Self {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = |name: &str| dir.path().join(name).to_string_lossy().to_string();
        let config = RuntimeConfig {
            bind_addr: "127.0.0.1:0".to_string(),
            server_token: Some(TOKEN.to_string()),
            checkpoints_dir: path("checkpoints"),
            save_data_dir: path("save_data"),
            slot_machine_path: path("slot_machine.json"),
            bot_config_path: path("bot_configuration.json"),
            checkpoint_capacity: 3,
            history_page_size: 100,
            max_body_bytes: 1024 * 1024,
            request_timeout_seconds: 5,
        };
        let bot = BotConfiguration::from_document(&BotConfigDocument::default()).expect("bot");
        let state = AppState {
            checkpoint_repo: Arc::new(CheckpointFileRepository::new(
                &config.checkpoints_dir,
                config.checkpoint_capacity,
            )),
            save_repo: Arc::new(SaveDataFileRepository::new(&config.save_data_dir)),
            config_repo: Arc::new(ConfigFileRepository::new(
                &config.slot_machine_path,
                &config.bot_config_path,
            )),
            ledger: Arc::new(IdleLedger),
            platform: Arc::new(IdlePlatform),
            slot_machine: Arc::new(RwLock::new(SlotMachine::calibrated(
                SlotMachineConfig::template(),
            ))),
            active_players: Arc::new(Mutex::new(HashSet::new())),
            metrics: Arc::new(Metrics::default()),
            shutdown: Shutdown::new(),
            config,
            bot,
        };
        Self { state, dir }
    }

    pub fn checkpoints_dir(&self) -> PathBuf {
        self.dir.path().join("checkpoints")
    }
}
