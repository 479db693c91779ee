use std::env;
use std::path::Path;

use anyhow::{anyhow, Result};
use serde::Deserialize;
use tokio::fs;
use tracing::warn;

use coinbot_domain::RuntimeConfig;

pub const CONFIG_PATH_ENV: &str = "COINBOT_CONFIG";
pub const DEFAULT_CONFIG_PATH: &str = "./config.toml";

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    pub bind_addr: String,
    pub server_token: Option<String>,
    pub discord_token: Option<String>,
    pub discord_api_base: String,
    pub gateway_url: String,
    pub ledger_url: String,
    pub checkpoints_dir: String,
    pub save_data_dir: String,
    pub slot_machine_path: String,
    pub bot_config_path: String,
    pub transactions_log_path: String,
    pub checkpoint_capacity: usize,
    pub history_page_size: usize,
    pub max_body_bytes: u64,
    pub request_timeout_seconds: u64,
    pub reconnect_delay_seconds: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:8080".to_string(),
            server_token: None,
            discord_token: None,
            discord_api_base: "https://discord.com/api/v10".to_string(),
            gateway_url: "wss://gateway.discord.gg/?v=10&encoding=json".to_string(),
            ledger_url: "http://127.0.0.1:5000".to_string(),
            checkpoints_dir: "./data/checkpoints".to_string(),
            save_data_dir: "./data/save_data".to_string(),
            slot_machine_path: "./data/slot_machine.json".to_string(),
            bot_config_path: "./data/bot_configuration.json".to_string(),
            transactions_log_path: "./data/transactions.log".to_string(),
            checkpoint_capacity: 3,
            history_page_size: 100,
            max_body_bytes: 8 * 1024 * 1024,
            request_timeout_seconds: 15,
            reconnect_delay_seconds: 5,
        }
    }
}

impl AppConfig {
    pub async fn load() -> Result<Self> {
        let path = env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        Self::load_from(&path).await
    }

    pub async fn load_from(path: &str) -> Result<Self> {
        let file_path = Path::new(path);
        let base_dir = file_path.parent();
        let mut config = if file_path.exists() {
            let content = fs::read_to_string(file_path).await?;
            Self::parse(&content)?
        } else {
            warn!("{} not found, using defaults", path);
            AppConfig::default()
        };
        config.apply_env_overrides();
        config.resolve_paths(base_dir);
        config.normalize();
        config.validate()?;
        Ok(config)
    }

    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|err| anyhow!("invalid config: {}", err))
    }

    pub fn normalize(&mut self) {
        if let Some(token) = &self.server_token {
            if token.trim().is_empty() {
                self.server_token = None;
            }
        }
        if let Some(token) = &self.discord_token {
            if token.trim().is_empty() {
                self.discord_token = None;
            }
        }
        self.discord_api_base = self.discord_api_base.trim().trim_end_matches('/').to_string();
        self.ledger_url = self.ledger_url.trim().trim_end_matches('/').to_string();
        if self.server_token.is_none() {
            warn!("server_token is not set; the config endpoints will reject every request");
        }
    }

    fn resolve_paths(&mut self, base_dir: Option<&Path>) {
        let Some(base) = base_dir else {
            return;
        };
        self.checkpoints_dir = resolve_path(base, &self.checkpoints_dir);
        self.save_data_dir = resolve_path(base, &self.save_data_dir);
        self.slot_machine_path = resolve_path(base, &self.slot_machine_path);
        self.bot_config_path = resolve_path(base, &self.bot_config_path);
        self.transactions_log_path = resolve_path(base, &self.transactions_log_path);
    }

    pub fn validate(&self) -> Result<()> {
        self.bind_addr
            .parse::<std::net::SocketAddr>()
            .map_err(|err| anyhow!("invalid bind_addr: {}", err))?;
        for (name, value) in [
            ("discord_api_base", &self.discord_api_base),
            ("ledger_url", &self.ledger_url),
        ] {
            if !value.starts_with("http://") && !value.starts_with("https://") {
                return Err(anyhow!("{} must be an http(s) url", name));
            }
        }
        if !self.gateway_url.starts_with("ws://") && !self.gateway_url.starts_with("wss://") {
            return Err(anyhow!("gateway_url must be a ws(s) url"));
        }
        for (name, value) in [
            ("checkpoints_dir", &self.checkpoints_dir),
            ("save_data_dir", &self.save_data_dir),
            ("slot_machine_path", &self.slot_machine_path),
            ("bot_config_path", &self.bot_config_path),
            ("transactions_log_path", &self.transactions_log_path),
        ] {
            if value.trim().is_empty() {
                return Err(anyhow!("{} must not be empty", name));
            }
        }
        if self.checkpoint_capacity == 0 {
            return Err(anyhow!("checkpoint_capacity must be greater than 0"));
        }
        if !(1..=100).contains(&self.history_page_size) {
            return Err(anyhow!("history_page_size must be between 1 and 100"));
        }
        if self.max_body_bytes == 0 {
            return Err(anyhow!("max_body_bytes must be greater than 0"));
        }
        if self.request_timeout_seconds == 0 {
            return Err(anyhow!("request_timeout_seconds must be greater than 0"));
        }
        Ok(())
    }

    pub fn to_runtime_config(&self) -> RuntimeConfig {
        RuntimeConfig {
            bind_addr: self.bind_addr.clone(),
            server_token: self.server_token.clone(),
            checkpoints_dir: self.checkpoints_dir.clone(),
            save_data_dir: self.save_data_dir.clone(),
            slot_machine_path: self.slot_machine_path.clone(),
            bot_config_path: self.bot_config_path.clone(),
            checkpoint_capacity: self.checkpoint_capacity,
            history_page_size: self.history_page_size,
            max_body_bytes: self.max_body_bytes,
            request_timeout_seconds: self.request_timeout_seconds,
        }
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(value) = env::var("COINBOT_BIND_ADDR") {
            self.bind_addr = value;
        }
        if let Ok(value) = env::var("SERVER_TOKEN") {
            self.server_token = Some(value);
        }
        if let Ok(value) = env::var("COINBOT_SERVER_TOKEN") {
            self.server_token = Some(value);
        }
        if let Ok(value) = env::var("DISCORD_TOKEN") {
            self.discord_token = Some(value);
        }
        if let Ok(value) = env::var("COINBOT_DISCORD_TOKEN") {
            self.discord_token = Some(value);
        }
        if let Ok(value) = env::var("COINBOT_DISCORD_API_BASE") {
            self.discord_api_base = value;
        }
        if let Ok(value) = env::var("COINBOT_GATEWAY_URL") {
            self.gateway_url = value;
        }
        if let Ok(value) = env::var("COINBOT_LEDGER_URL") {
            self.ledger_url = value;
        }
        if let Ok(value) = env::var("COINBOT_CHECKPOINTS_DIR") {
            self.checkpoints_dir = value;
        }
        if let Ok(value) = env::var("COINBOT_SAVE_DATA_DIR") {
            self.save_data_dir = value;
        }
        if let Ok(value) = env::var("COINBOT_SLOT_MACHINE_PATH") {
            self.slot_machine_path = value;
        }
        if let Ok(value) = env::var("COINBOT_BOT_CONFIG_PATH") {
            self.bot_config_path = value;
        }
        if let Ok(value) = env::var("COINBOT_TRANSACTIONS_LOG_PATH") {
            self.transactions_log_path = value;
        }
        if let Ok(value) = env::var("COINBOT_CHECKPOINT_CAPACITY") {
            self.checkpoint_capacity = value.parse().unwrap_or(self.checkpoint_capacity);
        }
        if let Ok(value) = env::var("COINBOT_HISTORY_PAGE_SIZE") {
            self.history_page_size = value.parse().unwrap_or(self.history_page_size);
        }
        if let Ok(value) = env::var("COINBOT_MAX_BODY_BYTES") {
            self.max_body_bytes = value.parse().unwrap_or(self.max_body_bytes);
        }
        if let Ok(value) = env::var("COINBOT_REQUEST_TIMEOUT_SECONDS") {
            self.request_timeout_seconds = value.parse().unwrap_or(self.request_timeout_seconds);
        }
        if let Ok(value) = env::var("COINBOT_RECONNECT_DELAY_SECONDS") {
            self.reconnect_delay_seconds = value.parse().unwrap_or(self.reconnect_delay_seconds);
        }
    }
}

fn resolve_path(base: &Path, value: &str) -> String {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return trimmed.to_string();
    }
    let path = Path::new(trimmed);
    if path.is_absolute() {
        trimmed.to_string()
    } else {
        base.join(path).to_string_lossy().to_string()
    }
}
