use std::path::{Path, PathBuf};

use anyhow::Context;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{info, warn};

use coinbot_domain::{BotConfigDocument, ConfigRepository, SlotMachineConfig};

use crate::utils::{read_optional, to_python_json, write_atomic};

/// Operator documents: the slot machine layout and the bot settings.
pub struct ConfigFileRepository {
    slot_machine_path: PathBuf,
    bot_config_path: PathBuf,
}

impl ConfigFileRepository {
    pub fn new(slot_machine_path: impl Into<PathBuf>, bot_config_path: impl Into<PathBuf>) -> Self {
        Self {
            slot_machine_path: slot_machine_path.into(),
            bot_config_path: bot_config_path.into(),
        }
    }
}

async fn load_or_create<T>(path: &Path, fallback: impl FnOnce() -> T) -> anyhow::Result<T>
where
    T: Serialize + DeserializeOwned,
{
    match read_optional(path).await? {
        Some(content) if !content.trim().is_empty() => serde_json::from_str(&content)
            .with_context(|| format!("invalid JSON in {}", path.display())),
        _ => {
            warn!("{} is missing or empty, writing defaults", path.display());
            let value = fallback();
            save_document(path, &value).await?;
            Ok(value)
        }
    }
}

async fn save_document<T: Serialize>(path: &Path, value: &T) -> anyhow::Result<()> {
    let content = to_python_json(value)?;
    write_atomic(path, content.as_bytes()).await?;
    info!("saved {}", path.display());
    Ok(())
}

#[async_trait]
impl ConfigRepository for ConfigFileRepository {
    async fn load_slot_machine(&self) -> anyhow::Result<SlotMachineConfig> {
        load_or_create(&self.slot_machine_path, SlotMachineConfig::template).await
    }

    async fn save_slot_machine(&self, config: &SlotMachineConfig) -> anyhow::Result<()> {
        save_document(&self.slot_machine_path, config).await
    }

    async fn load_bot_config(&self) -> anyhow::Result<BotConfigDocument> {
        load_or_create(&self.bot_config_path, BotConfigDocument::default).await
    }

    async fn save_bot_config(&self, config: &BotConfigDocument) -> anyhow::Result<()> {
        save_document(&self.bot_config_path, config).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn repo(dir: &Path) -> ConfigFileRepository {
        ConfigFileRepository::new(
            dir.join("data/slot_machine.json"),
            dir.join("data/bot_configuration.json"),
        )
    }

    #[tokio::test]
    async fn missing_files_are_created_from_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let repo = repo(dir.path());

        let slot = repo.load_slot_machine().await.expect("slot");
        assert_eq!(slot, SlotMachineConfig::template());
        assert!(dir.path().join("data/slot_machine.json").exists());

        let bot = repo.load_bot_config().await.expect("bot");
        assert_eq!(bot, BotConfigDocument::default());
        let written =
            std::fs::read_to_string(dir.path().join("data/bot_configuration.json")).expect("read");
        assert_eq!(
            written,
            r#"{"COIN": "coin", "COINS": "coins", "COIN_EMOJI_ID": "0", "CASINO_HOUSE_ID": "0", "ADMINISTRATOR_ID": "0"}"#
        );
    }

    #[tokio::test]
    async fn slot_machine_round_trips_with_key_order() {
        let dir = tempfile::tempdir().expect("tempdir");
        let repo = repo(dir.path());
        let mut config = SlotMachineConfig::template();
        config.desired_rtp = 0.9;
        repo.save_slot_machine(&config).await.expect("save");

        let first = std::fs::read_to_string(dir.path().join("data/slot_machine.json")).expect("read");
        assert!(first.starts_with(r#"{"awards": {"#));
        let loaded = repo.load_slot_machine().await.expect("load");
        assert_eq!(loaded, config);

        repo.save_slot_machine(&loaded).await.expect("save again");
        let second = std::fs::read_to_string(dir.path().join("data/slot_machine.json")).expect("read");
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn malformed_documents_are_errors() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::create_dir_all(dir.path().join("data")).expect("mkdir");
        std::fs::write(dir.path().join("data/bot_configuration.json"), "{").expect("write");
        assert!(repo(dir.path()).load_bot_config().await.is_err());
    }
}
