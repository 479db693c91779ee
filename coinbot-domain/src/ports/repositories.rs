use async_trait::async_trait;

use crate::entities::{
    BotConfigDocument, ChannelCheckpoint, ChannelRef, PlatformUser, SlotMachineConfig,
    UserSaveRecord,
};

/// Durable per-channel checkpoint windows. Calls for one channel are
/// serialized by the caller; distinct channels may run concurrently.
#[async_trait]
pub trait CheckpointRepository: Send + Sync {
    /// Creates the channel record when absent and refreshes its name files.
    async fn initialize(&self, channel: &ChannelRef) -> anyhow::Result<()>;
    async fn is_initialized(&self, guild_id: u64, channel_id: u64) -> anyhow::Result<bool>;
    /// Appends a message id, evicting the oldest entries beyond capacity.
    async fn record_event(
        &self,
        guild_id: u64,
        channel_id: u64,
        message_id: u64,
    ) -> anyhow::Result<ChannelCheckpoint>;
    /// Stored window, oldest first; empty when nothing has been recorded.
    async fn load_window(&self, guild_id: u64, channel_id: u64) -> anyhow::Result<Vec<u64>>;
    async fn delete_all(&self) -> anyhow::Result<()>;
}

#[async_trait]
pub trait SaveDataRepository: Send + Sync {
    async fn load(&self, user_id: u64) -> anyhow::Result<Option<UserSaveRecord>>;
    /// Merges one key into the user's record and persists it atomically.
    async fn set(&self, user: &PlatformUser, key: &str, value: &str) -> anyhow::Result<()>;

    async fn get(&self, user_id: u64, key: &str) -> anyhow::Result<Option<String>> {
        Ok(self
            .load(user_id)
            .await?
            .and_then(|record| record.get(key).map(str::to_string)))
    }
}

#[async_trait]
pub trait ConfigRepository: Send + Sync {
    /// Loads the slot machine file, writing the template first when missing.
    async fn load_slot_machine(&self) -> anyhow::Result<SlotMachineConfig>;
    async fn save_slot_machine(&self, config: &SlotMachineConfig) -> anyhow::Result<()>;

    async fn load_bot_config(&self) -> anyhow::Result<BotConfigDocument>;
    async fn save_bot_config(&self, config: &BotConfigDocument) -> anyhow::Result<()>;
}
