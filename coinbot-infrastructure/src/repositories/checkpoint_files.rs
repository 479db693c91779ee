use std::path::PathBuf;

use anyhow::{anyhow, Context};
use async_trait::async_trait;
use serde_json::json;
use tokio::fs;
use tracing::info;

use coinbot_domain::{ChannelCheckpoint, ChannelRef, CheckpointLine, CheckpointRepository};

use crate::utils::{read_optional, to_python_json, write_atomic};

const CHECKPOINT_FILE: &str = "channel_checkpoints.json";

/// Checkpoint windows stored as newline-delimited JSON under
/// `<root>/guilds/<guild>/channels/<channel>/`.
pub struct CheckpointFileRepository {
    root: PathBuf,
    capacity: usize,
}

impl CheckpointFileRepository {
    pub fn new(root: impl Into<PathBuf>, capacity: usize) -> Self {
        Self {
            root: root.into(),
            capacity: capacity.max(1),
        }
    }

    fn guild_dir(&self, guild_id: u64) -> PathBuf {
        self.root.join("guilds").join(guild_id.to_string())
    }

    fn channel_dir(&self, guild_id: u64, channel_id: u64) -> PathBuf {
        self.guild_dir(guild_id)
            .join("channels")
            .join(channel_id.to_string())
    }

    fn checkpoint_path(&self, guild_id: u64, channel_id: u64) -> PathBuf {
        self.channel_dir(guild_id, channel_id).join(CHECKPOINT_FILE)
    }

    async fn read_window(&self, guild_id: u64, channel_id: u64) -> anyhow::Result<Vec<u64>> {
        let path = self.checkpoint_path(guild_id, channel_id);
        let Some(content) = read_optional(&path).await? else {
            return Ok(Vec::new());
        };
        content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(|line| {
                serde_json::from_str::<CheckpointLine>(line)
                    .map(|entry| entry.last_message_id)
                    .with_context(|| format!("corrupt checkpoint line in {}", path.display()))
            })
            .collect()
    }
}

fn render_window(ids: &[u64]) -> anyhow::Result<String> {
    let lines = ids
        .iter()
        .map(|id| to_python_json(&CheckpointLine { last_message_id: *id }))
        .collect::<anyhow::Result<Vec<_>>>()?;
    Ok(lines.join("\n"))
}

#[async_trait]
impl CheckpointRepository for CheckpointFileRepository {
    async fn initialize(&self, channel: &ChannelRef) -> anyhow::Result<()> {
        let guild_dir = self.guild_dir(channel.guild_id);
        let channel_dir = self.channel_dir(channel.guild_id, channel.channel_id);
        fs::create_dir_all(&channel_dir).await?;

        // Names can change; ids cannot. Keep the labels current for operators.
        let guild_name = to_python_json(&json!({ "guild_name": channel.guild_name }))?;
        write_atomic(&guild_dir.join("guild_name.json"), guild_name.as_bytes()).await?;
        let channel_name = to_python_json(&json!({ "channel_name": channel.channel_name }))?;
        write_atomic(&channel_dir.join("channel_name.json"), channel_name.as_bytes()).await?;

        let path = channel_dir.join(CHECKPOINT_FILE);
        if !fs::try_exists(&path).await? {
            info!("creating checkpoints file: {}", path.display());
            write_atomic(&path, b"").await?;
        }
        Ok(())
    }

    async fn is_initialized(&self, guild_id: u64, channel_id: u64) -> anyhow::Result<bool> {
        Ok(fs::try_exists(self.checkpoint_path(guild_id, channel_id)).await?)
    }

    async fn record_event(
        &self,
        guild_id: u64,
        channel_id: u64,
        message_id: u64,
    ) -> anyhow::Result<ChannelCheckpoint> {
        let window = self.read_window(guild_id, channel_id).await?;
        let mut checkpoint = ChannelCheckpoint::from_window(channel_id, guild_id, self.capacity, window);
        checkpoint.record(message_id);
        let content = render_window(&checkpoint.ids())?;
        write_atomic(&self.checkpoint_path(guild_id, channel_id), content.as_bytes()).await?;
        Ok(checkpoint)
    }

    async fn load_window(&self, guild_id: u64, channel_id: u64) -> anyhow::Result<Vec<u64>> {
        let window = self.read_window(guild_id, channel_id).await?;
        let checkpoint = ChannelCheckpoint::from_window(channel_id, guild_id, self.capacity, window);
        Ok(checkpoint.ids())
    }

    async fn delete_all(&self) -> anyhow::Result<()> {
        match fs::remove_dir_all(&self.root).await {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(anyhow!("failed to delete {}: {}", self.root.display(), err)),
        }
    }
}
