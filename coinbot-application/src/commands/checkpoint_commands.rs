use coinbot_domain::{mention, ChannelRef, MessageCreated};
use tracing::{info, warn};

use crate::{AppError, AppState};

/// Makes sure a channel has a checkpoint record before events are stored.
pub async fn ensure_channel(
    state: &AppState,
    guild_id: u64,
    channel_id: u64,
) -> Result<ChannelRef, AppError> {
    let channel = state.platform.channel(channel_id).await?.ok_or_else(|| {
        AppError::MalformedIdentity(format!("channel {} is not a guild text channel", channel_id))
    })?;
    if channel.guild_id != guild_id {
        return Err(AppError::MalformedIdentity(format!(
            "channel {} belongs to guild {}, event named guild {}",
            channel_id, channel.guild_id, guild_id
        )));
    }
    state.checkpoint_repo.initialize(&channel).await?;
    info!(
        "checkpoint record created for {} ({}) in {} ({})",
        channel.channel_name, channel.channel_id, channel.guild_name, channel.guild_id
    );
    Ok(channel)
}

/// Live message path: every new message advances the channel window.
pub async fn record_message(state: &AppState, message: &MessageCreated) -> Result<(), AppError> {
    let guild_id = message.guild_id.ok_or_else(|| {
        AppError::MalformedIdentity(format!(
            "message {} in channel {} has no guild",
            message.message_id, message.channel_id
        ))
    })?;

    if !state
        .checkpoint_repo
        .is_initialized(guild_id, message.channel_id)
        .await?
    {
        ensure_channel(state, guild_id, message.channel_id).await?;
    }

    state
        .checkpoint_repo
        .record_event(guild_id, message.channel_id, message.message_id)
        .await?;
    Ok(())
}

/// Tells the channel that an operator has to step in.
pub async fn report_error(state: &AppState, channel_id: u64, err: &AppError) {
    let administrator = mention(state.bot.administrator_id);
    let content = match err {
        AppError::EmojiResolution { emoji_id } => {
            format!("Error: Emoji not found for {}. {} pls fix.", emoji_id, administrator)
        }
        _ => format!("An error occurred. {} pls fix.", administrator),
    };
    if let Err(send_err) = state.platform.send_message(channel_id, &content).await {
        warn!("failed to report error in channel {}: {}", channel_id, send_err);
    }
}
