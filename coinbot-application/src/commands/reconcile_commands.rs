use coinbot_domain::{ChannelRef, HistoryMessage};
use tracing::{info, warn};

use crate::commands::reward_commands::{dispatch_reaction, is_reward_emoji};
use crate::{AppError, AppState};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconcileReport {
    pub channel_id: u64,
    /// Messages newer than the stored checkpoint.
    pub scanned: usize,
    pub rewards: usize,
    pub checkpoint_reached: bool,
    /// Set when the window was advanced.
    pub new_checkpoint: Option<u64>,
}

/// Replays events missed while the bot was offline. History is read newest
/// first until a stored checkpoint id turns up; everything before that is
/// replayed and the newest id becomes the new checkpoint.
pub async fn reconcile_channel(
    state: &AppState,
    channel: &ChannelRef,
) -> Result<ReconcileReport, AppError> {
    state.checkpoint_repo.initialize(channel).await?;
    let window = state
        .checkpoint_repo
        .load_window(channel.guild_id, channel.channel_id)
        .await?;
    if window.is_empty() {
        warn!(
            "no checkpoint stored for {} ({}); the full history will be replayed",
            channel.channel_name, channel.channel_id
        );
    }

    let page_size = state.config.history_page_size.max(1);
    let mut before = None;
    let mut candidate = None;
    let mut scanned = 0;
    let mut rewards = 0;
    let mut checkpoint_reached = false;

    'pages: loop {
        let page = state
            .platform
            .history(channel.channel_id, before, page_size)
            .await?;
        for message in &page {
            if candidate.is_none() {
                candidate = Some(message.message_id);
            }
            if window.contains(&message.message_id) {
                checkpoint_reached = true;
                break 'pages;
            }
            scanned += 1;
            rewards += replay_message(state, message).await?;
        }
        if page.len() < page_size {
            break;
        }
        before = page.last().map(|message| message.message_id);
    }

    if candidate.is_none() {
        warn!(
            "no messages found in {} ({})",
            channel.channel_name, channel.channel_id
        );
    } else if !checkpoint_reached && !window.is_empty() {
        warn!(
            "checkpoint for {} ({}) not found in history; replayed everything",
            channel.channel_name, channel.channel_id
        );
    }

    let mut new_checkpoint = None;
    if scanned > 0 {
        if let Some(message_id) = candidate {
            state
                .checkpoint_repo
                .record_event(channel.guild_id, channel.channel_id, message_id)
                .await?;
            new_checkpoint = Some(message_id);
        }
    }
    state.metrics.record_reconciled(scanned);

    info!(
        "reconciled {} ({}): {} new messages, {} rewards",
        channel.channel_name, channel.channel_id, scanned, rewards
    );
    Ok(ReconcileReport {
        channel_id: channel.channel_id,
        scanned,
        rewards,
        checkpoint_reached,
        new_checkpoint,
    })
}

async fn replay_message(state: &AppState, message: &HistoryMessage) -> Result<usize, AppError> {
    let mut rewards = 0;
    for reaction in &message.reactions {
        if !is_reward_emoji(&state.bot, &reaction.emoji) {
            continue;
        }
        let senders = state
            .platform
            .reaction_users(message.channel_id, message.message_id, &reaction.emoji)
            .await?;
        for sender in &senders {
            if dispatch_reaction(
                state,
                sender,
                message.author.id,
                Some(&message.author),
                &reaction.emoji,
            )
            .await?
            {
                rewards += 1;
            }
        }
    }
    Ok(rewards)
}
