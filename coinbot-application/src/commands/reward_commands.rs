use coinbot_domain::{
    BotConfiguration, EmojiRef, LedgerTransactionRequest, PlatformUser, ReactionEvent,
    TransactionMethod,
};
use tracing::{debug, info};

use crate::commands::ledger_commands::{log_transaction, submit_transaction};
use crate::{AppError, AppState};

pub const REACTION_REWARD: i64 = 1;

/// Only the configured custom coin emoji earns a reward.
pub fn is_reward_emoji(bot: &BotConfiguration, emoji: &EmojiRef) -> bool {
    match emoji.custom_id() {
        Some(id) => id != 0 && id == bot.coin_emoji_id,
        None => false,
    }
}

/// Credits the message author with one coin for a qualifying reaction.
/// Returns `false` when the emoji does not qualify.
pub async fn dispatch_reaction(
    state: &AppState,
    sender: &PlatformUser,
    receiver_id: u64,
    receiver: Option<&PlatformUser>,
    emoji: &EmojiRef,
) -> Result<bool, AppError> {
    if !is_reward_emoji(&state.bot, emoji) {
        return Ok(false);
    }

    let receiver = match receiver {
        Some(receiver) => receiver.clone(),
        None => state
            .platform
            .fetch_user(receiver_id)
            .await?
            .ok_or_else(|| {
                AppError::MalformedIdentity(format!("receiver {} could not be found", receiver_id))
            })?,
    };

    info!(
        "{} ({}) is mining {} {} for {} ({})",
        sender.display_name,
        sender.id,
        REACTION_REWARD,
        state.bot.coin,
        receiver.display_name,
        receiver.id
    );
    let request = LedgerTransactionRequest::between(
        sender.id,
        receiver.id,
        REACTION_REWARD,
        TransactionMethod::Reaction,
    );
    let timestamp = submit_transaction(state, &request).await?;
    log_transaction(
        timestamp,
        &format!(
            "{} ({}) mined {} {} for {} ({}).",
            sender.display_name,
            sender.id,
            REACTION_REWARD,
            state.bot.coin,
            receiver.display_name,
            receiver.id
        ),
    );
    state.metrics.record_reward();
    Ok(true)
}

/// Live reaction path. Reactions outside a guild are ignored.
pub async fn handle_reaction_added(
    state: &AppState,
    event: &ReactionEvent,
) -> Result<bool, AppError> {
    if event.guild_id.is_none() {
        debug!("ignoring reaction on message {} outside a guild", event.message_id);
        return Ok(false);
    }
    dispatch_reaction(
        state,
        &event.sender,
        event.receiver_id,
        event.receiver.as_ref(),
        &event.emoji,
    )
    .await
}
