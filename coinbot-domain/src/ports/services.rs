use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::entities::{ChannelRef, EmojiRef, HistoryMessage, LedgerTransactionRequest, PlatformUser};
use crate::value_objects::UserHash;

/// The external token ledger. Submissions are awaited inline and never
/// retried; any error is treated as fatal by the caller.
#[async_trait]
pub trait Ledger: Send + Sync {
    async fn submit_transaction(&self, request: &LedgerTransactionRequest) -> anyhow::Result<()>;
    /// `None` when the ledger has never seen the user.
    async fn get_balance(&self, user: &UserHash) -> anyhow::Result<Option<i64>>;
    async fn last_transaction_timestamp(&self) -> anyhow::Result<Option<DateTime<Utc>>>;
    async fn validate_chain(&self) -> anyhow::Result<bool>;
}

#[async_trait]
pub trait ChatPlatform: Send + Sync {
    /// Messages strictly older than `before` (or the newest when `None`),
    /// newest first, at most `limit`.
    async fn history(
        &self,
        channel_id: u64,
        before: Option<u64>,
        limit: usize,
    ) -> anyhow::Result<Vec<HistoryMessage>>;
    async fn reaction_users(
        &self,
        channel_id: u64,
        message_id: u64,
        emoji: &EmojiRef,
    ) -> anyhow::Result<Vec<PlatformUser>>;
    async fn fetch_user(&self, user_id: u64) -> anyhow::Result<Option<PlatformUser>>;
    /// `None` when the channel is not a guild text channel.
    async fn channel(&self, channel_id: u64) -> anyhow::Result<Option<ChannelRef>>;
    async fn text_channels(&self) -> anyhow::Result<Vec<ChannelRef>>;
    /// Renders a custom emoji for message text; `None` when the bot cannot
    /// see it.
    async fn resolve_emoji(&self, emoji_id: u64) -> anyhow::Result<Option<String>>;
    async fn send_message(&self, channel_id: u64, content: &str) -> anyhow::Result<()>;
}
