// In-memory port fakes for application tests

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use coinbot_domain::ports::{
    ChatPlatform, CheckpointRepository, ConfigRepository, Ledger, SaveDataRepository,
};
use coinbot_domain::services::SlotMachine;
use coinbot_domain::{
    BotConfigDocument, BotConfiguration, ChannelCheckpoint, ChannelRef, EmojiRef, HistoryMessage,
    HistoryReaction, LedgerTransactionRequest, PlatformUser, RuntimeConfig, SlotMachineConfig,
    TransactionMethod, UserHash, UserSaveRecord,
};
use tokio::sync::RwLock;

use crate::{AppState, Metrics, Shutdown};

pub const ADMIN_ID: u64 = 1;
pub const CASINO_ID: u64 = 500;
pub const COIN_EMOJI_ID: u64 = 900;
pub const GUILD_ID: u64 = 77;

pub fn coin_emoji() -> EmojiRef {
    EmojiRef::Custom {
        id: COIN_EMOJI_ID,
        name: "coin".to_string(),
    }
}

pub fn user(id: u64) -> PlatformUser {
    PlatformUser::new(id, format!("user{}", id))
}

pub fn channel(channel_id: u64) -> ChannelRef {
    ChannelRef {
        guild_id: GUILD_ID,
        guild_name: "guild".to_string(),
        channel_id,
        channel_name: format!("channel-{}", channel_id),
    }
}

/// A history message with `count` coin reactions.
pub fn message(channel_id: u64, message_id: u64, author: u64, coin_reactions: u32) -> HistoryMessage {
    let reactions = if coin_reactions > 0 {
        vec![HistoryReaction {
            emoji: coin_emoji(),
            count: coin_reactions,
        }]
    } else {
        Vec::new()
    };
    HistoryMessage {
        message_id,
        channel_id,
        author: user(author),
        reactions,
        timestamp: Utc::now(),
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[derive(Default)]
struct LedgerInner {
    submitted: Vec<LedgerTransactionRequest>,
    balances: HashMap<UserHash, i64>,
    fail_submit: bool,
    chain_broken: bool,
}

#[derive(Default)]
pub struct FakeLedger {
    inner: Mutex<LedgerInner>,
}

impl FakeLedger {
    pub fn submitted(&self) -> Vec<LedgerTransactionRequest> {
        lock(&self.inner).submitted.clone()
    }

    pub fn set_balance(&self, user_id: u64, balance: i64) {
        lock(&self.inner)
            .balances
            .insert(UserHash::from_user_id(user_id), balance);
    }

    pub fn fail_submissions(&self) {
        lock(&self.inner).fail_submit = true;
    }

    pub fn break_chain(&self) {
        lock(&self.inner).chain_broken = true;
    }
}

#[async_trait]
impl Ledger for FakeLedger {
    async fn submit_transaction(&self, request: &LedgerTransactionRequest) -> anyhow::Result<()> {
        let mut inner = lock(&self.inner);
        if inner.fail_submit {
            anyhow::bail!("ledger offline");
        }
        if request.method != TransactionMethod::Reaction {
            *inner.balances.entry(request.sender_hash.clone()).or_insert(0) -= request.amount;
        }
        *inner
            .balances
            .entry(request.receiver_hash.clone())
            .or_insert(0) += request.amount;
        inner.submitted.push(request.clone());
        Ok(())
    }

    async fn get_balance(&self, user: &UserHash) -> anyhow::Result<Option<i64>> {
        Ok(lock(&self.inner).balances.get(user).copied())
    }

    async fn last_transaction_timestamp(&self) -> anyhow::Result<Option<DateTime<Utc>>> {
        let inner = lock(&self.inner);
        if inner.submitted.is_empty() {
            return Ok(None);
        }
        Ok(Utc.timestamp_opt(1_700_000_000, 0).single())
    }

    async fn validate_chain(&self) -> anyhow::Result<bool> {
        Ok(!lock(&self.inner).chain_broken)
    }
}

#[derive(Default)]
struct PlatformInner {
    history: HashMap<u64, Vec<HistoryMessage>>,
    reaction_users: HashMap<u64, Vec<PlatformUser>>,
    users: HashMap<u64, PlatformUser>,
    channels: Vec<ChannelRef>,
    emojis: HashMap<u64, String>,
    sent: Vec<(u64, String)>,
    history_calls: usize,
    listing_fails: bool,
}

#[derive(Default)]
pub struct FakePlatform {
    inner: Mutex<PlatformInner>,
}

impl FakePlatform {
    /// Replaces a channel's history; messages are given newest first.
    pub fn set_history(&self, channel_id: u64, messages: Vec<HistoryMessage>) {
        lock(&self.inner).history.insert(channel_id, messages);
    }

    /// Prepends newer messages to a channel's history.
    pub fn push_newer(&self, channel_id: u64, mut messages: Vec<HistoryMessage>) {
        let mut inner = lock(&self.inner);
        let history = inner.history.entry(channel_id).or_default();
        messages.append(history);
        *history = messages;
    }

    pub fn set_reaction_users(&self, message_id: u64, users: Vec<PlatformUser>) {
        lock(&self.inner).reaction_users.insert(message_id, users);
    }

    pub fn add_user(&self, user: PlatformUser) {
        lock(&self.inner).users.insert(user.id, user);
    }

    pub fn add_channel(&self, channel: ChannelRef) {
        lock(&self.inner).channels.push(channel);
    }

    pub fn add_emoji(&self, id: u64, rendered: &str) {
        lock(&self.inner).emojis.insert(id, rendered.to_string());
    }

    pub fn sent(&self) -> Vec<(u64, String)> {
        lock(&self.inner).sent.clone()
    }

    pub fn fail_channel_listing(&self) {
        lock(&self.inner).listing_fails = true;
    }

    pub fn history_calls(&self) -> usize {
        lock(&self.inner).history_calls
    }
}

#[async_trait]
impl ChatPlatform for FakePlatform {
    async fn history(
        &self,
        channel_id: u64,
        before: Option<u64>,
        limit: usize,
    ) -> anyhow::Result<Vec<HistoryMessage>> {
        let mut inner = lock(&self.inner);
        inner.history_calls += 1;
        let messages = inner.history.get(&channel_id).cloned().unwrap_or_default();
        let start = match before {
            Some(id) => messages
                .iter()
                .position(|message| message.message_id == id)
                .map(|index| index + 1)
                .unwrap_or(messages.len()),
            None => 0,
        };
        Ok(messages.into_iter().skip(start).take(limit).collect())
    }

    async fn reaction_users(
        &self,
        _channel_id: u64,
        message_id: u64,
        _emoji: &EmojiRef,
    ) -> anyhow::Result<Vec<PlatformUser>> {
        Ok(lock(&self.inner)
            .reaction_users
            .get(&message_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn fetch_user(&self, user_id: u64) -> anyhow::Result<Option<PlatformUser>> {
        Ok(lock(&self.inner).users.get(&user_id).cloned())
    }

    async fn channel(&self, channel_id: u64) -> anyhow::Result<Option<ChannelRef>> {
        Ok(lock(&self.inner)
            .channels
            .iter()
            .find(|channel| channel.channel_id == channel_id)
            .cloned())
    }

    async fn text_channels(&self) -> anyhow::Result<Vec<ChannelRef>> {
        let inner = lock(&self.inner);
        if inner.listing_fails {
            anyhow::bail!("channel listing unavailable");
        }
        Ok(inner.channels.clone())
    }

    async fn resolve_emoji(&self, emoji_id: u64) -> anyhow::Result<Option<String>> {
        Ok(lock(&self.inner).emojis.get(&emoji_id).cloned())
    }

    async fn send_message(&self, channel_id: u64, content: &str) -> anyhow::Result<()> {
        lock(&self.inner).sent.push((channel_id, content.to_string()));
        Ok(())
    }
}

pub struct MemoryCheckpoints {
    capacity: usize,
    initialized: Mutex<HashSet<(u64, u64)>>,
    windows: Mutex<HashMap<(u64, u64), ChannelCheckpoint>>,
}

impl MemoryCheckpoints {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            initialized: Mutex::new(HashSet::new()),
            windows: Mutex::new(HashMap::new()),
        }
    }

    pub fn window(&self, guild_id: u64, channel_id: u64) -> Vec<u64> {
        lock(&self.windows)
            .get(&(guild_id, channel_id))
            .map(ChannelCheckpoint::ids)
            .unwrap_or_default()
    }
}

#[async_trait]
impl CheckpointRepository for MemoryCheckpoints {
    async fn initialize(&self, channel: &ChannelRef) -> anyhow::Result<()> {
        lock(&self.initialized).insert((channel.guild_id, channel.channel_id));
        Ok(())
    }

    async fn is_initialized(&self, guild_id: u64, channel_id: u64) -> anyhow::Result<bool> {
        Ok(lock(&self.initialized).contains(&(guild_id, channel_id)))
    }

    async fn record_event(
        &self,
        guild_id: u64,
        channel_id: u64,
        message_id: u64,
    ) -> anyhow::Result<ChannelCheckpoint> {
        lock(&self.initialized).insert((guild_id, channel_id));
        let mut windows = lock(&self.windows);
        let checkpoint = windows
            .entry((guild_id, channel_id))
            .or_insert_with(|| ChannelCheckpoint::new(channel_id, guild_id, self.capacity));
        checkpoint.record(message_id);
        Ok(checkpoint.clone())
    }

    async fn load_window(&self, guild_id: u64, channel_id: u64) -> anyhow::Result<Vec<u64>> {
        Ok(self.window(guild_id, channel_id))
    }

    async fn delete_all(&self) -> anyhow::Result<()> {
        lock(&self.initialized).clear();
        lock(&self.windows).clear();
        Ok(())
    }
}

#[derive(Default)]
pub struct MemorySaveData {
    records: Mutex<HashMap<u64, UserSaveRecord>>,
}

#[async_trait]
impl SaveDataRepository for MemorySaveData {
    async fn load(&self, user_id: u64) -> anyhow::Result<Option<UserSaveRecord>> {
        Ok(lock(&self.records).get(&user_id).cloned())
    }

    async fn set(&self, user: &PlatformUser, key: &str, value: &str) -> anyhow::Result<()> {
        let mut records = lock(&self.records);
        let record = records
            .entry(user.id)
            .or_insert_with(|| UserSaveRecord::for_user(user.id, user.display_name.clone()));
        record.set(key, value);
        Ok(())
    }
}

pub struct MemoryConfig {
    slot_machine: Mutex<Option<SlotMachineConfig>>,
    bot: Mutex<BotConfigDocument>,
}

impl MemoryConfig {
    pub fn new(slot_machine: SlotMachineConfig) -> Self {
        Self {
            slot_machine: Mutex::new(Some(slot_machine)),
            bot: Mutex::new(BotConfigDocument::default()),
        }
    }

    pub fn stored_slot_machine(&self) -> Option<SlotMachineConfig> {
        lock(&self.slot_machine).clone()
    }
}

#[async_trait]
impl ConfigRepository for MemoryConfig {
    async fn load_slot_machine(&self) -> anyhow::Result<SlotMachineConfig> {
        let mut stored = lock(&self.slot_machine);
        Ok(stored.get_or_insert_with(SlotMachineConfig::template).clone())
    }

    async fn save_slot_machine(&self, config: &SlotMachineConfig) -> anyhow::Result<()> {
        *lock(&self.slot_machine) = Some(config.clone());
        Ok(())
    }

    async fn load_bot_config(&self) -> anyhow::Result<BotConfigDocument> {
        Ok(lock(&self.bot).clone())
    }

    async fn save_bot_config(&self, config: &BotConfigDocument) -> anyhow::Result<()> {
        *lock(&self.bot) = config.clone();
        Ok(())
    }
}

/// Twenty symbols per reel with known probabilities; every award has an
/// emoji id equal to its position plus 100.
pub fn sample_slot_machine() -> SlotMachineConfig {
    let mut config = SlotMachineConfig::template();
    for (index, award) in config.awards.values_mut().enumerate() {
        award.emoji = 100 + index as u64;
    }
    let counts = [
        ("lose_wager", 5u32),
        ("small_win", 5),
        ("medium_win", 5),
        ("high_win", 1),
        ("very_high_win", 3),
        ("jackpot", 1),
    ];
    for reel in config.reels.values_mut() {
        *reel = counts.iter().map(|(name, count)| (*name, *count)).collect();
    }
    config
}

pub struct TestHarness {
    pub state: AppState,
    pub ledger: Arc<FakeLedger>,
    pub platform: Arc<FakePlatform>,
    pub checkpoints: Arc<MemoryCheckpoints>,
    pub configs: Arc<MemoryConfig>,
}

impl TestHarness {
    pub fn new() -> Self {
        Self::with_slot_machine(sample_slot_machine())
    }

    pub fn with_slot_machine(slot_config: SlotMachineConfig) -> Self {
        let ledger = Arc::new(FakeLedger::default());
        let platform = Arc::new(FakePlatform::default());
        let checkpoints = Arc::new(MemoryCheckpoints::new(3));
        let saves = Arc::new(MemorySaveData::default());
        let configs = Arc::new(MemoryConfig::new(slot_config.clone()));

        for index in 0..slot_config.awards.len() {
            let id = 100 + index as u64;
            platform.add_emoji(id, &format!("<:s{}:{}>", index, id));
        }

        let state = AppState {
            config: RuntimeConfig {
                bind_addr: "127.0.0.1:0".to_string(),
                server_token: Some("secret".to_string()),
                checkpoints_dir: "unused".to_string(),
                save_data_dir: "unused".to_string(),
                slot_machine_path: "unused".to_string(),
                bot_config_path: "unused".to_string(),
                checkpoint_capacity: 3,
                history_page_size: 2,
                max_body_bytes: 1024 * 1024,
                request_timeout_seconds: 5,
            },
            bot: BotConfiguration {
                coin: "coin".to_string(),
                coins: "coins".to_string(),
                coin_emoji_id: COIN_EMOJI_ID,
                casino_house_id: CASINO_ID,
                administrator_id: ADMIN_ID,
            },
            checkpoint_repo: checkpoints.clone(),
            save_repo: saves,
            config_repo: configs.clone(),
            ledger: ledger.clone(),
            platform: platform.clone(),
            slot_machine: Arc::new(RwLock::new(SlotMachine::calibrated(slot_config))),
            active_players: Arc::new(Mutex::new(HashSet::new())),
            metrics: Arc::new(Metrics::default()),
            shutdown: Shutdown::new(),
        };

        Self {
            state,
            ledger,
            platform,
            checkpoints,
            configs,
        }
    }
}
