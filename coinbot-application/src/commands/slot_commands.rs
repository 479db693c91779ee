use coinbot_domain::services::{PullOutcome, SlotMachine};
use coinbot_domain::{
    LedgerTransactionRequest, PlatformUser, TransactionMethod, FLAG_TRUE, STARTING_BONUS_KEY,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::info;

use crate::commands::ledger_commands::{ledger_balance, log_transaction, submit_transaction};
use crate::{AppError, AppState};

pub const DEFAULT_WAGER: i64 = 1;

#[derive(Debug, Clone, PartialEq)]
pub struct PullReply {
    pub outcome: PullOutcome,
    /// Rendered emoji for each landed symbol, in reel order.
    pub emojis: Vec<String>,
    pub message: String,
}

/// Removes the player from the active set when the pull finishes.
struct ActivePlayer<'a> {
    state: &'a AppState,
    user_id: u64,
}

impl<'a> ActivePlayer<'a> {
    fn claim(state: &'a AppState, user_id: u64) -> Result<Self, AppError> {
        let mut active = state
            .active_players
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if !active.insert(user_id) {
            return Err(AppError::PullInProgress);
        }
        Ok(Self { state, user_id })
    }
}

impl Drop for ActivePlayer<'_> {
    fn drop(&mut self) {
        let mut active = self
            .state
            .active_players
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        active.remove(&self.user_id);
    }
}

pub async fn pull(
    state: &AppState,
    player: &PlatformUser,
    wager: Option<i64>,
) -> Result<PullReply, AppError> {
    let mut rng = StdRng::from_entropy();
    pull_with_rng(state, player, wager, &mut rng).await
}

/// One lever pull: draw, resolve emojis, settle with the casino house,
/// then persist the starting-bonus flag.
pub async fn pull_with_rng<R: Rng + Send>(
    state: &AppState,
    player: &PlatformUser,
    wager: Option<i64>,
    rng: &mut R,
) -> Result<PullReply, AppError> {
    let _active = ActivePlayer::claim(state, player.id)?;
    let wager = wager.unwrap_or(DEFAULT_WAGER);
    if wager <= 0 {
        return Err(AppError::BadRequest(format!("wager must be positive, got {}", wager)));
    }

    let bonus_received = state
        .save_repo
        .get(player.id, STARTING_BONUS_KEY)
        .await?
        .as_deref()
        == Some(FLAG_TRUE);
    let starting_bonus = !bonus_received;
    // The bonus never scales with the requested wager.
    let wager = if starting_bonus { DEFAULT_WAGER } else { wager };

    if !starting_bonus {
        let balance = ledger_balance(state, player.id).await?;
        if balance < wager {
            return Err(AppError::InsufficientBalance {
                balance,
                required: wager,
            });
        }
    }

    let (outcome, emoji_ids) = {
        let machine = state.slot_machine.read().await;
        let outcome = machine.resolve_pull(rng, wager, starting_bonus)?;
        let emoji_ids = symbol_emojis(&machine, &outcome.symbols);
        (outcome, emoji_ids)
    };

    let mut emojis = Vec::with_capacity(emoji_ids.len());
    for emoji_id in emoji_ids {
        let rendered = state
            .platform
            .resolve_emoji(emoji_id)
            .await?
            .ok_or(AppError::EmojiResolution { emoji_id })?;
        emojis.push(rendered);
    }

    let casino = state.bot.casino_house_id;
    let coins = &state.bot.coins;
    let (request, line, message) = if outcome.is_win() {
        let request = LedgerTransactionRequest::between(
            casino,
            player.id,
            outcome.payout,
            TransactionMethod::SlotMachine,
        );
        if starting_bonus {
            (
                request,
                format!(
                    "{} ({}) pulled the lever and received a starting bonus of {} {}.",
                    player.display_name, player.id, outcome.payout, coins
                ),
                format!(
                    "The first time you play, you are guaranteed to win! {} You won a starting bonus of {} {}!",
                    player.mention(),
                    outcome.payout,
                    coins
                ),
            )
        } else {
            (
                request,
                format!(
                    "{} ({}) pulled the lever and won {} {}.",
                    player.display_name, player.id, outcome.payout, coins
                ),
                format!(
                    "{} Congratulations! You won {} {}!",
                    player.mention(),
                    outcome.payout,
                    coins
                ),
            )
        }
    } else {
        (
            LedgerTransactionRequest::between(
                player.id,
                casino,
                wager,
                TransactionMethod::SlotMachine,
            ),
            format!(
                "{} ({}) pulled the lever and lost {} {}.",
                player.display_name, player.id, wager, coins
            ),
            format!("{} Sorry, you lost {} {}.", player.mention(), wager, coins),
        )
    };

    let timestamp = submit_transaction(state, &request).await?;
    log_transaction(timestamp, &line);

    if starting_bonus {
        state
            .save_repo
            .set(player, STARTING_BONUS_KEY, FLAG_TRUE)
            .await?;
    }
    state.metrics.record_pull(starting_bonus);
    info!("{}", line);

    let message = format!("{}\n{}", emojis.join(" "), message);
    Ok(PullReply {
        outcome,
        emojis,
        message,
    })
}

fn symbol_emojis(machine: &SlotMachine, symbols: &[String]) -> Vec<u64> {
    symbols
        .iter()
        .map(|symbol| {
            machine
                .config()
                .awards
                .get(symbol)
                .map(|award| award.emoji)
                .unwrap_or(0)
        })
        .collect()
}

/// Reel edit request from the `/reels` command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReelEdit {
    pub add_symbol: Option<String>,
    pub remove_symbol: Option<String>,
    pub amount: Option<u32>,
    pub reel: Option<String>,
}

/// Applies a reel edit, recalibrates and persists. A rejected edit leaves
/// both the stored and the in-memory machine untouched. Returns the reels
/// report.
pub async fn edit_reels(state: &AppState, edit: &ReelEdit) -> Result<String, AppError> {
    let mut machine = state.slot_machine.write().await;
    let mut edited = machine.clone();
    if let Some(symbol) = edit.add_symbol.as_deref() {
        edited = edited.with_symbols_added(symbol, edit.amount, edit.reel.as_deref())?;
    }
    if let Some(symbol) = edit.remove_symbol.as_deref() {
        edited = edited.with_symbols_removed(symbol, edit.amount, edit.reel.as_deref())?;
    }
    if edit.add_symbol.is_none() && edit.remove_symbol.is_none() {
        edited.calibrate();
    }

    state.config_repo.save_slot_machine(edited.config()).await?;
    *machine = edited;
    info!(
        "slot machine reels saved; rtp multiplier {}",
        machine.config().rtp_multiplier
    );
    Ok(machine.reels_report())
}
