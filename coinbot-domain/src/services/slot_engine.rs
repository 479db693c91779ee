use rand::distributions::{Distribution, WeightedIndex};
use rand::Rng;
use thiserror::Error;

use crate::entities::{reel_size, AwardConfig, NamedTable, SlotMachineConfig, LOSS_AWARD};

pub const MISMATCH_KEY: &str = "mismatch";
pub const LOSE_KEY: &str = "lose";
pub const WIN_KEY: &str = "win";

#[derive(Debug, Error, PartialEq)]
pub enum SlotError {
    #[error("the slot machine has no reels")]
    NoReels,
    #[error("unknown reel '{0}'")]
    UnknownReel(String),
    #[error("unknown symbol '{0}'")]
    UnknownSymbol(String),
    #[error("amount {amount} must be a positive multiple of {reels}")]
    InvalidAmount { amount: u32, reels: usize },
    #[error("reel '{reel}' would hold more than {max} symbols")]
    ReelFull { reel: String, max: u32 },
    #[error("reel '{reel}' does not hold enough '{symbol}' symbols")]
    NotEnoughSymbols { reel: String, symbol: String },
    #[error("reel '{0}' has no symbols")]
    EmptyReel(String),
    #[error("no award can serve as the top tier")]
    NoTopTierAward,
    #[error("wager must be positive, got {0}")]
    InvalidWager(i64),
    #[error("award '{award}' has min {min} above max {max}")]
    InvalidRange { award: String, min: i64, max: i64 },
    #[error("desired RTP must be a finite positive number")]
    InvalidRtp,
}

/// Result of one lever pull, before any ledger settlement.
#[derive(Debug, Clone, PartialEq)]
pub struct PullOutcome {
    pub symbols: Vec<String>,
    /// Award named by the matching symbols, if all reels agreed.
    pub award: Option<String>,
    pub wager: i64,
    /// Amount paid to the player; zero when the pull lost.
    pub payout: i64,
    pub starting_bonus: bool,
}

impl PullOutcome {
    pub fn is_win(&self) -> bool {
        self.payout > 0
    }

    /// Signed change to the player's balance.
    pub fn net(&self) -> i64 {
        if self.is_win() {
            self.payout
        } else if self.starting_bonus {
            0
        } else {
            -self.wager
        }
    }
}

/// Probability model and pull resolution over a [`SlotMachineConfig`].
#[derive(Debug, Clone, PartialEq)]
pub struct SlotMachine {
    config: SlotMachineConfig,
}

impl SlotMachine {
    pub fn new(config: SlotMachineConfig) -> Self {
        Self { config }
    }

    /// Builds a machine and brings its RTP multiplier and adjusted award
    /// multipliers in line with the current reels.
    pub fn calibrated(config: SlotMachineConfig) -> Self {
        let mut machine = Self::new(config);
        machine.calibrate();
        machine
    }

    pub fn config(&self) -> &SlotMachineConfig {
        &self.config
    }

    pub fn into_config(self) -> SlotMachineConfig {
        self.config
    }

    pub fn validate(&self) -> Result<(), SlotError> {
        validate_config(&self.config)
    }

    /// Probability that every reel lands on `symbol`.
    pub fn probability(&self, symbol: &str) -> f64 {
        if self.config.reels.is_empty() {
            return 0.0;
        }
        let mut overall = 1.0;
        for reel in self.config.reels.values() {
            let total = reel_size(reel);
            let count = reel.get(symbol).copied().unwrap_or(0);
            if total == 0 || count == 0 {
                return 0.0;
            }
            overall *= f64::from(count) / total as f64;
        }
        overall
    }

    pub fn loss_probability(&self) -> f64 {
        let loss = self.loss_award();
        let mut no_award = 1.0;
        for symbol in self.config.symbols() {
            let matched = self.probability(&symbol);
            if loss.as_deref() == Some(symbol.as_str()) {
                no_award *= matched;
            } else {
                no_award *= 1.0 - matched;
            }
        }
        no_award
    }

    /// Per-symbol match probabilities followed by `mismatch`, `lose` and
    /// `win`. The symbol entries and `mismatch` are exclusive and sum to one.
    pub fn probabilities(&self) -> NamedTable<f64> {
        let mut table = NamedTable::new();
        let mut matched_total = 0.0;
        for symbol in self.config.symbols() {
            let probability = self.probability(&symbol);
            matched_total += probability;
            table.insert(symbol, probability);
        }
        table.insert(MISMATCH_KEY, (1.0 - matched_total).max(0.0));
        let lose = self.loss_probability();
        table.insert(LOSE_KEY, lose);
        table.insert(WIN_KEY, 1.0 - lose);
        table
    }

    /// Lowers the RTP multiplier by the expected cost of fixed-amount awards
    /// and returns the new value.
    pub fn calibrate_rtp(&mut self) -> f64 {
        let fixed_cost: f64 = self
            .config
            .awards
            .iter()
            .filter(|(_, award)| award.is_fixed_amount())
            .map(|(name, award)| self.probability(name) * award.amount as f64)
            .sum();
        self.config.rtp_multiplier = self.config.desired_rtp - fixed_cost;
        self.config.rtp_multiplier
    }

    pub fn adjust_award_multipliers(&mut self) {
        let loss = self.loss_award();
        let rtp_multiplier = self.config.rtp_multiplier;
        for (name, award) in self.config.awards.iter_mut() {
            if loss.as_deref() == Some(name) {
                continue;
            }
            award.multiplier_adjusted = award.multiplier * rtp_multiplier;
        }
    }

    pub fn calibrate(&mut self) {
        self.calibrate_rtp();
        self.adjust_award_multipliers();
    }

    /// `lose_wager` when configured, otherwise the first award with a
    /// negative multiplier.
    pub fn loss_award(&self) -> Option<String> {
        if self.config.awards.contains_key(LOSS_AWARD) {
            return Some(LOSS_AWARD.to_string());
        }
        self.config
            .awards
            .iter()
            .find(|(_, award)| award.multiplier < 0.0)
            .map(|(name, _)| name.to_string())
    }

    /// Non-loss award with the highest base multiplier; ties keep the first.
    pub fn top_tier_award(&self) -> Option<String> {
        let loss = self.loss_award();
        let mut best: Option<(&str, f64)> = None;
        for (name, award) in self.config.awards.iter() {
            if loss.as_deref() == Some(name) {
                continue;
            }
            match best {
                Some((_, multiplier)) if award.multiplier <= multiplier => {}
                _ => best = Some((name, award.multiplier)),
            }
        }
        best.map(|(name, _)| name.to_string())
    }

    /// Inclusive payout bounds of an award for a wager.
    pub fn payout_range(&self, award: &AwardConfig, wager: i64) -> (i64, i64) {
        if let (Some(min), Some(max)) = (award.min, award.max) {
            return (min.min(max), min.max(max));
        }
        let value = if award.is_fixed_amount() {
            award.amount
        } else if award.multiplier != 0.0 {
            (wager as f64 * award.multiplier_adjusted).round() as i64
        } else {
            self.config.jackpot_amount.unwrap_or(0)
        };
        (value, value)
    }

    /// Spins every reel once. A starting-bonus pull lands the top-tier
    /// award on every reel and takes no wager.
    pub fn resolve_pull<R: Rng>(
        &self,
        rng: &mut R,
        wager: i64,
        starting_bonus: bool,
    ) -> Result<PullOutcome, SlotError> {
        if wager <= 0 {
            return Err(SlotError::InvalidWager(wager));
        }
        if self.config.reels.is_empty() {
            return Err(SlotError::NoReels);
        }

        let symbols = if starting_bonus {
            let top = self.top_tier_award().ok_or(SlotError::NoTopTierAward)?;
            vec![top; self.config.reels.len()]
        } else {
            self.spin(rng)?
        };

        let matched = symbols
            .first()
            .filter(|first| symbols.iter().all(|symbol| symbol == *first))
            .cloned();
        let loss = self.loss_award();

        let mut payout = 0;
        if let Some(name) = matched.as_deref() {
            if loss.as_deref() != Some(name) {
                if let Some(award) = self.config.awards.get(name) {
                    let (low, high) = self.payout_range(award, wager);
                    payout = if low == high {
                        low
                    } else {
                        rng.gen_range(low..=high)
                    };
                }
            }
        }
        if starting_bonus {
            payout = payout.max(1);
        } else {
            payout = payout.max(0);
        }

        Ok(PullOutcome {
            symbols,
            award: matched,
            wager,
            payout,
            starting_bonus,
        })
    }

    fn spin<R: Rng>(&self, rng: &mut R) -> Result<Vec<String>, SlotError> {
        let mut landed = Vec::with_capacity(self.config.reels.len());
        for (reel_name, reel) in self.config.reels.iter() {
            let names: Vec<&str> = reel.keys().collect();
            let weights: Vec<u64> = reel.values().map(|count| u64::from(*count)).collect();
            let index = WeightedIndex::new(&weights)
                .map_err(|_| SlotError::EmptyReel(reel_name.to_string()))?;
            landed.push(names[index.sample(rng)].to_string());
        }
        Ok(landed)
    }

    /// Returns a recalibrated copy with `amount` more of `symbol`. Without a
    /// reel the amount is split evenly across all reels.
    pub fn with_symbols_added(
        &self,
        symbol: &str,
        amount: Option<u32>,
        reel: Option<&str>,
    ) -> Result<Self, SlotError> {
        self.edited(symbol, amount, reel, true)
    }

    pub fn with_symbols_removed(
        &self,
        symbol: &str,
        amount: Option<u32>,
        reel: Option<&str>,
    ) -> Result<Self, SlotError> {
        self.edited(symbol, amount, reel, false)
    }

    fn edited(
        &self,
        symbol: &str,
        amount: Option<u32>,
        reel: Option<&str>,
        add: bool,
    ) -> Result<Self, SlotError> {
        let reel_count = self.config.reels.len();
        if reel_count == 0 {
            return Err(SlotError::NoReels);
        }
        if !self.config.awards.contains_key(symbol) {
            return Err(SlotError::UnknownSymbol(symbol.to_string()));
        }

        let (targets, per_reel): (Vec<String>, u32) = match reel {
            Some(name) => {
                if !self.config.reels.contains_key(name) {
                    return Err(SlotError::UnknownReel(name.to_string()));
                }
                let amount = amount.unwrap_or(1);
                if amount == 0 {
                    return Err(SlotError::InvalidAmount { amount, reels: 1 });
                }
                (vec![name.to_string()], amount)
            }
            None => {
                let amount = amount.unwrap_or(reel_count as u32);
                if amount == 0 || amount as usize % reel_count != 0 {
                    return Err(SlotError::InvalidAmount {
                        amount,
                        reels: reel_count,
                    });
                }
                let names = self.config.reels.keys().map(str::to_string).collect();
                (names, amount / reel_count as u32)
            }
        };

        let mut config = self.config.clone();
        let max = config.max_reel_symbols;
        for name in &targets {
            let Some(symbols) = config.reels.get_mut(name) else {
                return Err(SlotError::UnknownReel(name.clone()));
            };
            let current = symbols.get(symbol).copied().unwrap_or(0);
            let updated = if add {
                let full = || SlotError::ReelFull {
                    reel: name.clone(),
                    max,
                };
                if reel_size(symbols) + u64::from(per_reel) > u64::from(max) {
                    return Err(full());
                }
                current.checked_add(per_reel).ok_or_else(full)?
            } else {
                current
                    .checked_sub(per_reel)
                    .ok_or_else(|| SlotError::NotEnoughSymbols {
                        reel: name.clone(),
                        symbol: symbol.to_string(),
                    })?
            };
            symbols.insert(symbol, updated);
        }

        Ok(Self::calibrated(config))
    }

    /// Human readable summary used as the reply to a reel edit.
    pub fn reels_report(&self) -> String {
        let mut reels_table = String::new();
        for (reel, symbols) in self.config.reels.iter() {
            reels_table.push_str(&format!("{}:\n", reel));
            for (symbol, count) in symbols.iter() {
                reels_table.push_str(&format!("{}: {}\n", symbol, count));
            }
            reels_table.push_str(&format!("Total: {}\n\n", reel_size(symbols)));
        }

        let mut probabilities_table = String::new();
        for (symbol, probability) in self.probabilities().iter() {
            probabilities_table.push_str(&format!("{}: {}\n", symbol, format_percent(*probability)));
        }

        format!(
            "Reels:\n{}\nSymbols total:\n{}\n\nProbabilities:\n{}\nDesired RTP:\n{}%\n\nRTP multiplier:\n{}%",
            reels_table,
            self.config.count_symbols(),
            probabilities_table,
            round_to(self.config.desired_rtp * 100.0, PERCENT_DIGITS),
            round_to(self.config.rtp_multiplier * 100.0, PERCENT_DIGITS),
        )
    }
}

const PERCENT_DIGITS: i32 = 4;

fn round_to(value: f64, digits: i32) -> f64 {
    let scale = 10f64.powi(digits);
    (value * scale).round() / scale
}

fn format_percent(probability: f64) -> String {
    let percentage = probability * 100.0;
    let rounded = round_to(percentage, PERCENT_DIGITS);
    let smallest = 10f64.powi(-PERCENT_DIGITS);
    if percentage == rounded {
        format!("{}%", percentage)
    } else if percentage > smallest {
        format!("~{}%", rounded)
    } else {
        format!("<{}%", smallest)
    }
}

pub fn validate_config(config: &SlotMachineConfig) -> Result<(), SlotError> {
    if config.reels.is_empty() {
        return Err(SlotError::NoReels);
    }
    if !config.desired_rtp.is_finite() || config.desired_rtp <= 0.0 {
        return Err(SlotError::InvalidRtp);
    }
    for (reel_name, symbols) in config.reels.iter() {
        for symbol in symbols.keys() {
            if !config.awards.contains_key(symbol) {
                return Err(SlotError::UnknownSymbol(symbol.to_string()));
            }
        }
        if reel_size(symbols) > u64::from(config.max_reel_symbols) {
            return Err(SlotError::ReelFull {
                reel: reel_name.to_string(),
                max: config.max_reel_symbols,
            });
        }
    }
    for (name, award) in config.awards.iter() {
        if let (Some(min), Some(max)) = (award.min, award.max) {
            if min > max {
                return Err(SlotError::InvalidRange {
                    award: name.to_string(),
                    min,
                    max,
                });
            }
        }
    }
    Ok(())
}
