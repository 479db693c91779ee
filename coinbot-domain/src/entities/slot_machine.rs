// Slot machine configuration entity
// Persisted as slot_machine.json; key order is part of the file format

use serde::{Deserialize, Serialize};

use crate::entities::NamedTable;

pub const LOSS_AWARD: &str = "lose_wager";

pub type Reel = NamedTable<u32>;

/// Symbols on one reel. Summed as `u64` so operator-supplied counts cannot
/// overflow.
pub fn reel_size(reel: &Reel) -> u64 {
    reel.values().map(|count| u64::from(*count)).sum()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AwardConfig {
    /// Custom emoji id shown for this symbol; 0 when not configured.
    pub emoji: u64,
    /// Fixed payout; non-zero only for fixed-amount awards.
    pub amount: i64,
    pub multiplier: f64,
    pub multiplier_adjusted: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<i64>,
}

impl AwardConfig {
    pub fn new(emoji: u64, amount: i64, multiplier: f64) -> Self {
        Self {
            emoji,
            amount,
            multiplier,
            multiplier_adjusted: multiplier,
            min: None,
            max: None,
        }
    }

    /// A fixed award pays its amount regardless of the wager and is funded
    /// out of the RTP budget before multipliers are scaled.
    pub fn is_fixed_amount(&self) -> bool {
        self.amount > 0 && self.multiplier == 0.0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlotMachineConfig {
    pub awards: NamedTable<AwardConfig>,
    pub reels: NamedTable<Reel>,
    pub max_reel_symbols: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jackpot_amount: Option<i64>,
    pub desired_rtp: f64,
    pub rtp_multiplier: f64,
}

impl SlotMachineConfig {
    /// The documented template written when no configuration exists yet.
    pub fn template() -> Self {
        let awards: NamedTable<AwardConfig> = [
            (LOSS_AWARD, AwardConfig::new(0, 0, -1.0)),
            ("small_win", AwardConfig::new(0, 1, 0.0)),
            ("medium_win", AwardConfig::new(0, 0, 2.0)),
            ("high_win", AwardConfig::new(0, 1000, 0.0)),
            ("very_high_win", AwardConfig::new(0, 0, 10.0)),
            ("jackpot", AwardConfig::new(0, 0, 0.0)),
        ]
        .into_iter()
        .collect();

        let empty_reel: Reel = awards.keys().map(|name| (name.to_string(), 0u32)).collect();
        let reels: NamedTable<Reel> = ["reel_1", "reel_2", "reel_3"]
            .into_iter()
            .map(|name| (name, empty_reel.clone()))
            .collect();

        Self {
            awards,
            reels,
            max_reel_symbols: 20,
            jackpot_amount: Some(0),
            desired_rtp: 0.8,
            rtp_multiplier: 0.8,
        }
    }

    /// Total number of symbols over all reels.
    pub fn count_symbols(&self) -> u64 {
        self.reels.values().map(reel_size).sum()
    }

    /// Symbol names in order of first appearance across reels.
    pub fn symbols(&self) -> Vec<String> {
        let mut names: Vec<String> = Vec::new();
        for reel in self.reels.values() {
            for name in reel.keys() {
                if !names.iter().any(|known| known == name) {
                    names.push(name.to_string());
                }
            }
        }
        names
    }
}
