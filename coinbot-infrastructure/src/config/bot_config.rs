use std::env;

use tracing::warn;

use coinbot_domain::{BotConfigDocument, BotConfiguration};

/// Environment variables that take precedence over the stored bot document.
pub const BOT_ENV_OVERRIDES: [&str; 3] = ["COIN", "COINS", "COIN_EMOJI_ID"];

/// Applies `COIN`, `COINS` and `COIN_EMOJI_ID` from the environment. Empty
/// values are ignored.
pub fn apply_bot_env_overrides(document: &mut BotConfigDocument) {
    apply_bot_overrides(document, |key| env::var(key).ok());
}

fn apply_bot_overrides(
    document: &mut BotConfigDocument,
    lookup: impl Fn(&str) -> Option<String>,
) {
    for key in BOT_ENV_OVERRIDES {
        let Some(value) = lookup(key).filter(|value| !value.trim().is_empty()) else {
            continue;
        };
        match key {
            "COIN" => document.coin = value,
            "COINS" => document.coins = value,
            _ => document.coin_emoji_id = value,
        }
    }
}

/// Lists the ids that were left at zero, which disables the matching
/// feature until an operator fills them in.
pub fn unset_bot_ids(config: &BotConfiguration) -> Vec<&'static str> {
    let mut unset = Vec::new();
    if config.coin_emoji_id == 0 {
        unset.push("COIN_EMOJI_ID");
    }
    if config.casino_house_id == 0 {
        unset.push("CASINO_HOUSE_ID");
    }
    if config.administrator_id == 0 {
        unset.push("ADMINISTRATOR_ID");
    }
    unset
}

pub fn warn_unset_bot_ids(config: &BotConfiguration) {
    for key in unset_bot_ids(config) {
        warn!(
            "{} has not been set in bot_configuration.json or the environment",
            key
        );
    }
}
