// Runtime and bot configuration entities

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub bind_addr: String,
    pub server_token: Option<String>,
    pub checkpoints_dir: String,
    pub save_data_dir: String,
    pub slot_machine_path: String,
    pub bot_config_path: String,
    pub checkpoint_capacity: usize,
    pub history_page_size: usize,
    pub max_body_bytes: u64,
    pub request_timeout_seconds: u64,
}

/// Operator-editable bot document. Every value is stored as a string to stay
/// compatible with files written by earlier releases.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BotConfigDocument {
    #[serde(rename = "COIN")]
    pub coin: String,
    #[serde(rename = "COINS")]
    pub coins: String,
    #[serde(rename = "COIN_EMOJI_ID")]
    pub coin_emoji_id: String,
    #[serde(rename = "CASINO_HOUSE_ID")]
    pub casino_house_id: String,
    #[serde(rename = "ADMINISTRATOR_ID")]
    pub administrator_id: String,
}

impl Default for BotConfigDocument {
    fn default() -> Self {
        Self {
            coin: "coin".to_string(),
            coins: "coins".to_string(),
            coin_emoji_id: "0".to_string(),
            casino_house_id: "0".to_string(),
            administrator_id: "0".to_string(),
        }
    }
}

/// Parsed form of [`BotConfigDocument`] used by the rest of the bot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BotConfiguration {
    pub coin: String,
    pub coins: String,
    pub coin_emoji_id: u64,
    pub casino_house_id: u64,
    pub administrator_id: u64,
}

impl BotConfiguration {
    pub fn from_document(document: &BotConfigDocument) -> anyhow::Result<Self> {
        Ok(Self {
            coin: document.coin.clone(),
            coins: document.coins.clone(),
            coin_emoji_id: parse_id("COIN_EMOJI_ID", &document.coin_emoji_id)?,
            casino_house_id: parse_id("CASINO_HOUSE_ID", &document.casino_house_id)?,
            administrator_id: parse_id("ADMINISTRATOR_ID", &document.administrator_id)?,
        })
    }

    /// Unit name for an amount, singular only for exactly one.
    pub fn unit(&self, amount: i64) -> &str {
        if amount.abs() == 1 {
            &self.coin
        } else {
            &self.coins
        }
    }
}

fn parse_id(key: &str, value: &str) -> anyhow::Result<u64> {
    value
        .trim()
        .parse::<u64>()
        .map_err(|_| anyhow::anyhow!("{} must be a numeric id, got {:?}", key, value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_document_parses_to_zero_ids() {
        let config = BotConfiguration::from_document(&BotConfigDocument::default()).expect("parse");
        assert_eq!(config.coin_emoji_id, 0);
        assert_eq!(config.casino_house_id, 0);
        assert_eq!(config.unit(1), "coin");
        assert_eq!(config.unit(5), "coins");
    }

    #[test]
    fn rejects_non_numeric_ids() {
        let document = BotConfigDocument {
            coin_emoji_id: "abc".to_string(),
            ..BotConfigDocument::default()
        };
        assert!(BotConfiguration::from_document(&document).is_err());
    }

    #[test]
    fn document_uses_upper_case_keys() {
        let text = serde_json::to_string(&BotConfigDocument::default()).expect("serialize");
        assert_eq!(
            text,
            r#"{"COIN":"coin","COINS":"coins","COIN_EMOJI_ID":"0","CASINO_HOUSE_ID":"0","ADMINISTRATOR_ID":"0"}"#
        );
    }
}
