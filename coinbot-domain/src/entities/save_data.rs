// User save record entity

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

pub const STARTING_BONUS_KEY: &str = "starting_bonus_received";
pub const FLAG_TRUE: &str = "True";

/// Per-user key/value record. Older files carry a single key and no
/// identity fields, so both are optional on read.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSaveRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_name: Option<String>,
    #[serde(flatten)]
    pub values: BTreeMap<String, String>,
}

impl UserSaveRecord {
    pub fn for_user(user_id: u64, user_name: impl Into<String>) -> Self {
        Self {
            user_id: Some(user_id),
            user_name: Some(user_name.into()),
            values: BTreeMap::new(),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    /// Merges one key into the record, leaving the others untouched.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.insert(key.into(), value.into());
    }

    pub fn starting_bonus_received(&self) -> bool {
        self.get(STARTING_BONUS_KEY) == Some(FLAG_TRUE)
    }
}
