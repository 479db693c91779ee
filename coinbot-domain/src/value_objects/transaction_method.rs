// Transaction method value object

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionMethod {
    Reaction,
    Transfer,
    SlotMachine,
}

impl TransactionMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionMethod::Reaction => "reaction",
            TransactionMethod::Transfer => "transfer",
            TransactionMethod::SlotMachine => "slot_machine",
        }
    }
}
