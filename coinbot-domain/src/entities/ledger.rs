// Ledger transaction entity

use serde::{Deserialize, Serialize};

use crate::value_objects::{TransactionMethod, UserHash};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerTransactionRequest {
    #[serde(rename = "sender")]
    pub sender_hash: UserHash,
    #[serde(rename = "receiver")]
    pub receiver_hash: UserHash,
    pub amount: i64,
    pub method: TransactionMethod,
}

impl LedgerTransactionRequest {
    pub fn between(sender_id: u64, receiver_id: u64, amount: i64, method: TransactionMethod) -> Self {
        Self {
            sender_hash: UserHash::from_user_id(sender_id),
            receiver_hash: UserHash::from_user_id(receiver_id),
            amount,
            method,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_with_ledger_field_names() {
        let request = LedgerTransactionRequest::between(1, 2, 1, TransactionMethod::Reaction);
        let value = serde_json::to_value(&request).expect("serialize");
        assert_eq!(value["method"], "reaction");
        assert_eq!(value["amount"], 1);
        assert_eq!(value["sender"], UserHash::from_user_id(1).0);
        assert_eq!(value["receiver"], UserHash::from_user_id(2).0);
    }
}
