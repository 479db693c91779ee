use coinbot_domain::SlotError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("unauthorized")]
    Unauthorized,
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("invalid configuration: {0}")]
    ConfigInvalid(String),
    #[error(transparent)]
    Slot(#[from] SlotError),
    #[error("emoji {emoji_id} could not be resolved")]
    EmojiResolution { emoji_id: u64 },
    #[error("malformed identity: {0}")]
    MalformedIdentity(String),
    #[error("insufficient balance: have {balance}, need {required}")]
    InsufficientBalance { balance: i64, required: i64 },
    #[error("a pull is already in progress")]
    PullInProgress,
    #[error("ledger unavailable: {0}")]
    LedgerUnavailable(String),
    #[error("ledger inconsistent: {0}")]
    LedgerInconsistent(String),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// Errors after which the process must stop instead of serving on.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            AppError::LedgerUnavailable(_) | AppError::LedgerInconsistent(_)
        )
    }

    /// Errors that an operator has to fix, reported with an administrator
    /// mention.
    pub fn needs_administrator(&self) -> bool {
        matches!(
            self,
            AppError::EmojiResolution { .. }
                | AppError::MalformedIdentity(_)
                | AppError::Internal(_)
        ) || self.is_fatal()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_ledger_failures_are_fatal() {
        assert!(AppError::LedgerUnavailable("down".to_string()).is_fatal());
        assert!(AppError::LedgerInconsistent("bad chain".to_string()).is_fatal());
        assert!(!AppError::EmojiResolution { emoji_id: 1 }.is_fatal());
        assert!(!AppError::Slot(SlotError::NoReels).is_fatal());
    }

    #[test]
    fn operator_errors_need_an_administrator() {
        assert!(AppError::EmojiResolution { emoji_id: 1 }.needs_administrator());
        assert!(!AppError::PullInProgress.needs_administrator());
    }
}
