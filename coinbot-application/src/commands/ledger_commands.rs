use chrono::{DateTime, Utc};
use coinbot_domain::{LedgerTransactionRequest, UserHash};
use tracing::{error, info};

use crate::{AppError, AppState};

/// Target for the durable transaction log written next to the ledger.
pub const TRANSACTIONS_TARGET: &str = "coinbot::transactions";

/// Records a ledger failure and stops the bot. Returns the error for `?`.
pub(crate) fn fatal(state: &AppState, err: AppError) -> AppError {
    state.metrics.record_ledger_failure();
    error!("fatal ledger failure: {}", err);
    state.shutdown.trigger(err.to_string());
    err
}

/// Submits one transaction and checks the ledger afterwards. Any failure
/// is fatal; the call is never retried.
pub async fn submit_transaction(
    state: &AppState,
    request: &LedgerTransactionRequest,
) -> Result<DateTime<Utc>, AppError> {
    if let Err(err) = state.ledger.submit_transaction(request).await {
        return Err(fatal(state, AppError::LedgerUnavailable(err.to_string())));
    }

    let timestamp = match state.ledger.last_transaction_timestamp().await {
        Ok(Some(timestamp)) => timestamp,
        Ok(None) => {
            return Err(fatal(
                state,
                AppError::LedgerInconsistent("no last transaction after submit".to_string()),
            ))
        }
        Err(err) => {
            return Err(fatal(
                state,
                AppError::LedgerInconsistent(format!("last transaction lookup failed: {}", err)),
            ))
        }
    };

    match state.ledger.validate_chain().await {
        Ok(true) => {}
        Ok(false) => {
            return Err(fatal(
                state,
                AppError::LedgerInconsistent("chain validation failed".to_string()),
            ))
        }
        Err(err) => {
            return Err(fatal(
                state,
                AppError::LedgerInconsistent(format!("chain validation errored: {}", err)),
            ))
        }
    }

    Ok(timestamp)
}

/// Ledger balance of a platform user; unknown users hold nothing.
pub async fn ledger_balance(state: &AppState, user_id: u64) -> Result<i64, AppError> {
    let hash = UserHash::from_user_id(user_id);
    match state.ledger.get_balance(&hash).await {
        Ok(balance) => Ok(balance.unwrap_or(0)),
        Err(err) => Err(fatal(state, AppError::LedgerUnavailable(err.to_string()))),
    }
}

/// Appends one line to the transaction log, stamped with the ledger time.
pub fn log_transaction(timestamp: DateTime<Utc>, line: &str) {
    info!(
        target: TRANSACTIONS_TARGET,
        "{}: {}",
        timestamp.format("%Y-%m-%d %H:%M:%S"),
        line
    );
}
