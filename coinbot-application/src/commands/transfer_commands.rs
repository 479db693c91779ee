use coinbot_domain::{LedgerTransactionRequest, PlatformUser, TransactionMethod};
use tracing::info;

use crate::commands::ledger_commands::{ledger_balance, log_transaction, submit_transaction};
use crate::{AppError, AppState};

pub async fn transfer(
    state: &AppState,
    sender: &PlatformUser,
    receiver: &PlatformUser,
    amount: i64,
) -> Result<String, AppError> {
    if amount <= 0 {
        return Err(AppError::BadRequest(format!(
            "transfer amount must be positive, got {}",
            amount
        )));
    }
    info!(
        "user {} is requesting to transfer {} {} to user {}",
        sender.id, amount, state.bot.coins, receiver.id
    );

    let balance = ledger_balance(state, sender.id).await?;
    if balance < amount {
        return Err(AppError::InsufficientBalance {
            balance,
            required: amount,
        });
    }

    let request =
        LedgerTransactionRequest::between(sender.id, receiver.id, amount, TransactionMethod::Transfer);
    let timestamp = submit_transaction(state, &request).await?;
    log_transaction(
        timestamp,
        &format!(
            "{} ({}) transferred {} {} to {} ({}).",
            sender.display_name,
            sender.id,
            amount,
            state.bot.unit(amount),
            receiver.display_name,
            receiver.id
        ),
    );
    state.metrics.record_transfer();

    Ok(format!(
        "{} transferred {} {} to {}.",
        sender.mention(),
        amount,
        state.bot.unit(amount),
        receiver.mention()
    ))
}
