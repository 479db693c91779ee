use coinbot_domain::PlatformUser;

use crate::commands::ledger_commands::ledger_balance;
use crate::{AppError, AppState};

/// Balance reply for `/balance`; singular only for exactly one coin.
pub async fn balance_message(state: &AppState, user: &PlatformUser) -> Result<String, AppError> {
    let balance = ledger_balance(state, user.id).await?;
    Ok(format!(
        "{} has {} {}.",
        user.mention(),
        balance,
        state.bot.unit(balance)
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{user, TestHarness};

    #[tokio::test]
    async fn unknown_user_has_zero_coins() {
        let harness = TestHarness::new();
        let message = balance_message(&harness.state, &user(9)).await.expect("balance");
        assert_eq!(message, "<@9> has 0 coins.");
    }

    #[tokio::test]
    async fn single_coin_uses_singular_unit() {
        let harness = TestHarness::new();
        harness.ledger.set_balance(9, 1);
        let message = balance_message(&harness.state, &user(9)).await.expect("balance");
        assert_eq!(message, "<@9> has 1 coin.");
    }
}
