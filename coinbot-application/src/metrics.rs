use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Default)]
pub struct Metrics {
    rewards: AtomicU64,
    reconciled_messages: AtomicU64,
    slot_pulls: AtomicU64,
    starting_bonuses: AtomicU64,
    transfers: AtomicU64,
    ledger_failures: AtomicU64,
}

impl Metrics {
    pub fn record_reward(&self) {
        self.rewards.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_reconciled(&self, message_count: usize) {
        self.reconciled_messages
            .fetch_add(message_count as u64, Ordering::Relaxed);
    }

    pub fn record_pull(&self, starting_bonus: bool) {
        self.slot_pulls.fetch_add(1, Ordering::Relaxed);
        if starting_bonus {
            self.starting_bonuses.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn record_transfer(&self) {
        self.transfers.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_ledger_failure(&self) {
        self.ledger_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn rewards(&self) -> u64 {
        self.rewards.load(Ordering::Relaxed)
    }

    pub fn render_prometheus(&self) -> String {
        let rewards = self.rewards.load(Ordering::Relaxed);
        let reconciled = self.reconciled_messages.load(Ordering::Relaxed);
        let pulls = self.slot_pulls.load(Ordering::Relaxed);
        let bonuses = self.starting_bonuses.load(Ordering::Relaxed);
        let transfers = self.transfers.load(Ordering::Relaxed);
        let failures = self.ledger_failures.load(Ordering::Relaxed);

        format!(
            "# TYPE coinbot_rewards_total counter\n\
coinbot_rewards_total {}\n\
# TYPE coinbot_reconciled_messages_total counter\n\
coinbot_reconciled_messages_total {}\n\
# TYPE coinbot_slot_pulls_total counter\n\
coinbot_slot_pulls_total {}\n\
# TYPE coinbot_starting_bonuses_total counter\n\
coinbot_starting_bonuses_total {}\n\
# TYPE coinbot_transfers_total counter\n\
coinbot_transfers_total {}\n\
# TYPE coinbot_ledger_failures_total counter\n\
coinbot_ledger_failures_total {}\n",
            rewards, reconciled, pulls, bonuses, transfers, failures
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_counters() {
        let metrics = Metrics::default();
        metrics.record_reward();
        metrics.record_pull(true);
        metrics.record_reconciled(4);
        let text = metrics.render_prometheus();
        assert!(text.contains("coinbot_rewards_total 1\n"));
        assert!(text.contains("coinbot_starting_bonuses_total 1\n"));
        assert!(text.contains("coinbot_reconciled_messages_total 4\n"));
        assert!(text.contains("coinbot_ledger_failures_total 0\n"));
    }
}
