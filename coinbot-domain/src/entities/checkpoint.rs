// Channel checkpoint entity
// Bounded FIFO window of the most recent message ids seen in a channel

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

/// One persisted line of a checkpoint file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckpointLine {
    pub last_message_id: u64,
}

/// Identifies a text channel together with the human readable names that
/// are written next to the checkpoint file for operators.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelRef {
    pub guild_id: u64,
    pub guild_name: String,
    pub channel_id: u64,
    pub channel_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelCheckpoint {
    pub channel_id: u64,
    pub guild_id: u64,
    capacity: usize,
    window: VecDeque<u64>,
}

impl ChannelCheckpoint {
    pub fn new(channel_id: u64, guild_id: u64, capacity: usize) -> Self {
        Self {
            channel_id,
            guild_id,
            capacity: capacity.max(1),
            window: VecDeque::new(),
        }
    }

    /// Rebuilds a checkpoint from a stored window (oldest first). Entries
    /// beyond the capacity are dropped from the old end.
    pub fn from_window(
        channel_id: u64,
        guild_id: u64,
        capacity: usize,
        ids: impl IntoIterator<Item = u64>,
    ) -> Self {
        let mut checkpoint = Self::new(channel_id, guild_id, capacity);
        for id in ids {
            checkpoint.record(id);
        }
        checkpoint
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.window.len()
    }

    pub fn is_empty(&self) -> bool {
        self.window.is_empty()
    }

    /// Appends an id and evicts from the front until the window fits.
    /// Returns the evicted ids, oldest first.
    pub fn record(&mut self, message_id: u64) -> Vec<u64> {
        self.window.push_back(message_id);
        let mut evicted = Vec::new();
        while self.window.len() > self.capacity {
            if let Some(front) = self.window.pop_front() {
                evicted.push(front);
            }
        }
        evicted
    }

    pub fn contains(&self, message_id: u64) -> bool {
        self.window.contains(&message_id)
    }

    pub fn newest(&self) -> Option<u64> {
        self.window.back().copied()
    }

    pub fn ids(&self) -> Vec<u64> {
        self.window.iter().copied().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn window_keeps_only_most_recent_ids() {
        let mut checkpoint = ChannelCheckpoint::new(10, 1, 3);
        for id in 1..=7 {
            checkpoint.record(id);
        }
        assert_eq!(checkpoint.ids(), vec![5, 6, 7]);
        assert!(!checkpoint.contains(4));
        assert_eq!(checkpoint.newest(), Some(7));
    }

    #[test]
    fn record_reports_evicted_ids() {
        let mut checkpoint = ChannelCheckpoint::from_window(10, 1, 2, [1, 2]);
        assert_eq!(checkpoint.record(3), vec![1]);
        assert_eq!(checkpoint.ids(), vec![2, 3]);
    }

    #[test]
    fn oversized_stored_window_is_trimmed_from_the_old_end() {
        let checkpoint = ChannelCheckpoint::from_window(10, 1, 2, [1, 2, 3, 4]);
        assert_eq!(checkpoint.ids(), vec![3, 4]);
    }

    #[test]
    fn zero_capacity_is_clamped_to_one() {
        let mut checkpoint = ChannelCheckpoint::new(10, 1, 0);
        checkpoint.record(1);
        checkpoint.record(2);
        assert_eq!(checkpoint.capacity(), 1);
        assert_eq!(checkpoint.ids(), vec![2]);
    }
}
