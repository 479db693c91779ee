// Use cases that change state or write to the ledger

pub mod checkpoint_commands;
pub mod config_commands;
pub mod ledger_commands;
pub mod reconcile_commands;
pub mod reward_commands;
pub mod slot_commands;
pub mod transfer_commands;
