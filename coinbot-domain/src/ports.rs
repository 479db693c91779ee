// Repository and Service Port Traits (Interfaces)
// What the bot core needs from storage, the ledger and the chat platform

pub mod repositories;
pub mod services;

pub use repositories::*;
pub use services::*;
