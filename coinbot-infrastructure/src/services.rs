pub mod discord_rest;
pub mod http_ledger;

pub use discord_rest::*;
pub use http_ledger::*;
