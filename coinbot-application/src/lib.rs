// Coinbot Application Layer

pub mod commands;
pub mod error;
pub mod metrics;
pub mod ops;
pub mod queries;
pub mod shutdown;
pub mod state;

#[cfg(test)]
pub(crate) mod testing;

pub use commands::ledger_commands::TRANSACTIONS_TARGET;
pub use error::AppError;
pub use metrics::Metrics;
pub use ops::{ChannelJob, ChannelWorkers};
pub use shutdown::Shutdown;
pub use state::AppState;
