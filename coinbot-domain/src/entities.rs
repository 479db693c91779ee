// Domain entities

pub mod chat;
pub mod checkpoint;
pub mod config;
pub mod ledger;
pub mod named_table;
pub mod save_data;
pub mod slot_machine;

pub use chat::*;
pub use checkpoint::*;
pub use config::*;
pub use ledger::*;
pub use named_table::*;
pub use save_data::*;
pub use slot_machine::*;
