pub mod balance_queries;
pub mod config_queries;
pub mod slot_queries;
