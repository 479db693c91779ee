pub mod config_handlers;
pub mod ops_handlers;

pub use config_handlers::*;
pub use ops_handlers::*;
