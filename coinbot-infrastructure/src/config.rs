pub mod app_config;
pub mod bot_config;

pub use app_config::*;
pub use bot_config::*;
