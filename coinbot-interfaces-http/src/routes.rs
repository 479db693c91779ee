pub mod config_routes;

pub use config_routes::*;
