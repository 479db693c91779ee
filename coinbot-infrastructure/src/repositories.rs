pub mod checkpoint_files;
pub mod config_files;
pub mod save_data_files;

pub use checkpoint_files::*;
pub use config_files::*;
pub use save_data_files::*;
