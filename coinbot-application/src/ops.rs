pub mod channel_workers;

pub use channel_workers::{ChannelJob, ChannelWorkers};
