// Domain services

pub mod slot_engine;

pub use slot_engine::*;
