pub mod command;
pub mod config;
pub mod log;
pub mod sequencer;
pub mod store;
