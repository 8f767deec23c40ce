//! Record/replay infrastructure for network-free runs and tests.

pub mod config;
pub mod format;
pub mod recorder;
pub mod replayer;
