pub mod artifacts;
pub mod config;
