// Infrastructure layer - External dependencies and adapters
pub mod config;
pub mod influx_sink;
pub mod log_sink;
pub mod simulator;
