// Application layer - Use cases and ports
pub mod alert_service;
pub mod engine;
pub mod monitor_service;
pub mod persistence_worker;
pub mod sensor_source;
pub mod telemetry_sink;
