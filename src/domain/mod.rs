// Domain layer - Telemetry models and pure derivations
pub mod alert;
pub mod dashboard;
pub mod history;
pub mod metrics;
pub mod telemetry;
