// Sensor source trait - one raw sample set per tick
use crate::domain::telemetry::{SampleError, SensorFrame};

/// Producer of raw readings. Simulators and hardware drivers sit behind it.
pub trait SensorSource: Send {
    /// Advances internal state by `dt` seconds and returns the new readings.
    fn sample(&mut self, dt: f64) -> Result<SensorFrame, SampleError>;
}
