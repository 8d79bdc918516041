//! Sample model

use hal_abstractions::{ImuReading, Vector3};

/// One timestamped IMU measurement
///
/// Produced, serialized and dropped once per sample interval; never stored.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Sample {
    /// Milliseconds since boot
    pub timestamp_ms: u64,
    /// Acceleration in m/s²
    pub accel: Vector3,
    /// Angular velocity in rad/s
    pub gyro: Vector3,
}

impl Sample {
    pub fn new(timestamp_ms: u64, reading: ImuReading) -> Self {
        Self {
            timestamp_ms,
            accel: reading.accel,
            gyro: reading.gyro,
        }
    }

    pub fn is_finite(&self) -> bool {
        self.accel.is_finite() && self.gyro.is_finite()
    }
}
