//! Inertial measurement unit abstraction

use core::future::Future;

/// Three-axis measurement
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Vector3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vector3 {
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// Squared Euclidean norm (avoids `sqrt` on targets without an FPU libm)
    pub fn norm_squared(&self) -> f32 {
        self.x * self.x + self.y * self.y + self.z * self.z
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

/// One accelerometer + gyroscope reading in physical units
///
/// Acceleration is in m/s², angular velocity in rad/s.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ImuReading {
    pub accel: Vector3,
    pub gyro: Vector3,
}

/// Accelerometer full-scale range
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AccelRange {
    G2,
    G4,
    G8,
    G16,
}

impl AccelRange {
    /// Full-scale value in g
    pub const fn full_scale_g(self) -> u8 {
        match self {
            Self::G2 => 2,
            Self::G4 => 4,
            Self::G8 => 8,
            Self::G16 => 16,
        }
    }
}

/// Gyroscope full-scale range
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum GyroRange {
    Dps250,
    Dps500,
    Dps1000,
    Dps2000,
}

impl GyroRange {
    /// Full-scale value in degrees per second
    pub const fn full_scale_dps(self) -> u16 {
        match self {
            Self::Dps250 => 250,
            Self::Dps500 => 500,
            Self::Dps1000 => 1000,
            Self::Dps2000 => 2000,
        }
    }
}

/// Accelerometer digital high-pass filter cutoff
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum HighPassFilter {
    /// Filter disabled / reset
    Reset,
    Hz5,
    Hz2_5,
    Hz1_25,
    Hz0_63,
    /// Hold the current sample as the filter baseline
    Hold,
}

/// Measurement settings applied once at bring-up
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SensorSettings {
    pub accel_range: AccelRange,
    pub gyro_range: GyroRange,
    pub high_pass: HighPassFilter,
}

impl Default for SensorSettings {
    fn default() -> Self {
        Self {
            accel_range: AccelRange::G16,
            gyro_range: GyroRange::Dps1000,
            high_pass: HighPassFilter::Hz0_63,
        }
    }
}

/// Accelerometer/gyroscope sensor
///
/// Implementors log their own bus-level failures; callers only see
/// `Self::Error`.
pub trait ImuSensor {
    type Error: core::fmt::Debug;

    /// Check that the expected chip answers on the bus
    fn probe(&mut self) -> impl Future<Output = Result<(), Self::Error>>;

    /// Apply measurement ranges and filters
    fn configure(
        &mut self,
        settings: &SensorSettings,
    ) -> impl Future<Output = Result<(), Self::Error>>;

    /// Take one reading in physical units
    fn read(&mut self) -> impl Future<Output = Result<ImuReading, Self::Error>>;
}
