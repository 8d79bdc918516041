//! Impact and rotation alert levels
//!
//! Classifies the resultant magnitude of each sample against fixed alert
//! thresholds. Thresholds are compared squared so no `sqrt` is needed.

use heapless::Vec;

use crate::sample::Sample;

/// Standard gravity used for the acceleration thresholds (m/s²)
pub const GRAVITY: f32 = 9.81;

/// One alert threshold
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AlertLevel {
    pub label: &'static str,
    /// Threshold in m/s² or rad/s
    pub threshold: f32,
}

/// Acceleration levels, ascending
pub const ACCEL_LEVELS: [AlertLevel; 4] = [
    AlertLevel { label: "> 3g", threshold: 3.0 * GRAVITY },
    AlertLevel { label: "> 4g", threshold: 4.0 * GRAVITY },
    AlertLevel { label: "> 6g", threshold: 6.0 * GRAVITY },
    AlertLevel { label: "> 10g", threshold: 10.0 * GRAVITY },
];

/// Angular velocity levels, ascending (degrees converted to rad/s)
pub const GYRO_LEVELS: [AlertLevel; 5] = [
    AlertLevel { label: "> 100 deg/s", threshold: 1.745_329_3 },
    AlertLevel { label: "> 200 deg/s", threshold: 3.490_658_5 },
    AlertLevel { label: "> 300 deg/s", threshold: 5.235_987_8 },
    AlertLevel { label: "> 500 deg/s", threshold: 8.726_646 },
    AlertLevel { label: "> 800 deg/s", threshold: 13.962_634 },
];

/// Measured quantity an alert refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Channel {
    Acceleration,
    AngularVelocity,
}

/// A sample rose above a higher level than the previous sample
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Alert {
    pub channel: Channel,
    pub level: &'static AlertLevel,
    pub timestamp_ms: u64,
}

/// Per-level exceedance counters for one channel
#[derive(Debug, Clone)]
struct LevelTracker<const N: usize> {
    levels: &'static [AlertLevel; N],
    counts: [u32; N],
    previous: Option<usize>,
}

impl<const N: usize> LevelTracker<N> {
    const fn new(levels: &'static [AlertLevel; N]) -> Self {
        Self {
            levels,
            counts: [0; N],
            previous: None,
        }
    }

    /// Count the levels exceeded by `norm_squared` and report a rising
    /// top level
    fn observe(&mut self, norm_squared: f32) -> Option<usize> {
        let mut top = None;
        for (i, level) in self.levels.iter().enumerate() {
            if norm_squared > level.threshold * level.threshold {
                self.counts[i] = self.counts[i].saturating_add(1);
                top = Some(i);
            }
        }

        let rising = match (top, self.previous) {
            (Some(now), Some(before)) => now > before,
            (Some(_), None) => true,
            (None, _) => false,
        };
        self.previous = top;
        if rising {
            top
        } else {
            None
        }
    }
}

/// Tracks alert level exceedances across samples
///
/// A sample counts toward every level it exceeds. An [`Alert`] is raised
/// only when the highest exceeded level is above the previous sample's.
#[derive(Debug, Clone)]
pub struct AlertMonitor {
    accel: LevelTracker<4>,
    gyro: LevelTracker<5>,
}

impl AlertMonitor {
    pub const fn new() -> Self {
        Self {
            accel: LevelTracker::new(&ACCEL_LEVELS),
            gyro: LevelTracker::new(&GYRO_LEVELS),
        }
    }

    /// Classify one sample
    pub fn observe(&mut self, sample: &Sample) -> Vec<Alert, 2> {
        let mut alerts = Vec::new();

        if let Some(i) = self.accel.observe(sample.accel.norm_squared()) {
            // Capacity is 2 and at most two pushes happen.
            let _ = alerts.push(Alert {
                channel: Channel::Acceleration,
                level: &ACCEL_LEVELS[i],
                timestamp_ms: sample.timestamp_ms,
            });
        }
        if let Some(i) = self.gyro.observe(sample.gyro.norm_squared()) {
            let _ = alerts.push(Alert {
                channel: Channel::AngularVelocity,
                level: &GYRO_LEVELS[i],
                timestamp_ms: sample.timestamp_ms,
            });
        }

        alerts
    }

    /// Exceedance count per level, in level order
    pub fn counts(&self, channel: Channel) -> &[u32] {
        match channel {
            Channel::Acceleration => &self.accel.counts,
            Channel::AngularVelocity => &self.gyro.counts,
        }
    }
}

impl Default for AlertMonitor {
    fn default() -> Self {
        Self::new()
    }
}
