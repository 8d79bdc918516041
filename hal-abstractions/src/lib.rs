//! Hardware abstraction traits for IoT firmware
//!
//! This crate defines traits that abstract over hardware differences
//! between boards. BSPs implement these traits; `telemetry-core` drives them.
//!
//! - **`clock`**: monotonic milliseconds and async delays
//! - **`imu`**: accelerometer/gyroscope sensors and their range settings
//! - **`link`**: network association (Ethernet, WiFi PSK, WPA2-Enterprise)
//! - **`session`**: authenticated publish sessions (MQTT over TLS)
//!
//! All async operations use return-position `impl Future` so implementors
//! can write plain `async fn` without an allocator.

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

pub mod clock;
pub mod imu;
pub mod link;
pub mod session;

pub use clock::Clock;
pub use imu::{AccelRange, GyroRange, HighPassFilter, ImuReading, ImuSensor, SensorSettings, Vector3};
pub use link::{LinkCredentials, NetworkLink};
pub use session::{BrokerCredentials, SessionOptions, TelemetrySession};
