//! Platform-agnostic IMU telemetry logic
//!
//! This crate contains the sampling loop, payload format and output sinks
//! shared by all boards. It has NO hardware dependencies: boards plug in
//! their sensor, clock, link and session through `hal-abstractions`.

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

// Must come first so the logging macros are visible to every module
mod fmt;

pub mod alerts;
pub mod config;
pub mod error;
pub mod payload;
pub mod retry;
pub mod sample;
pub mod sink;
pub mod telemetry;

#[cfg(test)]
mod testing;

pub use alerts::{Alert, AlertMonitor, Channel};
pub use config::{BrokerConfig, OutputMode, TelemetryConfig};
pub use error::{BringUpError, ConfigError, PayloadError, SinkError};
pub use payload::Payload;
pub use retry::RetryPolicy;
pub use sample::Sample;
pub use sink::{Delivery, OutputSink, Remote};
pub use telemetry::{LoopStats, TelemetryLoop};
