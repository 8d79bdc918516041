//! Telemetry error types

/// Bring-up failures
///
/// Fatal errors mean the node cannot do anything useful (no sensor);
/// retryable ones may clear on their own (no network yet).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BringUpError {
    /// Sensor did not answer on the bus after all probe attempts
    SensorNotFound,
    /// Sensor answered but rejected its configuration
    SensorConfig,
    /// Network association did not come up within the retry budget
    LinkUnavailable,
}

impl BringUpError {
    /// Whether retrying bring-up cannot help
    pub const fn is_fatal(&self) -> bool {
        match self {
            Self::SensorNotFound | Self::SensorConfig => true,
            Self::LinkUnavailable => false,
        }
    }
}

impl core::fmt::Display for BringUpError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::SensorNotFound => write!(f, "Sensor not found"),
            Self::SensorConfig => write!(f, "Sensor configuration failed"),
            Self::LinkUnavailable => write!(f, "Network link unavailable"),
        }
    }
}

impl core::error::Error for BringUpError {}

/// Payload serialization errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PayloadError {
    /// Reading contained NaN or infinity
    NonFinite,
    /// Formatted payload did not fit the buffer
    Overflow,
}

impl core::fmt::Display for PayloadError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::NonFinite => write!(f, "Non-finite reading"),
            Self::Overflow => write!(f, "Payload buffer overflow"),
        }
    }
}

impl core::error::Error for PayloadError {}

/// Output sink delivery errors
///
/// Deliveries are never retried; these only feed statistics and logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SinkError {
    /// Serial port write failed
    PortWrite,
    /// Session not established
    NotConnected,
    /// Session rejected or lost the publish
    PublishFailed,
}

impl core::fmt::Display for SinkError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::PortWrite => write!(f, "Serial write failed"),
            Self::NotConnected => write!(f, "Session not connected"),
            Self::PublishFailed => write!(f, "Publish failed"),
        }
    }
}

impl core::error::Error for SinkError {}

/// Configuration parse errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// Output mode name not recognized
    UnknownOutputMode,
    /// Port is not a number in 1..=65535
    InvalidPort,
    /// Boolean flag is not one of true/false/1/0
    InvalidFlag,
    /// Interval is not a number
    InvalidInterval,
    /// Root certificate is not a single DER-encoded SEQUENCE
    InvalidCertificate,
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::UnknownOutputMode => write!(f, "Unknown output mode"),
            Self::InvalidPort => write!(f, "Invalid port"),
            Self::InvalidFlag => write!(f, "Invalid flag"),
            Self::InvalidInterval => write!(f, "Invalid interval"),
            Self::InvalidCertificate => write!(f, "Invalid DER certificate"),
        }
    }
}

impl core::error::Error for ConfigError {}
