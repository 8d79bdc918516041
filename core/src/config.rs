//! Telemetry configuration
//!
//! Configuration is loaded once at startup and never mutated. Boards build a
//! [`TelemetryConfig`] from their own sources (build environment, flash, ...)
//! using the `parse_*` helpers, falling back to [`Default`] values.

use core::str::FromStr;

use hal_abstractions::{BrokerCredentials, LinkCredentials, SensorSettings};

use crate::error::ConfigError;
use crate::retry::RetryPolicy;

/// Default sampling interval: 100 Hz
pub const DEFAULT_SAMPLE_INTERVAL_MS: u64 = 10;

/// Where serialized samples go
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum OutputMode {
    /// Samples are taken and dropped
    Discard,
    /// JSON lines on the local serial port
    LocalText,
    /// JSON messages published to the broker
    RemotePublish,
}

impl OutputMode {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Discard => "discard",
            Self::LocalText => "serial",
            Self::RemotePublish => "mqtt",
        }
    }
}

/// Accepts `discard|serial|mqtt` (and a few aliases) as well as the legacy
/// numeric selector `0|1|2`, case-insensitively
impl FromStr for OutputMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let is = |names: &[&str]| names.iter().any(|n| s.eq_ignore_ascii_case(n));

        if is(&["0", "discard", "none", "off"]) {
            Ok(Self::Discard)
        } else if is(&["1", "serial", "local", "text"]) {
            Ok(Self::LocalText)
        } else if is(&["2", "mqtt", "remote", "publish"]) {
            Ok(Self::RemotePublish)
        } else {
            Err(ConfigError::UnknownOutputMode)
        }
    }
}

/// Broker connection parameters
#[derive(Clone, Copy)]
pub struct BrokerConfig {
    /// Broker hostname (for DNS and SNI)
    pub host: &'static str,
    /// Broker port (typically 8883 for MQTTS)
    pub port: u16,
    /// Encrypted transport; credentials are only presented when set
    pub tls: bool,
    /// Username/password for the broker
    pub credentials: Option<BrokerCredentials>,
    /// Keep-alive interval in seconds (0 = disabled)
    pub keep_alive_secs: u16,
    /// DER-encoded root certificate for the broker chain
    pub ca_cert: Option<&'static [u8]>,
}

impl BrokerConfig {
    /// Credentials to present on connect, honoring the `tls` flag
    pub fn session_credentials(&self) -> Option<&BrokerCredentials> {
        if self.tls {
            self.credentials.as_ref()
        } else {
            None
        }
    }
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            host: "192.168.1.1",
            port: 8883,
            tls: true,
            credentials: None,
            keep_alive_secs: 60,
            ca_cert: None,
        }
    }
}

/// Complete node configuration
#[derive(Clone, Copy)]
pub struct TelemetryConfig {
    /// Output sink selector
    pub output: OutputMode,
    /// Minimum time between two samples
    pub sample_interval_ms: u64,
    /// Sensor ranges and filter
    pub sensor: SensorSettings,
    /// Probe retry budget at bring-up
    pub sensor_retry: RetryPolicy,
    /// Network association credentials
    pub link: LinkCredentials,
    /// Association polling budget at bring-up
    pub link_retry: RetryPolicy,
    /// Broker parameters
    pub broker: BrokerConfig,
    /// Fixed session client identifier
    pub client_id: &'static str,
    /// Fixed publish topic
    pub topic: &'static str,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            output: OutputMode::RemotePublish,
            sample_interval_ms: DEFAULT_SAMPLE_INTERVAL_MS,
            sensor: SensorSettings::default(),
            sensor_retry: RetryPolicy {
                max_attempts: 5,
                initial_delay_ms: 100,
                max_delay_ms: 1_600,
            },
            link: LinkCredentials::Wired,
            link_retry: RetryPolicy {
                max_attempts: 12,
                initial_delay_ms: 250,
                max_delay_ms: 8_000,
            },
            broker: BrokerConfig::default(),
            client_id: "imu-telemetry",
            topic: "sensors/imu",
        }
    }
}

/// Parse a TCP port (1..=65535)
pub fn parse_port(s: &str) -> Result<u16, ConfigError> {
    match s.trim().parse::<u16>() {
        Ok(0) | Err(_) => Err(ConfigError::InvalidPort),
        Ok(port) => Ok(port),
    }
}

/// Parse a boolean flag (`true|false|yes|no|on|off|1|0`)
pub fn parse_flag(s: &str) -> Result<bool, ConfigError> {
    let s = s.trim();
    if ["1", "true", "yes", "on"].iter().any(|n| s.eq_ignore_ascii_case(n)) {
        Ok(true)
    } else if ["0", "false", "no", "off"].iter().any(|n| s.eq_ignore_ascii_case(n)) {
        Ok(false)
    } else {
        Err(ConfigError::InvalidFlag)
    }
}

/// Parse a millisecond interval
pub fn parse_interval_ms(s: &str) -> Result<u64, ConfigError> {
    s.trim()
        .parse::<u64>()
        .map_err(|_| ConfigError::InvalidInterval)
}

/// Check that `der` holds exactly one DER SEQUENCE (an X.509 certificate)
///
/// Catches PEM files and truncated or concatenated input; it does not parse
/// the certificate itself.
pub fn parse_der_certificate(der: &[u8]) -> Result<&[u8], ConfigError> {
    const SEQUENCE: u8 = 0x30;

    let (&tag, rest) = der.split_first().ok_or(ConfigError::InvalidCertificate)?;
    let (&first, rest) = rest.split_first().ok_or(ConfigError::InvalidCertificate)?;
    if tag != SEQUENCE {
        return Err(ConfigError::InvalidCertificate);
    }

    let (len, body) = if first < 0x80 {
        (usize::from(first), rest)
    } else {
        let count = usize::from(first & 0x7F);
        if count == 0 || count > 3 || rest.len() < count {
            return Err(ConfigError::InvalidCertificate);
        }
        let (len_bytes, body) = rest.split_at(count);
        let len = len_bytes
            .iter()
            .fold(0usize, |acc, &b| (acc << 8) | usize::from(b));
        (len, body)
    };

    if body.len() != len {
        return Err(ConfigError::InvalidCertificate);
    }
    Ok(der)
}
