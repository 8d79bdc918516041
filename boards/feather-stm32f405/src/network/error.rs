#![deny(unsafe_code)]
//! Network error types
//!
//! Failures are split by layer so logs name the layer that broke. The
//! telemetry loop only sees success or failure.

use defmt::Format;

/// Transport-level errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Format)]
pub enum NetworkError {
    /// Ethernet controller did not initialize
    DeviceInit,
    /// Link has no IP configuration yet
    NotConfigured,
    /// DNS resolution failed
    DnsError,
    /// Socket connect/read/write error
    SocketError,
    /// Session is not established
    NotConnected,
    /// TLS layer failure
    Tls(TlsError),
    /// MQTT layer failure
    Mqtt(MqttError),
}

/// TLS errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Format)]
pub enum TlsError {
    /// Handshake failed
    HandshakeFailed,
    /// A root certificate is configured but cannot be enforced
    VerificationUnavailable,
}

/// MQTT errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Format)]
pub enum MqttError {
    /// CONNECT rejected or no CONNACK
    ConnectionFailed,
    /// PUBLISH could not be sent
    PublishFailed,
    /// PINGREQ could not be sent
    KeepAliveFailed,
    /// Client id, topic or credential not encodable
    ProtocolError,
}

impl From<TlsError> for NetworkError {
    fn from(e: TlsError) -> Self {
        Self::Tls(e)
    }
}

impl From<MqttError> for NetworkError {
    fn from(e: MqttError) -> Self {
        Self::Mqtt(e)
    }
}

impl core::fmt::Display for NetworkError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::DeviceInit => write!(f, "Ethernet controller init failed"),
            Self::NotConfigured => write!(f, "Network not configured"),
            Self::DnsError => write!(f, "DNS resolution failed"),
            Self::SocketError => write!(f, "Socket error"),
            Self::NotConnected => write!(f, "Session not connected"),
            Self::Tls(TlsError::HandshakeFailed) => write!(f, "TLS handshake failed"),
            Self::Tls(TlsError::VerificationUnavailable) => {
                write!(f, "TLS certificate verification unavailable")
            }
            Self::Mqtt(MqttError::ConnectionFailed) => write!(f, "MQTT connection failed"),
            Self::Mqtt(MqttError::PublishFailed) => write!(f, "MQTT publish failed"),
            Self::Mqtt(MqttError::KeepAliveFailed) => write!(f, "MQTT keep-alive failed"),
            Self::Mqtt(MqttError::ProtocolError) => write!(f, "MQTT protocol error"),
        }
    }
}

// Implement core::error::Error for no_std compatibility
impl core::error::Error for NetworkError {}

impl embedded_io_async::Error for NetworkError {
    fn kind(&self) -> embedded_io_async::ErrorKind {
        match self {
            Self::SocketError => embedded_io_async::ErrorKind::BrokenPipe,
            Self::NotConnected => embedded_io_async::ErrorKind::NotConnected,
            _ => embedded_io_async::ErrorKind::Other,
        }
    }
}
