//! Output sink
//!
//! Where serialized samples go is decided once, when the sink is built.
//! Only [`OutputSink::RemotePublish`] owns the network link and session, so
//! the other modes have no way to touch the network.

use embedded_io_async::Write;
use hal_abstractions::{NetworkLink, TelemetrySession};

use crate::config::OutputMode;
use crate::error::SinkError;

/// Network capabilities needed for publishing
pub struct Remote<L, S> {
    pub link: L,
    pub session: S,
}

/// Destination for serialized samples
pub enum OutputSink<W, L, S> {
    /// Samples are taken and dropped
    Discard,
    /// One JSON line per sample on a serial port
    LocalText(W),
    /// One message per sample on the broker topic
    RemotePublish(Remote<L, S>),
}

/// What happened to one payload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Delivery {
    Discarded,
    Written,
    Published,
}

impl<W, L, S> OutputSink<W, L, S>
where
    W: Write,
    L: NetworkLink,
    S: TelemetrySession,
{
    /// Configuration-level selector for this sink
    pub fn mode(&self) -> OutputMode {
        match self {
            Self::Discard => OutputMode::Discard,
            Self::LocalText(_) => OutputMode::LocalText,
            Self::RemotePublish(_) => OutputMode::RemotePublish,
        }
    }

    pub fn remote(&self) -> Option<&Remote<L, S>> {
        match self {
            Self::RemotePublish(remote) => Some(remote),
            _ => None,
        }
    }

    pub fn remote_mut(&mut self) -> Option<&mut Remote<L, S>> {
        match self {
            Self::RemotePublish(remote) => Some(remote),
            _ => None,
        }
    }

    /// Deliver one payload; failures are reported, never retried
    pub async fn emit(&mut self, topic: &str, payload: &str) -> Result<Delivery, SinkError> {
        match self {
            Self::Discard => Ok(Delivery::Discarded),
            Self::LocalText(port) => {
                port.write_all(payload.as_bytes())
                    .await
                    .map_err(|_| SinkError::PortWrite)?;
                port.write_all(b"\n").await.map_err(|_| SinkError::PortWrite)?;
                Ok(Delivery::Written)
            }
            Self::RemotePublish(remote) => {
                if !remote.session.is_connected() {
                    return Err(SinkError::NotConnected);
                }
                remote
                    .session
                    .publish(topic, payload.as_bytes())
                    .await
                    .map_err(|_| SinkError::PublishFailed)?;
                Ok(Delivery::Published)
            }
        }
    }
}
