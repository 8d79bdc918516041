//! MQTT v5.0 session over TLS 1.3
//!
//! Owns one persistent broker connection: DNS, TCP, TLS handshake and MQTT
//! CONNECT happen in [`TelemetrySession::connect`]; the live client is kept
//! between calls and dropped on any transport error, which is how the
//! telemetry loop learns it must reconnect.
//!
//! # Memory Management
//!
//! All buffers come from [`crate::session_buffers`] and are reused on
//! every reconnect. The old client is always dropped before new buffers are
//! taken.
//!
//! # Server Trust
//!
//! The pinned `embedded-tls` has no certificate chain verifier for this
//! target. Without a root certificate the handshake runs with `NoVerify`
//! and a warning is logged. With a root certificate configured the session
//! refuses to connect rather than ignore it.
//!
//! # Limitations
//!
//! Publishes are QoS 0, so the broker has nothing to acknowledge and
//! `service` does not read inbound packets; it only sends PINGREQ after
//! half a keep-alive interval of silence. A broker-initiated DISCONNECT is
//! noticed when the next publish or ping fails, which drops the session.

#![allow(unsafe_code)] // Session buffers and unchecked topic names

use defmt::{debug, error, info, warn, Debug2Format};
use embassy_net::{dns::DnsQueryType, IpEndpoint, Stack};
use embassy_stm32::peripherals::RNG;
use embassy_stm32::rng::Rng;
use embassy_time::{Duration, Instant};
use embedded_tls::{
    Aes128GcmSha256, CryptoProvider, NoVerify, TlsConfig, TlsConnection, TlsContext,
    TlsVerifier,
};
use hal_abstractions::{SessionOptions, TelemetrySession};
use rust_mqtt::{
    buffer::BumpBuffer,
    client::{
        options::{ConnectOptions, PublicationOptions, TopicReference},
        Client,
    },
    config::{KeepAlive, SessionExpiryInterval},
    types::{MqttBinary, MqttString, QoS, TopicName},
    Bytes,
};
use telemetry_core::BrokerConfig;

use crate::session_buffers;

use super::error::{MqttError, NetworkError, TlsError};
use super::socket::AsyncTcpSocket;

type TlsStream = TlsConnection<'static, AsyncTcpSocket<'static>, Aes128GcmSha256>;
type MqttClient = Client<'static, TlsStream, BumpBuffer<'static>, 1, 1, 1, 0>;

/// Crypto provider that lends the hardware RNG to the TLS handshake
struct SessionCrypto<'a, R> {
    rng: &'a mut R,
    verifier: NoVerify,
}

impl<'a, R> SessionCrypto<'a, R> {
    fn new(rng: &'a mut R) -> Self {
        Self {
            rng,
            verifier: NoVerify,
        }
    }
}

impl<R> CryptoProvider for SessionCrypto<'_, R>
where
    R: rand_core::CryptoRngCore,
{
    type CipherSuite = Aes128GcmSha256;
    type Signature = &'static [u8];

    fn rng(&mut self) -> impl rand_core::CryptoRngCore {
        &mut *self.rng
    }

    fn verifier(
        &mut self,
    ) -> Result<&mut impl TlsVerifier<Self::CipherSuite>, embedded_tls::TlsError> {
        Ok(&mut self.verifier)
    }
}

/// Reject names that are not valid MQTT topic names
///
/// Publish topics cannot contain wildcards (`+`, `#`) or NUL, and cannot be
/// empty.
pub fn validate_topic(topic: &str) -> Result<(), MqttError> {
    if topic.is_empty() || topic.contains(['+', '#', '\0']) {
        error!("Invalid MQTT topic name '{}'", topic);
        return Err(MqttError::ProtocolError);
    }
    Ok(())
}

pub struct MqttSession {
    stack: Stack<'static>,
    rng: Rng<'static, RNG>,
    broker: BrokerConfig,
    client: Option<MqttClient>,
    last_sent: Instant,
}

impl MqttSession {
    pub fn new(stack: Stack<'static>, rng: Rng<'static, RNG>, broker: BrokerConfig) -> Self {
        if !broker.tls {
            warn!("Broker TLS flag is off: the session stays encrypted but sends no credentials");
        }
        if broker.ca_cert.is_some() {
            error!("Root certificate configured but chain verification is unavailable; MQTT disabled");
        } else {
            warn!("No root certificate configured; broker identity is not verified");
        }
        Self {
            stack,
            rng,
            broker,
            client: None,
            last_sent: Instant::now(),
        }
    }

    /// PINGREQ is sent after this much silence
    fn ping_interval(&self) -> Option<Duration> {
        match self.broker.keep_alive_secs {
            0 => None,
            secs => Some(Duration::from_millis(u64::from(secs) * 500)),
        }
    }

    async fn resolve(&self) -> Result<IpEndpoint, NetworkError> {
        let host = self.broker.host;
        let server_ip = self
            .stack
            .dns_query(host, DnsQueryType::A)
            .await
            .map_err(|e| {
                error!("DNS query failed: {:?}", Debug2Format(&e));
                NetworkError::DnsError
            })?
            .first()
            .copied()
            .ok_or_else(|| {
                error!("DNS returned no results for {}", host);
                NetworkError::DnsError
            })?;

        let endpoint = IpEndpoint::new(server_ip, self.broker.port);
        debug!("Resolved {} to {}", host, Debug2Format(&endpoint));
        Ok(endpoint)
    }

    async fn open(&mut self, options: &SessionOptions<'_>) -> Result<MqttClient, NetworkError> {
        let endpoint = self.resolve().await?;

        // SAFETY: `connect` dropped the previous client, so nothing else
        // holds these buffers.
        let buffers = unsafe { session_buffers::take() };

        let mut socket = AsyncTcpSocket::new(self.stack, buffers.tcp_rx, buffers.tcp_tx);
        socket.connect(endpoint).await?;
        debug!("TCP connection established to {}", Debug2Format(&endpoint));

        let tls_config = TlsConfig::new().with_server_name(self.broker.host);

        let mut tls: TlsStream = TlsConnection::new(socket, buffers.tls_read, buffers.tls_write);
        let context = TlsContext::new(&tls_config, SessionCrypto::new(&mut self.rng));
        tls.open(context).await.map_err(|e| {
            error!("TLS handshake failed: {:?}", Debug2Format(&e));
            TlsError::HandshakeFailed
        })?;
        debug!("TLS 1.3 handshake completed");

        let (user_name, password) = match options.credentials {
            Some(credentials) => {
                let user = MqttString::new(credentials.username.into()).map_err(|e| {
                    error!("Invalid MQTT user name: {:?}", Debug2Format(&e));
                    MqttError::ProtocolError
                })?;
                let pass = MqttBinary::new(Bytes::from(credentials.password.as_bytes()))
                    .map_err(|e| {
                        error!("Invalid MQTT password: {:?}", Debug2Format(&e));
                        MqttError::ProtocolError
                    })?;
                (Some(user), Some(pass))
            }
            None => (None, None),
        };

        let connect_opts = ConnectOptions {
            session_expiry_interval: SessionExpiryInterval::EndOnDisconnect,
            clean_start: true,
            keep_alive: match self.broker.keep_alive_secs {
                0 => KeepAlive::Infinite,
                secs => KeepAlive::Seconds(secs),
            },
            will: None,
            user_name,
            password,
        };

        let client_id = MqttString::new(options.client_id.into()).map_err(|e| {
            error!("Invalid MQTT client ID: {:?}", Debug2Format(&e));
            MqttError::ProtocolError
        })?;

        let mut client = Client::<'_, _, _, 1, 1, 1, 0>::new(buffers.mqtt);
        client
            .connect(tls, &connect_opts, Some(client_id))
            .await
            .map_err(|e| {
                error!("MQTT connect failed: {:?}", Debug2Format(&e));
                MqttError::ConnectionFailed
            })?;

        Ok(client)
    }
}

impl TelemetrySession for MqttSession {
    type Error = NetworkError;

    async fn connect(&mut self, options: &SessionOptions<'_>) -> Result<(), NetworkError> {
        // Releases the shared buffers
        self.client = None;

        if self.broker.ca_cert.is_some() {
            return Err(TlsError::VerificationUnavailable.into());
        }

        if !self.stack.is_config_up() {
            return Err(NetworkError::NotConfigured);
        }

        info!(
            "Connecting to MQTT broker at {}:{} as '{}'",
            self.broker.host, self.broker.port, options.client_id
        );
        let client = self.open(options).await?;
        self.client = Some(client);
        self.last_sent = Instant::now();
        info!("MQTT session established");
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.client.is_some()
    }

    async fn service(&mut self) -> Result<(), NetworkError> {
        let Some(interval) = self.ping_interval() else {
            return Ok(());
        };
        let Some(client) = self.client.as_mut() else {
            return Ok(());
        };
        if self.last_sent.elapsed() < interval {
            return Ok(());
        }

        let failed = match client.ping().await {
            Ok(_) => false,
            Err(e) => {
                warn!("MQTT keep-alive failed: {:?}", Debug2Format(&e));
                true
            }
        };
        if failed {
            self.client = None;
            return Err(MqttError::KeepAliveFailed.into());
        }

        self.last_sent = Instant::now();
        debug!("PINGREQ sent");
        Ok(())
    }

    async fn publish(&mut self, topic: &str, payload: &[u8]) -> Result<(), NetworkError> {
        validate_topic(topic)?;
        let Some(client) = self.client.as_mut() else {
            return Err(NetworkError::NotConnected);
        };

        let name = MqttString::new(topic.into()).map_err(|e| {
            error!("Failed to create MQTT topic string: {:?}", Debug2Format(&e));
            MqttError::ProtocolError
        })?;
        // SAFETY: validate_topic() rejected wildcards, NUL and empty names
        let topic_name = unsafe { TopicName::new_unchecked(name) };

        let pub_options = PublicationOptions {
            retain: false,
            message_expiry_interval: None,
            topic: TopicReference::Name(topic_name),
            qos: QoS::AtMostOnce,
        };

        let failed = match client.publish(&pub_options, Bytes::from(payload)).await {
            Ok(_) => false,
            Err(e) => {
                warn!("MQTT publish failed: {:?}", Debug2Format(&e));
                true
            }
        };
        if failed {
            self.client = None;
            return Err(MqttError::PublishFailed.into());
        }

        self.last_sent = Instant::now();
        Ok(())
    }
}
