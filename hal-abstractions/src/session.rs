//! Publish session abstraction (e.g. MQTT over TLS)

use core::future::Future;

/// Username/password pair presented to the broker
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct BrokerCredentials {
    pub username: &'static str,
    pub password: &'static str,
}

/// Parameters for one session establishment attempt
#[derive(Clone, Copy)]
pub struct SessionOptions<'a> {
    /// Fixed client identifier
    pub client_id: &'a str,
    /// Credentials, if the session should authenticate
    pub credentials: Option<&'a BrokerCredentials>,
}

/// Authenticated application-level session with a telemetry broker
///
/// The session tracks its own health: any transport failure during
/// `service` or `publish` must leave `is_connected` returning `false`.
pub trait TelemetrySession {
    type Error: core::fmt::Debug;

    /// Open a new session, replacing any previous one
    fn connect(
        &mut self,
        options: &SessionOptions<'_>,
    ) -> impl Future<Output = Result<(), Self::Error>>;

    /// Whether a session is currently established
    fn is_connected(&self) -> bool;

    /// Protocol housekeeping (keepalive, incoming traffic)
    ///
    /// Called once per loop iteration; must return quickly when there is
    /// nothing to do.
    fn service(&mut self) -> impl Future<Output = Result<(), Self::Error>>;

    /// Fire-and-forget publish to `topic`
    fn publish(
        &mut self,
        topic: &str,
        payload: &[u8],
    ) -> impl Future<Output = Result<(), Self::Error>>;
}
