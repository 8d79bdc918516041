#![deny(unsafe_code)]
//! Build-time configuration
//!
//! Values are read from the build environment, e.g.
//!
//! ```text
//! TELEMETRY_OUTPUT=serial MQTT_HOST=broker.lan cargo run --release
//! ```
//!
//! Unset variables keep the [`TelemetryConfig`] defaults. Invalid values are
//! logged and ignored.
//!
//! | Variable | Meaning |
//! |---|---|
//! | `TELEMETRY_OUTPUT` | `discard`, `serial` or `mqtt` (or `0`/`1`/`2`) |
//! | `TELEMETRY_INTERVAL_MS` | minimum time between samples |
//! | `TELEMETRY_TOPIC` | publish topic |
//! | `TELEMETRY_CLIENT_ID` | session client id; empty uses the chip UID |
//! | `MQTT_HOST`, `MQTT_PORT` | broker address |
//! | `MQTT_TLS` | present credentials over the encrypted session |
//! | `MQTT_USERNAME`, `MQTT_PASSWORD` | broker credentials |
//! | `MQTT_KEEP_ALIVE_SECS` | keep-alive, `0` disables |
//! | `MQTT_CA_CERT_DER` | absolute path of the broker root certificate (DER), with `--features ca-cert` |
//! | `WIFI_SSID`, `WIFI_PASSPHRASE` | WPA2-PSK credentials |
//! | `WIFI_IDENTITY`, `WIFI_USERNAME`, `WIFI_PASSWORD` | WPA2-PEAP credentials |

use defmt::{error, info, warn};
use hal_abstractions::{BrokerCredentials, LinkCredentials};
use telemetry_core::config::{parse_der_certificate, parse_flag, parse_interval_ms, parse_port};
use telemetry_core::{ConfigError, TelemetryConfig};

/// Overwrite `slot` when `raw` is set and parses
fn apply<T>(
    name: &str,
    raw: Option<&'static str>,
    slot: &mut T,
    parse: impl FnOnce(&str) -> Result<T, ConfigError>,
) {
    let Some(raw) = raw else {
        return;
    };
    match parse(raw) {
        Ok(value) => *slot = value,
        Err(e) => warn!("Ignoring {}='{}': {}", name, raw, e),
    }
}

fn parse_nonzero_interval(s: &str) -> Result<u64, ConfigError> {
    match parse_interval_ms(s)? {
        0 => Err(ConfigError::InvalidInterval),
        ms => Ok(ms),
    }
}

fn parse_keep_alive(s: &str) -> Result<u16, ConfigError> {
    s.trim()
        .parse::<u16>()
        .map_err(|_| ConfigError::InvalidInterval)
}

fn broker_credentials() -> Option<BrokerCredentials> {
    match (option_env!("MQTT_USERNAME"), option_env!("MQTT_PASSWORD")) {
        (Some(username), Some(password)) => Some(BrokerCredentials { username, password }),
        (None, None) => None,
        _ => {
            warn!("MQTT_USERNAME and MQTT_PASSWORD must be set together; ignoring");
            None
        }
    }
}

#[cfg(feature = "ca-cert")]
const CA_CERT_DER: Option<&[u8]> = Some(include_bytes!(env!("MQTT_CA_CERT_DER")));
#[cfg(not(feature = "ca-cert"))]
const CA_CERT_DER: Option<&[u8]> = None;

/// Embedded root certificate, kept even when malformed so the session
/// refuses to run without the trust anchor it was built for
fn ca_certificate() -> Option<&'static [u8]> {
    let der = CA_CERT_DER?;
    match parse_der_certificate(der) {
        Ok(cert) => info!("Root certificate embedded ({} bytes)", cert.len()),
        Err(e) => error!("MQTT_CA_CERT_DER: {}", e),
    }
    Some(der)
}

fn link_credentials() -> LinkCredentials {
    let Some(ssid) = option_env!("WIFI_SSID") else {
        return LinkCredentials::Wired;
    };

    match (
        option_env!("WIFI_IDENTITY"),
        option_env!("WIFI_USERNAME"),
        option_env!("WIFI_PASSWORD"),
        option_env!("WIFI_PASSPHRASE"),
    ) {
        (Some(identity), Some(username), Some(password), _) => LinkCredentials::Enterprise {
            ssid,
            identity,
            username,
            password,
        },
        (None, None, None, Some(passphrase)) => LinkCredentials::Psk { ssid, passphrase },
        _ => {
            warn!("Incomplete credentials for SSID '{}'; using wired link", ssid);
            LinkCredentials::Wired
        }
    }
}

/// Build the node configuration
pub fn load() -> TelemetryConfig {
    let mut config = TelemetryConfig::default();

    apply(
        "TELEMETRY_OUTPUT",
        option_env!("TELEMETRY_OUTPUT"),
        &mut config.output,
        |s| s.parse(),
    );
    apply(
        "TELEMETRY_INTERVAL_MS",
        option_env!("TELEMETRY_INTERVAL_MS"),
        &mut config.sample_interval_ms,
        parse_nonzero_interval,
    );
    if let Some(topic) = option_env!("TELEMETRY_TOPIC") {
        config.topic = topic;
    }
    if let Some(client_id) = option_env!("TELEMETRY_CLIENT_ID") {
        config.client_id = client_id;
    }

    if let Some(host) = option_env!("MQTT_HOST") {
        config.broker.host = host;
    }
    apply(
        "MQTT_PORT",
        option_env!("MQTT_PORT"),
        &mut config.broker.port,
        parse_port,
    );
    apply(
        "MQTT_TLS",
        option_env!("MQTT_TLS"),
        &mut config.broker.tls,
        parse_flag,
    );
    apply(
        "MQTT_KEEP_ALIVE_SECS",
        option_env!("MQTT_KEEP_ALIVE_SECS"),
        &mut config.broker.keep_alive_secs,
        parse_keep_alive,
    );
    config.broker.credentials = broker_credentials();
    config.broker.ca_cert = ca_certificate();

    config.link = link_credentials();

    info!(
        "Config: output={}, interval={} ms, topic='{}', broker={}:{}, link={}",
        config.output.as_str(),
        config.sample_interval_ms,
        config.topic,
        config.broker.host,
        config.broker.port,
        config.link.kind()
    );
    config
}
