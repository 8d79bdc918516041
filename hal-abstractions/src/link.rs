//! Network association (layer 2/3 link) abstraction

use core::future::Future;

/// Credentials used to join the local network
///
/// No `Debug` impl: secrets must never reach a log. Use `kind()` and
/// `ssid()` for diagnostics.
#[derive(Clone, Copy, PartialEq, Eq)]
pub enum LinkCredentials {
    /// Wired link, addressing via DHCP
    Wired,
    /// WPA2-Personal
    Psk {
        ssid: &'static str,
        passphrase: &'static str,
    },
    /// WPA2-Enterprise with PEAP
    Enterprise {
        ssid: &'static str,
        identity: &'static str,
        username: &'static str,
        password: &'static str,
    },
}

impl LinkCredentials {
    /// Short name of the credential kind, safe to log
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Wired => "wired",
            Self::Psk { .. } => "wpa2-psk",
            Self::Enterprise { .. } => "wpa2-peap",
        }
    }

    /// Network name for wireless credentials
    pub const fn ssid(&self) -> Option<&'static str> {
        match self {
            Self::Wired => None,
            Self::Psk { ssid, .. } | Self::Enterprise { ssid, .. } => Some(ssid),
        }
    }
}

/// Network association
///
/// `begin` starts association and may return before the link is usable;
/// callers poll `is_up` until the link has an address.
pub trait NetworkLink {
    type Error: core::fmt::Debug;

    /// Start associating with the given credentials
    fn begin(
        &mut self,
        credentials: &LinkCredentials,
    ) -> impl Future<Output = Result<(), Self::Error>>;

    /// Whether the link is associated and configured
    fn is_up(&self) -> bool;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_credential_kind() {
        assert_eq!(LinkCredentials::Wired.kind(), "wired");
        assert_eq!(LinkCredentials::Wired.ssid(), None);

        let psk = LinkCredentials::Psk {
            ssid: "hotspot",
            passphrase: "secret",
        };
        assert_eq!(psk.kind(), "wpa2-psk");
        assert_eq!(psk.ssid(), Some("hotspot"));

        let peap = LinkCredentials::Enterprise {
            ssid: "campus",
            identity: "anon",
            username: "user",
            password: "pass",
        };
        assert_eq!(peap.kind(), "wpa2-peap");
        assert_eq!(peap.ssid(), Some("campus"));
    }
}
