#![deny(unsafe_code)]
//! Wired network link
//!
//! The W5500 has no radio: association is "DHCP lease acquired".
//! Wireless credentials are accepted and ignored.

use core::cell::Cell;

use defmt::{info, warn};
use embassy_net::Stack;
use hal_abstractions::{LinkCredentials, NetworkLink};

use super::error::NetworkError;

pub struct EthernetLink {
    stack: Stack<'static>,
    announced: Cell<bool>,
}

impl EthernetLink {
    pub fn new(stack: Stack<'static>) -> Self {
        Self {
            stack,
            announced: Cell::new(false),
        }
    }

    fn announce(&self) {
        if let Some(config) = self.stack.config_v4() {
            let octets = config.address.address().octets();
            info!(
                "IP: {}.{}.{}.{}",
                octets[0], octets[1], octets[2], octets[3]
            );

            if let Some(gateway) = config.gateway {
                let gw_octets = gateway.octets();
                info!(
                    "Gateway: {}.{}.{}.{}",
                    gw_octets[0], gw_octets[1], gw_octets[2], gw_octets[3]
                );
            }
        }
    }
}

impl NetworkLink for EthernetLink {
    type Error = NetworkError;

    async fn begin(&mut self, credentials: &LinkCredentials) -> Result<(), NetworkError> {
        if let Some(ssid) = credentials.ssid() {
            warn!(
                "Wired link: ignoring {} credentials for SSID '{}'",
                credentials.kind(),
                ssid
            );
        }
        self.announced.set(false);
        info!("Waiting for DHCP...");
        Ok(())
    }

    fn is_up(&self) -> bool {
        let up = self.stack.is_config_up();
        if up && !self.announced.replace(true) {
            info!("Network is UP!");
            self.announce();
        }
        up
    }
}
