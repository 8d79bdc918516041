//! Network stack for the remote publish mode
//!
//! W5500 Ethernet → embassy-net (DHCP, DNS, TCP) → TLS 1.3 → MQTT v5.

pub mod error;
pub mod ethernet;
pub mod link;
pub mod session;
pub mod socket;

pub use error::NetworkError;
pub use ethernet::{init_stack, init_w5500, EthPeripherals};
pub use link::EthernetLink;
pub use session::MqttSession;
