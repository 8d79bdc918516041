#![deny(unsafe_code)]
//! Identifiers derived from the factory-programmed 96-bit UID
//!
//! The UID is stable across reboots and unique to each chip.

use heapless::String;

const CLIENT_ID_PREFIX: &str = "stm32f405-";

/// Prefix plus 24 hex chars
pub const CLIENT_ID_MAX_LEN: usize = 34;

/// Session client identifier: `stm32f405-{24_hex_chars}`
pub fn client_id() -> String<CLIENT_ID_MAX_LEN> {
    let mut id = String::new();
    // Both parts fit exactly; push_str cannot fail
    let _ = id.push_str(CLIENT_ID_PREFIX);
    let _ = id.push_str(embassy_stm32::uid::uid_hex());
    id
}

/// Locally administered unicast MAC address folded from the UID
pub fn mac_address() -> [u8; 6] {
    let uid = embassy_stm32::uid::uid();
    [
        0x02,
        uid[0] ^ uid[6],
        uid[1] ^ uid[7],
        uid[2] ^ uid[8],
        uid[3] ^ uid[9],
        uid[4] ^ uid[10] ^ uid[5] ^ uid[11],
    ]
}
