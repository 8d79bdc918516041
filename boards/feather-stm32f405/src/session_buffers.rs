//! Session buffer allocations in main SRAM
//!
//! The MQTT session outlives any single function call: the TCP socket, the
//! TLS record layer and the MQTT packet buffer must all be `'static`. They
//! live here as `static mut` arrays and are handed out again on every
//! reconnect, after the previous session has been dropped.
//!
//! # Buffer Sizing
//!
//! **TLS read buffer (18 KB)**: TLS 1.3 maximum plaintext (16384 bytes),
//! record header (5), AEAD tag (16) and padding allowance.
//!
//! **TLS write buffer (16 KB)**: we control outgoing record sizes.
//!
//! **TCP buffers (4 KB each)**: one MQTT publish per sample is ~100 bytes.
//!
//! **MQTT buffer (2 KB)**: bump allocator for packet assembly.
//!
//! # Safety
//!
//! These buffers use `static mut`. Soundness relies on:
//! - a single owner ([`crate::network::MqttSession`]) calling [`take`]
//! - dropping every reference from the previous [`take`] before the next one

#![allow(unsafe_code)] // Required for static mut buffers

use rust_mqtt::buffer::BumpBuffer;

const TLS_READ_BUF_SIZE: usize = 18 * 1024;
const TLS_WRITE_BUF_SIZE: usize = 16 * 1024;
const TCP_BUF_SIZE: usize = 4 * 1024;
const MQTT_BUF_SIZE: usize = 2 * 1024;

static mut TLS_READ_BUF: [u8; TLS_READ_BUF_SIZE] = [0; TLS_READ_BUF_SIZE];
static mut TLS_WRITE_BUF: [u8; TLS_WRITE_BUF_SIZE] = [0; TLS_WRITE_BUF_SIZE];
static mut TCP_RX_BUF: [u8; TCP_BUF_SIZE] = [0; TCP_BUF_SIZE];
static mut TCP_TX_BUF: [u8; TCP_BUF_SIZE] = [0; TCP_BUF_SIZE];
static mut MQTT_BUF: [u8; MQTT_BUF_SIZE] = [0; MQTT_BUF_SIZE];

/// Bump allocator over `MQTT_BUF`; rebuilt on every [`take`]
static mut MQTT_BUMP: Option<BumpBuffer<'static>> = None;

/// All buffers one session needs
pub struct SessionBuffers {
    pub tcp_rx: &'static mut [u8],
    pub tcp_tx: &'static mut [u8],
    pub tls_read: &'static mut [u8],
    pub tls_write: &'static mut [u8],
    pub mqtt: &'static mut BumpBuffer<'static>,
}

/// Hand out the session buffers
///
/// # Safety
///
/// The caller must ensure:
/// - no reference from a previous call is still alive (drop the old
///   session first)
/// - there is only one caller, from one task
pub unsafe fn take() -> SessionBuffers {
    // SAFETY: Caller guarantees exclusive access
    // Raw pointer dereference required per Rust 2024 edition
    let mqtt_bytes: &'static mut [u8] = &mut *core::ptr::addr_of_mut!(MQTT_BUF);
    let bump = &mut *core::ptr::addr_of_mut!(MQTT_BUMP);

    SessionBuffers {
        tcp_rx: &mut *core::ptr::addr_of_mut!(TCP_RX_BUF),
        tcp_tx: &mut *core::ptr::addr_of_mut!(TCP_TX_BUF),
        tls_read: &mut *core::ptr::addr_of_mut!(TLS_READ_BUF),
        tls_write: &mut *core::ptr::addr_of_mut!(TLS_WRITE_BUF),
        mqtt: bump.insert(BumpBuffer::new(mqtt_bytes)),
    }
}
