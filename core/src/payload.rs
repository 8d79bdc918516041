//! JSON payload encoding
//!
//! The payload shape is a downstream contract: consumers parse it by key
//! and by position, so field order and precision never change.
//!
//! ```text
//! {"ts":10023,"ax":0.1234,"ay":-9.8001,"az":0.0312,"gx":1.0000,"gy":-0.5000,"gz":0.0001}
//! ```

use core::fmt::Write;

use heapless::String;

use crate::error::PayloadError;
use crate::sample::Sample;

/// Payload buffer capacity in bytes
pub const PAYLOAD_CAPACITY: usize = 256;

/// Field names in wire order
pub const FIELDS: [&str; 7] = ["ts", "ax", "ay", "az", "gx", "gy", "gz"];

/// Fractional digits for every floating-point field
pub const FRACTION_DIGITS: usize = 4;

/// Serialized sample
pub type Payload = String<PAYLOAD_CAPACITY>;

/// Encode a sample as a compact JSON object
pub fn encode(sample: &Sample) -> Result<Payload, PayloadError> {
    if !sample.is_finite() {
        return Err(PayloadError::NonFinite);
    }

    let mut out = Payload::new();
    write!(
        &mut out,
        "{{\"ts\":{},\"ax\":{:.4},\"ay\":{:.4},\"az\":{:.4},\"gx\":{:.4},\"gy\":{:.4},\"gz\":{:.4}}}",
        sample.timestamp_ms,
        sample.accel.x,
        sample.accel.y,
        sample.accel.z,
        sample.gyro.x,
        sample.gyro.y,
        sample.gyro.z,
    )
    .map_err(|_| PayloadError::Overflow)?;

    Ok(out)
}
