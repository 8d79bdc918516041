#![deny(unsafe_code)]
//! Serial output for JSON lines
//!
//! USART3 TX only, blocking writes. At 115200 baud one payload line takes
//! about 8 ms, inside the 10 ms sample budget.

use defmt::Format;
use embassy_stm32::mode::Blocking;
use embassy_stm32::usart::{self, UartTx};
use embedded_io_async::{ErrorKind, ErrorType, Write};

/// Baud rate of the diagnostic serial port
pub const BAUD_RATE: u32 = 115_200;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Format)]
pub struct SerialError(usart::Error);

impl core::fmt::Display for SerialError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "Serial write failed: {:?}", self.0)
    }
}

impl core::error::Error for SerialError {}

impl embedded_io_async::Error for SerialError {
    fn kind(&self) -> ErrorKind {
        ErrorKind::Other
    }
}

pub struct SerialPort {
    tx: UartTx<'static, Blocking>,
}

impl SerialPort {
    pub fn new(tx: UartTx<'static, Blocking>) -> Self {
        Self { tx }
    }

    /// Default port settings with [`BAUD_RATE`]
    pub fn config() -> usart::Config {
        let mut config = usart::Config::default();
        config.baudrate = BAUD_RATE;
        config
    }
}

impl ErrorType for SerialPort {
    type Error = SerialError;
}

impl Write for SerialPort {
    async fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        self.tx.blocking_write(buf).map_err(SerialError)?;
        Ok(buf.len())
    }

    async fn flush(&mut self) -> Result<(), Self::Error> {
        self.tx.blocking_flush().map_err(SerialError)
    }
}
