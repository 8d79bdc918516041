//! Async driver for the InvenSense MPU6050 accelerometer/gyroscope
//!
//! Talks to the chip over any `embedded-hal-async` I2C bus and reports
//! readings in SI units (m/s², rad/s) through
//! [`hal_abstractions::ImuSensor`].

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

mod fmt;

pub mod registers;

use embedded_hal_async::delay::DelayNs;
use embedded_hal_async::i2c::I2c;
use hal_abstractions::{
    AccelRange, GyroRange, HighPassFilter, ImuReading, ImuSensor, SensorSettings, Vector3,
};

use registers::{pwr_mgmt_1, Register, DATA_BURST_LEN, DEFAULT_ADDRESS, WHO_AM_I_VALUE};

/// Standard gravity (m/s²)
pub const STANDARD_GRAVITY: f32 = 9.80665;

/// Time the chip needs after `DEVICE_RESET`
const RESET_DELAY_MS: u32 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error<E> {
    /// Bus-level failure (NACK, arbitration loss, ...)
    I2c(E),
    /// Something answered, but `WHO_AM_I` did not match
    WrongDevice(u8),
}

impl<E: core::fmt::Debug> core::fmt::Display for Error<E> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::I2c(e) => write!(f, "I2C error: {:?}", e),
            Self::WrongDevice(id) => write!(f, "Unexpected WHO_AM_I: {:#x}", id),
        }
    }
}

impl<E: core::fmt::Debug> core::error::Error for Error<E> {}

pub struct Mpu6050<I2C, D> {
    i2c: I2C,
    delay: D,
    address: u8,
    accel_range: AccelRange,
    gyro_range: GyroRange,
}

impl<I2C, D> Mpu6050<I2C, D>
where
    I2C: I2c,
    D: DelayNs,
{
    pub fn new(i2c: I2C, delay: D) -> Self {
        Self::with_address(i2c, delay, DEFAULT_ADDRESS)
    }

    pub fn with_address(i2c: I2C, delay: D, address: u8) -> Self {
        Self {
            i2c,
            delay,
            address,
            // Power-on ranges
            accel_range: AccelRange::G2,
            gyro_range: GyroRange::Dps250,
        }
    }

    pub fn release(self) -> (I2C, D) {
        (self.i2c, self.delay)
    }

    pub async fn who_am_i(&mut self) -> Result<u8, Error<I2C::Error>> {
        self.read_reg(Register::WhoAmI).await
    }

    /// Full reset, then wake up on the gyro PLL clock
    pub async fn reset(&mut self) -> Result<(), Error<I2C::Error>> {
        self.write_reg(Register::PwrMgmt1, pwr_mgmt_1::DEVICE_RESET)
            .await?;
        self.delay.delay_ms(RESET_DELAY_MS).await;
        // Clears SLEEP, which the reset sets
        self.write_reg(Register::PwrMgmt1, pwr_mgmt_1::CLKSEL_PLL_XGYRO)
            .await?;
        self.accel_range = AccelRange::G2;
        self.gyro_range = GyroRange::Dps250;
        Ok(())
    }

    pub async fn set_gyro_range(&mut self, range: GyroRange) -> Result<(), Error<I2C::Error>> {
        self.write_reg(Register::GyroConfig, registers::gyro_config(range))
            .await?;
        self.gyro_range = range;
        Ok(())
    }

    /// Accelerometer range and high-pass filter share one register
    pub async fn set_accel_config(
        &mut self,
        range: AccelRange,
        hpf: HighPassFilter,
    ) -> Result<(), Error<I2C::Error>> {
        self.write_reg(Register::AccelConfig, registers::accel_config(range, hpf))
            .await?;
        self.accel_range = range;
        Ok(())
    }

    /// Raw accel, temperature and gyro words
    pub async fn read_raw(&mut self) -> Result<[i16; 7], Error<I2C::Error>> {
        let mut buf = [0u8; DATA_BURST_LEN];
        self.i2c
            .write_read(self.address, &[Register::AccelXoutH.addr()], &mut buf)
            .await
            .map_err(Error::I2c)?;

        let mut words = [0i16; 7];
        for (word, bytes) in words.iter_mut().zip(buf.chunks_exact(2)) {
            *word = i16::from_be_bytes([bytes[0], bytes[1]]);
        }
        Ok(words)
    }

    async fn read_reg(&mut self, reg: Register) -> Result<u8, Error<I2C::Error>> {
        let mut buf = [0u8];
        self.i2c
            .write_read(self.address, &[reg.addr()], &mut buf)
            .await
            .map_err(Error::I2c)?;
        Ok(buf[0])
    }

    async fn write_reg(&mut self, reg: Register, value: u8) -> Result<(), Error<I2C::Error>> {
        self.i2c
            .write(self.address, &[reg.addr(), value])
            .await
            .map_err(Error::I2c)
    }
}

/// Convert raw accelerometer counts to m/s²
pub fn accel_to_mps2(raw: i16, range: AccelRange) -> f32 {
    f32::from(raw) / registers::accel_lsb_per_g(range) * STANDARD_GRAVITY
}

/// Convert raw gyroscope counts to rad/s
pub fn gyro_to_radps(raw: i16, range: GyroRange) -> f32 {
    (f32::from(raw) / registers::gyro_lsb_per_dps(range)).to_radians()
}

impl<I2C, D> ImuSensor for Mpu6050<I2C, D>
where
    I2C: I2c,
    D: DelayNs,
{
    type Error = Error<I2C::Error>;

    async fn probe(&mut self) -> Result<(), Self::Error> {
        match self.who_am_i().await {
            Ok(WHO_AM_I_VALUE) => {
                info!("MPU6050 found at {=u8:#x}", self.address);
                Ok(())
            }
            Ok(id) => {
                warn!("Device at {=u8:#x} is not an MPU6050 (WHO_AM_I {=u8:#x})", self.address, id);
                Err(Error::WrongDevice(id))
            }
            Err(e) => {
                debug!("No answer from {=u8:#x}", self.address);
                Err(e)
            }
        }
    }

    async fn configure(&mut self, settings: &SensorSettings) -> Result<(), Self::Error> {
        self.reset().await?;
        // Full output rate, no digital low-pass filter
        self.write_reg(Register::SmplrtDiv, 0).await?;
        self.write_reg(Register::Config, 0).await?;
        self.set_gyro_range(settings.gyro_range).await?;
        self.set_accel_config(settings.accel_range, settings.high_pass)
            .await?;
        info!(
            "MPU6050 configured: +/-{} g, +/-{} deg/s",
            settings.accel_range.full_scale_g(),
            settings.gyro_range.full_scale_dps()
        );
        Ok(())
    }

    async fn read(&mut self) -> Result<ImuReading, Self::Error> {
        let [ax, ay, az, _temp, gx, gy, gz] = self.read_raw().await?;
        let (a, g) = (self.accel_range, self.gyro_range);
        Ok(ImuReading {
            accel: Vector3::new(accel_to_mps2(ax, a), accel_to_mps2(ay, a), accel_to_mps2(az, a)),
            gyro: Vector3::new(gyro_to_radps(gx, g), gyro_to_radps(gy, g), gyro_to_radps(gz, g)),
        })
    }
}
