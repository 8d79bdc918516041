//! MPU6050 register map (subset used by the driver)

use hal_abstractions::{AccelRange, GyroRange, HighPassFilter};

/// Default 7-bit address (AD0 low)
pub const DEFAULT_ADDRESS: u8 = 0x68;
/// Address with AD0 pulled high
pub const ALT_ADDRESS: u8 = 0x69;

/// Value of `WHO_AM_I` on a genuine part
pub const WHO_AM_I_VALUE: u8 = 0x68;

#[repr(u8)]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Register {
    SmplrtDiv = 0x19,
    Config = 0x1A,
    GyroConfig = 0x1B,
    AccelConfig = 0x1C,
    AccelXoutH = 0x3B,
    PwrMgmt1 = 0x6B,
    WhoAmI = 0x75,
}

impl Register {
    pub const fn addr(self) -> u8 {
        self as u8
    }
}

impl From<Register> for u8 {
    fn from(r: Register) -> u8 {
        r as u8
    }
}

/// `PWR_MGMT_1` bits
pub mod pwr_mgmt_1 {
    pub const DEVICE_RESET: u8 = 1 << 7;
    /// PLL with X axis gyroscope reference
    pub const CLKSEL_PLL_XGYRO: u8 = 0x01;
}

/// Bytes in one accel + temperature + gyro burst starting at `ACCEL_XOUT_H`
pub const DATA_BURST_LEN: usize = 14;

/// `FS_SEL` field of `GYRO_CONFIG` (bits 4:3)
pub const fn gyro_config(range: GyroRange) -> u8 {
    let fs_sel = match range {
        GyroRange::Dps250 => 0,
        GyroRange::Dps500 => 1,
        GyroRange::Dps1000 => 2,
        GyroRange::Dps2000 => 3,
    };
    fs_sel << 3
}

/// `AFS_SEL` (bits 4:3) and `ACCEL_HPF` (bits 2:0) of `ACCEL_CONFIG`
pub const fn accel_config(range: AccelRange, hpf: HighPassFilter) -> u8 {
    let afs_sel = match range {
        AccelRange::G2 => 0,
        AccelRange::G4 => 1,
        AccelRange::G8 => 2,
        AccelRange::G16 => 3,
    };
    let accel_hpf = match hpf {
        HighPassFilter::Reset => 0,
        HighPassFilter::Hz5 => 1,
        HighPassFilter::Hz2_5 => 2,
        HighPassFilter::Hz1_25 => 3,
        HighPassFilter::Hz0_63 => 4,
        HighPassFilter::Hold => 7,
    };
    (afs_sel << 3) | accel_hpf
}

/// Accelerometer sensitivity in LSB per g
pub const fn accel_lsb_per_g(range: AccelRange) -> f32 {
    match range {
        AccelRange::G2 => 16384.0,
        AccelRange::G4 => 8192.0,
        AccelRange::G8 => 4096.0,
        AccelRange::G16 => 2048.0,
    }
}

/// Gyroscope sensitivity in LSB per degree/s
pub const fn gyro_lsb_per_dps(range: GyroRange) -> f32 {
    match range {
        GyroRange::Dps250 => 131.0,
        GyroRange::Dps500 => 65.5,
        GyroRange::Dps1000 => 32.8,
        GyroRange::Dps2000 => 16.4,
    }
}
