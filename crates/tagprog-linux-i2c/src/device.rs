//! Linux I2C device implementation
//!
//! This module provides the `LinuxI2c` struct that implements the
//! `TagTransport` trait using Linux's i2c-dev interface. Transactions
//! go through the `I2C_RDWR` ioctl so the address write and the data
//! read share one bus transaction with a repeated start, which the tag
//! chip requires.

use crate::error::{LinuxI2cError, Result};

use tagprog_core::error::Result as CoreResult;
use tagprog_core::transport::{Addressing, TagTransport};

use std::fs::{File, OpenOptions};
use std::os::unix::io::AsRawFd;

/// Combined-transaction ioctl on an i2c-dev file
const I2C_RDWR: libc::c_ulong = 0x0707;

/// i2c_msg flag: this message reads from the slave
const I2C_M_RD: u16 = 0x0001;

mod ioctl {
    use nix::ioctl_write_ptr_bad;

    ioctl_write_ptr_bad!(i2c_rdwr, super::I2C_RDWR, super::I2cRdwrIoctlData);
}

/// Largest read the kernel accepts in one i2c_msg
const MAX_TRANSFER: usize = 8192;

/// Message structure for I2C_RDWR
/// This must match the kernel's struct i2c_msg layout
#[repr(C)]
struct I2cMsg {
    addr: u16,
    flags: u16,
    len: u16,
    buf: *mut u8,
}

/// Argument structure for I2C_RDWR
/// This must match the kernel's struct i2c_rdwr_ioctl_data layout
#[repr(C)]
struct I2cRdwrIoctlData {
    msgs: *mut I2cMsg,
    nmsgs: u32,
}

/// A NACKed or aborted transaction, as opposed to a broken adapter.
///
/// The tag chip NACKs mid-transaction while an RF reader holds it, so
/// these come back as short transfers rather than errors.
fn is_nack(errno: i32) -> bool {
    matches!(errno, libc::EREMOTEIO | libc::ENXIO | libc::EIO | libc::EAGAIN)
}

/// Configuration for opening a Linux I2C device
#[derive(Debug, Clone, Default)]
pub struct LinuxI2cConfig {
    /// Device path (e.g., "/dev/i2c-1")
    pub device: String,
}

impl LinuxI2cConfig {
    /// Create a new configuration with the given device path
    pub fn new(device: impl Into<String>) -> Self {
        Self {
            device: device.into(),
        }
    }
}

/// Linux I2C transport using the i2c-dev interface
pub struct LinuxI2c {
    file: File,
}

impl LinuxI2c {
    /// Open a Linux I2C device with the given configuration
    pub fn open(config: &LinuxI2cConfig) -> Result<Self> {
        if config.device.is_empty() {
            return Err(LinuxI2cError::NoDevice);
        }

        log::debug!("linux_i2c: Opening device {}", config.device);

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(&config.device)
            .map_err(|e| LinuxI2cError::OpenFailed {
                path: config.device.clone(),
                source: e,
            })?;

        log::info!("linux_i2c: Opened {}", config.device);
        Ok(Self { file })
    }

    /// Open a device with default settings
    pub fn open_device(device: &str) -> Result<Self> {
        Self::open(&LinuxI2cConfig::new(device))
    }

    /// Run one combined transaction.
    ///
    /// Returns whether the transaction completed; a NACK is `Ok(false)`
    /// and only adapter-level failures are errors.
    fn transfer(&mut self, msgs: &mut [I2cMsg]) -> Result<bool> {
        let mut data = I2cRdwrIoctlData {
            msgs: msgs.as_mut_ptr(),
            nmsgs: msgs.len() as u32,
        };

        let ret = unsafe { ioctl::i2c_rdwr(self.file.as_raw_fd(), &mut data) };
        match ret {
            Ok(_) => Ok(true),
            Err(errno) => {
                let err = std::io::Error::from_raw_os_error(errno as i32);
                if is_nack(errno as i32) {
                    log::debug!("linux_i2c: transaction NACKed: {}", err);
                    return Ok(false);
                }
                Err(LinuxI2cError::TransferFailed(err))
            }
        }
    }
}

impl TagTransport for LinuxI2c {
    fn max_read_len(&self) -> usize {
        MAX_TRANSFER
    }

    fn read(&mut self, addressing: Addressing, buf: &mut [u8]) -> CoreResult<usize> {
        if buf.len() > MAX_TRANSFER {
            return Err(tagprog_core::Error::BufferTooSmall);
        }

        let (mut addr, addr_len) = addressing.addr_bytes();
        let mut msgs = [
            I2cMsg {
                addr: addressing.device_id as u16,
                flags: 0,
                len: addr_len as u16,
                buf: addr.as_mut_ptr(),
            },
            I2cMsg {
                addr: addressing.device_id as u16,
                flags: I2C_M_RD,
                len: buf.len() as u16,
                buf: buf.as_mut_ptr(),
            },
        ];

        match self
            .transfer(&mut msgs)
            .map_err(|_| tagprog_core::Error::IoError)?
        {
            true => Ok(buf.len()),
            false => Ok(0),
        }
    }

    fn write(&mut self, addressing: Addressing, words: &[u8]) -> CoreResult<usize> {
        if words.len() % 2 != 0 {
            return Err(tagprog_core::Error::InvalidAlignment);
        }
        let (addr, addr_len) = addressing.addr_bytes();
        let mut frame = Vec::with_capacity(addr_len + words.len());
        frame.extend_from_slice(&addr[..addr_len]);
        frame.extend_from_slice(words);

        let mut msgs = [I2cMsg {
            addr: addressing.device_id as u16,
            flags: 0,
            len: frame.len() as u16,
            buf: frame.as_mut_ptr(),
        }];

        match self
            .transfer(&mut msgs)
            .map_err(|_| tagprog_core::Error::IoError)?
        {
            true => Ok(words.len()),
            false => Ok(0),
        }
    }
}

/// Parse programmer options from a list of key-value pairs
///
/// Supported options:
/// - `dev=/dev/i2c-N`: required, the adapter device path
pub fn parse_options(options: &[(&str, &str)]) -> Result<LinuxI2cConfig> {
    let mut config = LinuxI2cConfig::default();

    for (key, value) in options {
        match *key {
            "dev" => {
                config.device = value.to_string();
            }
            _ => {
                return Err(LinuxI2cError::InvalidParameter(format!(
                    "unknown option: {}",
                    key
                )));
            }
        }
    }

    if config.device.is_empty() {
        return Err(LinuxI2cError::NoDevice);
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn i2c_msg_matches_kernel_layout() {
        assert_eq!(
            std::mem::size_of::<I2cMsg>(),
            std::mem::size_of::<*mut u8>() + 8
        );
        assert_eq!(std::mem::align_of::<I2cMsg>(), std::mem::align_of::<*mut u8>());
    }

    #[test]
    fn nack_errnos() {
        assert!(is_nack(libc::EREMOTEIO));
        assert!(is_nack(libc::ENXIO));
        assert!(!is_nack(libc::EBADF));
    }

    #[test]
    fn option_parsing() {
        let config = parse_options(&[("dev", "/dev/i2c-1")]).unwrap();
        assert_eq!(config.device, "/dev/i2c-1");
        assert!(matches!(parse_options(&[]), Err(LinuxI2cError::NoDevice)));
        assert!(parse_options(&[("speed", "400")]).is_err());
    }
}
