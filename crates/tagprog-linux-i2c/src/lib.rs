//! tagprog-linux-i2c - Linux i2c-dev support
//!
//! This crate provides direct I2C access to tag chips via the Linux
//! `/dev/i2c-N` adapter interface.
//!
//! # Overview
//!
//! Each transaction goes through the `I2C_RDWR` ioctl: reads pair an
//! address-write message with a read message in one combined
//! transaction, writes send the address bytes and the data in a single
//! message. A chip that NACKs (typically because an RF reader holds
//! it) surfaces as a short transfer.
//!
//! # Example
//!
//! ```no_run
//! use tagprog_linux_i2c::LinuxI2c;
//! use tagprog_core::{ChipModel, DeviceId, Session};
//!
//! let bus = LinuxI2c::open_device("/dev/i2c-1")?;
//! let mut session = Session::open(bus, ChipModel::X2k, DeviceId::DEFAULT);
//! let (model, id) = session.auto_detect()?;
//! println!("Found {} tag chip at {}", model, id);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! # System Requirements
//!
//! - Linux kernel with i2c-dev support enabled (`CONFIG_I2C_CHARDEV`)
//! - Read/write access to the `/dev/i2c-N` device
//! - May require adding user to the `i2c` group or using udev rules

pub mod device;
pub mod error;

pub use device::{parse_options, LinuxI2c, LinuxI2cConfig};
pub use error::{LinuxI2cError, Result};
