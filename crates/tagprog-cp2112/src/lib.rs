//! tagprog-cp2112 - CP2112 USB-to-I2C bridge support
//!
//! This crate drives the Silicon Labs CP2112 HID-to-I2C bridge and
//! exposes it as a `TagTransport`. The bridge is commanded through
//! 64-byte HID interrupt reports; every I2C transaction is started
//! with a report, then polled to completion through transfer status
//! frames. A chip that NACKs mid-transaction (typically because an RF
//! reader holds it) shows up as a short transfer, while a bridge that
//! stays busy past the retry limit is cancelled and reported as a
//! hard transport error.
//!
//! # Example
//!
//! ```no_run
//! use tagprog_cp2112::Cp2112;
//! use tagprog_core::{ChipModel, DeviceId, Session};
//!
//! let bridge = Cp2112::open()?;
//! let mut session = Session::open(bridge, ChipModel::X2k, DeviceId::DEFAULT);
//! let (model, id) = session.auto_detect()?;
//! println!("Found {} tag chip at {}", model, id);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(feature = "std")]
mod device;
#[cfg(feature = "std")]
mod error;
mod protocol;

#[cfg(feature = "std")]
pub use device::{parse_options, Cp2112, Cp2112Config, HidChannel, UsbChannel};
#[cfg(feature = "std")]
pub use error::{Cp2112Error, Result};
pub use protocol::{CP2112_USB_PRODUCT, CP2112_USB_VENDOR, READ_UNIT, RETRY_LIMIT};
