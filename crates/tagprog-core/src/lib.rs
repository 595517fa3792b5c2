//! tagprog-core - Core library for dual-interface RFID tag programming
//!
//! This crate drives Gen2 dual-interface tag chips (2 KiB and 8 KiB
//! variants) through their wired I2C interface. Tag memory is exposed as
//! four banks (Reserved, EPC, TID, User) plus a set of named operations
//! for locks, passwords, kill state and RF configuration. It is designed
//! to be `no_std` compatible for use in embedded environments.
//!
//! # Features
//!
//! - `std` - Enable standard library support (includes `alloc`)
//! - `alloc` - Enable heap allocation (boxed transport trait objects)
//!
//! # Example
//!
//! ```ignore
//! use tagprog_core::{ChipModel, DeviceId, Session};
//!
//! fn probe<T: tagprog_core::TagTransport>(transport: T) {
//!     let mut session = Session::open(transport, ChipModel::X2k, DeviceId::DEFAULT);
//!     match session.auto_detect() {
//!         Ok((model, id)) => println!("Found {} at 0x{:02X}", model, id.value()),
//!         Err(e) => println!("No tag chip found: {}", e),
//!     }
//! }
//! ```

#![no_std]
#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

#[cfg(feature = "alloc")]
extern crate alloc;

#[cfg(any(feature = "std", test))]
extern crate std;

pub mod addressing;
pub mod chip;
pub mod error;
pub mod reg;
pub mod tag;
pub mod transport;

pub use chip::{ChipModel, DeviceId, MemoryBank};
pub use error::{Error, Result};
pub use tag::Session;
pub use transport::{AddrWidth, Addressing, TagTransport};
