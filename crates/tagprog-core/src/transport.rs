//! Transport trait definitions
//!
//! A [`TagTransport`] moves bytes between the host and the chip's wired
//! interface. Two implementations exist: a direct I2C bus pass-through
//! and the CP2112 USB bridge state machine. Both are synchronous and
//! both may *short-transfer*: a call can legitimately move fewer bytes
//! than requested (typically under bus contention with an RF reader),
//! which is reported through the returned count, never as an error.

use crate::error::Result;

/// Width of the wire address field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddrWidth {
    /// Single address byte (2 KiB model)
    One,
    /// Two address bytes, big-endian (8 KiB model)
    Two,
}

impl AddrWidth {
    /// Number of address bytes on the wire
    pub const fn len(self) -> usize {
        match self {
            AddrWidth::One => 1,
            AddrWidth::Two => 2,
        }
    }
}

/// One fully resolved wire address
///
/// Addressing is passed by value on every call: the temporary device-id
/// switch the 2 KiB model needs for its upper memory half is expressed
/// by constructing a different `Addressing`, so no state leaks into the
/// next call regardless of how a transfer ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Addressing {
    /// Raw 7-bit bus address to target. This is usually a legal
    /// [`DeviceId`](crate::DeviceId) value but may be its odd neighbor
    /// while the split address space of the 2 KiB model is active.
    pub device_id: u8,
    /// Wire address within the device
    pub addr: u16,
    /// Number of address bytes to put on the wire
    pub width: AddrWidth,
}

impl Addressing {
    /// Encode the wire address field, big-endian
    pub fn addr_bytes(&self) -> ([u8; 2], usize) {
        match self.width {
            AddrWidth::One => ([self.addr as u8, 0], 1),
            AddrWidth::Two => (self.addr.to_be_bytes(), 2),
        }
    }
}

/// Raw transport to a tag chip's wired interface
///
/// Implementations execute one transaction per call and report the
/// byte count actually moved. Errors are reserved for hard transport
/// faults (device gone, bridge retries exhausted); a NACKed or
/// interrupted transaction is a short count.
pub trait TagTransport {
    /// Maximum number of bytes a single read call will move
    fn max_read_len(&self) -> usize;

    /// Read `buf.len()` bytes starting at the given wire address.
    ///
    /// Returns the number of bytes actually read, which may be short
    /// or zero under bus contention.
    fn read(&mut self, addressing: Addressing, buf: &mut [u8]) -> Result<usize>;

    /// Write whole 16-bit words starting at the given wire address.
    ///
    /// The chip commits memory word-wise and the addressing adapter
    /// has already aligned the data; implementations reject an odd
    /// `words.len()` with [`Error::InvalidAlignment`](crate::Error)
    /// before touching the bus. Returns the number of bytes actually
    /// written.
    fn write(&mut self, addressing: Addressing, words: &[u8]) -> Result<usize>;
}

// Blanket impl for boxed transports to allow trait objects
#[cfg(feature = "alloc")]
impl TagTransport for alloc::boxed::Box<dyn TagTransport + Send> {
    fn max_read_len(&self) -> usize {
        (**self).max_read_len()
    }

    fn read(&mut self, addressing: Addressing, buf: &mut [u8]) -> Result<usize> {
        (**self).read(addressing, buf)
    }

    fn write(&mut self, addressing: Addressing, words: &[u8]) -> Result<usize> {
        (**self).write(addressing, words)
    }
}
