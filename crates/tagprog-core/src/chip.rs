//! Tag chip model definitions
//!
//! The two supported chip variants differ in capacity and, more
//! importantly, in how the wired interface addresses memory: the 2 KiB
//! part has an 8-bit wire address and borrows the low bit of the device
//! address as a ninth address bit, while the 8 KiB part uses a plain
//! 16-bit wire address.

use core::fmt;

use crate::transport::AddrWidth;

/// Gen2 class identifier found in TID memory when a chip is present.
pub const GEN2_CLASS_ID: u8 = 0xE2;

/// Length of the TID identity block in bytes (class id through serial).
pub const TID_LEN: usize = 12;

/// Tag memory bank
///
/// A semantic region of tag memory, not a physical address by itself.
/// The physical location depends on the chip model, see
/// [`ChipModel::base_address`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemoryBank {
    /// Passwords and all control/lock bits
    Reserved,
    /// PC word plus the variable-length EPC
    Epc,
    /// Read-only chip identity (class id, model number, serial)
    Tid,
    /// General purpose user memory
    User,
}

/// Base address and size of one bank on one chip model
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BankRegion {
    /// Absolute chip address of the first byte of the bank
    pub base: u16,
    /// Bank size in bytes
    pub size: u16,
}

impl BankRegion {
    const fn new(base: u16, size: u16) -> Self {
        Self { base, size }
    }
}

/// Fixed per-model description of the wired interface
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModelDescriptor {
    /// 12-bit tag model number as reported in TID memory
    pub model_number: u16,
    /// Width of the wire address field
    pub addr_width: AddrWidth,
    /// Whether the address space is split across two bus addresses
    pub split_address_space: bool,
    /// TID offset of the Gen2 class id byte
    pub class_id_offset: u16,
    /// TID offset of the 2-byte model number field
    pub model_number_offset: u16,
    reserved: BankRegion,
    epc: BankRegion,
    tid: BankRegion,
    user: BankRegion,
}

impl ModelDescriptor {
    const fn region(&self, bank: MemoryBank) -> BankRegion {
        match bank {
            MemoryBank::Reserved => self.reserved,
            MemoryBank::Epc => self.epc,
            MemoryBank::Tid => self.tid,
            MemoryBank::User => self.user,
        }
    }
}

const X2K: ModelDescriptor = ModelDescriptor {
    model_number: 0x140,
    addr_width: AddrWidth::One,
    split_address_space: true,
    class_id_offset: 0x10,
    model_number_offset: 0x12,
    reserved: BankRegion::new(0x00, 22),
    epc: BankRegion::new(0x16, 18),
    tid: BankRegion::new(0x138, 24),
    user: BankRegion::new(0x28, 272),
};

const X8K: ModelDescriptor = ModelDescriptor {
    model_number: 0x150,
    addr_width: AddrWidth::Two,
    split_address_space: false,
    class_id_offset: 0x00,
    model_number_offset: 0x02,
    reserved: BankRegion::new(0x00, 22),
    epc: BankRegion::new(0x16, 18),
    tid: BankRegion::new(0x28, 24),
    user: BankRegion::new(0x40, 1024),
};

/// Tag chip capacity variant
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChipModel {
    /// 2 KiB part, 8-bit wire address split across two bus addresses
    X2k,
    /// 8 KiB part, 16-bit wire address
    X8k,
}

impl ChipModel {
    /// Both models in probe order (smaller part first)
    pub const ALL: [ChipModel; 2] = [ChipModel::X2k, ChipModel::X8k];

    /// Get the fixed descriptor for this model
    pub const fn descriptor(self) -> &'static ModelDescriptor {
        match self {
            ChipModel::X2k => &X2K,
            ChipModel::X8k => &X8K,
        }
    }

    /// Absolute chip address of the first byte of `bank`
    pub const fn base_address(self, bank: MemoryBank) -> u16 {
        self.descriptor().region(bank).base
    }

    /// Size of `bank` in bytes
    pub const fn bank_size(self, bank: MemoryBank) -> u16 {
        self.descriptor().region(bank).size
    }

    /// Width of the wire address field for this model
    pub const fn addr_width(self) -> AddrWidth {
        self.descriptor().addr_width
    }

    /// 12-bit tag model number this variant reports in TID memory
    pub const fn model_number(self) -> u16 {
        self.descriptor().model_number
    }
}

impl fmt::Display for ChipModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChipModel::X2k => write!(f, "2K"),
            ChipModel::X8k => write!(f, "8K"),
        }
    }
}

/// Validated I2C device address of a tag chip
///
/// Tag chips answer at one of four 7-bit bus addresses selected by two
/// configuration bits. The 2 KiB part additionally claims the odd
/// neighbor of its configured address for the upper half of its memory;
/// that neighbor is a wire-level detail and never a legal `DeviceId`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceId(u8);

impl DeviceId {
    /// The four legal device addresses, in probe order
    pub const ALL: [DeviceId; 4] = [
        DeviceId(0x68),
        DeviceId(0x6A),
        DeviceId(0x6C),
        DeviceId(0x6E),
    ];

    /// Factory default device address
    pub const DEFAULT: DeviceId = DeviceId(0x6E);

    /// Validate a raw bus address
    pub fn new(raw: u8) -> Option<Self> {
        Self::ALL.iter().copied().find(|id| id.0 == raw)
    }

    /// The raw 7-bit bus address
    pub const fn value(self) -> u8 {
        self.0
    }

    /// Two-bit address selector as stored in the control byte
    pub const fn selector(self) -> u8 {
        (self.0 - 0x68) >> 1
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:02X}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bank_table_matches_datasheet() {
        for model in ChipModel::ALL {
            assert_eq!(model.base_address(MemoryBank::Reserved), 0x00);
            assert_eq!(model.bank_size(MemoryBank::Reserved), 22);
            assert_eq!(model.base_address(MemoryBank::Epc), 0x16);
            assert_eq!(model.bank_size(MemoryBank::Epc), 18);
            assert_eq!(model.bank_size(MemoryBank::Tid), 24);
        }
        assert_eq!(ChipModel::X2k.base_address(MemoryBank::Tid), 0x138);
        assert_eq!(ChipModel::X2k.base_address(MemoryBank::User), 0x28);
        assert_eq!(ChipModel::X2k.bank_size(MemoryBank::User), 272);
        assert_eq!(ChipModel::X8k.base_address(MemoryBank::Tid), 0x28);
        assert_eq!(ChipModel::X8k.base_address(MemoryBank::User), 0x40);
        assert_eq!(ChipModel::X8k.bank_size(MemoryBank::User), 1024);
    }

    #[test]
    fn device_id_validation() {
        assert_eq!(DeviceId::new(0x68), Some(DeviceId::ALL[0]));
        assert_eq!(DeviceId::new(0x69), None);
        assert_eq!(DeviceId::new(0x70), None);
        assert_eq!(DeviceId::DEFAULT.value(), 0x6E);
    }

    #[test]
    fn device_id_selector_bits() {
        assert_eq!(DeviceId::ALL[0].selector(), 0b00);
        assert_eq!(DeviceId::ALL[1].selector(), 0b01);
        assert_eq!(DeviceId::ALL[2].selector(), 0b10);
        assert_eq!(DeviceId::ALL[3].selector(), 0b11);
    }
}
