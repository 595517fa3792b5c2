//! Reserved-bank register map and bit manipulation helpers
//!
//! All control state of the chip lives in a handful of bytes in the
//! Reserved bank. The layout below is part of the wire contract and is
//! identical on both chip models except where noted.

use bitflags::bitflags;

use crate::chip::MemoryBank;

/// Reserved address of the kill password (4 bytes, big-endian)
pub const KILL_PW_ADDR: u16 = 0x00;
/// Reserved address of the access password (4 bytes, big-endian)
pub const ACCESS_PW_ADDR: u16 = 0x04;
/// Reserved address of the lock/permalock bit byte
pub const LOCK_BYTE: u16 = 0x08;
/// Reserved address of the control byte (block 0 lock, kill bit, device id select)
pub const CONTROL_BYTE: u16 = 0x09;
/// Reserved address of the block permalock bits for blocks 0-7 (8 KiB model)
pub const BLOCK_PERMALOCK_LO: u16 = 0x12;
/// Reserved address of the block permalock bits for blocks 8-15 (8 KiB model)
pub const BLOCK_PERMALOCK_HI: u16 = 0x13;
/// Reserved address of the RF configuration byte
pub const RF_CONFIG_BYTE: u16 = 0x15;

/// Byte offset of the EPC data within the EPC bank (after the PC word)
pub const EPC_DATA_OFFSET: u16 = 2;

/// Lock bit position for the kill password (permalock is one below)
pub const KILL_PW_LOCK_BIT: u8 = 7;
/// Lock bit position for the access password
pub const ACCESS_PW_LOCK_BIT: u8 = 5;
/// Lock bit position for the EPC bank
pub const EPC_LOCK_BIT: u8 = 3;
/// Lock bit position for the user bank
pub const USER_LOCK_BIT: u8 = 1;

/// A single control bit in tag memory
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BitRef {
    /// Bank holding the bit
    pub bank: MemoryBank,
    /// Bank-relative byte address
    pub addr: u16,
    /// Bit index within the byte, 0 = LSB
    pub bit: u8,
}

impl BitRef {
    /// Reference a control bit
    pub const fn new(bank: MemoryBank, addr: u16, bit: u8) -> Self {
        Self { bank, addr, bit }
    }
}

/// Kill bit in the control byte; set kills the tag, cleared revives it
pub const KILL: BitRef = BitRef::new(MemoryBank::Reserved, CONTROL_BYTE, 2);
/// Block 0 permalock / device-id lock bit in the control byte
pub const CONTROL_TOP: BitRef = BitRef::new(MemoryBank::Reserved, CONTROL_BYTE, 7);

/// RF port 1 disable bit (set = disabled)
pub const RF_PORT1_DISABLE: BitRef = BitRef::new(MemoryBank::Reserved, RF_CONFIG_BYTE, 0);
/// RF port 2 disable bit (set = disabled)
pub const RF_PORT2_DISABLE: BitRef = BitRef::new(MemoryBank::Reserved, RF_CONFIG_BYTE, 1);
/// DC-powered RF access enable bit
pub const RF_DCI_ENABLE: BitRef = BitRef::new(MemoryBank::Reserved, RF_CONFIG_BYTE, 2);
/// QT public/private mode bit (set = public)
pub const QT_ENABLE: BitRef = BitRef::new(MemoryBank::Reserved, RF_CONFIG_BYTE, 3);
/// QT short range bit
pub const QT_SHORT_RANGE: BitRef = BitRef::new(MemoryBank::Reserved, RF_CONFIG_BYTE, 4);
/// Block permalock over RF enable bit
pub const RF_BLOCK_PERMALOCK_ENABLE: BitRef = BitRef::new(MemoryBank::Reserved, RF_CONFIG_BYTE, 5);
/// Write wakeup mode enable bit
pub const WRITE_WAKEUP_ENABLE: BitRef = BitRef::new(MemoryBank::Reserved, RF_CONFIG_BYTE, 6);

bitflags! {
    /// Decoded view of the lock byte (Reserved 0x08)
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct LockBits: u8 {
        /// User bank permalock
        const USER_PERMALOCK = 1 << 0;
        /// User bank lock
        const USER_LOCK = 1 << 1;
        /// EPC bank permalock
        const EPC_PERMALOCK = 1 << 2;
        /// EPC bank lock
        const EPC_LOCK = 1 << 3;
        /// Access password permalock
        const ACCESS_PW_PERMALOCK = 1 << 4;
        /// Access password lock
        const ACCESS_PW_LOCK = 1 << 5;
        /// Kill password permalock
        const KILL_PW_PERMALOCK = 1 << 6;
        /// Kill password lock
        const KILL_PW_LOCK = 1 << 7;
    }

    /// Decoded view of the RF configuration byte (Reserved 0x15)
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct RfConfig: u8 {
        /// RF port 1 disabled
        const PORT1_DISABLE = 1 << 0;
        /// RF port 2 disabled
        const PORT2_DISABLE = 1 << 1;
        /// RF access allowed while DC powered
        const DCI_ENABLE = 1 << 2;
        /// Tag in QT public mode
        const QT_ENABLE = 1 << 3;
        /// QT short range active
        const QT_SHORT_RANGE = 1 << 4;
        /// Block permalock over RF allowed
        const BLOCK_PERMALOCK_ENABLE = 1 << 5;
        /// Write wakeup mode active
        const WRITE_WAKEUP_ENABLE = 1 << 6;
    }
}

/// Return `byte` with bit `bit` set
#[inline]
pub const fn set_bit(byte: u8, bit: u8) -> u8 {
    byte | (1 << bit)
}

/// Return `byte` with bit `bit` cleared
#[inline]
pub const fn clear_bit(byte: u8, bit: u8) -> u8 {
    byte & !(1 << bit)
}
