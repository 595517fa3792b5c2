//! Tag session and the named operation surface
//!
//! A [`Session`] owns a transport plus the active (chip model, device
//! address) pair and exposes every tag operation: bank access, EPC and
//! TID handling, lock/permalock control, passwords, kill state, RF
//! configuration and chip detection.
//!
//! Write-class operations return the byte count they moved; `Ok(0)`
//! means the operation backed off (typically bus contention with an RF
//! reader) and wrote nothing. Operations that do not apply to the
//! active model or arguments fail with [`Error::Unsupported`] before
//! touching the bus.

use crate::addressing;
use crate::chip::{ChipModel, DeviceId, MemoryBank, GEN2_CLASS_ID, TID_LEN};
use crate::error::{Error, Result};
use crate::reg::{self, BitRef};
use crate::transport::TagTransport;

/// An open session against one tag chip
///
/// Not re-entrant: a session supports one logical transaction at a
/// time, and callers must serialize access.
pub struct Session<T: TagTransport> {
    transport: T,
    model: ChipModel,
    device_id: DeviceId,
}

impl<T: TagTransport> Session<T> {
    /// Open a session with an explicit model and device address.
    ///
    /// No bus traffic happens here; use [`auto_detect`](Self::auto_detect)
    /// or [`chip_test`](Self::chip_test) to confirm a chip is present.
    pub fn open(transport: T, model: ChipModel, device_id: DeviceId) -> Self {
        Self {
            transport,
            model,
            device_id,
        }
    }

    /// The active chip model
    pub fn model(&self) -> ChipModel {
        self.model
    }

    /// The active device address
    pub fn device_id(&self) -> DeviceId {
        self.device_id
    }

    /// Make a (model, device address) pair active for subsequent calls
    pub fn set_active(&mut self, model: ChipModel, device_id: DeviceId) {
        self.model = model;
        self.device_id = device_id;
    }

    /// Consume the session and return the transport
    pub fn into_transport(self) -> T {
        self.transport
    }

    /// Base address of `bank` on the active model
    pub fn bank_base_address(&self, bank: MemoryBank) -> u16 {
        self.model.base_address(bank)
    }

    /// Size of `bank` on the active model, in bytes
    pub fn bank_size(&self, bank: MemoryBank) -> u16 {
        self.model.bank_size(bank)
    }

    fn bank_addr(&self, bank: MemoryBank, offset: u16, len: usize) -> Result<u16> {
        if offset as usize + len > self.model.bank_size(bank) as usize {
            return Err(Error::AddressOutOfBounds);
        }
        Ok(self.model.base_address(bank) + offset)
    }

    /// Read from a memory bank.
    ///
    /// Returns the byte count actually read, which may be short.
    pub fn read_bank(&mut self, bank: MemoryBank, offset: u16, buf: &mut [u8]) -> Result<usize> {
        let addr = self.bank_addr(bank, offset, buf.len())?;
        addressing::read_chip(&mut self.transport, self.model, self.device_id, addr, buf)
    }

    /// Write to a memory bank.
    ///
    /// Returns the byte count actually written, which may be short.
    pub fn write_bank(&mut self, bank: MemoryBank, offset: u16, data: &[u8]) -> Result<usize> {
        let addr = self.bank_addr(bank, offset, data.len())?;
        addressing::write_chip(&mut self.transport, self.model, self.device_id, addr, data)
    }

    /// Read one byte, flip the named bits, write it back.
    ///
    /// If the preliminary read moves nothing (bus contention with an RF
    /// reader) the byte's state is unknown and nothing is written;
    /// the call returns `Ok(0)`.
    pub fn read_modify_write(
        &mut self,
        bank: MemoryBank,
        addr: u16,
        bits: &[(u8, bool)],
    ) -> Result<usize> {
        let mut byte = [0u8; 1];
        if self.read_bank(bank, addr, &mut byte)? == 0 {
            log::debug!("read-modify-write backed off at {:?}+0x{:02X}", bank, addr);
            return Ok(0);
        }
        for &(bit, value) in bits {
            byte[0] = if value {
                reg::set_bit(byte[0], bit)
            } else {
                reg::clear_bit(byte[0], bit)
            };
        }
        self.write_bank(bank, addr, &byte)
    }

    fn write_bit(&mut self, bit: BitRef, value: bool) -> Result<usize> {
        self.read_modify_write(bit.bank, bit.addr, &[(bit.bit, value)])
    }

    // ---- EPC ------------------------------------------------------------

    /// Write the EPC and adjust the PC word's length field.
    ///
    /// The EPC must be a whole number of 16-bit words. On full success
    /// returns the EPC byte count; if the body write was short the PC
    /// word is left untouched and the short count is returned.
    pub fn set_epc(&mut self, epc: &[u8]) -> Result<usize> {
        if epc.len() % 2 != 0 {
            return Err(Error::Unsupported);
        }
        let capacity = self.bank_size(MemoryBank::Epc) - reg::EPC_DATA_OFFSET;
        if epc.len() > capacity as usize {
            return Err(Error::AddressOutOfBounds);
        }

        let n = self.write_bank(MemoryBank::Epc, reg::EPC_DATA_OFFSET, epc)?;
        if n < epc.len() {
            return Ok(n);
        }

        // Rewrite the length field (upper 5 bits of the first PC byte,
        // in 16-bit words) while preserving the low 3 bits.
        let mut pc = [0u8; 1];
        if self.read_bank(MemoryBank::Epc, 0, &mut pc)? == 0 {
            return Ok(0);
        }
        pc[0] = (pc[0] & 0x07) | (((epc.len() / 2) as u8) << 3);
        if self.write_bank(MemoryBank::Epc, 0, &pc)? == 0 {
            return Ok(0);
        }
        Ok(n)
    }

    /// Read the EPC, sized by the PC word's length field.
    ///
    /// Returns the byte count actually read.
    pub fn read_epc(&mut self, buf: &mut [u8]) -> Result<usize> {
        let mut pc = [0u8; 1];
        if self.read_bank(MemoryBank::Epc, 0, &mut pc)? == 0 {
            return Ok(0);
        }
        let words = (pc[0] >> 3) & 0x1F;
        let len = words as usize * 2;
        if len > buf.len() {
            return Err(Error::BufferTooSmall);
        }
        self.read_bank(MemoryBank::Epc, reg::EPC_DATA_OFFSET, &mut buf[..len])
    }

    // ---- TID ------------------------------------------------------------

    /// Read the 12-byte TID identity block.
    ///
    /// On the 2 KiB model the block is stored split (8 bytes at TID
    /// offset 0x10 followed by 4 bytes at offset 0x00) and is
    /// concatenated in that order.
    pub fn read_tid(&mut self, buf: &mut [u8]) -> Result<usize> {
        if buf.len() < TID_LEN {
            return Err(Error::BufferTooSmall);
        }
        match self.model {
            ChipModel::X2k => {
                let n = self.read_bank(MemoryBank::Tid, 0x10, &mut buf[..8])?;
                if n < 8 {
                    return Ok(n);
                }
                let m = self.read_bank(MemoryBank::Tid, 0x00, &mut buf[8..TID_LEN])?;
                Ok(n + m)
            }
            ChipModel::X8k => self.read_bank(MemoryBank::Tid, 0x00, &mut buf[..TID_LEN]),
        }
    }

    /// Non-destructive liveness check: read the class id from TID
    /// memory and compare against the Gen2 class constant.
    pub fn chip_test(&mut self) -> Result<bool> {
        let mut class = [0u8; 1];
        let offset = self.model.descriptor().class_id_offset;
        let n = self.read_bank(MemoryBank::Tid, offset, &mut class)?;
        Ok(n == 1 && class[0] == GEN2_CLASS_ID)
    }

    /// Probe the four legal device addresses for a chip.
    ///
    /// Each address is tried as the 2 KiB model first, then as the
    /// 8 KiB model, in fixed address order. The first pair that passes
    /// [`chip_test`](Self::chip_test) stays active and is returned.
    pub fn auto_detect(&mut self) -> Result<(ChipModel, DeviceId)> {
        for id in DeviceId::ALL {
            for model in ChipModel::ALL {
                self.set_active(model, id);
                if self.chip_test()? {
                    log::info!("detected {} tag chip at {}", model, id);
                    return Ok((model, id));
                }
            }
        }
        Err(Error::ChipNotFound)
    }

    /// Read the 12-bit tag model number from TID memory
    pub fn read_model_number(&mut self) -> Result<u16> {
        let mut raw = [0u8; 2];
        let offset = self.model.descriptor().model_number_offset;
        if self.read_bank(MemoryBank::Tid, offset, &mut raw)? < 2 {
            return Err(Error::ShortTransfer);
        }
        Ok(u16::from_be_bytes(raw) & 0x0FFF)
    }

    // ---- Locks and passwords -------------------------------------------

    /// Set the lock bit named by `upper_bit`; with `perm` also set the
    /// permalock bit directly below it.
    fn lock(&mut self, upper_bit: u8, perm: bool) -> Result<usize> {
        self.read_modify_write(
            MemoryBank::Reserved,
            reg::LOCK_BYTE,
            &[(upper_bit, true), (upper_bit - 1, perm)],
        )
    }

    /// Clear the lock bit named by `upper_bit`; with `perm` set the
    /// perma-unlock bit instead.
    fn unlock(&mut self, upper_bit: u8, perm: bool) -> Result<usize> {
        self.read_modify_write(
            MemoryBank::Reserved,
            reg::LOCK_BYTE,
            &[(upper_bit, false), (upper_bit - 1, perm)],
        )
    }

    /// Lock the kill password
    pub fn lock_kill_password(&mut self, perm: bool) -> Result<usize> {
        self.lock(reg::KILL_PW_LOCK_BIT, perm)
    }

    /// Unlock the kill password
    pub fn unlock_kill_password(&mut self, perm: bool) -> Result<usize> {
        self.unlock(reg::KILL_PW_LOCK_BIT, perm)
    }

    /// Lock the access password
    pub fn lock_access_password(&mut self, perm: bool) -> Result<usize> {
        self.lock(reg::ACCESS_PW_LOCK_BIT, perm)
    }

    /// Unlock the access password
    pub fn unlock_access_password(&mut self, perm: bool) -> Result<usize> {
        self.unlock(reg::ACCESS_PW_LOCK_BIT, perm)
    }

    /// Lock the EPC bank
    pub fn lock_epc(&mut self, perm: bool) -> Result<usize> {
        self.lock(reg::EPC_LOCK_BIT, perm)
    }

    /// Unlock the EPC bank
    pub fn unlock_epc(&mut self, perm: bool) -> Result<usize> {
        self.unlock(reg::EPC_LOCK_BIT, perm)
    }

    /// Lock the user bank
    pub fn lock_user(&mut self, perm: bool) -> Result<usize> {
        self.lock(reg::USER_LOCK_BIT, perm)
    }

    /// Unlock the user bank
    pub fn unlock_user(&mut self, perm: bool) -> Result<usize> {
        self.unlock(reg::USER_LOCK_BIT, perm)
    }

    /// Store the access password (big-endian)
    pub fn set_access_password(&mut self, password: u32) -> Result<usize> {
        self.write_bank(
            MemoryBank::Reserved,
            reg::ACCESS_PW_ADDR,
            &password.to_be_bytes(),
        )
    }

    /// Store the kill password (big-endian)
    pub fn set_kill_password(&mut self, password: u32) -> Result<usize> {
        self.write_bank(
            MemoryBank::Reserved,
            reg::KILL_PW_ADDR,
            &password.to_be_bytes(),
        )
    }

    // ---- Block permalock -----------------------------------------------

    /// Permalock one block of user memory.
    ///
    /// Permanent for every block except block 0. The 2 KiB model has
    /// blocks 0-4; the 8 KiB model has blocks 0-15 spread over two
    /// status bytes. Out-of-range blocks are unsupported.
    pub fn block_permalock(&mut self, block: u8) -> Result<usize> {
        let bit = match self.model {
            ChipModel::X2k => {
                if block > 4 {
                    return Err(Error::Unsupported);
                }
                BitRef::new(MemoryBank::Reserved, reg::CONTROL_BYTE, 7 - block)
            }
            ChipModel::X8k => {
                if block < 8 {
                    BitRef::new(MemoryBank::Reserved, reg::BLOCK_PERMALOCK_LO, 7 - block)
                } else if block < 16 {
                    BitRef::new(
                        MemoryBank::Reserved,
                        reg::BLOCK_PERMALOCK_HI,
                        7 - (block - 8),
                    )
                } else {
                    return Err(Error::Unsupported);
                }
            }
        };
        self.write_bit(bit, true)
    }

    /// Unlock block 0 of user memory; no other block can be unlocked.
    pub fn block_unlock(&mut self, block: u8) -> Result<usize> {
        if block != 0 {
            return Err(Error::Unsupported);
        }
        let addr = match self.model {
            ChipModel::X2k => reg::CONTROL_BYTE,
            ChipModel::X8k => reg::BLOCK_PERMALOCK_LO,
        };
        self.write_bit(BitRef::new(MemoryBank::Reserved, addr, 7), false)
    }

    // ---- Device id -----------------------------------------------------

    /// Program a new I2C device address into the chip and make it the
    /// session's active address for subsequent calls.
    pub fn set_i2c_device_id(&mut self, id: DeviceId) -> Result<usize> {
        let selector = id.selector();
        let n = self.read_modify_write(
            MemoryBank::Reserved,
            reg::CONTROL_BYTE,
            &[(1, selector & 0b10 != 0), (0, selector & 0b01 != 0)],
        )?;
        self.device_id = id;
        Ok(n)
    }

    /// Permanently lock the I2C device address. Only the 8 KiB model
    /// supports this.
    pub fn lock_i2c_device_id(&mut self) -> Result<usize> {
        match self.model {
            ChipModel::X8k => self.write_bit(reg::CONTROL_TOP, true),
            ChipModel::X2k => Err(Error::Unsupported),
        }
    }

    // ---- Kill state and RF configuration -------------------------------

    /// Kill the tag. Reversible over the wired interface only.
    pub fn kill_tag(&mut self) -> Result<usize> {
        self.write_bit(reg::KILL, true)
    }

    /// Revive a killed tag.
    pub fn unkill_tag(&mut self) -> Result<usize> {
        self.write_bit(reg::KILL, false)
    }

    /// Allow RF access while DC power is applied
    pub fn enable_rf_dci(&mut self) -> Result<usize> {
        self.write_bit(reg::RF_DCI_ENABLE, true)
    }

    /// Deny RF access while DC power is applied
    pub fn disable_rf_dci(&mut self) -> Result<usize> {
        self.write_bit(reg::RF_DCI_ENABLE, false)
    }

    /// Enable RF port 1 (clears its disable bit)
    pub fn enable_rf_port1(&mut self) -> Result<usize> {
        self.write_bit(reg::RF_PORT1_DISABLE, false)
    }

    /// Disable RF port 1
    pub fn disable_rf_port1(&mut self) -> Result<usize> {
        self.write_bit(reg::RF_PORT1_DISABLE, true)
    }

    /// Enable RF port 2 (clears its disable bit)
    pub fn enable_rf_port2(&mut self) -> Result<usize> {
        self.write_bit(reg::RF_PORT2_DISABLE, false)
    }

    /// Disable RF port 2
    pub fn disable_rf_port2(&mut self) -> Result<usize> {
        self.write_bit(reg::RF_PORT2_DISABLE, true)
    }

    /// Put the tag into QT public mode
    pub fn enable_qt(&mut self) -> Result<usize> {
        self.write_bit(reg::QT_ENABLE, true)
    }

    /// Put the tag into QT private mode
    pub fn disable_qt(&mut self) -> Result<usize> {
        self.write_bit(reg::QT_ENABLE, false)
    }

    /// Enable QT short range
    pub fn enable_qt_short_range(&mut self) -> Result<usize> {
        self.write_bit(reg::QT_SHORT_RANGE, true)
    }

    /// Disable QT short range
    pub fn disable_qt_short_range(&mut self) -> Result<usize> {
        self.write_bit(reg::QT_SHORT_RANGE, false)
    }

    /// Allow block permalocking over RF
    pub fn enable_rf_block_permalock(&mut self) -> Result<usize> {
        self.write_bit(reg::RF_BLOCK_PERMALOCK_ENABLE, true)
    }

    /// Deny block permalocking over RF
    pub fn disable_rf_block_permalock(&mut self) -> Result<usize> {
        self.write_bit(reg::RF_BLOCK_PERMALOCK_ENABLE, false)
    }

    /// Enable write wakeup mode
    pub fn enable_write_wakeup(&mut self) -> Result<usize> {
        self.write_bit(reg::WRITE_WAKEUP_ENABLE, true)
    }

    /// Disable write wakeup mode
    pub fn disable_write_wakeup(&mut self) -> Result<usize> {
        self.write_bit(reg::WRITE_WAKEUP_ENABLE, false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::{Addressing, TagTransport};

    /// Flat in-memory 8 KiB-model chip. Reads can be made to fail for
    /// a number of calls to simulate RF-side bus contention.
    struct FlatChip {
        image: [u8; 0x440],
        fail_reads: usize,
        writes: usize,
    }

    impl FlatChip {
        fn new() -> Self {
            let mut image = [0u8; 0x440];
            // TID identity: class id, model number 0x150.
            let tid = ChipModel::X8k.base_address(MemoryBank::Tid) as usize;
            image[tid] = GEN2_CLASS_ID;
            image[tid + 2] = 0x01;
            image[tid + 3] = 0x50;
            Self {
                image,
                fail_reads: 0,
                writes: 0,
            }
        }

        fn session(self) -> Session<FlatChip> {
            Session::open(self, ChipModel::X8k, DeviceId::DEFAULT)
        }
    }

    impl TagTransport for FlatChip {
        fn max_read_len(&self) -> usize {
            0x20
        }

        fn read(&mut self, addressing: Addressing, buf: &mut [u8]) -> Result<usize> {
            if self.fail_reads > 0 {
                self.fail_reads -= 1;
                return Ok(0);
            }
            let at = addressing.addr as usize;
            buf.copy_from_slice(&self.image[at..at + buf.len()]);
            Ok(buf.len())
        }

        fn write(&mut self, addressing: Addressing, words: &[u8]) -> Result<usize> {
            assert_eq!(words.len() % 2, 0);
            self.writes += 1;
            let at = addressing.addr as usize;
            self.image[at..at + words.len()].copy_from_slice(words);
            Ok(words.len())
        }
    }

    fn reserved_byte(s: &Session<FlatChip>, addr: u16) -> u8 {
        s.transport.image[addr as usize]
    }

    #[test]
    fn epc_round_trip_updates_length_field() {
        let mut s = FlatChip::new().session();
        // Preexisting low PC bits must survive.
        let epc_base = ChipModel::X8k.base_address(MemoryBank::Epc) as usize;
        s.transport.image[epc_base] = 0x05;

        let epc = [0x30, 0x08, 0x33, 0xB2, 0xDD, 0xD9, 0x01, 0x40];
        assert_eq!(s.set_epc(&epc).unwrap(), epc.len());

        let pc = s.transport.image[epc_base];
        assert_eq!(pc >> 3, (epc.len() / 2) as u8);
        assert_eq!(pc & 0x07, 0x05);

        let mut back = [0u8; 16];
        let n = s.read_epc(&mut back).unwrap();
        assert_eq!(&back[..n], &epc);
    }

    #[test]
    fn odd_epc_length_writes_nothing() {
        let mut s = FlatChip::new().session();
        assert_eq!(s.set_epc(&[1, 2, 3]), Err(Error::Unsupported));
        assert_eq!(s.transport.writes, 0);
    }

    #[test]
    fn oversized_epc_is_rejected() {
        let mut s = FlatChip::new().session();
        assert_eq!(s.set_epc(&[0u8; 18]), Err(Error::AddressOutOfBounds));
        assert_eq!(s.transport.writes, 0);
    }

    #[test]
    fn read_epc_needs_room_for_stored_length() {
        let mut s = FlatChip::new().session();
        s.set_epc(&[0xAB; 12]).unwrap();
        let mut small = [0u8; 8];
        assert_eq!(s.read_epc(&mut small), Err(Error::BufferTooSmall));
    }

    #[test]
    fn bank_access_is_bounds_checked() {
        let mut s = FlatChip::new().session();
        let mut buf = [0u8; 8];
        assert_eq!(
            s.read_bank(MemoryBank::Tid, 20, &mut buf),
            Err(Error::AddressOutOfBounds)
        );
        assert_eq!(
            s.write_bank(MemoryBank::Reserved, 20, &buf),
            Err(Error::AddressOutOfBounds)
        );
        assert_eq!(s.transport.writes, 0);
    }

    #[test]
    fn contended_read_modify_write_backs_off() {
        let mut s = FlatChip::new().session();
        s.transport.fail_reads = 1;
        assert_eq!(s.kill_tag().unwrap(), 0);
        assert_eq!(s.transport.writes, 0);
        assert_eq!(reserved_byte(&s, reg::CONTROL_BYTE), 0);
    }

    #[test]
    fn lock_semantics() {
        let mut s = FlatChip::new().session();

        s.lock_epc(false).unwrap();
        assert_eq!(reserved_byte(&s, reg::LOCK_BYTE), 1 << reg::EPC_LOCK_BIT);

        s.lock_epc(true).unwrap();
        assert_eq!(
            reserved_byte(&s, reg::LOCK_BYTE),
            (1 << reg::EPC_LOCK_BIT) | (1 << (reg::EPC_LOCK_BIT - 1))
        );

        s.unlock_epc(false).unwrap();
        assert_eq!(
            reserved_byte(&s, reg::LOCK_BYTE) & (1 << reg::EPC_LOCK_BIT),
            0
        );

        s.unlock_kill_password(true).unwrap();
        assert_eq!(
            reserved_byte(&s, reg::LOCK_BYTE) & (1 << (reg::KILL_PW_LOCK_BIT - 1)),
            1 << (reg::KILL_PW_LOCK_BIT - 1)
        );
    }

    #[test]
    fn kill_and_unkill_toggle_one_bit() {
        let mut s = FlatChip::new().session();
        s.kill_tag().unwrap();
        assert_eq!(reserved_byte(&s, reg::CONTROL_BYTE), 1 << 2);
        s.unkill_tag().unwrap();
        assert_eq!(reserved_byte(&s, reg::CONTROL_BYTE), 0);
    }

    #[test]
    fn rf_port_enable_clears_disable_bit() {
        let mut s = FlatChip::new().session();
        s.disable_rf_port1().unwrap();
        s.disable_rf_port2().unwrap();
        assert_eq!(reserved_byte(&s, reg::RF_CONFIG_BYTE), 0b11);
        s.enable_rf_port1().unwrap();
        assert_eq!(reserved_byte(&s, reg::RF_CONFIG_BYTE), 0b10);
    }

    #[test]
    fn passwords_are_big_endian() {
        let mut s = FlatChip::new().session();
        s.set_access_password(0x1122_3344).unwrap();
        s.set_kill_password(0xAABB_CCDD).unwrap();
        assert_eq!(
            &s.transport.image[reg::ACCESS_PW_ADDR as usize..][..4],
            &[0x11, 0x22, 0x33, 0x44]
        );
        assert_eq!(
            &s.transport.image[reg::KILL_PW_ADDR as usize..][..4],
            &[0xAA, 0xBB, 0xCC, 0xDD]
        );
    }

    #[test]
    fn block_permalock_large_model_bit_map() {
        let mut s = FlatChip::new().session();
        s.block_permalock(0).unwrap();
        s.block_permalock(7).unwrap();
        assert_eq!(reserved_byte(&s, reg::BLOCK_PERMALOCK_LO), 0b1000_0001);
        s.block_permalock(8).unwrap();
        s.block_permalock(15).unwrap();
        assert_eq!(reserved_byte(&s, reg::BLOCK_PERMALOCK_HI), 0b1000_0001);
        assert_eq!(s.block_permalock(16), Err(Error::Unsupported));
    }

    #[test]
    fn block_unlock_only_block_zero() {
        let mut s = FlatChip::new().session();
        s.block_permalock(0).unwrap();
        s.block_unlock(0).unwrap();
        assert_eq!(reserved_byte(&s, reg::BLOCK_PERMALOCK_LO), 0);
        assert_eq!(s.block_unlock(1), Err(Error::Unsupported));
    }

    #[test]
    fn set_device_id_reprograms_selector_and_session() {
        let mut s = FlatChip::new().session();
        let target = DeviceId::ALL[1]; // 0x6A
        assert_eq!(s.set_i2c_device_id(target).unwrap(), 1);
        assert_eq!(reserved_byte(&s, reg::CONTROL_BYTE) & 0b11, 0b01);
        assert_eq!(s.device_id(), target);
    }

    #[test]
    fn lock_device_id_unsupported_on_2k() {
        let mut s = FlatChip::new().session();
        s.set_active(ChipModel::X2k, DeviceId::DEFAULT);
        assert_eq!(s.lock_i2c_device_id(), Err(Error::Unsupported));
    }

    #[test]
    fn model_number_masks_to_12_bits() {
        let mut s = FlatChip::new().session();
        let tid = ChipModel::X8k.base_address(MemoryBank::Tid) as usize;
        s.transport.image[tid + 2] = 0xF1;
        s.transport.image[tid + 3] = 0x50;
        assert_eq!(s.read_model_number().unwrap(), 0x150);
    }

    #[test]
    fn tid_requires_twelve_byte_buffer() {
        let mut s = FlatChip::new().session();
        let mut small = [0u8; 11];
        assert_eq!(s.read_tid(&mut small), Err(Error::BufferTooSmall));
        let mut full = [0u8; 12];
        assert_eq!(s.read_tid(&mut full).unwrap(), 12);
        assert_eq!(full[0], GEN2_CLASS_ID);
    }

    #[test]
    fn chip_test_detects_class_id() {
        let mut s = FlatChip::new().session();
        assert!(s.chip_test().unwrap());
        let tid = ChipModel::X8k.base_address(MemoryBank::Tid) as usize;
        s.transport.image[tid] = 0x00;
        assert!(!s.chip_test().unwrap());
    }
}
