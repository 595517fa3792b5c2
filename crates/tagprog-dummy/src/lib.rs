//! tagprog-dummy - In-memory tag chip emulator for testing
//!
//! This crate provides a dummy transport that emulates a tag chip in
//! memory. It's useful for testing and development without real
//! hardware: the emulated chip answers at one configurable device
//! address (plus the odd neighbor for the 2 KiB model's upper memory
//! half), carries a plausible TID identity block, and can inject
//! contention faults that show up as short transfers.

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(feature = "alloc")]
extern crate alloc;

#[cfg(feature = "alloc")]
use alloc::vec;
#[cfg(feature = "alloc")]
use alloc::vec::Vec;

use tagprog_core::chip::GEN2_CLASS_ID;
use tagprog_core::transport::{AddrWidth, Addressing};
use tagprog_core::{ChipModel, DeviceId, Error, MemoryBank, Result, TagTransport};

/// Configuration for the dummy tag chip
#[derive(Debug, Clone)]
pub struct DummyConfig {
    /// Chip capacity variant to emulate
    pub model: ChipModel,
    /// Bus address the chip answers at
    pub device_id: DeviceId,
}

impl Default for DummyConfig {
    fn default() -> Self {
        Self {
            model: ChipModel::X8k,
            device_id: DeviceId::DEFAULT,
        }
    }
}

/// Dummy tag chip
///
/// Emulates one tag chip's wired interface in memory. Transactions
/// addressed anywhere the chip does not answer return a zero count,
/// the same way a NACKed bus address does.
#[cfg(feature = "alloc")]
pub struct DummyTag {
    config: DummyConfig,
    image: Vec<u8>,
    /// Number of upcoming reads to fail with a zero count
    fail_reads: usize,
    /// Fail every write after this many have succeeded
    fail_writes_after: Option<usize>,
    writes_done: usize,
}

#[cfg(feature = "alloc")]
impl DummyTag {
    /// Create a new dummy tag with the given configuration.
    ///
    /// TID memory is populated with the Gen2 class id and the model
    /// number matching the configured variant; everything else is zero.
    pub fn new(config: DummyConfig) -> Self {
        let size = match config.model {
            ChipModel::X2k => 0x150,
            ChipModel::X8k => 0x440,
        };
        let mut image = vec![0u8; size];

        let desc = config.model.descriptor();
        let tid = config.model.base_address(MemoryBank::Tid) as usize;
        image[tid + desc.class_id_offset as usize] = GEN2_CLASS_ID;
        let number = config.model.model_number().to_be_bytes();
        image[tid + desc.model_number_offset as usize] = number[0];
        image[tid + desc.model_number_offset as usize + 1] = number[1];

        Self {
            config,
            image,
            fail_reads: 0,
            fail_writes_after: None,
            writes_done: 0,
        }
    }

    /// Create a new dummy tag with the default configuration (8 KiB
    /// variant at the factory default address)
    pub fn new_default() -> Self {
        Self::new(DummyConfig::default())
    }

    /// Get a reference to the chip image
    pub fn image(&self) -> &[u8] {
        &self.image
    }

    /// Get a mutable reference to the chip image
    pub fn image_mut(&mut self) -> &mut [u8] {
        &mut self.image
    }

    /// Get the configuration
    pub fn config(&self) -> &DummyConfig {
        &self.config
    }

    /// Fail the next `n` reads with a zero count, as if an RF reader
    /// held the tag for the duration
    pub fn fail_next_reads(&mut self, n: usize) {
        self.fail_reads = n;
    }

    /// Fail every write after `n` more have succeeded
    pub fn fail_writes_after(&mut self, n: usize) {
        self.fail_writes_after = Some(self.writes_done + n);
    }

    /// Map a wire address onto the image, or `None` where the chip
    /// does not answer.
    ///
    /// The 2 KiB variant answers single-byte-address transactions at
    /// its own address and its odd neighbor, which selects the upper
    /// memory half. The 8 KiB variant answers two-byte-address
    /// transactions at its own address only.
    fn resolve(&self, addressing: Addressing) -> Option<usize> {
        let own = self.config.device_id.value();
        match self.config.model {
            ChipModel::X2k => {
                if addressing.width != AddrWidth::One {
                    return None;
                }
                let half = match addressing.device_id {
                    id if id == own => 0usize,
                    id if id == own + 1 => 0x100,
                    _ => return None,
                };
                Some(half | (addressing.addr as usize & 0xFF))
            }
            ChipModel::X8k => {
                if addressing.width != AddrWidth::Two || addressing.device_id != own {
                    return None;
                }
                Some(addressing.addr as usize)
            }
        }
    }
}

#[cfg(feature = "alloc")]
impl TagTransport for DummyTag {
    fn max_read_len(&self) -> usize {
        0x20
    }

    fn read(&mut self, addressing: Addressing, buf: &mut [u8]) -> Result<usize> {
        if self.fail_reads > 0 {
            self.fail_reads -= 1;
            log::trace!("dummy: injected short read at 0x{:04X}", addressing.addr);
            return Ok(0);
        }
        let at = match self.resolve(addressing) {
            Some(at) if at + buf.len() <= self.image.len() => at,
            _ => return Ok(0),
        };
        buf.copy_from_slice(&self.image[at..at + buf.len()]);
        Ok(buf.len())
    }

    fn write(&mut self, addressing: Addressing, words: &[u8]) -> Result<usize> {
        if words.len() % 2 != 0 {
            return Err(Error::InvalidAlignment);
        }
        if let Some(limit) = self.fail_writes_after {
            if self.writes_done >= limit {
                log::trace!("dummy: injected short write at 0x{:04X}", addressing.addr);
                return Ok(0);
            }
        }
        let at = match self.resolve(addressing) {
            Some(at) if at + words.len() <= self.image.len() => at,
            _ => return Ok(0),
        };
        self.image[at..at + words.len()].copy_from_slice(words);
        self.writes_done += 1;
        Ok(words.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tagprog_core::reg;
    use tagprog_core::{Error, Session};

    fn session_2k() -> Session<DummyTag> {
        let tag = DummyTag::new(DummyConfig {
            model: ChipModel::X2k,
            device_id: DeviceId::new(0x68).unwrap(),
        });
        Session::open(tag, ChipModel::X2k, DeviceId::new(0x68).unwrap())
    }

    #[test]
    fn wrong_device_id_reads_nothing() {
        let mut tag = DummyTag::new_default();
        let mut buf = [0u8; 4];
        let addressing = Addressing {
            device_id: 0x68,
            addr: 0x28,
            width: AddrWidth::Two,
        };
        assert_eq!(tag.read(addressing, &mut buf).unwrap(), 0);
    }

    #[test]
    fn chip_test_and_model_number() {
        let mut s = Session::open(DummyTag::new_default(), ChipModel::X8k, DeviceId::DEFAULT);
        assert!(s.chip_test().unwrap());
        assert_eq!(s.read_model_number().unwrap(), 0x150);

        let mut s = session_2k();
        assert!(s.chip_test().unwrap());
        assert_eq!(s.read_model_number().unwrap(), 0x140);
    }

    #[test]
    fn auto_detect_finds_the_only_chip() {
        let tag = DummyTag::new(DummyConfig {
            model: ChipModel::X8k,
            device_id: DeviceId::new(0x6A).unwrap(),
        });
        // Start from a deliberately wrong pair.
        let mut s = Session::open(tag, ChipModel::X2k, DeviceId::DEFAULT);
        let (model, id) = s.auto_detect().unwrap();
        assert_eq!(model, ChipModel::X8k);
        assert_eq!(id, DeviceId::new(0x6A).unwrap());
        assert_eq!((s.model(), s.device_id()), (model, id));
    }

    #[test]
    fn auto_detect_empty_bus() {
        let mut tag = DummyTag::new_default();
        // Blank the class id so nothing answers the probe.
        let tid = ChipModel::X8k.base_address(MemoryBank::Tid) as usize;
        tag.image_mut()[tid] = 0x00;
        let mut s = Session::open(tag, ChipModel::X8k, DeviceId::DEFAULT);
        assert_eq!(s.auto_detect(), Err(Error::ChipNotFound));
    }

    #[test]
    fn epc_round_trip_through_emulated_chip() {
        let mut s = Session::open(DummyTag::new_default(), ChipModel::X8k, DeviceId::DEFAULT);
        let epc = [0x30, 0x08, 0x33, 0xB2, 0xDD, 0xD9, 0x01, 0x40, 0x35, 0x05];
        assert_eq!(s.set_epc(&epc).unwrap(), epc.len());
        let mut back = [0u8; 16];
        let n = s.read_epc(&mut back).unwrap();
        assert_eq!(&back[..n], &epc);
    }

    #[test]
    fn tid_concatenation_on_small_model() {
        let mut s = session_2k();
        let mut tid = [0u8; 12];
        assert_eq!(s.read_tid(&mut tid).unwrap(), 12);
        // Class id leads even though it sits at TID offset 0x10 on chip.
        assert_eq!(tid[0], GEN2_CLASS_ID);
        assert_eq!(u16::from_be_bytes([tid[2], tid[3]]) & 0x0FFF, 0x140);
    }

    #[test]
    fn user_bank_crosses_the_split_boundary() {
        // User offset 0xD0 puts absolute address 0xF8 + 16 across 0xFF.
        let mut s = session_2k();
        let data: [u8; 16] = core::array::from_fn(|i| i as u8 ^ 0xA5);
        assert_eq!(s.write_bank(MemoryBank::User, 0xD0, &data).unwrap(), 16);
        let mut back = [0u8; 16];
        assert_eq!(s.read_bank(MemoryBank::User, 0xD0, &mut back).unwrap(), 16);
        assert_eq!(back, data);
    }

    #[test]
    fn failed_second_half_leaves_session_id_unchanged() {
        // Two word writes straddle the boundary; fail the second.
        let mut tag = DummyTag::new(DummyConfig {
            model: ChipModel::X2k,
            device_id: DeviceId::new(0x68).unwrap(),
        });
        tag.fail_writes_after(1);
        let mut s = Session::open(tag, ChipModel::X2k, DeviceId::new(0x68).unwrap());
        let n = s.write_bank(MemoryBank::User, 0xD6, &[1, 2, 3, 4]).unwrap();
        assert_eq!(n, 2);
        assert_eq!(s.device_id(), DeviceId::new(0x68).unwrap());
    }

    #[test]
    fn odd_length_write_is_rejected() {
        let mut tag = DummyTag::new_default();
        let addressing = Addressing {
            device_id: 0x6E,
            addr: 0x40,
            width: AddrWidth::Two,
        };
        assert_eq!(
            tag.write(addressing, &[1, 2, 3]),
            Err(Error::InvalidAlignment)
        );
    }

    #[test]
    fn contended_lock_leaves_lock_byte_alone() {
        let mut s = Session::open(DummyTag::new_default(), ChipModel::X8k, DeviceId::DEFAULT);
        s.lock_epc(false).unwrap();
        let locked = s.into_transport().image()[reg::LOCK_BYTE as usize];

        let mut tag = DummyTag::new_default();
        tag.image_mut()[reg::LOCK_BYTE as usize] = locked;
        tag.fail_next_reads(1);
        let mut s = Session::open(tag, ChipModel::X8k, DeviceId::DEFAULT);
        assert_eq!(s.unlock_epc(false).unwrap(), 0);
        assert_eq!(s.into_transport().image()[reg::LOCK_BYTE as usize], locked);
    }

    #[test]
    fn block_permalock_range_per_model() {
        let mut s = session_2k();
        s.block_permalock(4).unwrap();
        assert_eq!(s.block_permalock(5), Err(Error::Unsupported));
        let tag = s.into_transport();
        assert_eq!(tag.image()[reg::CONTROL_BYTE as usize] & (1 << 3), 1 << 3);
    }

    #[test]
    fn reprogrammed_device_id_moves_the_chip() {
        let mut s = Session::open(DummyTag::new_default(), ChipModel::X8k, DeviceId::DEFAULT);
        let target = DeviceId::new(0x68).unwrap();
        assert_eq!(s.set_i2c_device_id(target).unwrap(), 1);
        assert_eq!(s.device_id(), target);
        // The emulated chip still listens at its configured address, so
        // move it too before talking again.
        let mut tag = s.into_transport();
        assert_eq!(
            tag.image()[reg::CONTROL_BYTE as usize] & 0b11,
            target.selector()
        );
        tag.config.device_id = target;
        let mut s = Session::open(tag, ChipModel::X8k, target);
        assert!(s.chip_test().unwrap());
    }
}
