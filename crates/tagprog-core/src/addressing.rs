//! Addressing and chunking adapter
//!
//! Sits between the command layer and the raw transport. The command
//! layer thinks in byte-addressable banks; the wire accepts only
//! word-granular writes and, on the 2 KiB model, only 8-bit addresses
//! with the ninth address bit encoded in the device address. This
//! module resolves both quirks:
//!
//! - requests into the upper half of the 2 KiB address space are
//!   rebased onto the odd neighbor of the active device address, and
//!   requests crossing the 0xFF boundary are split in two,
//! - writes are carried out one 16-bit word at a time, with unaligned
//!   head/tail bytes merged against a read-back of their partner byte.
//!
//! Every step is verified before the next one is attempted; a short
//! step ends the operation with the byte count completed so far.

use crate::chip::{ChipModel, DeviceId};
use crate::error::Result;
use crate::transport::{Addressing, TagTransport};

/// Highest wire address reachable without switching device ids on the
/// 2 KiB model.
const SPLIT_BOUNDARY: u16 = 0xFF;

/// One transport transaction produced by span resolution
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Span {
    device_id: u8,
    addr: u16,
    /// Offset of this span's bytes within the caller's buffer
    offset: usize,
    len: usize,
}

/// Resolve an absolute chip address range into at most two wire spans.
///
/// The second span exists only when a 2 KiB-model request crosses the
/// 0xFF boundary; it targets the odd neighbor device address.
fn wire_spans(model: ChipModel, id: DeviceId, addr: u16, len: usize) -> ([Span; 2], usize) {
    let base = id.value();
    let empty = Span {
        device_id: base,
        addr: 0,
        offset: 0,
        len: 0,
    };

    if !model.descriptor().split_address_space {
        return (
            [
                Span {
                    device_id: base,
                    addr,
                    offset: 0,
                    len,
                },
                empty,
            ],
            1,
        );
    }

    if addr > SPLIT_BOUNDARY {
        // Entirely in the upper half: rebase onto the neighbor id.
        return (
            [
                Span {
                    device_id: base + 1,
                    addr: addr - (SPLIT_BOUNDARY + 1),
                    offset: 0,
                    len,
                },
                empty,
            ],
            1,
        );
    }

    let last = addr as usize + len.saturating_sub(1);
    if last > SPLIT_BOUNDARY as usize {
        // Crosses the boundary: split so neither half wraps.
        let first = (SPLIT_BOUNDARY - addr + 1) as usize;
        return (
            [
                Span {
                    device_id: base,
                    addr,
                    offset: 0,
                    len: first,
                },
                Span {
                    device_id: base + 1,
                    addr: 0,
                    offset: first,
                    len: len - first,
                },
            ],
            2,
        );
    }

    (
        [
            Span {
                device_id: base,
                addr,
                offset: 0,
                len,
            },
            empty,
        ],
        1,
    )
}

/// Read bytes from an absolute chip address.
///
/// Returns the byte count actually read; a short first half of a split
/// request ends the read without touching the second half.
pub(crate) fn read_chip<T: TagTransport + ?Sized>(
    transport: &mut T,
    model: ChipModel,
    id: DeviceId,
    addr: u16,
    buf: &mut [u8],
) -> Result<usize> {
    if buf.is_empty() {
        return Ok(0);
    }

    let width = model.addr_width();
    let (spans, count) = wire_spans(model, id, addr, buf.len());
    let mut done = 0;
    for span in &spans[..count] {
        let addressing = Addressing {
            device_id: span.device_id,
            addr: span.addr,
            width,
        };
        let got = transport.read(addressing, &mut buf[span.offset..span.offset + span.len])?;
        done += got;
        if got < span.len {
            log::debug!(
                "short read at 0x{:04X}: {} of {} bytes",
                addr,
                done,
                buf.len()
            );
            return Ok(done);
        }
    }
    Ok(done)
}

/// Write whole words at an even absolute chip address.
fn write_words<T: TagTransport + ?Sized>(
    transport: &mut T,
    model: ChipModel,
    id: DeviceId,
    addr: u16,
    words: &[u8],
) -> Result<usize> {
    let width = model.addr_width();
    let (spans, count) = wire_spans(model, id, addr, words.len());
    let mut done = 0;
    for span in &spans[..count] {
        let addressing = Addressing {
            device_id: span.device_id,
            addr: span.addr,
            width,
        };
        let put = transport.write(addressing, &words[span.offset..span.offset + span.len])?;
        done += put;
        if put < span.len {
            return Ok(done);
        }
    }
    Ok(done)
}

/// Write bytes to an absolute chip address, honoring word granularity.
///
/// An odd start address merges the first data byte with a read-back of
/// the byte before it; an odd trailing byte merges with a read-back of
/// the byte after it. Returns the number of *payload* bytes committed;
/// partner bytes fetched for merging are not counted.
pub(crate) fn write_chip<T: TagTransport + ?Sized>(
    transport: &mut T,
    model: ChipModel,
    id: DeviceId,
    addr: u16,
    data: &[u8],
) -> Result<usize> {
    if data.is_empty() {
        return Ok(0);
    }

    let mut addr = addr;
    let mut data = data;
    let mut done = 0;

    if addr % 2 == 1 {
        // Unaligned head: pair the first byte with its predecessor.
        let mut word = [0u8; 2];
        let got = read_chip(transport, model, id, addr - 1, &mut word[..1])?;
        if got < 1 {
            return Ok(done);
        }
        word[1] = data[0];
        if write_words(transport, model, id, addr - 1, &word)? < 2 {
            return Ok(done);
        }
        done += 1;
        addr += 1;
        data = &data[1..];
    }

    while data.len() > 1 {
        if write_words(transport, model, id, addr, &data[..2])? < 2 {
            return Ok(done);
        }
        done += 2;
        addr += 2;
        data = &data[2..];
    }

    if !data.is_empty() {
        // Unaligned tail: pair the last byte with its successor.
        let mut word = [data[0], 0];
        let got = read_chip(transport, model, id, addr + 1, &mut word[1..])?;
        if got < 1 {
            return Ok(done);
        }
        if write_words(transport, model, id, addr, &word)? < 2 {
            return Ok(done);
        }
        done += 1;
    }

    Ok(done)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Result;
    use crate::transport::{Addressing, TagTransport};
    use std::vec::Vec;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Dir {
        Read,
        Write,
    }

    /// Transport backed by a flat image, keyed by the 2 KiB model's
    /// (device id low bit, 8-bit address) scheme. Records every
    /// transaction and can fail the nth write.
    struct SplitSpace {
        image: [u8; 0x200],
        log: Vec<(Dir, u8, u16, usize)>,
        writes_seen: usize,
        fail_write: Option<usize>,
    }

    impl SplitSpace {
        fn new() -> Self {
            Self {
                image: [0; 0x200],
                log: Vec::new(),
                writes_seen: 0,
                fail_write: None,
            }
        }

        fn absolute(addressing: Addressing) -> usize {
            let hi = (addressing.device_id & 1) as usize;
            (hi << 8) | (addressing.addr as usize & 0xFF)
        }
    }

    impl TagTransport for SplitSpace {
        fn max_read_len(&self) -> usize {
            0x20
        }

        fn read(&mut self, addressing: Addressing, buf: &mut [u8]) -> Result<usize> {
            self.log
                .push((Dir::Read, addressing.device_id, addressing.addr, buf.len()));
            let at = Self::absolute(addressing);
            buf.copy_from_slice(&self.image[at..at + buf.len()]);
            Ok(buf.len())
        }

        fn write(&mut self, addressing: Addressing, words: &[u8]) -> Result<usize> {
            self.log.push((
                Dir::Write,
                addressing.device_id,
                addressing.addr,
                words.len(),
            ));
            self.writes_seen += 1;
            if self.fail_write == Some(self.writes_seen) {
                return Ok(0);
            }
            let at = Self::absolute(addressing);
            self.image[at..at + words.len()].copy_from_slice(words);
            Ok(words.len())
        }
    }

    const ID: DeviceId = DeviceId::ALL[0]; // 0x68

    #[test]
    fn read_below_boundary_is_one_transaction() {
        let mut t = SplitSpace::new();
        let mut buf = [0u8; 4];
        let n = read_chip(&mut t, ChipModel::X2k, ID, 0x10, &mut buf).unwrap();
        assert_eq!(n, 4);
        assert_eq!(t.log, [(Dir::Read, 0x68, 0x10, 4)]);
    }

    #[test]
    fn read_above_boundary_rebases_device_id() {
        let mut t = SplitSpace::new();
        t.image[0x138] = 0xE2;
        let mut buf = [0u8; 1];
        read_chip(&mut t, ChipModel::X2k, ID, 0x138, &mut buf).unwrap();
        assert_eq!(t.log, [(Dir::Read, 0x69, 0x38, 1)]);
        assert_eq!(buf[0], 0xE2);
    }

    #[test]
    fn read_crossing_boundary_splits() {
        let mut t = SplitSpace::new();
        for (i, b) in t.image[0xFC..0x104].iter_mut().enumerate() {
            *b = i as u8;
        }
        let mut buf = [0u8; 8];
        let n = read_chip(&mut t, ChipModel::X2k, ID, 0xFC, &mut buf).unwrap();
        assert_eq!(n, 8);
        assert_eq!(
            t.log,
            [(Dir::Read, 0x68, 0xFC, 4), (Dir::Read, 0x69, 0x00, 4)]
        );
        assert_eq!(buf, [0, 1, 2, 3, 4, 5, 6, 7]);
    }

    #[test]
    fn large_model_never_splits() {
        let mut t = SplitSpace::new();
        let mut buf = [0u8; 8];
        read_chip(&mut t, ChipModel::X8k, ID, 0xFC, &mut buf).unwrap();
        assert_eq!(t.log, [(Dir::Read, 0x68, 0xFC, 8)]);
    }

    #[test]
    fn boundary_crossing_write_uses_two_device_ids() {
        let mut t = SplitSpace::new();
        let n = write_chip(&mut t, ChipModel::X2k, ID, 0xFE, &[0xAA, 0xBB, 0xCC, 0xDD]).unwrap();
        assert_eq!(n, 4);
        assert_eq!(
            t.log,
            [(Dir::Write, 0x68, 0xFE, 2), (Dir::Write, 0x69, 0x00, 2)]
        );
        assert_eq!(&t.image[0xFE..0x102], &[0xAA, 0xBB, 0xCC, 0xDD]);
    }

    #[test]
    fn short_second_half_reports_first_half_only() {
        let mut t = SplitSpace::new();
        t.fail_write = Some(2);
        let n = write_chip(&mut t, ChipModel::X2k, ID, 0xFE, &[0xAA, 0xBB, 0xCC, 0xDD]).unwrap();
        assert_eq!(n, 2);
        assert_eq!(&t.image[0xFE..0x100], &[0xAA, 0xBB]);
        assert_eq!(&t.image[0x100..0x102], &[0x00, 0x00]);
    }

    #[test]
    fn odd_start_merges_previous_byte() {
        let mut t = SplitSpace::new();
        t.image[0x10] = 0x55;
        let n = write_chip(&mut t, ChipModel::X2k, ID, 0x11, &[0xAA, 0xBB, 0xCC]).unwrap();
        assert_eq!(n, 3);
        // First transaction is the merge read of 0x10.
        assert_eq!(t.log[0], (Dir::Read, 0x68, 0x10, 1));
        assert_eq!(t.log[1], (Dir::Write, 0x68, 0x10, 2));
        assert_eq!(&t.image[0x10..0x14], &[0x55, 0xAA, 0xBB, 0xCC]);
    }

    #[test]
    fn odd_tail_merges_following_byte() {
        let mut t = SplitSpace::new();
        t.image[0x13] = 0x77;
        let n = write_chip(&mut t, ChipModel::X2k, ID, 0x10, &[0xAA, 0xBB, 0xCC]).unwrap();
        assert_eq!(n, 3);
        assert_eq!(&t.image[0x10..0x14], &[0xAA, 0xBB, 0xCC, 0x77]);
        // Last two transactions are the merge read of 0x13 and the final word.
        let k = t.log.len();
        assert_eq!(t.log[k - 2], (Dir::Read, 0x68, 0x13, 1));
        assert_eq!(t.log[k - 1], (Dir::Write, 0x68, 0x12, 2));
    }

    #[test]
    fn aligned_write_is_word_sequence() {
        let mut t = SplitSpace::new();
        let n = write_chip(&mut t, ChipModel::X8k, ID, 0x20, &[1, 2, 3, 4, 5, 6]).unwrap();
        assert_eq!(n, 6);
        assert_eq!(
            t.log,
            [
                (Dir::Write, 0x68, 0x20, 2),
                (Dir::Write, 0x68, 0x22, 2),
                (Dir::Write, 0x68, 0x24, 2),
            ]
        );
    }
}
