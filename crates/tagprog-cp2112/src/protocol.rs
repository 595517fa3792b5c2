//! CP2112 HID report constants and frame codecs
//!
//! The CP2112 is driven entirely through 64-byte HID interrupt reports.
//! Every frame starts with a report id; the layouts below follow the
//! Silicon Labs AN495 interface specification.

#![allow(dead_code)]

// USB device identifiers
pub const CP2112_USB_VENDOR: u16 = 0x10C4;
pub const CP2112_USB_PRODUCT: u16 = 0xEA90;

// HID interrupt endpoints
pub const INTERRUPT_IN_EP: u8 = 0x81;
pub const INTERRUPT_OUT_EP: u8 = 0x01;

// Report ids
pub const REPORT_DATA_READ_REQUEST: u8 = 0x10;
pub const REPORT_DATA_WRITE_READ_REQUEST: u8 = 0x11;
pub const REPORT_DATA_READ_FORCE_SEND: u8 = 0x12;
pub const REPORT_DATA_READ_RESPONSE: u8 = 0x13;
pub const REPORT_DATA_WRITE: u8 = 0x14;
pub const REPORT_TRANSFER_STATUS_REQUEST: u8 = 0x15;
pub const REPORT_TRANSFER_STATUS_RESPONSE: u8 = 0x16;
pub const REPORT_CANCEL_TRANSFER: u8 = 0x17;

// Status 0 values shared by read responses and transfer status
pub const STATUS_IDLE: u8 = 0x00;
pub const STATUS_BUSY: u8 = 0x01;
pub const STATUS_COMPLETE: u8 = 0x02;
pub const STATUS_ERROR: u8 = 0x03;

/// Every HID frame is this long, padded with zeros
pub const REPORT_LEN: usize = 64;

/// Data bytes carried by one data-write or read-response report
pub const MAX_PAYLOAD: usize = 61;

/// Bytes requested from the chip per read transaction.
///
/// The bridge can move more, but the tag chip streams its memory in
/// this unit and NACKs cleanly on its boundary under RF contention.
pub const READ_UNIT: usize = 0x20;

/// Frames the bridge is given to leave the busy state before the
/// transfer is cancelled
pub const RETRY_LIMIT: usize = 10;

/// Interrupt transfer timeout
pub const TIMEOUT_MS: u64 = 3000;

/// One 64-byte HID report frame
pub type Frame = [u8; REPORT_LEN];

/// Addressed read request: write the target address, then read
/// `read_len` bytes back. `addr` holds the big-endian wire address,
/// already trimmed to the chip's address width.
pub fn write_read_request(bus_addr: u8, addr: &[u8], read_len: u16) -> Frame {
    debug_assert!(!addr.is_empty() && addr.len() <= 16);
    let mut frame = [0u8; REPORT_LEN];
    frame[0] = REPORT_DATA_WRITE_READ_REQUEST;
    frame[1] = bus_addr << 1;
    frame[2..4].copy_from_slice(&read_len.to_be_bytes());
    frame[4] = addr.len() as u8;
    frame[5..5 + addr.len()].copy_from_slice(addr);
    frame
}

/// Push buffered read data to the host
pub fn force_send(count: u16) -> Frame {
    let mut frame = [0u8; REPORT_LEN];
    frame[0] = REPORT_DATA_READ_FORCE_SEND;
    frame[1..3].copy_from_slice(&count.to_be_bytes());
    frame
}

/// Plain write: wire address bytes followed by the data
pub fn data_write(bus_addr: u8, addr: &[u8], data: &[u8]) -> Frame {
    debug_assert!(addr.len() + data.len() <= MAX_PAYLOAD);
    let mut frame = [0u8; REPORT_LEN];
    frame[0] = REPORT_DATA_WRITE;
    frame[1] = bus_addr << 1;
    frame[2] = (addr.len() + data.len()) as u8;
    frame[3..3 + addr.len()].copy_from_slice(addr);
    frame[3 + addr.len()..3 + addr.len() + data.len()].copy_from_slice(data);
    frame
}

/// Ask for a transfer status response
pub fn transfer_status_request() -> Frame {
    let mut frame = [0u8; REPORT_LEN];
    frame[0] = REPORT_TRANSFER_STATUS_REQUEST;
    frame[1] = 0x01;
    frame
}

/// Abort the transfer in flight
pub fn cancel_transfer() -> Frame {
    let mut frame = [0u8; REPORT_LEN];
    frame[0] = REPORT_CANCEL_TRANSFER;
    frame[1] = 0x01;
    frame
}

/// Decoded data read response
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadResponse<'a> {
    /// Status 0 of the transfer this data belongs to
    pub status: u8,
    /// Data bytes carried by this frame
    pub data: &'a [u8],
}

/// Decode a data read response frame, or `None` if the frame is some
/// other report.
pub fn parse_read_response(frame: &Frame) -> Option<ReadResponse<'_>> {
    if frame[0] != REPORT_DATA_READ_RESPONSE {
        return None;
    }
    let len = (frame[2] as usize).min(MAX_PAYLOAD);
    Some(ReadResponse {
        status: frame[1],
        data: &frame[3..3 + len],
    })
}

/// Decoded transfer status response
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferStatus {
    /// Status 0: idle, busy, complete or error
    pub status: u8,
    /// Status 1: condition detail (NACK, timeouts) for the status 0 state
    pub detail: u8,
    /// Bus retries used so far
    pub retries: u16,
    /// Bytes read so far
    pub bytes_read: u16,
}

/// Decode a transfer status response frame, or `None` if the frame is
/// some other report.
pub fn parse_transfer_status(frame: &Frame) -> Option<TransferStatus> {
    if frame[0] != REPORT_TRANSFER_STATUS_RESPONSE {
        return None;
    }
    Some(TransferStatus {
        status: frame[1],
        detail: frame[2],
        retries: u16::from_be_bytes([frame[3], frame[4]]),
        bytes_read: u16::from_be_bytes([frame[5], frame[6]]),
    })
}
