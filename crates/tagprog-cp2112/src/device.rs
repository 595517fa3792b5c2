//! CP2112 device handling and the bridge transfer state machine

use std::time::Duration;

use tagprog_core::transport::{Addressing, TagTransport};

use crate::error::{Cp2112Error, Result};
use crate::protocol::{
    self, Frame, CP2112_USB_PRODUCT, CP2112_USB_VENDOR, INTERRUPT_IN_EP, INTERRUPT_OUT_EP,
    READ_UNIT, REPORT_LEN, RETRY_LIMIT, STATUS_BUSY, STATUS_COMPLETE, STATUS_ERROR, STATUS_IDLE,
    TIMEOUT_MS,
};

/// One HID interrupt report channel to the bridge.
///
/// The transfer state machine only ever exchanges whole 64-byte
/// frames; splitting this off keeps it testable without hardware.
pub trait HidChannel {
    /// Send one report frame
    fn send(&mut self, frame: &Frame) -> Result<()>;
    /// Receive one report frame
    fn recv(&mut self) -> Result<Frame>;
}

/// Configuration for opening a CP2112
#[derive(Debug, Clone, Default)]
pub struct Cp2112Config {
    /// Select the Nth matching device (0-indexed)
    pub device_index: usize,
}

/// Parse programmer options into a configuration
///
/// Supported options:
/// - `device=N` or `index=N`: select the Nth CP2112 (0-indexed)
pub fn parse_options(options: &[(&str, &str)]) -> Result<Cp2112Config> {
    let mut config = Cp2112Config::default();
    for (key, value) in options {
        match *key {
            "device" | "index" => {
                config.device_index = value.parse().map_err(|_| {
                    Cp2112Error::InvalidParameter(format!("invalid device index: {}", value))
                })?;
            }
            _ => {
                return Err(Cp2112Error::InvalidParameter(format!(
                    "unknown option: {}",
                    key
                )));
            }
        }
    }
    Ok(config)
}

/// HID channel over nusb interrupt endpoints
pub struct UsbChannel {
    interface: nusb::Interface,
}

/// `transfer_blocking` cancels a transfer that overruns its deadline,
/// so a cancelled completion on this path means the timeout elapsed.
fn completion_error(e: nusb::transfer::TransferError) -> Cp2112Error {
    match e {
        nusb::transfer::TransferError::Cancelled => Cp2112Error::Timeout,
        e => Cp2112Error::TransferFailed(e.to_string()),
    }
}

impl HidChannel for UsbChannel {
    fn send(&mut self, frame: &Frame) -> Result<()> {
        use nusb::transfer::{Buffer, Interrupt, Out};

        let mut ep: nusb::Endpoint<Interrupt, Out> = self
            .interface
            .endpoint(INTERRUPT_OUT_EP)
            .map_err(|e| Cp2112Error::TransferFailed(e.to_string()))?;

        let mut buf = Buffer::new(REPORT_LEN);
        buf.extend_from_slice(frame);
        ep.transfer_blocking(buf, Duration::from_millis(TIMEOUT_MS))
            .into_result()
            .map_err(completion_error)?;
        Ok(())
    }

    fn recv(&mut self) -> Result<Frame> {
        use nusb::transfer::{Buffer, In, Interrupt};

        let mut ep: nusb::Endpoint<Interrupt, In> = self
            .interface
            .endpoint(INTERRUPT_IN_EP)
            .map_err(|e| Cp2112Error::TransferFailed(e.to_string()))?;

        let mut buf = Buffer::new(REPORT_LEN);
        buf.set_requested_len(REPORT_LEN);
        let data = ep
            .transfer_blocking(buf, Duration::from_millis(TIMEOUT_MS))
            .into_result()
            .map_err(completion_error)?;

        let mut frame = [0u8; REPORT_LEN];
        let len = data.len().min(REPORT_LEN);
        frame[..len].copy_from_slice(&data[..len]);
        Ok(frame)
    }
}

/// CP2112 USB-to-I2C bridge
///
/// Wraps the report-level transfer state machine around a HID channel
/// and exposes the result as a [`TagTransport`]. Reads move in
/// [`READ_UNIT`] chunks, writes one 16-bit word per transaction; a
/// NACKed transaction surfaces as a zero count. A bridge that answers
/// busy through the whole pre-transaction check is cancelled and
/// reported as a hard error; a read still streaming when the poll
/// bound runs out is cancelled and counted as a short transfer.
pub struct Cp2112<C: HidChannel> {
    channel: C,
}

impl Cp2112<UsbChannel> {
    /// Open the first available CP2112
    pub fn open() -> Result<Self> {
        Self::open_with_config(Cp2112Config::default())
    }

    /// Open a CP2112 with the specified configuration
    pub fn open_with_config(config: Cp2112Config) -> Result<Self> {
        use nusb::MaybeFuture;

        let devices: Vec<_> = nusb::list_devices()
            .wait()
            .map_err(|e| Cp2112Error::OpenFailed(e.to_string()))?
            .filter(|d| {
                d.vendor_id() == CP2112_USB_VENDOR && d.product_id() == CP2112_USB_PRODUCT
            })
            .collect();

        if devices.is_empty() {
            return Err(Cp2112Error::DeviceNotFound);
        }

        let device_info = devices
            .get(config.device_index)
            .ok_or(Cp2112Error::DeviceNotFound)?;

        log::info!(
            "Opening CP2112 at bus {} address {}",
            device_info.busnum(),
            device_info.device_address()
        );

        let device = device_info
            .open()
            .wait()
            .map_err(|e| Cp2112Error::OpenFailed(e.to_string()))?;

        // The kernel hidraw driver owns the device by default.
        let interface = device
            .detach_and_claim_interface(0)
            .wait()
            .map_err(|e| Cp2112Error::ClaimFailed(e.to_string()))?;

        Ok(Self::with_channel(UsbChannel { interface }))
    }
}

impl<C: HidChannel> Cp2112<C> {
    /// Wrap an already-open HID channel
    pub fn with_channel(channel: C) -> Self {
        Self { channel }
    }

    fn transfer_status(&mut self) -> Result<protocol::TransferStatus> {
        self.channel.send(&protocol::transfer_status_request())?;
        let frame = self.channel.recv()?;
        protocol::parse_transfer_status(&frame).ok_or_else(|| {
            Cp2112Error::InvalidResponse(format!(
                "expected transfer status, got report 0x{:02X}",
                frame[0]
            ))
        })
    }

    /// Wait for the bridge to have no transfer in flight.
    ///
    /// Sends a cancel frame and gives up once the bridge has answered
    /// busy [`RETRY_LIMIT`] times in a row.
    fn await_idle(&mut self) -> Result<()> {
        for _ in 0..RETRY_LIMIT {
            let status = self.transfer_status()?;
            match status.status {
                STATUS_IDLE | STATUS_COMPLETE | STATUS_ERROR => return Ok(()),
                _ => log::trace!("bridge busy, {} bus retries", status.retries),
            }
        }
        log::warn!("bridge stuck busy, cancelling transfer");
        self.channel.send(&protocol::cancel_transfer())?;
        Err(Cp2112Error::RetriesExhausted)
    }

    /// Read up to [`READ_UNIT`] bytes in one addressed transaction.
    ///
    /// Data arrives spread over several response frames; each poll
    /// counts toward the retry bound whether or not it carried data.
    /// A NACKed transaction, or a tag still streaming when the bound
    /// runs out, ends the read with the bytes collected so far.
    fn read_unit(&mut self, addressing: Addressing, buf: &mut [u8]) -> Result<usize> {
        debug_assert!(buf.len() <= READ_UNIT);
        self.await_idle()?;

        let (addr, addr_len) = addressing.addr_bytes();
        self.channel.send(&protocol::write_read_request(
            addressing.device_id,
            &addr[..addr_len],
            buf.len() as u16,
        ))?;
        self.channel.send(&protocol::force_send(buf.len() as u16))?;

        let mut done = 0;
        for _ in 0..RETRY_LIMIT {
            let frame = self.channel.recv()?;
            let response = match protocol::parse_read_response(&frame) {
                Some(response) => response,
                None => {
                    self.channel.send(&protocol::transfer_status_request())?;
                    continue;
                }
            };

            let room = buf.len() - done;
            let take = response.data.len().min(room);
            buf[done..done + take].copy_from_slice(&response.data[..take]);
            done += take;

            match response.status {
                STATUS_ERROR => {
                    log::debug!("read NACKed after {} bytes", done);
                    return Ok(done);
                }
                STATUS_BUSY => continue,
                _ => return Ok(done),
            }
        }

        log::debug!("read poll bound hit after {} bytes", done);
        self.channel.send(&protocol::cancel_transfer())?;
        Ok(done)
    }

    /// Write one address-prefixed data unit and confirm it on the bus.
    ///
    /// Returns the data length on completion and zero when the chip
    /// NACKed the transaction.
    fn write_unit(&mut self, addressing: Addressing, data: &[u8]) -> Result<usize> {
        self.await_idle()?;

        let (addr, addr_len) = addressing.addr_bytes();
        self.channel.send(&protocol::data_write(
            addressing.device_id,
            &addr[..addr_len],
            data,
        ))?;

        for _ in 0..RETRY_LIMIT {
            let status = self.transfer_status()?;
            match status.status {
                STATUS_COMPLETE | STATUS_IDLE => return Ok(data.len()),
                STATUS_ERROR => {
                    log::debug!("write NACKed (condition 0x{:02X})", status.detail);
                    return Ok(0);
                }
                _ => {}
            }
        }

        self.channel.send(&protocol::cancel_transfer())?;
        Err(Cp2112Error::RetriesExhausted)
    }
}

impl<C: HidChannel> TagTransport for Cp2112<C> {
    fn max_read_len(&self) -> usize {
        READ_UNIT
    }

    fn read(&mut self, addressing: Addressing, buf: &mut [u8]) -> tagprog_core::Result<usize> {
        let mut done = 0;
        while done < buf.len() {
            let chunk = (buf.len() - done).min(READ_UNIT);
            let unit = Addressing {
                device_id: addressing.device_id,
                addr: addressing.addr + done as u16,
                width: addressing.width,
            };
            let got = self
                .read_unit(unit, &mut buf[done..done + chunk])
                .map_err(tagprog_core::Error::from)?;
            done += got;
            if got < chunk {
                break;
            }
        }
        Ok(done)
    }

    fn write(&mut self, addressing: Addressing, words: &[u8]) -> tagprog_core::Result<usize> {
        if words.len() % 2 != 0 {
            return Err(tagprog_core::Error::InvalidAlignment);
        }
        let mut done = 0;
        for word in words.chunks_exact(2) {
            let unit = Addressing {
                device_id: addressing.device_id,
                addr: addressing.addr + done as u16,
                width: addressing.width,
            };
            let put = self
                .write_unit(unit, word)
                .map_err(tagprog_core::Error::from)?;
            done += put;
            if put < 2 {
                break;
            }
        }
        Ok(done)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use tagprog_core::transport::AddrWidth;

    /// Channel fed from a prepared frame script, recording everything
    /// sent to the bridge.
    struct ScriptedChannel {
        responses: VecDeque<Frame>,
        sent: Vec<Frame>,
    }

    impl ScriptedChannel {
        fn new(responses: &[Frame]) -> Self {
            Self {
                responses: responses.iter().copied().collect(),
                sent: Vec::new(),
            }
        }
    }

    impl HidChannel for ScriptedChannel {
        fn send(&mut self, frame: &Frame) -> Result<()> {
            self.sent.push(*frame);
            Ok(())
        }

        fn recv(&mut self) -> Result<Frame> {
            Ok(self.responses.pop_front().expect("frame script exhausted"))
        }
    }

    fn status_frame(status: u8) -> Frame {
        let mut frame = [0u8; REPORT_LEN];
        frame[0] = protocol::REPORT_TRANSFER_STATUS_RESPONSE;
        frame[1] = status;
        frame
    }

    fn read_frame(status: u8, data: &[u8]) -> Frame {
        let mut frame = [0u8; REPORT_LEN];
        frame[0] = protocol::REPORT_DATA_READ_RESPONSE;
        frame[1] = status;
        frame[2] = data.len() as u8;
        frame[3..3 + data.len()].copy_from_slice(data);
        frame
    }

    fn addressing(addr: u16) -> Addressing {
        Addressing {
            device_id: 0x6E,
            addr,
            width: AddrWidth::Two,
        }
    }

    #[test]
    fn read_accumulates_across_busy_frames() {
        let script = [
            status_frame(STATUS_IDLE),
            read_frame(STATUS_BUSY, &[0xE2, 0x01]),
            read_frame(STATUS_BUSY, &[]),
            read_frame(STATUS_COMPLETE, &[0x50, 0x00]),
        ];
        let mut bridge = Cp2112::with_channel(ScriptedChannel::new(&script));
        let mut buf = [0u8; 4];
        let n = bridge.read_unit(addressing(0x28), &mut buf).unwrap();
        assert_eq!(n, 4);
        assert_eq!(buf, [0xE2, 0x01, 0x50, 0x00]);

        // Request frame carries the shifted bus address and BE length.
        let request = &bridge.channel.sent[1];
        assert_eq!(&request[..7], &[0x11, 0xDC, 0x00, 0x04, 2, 0x00, 0x28]);
    }

    #[test]
    fn nacked_read_is_a_short_count() {
        let script = [
            status_frame(STATUS_IDLE),
            read_frame(STATUS_ERROR, &[]),
        ];
        let mut bridge = Cp2112::with_channel(ScriptedChannel::new(&script));
        let mut buf = [0u8; 8];
        assert_eq!(bridge.read_unit(addressing(0x16), &mut buf).unwrap(), 0);
    }

    #[test]
    fn busy_bridge_gets_cancelled_after_retry_limit() {
        let script = [status_frame(STATUS_BUSY); RETRY_LIMIT];
        let mut bridge = Cp2112::with_channel(ScriptedChannel::new(&script));
        let mut buf = [0u8; 2];
        let err = bridge.read_unit(addressing(0x00), &mut buf).unwrap_err();
        assert!(matches!(err, Cp2112Error::RetriesExhausted));
        let last = bridge.channel.sent.last().unwrap();
        assert_eq!(last[0], protocol::REPORT_CANCEL_TRANSFER);
    }

    #[test]
    fn read_poll_bound_counts_every_frame() {
        // Endless busy responses with no data must not spin forever;
        // hitting the bound cancels the transfer and is a short read.
        let mut script = vec![status_frame(STATUS_IDLE)];
        script.extend([read_frame(STATUS_BUSY, &[]); RETRY_LIMIT]);
        let mut bridge = Cp2112::with_channel(ScriptedChannel::new(&script));
        let mut buf = [0u8; 2];
        assert_eq!(bridge.read_unit(addressing(0x00), &mut buf).unwrap(), 0);
        let last = bridge.channel.sent.last().unwrap();
        assert_eq!(last[0], protocol::REPORT_CANCEL_TRANSFER);
    }

    #[test]
    fn slow_read_keeps_bytes_collected_at_the_poll_bound() {
        // A tag trickling data under RF contention exhausts the polls
        // but the bytes already moved still reach the caller.
        let mut script = vec![status_frame(STATUS_IDLE)];
        script.extend([read_frame(STATUS_BUSY, &[0xE2, 0x01]); RETRY_LIMIT]);
        let mut bridge = Cp2112::with_channel(ScriptedChannel::new(&script));
        let mut buf = [0u8; READ_UNIT];
        let n = bridge.read_unit(addressing(0x28), &mut buf).unwrap();
        assert_eq!(n, 2 * RETRY_LIMIT);
        assert_eq!(&buf[..2], &[0xE2, 0x01]);
    }

    #[test]
    fn unexpected_frame_requeries_transfer_status() {
        let script = [
            status_frame(STATUS_IDLE),
            status_frame(STATUS_BUSY),
            read_frame(STATUS_COMPLETE, &[0xAB, 0xCD]),
        ];
        let mut bridge = Cp2112::with_channel(ScriptedChannel::new(&script));
        let mut buf = [0u8; 2];
        assert_eq!(bridge.read_unit(addressing(0x16), &mut buf).unwrap(), 2);

        // One force-send up front, then a status query for the frame
        // that was not a read response.
        let sent: Vec<u8> = bridge.channel.sent.iter().map(|f| f[0]).collect();
        assert_eq!(
            sent,
            vec![
                protocol::REPORT_TRANSFER_STATUS_REQUEST,
                protocol::REPORT_DATA_WRITE_READ_REQUEST,
                protocol::REPORT_DATA_READ_FORCE_SEND,
                protocol::REPORT_TRANSFER_STATUS_REQUEST,
            ]
        );
    }

    #[test]
    fn write_confirms_on_the_bus() {
        let script = [status_frame(STATUS_IDLE), status_frame(STATUS_COMPLETE)];
        let mut bridge = Cp2112::with_channel(ScriptedChannel::new(&script));
        let n = bridge.write_unit(addressing(0x16), &[0xAB, 0xCD]).unwrap();
        assert_eq!(n, 2);

        let write = &bridge.channel.sent[1];
        assert_eq!(&write[..7], &[0x14, 0xDC, 4, 0x00, 0x16, 0xAB, 0xCD]);
    }

    #[test]
    fn nacked_write_is_a_zero_count() {
        let script = [status_frame(STATUS_IDLE), status_frame(STATUS_ERROR)];
        let mut bridge = Cp2112::with_channel(ScriptedChannel::new(&script));
        assert_eq!(bridge.write_unit(addressing(0x16), &[1, 2]).unwrap(), 0);
    }

    #[test]
    fn transport_read_decomposes_into_units() {
        let first: Vec<u8> = (0..READ_UNIT as u8).collect();
        let script = [
            status_frame(STATUS_IDLE),
            read_frame(STATUS_COMPLETE, &first[..32]),
            status_frame(STATUS_IDLE),
            read_frame(STATUS_COMPLETE, &[0xAA, 0xBB]),
        ];
        let mut bridge = Cp2112::with_channel(ScriptedChannel::new(&script));
        let mut buf = [0u8; 34];
        let n = bridge.read(addressing(0x40), &mut buf).unwrap();
        assert_eq!(n, 34);
        assert_eq!(&buf[32..], &[0xAA, 0xBB]);

        // Second unit request targets the bumped wire address.
        let second_request = bridge
            .channel
            .sent
            .iter()
            .filter(|f| f[0] == protocol::REPORT_DATA_WRITE_READ_REQUEST)
            .nth(1)
            .unwrap();
        assert_eq!(&second_request[4..7], &[2, 0x00, 0x60]);
    }

    #[test]
    fn odd_length_write_is_rejected_before_the_bus() {
        let mut bridge = Cp2112::with_channel(ScriptedChannel::new(&[]));
        assert_eq!(
            bridge.write(addressing(0x16), &[1, 2, 3]),
            Err(tagprog_core::Error::InvalidAlignment)
        );
        assert!(bridge.channel.sent.is_empty());
    }

    #[test]
    fn transport_write_stops_at_first_nack() {
        let script = [
            status_frame(STATUS_IDLE),
            status_frame(STATUS_COMPLETE),
            status_frame(STATUS_IDLE),
            status_frame(STATUS_ERROR),
        ];
        let mut bridge = Cp2112::with_channel(ScriptedChannel::new(&script));
        let n = bridge.write(addressing(0x40), &[1, 2, 3, 4, 5, 6]).unwrap();
        assert_eq!(n, 2);
    }

    #[test]
    fn option_parsing() {
        assert_eq!(parse_options(&[("device", "1")]).unwrap().device_index, 1);
        assert!(parse_options(&[("device", "x")]).is_err());
        assert!(parse_options(&[("spispeed", "8M")]).is_err());
    }
}
