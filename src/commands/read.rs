//! Read command implementation

use super::TagSession;
use indicatif::{ProgressBar, ProgressStyle};
use std::fs::File;
use std::io::Write;
use std::path::Path;
use tagprog_core::MemoryBank;

/// Bytes per progress step; matches the chip's streaming unit
const READ_CHUNK_SIZE: usize = 0x20;

/// Run the read command
pub fn run_read(
    session: &mut TagSession,
    bank: MemoryBank,
    offset: u16,
    length: Option<u16>,
    output: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let bank_size = session.bank_size(bank);
    if offset >= bank_size {
        return Err(format!(
            "Offset 0x{:X} is beyond the {:?} bank ({} bytes)",
            offset, bank, bank_size
        )
        .into());
    }
    let length = length.unwrap_or(bank_size - offset) as usize;

    let data = read_bank_with_progress(session, bank, offset, length)?;
    if data.len() < length {
        eprintln!(
            "Warning: read stopped after {} of {} bytes (RF reader active?)",
            data.len(),
            length
        );
    }

    match output {
        Some(path) => {
            let mut file = File::create(path)?;
            file.write_all(&data)?;
            println!("Wrote {} bytes to {:?}", data.len(), path);
        }
        None => hex_dump(&data, offset),
    }

    Ok(())
}

/// Read part of a bank with a progress bar.
///
/// Stops early on a short read and returns what was collected.
pub fn read_bank_with_progress(
    session: &mut TagSession,
    bank: MemoryBank,
    offset: u16,
    length: usize,
) -> Result<Vec<u8>, Box<dyn std::error::Error>> {
    let mut data = vec![0u8; length];

    let pb = ProgressBar::new(length as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({bytes_per_sec}, {eta})")?
            .progress_chars("#>-"),
    );

    let mut done = 0usize;
    while done < length {
        let chunk = std::cmp::min(READ_CHUNK_SIZE, length - done);
        let n = session.read_bank(bank, offset + done as u16, &mut data[done..done + chunk])?;
        done += n;
        pb.set_position(done as u64);
        if n < chunk {
            break;
        }
    }

    pb.finish_and_clear();
    data.truncate(done);
    Ok(data)
}

/// Print a bank-relative hex dump
fn hex_dump(data: &[u8], base: u16) {
    for (i, line) in data.chunks(16).enumerate() {
        let addr = base as usize + i * 16;
        let hex: Vec<String> = line.iter().map(|b| format!("{:02X}", b)).collect();
        let ascii: String = line
            .iter()
            .map(|&b| {
                if (0x20..0x7F).contains(&b) {
                    b as char
                } else {
                    '.'
                }
            })
            .collect();
        println!("{:04X}: {:<47} |{}|", addr, hex.join(" "), ascii);
    }
}
