//! Write command implementation

use super::TagSession;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;
use tagprog_core::MemoryBank;

/// Bytes per progress step
const WRITE_CHUNK_SIZE: usize = 0x20;

/// Run the write command
pub fn run_write(
    session: &mut TagSession,
    bank: MemoryBank,
    offset: u16,
    input: &Path,
) -> Result<(), Box<dyn std::error::Error>> {
    let data = std::fs::read(input)?;

    let bank_size = session.bank_size(bank) as usize;
    if offset as usize + data.len() > bank_size {
        return Err(format!(
            "{} bytes at offset 0x{:X} do not fit the {:?} bank ({} bytes)",
            data.len(),
            offset,
            bank,
            bank_size
        )
        .into());
    }

    let pb = ProgressBar::new(data.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({bytes_per_sec}, {eta})")?
            .progress_chars("#>-"),
    );

    let mut done = 0usize;
    while done < data.len() {
        let chunk = std::cmp::min(WRITE_CHUNK_SIZE, data.len() - done);
        let n = session.write_bank(bank, offset + done as u16, &data[done..done + chunk])?;
        done += n;
        pb.set_position(done as u64);
        if n < chunk {
            break;
        }
    }
    pb.finish_and_clear();

    if done < data.len() {
        eprintln!(
            "Warning: write stopped after {} of {} bytes (RF reader active?)",
            done,
            data.len()
        );
    } else {
        println!("Wrote {} bytes to the {:?} bank", done, bank);
    }

    Ok(())
}
