//! EPC commands

use super::TagSession;
use tagprog_core::MemoryBank;

/// Show the EPC, sized by the PC word
pub fn run_epc_get(session: &mut TagSession) -> Result<(), Box<dyn std::error::Error>> {
    let mut epc = [0u8; 16];
    let n = session.read_epc(&mut epc)?;
    if n == 0 {
        println!("EPC is empty (or the tag did not answer)");
    } else {
        let hex: String = epc[..n].iter().map(|b| format!("{:02X}", b)).collect();
        println!("EPC ({} bytes): {}", n, hex);
    }
    Ok(())
}

/// Write a new EPC and its PC length field
pub fn run_epc_set(
    session: &mut TagSession,
    epc: &[u8],
) -> Result<(), Box<dyn std::error::Error>> {
    let capacity = session.bank_size(MemoryBank::Epc) as usize - 2;
    if epc.len() > capacity {
        return Err(format!(
            "EPC of {} bytes exceeds the bank capacity of {} bytes",
            epc.len(),
            capacity
        )
        .into());
    }

    let n = session.set_epc(epc)?;
    if n < epc.len() {
        eprintln!(
            "Warning: EPC write stopped after {} of {} bytes; length field untouched",
            n,
            epc.len()
        );
    } else {
        println!("EPC set ({} bytes)", n);
    }
    Ok(())
}
