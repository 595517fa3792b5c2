//! Probe command implementation

use super::TagSession;
use tagprog_core::chip::TID_LEN;

/// Show the identity of the active chip
pub fn run_probe(session: &mut TagSession) -> Result<(), Box<dyn std::error::Error>> {
    println!("Found tag chip:");
    println!("  Model:      {}", session.model());
    println!("  Device id:  {}", session.device_id());

    match session.read_model_number() {
        Ok(number) => println!("  Model no.:  0x{:03X}", number),
        Err(e) => println!("  Model no.:  unavailable ({})", e),
    }

    let mut tid = [0u8; TID_LEN];
    let n = session.read_tid(&mut tid)?;
    if n == TID_LEN {
        let hex: String = tid.iter().map(|b| format!("{:02X}", b)).collect();
        println!("  TID:        {}", hex);
    } else {
        println!("  TID:        short read ({} of {} bytes)", n, TID_LEN);
    }

    let mut epc = [0u8; 16];
    let n = session.read_epc(&mut epc)?;
    if n > 0 {
        let hex: String = epc[..n].iter().map(|b| format!("{:02X}", b)).collect();
        println!("  EPC:        {}", hex);
    } else {
        println!("  EPC:        (empty)");
    }

    Ok(())
}

/// Show the TID identity block
pub fn run_tid(session: &mut TagSession) -> Result<(), Box<dyn std::error::Error>> {
    let mut tid = [0u8; TID_LEN];
    let n = session.read_tid(&mut tid)?;
    if n < TID_LEN {
        eprintln!("Warning: short TID read ({} of {} bytes)", n, TID_LEN);
    }
    let hex: String = tid[..n].iter().map(|b| format!("{:02X}", b)).collect();
    println!("TID: {}", hex);
    Ok(())
}
