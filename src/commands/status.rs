//! Status command implementation

use super::TagSession;
use tagprog_core::reg::{self, LockBits, RfConfig};
use tagprog_core::MemoryBank;

/// Show the decoded control state of the chip
pub fn run_status(session: &mut TagSession) -> Result<(), Box<dyn std::error::Error>> {
    println!("Model:      {}", session.model());
    println!("Device id:  {}", session.device_id());
    match session.read_model_number() {
        Ok(number) => println!("Model no.:  0x{:03X}", number),
        Err(e) => println!("Model no.:  unavailable ({})", e),
    }

    let mut byte = [0u8; 1];

    if session.read_bank(MemoryBank::Reserved, reg::LOCK_BYTE, &mut byte)? == 1 {
        let locks = LockBits::from_bits_truncate(byte[0]);
        println!("Lock byte:  0x{:02X} {:?}", byte[0], locks);
    } else {
        println!("Lock byte:  unavailable (tag busy)");
    }

    if session.read_bank(MemoryBank::Reserved, reg::CONTROL_BYTE, &mut byte)? == 1 {
        let killed = byte[0] & (1 << reg::KILL.bit) != 0;
        println!("Killed:     {}", if killed { "yes" } else { "no" });
        println!("Id select:  0b{:02b}", byte[0] & 0b11);
    } else {
        println!("Killed:     unavailable (tag busy)");
    }

    if session.read_bank(MemoryBank::Reserved, reg::RF_CONFIG_BYTE, &mut byte)? == 1 {
        let rf = RfConfig::from_bits_truncate(byte[0]);
        println!("RF config:  0x{:02X} {:?}", byte[0], rf);
    } else {
        println!("RF config:  unavailable (tag busy)");
    }

    Ok(())
}
