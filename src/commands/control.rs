//! Lock, kill, RF configuration and device-id commands

use super::{report_written, TagSession};
use crate::cli::{LockTarget, PasswordKind, RfFeature, Switch};
use tagprog_core::DeviceId;

/// Lock a password or bank against RF access
pub fn run_lock(
    session: &mut TagSession,
    target: LockTarget,
    perm: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let n = match target {
        LockTarget::KillPassword => session.lock_kill_password(perm)?,
        LockTarget::AccessPassword => session.lock_access_password(perm)?,
        LockTarget::Epc => session.lock_epc(perm)?,
        LockTarget::User => session.lock_user(perm)?,
    };
    report_written(n);
    Ok(())
}

/// Unlock a password or bank
pub fn run_unlock(
    session: &mut TagSession,
    target: LockTarget,
    perm: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let n = match target {
        LockTarget::KillPassword => session.unlock_kill_password(perm)?,
        LockTarget::AccessPassword => session.unlock_access_password(perm)?,
        LockTarget::Epc => session.unlock_epc(perm)?,
        LockTarget::User => session.unlock_user(perm)?,
    };
    report_written(n);
    Ok(())
}

/// Set or clear the kill bit
pub fn run_kill(
    session: &mut TagSession,
    kill: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let n = if kill {
        session.kill_tag()?
    } else {
        session.unkill_tag()?
    };
    report_written(n);
    Ok(())
}

/// Toggle one RF interface feature
pub fn run_rf(
    session: &mut TagSession,
    feature: RfFeature,
    state: Switch,
) -> Result<(), Box<dyn std::error::Error>> {
    let on = state == Switch::On;
    let n = match (feature, on) {
        (RfFeature::Port1, true) => session.enable_rf_port1()?,
        (RfFeature::Port1, false) => session.disable_rf_port1()?,
        (RfFeature::Port2, true) => session.enable_rf_port2()?,
        (RfFeature::Port2, false) => session.disable_rf_port2()?,
        (RfFeature::Dci, true) => session.enable_rf_dci()?,
        (RfFeature::Dci, false) => session.disable_rf_dci()?,
        (RfFeature::Qt, true) => session.enable_qt()?,
        (RfFeature::Qt, false) => session.disable_qt()?,
        (RfFeature::QtShortRange, true) => session.enable_qt_short_range()?,
        (RfFeature::QtShortRange, false) => session.disable_qt_short_range()?,
        (RfFeature::BlockPermalock, true) => session.enable_rf_block_permalock()?,
        (RfFeature::BlockPermalock, false) => session.disable_rf_block_permalock()?,
        (RfFeature::Wakeup, true) => session.enable_write_wakeup()?,
        (RfFeature::Wakeup, false) => session.disable_write_wakeup()?,
    };
    report_written(n);
    Ok(())
}

/// Permalock one block of user memory
pub fn run_block_permalock(
    session: &mut TagSession,
    block: u8,
) -> Result<(), Box<dyn std::error::Error>> {
    if block != 0 {
        println!("Note: permalocking block {} is permanent.", block);
    }
    let n = session.block_permalock(block)?;
    report_written(n);
    Ok(())
}

/// Unlock block 0 of user memory
pub fn run_block_unlock(
    session: &mut TagSession,
    block: u8,
) -> Result<(), Box<dyn std::error::Error>> {
    let n = session.block_unlock(block)?;
    report_written(n);
    Ok(())
}

/// Program a new I2C device address
pub fn run_set_device_id(
    session: &mut TagSession,
    raw: u8,
) -> Result<(), Box<dyn std::error::Error>> {
    let id = DeviceId::new(raw)
        .ok_or_else(|| format!("Invalid device id 0x{:02X} (use 0x68, 0x6A, 0x6C or 0x6E)", raw))?;
    let n = session.set_i2c_device_id(id)?;
    if n > 0 {
        println!("Device id set to {}; the session now uses it.", id);
    } else {
        report_written(n);
    }
    Ok(())
}

/// Permanently lock the I2C device address
pub fn run_lock_device_id(session: &mut TagSession) -> Result<(), Box<dyn std::error::Error>> {
    let n = session.lock_i2c_device_id()?;
    report_written(n);
    Ok(())
}

/// Store an access or kill password
pub fn run_set_password(
    session: &mut TagSession,
    kind: PasswordKind,
    password: u32,
) -> Result<(), Box<dyn std::error::Error>> {
    let n = match kind {
        PasswordKind::Access => session.set_access_password(password)?,
        PasswordKind::Kill => session.set_kill_password(password)?,
    };
    if n < 4 {
        eprintln!("Warning: password write stopped after {} of 4 bytes", n);
    } else {
        report_written(n);
    }
    Ok(())
}
