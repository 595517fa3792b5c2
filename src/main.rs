//! tagprog - A dual-interface RFID tag chip programmer
//!
//! Drives Gen2 dual-interface tag chips (2 KiB and 8 KiB variants)
//! through their wired I2C interface, either directly over a Linux
//! i2c-dev adapter or through a CP2112 USB-to-I2C bridge.
//!
//! # Architecture
//!
//! Every command runs against a `Session` from tagprog-core over a
//! boxed `TagTransport`, so the command implementations don't care
//! which programmer string selected which transport. The session
//! either auto-detects the chip (probing all four device addresses for
//! both models) or trusts an explicit `--model`/`--device-id` pair.

mod cli;
mod commands;
mod programmers;

use clap::Parser;
use cli::{parse_hex_bytes, Cli, Commands, DeviceArgs};
use commands::TagSession;
use tagprog_core::{ChipModel, DeviceId, Session};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    match cli.verbose {
        0 => {} // default (info)
        1 => log::set_max_level(log::LevelFilter::Debug),
        _ => log::set_max_level(log::LevelFilter::Trace),
    }

    let result = match cli.command {
        Commands::Probe { device } => {
            let mut session = open_session(&device)?;
            commands::probe::run_probe(&mut session)
        }
        Commands::Read {
            device,
            bank,
            offset,
            length,
            output,
        } => {
            let mut session = open_session(&device)?;
            commands::read::run_read(&mut session, bank.into(), offset, length, output.as_deref())
        }
        Commands::Write {
            device,
            bank,
            offset,
            input,
        } => {
            let mut session = open_session(&device)?;
            commands::write::run_write(&mut session, bank.into(), offset, &input)
        }
        Commands::Epc { device } => {
            let mut session = open_session(&device)?;
            commands::epc::run_epc_get(&mut session)
        }
        Commands::SetEpc { device, epc } => {
            let epc = parse_hex_bytes(&epc)?;
            if epc.len() % 2 != 0 {
                return Err("EPC must be a whole number of 16-bit words".into());
            }
            let mut session = open_session(&device)?;
            commands::epc::run_epc_set(&mut session, &epc)
        }
        Commands::Tid { device } => {
            let mut session = open_session(&device)?;
            commands::probe::run_tid(&mut session)
        }
        Commands::Status { device } => {
            let mut session = open_session(&device)?;
            commands::status::run_status(&mut session)
        }
        Commands::Lock {
            device,
            target,
            perm,
        } => {
            let mut session = open_session(&device)?;
            commands::control::run_lock(&mut session, target, perm)
        }
        Commands::Unlock {
            device,
            target,
            perm,
        } => {
            let mut session = open_session(&device)?;
            commands::control::run_unlock(&mut session, target, perm)
        }
        Commands::Kill { device } => {
            let mut session = open_session(&device)?;
            commands::control::run_kill(&mut session, true)
        }
        Commands::Unkill { device } => {
            let mut session = open_session(&device)?;
            commands::control::run_kill(&mut session, false)
        }
        Commands::Rf {
            device,
            feature,
            state,
        } => {
            let mut session = open_session(&device)?;
            commands::control::run_rf(&mut session, feature, state)
        }
        Commands::BlockPermalock { device, block } => {
            let mut session = open_session(&device)?;
            commands::control::run_block_permalock(&mut session, block)
        }
        Commands::BlockUnlock { device, block } => {
            let mut session = open_session(&device)?;
            commands::control::run_block_unlock(&mut session, block)
        }
        Commands::SetDeviceId { device, new_id } => {
            let mut session = open_session(&device)?;
            commands::control::run_set_device_id(&mut session, new_id)
        }
        Commands::LockDeviceId { device } => {
            let mut session = open_session(&device)?;
            commands::control::run_lock_device_id(&mut session)
        }
        Commands::SetPassword {
            device,
            kind,
            password,
        } => {
            let mut session = open_session(&device)?;
            commands::control::run_set_password(&mut session, kind, password)
        }
        Commands::ListProgrammers => {
            programmers::list_programmers();
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    Ok(())
}

/// Open the transport and find the chip.
///
/// With both `--model` and `--device-id` given the pair is used as is
/// (after a liveness check); otherwise all four device addresses are
/// probed for both models.
fn open_session(device: &DeviceArgs) -> Result<TagSession, Box<dyn std::error::Error>> {
    let transport = programmers::open_transport(&device.programmer)?;
    let mut session = Session::open(transport, ChipModel::X2k, DeviceId::DEFAULT);

    match (device.model, device.device_id) {
        (Some(model), Some(raw)) => {
            let id = DeviceId::new(raw).ok_or_else(|| {
                format!(
                    "Invalid device id 0x{:02X} (use 0x68, 0x6A, 0x6C or 0x6E)",
                    raw
                )
            })?;
            session.set_active(model.into(), id);
            if !session.chip_test()? {
                return Err(format!("No {} tag chip answered at {}", session.model(), id).into());
            }
        }
        (model, id) => {
            if model.is_some() || id.is_some() {
                log::warn!("--model and --device-id only take effect together; auto-detecting");
            }
            let (model, id) = session.auto_detect().map_err(|e| {
                format!(
                    "{}\nIs the tag connected, and is no RF reader holding it?",
                    e
                )
            })?;
            log::info!("Detected {} tag chip at {}", model, id);
        }
    }

    Ok(session)
}
