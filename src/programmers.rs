//! Programmer registration and dispatch
//!
//! This module provides a centralized registry for all transports, with
//! support for feature-gated inclusion and dynamic help text generation.

use tagprog_core::TagTransport;

/// Information about a programmer
pub struct ProgrammerInfo {
    /// Primary name (used for matching)
    pub name: &'static str,
    /// Alternative names/aliases
    pub aliases: &'static [&'static str],
    /// Short description
    pub description: &'static str,
}

/// Get information about all available programmers (enabled at compile time)
#[allow(unused_mut, clippy::vec_init_then_push)]
pub fn available_programmers() -> Vec<ProgrammerInfo> {
    let mut programmers = Vec::new();

    #[cfg(feature = "dummy")]
    programmers.push(ProgrammerInfo {
        name: "dummy",
        aliases: &[],
        description: "In-memory tag chip emulator (model=<2k|8k>,id=<0x68-0x6E>)",
    });

    #[cfg(feature = "cp2112")]
    programmers.push(ProgrammerInfo {
        name: "cp2112",
        aliases: &["hid_i2c"],
        description: "CP2112 USB-to-I2C bridge (VID:10C4 PID:EA90) (device=<N>)",
    });

    #[cfg(feature = "linux-i2c")]
    programmers.push(ProgrammerInfo {
        name: "linux_i2c",
        aliases: &["linux-i2c", "i2cdev"],
        description: "Linux i2c-dev interface (dev=/dev/i2c-N)",
    });

    programmers
}

/// Generate help text listing all available programmers
pub fn programmer_help() -> String {
    let programmers = available_programmers();

    if programmers.is_empty() {
        return "No programmers available (recompile with programmer features enabled)".to_string();
    }

    let mut help = String::from("Available programmers:\n");
    for p in &programmers {
        help.push_str(&format!("  {:12} - {}\n", p.name, p.description));
    }
    help
}

/// Generate a short list of programmer names for CLI help
pub fn programmer_names_short() -> String {
    let programmers = available_programmers();
    let names: Vec<&str> = programmers.iter().map(|p| p.name).collect();
    names.join(", ")
}

/// Check if a programmer name matches any available programmer
#[allow(unused_variables)]
pub fn find_programmer(name: &str) -> Option<&'static str> {
    #[cfg(feature = "dummy")]
    if name == "dummy" {
        return Some("dummy");
    }

    #[cfg(feature = "cp2112")]
    if name == "cp2112" || name == "hid_i2c" {
        return Some("cp2112");
    }

    #[cfg(feature = "linux-i2c")]
    if name == "linux_i2c" || name == "linux-i2c" || name == "i2cdev" {
        return Some("linux_i2c");
    }

    None
}

/// Print the programmer table
pub fn list_programmers() {
    println!("{}", programmer_help());
}

/// Open the transport named by a programmer string.
///
/// The string can be just the name (e.g., "cp2112") or include
/// parameters (e.g., "linux_i2c:dev=/dev/i2c-1").
#[allow(unused_variables)]
pub fn open_transport(
    programmer: &str,
) -> Result<Box<dyn TagTransport + Send>, Box<dyn std::error::Error>> {
    let (name, options) = parse_programmer_string(programmer);

    let canonical_name = match find_programmer(name) {
        Some(n) => n,
        None => return Err(unknown_programmer_error(name)),
    };

    match canonical_name {
        #[cfg(feature = "dummy")]
        "dummy" => {
            let config = parse_dummy_options(&options)?;
            Ok(Box::new(tagprog_dummy::DummyTag::new(config)))
        }

        #[cfg(feature = "cp2112")]
        "cp2112" => {
            log::info!("Opening CP2112 bridge...");
            let config = tagprog_cp2112::parse_options(&options)?;
            let bridge = tagprog_cp2112::Cp2112::open_with_config(config).map_err(|e| {
                format!(
                    "Failed to open CP2112: {}\n\
                     Make sure the device is connected and you have permissions.",
                    e
                )
            })?;
            Ok(Box::new(bridge))
        }

        #[cfg(feature = "linux-i2c")]
        "linux_i2c" => {
            let config = tagprog_linux_i2c::parse_options(&options)?;
            let bus = tagprog_linux_i2c::LinuxI2c::open(&config).map_err(|e| {
                format!(
                    "Failed to open Linux I2C device: {}\n\
                     Make sure the device exists and you have read/write permissions.\n\
                     You may need to: sudo usermod -aG i2c $USER",
                    e
                )
            })?;
            Ok(Box::new(bus))
        }

        _ => Err(unknown_programmer_error(name)),
    }
}

#[cfg(feature = "dummy")]
fn parse_dummy_options(
    options: &[(&str, &str)],
) -> Result<tagprog_dummy::DummyConfig, Box<dyn std::error::Error>> {
    use tagprog_core::{ChipModel, DeviceId};

    let mut config = tagprog_dummy::DummyConfig::default();
    for (key, value) in options {
        match *key {
            "model" => {
                config.model = match *value {
                    "2k" | "2K" => ChipModel::X2k,
                    "8k" | "8K" => ChipModel::X8k,
                    _ => return Err(format!("Invalid model: {} (use 2k or 8k)", value).into()),
                };
            }
            "id" => {
                let raw = crate::cli::parse_hex_u8(value)?;
                config.device_id = DeviceId::new(raw)
                    .ok_or_else(|| format!("Invalid device id: {} (use 0x68-0x6E, even)", value))?;
            }
            _ => return Err(format!("Unknown dummy option: {}", key).into()),
        }
    }
    Ok(config)
}

/// Split a programmer string into its name and key=value options
pub fn parse_programmer_string(s: &str) -> (&str, Vec<(&str, &str)>) {
    if let Some((name, opts)) = s.split_once(':') {
        let options: Vec<_> = opts
            .split(',')
            .filter_map(|opt| opt.split_once('='))
            .collect();
        (name, options)
    } else {
        (s, Vec::new())
    }
}

fn unknown_programmer_error(name: &str) -> Box<dyn std::error::Error> {
    let mut msg = format!("Unknown programmer: {}\n\n", name);
    msg.push_str(&programmer_help());
    msg.push_str("\nUse 'tagprog list-programmers' for more details");
    msg.into()
}
