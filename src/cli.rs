//! CLI argument parsing

use crate::programmers;
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use tagprog_core::{ChipModel, MemoryBank};

/// Parse a string as a hex or decimal u32
pub fn parse_hex_u32(s: &str) -> Result<u32, String> {
    if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        u32::from_str_radix(hex, 16).map_err(|e| format!("Invalid hex value: {}", e))
    } else {
        s.parse::<u32>().map_err(|e| format!("Invalid number: {}", e))
    }
}

/// Parse a string as a hex or decimal u16
pub fn parse_hex_u16(s: &str) -> Result<u16, String> {
    let v = parse_hex_u32(s)?;
    u16::try_from(v).map_err(|_| format!("Value too large: {}", s))
}

/// Parse a string as a hex or decimal u8
pub fn parse_hex_u8(s: &str) -> Result<u8, String> {
    let v = parse_hex_u32(s)?;
    u8::try_from(v).map_err(|_| format!("Value too large: {}", s))
}

/// Parse an even-length hex string into bytes
pub fn parse_hex_bytes(s: &str) -> Result<Vec<u8>, String> {
    let s = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")).unwrap_or(s);
    if s.len() % 2 != 0 {
        return Err("Hex string must have an even number of digits".to_string());
    }
    (0..s.len())
        .step_by(2)
        .map(|i| {
            u8::from_str_radix(&s[i..i + 2], 16)
                .map_err(|e| format!("Invalid hex value: {}", e))
        })
        .collect()
}

/// Generate dynamic help text for the programmer argument
fn programmer_help() -> String {
    format!(
        "Programmer to use [available: {}]",
        programmers::programmer_names_short()
    )
}

#[derive(Parser)]
#[command(name = "tagprog")]
#[command(author, version, about = "Dual-interface RFID tag chip programmer", long_about = None)]
pub struct Cli {
    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

/// Target chip selection shared across commands
#[derive(Args, Debug, Clone)]
pub struct DeviceArgs {
    /// Programmer to use
    #[arg(short, long, help = programmer_help())]
    pub programmer: String,

    /// Chip model; auto-detected if not specified
    #[arg(short, long, value_enum)]
    pub model: Option<ModelArg>,

    /// I2C device address (0x68, 0x6A, 0x6C or 0x6E); auto-detected if
    /// not specified
    #[arg(long, value_parser = parse_hex_u8)]
    pub device_id: Option<u8>,
}

/// Chip model argument
#[derive(ValueEnum, Debug, Clone, Copy)]
pub enum ModelArg {
    /// 2 KiB variant
    #[value(name = "2k")]
    X2k,
    /// 8 KiB variant
    #[value(name = "8k")]
    X8k,
}

impl From<ModelArg> for ChipModel {
    fn from(arg: ModelArg) -> Self {
        match arg {
            ModelArg::X2k => ChipModel::X2k,
            ModelArg::X8k => ChipModel::X8k,
        }
    }
}

/// Memory bank argument
#[derive(ValueEnum, Debug, Clone, Copy)]
pub enum BankArg {
    /// Passwords and control bits
    Reserved,
    /// PC word plus EPC
    Epc,
    /// Read-only chip identity
    Tid,
    /// General purpose user memory
    User,
}

impl From<BankArg> for MemoryBank {
    fn from(arg: BankArg) -> Self {
        match arg {
            BankArg::Reserved => MemoryBank::Reserved,
            BankArg::Epc => MemoryBank::Epc,
            BankArg::Tid => MemoryBank::Tid,
            BankArg::User => MemoryBank::User,
        }
    }
}

/// What a lock or unlock operation applies to
#[derive(ValueEnum, Debug, Clone, Copy)]
pub enum LockTarget {
    /// Kill password
    KillPassword,
    /// Access password
    AccessPassword,
    /// EPC bank
    Epc,
    /// User bank
    User,
}

/// RF interface features that can be toggled
#[derive(ValueEnum, Debug, Clone, Copy)]
pub enum RfFeature {
    /// RF port 1
    Port1,
    /// RF port 2
    Port2,
    /// RF access while DC powered
    Dci,
    /// QT public mode
    Qt,
    /// QT short range
    QtShortRange,
    /// Block permalocking over RF
    BlockPermalock,
    /// Write wakeup mode
    Wakeup,
}

/// On/off switch argument
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Switch {
    /// Enable the feature
    On,
    /// Disable the feature
    Off,
}

/// Which password a set-password command stores
#[derive(ValueEnum, Debug, Clone, Copy)]
pub enum PasswordKind {
    /// Access password
    Access,
    /// Kill password
    Kill,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Probe for a tag chip and show its identity
    Probe {
        #[command(flatten)]
        device: DeviceArgs,
    },

    /// Read a memory bank
    Read {
        #[command(flatten)]
        device: DeviceArgs,

        /// Bank to read
        #[arg(short, long, value_enum, default_value = "user")]
        bank: BankArg,

        /// Byte offset within the bank
        #[arg(long, value_parser = parse_hex_u16, default_value = "0")]
        offset: u16,

        /// Number of bytes (defaults to the rest of the bank)
        #[arg(short, long, value_parser = parse_hex_u16)]
        length: Option<u16>,

        /// Output file (hex dump to stdout if omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Write a file into a memory bank
    Write {
        #[command(flatten)]
        device: DeviceArgs,

        /// Bank to write
        #[arg(short, long, value_enum, default_value = "user")]
        bank: BankArg,

        /// Byte offset within the bank
        #[arg(long, value_parser = parse_hex_u16, default_value = "0")]
        offset: u16,

        /// Input file path
        #[arg(short, long)]
        input: PathBuf,
    },

    /// Show the EPC
    Epc {
        #[command(flatten)]
        device: DeviceArgs,
    },

    /// Write a new EPC (hex string, whole 16-bit words)
    SetEpc {
        #[command(flatten)]
        device: DeviceArgs,

        /// EPC as a hex string, e.g. 300833B2DDD9014035050000
        epc: String,
    },

    /// Show the TID identity block
    Tid {
        #[command(flatten)]
        device: DeviceArgs,
    },

    /// Show lock bits, RF configuration and chip identity
    Status {
        #[command(flatten)]
        device: DeviceArgs,
    },

    /// Lock a password or bank against RF access
    Lock {
        #[command(flatten)]
        device: DeviceArgs,

        /// What to lock
        #[arg(value_enum)]
        target: LockTarget,

        /// Make the lock permanent
        #[arg(long)]
        perm: bool,
    },

    /// Unlock a password or bank
    Unlock {
        #[command(flatten)]
        device: DeviceArgs,

        /// What to unlock
        #[arg(value_enum)]
        target: LockTarget,

        /// Permanently freeze the unlocked state
        #[arg(long)]
        perm: bool,
    },

    /// Kill the tag (reversible over the wired interface)
    Kill {
        #[command(flatten)]
        device: DeviceArgs,
    },

    /// Revive a killed tag
    Unkill {
        #[command(flatten)]
        device: DeviceArgs,
    },

    /// Toggle an RF interface feature
    Rf {
        #[command(flatten)]
        device: DeviceArgs,

        /// Feature to toggle
        #[arg(value_enum)]
        feature: RfFeature,

        /// New state
        #[arg(value_enum)]
        state: Switch,
    },

    /// Permalock one block of user memory
    BlockPermalock {
        #[command(flatten)]
        device: DeviceArgs,

        /// Block number
        block: u8,
    },

    /// Unlock block 0 of user memory
    BlockUnlock {
        #[command(flatten)]
        device: DeviceArgs,

        /// Block number (only 0 can be unlocked)
        #[arg(default_value = "0")]
        block: u8,
    },

    /// Program a new I2C device address into the chip
    SetDeviceId {
        #[command(flatten)]
        device: DeviceArgs,

        /// New device address (0x68, 0x6A, 0x6C or 0x6E)
        #[arg(value_parser = parse_hex_u8)]
        new_id: u8,
    },

    /// Permanently lock the I2C device address (8 KiB model only)
    LockDeviceId {
        #[command(flatten)]
        device: DeviceArgs,
    },

    /// Store an access or kill password
    SetPassword {
        #[command(flatten)]
        device: DeviceArgs,

        /// Which password to store
        #[arg(value_enum)]
        kind: PasswordKind,

        /// 32-bit password value
        #[arg(value_parser = parse_hex_u32)]
        password: u32,
    },

    /// List available programmers
    ListProgrammers,
}
