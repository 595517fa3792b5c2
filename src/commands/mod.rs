//! CLI command implementations
//!
//! Every command works on an open [`TagSession`] over a boxed
//! transport, so the same implementations serve the CP2112 bridge, the
//! Linux i2c-dev adapter and the dummy emulator.

use tagprog_core::{Session, TagTransport};

/// Session over whichever transport the programmer string selected
pub type TagSession = Session<Box<dyn TagTransport + Send>>;

pub mod control;
pub mod epc;
pub mod probe;
pub mod read;
pub mod status;
pub mod write;

/// Print the outcome of a write-class operation.
///
/// A zero count means the tag backed off under RF contention and
/// nothing was changed.
pub fn report_written(n: usize) {
    if n == 0 {
        println!("Tag did not answer (RF reader active?); nothing changed. Try again.");
    } else {
        println!("Done.");
    }
}
