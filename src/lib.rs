//! Bench tester for legacy asynchronous DRAM (16, 18 and 20-pin DIP parts).
//!
//! The chip is driven pin by pin through a [`hal::DramBus`]. One
//! [`TestSession`] walks the fixed stage order:
//!
//! 1. ground-short scan of the socket
//! 2. variant detection by probing and address aliasing
//! 3. row and column address line check
//! 4. six pattern passes, the last two with delayed retention read-back
//! 5. CAS-before-RAS refresh counter check where the part has one
//!
//! and ends in a [`TestOutcome`]. Any failure ends the run.
//!
//! With every mode switch on, [`self_check`] scans the empty socket for
//! shorts between pins instead.

#![cfg_attr(not(test), no_std)]

// must come first so the log macros are visible everywhere
mod fmt;

pub mod access;
pub mod address;
pub mod config;
pub mod detect;
pub mod ground_short;
pub mod gpio_bus;
pub mod hal;
pub mod outcome;
pub mod pattern;
pub mod patterns;
pub mod pinmap;
pub mod profile;
pub mod refresh;
pub mod report;
pub mod retention;
pub mod self_check;
pub mod session;
pub mod timings;

pub use config::{Mode, PackageFamily, TesterConfig};
pub use gpio_bus::GpioBus;
pub use outcome::{Category, Failure, TestOutcome, TestResult};
pub use profile::{ChipType, DeviceProfile};
pub use report::{report, Reporter};
pub use session::TestSession;
