//! Tester self-check, run with every mode switch on and the socket empty.
//!
//! Each socket pin is driven low in turn while the others are pulled up.
//! Any other pin that follows it is bridged to it on the board or socket.

use crate::hal::PinSampler;
use crate::outcome::{Failure, TestOutcome, TestResult};
use crate::pinmap::SOCKET_PINS;

const ALL_PINS: u32 = (1 << SOCKET_PINS) - 1;

/// Run the self-check and wrap the verdict for the reporter.
pub fn run_self_check<S: PinSampler>(sampler: &mut S) -> TestOutcome {
    match check_socket(sampler) {
        Ok(()) => {
            info!("self-check passed");
            TestOutcome::SelfCheckPassed
        }
        Err(failure) => {
            warn!("self-check failed: {}", failure);
            TestOutcome::Failure(failure)
        }
    }
}

pub fn check_socket<S: PinSampler>(sampler: &mut S) -> TestResult {
    // a pin that is low on its own would look bridged to every driven pin
    if let Some(pin) = lowest_low(sampler.sample_socket(None), 0) {
        return Err(Failure::GroundShort { pin });
    }

    for pin in 1..=SOCKET_PINS as u8 {
        let levels = sampler.sample_socket(Some(pin));
        if let Some(other) = lowest_low(levels, 1 << (pin - 1)) {
            return Err(Failure::PinShort { pin, other });
        }
    }
    debug!("no shorts between {} socket pins", SOCKET_PINS);
    Ok(())
}

/// Lowest socket pin reading low, not counting the pins in `ignore`.
fn lowest_low(levels: u32, ignore: u32) -> Option<u8> {
    let low = !levels & ALL_PINS & !ignore;
    (low != 0).then(|| low.trailing_zeros() as u8 + 1)
}
