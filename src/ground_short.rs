//! Pin-to-ground short detection, run before any chip is driven.

use crate::hal::{DramBus, PinSampler};
use crate::outcome::{Failure, TestResult};
use crate::pinmap::Pinout;
use crate::session::TestSession;

/// Sample every signal pin of the configured package with pull-ups on.
/// The lowest-numbered pin that reads low is reported.
pub fn check_ground_shorts<B>(session: &mut TestSession<B>) -> TestResult
where
    B: DramBus + PinSampler,
{
    let config = *session.config();
    let pinout = config.family.primary_pinout(config.adapter);

    let bus = session.bus_mut();
    bus.select_pinout(pinout);
    let levels = bus.sample_pulled_up();

    find_short(pinout, levels)
}

/// Check sampled package levels (bit `n - 1` = pin `n`).
pub fn find_short(pinout: Pinout, levels: u32) -> TestResult {
    let low = pinout.signal_pins() & !levels;
    if low == 0 {
        debug!("no ground shorts on {}", pinout);
        return Ok(());
    }

    let pin = low.trailing_zeros() as u8 + 1;
    warn!("pin {} reads low with pull-up", pin);
    Err(Failure::GroundShort { pin })
}
