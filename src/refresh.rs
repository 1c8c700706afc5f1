//! CAS-before-RAS refresh counter test.
//!
//! A few cells per row are written, then the array is kept alive only by
//! CBR cycles for ten full counter sweeps. A row the internal counter skips
//! loses its data long before the read-back.

use crate::access::DramOps;
use crate::hal::DramBus;
use crate::outcome::{Failure, TestResult};
use crate::patterns::RandomTable;
use crate::profile::DeviceProfile;
use crate::session::TestSession;

/// Full passes of the refresh counter between write and read-back.
pub const COUNTER_SWEEPS: u16 = 10;

/// Spacing of CBR cycles, the standard 15.6 us distributed refresh.
pub const CBR_INTERVAL_US: u32 = 15;

pub fn check_refresh_counter<B: DramBus>(session: &mut TestSession<B>) -> TestResult {
    let profile = session.profile()?;
    if !profile.has_refresh_counter_test() {
        return Ok(());
    }

    info!(
        "refresh counter: {} cycles x {}",
        profile.refresh_cycles,
        COUNTER_SWEEPS
    );
    let (bus, random, _) = session.parts();
    let columns = columns_per_row(profile);

    for row in 0..profile.rows {
        critical_section::with(|_| {
            bus.open_row(row);
            for col in 0..columns {
                let value = expected(random, profile, row, col);
                bus.write_column(profile.column_address(col), value);
            }
            bus.close_row();
        });
        bus.cbr_refresh();
    }

    for _ in 0..COUNTER_SWEEPS {
        for _ in 0..profile.refresh_cycles {
            bus.cbr_refresh();
            bus.delay_us(CBR_INTERVAL_US);
        }
    }

    let mask = profile.data_mask();
    for row in 0..profile.rows {
        let mismatch = critical_section::with(|_| {
            bus.open_row(row);
            let found = (0..columns).find(|&col| {
                bus.read_column(profile.column_address(col)) & mask
                    != expected(random, profile, row, col)
            });
            bus.close_row();
            found
        });
        if let Some(col) = mismatch {
            warn!("refresh counter lost row {} col {}", row, col);
            return Err(Failure::RefreshCounter { row, col });
        }
        bus.cbr_refresh();
    }
    Ok(())
}

fn columns_per_row(profile: &DeviceProfile) -> u16 {
    if profile.io_width == 1 {
        4
    } else {
        2
    }
}

/// One random nibble per row, one bit per column on x1 parts and two
/// overlapping nibbles on x4 parts.
fn expected(random: &RandomTable, profile: &DeviceProfile, row: u16, col: u16) -> u8 {
    let nibble = random.at(row as u8);
    if profile.io_width == 1 {
        (nibble >> col) & 1
    } else {
        (nibble >> (col * 2)) & 0x0F
    }
}
