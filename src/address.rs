//! Independent check of every multiplexed row and column address line.
//!
//! One-bit-difference test: a marker at address 0 must survive a write to
//! the address that differs only in the line under test. This finds stuck
//! and aliased lines, not coupled decoder faults. Every line is tested even
//! after a failure so all bad lines are reported together.

use crate::access::DramOps;
use crate::hal::DramBus;
use crate::outcome::{Failure, TestResult, COLUMN_LINE_BASE};
use crate::session::TestSession;

pub fn verify_address_lines<B: DramBus>(session: &mut TestSession<B>) -> TestResult {
    let profile = session.profile()?;
    let mask = profile.data_mask();
    let bus = session.bus_mut();
    let mut failed = 0u32;

    for bit in 0..profile.row_bits() {
        if !distinct(bus, mask, (0, 0), (1 << bit, 0)) {
            warn!("row address line A{} failed", bit);
            failed |= 1 << bit;
        }
    }

    // Away from row 0 so the column markers cannot mask a row fault.
    let row = profile.rows / 2;
    let base = profile.column_address(0);
    for bit in 0..profile.col_bits() {
        if !distinct(bus, mask, (row, base), (row, profile.column_address(1 << bit))) {
            warn!("column address line A{} failed", bit);
            failed |= 1 << (COLUMN_LINE_BASE + bit);
        }
    }

    if failed != 0 {
        return Err(Failure::AddressLine {
            line: failed.trailing_zeros() as u8,
            failed,
        });
    }
    debug!(
        "{} row and {} column lines ok",
        profile.row_bits(),
        profile.col_bits()
    );
    Ok(())
}

/// Write 0 to `base`, all-ones to `probe` and require both to read back.
fn distinct<B: DramBus>(bus: &mut B, mask: u8, base: (u16, u16), probe: (u16, u16)) -> bool {
    bus.write_cell(base.0, base.1, 0);
    bus.write_cell(probe.0, probe.1, mask);
    let at_base = bus.read_cell(base.0, base.1) & mask;
    let at_probe = bus.read_cell(probe.0, probe.1) & mask;
    at_base == 0 && at_probe == mask
}
