//! The six-pass cell sweep.
//!
//! Rows are visited in ascending order only. The fixed passes verify each
//! column right after writing it, the rotating passes read the row back in a
//! separate burst and the random passes hand verification to the retention
//! schedule. Interrupts are masked for each row burst, never across rows.

use crate::access::DramOps;
use crate::hal::{Control, DramBus};
use crate::outcome::{Failure, TestResult};
use crate::patterns::{RandomTable, TestPattern};
use crate::profile::DeviceProfile;
use crate::retention::{after_row_written, RetentionSchedule};
use crate::session::TestSession;

/// How a read-back mismatch is reported.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CheckKind {
    Pattern,
    Retention,
}

impl CheckKind {
    fn failure(self, pass: TestPattern, row: u16, col: u16) -> Failure {
        match self {
            CheckKind::Pattern => Failure::PatternMismatch { pass, row, col },
            CheckKind::Retention => Failure::Retention { pass, row, col },
        }
    }
}

/// Run all six passes against the detected part.
pub fn run_patterns<B: DramBus>(session: &mut TestSession<B>) -> TestResult {
    let profile = session.profile()?;

    // a previous run may have left the table inverted
    *session.random_table_mut() = RandomTable::generate();

    for pattern in TestPattern::ALL {
        if pattern == TestPattern::Random2 {
            session.random_table_mut().invert();
        }
        run_pass(session, profile, pattern)?;
        session.stats_mut().passes_completed += 1;
    }
    Ok(())
}

/// One pass over every row.
pub fn run_pass<B: DramBus>(
    session: &mut TestSession<B>,
    profile: &DeviceProfile,
    pattern: TestPattern,
) -> TestResult {
    info!("pattern {}: {} rows", pattern.index(), profile.rows);
    let schedule = RetentionSchedule::new(profile);

    for row in 0..profile.rows {
        write_row(session, profile, pattern, row)?;
        session.stats_mut().rows_written += 1;

        if pattern.is_random() {
            session.bus_mut().refresh_row(row);
            after_row_written(session, profile, &schedule, pattern, row)?;
        } else if !pattern.is_inline_verified() {
            check_row(session, profile, pattern, row, CheckKind::Pattern)?;
        }
    }
    Ok(())
}

#[inline(always)]
fn cell_value(
    random: &RandomTable,
    pattern: TestPattern,
    mask: u8,
    row: u16,
    col: u16,
) -> u8 {
    if pattern.is_random() {
        random.expected(row, col) & mask
    } else {
        pattern.column_value(col) & mask
    }
}

/// Write burst for one row, with inline verification on the fixed passes.
fn write_row<B: DramBus>(
    session: &mut TestSession<B>,
    profile: &DeviceProfile,
    pattern: TestPattern,
    row: u16,
) -> TestResult {
    let mask = profile.data_mask();
    let inline = pattern.is_inline_verified();
    let (bus, random, _) = session.parts();

    critical_section::with(|_| {
        if profile.is_nibble_mode() {
            // no page mode, one RAS cycle per cell
            for col in 0..profile.cols {
                let addr = profile.column_address(col);
                let value = cell_value(random, pattern, mask, row, col);
                bus.write_cell(row, addr, value);
                if inline && bus.read_cell(row, addr) & mask != value {
                    return Err(CheckKind::Pattern.failure(pattern, row, col));
                }
            }
            return Ok(());
        }

        bus.open_row(row);
        for col in 0..profile.cols {
            let addr = profile.column_address(col);
            let value = cell_value(random, pattern, mask, row, col);
            bus.write_column(addr, value);
            // an early write keeps the outputs off, read back with a second CAS
            if inline && bus.read_column(addr) & mask != value {
                bus.close_row();
                return Err(CheckKind::Pattern.failure(pattern, row, col));
            }
        }
        bus.close_row();
        Ok(())
    })
}

/// Read burst comparing one row against the pass data. The first
/// mismatching column is reported.
pub(crate) fn check_row<B: DramBus>(
    session: &mut TestSession<B>,
    profile: &DeviceProfile,
    pattern: TestPattern,
    row: u16,
    kind: CheckKind,
) -> TestResult {
    let mask = profile.data_mask();
    let (bus, random, _) = session.parts();

    let mismatch = critical_section::with(|_| {
        if profile.is_nibble_mode() {
            (0..profile.cols).find(|&col| {
                let expected = cell_value(random, pattern, mask, row, col);
                bus.read_cell(row, profile.column_address(col)) & mask != expected
            })
        } else if profile.is_static_column() {
            bus.open_row(row);
            bus.set_address(profile.column_address(0));
            bus.assert(Control::Oe);
            bus.assert(Control::Cas);
            let found = (0..profile.cols).find(|&col| {
                bus.set_address(profile.column_address(col));
                bus.read_data() & mask != cell_value(random, pattern, mask, row, col)
            });
            bus.deassert(Control::Cas);
            bus.deassert(Control::Oe);
            bus.close_row();
            found
        } else {
            bus.open_row(row);
            let found = (0..profile.cols).find(|&col| {
                let expected = cell_value(random, pattern, mask, row, col);
                bus.read_column(profile.column_address(col)) & mask != expected
            });
            bus.close_row();
            found
        }
    });

    match mismatch {
        Some(col) => {
            warn!("pattern {} mismatch row {} col {}", pattern.index(), row, col);
            Err(kind.failure(pattern, row, col))
        }
        None => Ok(()),
    }
}
