//! Delayed read-back of the random passes.
//!
//! Instead of sleeping for the retention time after every row, the check of
//! row `n` trails the write sweep by `delay_rows` rows, so the rows written
//! in between share the wait. Bus time is not counted: the waits scheduled
//! between a row's write and its check add up to at least the rated
//! retention on their own, so a fast bus cannot shorten the test. The last
//! `delay_rows` rows have nothing after them and get synthetic write-time
//! gaps instead.

use core::ops::Range;

use fugit::MicrosDurationU32;

use crate::hal::DramBus;
use crate::outcome::TestResult;
use crate::pattern::{check_row, CheckKind};
use crate::patterns::TestPattern;
use crate::profile::DeviceProfile;
use crate::session::TestSession;

/// What to do after writing one row.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RowPlan {
    /// Row whose wait is over.
    pub check: Option<u16>,
    /// Remaining rows, each preceded by `tail_gap`, after the final write.
    pub tail: Range<u16>,
    pub tail_gap: MicrosDurationU32,
    /// Wait before the next row is written.
    pub delay: Option<MicrosDurationU32>,
}

impl RowPlan {
    /// Rows read back by this plan, in order.
    pub fn checks(&self) -> impl Iterator<Item = u16> + '_ {
        self.check.into_iter().chain(self.tail.clone())
    }
}

#[derive(Clone, Debug)]
pub struct RetentionSchedule {
    rows: u16,
    delay_rows: u16,
    /// Wait after the write at each sweep position, the steady state at
    /// index `delay_rows`.
    gaps: [MicrosDurationU32; 6],
    write_time: MicrosDurationU32,
}

impl RetentionSchedule {
    pub fn new(profile: &DeviceProfile) -> Self {
        let max_lag = profile.delays_us.len() as u16 - 1;
        let delay_rows = u16::from(profile.delay_rows)
            .min(max_lag)
            .min(profile.rows.saturating_sub(1));

        // each of the `delay_rows` gaps carries its share of the retention time
        let share_us = match delay_rows {
            0 => 0,
            lag => profile.retention().to_micros().div_ceil(u32::from(lag)),
        };
        let mut gaps = [MicrosDurationU32::micros(0); 6];
        for (index, gap) in gaps.iter_mut().enumerate() {
            let table_us = profile.row_delay(index).to_micros();
            *gap = MicrosDurationU32::micros(table_us.max(share_us));
        }

        Self {
            rows: profile.rows,
            delay_rows,
            gaps,
            write_time: profile.write_time(),
        }
    }

    #[inline]
    pub fn delay_rows(&self) -> u16 {
        self.delay_rows
    }

    #[inline]
    fn gap(&self, index: u16) -> MicrosDurationU32 {
        self.gaps[usize::from(index.min(self.delay_rows))]
    }

    /// Plan following the write of `row`; rows must be written in ascending
    /// order starting at 0.
    pub fn after_write(&self, row: u16) -> RowPlan {
        let lag = self.delay_rows;
        let steady = self.gap(lag);
        let last = self.rows - 1;

        if row < lag {
            return RowPlan {
                check: None,
                tail: 0..0,
                tail_gap: steady,
                delay: Some(self.gap(row)),
            };
        }

        if row == last {
            RowPlan {
                check: Some(row - lag),
                tail: (row - lag + 1)..self.rows,
                tail_gap: self.write_time + steady,
                delay: None,
            }
        } else {
            RowPlan {
                check: Some(row - lag),
                tail: 0..0,
                tail_gap: steady,
                delay: Some(steady),
            }
        }
    }
}

/// Execute the plan for `row` of a random pass.
pub(crate) fn after_row_written<B: DramBus>(
    session: &mut TestSession<B>,
    profile: &DeviceProfile,
    schedule: &RetentionSchedule,
    pattern: TestPattern,
    row: u16,
) -> TestResult {
    let plan = schedule.after_write(row);

    if let Some(r) = plan.check {
        verify(session, profile, pattern, r)?;
    }
    for r in plan.tail.clone() {
        session.bus_mut().delay_us(plan.tail_gap.to_micros());
        verify(session, profile, pattern, r)?;
    }
    if let Some(d) = plan.delay {
        session.bus_mut().delay_us(d.to_micros());
    }
    Ok(())
}

fn verify<B: DramBus>(
    session: &mut TestSession<B>,
    profile: &DeviceProfile,
    pattern: TestPattern,
    row: u16,
) -> TestResult {
    trace!("retention check row {}", row);
    session.stats_mut().retention_checks += 1;
    check_row(session, profile, pattern, row, CheckKind::Retention)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::{ChipType, PROFILES};

    fn check_counts(schedule: &RetentionSchedule, rows: u16) -> std::vec::Vec<u32> {
        let mut counts = std::vec![0u32; rows as usize];
        for row in 0..rows {
            for r in schedule.after_write(row).checks() {
                counts[r as usize] += 1;
            }
        }
        counts
    }

    #[test]
    fn every_row_checked_once() {
        for p in PROFILES.iter() {
            let schedule = RetentionSchedule::new(p);
            let counts = check_counts(&schedule, p.rows);
            assert!(counts.iter().all(|&c| c == 1), "{}", p.name);
        }
    }

    #[test]
    fn boundary_rows_with_one_row_lag() {
        // 256 rows, one row of lag
        let schedule = RetentionSchedule::new(ChipType::Dram4464.profile());
        assert_eq!(schedule.delay_rows(), 1);
        let counts = check_counts(&schedule, 256);
        assert_eq!(counts[0], 1);
        assert_eq!(counts[255], 1);
    }

    #[test]
    fn checks_trail_writes() {
        let schedule = RetentionSchedule::new(ChipType::Dram4164.profile());
        for row in 0..256u16 {
            for r in schedule.after_write(row).checks() {
                assert!(r <= row);
            }
        }
    }

    #[test]
    fn early_rows_only_wait() {
        let p = ChipType::Dram4164.profile();
        let schedule = RetentionSchedule::new(p);
        // 4 ms over two rows of lag
        let plan = schedule.after_write(0);
        assert_eq!(plan.check, None);
        assert_eq!(plan.delay, Some(MicrosDurationU32::micros(2000)));
        let plan = schedule.after_write(1);
        assert_eq!(plan.delay, Some(MicrosDurationU32::micros(2000)));
        let plan = schedule.after_write(2);
        assert_eq!(plan.check, Some(0));
        assert_eq!(plan.delay, Some(MicrosDurationU32::micros(2000)));
    }

    #[test]
    fn last_row_walks_back() {
        let p = ChipType::Dram4164.profile();
        let schedule = RetentionSchedule::new(p);
        let plan = schedule.after_write(255);
        assert_eq!(plan.check, Some(253));
        assert_eq!(plan.tail, 254..256);
        assert_eq!(plan.tail_gap, MicrosDurationU32::micros(780 + 2000));
        assert_eq!(plan.delay, None);
    }

    #[test]
    fn waits_alone_cover_retention() {
        // time advances only through scheduled waits, as on an infinitely fast bus
        for p in PROFILES.iter() {
            let schedule = RetentionSchedule::new(p);
            let retention = p.retention().to_micros() as u64;
            let mut written_at = std::vec![0u64; p.rows as usize];
            let mut now = 0u64;

            for row in 0..p.rows {
                written_at[row as usize] = now;
                let plan = schedule.after_write(row);
                if let Some(r) = plan.check {
                    assert!(now - written_at[r as usize] >= retention, "{} row {}", p.name, r);
                }
                for r in plan.tail.clone() {
                    now += u64::from(plan.tail_gap.to_micros());
                    assert!(now - written_at[r as usize] >= retention, "{} row {}", p.name, r);
                }
                if let Some(d) = plan.delay {
                    now += u64::from(d.to_micros());
                }
            }
        }
    }

    #[test]
    fn zero_lag_checks_immediately() {
        let mut schedule = RetentionSchedule::new(ChipType::Dram4164.profile());
        schedule.delay_rows = 0;
        let plan = schedule.after_write(10);
        assert_eq!(plan.check, Some(10));
        let plan = schedule.after_write(255);
        assert_eq!(plan.checks().count(), 1);
    }
}
