//! Per-run context threaded through every test stage.

use crate::address::verify_address_lines;
use crate::config::TesterConfig;
use crate::detect::detect;
use crate::ground_short::check_ground_shorts;
use crate::hal::{DramBus, PinSampler};
use crate::outcome::{Failure, TestOutcome, TestResult};
use crate::pattern::run_patterns;
use crate::patterns::RandomTable;
use crate::profile::{ChipType, DeviceProfile};
use crate::refresh::check_refresh_counter;

/// Progress counters, mostly for logging.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SessionStats {
    pub passes_completed: u8,
    /// Row write bursts issued by the pattern passes.
    pub rows_written: u32,
    /// Delayed read-backs issued by the retention schedule.
    pub retention_checks: u32,
}

/// Owns the socket bus for one power cycle.
///
/// The detected variant is set once and the outcome is final: a second
/// [`run`](Self::run) returns the stored outcome without touching the bus.
pub struct TestSession<B> {
    bus: B,
    config: TesterConfig,
    detected: Option<ChipType>,
    random: RandomTable,
    stats: SessionStats,
    outcome: Option<TestOutcome>,
}

impl<B: DramBus> TestSession<B> {
    pub fn new(bus: B, config: TesterConfig) -> Self {
        Self {
            bus,
            config,
            detected: None,
            random: RandomTable::generate(),
            stats: SessionStats::default(),
            outcome: None,
        }
    }

    #[inline]
    pub fn config(&self) -> &TesterConfig {
        &self.config
    }

    #[inline]
    pub fn detected(&self) -> Option<ChipType> {
        self.detected
    }

    /// Profile of the detected part, `NoDevice` before detection succeeded.
    pub fn profile(&self) -> TestResult<&'static DeviceProfile> {
        self.detected.map(ChipType::profile).ok_or(Failure::NoDevice)
    }

    #[inline]
    pub fn stats(&self) -> &SessionStats {
        &self.stats
    }

    #[inline]
    pub fn outcome(&self) -> Option<TestOutcome> {
        self.outcome
    }

    #[inline]
    pub fn bus_mut(&mut self) -> &mut B {
        &mut self.bus
    }

    #[inline]
    pub fn random_table(&self) -> &RandomTable {
        &self.random
    }

    pub(crate) fn set_detected(&mut self, chip: ChipType) {
        debug_assert!(self.detected.is_none(), "variant detected twice");
        if self.detected.is_none() {
            self.detected = Some(chip);
        }
    }

    pub(crate) fn random_table_mut(&mut self) -> &mut RandomTable {
        &mut self.random
    }

    pub(crate) fn stats_mut(&mut self) -> &mut SessionStats {
        &mut self.stats
    }

    /// Split borrow for the stages that read the table while driving the bus.
    pub(crate) fn parts(&mut self) -> (&mut B, &RandomTable, &mut SessionStats) {
        (&mut self.bus, &self.random, &mut self.stats)
    }
}

impl<B: DramBus + PinSampler> TestSession<B> {
    /// Run every stage in order and return the verdict.
    pub fn run(&mut self) -> TestOutcome {
        if let Some(outcome) = self.outcome {
            return outcome;
        }

        let outcome = TestOutcome::from(self.run_stages());
        match outcome {
            TestOutcome::Failure(failure) => warn!("test failed: {}", failure),
            _ => info!("test passed: {}", outcome.summary().as_str()),
        }
        self.outcome = Some(outcome);
        outcome
    }

    fn run_stages(&mut self) -> TestResult<ChipType> {
        check_ground_shorts(self)?;
        let chip = detect(self)?;
        verify_address_lines(self)?;
        run_patterns(self)?;
        if self.config.refresh_counter_test && chip.profile().has_refresh_counter_test() {
            check_refresh_counter(self)?;
        }
        Ok(chip)
    }
}
