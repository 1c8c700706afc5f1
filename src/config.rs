//! Run configuration from the board's mode switches.

use crate::outcome::{Failure, TestResult};
use crate::pinmap::Pinout;

/// Socket family selected by the mode switches.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PackageFamily {
    Pin16,
    Pin18,
    Pin20,
}

impl PackageFamily {
    /// Decode the three mode switches, bit 0 = 16-pin, bit 1 = 18-pin,
    /// bit 2 = 20-pin. Exactly one must be set.
    pub fn from_switches(switches: u8) -> TestResult<Self> {
        match switches {
            0b001 => Ok(Self::Pin16),
            0b010 => Ok(Self::Pin18),
            0b100 => Ok(Self::Pin20),
            _ => Err(Failure::Configuration { switches }),
        }
    }

    /// Pinout the ground-short scan and first presence probe use.
    pub fn primary_pinout(self, adapter: bool) -> Pinout {
        match self {
            Self::Pin16 if adapter => Pinout::Adapter,
            Self::Pin16 => Pinout::Dip16,
            Self::Pin18 => Pinout::Dip18x4,
            Self::Pin20 => Pinout::Dip20,
        }
    }
}

/// What one run should do.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TesterConfig {
    pub family: PackageFamily,
    /// A 4116/4027 supply adapter sits in the 16-pin position.
    pub adapter: bool,
    /// Exercise the CAS-before-RAS refresh counter on parts that have one.
    pub refresh_counter_test: bool,
}

impl TesterConfig {
    pub fn new(family: PackageFamily) -> Self {
        Self {
            family,
            ..Self::default()
        }
    }

    pub fn from_switches(switches: u8, adapter: bool) -> TestResult<Self> {
        let family = PackageFamily::from_switches(switches)?;
        if adapter && family != PackageFamily::Pin16 {
            return Err(Failure::Configuration { switches });
        }
        Ok(Self {
            family,
            adapter,
            ..Self::default()
        })
    }

    pub fn with_adapter(mut self, adapter: bool) -> Self {
        self.adapter = adapter;
        self
    }

    pub fn with_refresh_counter_test(mut self, enabled: bool) -> Self {
        self.refresh_counter_test = enabled;
        self
    }
}

/// What the board was switched to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mode {
    Test(TesterConfig),
    /// Every mode switch on: check the tester itself with the socket empty.
    SelfCheck,
}

impl Mode {
    pub const SELF_CHECK_SWITCHES: u8 = 0b111;

    pub fn from_switches(switches: u8, adapter: bool) -> TestResult<Self> {
        if switches == Self::SELF_CHECK_SWITCHES {
            return Ok(Self::SelfCheck);
        }
        TesterConfig::from_switches(switches, adapter).map(Self::Test)
    }
}

impl Default for TesterConfig {
    fn default() -> Self {
        Self {
            family: PackageFamily::Pin16,
            adapter: false,
            refresh_counter_test: true,
        }
    }
}
