//! Failure taxonomy and the terminal outcome of a test run.

use core::fmt;

use heapless::String;
use ufmt::uwrite;

use crate::patterns::TestPattern;
use crate::profile::ChipType;

/// Reported failure class.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Category {
    NoDevice,
    GroundShort,
    Configuration,
    AddressLine,
    PatternMismatch,
    Retention,
    /// Two socket pins follow each other during the self-check.
    PinShort,
}

/// Address-line detail codes at or above this value are column lines.
pub const COLUMN_LINE_BASE: u8 = 16;

/// Detail code of a refresh-counter failure.
pub const REFRESH_COUNTER_CODE: u8 = 6;

/// Why a run stopped. Every variant is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Failure {
    /// Nothing answered the presence probe on any candidate pinout.
    NoDevice,
    /// The mode switches do not select exactly one package family.
    Configuration { switches: u8 },
    /// Package pin `pin` reads low with its pull-up enabled. During the
    /// self-check `pin` is a socket pin.
    GroundShort { pin: u8 },
    /// Driving socket pin `pin` low also pulls socket pin `other` low.
    PinShort { pin: u8, other: u8 },
    /// Address lines that alias or stick. `line` is the lowest failing line
    /// code (row bit, or [`COLUMN_LINE_BASE`] + column bit), `failed` holds
    /// every failing code as a bit.
    AddressLine { line: u8, failed: u32 },
    PatternMismatch { pass: TestPattern, row: u16, col: u16 },
    /// Delayed read-back of a random pass disagreed.
    Retention { pass: TestPattern, row: u16, col: u16 },
    /// Data lost while only CAS-before-RAS cycles refreshed the array.
    RefreshCounter { row: u16, col: u16 },
}

impl Failure {
    pub fn category(&self) -> Category {
        match self {
            Self::NoDevice => Category::NoDevice,
            Self::Configuration { .. } => Category::Configuration,
            Self::GroundShort { .. } => Category::GroundShort,
            Self::PinShort { .. } => Category::PinShort,
            Self::AddressLine { .. } => Category::AddressLine,
            Self::PatternMismatch { .. } => Category::PatternMismatch,
            Self::Retention { .. } | Self::RefreshCounter { .. } => Category::Retention,
        }
    }

    pub fn detail_code(&self) -> u8 {
        match *self {
            Self::NoDevice => 0,
            Self::Configuration { switches } => switches,
            Self::GroundShort { pin } | Self::PinShort { pin, .. } => pin,
            Self::AddressLine { line, .. } => line,
            Self::PatternMismatch { pass, .. } | Self::Retention { pass, .. } => pass.index(),
            Self::RefreshCounter { .. } => REFRESH_COUNTER_CODE,
        }
    }

    pub fn row(&self) -> Option<u16> {
        match *self {
            Self::PatternMismatch { row, .. }
            | Self::Retention { row, .. }
            | Self::RefreshCounter { row, .. } => Some(row),
            _ => None,
        }
    }

    pub fn col(&self) -> Option<u16> {
        match *self {
            Self::PatternMismatch { col, .. }
            | Self::Retention { col, .. }
            | Self::RefreshCounter { col, .. } => Some(col),
            _ => None,
        }
    }
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::NoDevice => write!(f, "no device in socket"),
            Self::Configuration { switches } => {
                write!(f, "invalid mode switch setting {:#05b}", switches)
            }
            Self::GroundShort { pin } => write!(f, "pin {} shorted to ground", pin),
            Self::PinShort { pin, other } => {
                write!(f, "socket pins {} and {} shorted", pin, other)
            }
            Self::AddressLine { line, failed } if line >= COLUMN_LINE_BASE => write!(
                f,
                "column address line A{} failed (mask {:#010x})",
                line - COLUMN_LINE_BASE,
                failed
            ),
            Self::AddressLine { line, failed } => {
                write!(f, "row address line A{} failed (mask {:#010x})", line, failed)
            }
            Self::PatternMismatch { pass, row, col } => write!(
                f,
                "pattern {} mismatch at row {}, col {}",
                pass.index(),
                row,
                col
            ),
            Self::Retention { pass, row, col } => write!(
                f,
                "retention lost in pattern {} at row {}, col {}",
                pass.index(),
                row,
                col
            ),
            Self::RefreshCounter { row, col } => {
                write!(f, "refresh counter lost row {}, col {}", row, col)
            }
        }
    }
}

/// Result type of every test stage.
pub type TestResult<T = ()> = Result<T, Failure>;

/// Final verdict of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TestOutcome {
    Success(ChipType),
    /// The tester found no fault in itself.
    SelfCheckPassed,
    Failure(Failure),
}

impl TestOutcome {
    #[inline]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_) | Self::SelfCheckPassed)
    }

    /// One line for a small display or a log, e.g. `OK 4164 64Kx1`.
    pub fn summary(&self) -> String<64> {
        let mut s = String::new();
        match *self {
            Self::Success(chip) => {
                let p = chip.profile();
                let _ = uwrite!(&mut s, "OK {} {}", p.name, p.geometry);
            }
            Self::SelfCheckPassed => {
                let _ = uwrite!(&mut s, "OK self-check");
            }
            Self::Failure(Failure::NoDevice) => {
                let _ = uwrite!(&mut s, "FAIL no device");
            }
            Self::Failure(Failure::Configuration { switches }) => {
                let _ = uwrite!(&mut s, "FAIL config {}", switches);
            }
            Self::Failure(Failure::GroundShort { pin }) => {
                let _ = uwrite!(&mut s, "FAIL short pin {}", pin);
            }
            Self::Failure(Failure::PinShort { pin, other }) => {
                let _ = uwrite!(&mut s, "FAIL short pins {} {}", pin, other);
            }
            Self::Failure(Failure::AddressLine { line, .. }) if line >= COLUMN_LINE_BASE => {
                let _ = uwrite!(&mut s, "FAIL col A{}", line - COLUMN_LINE_BASE);
            }
            Self::Failure(Failure::AddressLine { line, .. }) => {
                let _ = uwrite!(&mut s, "FAIL row A{}", line);
            }
            Self::Failure(Failure::PatternMismatch { pass, row, col }) => {
                let _ = uwrite!(
                    &mut s,
                    "FAIL pattern {} row {} col {}",
                    pass.index(),
                    row,
                    col
                );
            }
            Self::Failure(Failure::Retention { pass, row, col }) => {
                let _ = uwrite!(
                    &mut s,
                    "FAIL retention {} row {} col {}",
                    pass.index(),
                    row,
                    col
                );
            }
            Self::Failure(Failure::RefreshCounter { row, col }) => {
                let _ = uwrite!(&mut s, "FAIL refresh row {} col {}", row, col);
            }
        }
        s
    }
}

impl From<Failure> for TestOutcome {
    fn from(f: Failure) -> Self {
        Self::Failure(f)
    }
}

impl From<TestResult<ChipType>> for TestOutcome {
    fn from(r: TestResult<ChipType>) -> Self {
        match r {
            Ok(chip) => Self::Success(chip),
            Err(f) => Self::Failure(f),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::string::ToString;

    use super::*;

    #[test]
    fn categories_and_codes() {
        let f = Failure::PatternMismatch {
            pass: TestPattern::AllZero,
            row: 5,
            col: 17,
        };
        assert_eq!(f.category(), Category::PatternMismatch);
        assert_eq!(f.detail_code(), 0);
        assert_eq!(f.row(), Some(5));
        assert_eq!(f.col(), Some(17));

        let f = Failure::RefreshCounter { row: 3, col: 1 };
        assert_eq!(f.category(), Category::Retention);
        assert_eq!(f.detail_code(), REFRESH_COUNTER_CODE);

        let f = Failure::AddressLine {
            line: 6,
            failed: 1 << 6,
        };
        assert_eq!(f.category(), Category::AddressLine);
        assert_eq!(f.detail_code(), 6);
        assert_eq!(f.row(), None);

        assert_eq!(Failure::GroundShort { pin: 12 }.detail_code(), 12);

        let f = Failure::PinShort { pin: 3, other: 17 };
        assert_eq!(f.category(), Category::PinShort);
        assert_eq!(f.detail_code(), 3);
        assert_eq!(f.row(), None);
    }

    #[test]
    fn summaries() {
        assert_eq!(
            TestOutcome::Success(ChipType::Dram4164).summary().as_str(),
            "OK 4164 64Kx1"
        );
        let f = TestOutcome::Failure(Failure::PatternMismatch {
            pass: TestPattern::AllZero,
            row: 5,
            col: 17,
        });
        assert_eq!(f.summary().as_str(), "FAIL pattern 0 row 5 col 17");
        let f = TestOutcome::Failure(Failure::AddressLine {
            line: COLUMN_LINE_BASE + 2,
            failed: 1 << 18,
        });
        assert_eq!(f.summary().as_str(), "FAIL col A2");
        let f = TestOutcome::Failure(Failure::PinShort { pin: 3, other: 17 });
        assert_eq!(f.summary().as_str(), "FAIL short pins 3 17");
        assert_eq!(TestOutcome::SelfCheckPassed.summary().as_str(), "OK self-check");
        assert!(TestOutcome::SelfCheckPassed.is_success());
    }

    #[test]
    fn display() {
        let f = Failure::AddressLine {
            line: 6,
            failed: 1 << 6,
        };
        assert_eq!(
            f.to_string(),
            "row address line A6 failed (mask 0x00000040)"
        );
        assert_eq!(
            Failure::Configuration { switches: 3 }.to_string(),
            "invalid mode switch setting 0b011"
        );
    }
}
