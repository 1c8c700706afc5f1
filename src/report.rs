//! Hand-off of the final outcome to whatever presents it.

use crate::outcome::{Category, TestOutcome};
use crate::profile::ChipType;

/// Presents a verdict. Implemented by the display, LED or log front end.
pub trait Reporter {
    fn on_success(&mut self, chip: ChipType);

    fn on_self_check_passed(&mut self);

    fn on_failure(&mut self, category: Category, detail: u8, row: Option<u16>, col: Option<u16>);
}

/// Deliver `outcome` to `reporter`, exactly one callback.
pub fn report<R: Reporter + ?Sized>(outcome: &TestOutcome, reporter: &mut R) {
    match outcome {
        TestOutcome::Success(chip) => reporter.on_success(*chip),
        TestOutcome::SelfCheckPassed => reporter.on_self_check_passed(),
        TestOutcome::Failure(f) => {
            reporter.on_failure(f.category(), f.detail_code(), f.row(), f.col())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::outcome::Failure;
    use crate::patterns::TestPattern;

    #[derive(Default)]
    struct Recorder {
        success: Option<ChipType>,
        self_checks: u32,
        failures: u32,
        last: Option<(Category, u8, Option<u16>, Option<u16>)>,
    }

    impl Reporter for Recorder {
        fn on_success(&mut self, chip: ChipType) {
            self.success = Some(chip);
        }

        fn on_self_check_passed(&mut self) {
            self.self_checks += 1;
        }

        fn on_failure(&mut self, category: Category, detail: u8, row: Option<u16>, col: Option<u16>) {
            self.failures += 1;
            self.last = Some((category, detail, row, col));
        }
    }

    #[test]
    fn success_reports_chip() {
        let mut r = Recorder::default();
        report(&TestOutcome::Success(ChipType::Dram41256), &mut r);
        assert_eq!(r.success, Some(ChipType::Dram41256));
        assert_eq!(r.failures, 0);
    }

    #[test]
    fn failure_reports_location() {
        let mut r = Recorder::default();
        let outcome = TestOutcome::Failure(Failure::Retention {
            pass: TestPattern::Random2,
            row: 9,
            col: 300,
        });
        report(&outcome, &mut r);
        assert_eq!(r.success, None);
        assert_eq!(r.failures, 1);
        assert_eq!(r.last, Some((Category::Retention, 5, Some(9), Some(300))));
    }

    #[test]
    fn self_check_has_its_own_callback() {
        let mut r = Recorder::default();
        report(&TestOutcome::SelfCheckPassed, &mut r);
        assert_eq!(r.self_checks, 1);
        assert_eq!(r.success, None);
        assert_eq!(r.failures, 0);
    }
}
