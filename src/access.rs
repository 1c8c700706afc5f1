//! DRAM cycles built from bus primitives.
//!
//! Column arguments are raw address-bus values; callers apply the
//! profile's column shift.

use crate::hal::{Control, DramBus};

/// RAS-only cycles a part needs after power-up before it holds data.
pub const WAKE_UP_CYCLES: u16 = 8;

pub trait DramOps: DramBus {
    /// Release all strobes and clock the power-up RAS cycles.
    fn wake_up(&mut self) {
        self.deassert(Control::Cas);
        self.deassert(Control::We);
        self.deassert(Control::Oe);
        self.deassert(Control::Ras);
        for row in 0..WAKE_UP_CYCLES {
            self.refresh_row(row);
        }
    }

    #[inline(always)]
    fn open_row(&mut self, row: u16) {
        self.set_address(row);
        self.assert(Control::Ras);
    }

    #[inline(always)]
    fn close_row(&mut self) {
        self.deassert(Control::Ras);
    }

    /// Early-write one column of the open row.
    #[inline(always)]
    fn write_column(&mut self, col: u16, value: u8) {
        self.set_address(col);
        self.set_data(value);
        self.assert(Control::We);
        self.assert(Control::Cas);
        self.deassert(Control::Cas);
        self.deassert(Control::We);
    }

    /// Page-mode read of one column of the open row.
    #[inline(always)]
    fn read_column(&mut self, col: u16) -> u8 {
        self.set_address(col);
        self.assert(Control::Oe);
        self.assert(Control::Cas);
        let value = self.read_data();
        self.deassert(Control::Cas);
        self.deassert(Control::Oe);
        value
    }

    /// Complete single-access write cycle.
    fn write_cell(&mut self, row: u16, col: u16, value: u8) {
        self.open_row(row);
        self.write_column(col, value);
        self.close_row();
    }

    /// Complete single-access read cycle.
    fn read_cell(&mut self, row: u16, col: u16) -> u8 {
        self.open_row(row);
        let value = self.read_column(col);
        self.close_row();
        value
    }

    /// RAS-only refresh of `row`.
    #[inline(always)]
    fn refresh_row(&mut self, row: u16) {
        self.open_row(row);
        self.close_row();
    }

    /// CAS-before-RAS refresh of the row the part's internal counter points at.
    fn cbr_refresh(&mut self) {
        self.assert(Control::Cas);
        self.assert(Control::Ras);
        self.deassert(Control::Cas);
        self.deassert(Control::Ras);
    }
}

impl<B: DramBus + ?Sized> DramOps for B {}
