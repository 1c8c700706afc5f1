//! Simulated DRAM shared across integration tests.
//!
//! `SimDram` implements the bus traits with a virtual nanosecond clock. Every
//! bus call costs `OP_NS`, `delay_us` advances the clock. A row that goes
//! longer than its retention time without a RAS cycle discharges to zero.
//!
//! The test binaries also get a counting critical-section implementation,
//! so `SimDram` can see which rows each interrupt-free burst touched.
#![allow(dead_code)]

use std::cell::Cell;

use dram_tester::hal::{Control, DramBus, PinSampler};
use dram_tester::pinmap::{Pinout, SocketWiring, SOCKET_PINS};
use dram_tester::ChipType;

thread_local! {
    static SECTION_DEPTH: Cell<u32> = const { Cell::new(0) };
    static SECTIONS_ENTERED: Cell<u64> = const { Cell::new(0) };
}

struct CountingSection;
critical_section::set_impl!(CountingSection);

unsafe impl critical_section::Impl for CountingSection {
    unsafe fn acquire() -> critical_section::RawRestoreState {
        SECTION_DEPTH.with(|depth| {
            if depth.get() == 0 {
                SECTIONS_ENTERED.with(|n| n.set(n.get() + 1));
            }
            depth.set(depth.get() + 1);
        });
    }

    unsafe fn release(_: critical_section::RawRestoreState) {
        SECTION_DEPTH.with(|depth| depth.set(depth.get() - 1));
    }
}

/// Outermost critical sections entered on this thread so far.
pub fn sections_entered() -> u64 {
    SECTIONS_ENTERED.with(Cell::get)
}

fn in_section() -> bool {
    SECTION_DEPTH.with(Cell::get) > 0
}

pub const OP_NS: u64 = 10;

/// Real parts hold data far longer than their rated retention.
pub const GOOD_RETENTION_MS: u64 = 64;

pub struct SimDram {
    chip: Option<ChipType>,
    pinout: Pinout,
    selected: Option<Pinout>,
    rows: usize,
    cols: usize,
    mask: u8,
    column_shift: u8,
    static_column: bool,
    nibble_mode: bool,
    chip_select_a6: bool,
    refresh_cycles: usize,

    cells: Vec<u8>,
    last_restore: Vec<u64>,
    retention_ns: u64,
    weak_rows: Vec<(usize, u64)>,
    now_ns: u64,

    address: u16,
    data_in: u8,
    ras: bool,
    cas: bool,
    we: bool,
    oe: bool,
    open_row: Option<usize>,
    column: usize,
    nibble_step: Option<u8>,
    deselected: bool,

    stuck: Vec<(usize, usize, u8)>,
    open_address_lines: u16,
    grounded_pins: u32,
    /// Socket pin pairs bridged on the board.
    bridged_pins: Vec<(u8, u8)>,
    cbr_counter: usize,
    cbr_works: bool,

    /// Highest row opened since the last `clear_trace`.
    pub highest_row_opened: Option<u16>,
    pub ras_cycles: u64,
    pub cbr_cycles: u64,
    pub cas_cycles: u64,
    /// RAS opened inside a critical section on a row other than the one
    /// that section already opened.
    pub rows_crossed_in_section: bool,
    section_row: Option<(u64, usize)>,
}

impl SimDram {
    pub fn new(chip: ChipType) -> Self {
        let p = chip.profile();
        let rows = p.rows as usize;
        let cols = p.cols as usize;
        Self {
            chip: Some(chip),
            pinout: p.pinout,
            selected: None,
            rows,
            cols,
            mask: p.data_mask(),
            column_shift: p.column_shift,
            static_column: p.is_static_column(),
            nibble_mode: p.is_nibble_mode(),
            chip_select_a6: chip == ChipType::Dram4027,
            refresh_cycles: if p.refresh_cycles == 0 {
                rows
            } else {
                p.refresh_cycles as usize
            },
            cells: vec![0; rows * cols],
            last_restore: vec![0; rows],
            retention_ns: GOOD_RETENTION_MS * 1_000_000,
            weak_rows: Vec::new(),
            now_ns: 0,
            address: 0,
            data_in: 0,
            ras: false,
            cas: false,
            we: false,
            oe: false,
            open_row: None,
            column: 0,
            nibble_step: None,
            deselected: false,
            stuck: Vec::new(),
            open_address_lines: 0,
            grounded_pins: 0,
            bridged_pins: Vec::new(),
            cbr_counter: 0,
            cbr_works: true,
            highest_row_opened: None,
            ras_cycles: 0,
            cbr_cycles: 0,
            cas_cycles: 0,
            rows_crossed_in_section: false,
            section_row: None,
        }
    }

    /// Nothing in the socket.
    pub fn empty(pinout: Pinout) -> Self {
        let mut sim = Self::new(ChipType::Dram4164);
        sim.chip = None;
        sim.pinout = pinout;
        sim
    }

    pub fn with_retention_ms(mut self, ms: u64) -> Self {
        self.retention_ns = ms * 1_000_000;
        self
    }

    /// Only `row` loses its data after `ms`.
    pub fn with_weak_row(mut self, row: u16, ms: u64) -> Self {
        self.weak_rows.push((row as usize, ms * 1_000_000));
        self
    }

    pub fn with_stuck_cell(mut self, row: u16, col: u16, value: u8) -> Self {
        self.stuck.push((row as usize, col as usize, value & self.mask));
        self
    }

    /// Address line `bit` is not connected and always reads low.
    pub fn with_open_address_line(mut self, bit: u8) -> Self {
        self.open_address_lines |= 1 << bit;
        self
    }

    /// Package pin `pin` (1-based) is bridged to ground.
    pub fn with_ground_short(mut self, pin: u8) -> Self {
        self.grounded_pins |= 1 << (pin - 1);
        self
    }

    /// Socket pins `a` and `b` (1-based) are bridged.
    pub fn with_bridged_pins(mut self, a: u8, b: u8) -> Self {
        self.bridged_pins.push((a, b));
        self
    }

    /// CBR cycles no longer refresh anything.
    pub fn with_broken_refresh_counter(mut self) -> Self {
        self.cbr_works = false;
        self
    }

    pub fn now_ns(&self) -> u64 {
        self.now_ns
    }

    pub fn clear_trace(&mut self) {
        self.highest_row_opened = None;
        self.ras_cycles = 0;
        self.cbr_cycles = 0;
        self.cas_cycles = 0;
        self.rows_crossed_in_section = false;
    }

    pub fn cell(&self, row: u16, col: u16) -> u8 {
        self.load(row as usize, col as usize)
    }

    fn responsive(&self) -> bool {
        self.chip.is_some() && self.selected == Some(self.pinout)
    }

    fn tick(&mut self) {
        self.now_ns += OP_NS;
    }

    fn decode_row(&self) -> usize {
        self.address as usize & (self.rows - 1)
    }

    fn decode_col(&self) -> usize {
        (self.address as usize >> self.column_shift) & (self.cols - 1)
    }

    fn load(&self, row: usize, col: usize) -> u8 {
        if let Some(&(_, _, v)) = self.stuck.iter().find(|s| s.0 == row && s.1 == col) {
            return v;
        }
        self.cells[row * self.cols + col]
    }

    fn store(&mut self, row: usize, col: usize, value: u8) {
        self.cells[row * self.cols + col] = value & self.mask;
    }

    /// Cell selected by the current strobe state.
    fn selected_cell(&self) -> Option<(usize, usize)> {
        let row = self.open_row?;
        let col = if self.static_column {
            self.decode_col()
        } else {
            self.column
        };
        match self.nibble_step {
            Some(step) if self.nibble_mode => {
                let start = ((row >> 8) & 1) << 1 | ((col >> 8) & 1);
                let nib = (start + step as usize) & 3;
                Some((
                    (row & 0xFF) | ((nib >> 1) & 1) << 8,
                    (col & 0xFF) | (nib & 1) << 8,
                ))
            }
            _ => Some((row, col)),
        }
    }

    fn restore(&mut self, row: usize) {
        let retention = self
            .weak_rows
            .iter()
            .find(|w| w.0 == row)
            .map_or(self.retention_ns, |w| w.1);
        if self.now_ns - self.last_restore[row] > retention {
            let start = row * self.cols;
            self.cells[start..start + self.cols].fill(0);
        }
        self.last_restore[row] = self.now_ns;
    }

    fn track_section(&mut self, row: usize) {
        if !in_section() {
            return;
        }
        let section = sections_entered();
        match self.section_row {
            Some((id, opened)) if id == section && opened != row => {
                self.rows_crossed_in_section = true;
            }
            _ => self.section_row = Some((section, row)),
        }
    }

    fn cbr_refresh(&mut self) {
        self.cbr_cycles += 1;
        if self.cbr_works {
            let slot = self.cbr_counter % self.refresh_cycles;
            for row in (slot..self.rows).step_by(self.refresh_cycles) {
                self.restore(row);
            }
        }
        self.cbr_counter = self.cbr_counter.wrapping_add(1);
    }
}

impl DramBus for SimDram {
    fn select_pinout(&mut self, pinout: Pinout) {
        self.tick();
        self.selected = Some(pinout);
        self.ras = false;
        self.cas = false;
        self.we = false;
        self.oe = false;
        self.open_row = None;
        self.nibble_step = None;
    }

    fn set_address(&mut self, addr: u16) {
        self.tick();
        self.address = addr & !self.open_address_lines;
    }

    fn set_data(&mut self, value: u8) {
        self.tick();
        self.data_in = value;
    }

    fn assert(&mut self, line: Control) {
        self.tick();
        if !self.responsive() {
            return;
        }
        match line {
            Control::Ras if self.cas => {
                self.ras = true;
                self.cbr_refresh();
            }
            Control::Ras => {
                let row = self.decode_row();
                self.ras = true;
                self.ras_cycles += 1;
                self.open_row = Some(row);
                self.nibble_step = None;
                self.highest_row_opened = self.highest_row_opened.max(Some(row as u16));
                self.track_section(row);
                self.restore(row);
            }
            Control::Cas => {
                self.cas = true;
                self.cas_cycles += 1;
                if self.open_row.is_none() {
                    return;
                }
                self.nibble_step = Some(match self.nibble_step {
                    Some(step) if self.nibble_mode => step.wrapping_add(1),
                    Some(_) | None => 0,
                });
                if self.nibble_step == Some(0) || !self.nibble_mode {
                    self.column = self.decode_col();
                    self.deselected = self.chip_select_a6 && self.address & (1 << 6) != 0;
                }
                if self.we && !self.deselected {
                    if let Some((row, col)) = self.selected_cell() {
                        self.store(row, col, self.data_in);
                    }
                }
            }
            Control::We => self.we = true,
            Control::Oe => self.oe = true,
        }
    }

    fn deassert(&mut self, line: Control) {
        self.tick();
        match line {
            Control::Ras => {
                if let Some(row) = self.open_row.take() {
                    self.last_restore[row] = self.now_ns;
                }
                self.ras = false;
                self.nibble_step = None;
            }
            Control::Cas => self.cas = false,
            Control::We => self.we = false,
            Control::Oe => self.oe = false,
        }
    }

    fn read_data(&mut self) -> u8 {
        self.tick();
        if !self.responsive() || !self.cas || self.we || self.deselected {
            return 0xFF;
        }
        match self.selected_cell() {
            Some((row, col)) => self.load(row, col) | !self.mask,
            None => 0xFF,
        }
    }

    fn delay_us(&mut self, us: u32) {
        self.now_ns += u64::from(us) * 1000;
    }
}

impl PinSampler for SimDram {
    fn sample_pulled_up(&mut self) -> u32 {
        self.tick();
        let pins = self.selected.unwrap_or(self.pinout).pin_count();
        ((1u32 << pins) - 1) & !self.grounded_pins
    }

    fn sample_socket(&mut self, drive_low: Option<u8>) -> u32 {
        self.tick();
        let count = self.pinout.pin_count();
        let mut low = (1..=count)
            .filter(|pin| self.grounded_pins & 1 << (pin - 1) != 0)
            .fold(0u32, |acc, pin| {
                acc | 1 << (SocketWiring::socket_pin(count, pin) - 1)
            });
        if let Some(pin) = drive_low {
            low |= 1 << (pin - 1);
            for &(a, b) in &self.bridged_pins {
                if a == pin || b == pin {
                    low |= 1 << (a - 1) | 1 << (b - 1);
                }
            }
        }
        ((1u32 << SOCKET_PINS) - 1) & !low
    }
}
