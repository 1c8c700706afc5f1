//! Capabilities the test flow needs from the hardware.
//!
//! The core never touches registers. A backend only has to drive the
//! multiplexed address bus, the data lines and the four active-low strobes,
//! sample the data lines and wait. Every call must complete in a bounded,
//! short time; the retention schedule only counts its own waits, so a slow
//! bus lengthens the retention test instead of weakening it.

use crate::pinmap::Pinout;

/// Active-low DRAM control strobe.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Control {
    Ras,
    Cas,
    We,
    Oe,
}

/// Bit-level access to a DRAM socket.
pub trait DramBus {
    /// Rewire the socket for `pinout`. All strobes end up deasserted.
    fn select_pinout(&mut self, pinout: Pinout);

    /// Put `addr` on the multiplexed address lines.
    fn set_address(&mut self, addr: u16);

    /// Drive the data-in lines with the low bits of `value`.
    fn set_data(&mut self, value: u8);

    /// Pull a strobe low.
    fn assert(&mut self, line: Control);

    /// Release a strobe (high).
    fn deassert(&mut self, line: Control);

    /// Release the data lines and sample them. Undriven lines read as 1.
    fn read_data(&mut self) -> u8;

    fn delay_us(&mut self, us: u32);
}

/// Pin level sampling used by the ground-short check and the self-check.
pub trait PinSampler {
    /// Enable pull-ups on every socket pin, drive none of them and return
    /// the sampled levels: bit `n - 1` is package pin `n`, set when high.
    fn sample_pulled_up(&mut self) -> u32;

    /// Same in ZIF socket coordinates, independent of the selected pinout.
    /// With `drive_low = Some(n)` socket pin `n` is driven low while every
    /// other socket pin is pulled up. Bit `n - 1` is socket pin `n`.
    fn sample_socket(&mut self, drive_low: Option<u8>) -> u32;
}

/// A bank of GPIOs that can be written and read in one operation.
///
/// Masks are in GPIO-number space, bit `n` is GPIO `n`.
pub trait ParallelPort {
    /// Set the output level of the pins in `mask` to the matching bits of
    /// `bits`, all at the same instant.
    fn write(&mut self, mask: u32, bits: u32);

    /// Input levels of the whole bank.
    fn read(&mut self) -> u32;

    fn set_output(&mut self, mask: u32, output: bool);

    fn set_pull_up(&mut self, mask: u32, enabled: bool);
}
