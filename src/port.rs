//! The socket GPIOs as one SIO-driven parallel port.

use dram_tester::hal::ParallelPort;
use rp_pico::hal::pac;

/// IO_BANK0 function select for software-controlled IO.
const FUNCSEL_SIO: u8 = 5;

pub struct SioPort {
    sio: pac::SIO,
    pads: pac::PADS_BANK0,
    mask: u32,
}

impl SioPort {
    /// Claim the GPIOs in `mask` for SIO, as inputs without pulls.
    ///
    /// # Safety
    /// No other code may drive the pins in `mask` or the SIO output
    /// registers of those pins afterwards.
    pub unsafe fn new(mask: u32) -> Self {
        // embedded-hal has no way to change several pins at the same instant,
        // so the socket is driven through the SIO registers directly.
        let p = pac::Peripherals::steal();

        for n in (0..30).filter(|n| mask & (1 << n) != 0) {
            p.PADS_BANK0.gpio(n).modify(|_, w| {
                w.ie().set_bit();
                w.od().clear_bit();
                w.pue().clear_bit();
                w.pde().clear_bit()
            });
            p.IO_BANK0
                .gpio(n)
                .gpio_ctrl()
                .write(|w| w.funcsel().bits(FUNCSEL_SIO));
        }
        p.SIO.gpio_oe_clr().write(|w| w.bits(mask));

        Self {
            sio: p.SIO,
            pads: p.PADS_BANK0,
            mask,
        }
    }
}

impl ParallelPort for SioPort {
    #[inline(always)]
    fn write(&mut self, mask: u32, bits: u32) {
        let mask = mask & self.mask;
        let current = self.sio.gpio_out().read().bits();
        // one XOR write flips exactly the pins that change
        self.sio
            .gpio_out_xor()
            .write(|w| unsafe { w.bits((current ^ bits) & mask) });
    }

    #[inline(always)]
    fn read(&mut self) -> u32 {
        self.sio.gpio_in().read().bits()
    }

    fn set_output(&mut self, mask: u32, output: bool) {
        let mask = mask & self.mask;
        if output {
            self.sio.gpio_oe_set().write(|w| unsafe { w.bits(mask) });
        } else {
            self.sio.gpio_oe_clr().write(|w| unsafe { w.bits(mask) });
        }
    }

    fn set_pull_up(&mut self, mask: u32, enabled: bool) {
        let mask = mask & self.mask;
        for n in (0..30).filter(|n| mask & (1 << n) != 0) {
            self.pads.gpio(n).modify(|_, w| w.pue().bit(enabled));
        }
    }
}
