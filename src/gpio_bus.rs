//! [`DramBus`] on a parallel GPIO bank.
//!
//! All address lines change with one masked write so the part never sees a
//! half-updated address. Strobe edges are followed by the datasheet margins
//! of the selected speed grade.

use core::marker::PhantomData;

use embedded_hal::delay::DelayNs;

use crate::hal::{Control, DramBus, ParallelPort, PinSampler};
use crate::pinmap::{BusLayout, Pinout, SocketWiring};
use crate::timings::DramTimingConfig;

/// Pull-up settle time before sampling for shorts.
const PULL_UP_SETTLE_US: u32 = 10;

pub struct GpioBus<P, D, T> {
    port: P,
    delay: D,
    wiring: SocketWiring,
    layout: BusLayout,
    driving_data: bool,
    _timing: PhantomData<T>,
}

impl<P, D, T> GpioBus<P, D, T>
where
    P: ParallelPort,
    D: DelayNs,
    T: DramTimingConfig,
{
    pub fn new(port: P, delay: D, wiring: SocketWiring) -> Self {
        let mut bus = Self {
            port,
            delay,
            wiring,
            layout: BusLayout::new(Pinout::Dip16, &wiring),
            driving_data: false,
            _timing: PhantomData,
        };
        bus.release_all();
        bus
    }

    #[inline]
    pub fn layout(&self) -> &BusLayout {
        &self.layout
    }

    pub fn free(mut self) -> (P, D) {
        self.release_all();
        (self.port, self.delay)
    }

    /// Every socket GPIO to input, pull-ups off.
    fn release_all(&mut self) {
        let all = self.wiring.gpio_mask();
        self.port.set_output(all, false);
        self.port.set_pull_up(all, false);
        self.driving_data = false;
    }

    #[inline(always)]
    fn wait_ns(&mut self, ns: u32) {
        if ns > 0 {
            self.delay.delay_ns(ns);
        }
    }
}

impl<P, D, T> DramBus for GpioBus<P, D, T>
where
    P: ParallelPort,
    D: DelayNs,
    T: DramTimingConfig,
{
    fn select_pinout(&mut self, pinout: Pinout) {
        self.release_all();
        self.layout = BusLayout::new(pinout, &self.wiring);

        // strobes idle high before they become outputs
        let controls = self.layout.controls_mask();
        self.port.write(controls, controls);
        self.port.write(self.layout.address_mask(), 0);
        self.port.set_output(self.layout.output_mask(), true);
        trace!("socket wired for {}", pinout);
    }

    #[inline(always)]
    fn set_address(&mut self, addr: u16) {
        let bits = self.layout.address_bits(addr);
        self.port.write(self.layout.address_mask(), bits);
        self.wait_ns(T::T_ASC);
    }

    #[inline(always)]
    fn set_data(&mut self, value: u8) {
        if !self.driving_data {
            self.port.set_output(self.layout.data_io_mask(), true);
            self.driving_data = true;
        }
        let bits = self.layout.data_bits(value);
        self.port.write(self.layout.data_drive_mask(), bits);
    }

    #[inline(always)]
    fn assert(&mut self, line: Control) {
        let mask = self.layout.control_mask(line);
        if line == Control::Oe && self.driving_data {
            // the part must not drive into our outputs
            self.port.set_output(self.layout.data_io_mask(), false);
            self.driving_data = false;
        }
        self.port.write(mask, 0);
        match line {
            Control::Ras => self.wait_ns(T::T_RCD),
            Control::Cas => self.wait_ns(T::T_CAS),
            Control::We | Control::Oe => {}
        }
    }

    #[inline(always)]
    fn deassert(&mut self, line: Control) {
        let mask = self.layout.control_mask(line);
        if line == Control::Ras {
            self.wait_ns(T::T_RAS_REST);
        }
        self.port.write(mask, mask);
        match line {
            Control::Ras => self.wait_ns(T::T_RP),
            Control::Cas => self.wait_ns(T::T_CP),
            Control::We | Control::Oe => {}
        }
    }

    #[inline(always)]
    fn read_data(&mut self) -> u8 {
        if self.driving_data {
            self.port.set_output(self.layout.data_io_mask(), false);
            self.driving_data = false;
        }
        self.wait_ns(T::T_DOUT);
        let levels = self.port.read();
        self.layout.data_from_levels(levels)
    }

    fn delay_us(&mut self, us: u32) {
        self.delay.delay_us(us);
    }
}

impl<P, D, T> PinSampler for GpioBus<P, D, T>
where
    P: ParallelPort,
    D: DelayNs,
    T: DramTimingConfig,
{
    fn sample_pulled_up(&mut self) -> u32 {
        let pinout = self.layout.pinout();
        let pins = self.layout.all_pins_mask();

        self.release_all();
        self.port.set_pull_up(pins, true);
        self.delay.delay_us(PULL_UP_SETTLE_US);
        let levels = self.port.read();
        self.port.set_pull_up(pins, false);

        self.select_pinout(pinout);
        self.layout.package_levels(levels)
    }

    fn sample_socket(&mut self, drive_low: Option<u8>) -> u32 {
        let pinout = self.layout.pinout();
        let all = self.wiring.gpio_mask();
        let driven = drive_low.map_or(0, |pin| 1u32 << self.wiring.gpio[usize::from(pin) - 1]);

        self.release_all();
        self.port.write(driven, 0);
        self.port.set_output(driven, true);
        self.port.set_pull_up(all & !driven, true);
        self.delay.delay_us(PULL_UP_SETTLE_US);
        let levels = self.port.read();
        self.port.set_pull_up(all, false);

        self.select_pinout(pinout);
        self.wiring.socket_levels(levels)
    }
}
