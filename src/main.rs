#![no_std]
#![no_main]

use defmt::*;
use defmt_rtt as _;
use panic_probe as _;
use rp_pico as board;

use board::{
    entry,
    hal::{self, pac, prelude::*},
};
use dram_tester::{
    outcome::Category, pinmap::SocketWiring, report, self_check::run_self_check, ChipType,
    GpioBus, Mode, Reporter, TestOutcome, TestSession,
};
use embedded_hal::digital::{InputPin, OutputPin};

mod delay;
mod port;

const SYSTEM_FREQ: u32 = 125_000_000;

type Timings = dram_tester::timings::Dram150Ns;

/// ZIF socket pin n on GPIO n - 1.
const SOCKET: SocketWiring = SocketWiring::linear(0);
const SOCKET_MASK: u32 = (1 << 20) - 1;

#[entry]
fn main() -> ! {
    let mut pac = pac::Peripherals::take().unwrap();
    let mut watchdog = hal::Watchdog::new(pac.WATCHDOG);

    let clocks = hal::clocks::init_clocks_and_plls(
        board::XOSC_CRYSTAL_FREQ,
        pac.XOSC,
        pac.CLOCKS,
        pac.PLL_SYS,
        pac.PLL_USB,
        &mut pac.RESETS,
        &mut watchdog,
    )
    .ok()
    .unwrap();

    let core = pac::CorePeripherals::take().unwrap();
    let mut delay = cortex_m::delay::Delay::new(core.SYST, clocks.system_clock.freq().to_Hz());

    // let voltage rails settle before touching the socket
    delay.delay_ms(500);

    let sio = hal::Sio::new(pac.SIO);
    let pins = board::Pins::new(
        pac.IO_BANK0,
        pac.PADS_BANK0,
        sio.gpio_bank0,
        &mut pac.RESETS,
    );

    let led = pins.led.into_push_pull_output();

    // mode switches and adapter sense, active low
    let mut sw16 = pins.gpio20.into_pull_up_input();
    let mut sw18 = pins.gpio21.into_pull_up_input();
    let mut sw20 = pins.gpio22.into_pull_up_input();
    let mut adapter = pins.gpio26.into_pull_up_input();
    delay.delay_us(100);

    let switches = u8::from(sw16.is_low().unwrap())
        | u8::from(sw18.is_low().unwrap()) << 1
        | u8::from(sw20.is_low().unwrap()) << 2;
    let adapter = adapter.is_low().unwrap();
    info!("mode switches {=u8:b}, adapter {}", switches, adapter);

    // the socket pins are only ever touched through the port from here on
    let port = unsafe { port::SioPort::new(SOCKET_MASK) };
    let mut bus: GpioBus<_, _, Timings> =
        GpioBus::new(port, delay::CycleDelay::<SYSTEM_FREQ>, SOCKET);

    let outcome = match Mode::from_switches(switches, adapter) {
        Ok(Mode::Test(config)) => TestSession::new(bus, config).run(),
        Ok(Mode::SelfCheck) => run_self_check(&mut bus),
        Err(failure) => TestOutcome::Failure(failure),
    };
    info!("{=str}", outcome.summary().as_str());

    let mut indicator = LedIndicator {
        led,
        delay,
        period_ms: 0,
    };
    report(&outcome, &mut indicator);
    indicator.show_forever()
}

/// Solid LED on success, blinking on failure.
struct LedIndicator<L> {
    led: L,
    delay: cortex_m::delay::Delay,
    period_ms: u32,
}

impl<L: OutputPin> LedIndicator<L> {
    fn show_forever(mut self) -> ! {
        if self.period_ms == 0 {
            self.led.set_high().ok();
            loop {
                cortex_m::asm::wfi();
            }
        }
        loop {
            self.led.set_high().ok();
            self.delay.delay_ms(self.period_ms);
            self.led.set_low().ok();
            self.delay.delay_ms(self.period_ms);
        }
    }
}

impl<L: OutputPin> Reporter for LedIndicator<L> {
    fn on_success(&mut self, chip: ChipType) {
        let p = chip.profile();
        info!("PASS {=str} {=str}", p.name, p.geometry);
        self.period_ms = 0;
    }

    fn on_self_check_passed(&mut self) {
        info!("self-check OK");
        self.period_ms = 0;
    }

    fn on_failure(&mut self, category: Category, detail: u8, row: Option<u16>, col: Option<u16>) {
        error!(
            "FAIL {} code {} row {} col {}",
            category, detail, row, col
        );
        self.period_ms = match category {
            Category::NoDevice => 500,
            Category::Configuration => 50,
            _ => 150,
        };
    }
}
