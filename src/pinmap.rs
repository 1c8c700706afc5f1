//! Declarative socket pin-maps and the address permutation derived from them.
//!
//! Each [`Pinout`] is a table of what every package pin does. [`BusLayout`]
//! turns that table plus the board's socket wiring into GPIO masks once, so
//! putting an address on the bus is two table lookups and an OR.

use PinFunction::*;

/// Role of a single package pin.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PinFunction {
    /// Multiplexed address line `An`.
    Address(u8),
    /// Bidirectional data line `DQn` (0-based).
    Data(u8),
    /// Data into the DRAM on x1 parts.
    DataIn,
    /// Data out of the DRAM on x1 parts.
    DataOut,
    Ras,
    Cas,
    We,
    Oe,
    /// Power or ground, never sampled or driven.
    Supply,
    NoConnect,
}

/// Package pinouts the socket can be wired for.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Pinout {
    /// 4164, 41256, 41257, 4816, 4532
    Dip16,
    /// 4416, 4464
    Dip18x4,
    /// 411000
    Dip18x1,
    /// 514256, 514258, 514400, 514402
    Dip20,
    /// 4116 and 4027 through the supply adapter
    Adapter,
}

#[rustfmt::skip]
const DIP16: [PinFunction; 16] = [
    Address(8), DataIn, We, Ras, Address(0), Address(2), Address(1), Supply,
    Address(7), Address(5), Address(4), Address(3), Address(6), DataOut, Cas, Supply,
];

// Pin 13 is A6 on the 4116 and chip select on the 4027.
#[rustfmt::skip]
const ADAPTER: [PinFunction; 16] = [
    Supply, DataIn, We, Ras, Address(0), Address(2), Address(1), Supply,
    Supply, Address(5), Address(4), Address(3), Address(6), DataOut, Cas, Supply,
];

#[rustfmt::skip]
const DIP18X4: [PinFunction; 18] = [
    Oe, Data(0), Data(1), We, Ras, Address(6), Address(5), Address(4), Supply,
    Address(7), Address(3), Address(2), Address(1), Address(0), Data(2), Cas, Data(3), Supply,
];

#[rustfmt::skip]
const DIP18X1: [PinFunction; 18] = [
    DataIn, We, Ras, NoConnect, Address(0), Address(1), Address(2), Address(3), Supply,
    Address(4), Address(5), Address(6), Address(7), Address(8), Address(9), Cas, DataOut, Supply,
];

#[rustfmt::skip]
const DIP20: [PinFunction; 20] = [
    Data(0), Data(1), We, Ras, Address(9), Address(0), Address(1), Address(2), Address(3), Supply,
    Address(4), Address(5), Address(6), Address(7), Address(8), Oe, Cas, Data(2), Data(3), Supply,
];

impl Pinout {
    pub fn pins(self) -> &'static [PinFunction] {
        match self {
            Pinout::Dip16 => &DIP16,
            Pinout::Dip18x4 => &DIP18X4,
            Pinout::Dip18x1 => &DIP18X1,
            Pinout::Dip20 => &DIP20,
            Pinout::Adapter => &ADAPTER,
        }
    }

    /// Data bits per access on parts using this pinout.
    #[inline]
    pub fn io_width(self) -> u8 {
        match self {
            Pinout::Dip18x4 | Pinout::Dip20 => 4,
            Pinout::Dip16 | Pinout::Dip18x1 | Pinout::Adapter => 1,
        }
    }

    #[inline]
    pub fn data_mask(self) -> u8 {
        if self.io_width() == 4 {
            0x0F
        } else {
            0x01
        }
    }

    #[inline]
    pub fn pin_count(self) -> u8 {
        self.pins().len() as u8
    }

    /// Mask of package pins that carry signals (bit `n - 1` is pin `n`).
    pub fn signal_pins(self) -> u32 {
        self.pins()
            .iter()
            .enumerate()
            .filter(|(_, f)| !matches!(f, Supply))
            .fold(0, |acc, (i, _)| acc | 1 << i)
    }
}

pub const SOCKET_PINS: usize = 20;

/// Which GPIO each pin of the 20-pin ZIF socket is wired to.
///
/// Smaller packages sit top-aligned: pins 1..=n/2 use the same socket
/// positions, the opposite row shifts down to end at socket pin 20.
#[derive(Clone, Copy, Debug)]
pub struct SocketWiring {
    pub gpio: [u8; SOCKET_PINS],
}

impl SocketWiring {
    /// Socket pin `n` on GPIO `first + n - 1`.
    pub const fn linear(first: u8) -> Self {
        let mut gpio = [0; SOCKET_PINS];
        let mut i = 0;
        while i < SOCKET_PINS {
            gpio[i] = first + i as u8;
            i += 1;
        }
        Self { gpio }
    }

    /// Socket position of 1-based package pin `pin` on an `count`-pin package.
    pub fn socket_pin(count: u8, pin: u8) -> u8 {
        if pin <= count / 2 {
            pin
        } else {
            pin + (SOCKET_PINS as u8 - count)
        }
    }

    pub fn gpio_of(&self, count: u8, pin: u8) -> u8 {
        self.gpio[Self::socket_pin(count, pin) as usize - 1]
    }

    /// Every socket GPIO.
    pub fn gpio_mask(&self) -> u32 {
        self.gpio.iter().fold(0, |acc, g| acc | 1 << g)
    }

    /// Convert GPIO bank levels to socket pin levels (bit `n - 1` is pin `n`).
    pub fn socket_levels(&self, levels: u32) -> u32 {
        self.gpio
            .iter()
            .enumerate()
            .filter(|(_, g)| levels & (1 << **g) != 0)
            .fold(0, |acc, (i, _)| acc | 1 << i)
    }
}

/// GPIO masks for one pinout, computed once per [`Pinout`] selection.
#[derive(Clone, Debug)]
pub struct BusLayout {
    pinout: Pinout,
    addr_lo: [u32; 32],
    addr_hi: [u32; 32],
    addr_mask: u32,
    data_out: [u32; 16],
    data_drive_mask: u32,
    /// Bidirectional lines, released before every read.
    data_io_mask: u32,
    data_in: [Option<u8>; 4],
    ras: u32,
    cas: u32,
    we: u32,
    oe: u32,
    pin_gpio: [u8; SOCKET_PINS],
    pin_count: u8,
}

impl BusLayout {
    pub fn new(pinout: Pinout, wiring: &SocketWiring) -> Self {
        let count = pinout.pin_count();
        let mut layout = Self {
            pinout,
            addr_lo: [0; 32],
            addr_hi: [0; 32],
            addr_mask: 0,
            data_out: [0; 16],
            data_drive_mask: 0,
            data_io_mask: 0,
            data_in: [None; 4],
            ras: 0,
            cas: 0,
            we: 0,
            oe: 0,
            pin_gpio: [0; SOCKET_PINS],
            pin_count: count,
        };

        let mut addr_line = [0u32; 10];
        let mut data_line = [0u32; 4];

        for (i, function) in pinout.pins().iter().enumerate() {
            let gpio = wiring.gpio_of(count, i as u8 + 1);
            let bit = 1u32 << gpio;
            layout.pin_gpio[i] = gpio;

            match *function {
                Address(n) if (n as usize) < addr_line.len() => addr_line[n as usize] |= bit,
                Data(n) if n < 4 => {
                    data_line[n as usize] |= bit;
                    layout.data_io_mask |= bit;
                    layout.data_in[n as usize] = Some(gpio);
                }
                DataIn => data_line[0] |= bit,
                DataOut => layout.data_in[0] = Some(gpio),
                Ras => layout.ras |= bit,
                Cas => layout.cas |= bit,
                We => layout.we |= bit,
                Oe => layout.oe |= bit,
                _ => {}
            }
        }

        for v in 0..32 {
            for b in 0..5 {
                if v & (1 << b) != 0 {
                    layout.addr_lo[v] |= addr_line[b];
                    layout.addr_hi[v] |= addr_line[b + 5];
                }
            }
        }
        layout.addr_mask = addr_line.iter().fold(0, |acc, m| acc | m);

        for v in 0..16 {
            for (b, line) in data_line.iter().enumerate() {
                if v & (1 << b) != 0 {
                    layout.data_out[v] |= line;
                }
            }
        }
        layout.data_drive_mask = data_line.iter().fold(0, |acc, m| acc | m);

        layout
    }

    #[inline]
    pub fn pinout(&self) -> Pinout {
        self.pinout
    }

    /// GPIO levels presenting `addr` on the address lines.
    #[inline(always)]
    pub fn address_bits(&self, addr: u16) -> u32 {
        self.addr_lo[(addr & 0x1F) as usize] | self.addr_hi[((addr >> 5) & 0x1F) as usize]
    }

    #[inline]
    pub fn address_mask(&self) -> u32 {
        self.addr_mask
    }

    /// GPIO levels presenting the low nibble of `value` on the data-in lines.
    #[inline(always)]
    pub fn data_bits(&self, value: u8) -> u32 {
        self.data_out[(value & 0x0F) as usize]
    }

    #[inline]
    pub fn data_drive_mask(&self) -> u32 {
        self.data_drive_mask
    }

    #[inline]
    pub fn data_io_mask(&self) -> u32 {
        self.data_io_mask
    }

    /// Data value read from the bank levels. Lines the part does not have
    /// read as 1.
    pub fn data_from_levels(&self, levels: u32) -> u8 {
        self.data_in
            .iter()
            .enumerate()
            .fold(0xFF, |acc, (bit, gpio)| match gpio {
                Some(g) if levels & (1 << g) == 0 => acc & !(1 << bit),
                _ => acc,
            })
    }

    pub fn control_mask(&self, line: crate::hal::Control) -> u32 {
        use crate::hal::Control;
        match line {
            Control::Ras => self.ras,
            Control::Cas => self.cas,
            Control::We => self.we,
            Control::Oe => self.oe,
        }
    }

    #[inline]
    pub fn controls_mask(&self) -> u32 {
        self.ras | self.cas | self.we | self.oe
    }

    /// Lines that stay outputs for as long as this layout is selected.
    pub fn output_mask(&self) -> u32 {
        self.addr_mask | self.controls_mask() | (self.data_drive_mask & !self.data_io_mask)
    }

    /// Every GPIO touched by the package.
    pub fn all_pins_mask(&self) -> u32 {
        self.pin_gpio[..self.pin_count as usize]
            .iter()
            .fold(0, |acc, g| acc | 1 << g)
    }

    /// Convert GPIO bank levels to package pin levels (bit `n - 1` is pin `n`).
    pub fn package_levels(&self, levels: u32) -> u32 {
        self.pin_gpio[..self.pin_count as usize]
            .iter()
            .enumerate()
            .fold(0, |acc, (i, g)| {
                if levels & (1 << g) != 0 {
                    acc | 1 << i
                } else {
                    acc
                }
            })
    }
}
