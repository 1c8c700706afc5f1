//! Variant detection from socket response alone.
//!
//! Every family starts with a presence probe. After that each probe is an
//! address-aliasing or access-mode experiment that removes candidates:
//! a marker written with one high address bit set that shows up at address
//! 0 means that line is not wired on this part.

use crate::access::DramOps;
use crate::config::PackageFamily;
use crate::hal::{Control, DramBus};
use crate::outcome::{Failure, TestResult};
use crate::pinmap::Pinout;
use crate::profile::ChipType;
use crate::session::TestSession;

/// Identify the part in the socket and record it in the session.
pub fn detect<B: DramBus>(session: &mut TestSession<B>) -> TestResult<ChipType> {
    if let Some(chip) = session.detected() {
        return Ok(chip);
    }

    let config = *session.config();
    let bus = session.bus_mut();
    let chip = match config.family {
        PackageFamily::Pin16 if config.adapter => detect_adapter(bus),
        PackageFamily::Pin16 => detect_16pin(bus),
        PackageFamily::Pin18 => detect_18pin(bus),
        PackageFamily::Pin20 => detect_20pin(bus),
    }?;

    info!("detected {} ({})", chip.name(), chip.profile().geometry);
    session.set_detected(chip);
    Ok(chip)
}

/// Wire the socket for `pinout`, wake the part up and check that it stores
/// both polarities at row 0, column 0.
pub fn is_present<B: DramBus>(bus: &mut B, pinout: Pinout) -> bool {
    let mask = pinout.data_mask();
    bus.select_pinout(pinout);
    bus.wake_up();

    for marker in [0x05 & mask, 0x0A & mask] {
        bus.write_cell(0, 0, marker);
        if bus.read_cell(0, 0) & mask != marker {
            debug!("no response on {}", pinout);
            return false;
        }
    }
    true
}

/// Write 0 to `base` and all-ones to `probe`, then report whether `base`
/// picked up the probe marker. Coordinates are raw (row, column) bus values.
pub fn aliases<B: DramBus>(bus: &mut B, mask: u8, base: (u16, u16), probe: (u16, u16)) -> bool {
    bus.write_cell(base.0, base.1, 0);
    bus.write_cell(probe.0, probe.1, mask);
    bus.read_cell(base.0, base.1) & mask != 0
}

fn detect_16pin<B: DramBus>(bus: &mut B) -> TestResult<ChipType> {
    if !is_present(bus, Pinout::Dip16) {
        return Err(Failure::NoDevice);
    }

    let chip = if !aliases(bus, 1, (0, 0), (1 << 8, 0)) {
        if has_nibble_mode(bus) {
            ChipType::Dram41257
        } else {
            ChipType::Dram41256
        }
    } else if aliases(bus, 1, (0, 0), (1 << 7, 0)) {
        if aliases(bus, 1, (0, 0), (0, 1 << 7)) {
            ChipType::Dram4816
        } else {
            ChipType::Dram4532
        }
    } else {
        ChipType::Dram4164
    };
    Ok(chip)
}

/// Four CAS toggles under one RAS write 1,0,1,0. A nibble-mode part spreads
/// them over four cells, a page-mode part overwrites one cell four times.
fn has_nibble_mode<B: DramBus>(bus: &mut B) -> bool {
    const NIBBLE: [u8; 4] = [1, 0, 1, 0];

    bus.open_row(0);
    for bit in NIBBLE {
        bus.write_column(0, bit);
    }
    bus.close_row();

    bus.open_row(0);
    let mut matches = true;
    for bit in NIBBLE {
        matches &= bus.read_column(0) & 1 == bit;
    }
    bus.close_row();

    matches
}

fn detect_18pin<B: DramBus>(bus: &mut B) -> TestResult<ChipType> {
    if is_present(bus, Pinout::Dip18x4) {
        // the 16Kx4 part decodes columns on A1..A6
        let small = aliases(bus, 0x0F, (0, 0), (0, 1)) || aliases(bus, 0x0F, (0, 0), (0, 1 << 7));
        return Ok(if small {
            ChipType::Dram4416
        } else {
            ChipType::Dram4464
        });
    }

    if is_present(bus, Pinout::Dip18x1) {
        return Ok(ChipType::Dram411000);
    }

    Err(Failure::NoDevice)
}

fn detect_20pin<B: DramBus>(bus: &mut B) -> TestResult<ChipType> {
    if !is_present(bus, Pinout::Dip20) {
        return Err(Failure::NoDevice);
    }

    let large = !aliases(bus, 0x0F, (0, 0), (1 << 9, 0));
    let chip = match (large, has_static_column(bus)) {
        (false, false) => ChipType::Dram514256,
        (false, true) => ChipType::Dram514258,
        (true, false) => ChipType::Dram514400,
        (true, true) => ChipType::Dram514402,
    };
    Ok(chip)
}

/// Fill four columns with their own index, then walk the column address with
/// CAS held low. Only a static-column part follows the address.
fn has_static_column<B: DramBus>(bus: &mut B) -> bool {
    const COLUMNS: [u16; 4] = [0, 5, 10, 15];

    bus.open_row(0);
    for col in COLUMNS {
        bus.write_column(col, col as u8);
    }
    bus.close_row();

    bus.open_row(0);
    bus.set_address(COLUMNS[0]);
    bus.assert(Control::Oe);
    bus.assert(Control::Cas);
    let mut follows = true;
    for col in COLUMNS {
        bus.set_address(col);
        follows &= bus.read_data() & 0x0F == col as u8;
    }
    bus.deassert(Control::Cas);
    bus.deassert(Control::Oe);
    bus.close_row();

    follows
}

/// 4116 and 4027 share the adapter pinout, except that pin 13 is A6 on the
/// 4116 and chip select on the 4027. With A6 high a 4027 ignores the access
/// and the data line floats high.
fn detect_adapter<B: DramBus>(bus: &mut B) -> TestResult<ChipType> {
    if !is_present(bus, Pinout::Adapter) {
        return Err(Failure::NoDevice);
    }

    bus.write_cell(1 << 6, 1 << 6, 1);
    bus.write_cell(1 << 6, (1 << 6) + 1, 0);
    let high = bus.read_cell(1 << 6, 1 << 6) & 1;
    let low = bus.read_cell(1 << 6, (1 << 6) + 1) & 1;

    Ok(if high == 1 && low == 0 {
        ChipType::Dram4116
    } else {
        ChipType::Dram4027
    })
}
