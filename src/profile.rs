//! Per-variant device parameters.
//!
//! Every supported part is described by one [`DeviceProfile`] entry in a
//! compiled-in table. Adding a variant means adding a [`ChipType`] and a
//! table row; nothing else in the test flow is part specific beyond the
//! probes in [`crate::detect`].

use bitflags::bitflags;
use fugit::{MicrosDurationU32, MillisDurationU32};

use crate::pinmap::Pinout;

/// A DRAM variant the tester can identify.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ChipType {
    Dram4164,
    Dram41256,
    Dram41257,
    Dram4816,
    Dram4532,
    Dram4416,
    Dram4464,
    Dram411000,
    Dram514256,
    Dram514258,
    Dram514400,
    Dram514402,
    Dram4116,
    Dram4027,
}

impl ChipType {
    pub const ALL: [ChipType; 14] = [
        ChipType::Dram4164,
        ChipType::Dram41256,
        ChipType::Dram41257,
        ChipType::Dram4816,
        ChipType::Dram4532,
        ChipType::Dram4416,
        ChipType::Dram4464,
        ChipType::Dram411000,
        ChipType::Dram514256,
        ChipType::Dram514258,
        ChipType::Dram514400,
        ChipType::Dram514402,
        ChipType::Dram4116,
        ChipType::Dram4027,
    ];

    #[inline]
    pub fn profile(self) -> &'static DeviceProfile {
        &PROFILES[self as usize]
    }

    #[inline]
    pub fn name(self) -> &'static str {
        self.profile().name
    }
}

impl core::fmt::Display for ChipType {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let p = self.profile();
        write!(f, "{} ({})", p.name, p.geometry)
    }
}

bitflags! {
    /// Access-mode and classification flags of a variant.
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct ProfileFlags: u8 {
        /// Column address may change while CAS stays low.
        const STATIC_COLUMN = 1 << 0;
        /// Consecutive CAS toggles walk a 4-bit nibble; page mode is unavailable.
        const NIBBLE_MODE = 1 << 1;
        /// Smaller member of a family that shares the pinout with a larger part.
        const SMALL_TYPE = 1 << 2;
    }
}

/// Immutable per-variant parameters.
#[derive(Debug)]
pub struct DeviceProfile {
    pub chip: ChipType,
    pub name: &'static str,
    /// Organization as printed in reports, e.g. `64Kx1`.
    pub geometry: &'static str,
    /// Minimum charge retention the part must show.
    pub retention_ms: u32,
    /// How many rows the retention read-back trails the write sweep.
    pub delay_rows: u8,
    pub rows: u16,
    pub cols: u16,
    /// Data bits per cell access, 1 or 4.
    pub io_width: u8,
    /// Left shift applied to a column index before it goes on the address bus.
    pub column_shift: u8,
    pub flags: ProfileFlags,
    /// Minimum wait after each row write; entry `delay_rows` is the steady state.
    pub delays_us: [u32; 6],
    /// Time a row write is assumed to take when no further rows follow.
    pub write_time_us: u32,
    /// CAS-before-RAS cycles covering the whole array, 0 if the refresh
    /// counter is not exercised on this part.
    pub refresh_cycles: u16,
    pub pinout: Pinout,
}

impl DeviceProfile {
    #[inline]
    pub fn row_bits(&self) -> u8 {
        self.rows.trailing_zeros() as u8
    }

    #[inline]
    pub fn col_bits(&self) -> u8 {
        self.cols.trailing_zeros() as u8
    }

    /// Mask of the data lines this part drives.
    #[inline]
    pub fn data_mask(&self) -> u8 {
        ((1u16 << self.io_width) - 1) as u8
    }

    /// Address bus value selecting column `col`.
    #[inline]
    pub fn column_address(&self, col: u16) -> u16 {
        col << self.column_shift
    }

    #[inline]
    pub fn is_static_column(&self) -> bool {
        self.flags.contains(ProfileFlags::STATIC_COLUMN)
    }

    #[inline]
    pub fn is_nibble_mode(&self) -> bool {
        self.flags.contains(ProfileFlags::NIBBLE_MODE)
    }

    #[inline]
    pub fn has_refresh_counter_test(&self) -> bool {
        self.refresh_cycles != 0
    }

    pub fn retention(&self) -> MillisDurationU32 {
        MillisDurationU32::millis(self.retention_ms)
    }

    /// Minimum wait after writing the row at sweep position `index`.
    pub fn row_delay(&self, index: usize) -> MicrosDurationU32 {
        let idx = index.min(self.delay_rows as usize).min(self.delays_us.len() - 1);
        MicrosDurationU32::micros(self.delays_us[idx])
    }

    pub fn write_time(&self) -> MicrosDurationU32 {
        MicrosDurationU32::micros(self.write_time_us)
    }
}

const fn x1(
    chip: ChipType,
    name: &'static str,
    geometry: &'static str,
    retention_ms: u32,
    delay_rows: u8,
    rows: u16,
    cols: u16,
    flags: ProfileFlags,
    delays_us: [u32; 6],
    write_time_us: u32,
    pinout: Pinout,
) -> DeviceProfile {
    DeviceProfile {
        chip,
        name,
        geometry,
        retention_ms,
        delay_rows,
        rows,
        cols,
        io_width: 1,
        column_shift: 0,
        flags,
        delays_us,
        write_time_us,
        refresh_cycles: 0,
        pinout,
    }
}

const fn x4(
    chip: ChipType,
    name: &'static str,
    geometry: &'static str,
    retention_ms: u32,
    delay_rows: u8,
    rows: u16,
    cols: u16,
    flags: ProfileFlags,
    delays_us: [u32; 6],
    write_time_us: u32,
    pinout: Pinout,
) -> DeviceProfile {
    DeviceProfile {
        io_width: 4,
        ..x1(
            chip,
            name,
            geometry,
            retention_ms,
            delay_rows,
            rows,
            cols,
            flags,
            delays_us,
            write_time_us,
            pinout,
        )
    }
}

const NONE: ProfileFlags = ProfileFlags::empty();
const SMALL: ProfileFlags = ProfileFlags::SMALL_TYPE;

/// Indexed by `ChipType as usize`.
pub static PROFILES: [DeviceProfile; 14] = [
    x1(
        ChipType::Dram4164,
        "4164",
        "64Kx1",
        4,
        2,
        256,
        256,
        SMALL,
        [1240, 1220, 400, 400, 400, 400],
        780,
        Pinout::Dip16,
    ),
    DeviceProfile {
        refresh_cycles: 256,
        ..x1(
            ChipType::Dram41256,
            "41256",
            "256Kx1",
            4,
            1,
            512,
            512,
            NONE,
            [2500, 820, 820, 820, 820, 820],
            1500,
            Pinout::Dip16,
        )
    },
    x1(
        ChipType::Dram41257,
        "41257",
        "256Kx1",
        4,
        1,
        512,
        512,
        ProfileFlags::NIBBLE_MODE,
        [2500, 820, 820, 820, 820, 820],
        1500,
        Pinout::Dip16,
    ),
    x1(
        ChipType::Dram4816,
        "4816",
        "16Kx1",
        2,
        2,
        128,
        128,
        NONE,
        [600, 600, 140, 140, 140, 140],
        480,
        Pinout::Dip16,
    ),
    x1(
        ChipType::Dram4532,
        "4532",
        "32Kx1",
        2,
        1,
        128,
        256,
        SMALL,
        [1080, 100, 100, 100, 100, 100],
        1000,
        Pinout::Dip16,
    ),
    DeviceProfile {
        column_shift: 1,
        ..x4(
            ChipType::Dram4416,
            "4416",
            "16Kx4",
            4,
            4,
            256,
            64,
            SMALL,
            [600, 600, 600, 600, 220, 220],
            420,
            Pinout::Dip18x4,
        )
    },
    DeviceProfile {
        refresh_cycles: 256,
        ..x4(
            ChipType::Dram4464,
            "4464",
            "64Kx4",
            4,
            1,
            256,
            256,
            NONE,
            [2440, 960, 960, 960, 960, 960],
            1540,
            Pinout::Dip18x4,
        )
    },
    DeviceProfile {
        refresh_cycles: 512,
        ..x1(
            ChipType::Dram411000,
            "411000",
            "1Mx1",
            8,
            1,
            1024,
            1024,
            NONE,
            [4880, 2700, 2700, 2700, 2700, 2700],
            5100,
            Pinout::Dip18x1,
        )
    },
    DeviceProfile {
        refresh_cycles: 512,
        ..x4(
            ChipType::Dram514256,
            "514256",
            "256Kx4",
            4,
            2,
            512,
            512,
            SMALL,
            [1380, 1360, 540, 540, 540, 540],
            620,
            Pinout::Dip20,
        )
    },
    DeviceProfile {
        refresh_cycles: 512,
        ..x4(
            ChipType::Dram514258,
            "514258",
            "256Kx4",
            4,
            2,
            512,
            512,
            SMALL.union(ProfileFlags::STATIC_COLUMN),
            [1380, 1360, 540, 540, 540, 540],
            620,
            Pinout::Dip20,
        )
    },
    DeviceProfile {
        refresh_cycles: 1024,
        ..x4(
            ChipType::Dram514400,
            "514400",
            "1Mx4",
            16,
            5,
            1024,
            1024,
            NONE,
            [1960, 1960, 1960, 1960, 1960, 320],
            1240,
            Pinout::Dip20,
        )
    },
    DeviceProfile {
        refresh_cycles: 1024,
        ..x4(
            ChipType::Dram514402,
            "514402",
            "1Mx4",
            16,
            5,
            1024,
            1024,
            ProfileFlags::STATIC_COLUMN,
            [1980, 1960, 1960, 1960, 1960, 280],
            1240,
            Pinout::Dip20,
        )
    },
    x1(
        ChipType::Dram4116,
        "4116",
        "16Kx1",
        2,
        2,
        128,
        128,
        NONE,
        [600, 600, 120, 120, 120, 120],
        480,
        Pinout::Adapter,
    ),
    x1(
        ChipType::Dram4027,
        "4027",
        "4Kx1",
        2,
        2,
        64,
        64,
        NONE,
        [800, 800, 540, 540, 540, 540],
        240,
        Pinout::Adapter,
    ),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_is_indexed_by_chip_type() {
        for chip in ChipType::ALL {
            assert_eq!(chip.profile().chip, chip);
        }
    }

    #[test]
    fn geometry_is_power_of_two() {
        for p in PROFILES.iter() {
            assert!(p.rows.is_power_of_two(), "{}", p.name);
            assert!(p.cols.is_power_of_two(), "{}", p.name);
            assert!(p.rows >= 2, "{}", p.name);
            assert!(p.io_width == 1 || p.io_width == 4, "{}", p.name);
            assert!((p.delay_rows as usize) < p.delays_us.len(), "{}", p.name);
            assert!((p.delay_rows as u16) < p.rows, "{}", p.name);
        }
    }

    #[test]
    fn addressing() {
        let p = ChipType::Dram4416.profile();
        assert_eq!(p.row_bits(), 8);
        assert_eq!(p.col_bits(), 6);
        assert_eq!(p.column_address(0x3F), 0x7E);
        assert_eq!(p.data_mask(), 0x0F);

        let p = ChipType::Dram411000.profile();
        assert_eq!(p.row_bits(), 10);
        assert_eq!(p.data_mask(), 0x01);
        assert!(p.has_refresh_counter_test());
        assert!(!ChipType::Dram4164.profile().has_refresh_counter_test());
    }

    #[test]
    fn row_delay_saturates_at_steady_state() {
        let p = ChipType::Dram4164.profile();
        assert_eq!(p.row_delay(0).to_micros(), 1240);
        assert_eq!(p.row_delay(1).to_micros(), 1220);
        assert_eq!(p.row_delay(2).to_micros(), 400);
        assert_eq!(p.row_delay(200).to_micros(), 400);
        assert_eq!(p.retention().to_millis(), 4);
    }

    #[test]
    fn static_column_parts() {
        let statics: heapless::Vec<ChipType, 14> = ChipType::ALL
            .into_iter()
            .filter(|c| c.profile().is_static_column())
            .collect();
        assert_eq!(&statics[..], &[ChipType::Dram514258, ChipType::Dram514402]);
        assert!(ChipType::Dram41257.profile().is_nibble_mode());
    }
}
