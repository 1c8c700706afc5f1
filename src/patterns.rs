//! Test patterns and the position-dependent pseudo-random table.

/// The six test passes, in execution order. The index is reported as the
/// failure detail code.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TestPattern {
    AllZero = 0,
    AllOne = 1,
    AltA = 2,
    AltB = 3,
    Random1 = 4,
    Random2 = 5,
}

impl TestPattern {
    pub const ALL: [TestPattern; 6] = [
        TestPattern::AllZero,
        TestPattern::AllOne,
        TestPattern::AltA,
        TestPattern::AltB,
        TestPattern::Random1,
        TestPattern::Random2,
    ];

    #[inline]
    pub fn index(self) -> u8 {
        self as u8
    }

    /// Base byte of the pass. Random passes take their data from
    /// [`RandomTable`] instead.
    #[inline]
    pub fn seed(self) -> u8 {
        match self {
            TestPattern::AllZero => 0x00,
            TestPattern::AllOne => 0xFF,
            TestPattern::AltA | TestPattern::Random1 => 0xAA,
            TestPattern::AltB | TestPattern::Random2 => 0x55,
        }
    }

    #[inline]
    pub fn is_random(self) -> bool {
        matches!(self, TestPattern::Random1 | TestPattern::Random2)
    }

    /// Passes verified by reading each column right after writing it.
    #[inline]
    pub fn is_inline_verified(self) -> bool {
        matches!(self, TestPattern::AllZero | TestPattern::AllOne)
    }

    /// Byte written at column `col` for the fixed and rotating passes.
    #[inline]
    pub fn column_value(self, col: u16) -> u8 {
        self.seed().rotate_left(u32::from(col & 7))
    }
}

/// Row/column mix feeding the random table index.
#[inline(always)]
pub fn mix8(col: u16, row: u16) -> u8 {
    let v = col ^ row.wrapping_add(row >> 4);
    (v ^ (v >> 8)) as u8
}

/// 256 nibbles from a 16-bit Galois LFSR, indexed by [`mix8`].
#[derive(Clone, PartialEq, Eq)]
pub struct RandomTable {
    table: [u8; 256],
}

impl RandomTable {
    pub fn generate() -> Self {
        let mut table = [0u8; 256];
        for (i, slot) in table.iter_mut().enumerate() {
            let mut lfsr = 0xACE1u16 ^ (i as u16).wrapping_mul(0x3D);
            for _ in 0..8 {
                lfsr = (lfsr >> 1) ^ (0u16.wrapping_sub(lfsr & 1) & 0xB400);
            }
            *slot = ((lfsr ^ (lfsr >> 8)) & 0x0F) as u8;
        }
        Self { table }
    }

    /// Flip the low nibble of every entry. Applying it twice is a no-op.
    pub fn invert(&mut self) {
        for entry in self.table.iter_mut() {
            *entry = (*entry & 0x0F) ^ 0x0F;
        }
    }

    #[inline(always)]
    pub fn at(&self, index: u8) -> u8 {
        self.table[index as usize]
    }

    /// Expected nibble at (`row`, `col`).
    #[inline(always)]
    pub fn expected(&self, row: u16, col: u16) -> u8 {
        self.at(mix8(col, row))
    }
}

impl Default for RandomTable {
    fn default() -> Self {
        Self::generate()
    }
}

impl core::fmt::Debug for RandomTable {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("RandomTable")
            .field("head", &&self.table[..8])
            .finish_non_exhaustive()
    }
}
