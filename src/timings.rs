//! Strobe timing margins, one type per speed grade.
//!
//! All values are nanoseconds the bus backend waits after the matching edge.

pub trait DramTimingConfig {
    /// Pulse duration, RAS low (ns)
    const T_RAS: u32;
    /// Pulse duration, CAS low (ns)
    const T_CAS: u32;
    /// RAS low to CAS low delay (ns)
    const T_RCD: u32;
    /// Pulse duration, RAS high (precharge) (ns)
    const T_RP: u32;
    /// Pulse duration, CAS high (precharge) (ns)
    const T_CP: u32;
    /// Data-out propagation through the level shifters (ns)
    const T_DOUT: u32 = 14;
    /// Address setup before a strobe edge (ns)
    const T_ASC: u32 = 0;

    /// Remaining RAS low time once the row delay and one CAS pulse are spent.
    const T_RAS_REST: u32 = Self::T_RAS.saturating_sub(Self::T_CAS + Self::T_RCD);
}

/// Slowest grade. Fast parts pass with these margins too.
pub struct Dram150Ns;
impl DramTimingConfig for Dram150Ns {
    // TMS4256-15
    const T_RAS: u32 = 150;
    const T_CAS: u32 = 75;
    const T_RCD: u32 = 25;
    const T_RP: u32 = 100;
    const T_CP: u32 = 60;
}

pub struct Dram120Ns;
impl DramTimingConfig for Dram120Ns {
    // TMS4256-12
    const T_RAS: u32 = 120;
    const T_CAS: u32 = 60;
    const T_RCD: u32 = 25;
    const T_RP: u32 = 90;
    const T_CP: u32 = 50;
}

pub struct Dram100Ns;
impl DramTimingConfig for Dram100Ns {
    // TMS4256-10
    const T_RAS: u32 = 100;
    const T_CAS: u32 = 50;
    const T_RCD: u32 = 25;
    const T_RP: u32 = 90;
    const T_CP: u32 = 40;
}

pub struct Dram80Ns;
impl DramTimingConfig for Dram80Ns {
    // HM514400-8
    const T_RAS: u32 = 80;
    const T_CAS: u32 = 40;
    const T_RCD: u32 = 25;
    const T_RP: u32 = 70;
    const T_CP: u32 = 20;
}
