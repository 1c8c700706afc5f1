//! Cycle-counted busy waits for the strobe margins.

use core::arch::asm;
use core::sync::atomic::{compiler_fence, Ordering};

use embedded_hal::delay::DelayNs;

/// [`DelayNs`] by counting CPU cycles at `SYSTEM_FREQ` Hz. Never under-delays.
pub struct CycleDelay<const SYSTEM_FREQ: u32>;

impl<const SYSTEM_FREQ: u32> CycleDelay<SYSTEM_FREQ> {
    const NS_PER_CYCLE: u32 = (1_000_000_000 + SYSTEM_FREQ - 1) / SYSTEM_FREQ;
    const CYCLES_PER_US: u32 = SYSTEM_FREQ / 1_000_000;
}

impl<const SYSTEM_FREQ: u32> DelayNs for CycleDelay<SYSTEM_FREQ> {
    #[inline(always)]
    fn delay_ns(&mut self, ns: u32) {
        // don't let the compiler reorder the delay loop
        compiler_fence(Ordering::SeqCst);
        delay_cycles(ns.div_ceil(Self::NS_PER_CYCLE));
        compiler_fence(Ordering::SeqCst);
    }

    fn delay_us(&mut self, us: u32) {
        compiler_fence(Ordering::SeqCst);
        delay_cycles(us.saturating_mul(Self::CYCLES_PER_US));
        compiler_fence(Ordering::SeqCst);
    }

    fn delay_ms(&mut self, ms: u32) {
        for _ in 0..ms {
            self.delay_us(1000);
        }
    }
}

#[inline(always)]
fn delay_cycles(cycles: u32) {
    let loop_count = cycles / 3;
    if loop_count > 0 {
        delay_loop_3cyc(loop_count);
    }
    match cycles % 3 {
        0 => {}
        1 => nop(),
        _ => {
            nop();
            nop();
        }
    }
}

/// Blocks the program for 3 * `loop_count` CPU cycles.
#[inline(always)]
fn delay_loop_3cyc(loop_count: u32) {
    // Cortex-M0+: 1 cycle to set the register for the loop count, then
    // 3 cycles per iteration if loop continues, 2 if it breaks.
    unsafe {
        asm!(
            // local labels avoid R_ARM_THM_JUMP8 relocations on thumbv6m
            "1:",
            "subs {}, #1", // 1 cycle
            "bne 1b", // 2 cycles if loop continues, 1 if not
            inout(reg) loop_count => _,
            options(nomem, nostack),
        )
    };
}

#[inline(always)]
fn nop() {
    unsafe { asm!("nop", options(nomem, nostack)) };
}
