//! Register access.
//!
//! All addresses in this crate are AVR *data-space* addresses, the ones used
//! by `LDS`/`STS`. Classic cores map I/O register `n` to data address
//! `n + 0x20`; reduced cores (ATtiny4/5/9/10) map it to `n` directly. The
//! device tables already account for that, so a bus only ever sees the final
//! data address.
//!
//! | Address Range | Content (classic core)       |
//! |---------------|------------------------------|
//! | 0x0000–0x001F | General registers R0–R31     |
//! | 0x0020–0x005F | I/O registers                |
//! | 0x0060–0x00FF | Extended I/O registers       |

use crate::{IO_SPACE_SIZE, SREG_I};

/// A named 8-bit register at a data-space address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PowerRegister {
    pub name: &'static str,
    pub addr: u16,
}

impl PowerRegister {
    pub const fn new(name: &'static str, addr: u16) -> Self {
        PowerRegister { name, addr }
    }
}

/// Byte-wide access to a data space.
///
/// Reads take `&mut self` because a bus may model side effects or elapsed
/// cycles on every access.
pub trait RegisterBus {
    fn read(&mut self, addr: u16) -> u8;

    fn write(&mut self, addr: u16, value: u8);

    /// Let at least `cycles` CPU cycles pass. Buses without a notion of
    /// time ignore it.
    fn delay_cycles(&mut self, _cycles: u32) {}

    /// Read-modify-write.
    fn modify<F: FnOnce(u8) -> u8>(&mut self, addr: u16, f: F) {
        let v = self.read(addr);
        self.write(addr, f(v));
    }

    fn set_bits(&mut self, addr: u16, mask: u8) {
        self.modify(addr, |v| v | mask);
    }

    fn clear_bits(&mut self, addr: u16, mask: u8) {
        self.modify(addr, |v| v & !mask);
    }

    /// Run `f` with the global interrupt flag cleared, then restore SREG.
    ///
    /// `sreg` is the status register's data address on the part being
    /// driven (`Family::sreg`); reduced cores keep it at 0x3F, not 0x5F.
    fn interrupt_free<R, F>(&mut self, sreg: u16, f: F) -> R
    where
        Self: Sized,
        F: FnOnce(&mut Self) -> R,
    {
        let saved = self.read(sreg);
        self.write(sreg, saved & !SREG_I);
        let r = f(self);
        self.write(sreg, saved);
        r
    }
}

impl<B: RegisterBus + ?Sized> RegisterBus for &mut B {
    fn read(&mut self, addr: u16) -> u8 {
        (**self).read(addr)
    }

    fn write(&mut self, addr: u16, value: u8) {
        (**self).write(addr, value)
    }

    fn delay_cycles(&mut self, cycles: u32) {
        (**self).delay_cycles(cycles)
    }
}

/// In-memory data space for host-side use.
///
/// Every write is also appended to a journal so callers can inspect the
/// exact sequence of stores an operation produced.
pub struct RegisterFile {
    pub data: Vec<u8>,
    journal: Vec<(u16, u8)>,
}

impl RegisterFile {
    pub fn new() -> Self {
        Self::with_size(IO_SPACE_SIZE)
    }

    pub fn with_size(size: usize) -> Self {
        RegisterFile {
            data: vec![0u8; size],
            journal: Vec::new(),
        }
    }

    #[inline(always)]
    pub fn read_raw(&self, addr: u16) -> u8 {
        let a = addr as usize;
        if a < self.data.len() { self.data[a] } else { 0 }
    }

    #[inline(always)]
    pub fn write_raw(&mut self, addr: u16, v: u8) {
        let a = addr as usize;
        if a < self.data.len() { self.data[a] = v; }
    }

    /// Writes recorded since the last call.
    pub fn take_journal(&mut self) -> Vec<(u16, u8)> {
        std::mem::take(&mut self.journal)
    }
}

impl Default for RegisterFile {
    fn default() -> Self {
        Self::new()
    }
}

impl RegisterBus for RegisterFile {
    fn read(&mut self, addr: u16) -> u8 {
        self.read_raw(addr)
    }

    fn write(&mut self, addr: u16, value: u8) {
        self.journal.push((addr, value));
        self.write_raw(addr, value);
    }
}

/// Volatile access to the real data space, for code running on the device.
pub struct Mmio {
    sreg: u16,
}

impl Mmio {
    /// `sreg` is only used as a side-effect-free load target for
    /// [`RegisterBus::delay_cycles`].
    ///
    /// # Safety
    ///
    /// Only valid when executing on the AVR itself, where every data-space
    /// address is mapped. The caller must also be the sole owner of the
    /// registers it touches through this bus.
    pub const unsafe fn new(sreg: u16) -> Self {
        Mmio { sreg }
    }
}

impl RegisterBus for Mmio {
    #[inline(always)]
    fn read(&mut self, addr: u16) -> u8 {
        // SAFETY: `Mmio::new` requires the data space to be mapped.
        unsafe { core::ptr::read_volatile(addr as usize as *const u8) }
    }

    #[inline(always)]
    fn write(&mut self, addr: u16, value: u8) {
        // SAFETY: `Mmio::new` requires the data space to be mapped.
        unsafe { core::ptr::write_volatile(addr as usize as *mut u8, value) }
    }

    /// Each SREG load is an `LDS` (two cycles) with no side effects.
    fn delay_cycles(&mut self, cycles: u32) {
        for _ in 0..cycles.div_ceil(2) {
            // SAFETY: `Mmio::new` requires the data space to be mapped.
            unsafe { core::ptr::read_volatile(self.sreg as usize as *const u8) };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{REDUCED_CORE_SREG_ADDR, SREG_ADDR};

    #[test]
    fn test_set_and_clear_bits() {
        let mut regs = RegisterFile::new();
        regs.set_bits(0x64, 0b1000_0001);
        assert_eq!(regs.read_raw(0x64), 0x81);
        regs.clear_bits(0x64, 0x01);
        assert_eq!(regs.read_raw(0x64), 0x80);
    }

    #[test]
    fn test_out_of_range_is_ignored() {
        let mut regs = RegisterFile::with_size(0x40);
        regs.write(0x64, 0xFF);
        assert_eq!(regs.read(0x64), 0);
    }

    #[test]
    fn test_interrupt_free_restores_sreg() {
        let mut regs = RegisterFile::new();
        regs.write_raw(SREG_ADDR, 0x83);
        let seen = regs.interrupt_free(SREG_ADDR, |bus| bus.read(SREG_ADDR));
        assert_eq!(seen, 0x03);
        assert_eq!(regs.read_raw(SREG_ADDR), 0x83);
    }

    #[test]
    fn test_interrupt_free_uses_given_sreg() {
        let mut regs = RegisterFile::new();
        regs.write_raw(REDUCED_CORE_SREG_ADDR, 0x80);
        regs.interrupt_free(REDUCED_CORE_SREG_ADDR, |bus| bus.write(0x36, 0x01));
        assert_eq!(
            regs.take_journal(),
            vec![(0x3F, 0x00), (0x36, 0x01), (0x3F, 0x80)]
        );
        assert_eq!(regs.read_raw(SREG_ADDR), 0);
    }

    #[test]
    fn test_journal_records_writes_in_order() {
        let mut regs = RegisterFile::new();
        regs.write(0x61, 0x80);
        regs.write(0x61, 0x03);
        assert_eq!(regs.take_journal(), vec![(0x61, 0x80), (0x61, 0x03)]);
        assert!(regs.take_journal().is_empty());
    }
}
