//! Host-side model of a device's power-management registers.
//!
//! `SimulatedMcu` is a [`RegisterBus`] that keeps time: every access costs
//! the two cycles of an `LDS`/`STS`. The clock prescaler is modelled with its
//! change-enable window so a sequence that takes too long (an interrupt
//! landing between the two stores, say) is rejected the way silicon
//! rejects it. Power-reduction registers behave as plain storage.

use tracing::{debug, trace};

use crate::clock::{ClockDiv, Prescaler};
use crate::devices::Device;
use crate::register::{RegisterBus, RegisterFile};
use crate::{CCP_SIGNATURE, CLKPCE, IO_SPACE_SIZE, SREG_I};

/// Cycles per data-space access (`LDS`/`STS`).
pub const ACCESS_CYCLES: u64 = 2;

/// Cycles a change-enable or CCP unlock stays open.
pub const UNLOCK_WINDOW: u64 = 4;

/// Prescaler register with its timed-write protection.
pub struct ClockUnit {
    prescaler: Prescaler,
    /// Latched division field (or full XDIV content).
    pub value: u8,
    window_until: Option<u64>,
}

impl ClockUnit {
    pub fn new(prescaler: Prescaler) -> Self {
        ClockUnit { prescaler, value: 0, window_until: None }
    }

    pub fn reset(&mut self) {
        self.value = 0;
        self.window_until = None;
    }

    fn window_open(&self, now: u64) -> bool {
        self.window_until.is_some_and(|until| now <= until)
    }

    pub fn handles(&self, addr: u16) -> bool {
        match self.prescaler {
            Prescaler::Ccp { ccp, reg } => addr == ccp || addr == reg.addr,
            p => addr == p.register().addr,
        }
    }

    pub fn read(&self, addr: u16, now: u64) -> u8 {
        match self.prescaler {
            Prescaler::Clkpr { .. } => {
                let pce = if self.window_open(now) { CLKPCE } else { 0 };
                self.value | pce
            }
            Prescaler::Ccp { ccp, .. } if addr == ccp => 0,
            _ => self.value,
        }
    }

    /// Returns `false` when a protected store was dropped.
    pub fn write(&mut self, addr: u16, value: u8, now: u64) -> bool {
        match self.prescaler {
            Prescaler::Clkpr { select_bits, .. } => {
                if value == CLKPCE {
                    self.window_until = Some(now + UNLOCK_WINDOW);
                    return true;
                }
                let accepted = value & CLKPCE == 0 && self.window_open(now);
                if accepted {
                    self.value = value & (((1u16 << select_bits) - 1) as u8);
                }
                self.window_until = None;
                accepted
            }
            Prescaler::Ccp { ccp, .. } => {
                if addr == ccp {
                    if value == CCP_SIGNATURE {
                        self.window_until = Some(now + UNLOCK_WINDOW);
                    }
                    return true;
                }
                let accepted = self.window_open(now);
                if accepted {
                    self.value = value & 0x0F;
                }
                self.window_until = None;
                accepted
            }
            Prescaler::Xdiv { .. } => {
                self.value = value;
                true
            }
        }
    }
}

pub struct SimulatedMcu {
    device: &'static Device,
    regs: RegisterFile,
    clock: Option<ClockUnit>,
    cycles: u64,
    interrupt_stall: u32,
    rejected: u32,
}

impl SimulatedMcu {
    pub fn new(device: &'static Device) -> Self {
        SimulatedMcu {
            device,
            regs: RegisterFile::with_size(IO_SPACE_SIZE),
            clock: device.family.clock.map(ClockUnit::new),
            cycles: 0,
            interrupt_stall: 0,
            rejected: 0,
        }
    }

    /// Start as if the CKDIV8 fuse were programmed (factory default on most
    /// parts): the prescaler comes out of reset at /8.
    pub fn with_ckdiv8(mut self) -> Self {
        if let Some(clock) = &mut self.clock {
            if !matches!(clock.prescaler, Prescaler::Xdiv { .. }) {
                clock.value = ClockDiv::Div8.bits();
            }
        }
        self
    }

    /// After every store made with the global interrupt flag set, burn
    /// `cycles` extra cycles as if an ISR had run.
    pub fn with_interrupt_stall(mut self, cycles: u32) -> Self {
        self.interrupt_stall = cycles;
        self
    }

    pub fn set_interrupts_enabled(&mut self, on: bool) {
        let sreg = self.device.family.sreg;
        let v = self.regs.read_raw(sreg);
        self.regs.write_raw(sreg, if on { v | SREG_I } else { v & !SREG_I });
    }

    pub fn reset(&mut self) {
        self.regs = RegisterFile::with_size(IO_SPACE_SIZE);
        if let Some(clock) = &mut self.clock {
            clock.reset();
        }
        self.cycles = 0;
        self.rejected = 0;
    }

    pub fn device(&self) -> &'static Device {
        self.device
    }

    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    /// Protected prescaler stores dropped because the unlock window had closed.
    pub fn rejected_writes(&self) -> u32 {
        self.rejected
    }

    pub fn registers(&self) -> &RegisterFile {
        &self.regs
    }

    /// Stores issued since the last call, in order.
    pub fn take_journal(&mut self) -> Vec<(u16, u8)> {
        self.regs.take_journal()
    }

    pub fn peek(&self, addr: u16) -> u8 {
        match &self.clock {
            Some(clock) if clock.handles(addr) => clock.read(addr, self.cycles),
            _ => self.regs.read_raw(addr),
        }
    }
}

impl RegisterBus for SimulatedMcu {
    fn read(&mut self, addr: u16) -> u8 {
        self.cycles += ACCESS_CYCLES;
        self.peek(addr)
    }

    fn write(&mut self, addr: u16, value: u8) {
        self.cycles += ACCESS_CYCLES;
        let now = self.cycles;
        trace!(addr = format_args!("0x{:04X}", addr), value = format_args!("0x{:02X}", value), cycle = now, "write");

        self.regs.write(addr, value);
        if let Some(clock) = &mut self.clock {
            if clock.handles(addr) {
                if !clock.write(addr, value, now) {
                    self.rejected += 1;
                    debug!(addr, value, cycle = now, "protected write outside unlock window ignored");
                }
                self.regs.write_raw(addr, clock.read(addr, now));
            }
        }

        let sreg = self.device.family.sreg;
        if addr != sreg && self.interrupt_stall > 0 && self.regs.read_raw(sreg) & SREG_I != 0 {
            self.cycles += u64::from(self.interrupt_stall);
        }
    }

    fn delay_cycles(&mut self, cycles: u32) {
        self.cycles += u64::from(cycles);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::devices::lookup;
    use crate::{Peripheral, PowerController};

    fn sim(name: &str) -> SimulatedMcu {
        SimulatedMcu::new(lookup(name).unwrap())
    }

    #[test]
    fn test_controller_sequence_latches() {
        let mut pc = PowerController::new(lookup("ATmega328P").unwrap(), sim("ATmega328P"));
        pc.clock_prescale_set(ClockDiv::Div16).unwrap();
        assert_eq!(pc.clock_prescale_get().unwrap(), Some(ClockDiv::Div16));
        assert_eq!(pc.bus().rejected_writes(), 0);
    }

    #[test]
    fn test_plain_store_is_ignored() {
        let mut mcu = sim("ATmega328P");
        mcu.write(0x61, 0x03);
        assert_eq!(mcu.peek(0x61), 0);
        assert_eq!(mcu.rejected_writes(), 1);
    }

    #[test]
    fn test_change_enable_window_expires() {
        let mut mcu = sim("ATmega328P");
        mcu.write(0x61, CLKPCE);
        assert_eq!(mcu.peek(0x61) & CLKPCE, CLKPCE);
        mcu.delay_cycles(4);
        mcu.write(0x61, 0x02);
        assert_eq!(mcu.peek(0x61), 0);
        assert_eq!(mcu.rejected_writes(), 1);
    }

    #[test]
    fn test_interrupt_between_stores_breaks_sequence() {
        let mut mcu = sim("ATmega328P").with_interrupt_stall(20);
        mcu.set_interrupts_enabled(true);
        mcu.write(0x61, CLKPCE);
        mcu.write(0x61, 0x01);
        assert_eq!(mcu.peek(0x61), 0);

        // the library sequence masks interrupts, so the stall never lands
        let mut pc = PowerController::new(lookup("ATmega328P").unwrap(), mcu);
        pc.clock_prescale_set(ClockDiv::Div2).unwrap();
        assert_eq!(pc.clock_prescale_get().unwrap(), Some(ClockDiv::Div2));
        assert_eq!(pc.bus().peek(0x5F) & SREG_I, SREG_I);
    }

    #[test]
    fn test_ckdiv8_reset_value() {
        let mut pc = PowerController::new(
            lookup("ATtiny85").unwrap(),
            sim("ATtiny85").with_ckdiv8(),
        );
        assert_eq!(pc.clock_prescale_get().unwrap(), Some(ClockDiv::Div8));
    }

    #[test]
    fn test_ccp_unlock_on_reduced_core() {
        let mut pc = PowerController::new(lookup("ATtiny10").unwrap(), sim("ATtiny10"));
        pc.clock_prescale_set(ClockDiv::Div32).unwrap();
        assert_eq!(pc.bus().peek(0x36), 0x05);

        let mut mcu = pc.into_inner();
        mcu.write(0x36, 0x01);
        assert_eq!(mcu.peek(0x36), 0x05);
        assert_eq!(mcu.rejected_writes(), 1);
    }

    #[test]
    fn test_xdiv_counts_settle_cycles() {
        let mut pc = PowerController::new(lookup("ATmega128").unwrap(), sim("ATmega128"));
        pc.set_clock_divisor(5).unwrap();
        assert_eq!(pc.clock_divisor().unwrap(), 5);
        // SREG read/write, two XDIV stores with settle time, SREG restore, XDIV read
        assert_eq!(pc.bus().cycles(), 2 + 2 + 2 + 8 + 2 + 8 + 2 + 2);
    }

    #[test]
    fn test_power_bits_are_plain_storage() {
        let mut pc = PowerController::new(lookup("ATmega32U4").unwrap(), sim("ATmega32U4"));
        pc.disable(Peripheral::Usb).unwrap();
        pc.disable(Peripheral::Timer3).unwrap();
        assert_eq!(pc.bus().peek(0x65), 0x88);
        assert_eq!(pc.bus_mut().take_journal(), vec![(0x65, 0x80), (0x65, 0x88)]);
    }
}
