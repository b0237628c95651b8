//! System clock prescaler.
//!
//! Three hardware schemes exist:
//!
//! - `CLKPR` (most megaAVR/tinyAVR): write `CLKPCE` alone, then the new
//!   `CLKPS` value within four cycles.
//! - `CCP` + `CLKPSR` (reduced-core tinyAVR): write the `0xD8` signature to
//!   `CCP`, then the value within four cycles.
//! - `XDIV` (ATmega64/103/128): any divisor 1..=129; the register must be
//!   cleared before a new divisor is written.
//!
//! Every sequence runs with interrupts disabled.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::register::{PowerRegister, RegisterBus};
use crate::{CCP_SIGNATURE, CLKPCE, XDIVEN};

/// `clock_div_t` from avr-libc. The discriminant is the `CLKPS` field value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum ClockDiv {
    Div1 = 0,
    Div2 = 1,
    Div4 = 2,
    Div8 = 3,
    Div16 = 4,
    Div32 = 5,
    Div64 = 6,
    Div128 = 7,
    Div256 = 8,
    /// Undivided internal RC oscillator (ATmega128RFA1 and the RFR2 family).
    Div1Rc = 15,
}

impl ClockDiv {
    pub const ALL: [ClockDiv; 10] = [
        ClockDiv::Div1,
        ClockDiv::Div2,
        ClockDiv::Div4,
        ClockDiv::Div8,
        ClockDiv::Div16,
        ClockDiv::Div32,
        ClockDiv::Div64,
        ClockDiv::Div128,
        ClockDiv::Div256,
        ClockDiv::Div1Rc,
    ];

    #[inline]
    pub fn bits(self) -> u8 {
        self as u8
    }

    pub fn from_bits(bits: u8) -> Option<Self> {
        Self::ALL.iter().copied().find(|d| d.bits() == bits)
    }

    /// Effective division factor.
    pub fn divisor(self) -> u16 {
        match self {
            ClockDiv::Div1Rc => 1,
            d => 1 << d.bits(),
        }
    }

    /// Power-of-two divisor to the matching CLKPS setting.
    pub fn from_divisor(divisor: u16) -> Option<Self> {
        if !divisor.is_power_of_two() {
            return None;
        }
        Self::from_bits(divisor.trailing_zeros() as u8).filter(|d| *d != ClockDiv::Div1Rc)
    }
}

/// How a family's prescaler is programmed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Prescaler {
    Clkpr {
        reg: PowerRegister,
        /// Width of the CLKPS field.
        select_bits: u8,
        /// Accepts [`ClockDiv::Div1Rc`].
        rc_oscillator: bool,
    },
    Ccp {
        ccp: u16,
        reg: PowerRegister,
    },
    Xdiv {
        reg: PowerRegister,
    },
}

/// Largest divisor XDIV can express.
pub const XDIV_MAX: u16 = 129;

/// Cycles the XDIV errata asks for after each XDIV store.
pub const XDIV_SETTLE_CYCLES: u32 = 8;

impl Prescaler {
    pub fn register(&self) -> PowerRegister {
        match *self {
            Prescaler::Clkpr { reg, .. } | Prescaler::Ccp { reg, .. } | Prescaler::Xdiv { reg } => reg,
        }
    }

    /// Bits of the prescaler register that hold the division setting.
    pub fn select_mask(&self) -> u8 {
        match *self {
            Prescaler::Clkpr { select_bits, .. } => ((1u16 << select_bits) - 1) as u8,
            Prescaler::Ccp { .. } => 0x0F,
            Prescaler::Xdiv { .. } => 0x7F,
        }
    }

    pub fn supports(&self, div: ClockDiv) -> bool {
        match *self {
            Prescaler::Clkpr { rc_oscillator, .. } => {
                if div == ClockDiv::Div1Rc {
                    rc_oscillator
                } else {
                    div.bits() <= self.select_mask()
                }
            }
            Prescaler::Ccp { .. } => div != ClockDiv::Div1Rc,
            Prescaler::Xdiv { .. } => div != ClockDiv::Div1Rc && div.divisor() <= XDIV_MAX,
        }
    }

    /// Whether `divisor` (a plain factor, not a CLKPS code) can be programmed.
    pub fn supports_divisor(&self, divisor: u16) -> bool {
        match self {
            Prescaler::Xdiv { .. } => (1..=XDIV_MAX).contains(&divisor),
            _ => ClockDiv::from_divisor(divisor).is_some_and(|d| self.supports(d)),
        }
    }

    /// Run the protected write sequence that stores `value` into the
    /// prescaler register, with interrupts masked through the SREG at
    /// `sreg`. The caller has already validated `value`.
    pub fn write_protected<B: RegisterBus>(&self, bus: &mut B, sreg: u16, value: u8) {
        match *self {
            Prescaler::Clkpr { reg, .. } => bus.interrupt_free(sreg, |bus| {
                bus.write(reg.addr, CLKPCE);
                bus.write(reg.addr, value);
            }),
            Prescaler::Ccp { ccp, reg } => bus.interrupt_free(sreg, |bus| {
                bus.write(ccp, CCP_SIGNATURE);
                bus.write(reg.addr, value);
            }),
            Prescaler::Xdiv { reg } => bus.interrupt_free(sreg, |bus| {
                bus.write(reg.addr, 0);
                bus.delay_cycles(XDIV_SETTLE_CYCLES);
                if value != 0 {
                    bus.write(reg.addr, value);
                    bus.delay_cycles(XDIV_SETTLE_CYCLES);
                }
            }),
        }
        debug!(register = reg_name(self), value, "prescaler written");
    }

    /// Raw register content, masked to the division field (XDIV keeps XDIVEN).
    pub fn read_raw<B: RegisterBus>(&self, bus: &mut B) -> u8 {
        let v = bus.read(self.register().addr);
        match self {
            Prescaler::Xdiv { .. } => v,
            _ => v & self.select_mask(),
        }
    }

    /// Program a CLKPS-style setting. Returns `false` (and writes nothing)
    /// if this prescaler cannot express it.
    pub fn set<B: RegisterBus>(&self, bus: &mut B, sreg: u16, div: ClockDiv) -> bool {
        if !self.supports(div) {
            return false;
        }
        match self {
            Prescaler::Xdiv { .. } => self.set_divisor(bus, sreg, div.divisor()),
            _ => {
                self.write_protected(bus, sreg, div.bits());
                true
            }
        }
    }

    /// Program a plain division factor.
    pub fn set_divisor<B: RegisterBus>(&self, bus: &mut B, sreg: u16, divisor: u16) -> bool {
        if !self.supports_divisor(divisor) {
            return false;
        }
        let value = match self {
            Prescaler::Xdiv { .. } => xdiv_encode(divisor),
            _ => match ClockDiv::from_divisor(divisor) {
                Some(d) => d.bits(),
                None => return false,
            },
        };
        self.write_protected(bus, sreg, value);
        true
    }

    /// Current CLKPS-style setting, `None` for reserved codes or XDIV
    /// factors that are not a power of two.
    pub fn get<B: RegisterBus>(&self, bus: &mut B) -> Option<ClockDiv> {
        match self {
            Prescaler::Xdiv { .. } => ClockDiv::from_divisor(self.divisor(bus)),
            _ => ClockDiv::from_bits(self.read_raw(bus)),
        }
    }

    /// Current effective division factor.
    pub fn divisor<B: RegisterBus>(&self, bus: &mut B) -> u16 {
        match self {
            Prescaler::Xdiv { .. } => xdiv_decode(self.read_raw(bus)),
            _ => ClockDiv::from_bits(self.read_raw(bus)).map_or(1, ClockDiv::divisor),
        }
    }
}

fn reg_name(p: &Prescaler) -> &'static str {
    p.register().name
}

/// XDIV content for a division factor in `1..=129`.
pub fn xdiv_encode(divisor: u16) -> u8 {
    if divisor <= 1 {
        0
    } else {
        XDIVEN | XDIV_MAX.saturating_sub(divisor) as u8
    }
}

pub fn xdiv_decode(xdiv: u8) -> u16 {
    if xdiv & XDIVEN != 0 {
        XDIV_MAX - u16::from(xdiv & !XDIVEN)
    } else {
        1
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::register::RegisterFile;
    use crate::{REDUCED_CORE_SREG_ADDR, SREG_ADDR};

    const CLKPR: Prescaler = Prescaler::Clkpr {
        reg: PowerRegister::new("CLKPR", 0x61),
        select_bits: 4,
        rc_oscillator: false,
    };
    const CLKPR_RC: Prescaler = Prescaler::Clkpr {
        reg: PowerRegister::new("CLKPR", 0x61),
        select_bits: 4,
        rc_oscillator: true,
    };
    const CCP: Prescaler = Prescaler::Ccp {
        ccp: 0x3C,
        reg: PowerRegister::new("CLKPSR", 0x36),
    };
    const XDIV: Prescaler = Prescaler::Xdiv {
        reg: PowerRegister::new("XDIV", 0x5C),
    };

    #[test]
    fn test_clock_div_codes() {
        assert_eq!(ClockDiv::Div256.bits(), 8);
        assert_eq!(ClockDiv::Div1Rc.bits(), 15);
        assert_eq!(ClockDiv::Div64.divisor(), 64);
        assert_eq!(ClockDiv::Div1Rc.divisor(), 1);
        assert_eq!(ClockDiv::from_divisor(16), Some(ClockDiv::Div16));
        assert_eq!(ClockDiv::from_divisor(3), None);
        assert_eq!(ClockDiv::from_divisor(512), None);
        assert_eq!(ClockDiv::from_bits(9), None);
    }

    #[test]
    fn test_clkpr_sequence() {
        let mut regs = RegisterFile::new();
        regs.write_raw(SREG_ADDR, 0x80);
        assert!(CLKPR.set(&mut regs, SREG_ADDR, ClockDiv::Div8));
        assert_eq!(
            regs.take_journal(),
            vec![(0x5F, 0x00), (0x61, 0x80), (0x61, 0x03), (0x5F, 0x80)]
        );
        assert_eq!(CLKPR.get(&mut regs), Some(ClockDiv::Div8));
        assert_eq!(CLKPR.divisor(&mut regs), 8);
    }

    #[test]
    fn test_rc_setting_needs_rc_family() {
        let mut regs = RegisterFile::new();
        assert!(!CLKPR.set(&mut regs, SREG_ADDR, ClockDiv::Div1Rc));
        assert!(regs.take_journal().is_empty());
        assert!(CLKPR_RC.set(&mut regs, SREG_ADDR, ClockDiv::Div1Rc));
        assert_eq!(CLKPR_RC.get(&mut regs), Some(ClockDiv::Div1Rc));
        assert_eq!(CLKPR_RC.divisor(&mut regs), 1);
    }

    #[test]
    fn test_ccp_sequence() {
        let mut regs = RegisterFile::new();
        assert!(CCP.set(&mut regs, REDUCED_CORE_SREG_ADDR, ClockDiv::Div4));
        assert_eq!(
            regs.take_journal(),
            vec![(0x3F, 0x00), (0x3C, 0xD8), (0x36, 0x02), (0x3F, 0x00)]
        );
    }

    #[test]
    fn test_xdiv_encoding() {
        assert_eq!(xdiv_encode(1), 0x00);
        assert_eq!(xdiv_encode(2), 0xFF);
        assert_eq!(xdiv_encode(129), 0x80);
        for n in 1..=XDIV_MAX {
            assert_eq!(xdiv_decode(xdiv_encode(n)), n);
        }
        assert_eq!(xdiv_decode(0x7F), 1);
    }

    #[test]
    fn test_xdiv_clears_before_writing() {
        let mut regs = RegisterFile::new();
        assert!(XDIV.set_divisor(&mut regs, SREG_ADDR, 10));
        let journal = regs.take_journal();
        assert_eq!(&journal[1..3], &[(0x5C, 0x00), (0x5C, 0x80 | 119)]);
        assert_eq!(XDIV.divisor(&mut regs), 10);
        assert_eq!(XDIV.get(&mut regs), None);

        assert!(XDIV.set(&mut regs, SREG_ADDR, ClockDiv::Div1));
        assert_eq!(regs.read_raw(0x5C), 0);
    }

    #[test]
    fn test_xdiv_rejects_out_of_range() {
        let mut regs = RegisterFile::new();
        assert!(!XDIV.set_divisor(&mut regs, SREG_ADDR, 0));
        assert!(!XDIV.set_divisor(&mut regs, SREG_ADDR, 130));
        assert!(!XDIV.set(&mut regs, SREG_ADDR, ClockDiv::Div256));
        assert!(regs.take_journal().is_empty());
    }
}
