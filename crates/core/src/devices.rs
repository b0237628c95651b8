//! Device tables: which bit of which register gates each peripheral.
//!
//! Devices sharing a register layout are grouped into a [`Family`]; a
//! [`Device`] is a named member of one family with an optional signature.
//! Register addresses are data-space addresses (see [`crate::register`]).

use crate::clock::Prescaler;
use crate::register::PowerRegister;
use crate::Peripheral as P;
use crate::{Peripheral, PowerError, PowerResult, REDUCED_CORE_SREG_ADDR, SREG_ADDR};

/// One row of the table: setting `bit` in `register` stops `peripheral`'s clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Gate {
    pub peripheral: Peripheral,
    pub register: PowerRegister,
    pub bit: u8,
}

impl Gate {
    pub const fn mask(&self) -> u8 {
        1 << self.bit
    }
}

const fn g(peripheral: Peripheral, register: PowerRegister, bit: u8) -> Gate {
    Gate { peripheral, register, bit }
}

/// A group of devices with identical power-reduction and prescaler layout.
#[derive(Debug)]
pub struct Family {
    pub name: &'static str,
    /// Power-reduction registers, in the order they are reported.
    pub registers: &'static [PowerRegister],
    pub gates: &'static [Gate],
    /// Masks written by `power_all_*` when they differ from the union of
    /// the individual gates (XMEGA parts gate whole ports).
    pub all_masks: Option<&'static [(PowerRegister, u8)]>,
    pub clock: Option<Prescaler>,
    pub sreg: u16,
}

impl Family {
    pub fn gate(&self, peripheral: Peripheral) -> Option<&'static Gate> {
        self.gates.iter().find(|gt| gt.peripheral == peripheral)
    }

    pub fn peripherals(&self) -> impl Iterator<Item = Peripheral> + '_ {
        self.gates.iter().map(|gt| gt.peripheral)
    }

    /// Per-register masks for `power_all_enable()` / `power_all_disable()`.
    pub fn all_masks(&self) -> Vec<(PowerRegister, u8)> {
        if let Some(masks) = self.all_masks {
            return masks.to_vec();
        }
        self.registers
            .iter()
            .filter_map(|reg| {
                let mask = self
                    .gates
                    .iter()
                    .filter(|gt| gt.register == *reg)
                    .fold(0u8, |acc, gt| acc | gt.mask());
                (mask != 0).then_some((*reg, mask))
            })
            .collect()
    }
}

/// A concrete part number.
#[derive(Debug)]
pub struct Device {
    pub name: &'static str,
    /// Three signature bytes as read by a programmer (`0x1E ...`).
    pub signature: Option<[u8; 3]>,
    pub family: &'static Family,
}

impl Device {
    pub fn supports(&self, peripheral: Peripheral) -> bool {
        self.family.gate(peripheral).is_some()
    }

    pub fn has_prescaler(&self) -> bool {
        self.family.clock.is_some()
    }
}

// ─── Registers ──────────────────────────────────────────────────────────────

const PRR: PowerRegister = PowerRegister::new("PRR", 0x64);
const PRR0: PowerRegister = PowerRegister::new("PRR0", 0x64);
const PRR1: PowerRegister = PowerRegister::new("PRR1", 0x65);
const PRR2: PowerRegister = PowerRegister::new("PRR2", 0x63);
const PRR_TINY_X5: PowerRegister = PowerRegister::new("PRR", 0x40);
const PRR_TINY_X4: PowerRegister = PowerRegister::new("PRR", 0x20);
const PRR_TINY_X61: PowerRegister = PowerRegister::new("PRR", 0x36);
const PRR_TINY_RC: PowerRegister = PowerRegister::new("PRR", 0x35);
const PRR_TINY_13A: PowerRegister = PowerRegister::new("PRR", 0x45);

const PR_PRGEN: PowerRegister = PowerRegister::new("PR_PRGEN", 0x70);
const PR_PRPA: PowerRegister = PowerRegister::new("PR_PRPA", 0x71);
const PR_PRPB: PowerRegister = PowerRegister::new("PR_PRPB", 0x72);
const PR_PRPC: PowerRegister = PowerRegister::new("PR_PRPC", 0x73);
const PR_PRPD: PowerRegister = PowerRegister::new("PR_PRPD", 0x74);
const PR_PRPE: PowerRegister = PowerRegister::new("PR_PRPE", 0x75);
const PR_PRPF: PowerRegister = PowerRegister::new("PR_PRPF", 0x76);

const CLKPR: PowerRegister = PowerRegister::new("CLKPR", 0x61);
const CLKPR_TINY: PowerRegister = PowerRegister::new("CLKPR", 0x46);
const CLKPR_TINY_X61: PowerRegister = PowerRegister::new("CLKPR", 0x48);
const CLKPSR: PowerRegister = PowerRegister::new("CLKPSR", 0x36);
const XDIV: PowerRegister = PowerRegister::new("XDIV", 0x5C);
const CCP_TINY_RC: u16 = 0x3C;

const CLK_MEGA: Prescaler = Prescaler::Clkpr { reg: CLKPR, select_bits: 4, rc_oscillator: false };
const CLK_RF: Prescaler = Prescaler::Clkpr { reg: CLKPR, select_bits: 4, rc_oscillator: true };
const CLK_HVB: Prescaler = Prescaler::Clkpr { reg: CLKPR, select_bits: 2, rc_oscillator: false };
const CLK_TINY: Prescaler = Prescaler::Clkpr { reg: CLKPR_TINY, select_bits: 4, rc_oscillator: false };
const CLK_TINY_X61: Prescaler = Prescaler::Clkpr { reg: CLKPR_TINY_X61, select_bits: 4, rc_oscillator: false };
const CLK_TINY_RC: Prescaler = Prescaler::Ccp { ccp: CCP_TINY_RC, reg: CLKPSR };
const CLK_XDIV: Prescaler = Prescaler::Xdiv { reg: XDIV };

// XMEGA PR bit masks
const PR_DMA: u8 = 0;
const PR_EDMA: u8 = 0;
const PR_EVSYS: u8 = 1;
const PR_RTC: u8 = 2;
const PR_EBI: u8 = 3;
const PR_AES: u8 = 4;
const PR_LCD: u8 = 5;
const PR_USB: u8 = 6;
const PR_XCL: u8 = 7;
const PR_AC: u8 = 0;
const PR_ADC: u8 = 1;
const PR_DAC: u8 = 2;
const PR_TC0: u8 = 0;
const PR_TC1: u8 = 1;
const PR_TC4: u8 = 0;
const PR_TC5: u8 = 1;
const PR_HIRES: u8 = 2;
const PR_SPI: u8 = 3;
const PR_USART0: u8 = 4;
const PR_USART1: u8 = 5;
const PR_TWI: u8 = 6;

// ─── megaAVR ────────────────────────────────────────────────────────────────

pub static MEGA_X8: Family = Family {
    name: "megaAVR 48/88/168/328",
    registers: &[PRR],
    gates: &[
        g(P::Adc, PRR, 0),
        g(P::Usart0, PRR, 1),
        g(P::Spi, PRR, 2),
        g(P::Timer1, PRR, 3),
        g(P::Timer0, PRR, 5),
        g(P::Timer2, PRR, 6),
        g(P::Twi, PRR, 7),
    ],
    all_masks: None,
    clock: Some(CLK_MEGA),
    sreg: SREG_ADDR,
};

pub static MEGA_X4_DUAL_USART: Family = Family {
    name: "megaAVR 164/324/644 (dual USART)",
    registers: &[PRR0],
    gates: &[
        g(P::Adc, PRR0, 0),
        g(P::Usart0, PRR0, 1),
        g(P::Spi, PRR0, 2),
        g(P::Timer1, PRR0, 3),
        g(P::Usart1, PRR0, 4),
        g(P::Timer0, PRR0, 5),
        g(P::Timer2, PRR0, 6),
        g(P::Twi, PRR0, 7),
    ],
    all_masks: None,
    clock: Some(CLK_MEGA),
    sreg: SREG_ADDR,
};

pub static MEGA_644: Family = Family {
    name: "megaAVR 644/164PA",
    registers: &[PRR0],
    gates: &[
        g(P::Adc, PRR0, 0),
        g(P::Usart0, PRR0, 1),
        g(P::Spi, PRR0, 2),
        g(P::Timer1, PRR0, 3),
        g(P::Timer0, PRR0, 5),
        g(P::Timer2, PRR0, 6),
        g(P::Twi, PRR0, 7),
    ],
    all_masks: None,
    clock: Some(CLK_MEGA),
    sreg: SREG_ADDR,
};

pub static MEGA_1284: Family = Family {
    name: "megaAVR 1284",
    registers: &[PRR0, PRR1],
    gates: &[
        g(P::Adc, PRR0, 0),
        g(P::Usart0, PRR0, 1),
        g(P::Spi, PRR0, 2),
        g(P::Timer1, PRR0, 3),
        g(P::Timer0, PRR0, 5),
        g(P::Timer2, PRR0, 6),
        g(P::Twi, PRR0, 7),
        g(P::Timer3, PRR1, 0),
    ],
    all_masks: None,
    clock: Some(CLK_MEGA),
    sreg: SREG_ADDR,
};

pub static MEGA_1284P: Family = Family {
    name: "megaAVR 1284P",
    registers: &[PRR0, PRR1],
    gates: &[
        g(P::Adc, PRR0, 0),
        g(P::Usart0, PRR0, 1),
        g(P::Spi, PRR0, 2),
        g(P::Timer1, PRR0, 3),
        g(P::Usart1, PRR0, 4),
        g(P::Timer0, PRR0, 5),
        g(P::Timer2, PRR0, 6),
        g(P::Twi, PRR0, 7),
        g(P::Timer3, PRR1, 0),
    ],
    all_masks: None,
    clock: Some(CLK_MEGA),
    sreg: SREG_ADDR,
};

pub static MEGA_2560: Family = Family {
    name: "megaAVR 640/1280/1281/2560/2561",
    registers: &[PRR0, PRR1],
    gates: &[
        g(P::Adc, PRR0, 0),
        g(P::Usart0, PRR0, 1),
        g(P::Spi, PRR0, 2),
        g(P::Timer1, PRR0, 3),
        g(P::Timer0, PRR0, 5),
        g(P::Timer2, PRR0, 6),
        g(P::Twi, PRR0, 7),
        g(P::Usart1, PRR1, 0),
        g(P::Usart2, PRR1, 1),
        g(P::Usart3, PRR1, 2),
        g(P::Timer3, PRR1, 3),
        g(P::Timer4, PRR1, 4),
        g(P::Timer5, PRR1, 5),
    ],
    all_masks: None,
    clock: Some(CLK_MEGA),
    sreg: SREG_ADDR,
};

pub static MEGA_128RFA1: Family = Family {
    name: "megaAVR 128RFA1",
    registers: &[PRR0, PRR1],
    gates: &[
        g(P::Adc, PRR0, 0),
        g(P::Usart0, PRR0, 1),
        g(P::Spi, PRR0, 2),
        g(P::Timer1, PRR0, 3),
        g(P::Timer0, PRR0, 5),
        g(P::Timer2, PRR0, 6),
        g(P::Twi, PRR0, 7),
        g(P::Usart1, PRR1, 0),
        g(P::Timer3, PRR1, 3),
        g(P::Timer4, PRR1, 4),
        g(P::Timer5, PRR1, 5),
    ],
    all_masks: None,
    clock: Some(CLK_RF),
    sreg: SREG_ADDR,
};

pub static MEGA_RFR2: Family = Family {
    name: "megaAVR RFR2",
    registers: &[PRR0, PRR1, PRR2],
    gates: &[
        g(P::Adc, PRR0, 0),
        g(P::Usart0, PRR0, 1),
        g(P::Spi, PRR0, 2),
        g(P::Timer1, PRR0, 3),
        g(P::Pga, PRR0, 4),
        g(P::Timer0, PRR0, 5),
        g(P::Timer2, PRR0, 6),
        g(P::Twi, PRR0, 7),
        g(P::Usart1, PRR1, 0),
        g(P::Timer3, PRR1, 3),
        g(P::Timer4, PRR1, 4),
        g(P::Timer5, PRR1, 5),
        g(P::Transceiver, PRR1, 6),
        g(P::Ram0, PRR2, 0),
        g(P::Ram1, PRR2, 1),
        g(P::Ram2, PRR2, 2),
        g(P::Ram3, PRR2, 3),
    ],
    all_masks: Some(&[(PRR0, 0xEF), (PRR1, 0x79), (PRR2, 0x0F)]),
    clock: Some(CLK_RF),
    sreg: SREG_ADDR,
};

pub static MEGA_U4: Family = Family {
    name: "megaAVR 16U4/32U4",
    registers: &[PRR0, PRR1],
    gates: &[
        g(P::Adc, PRR0, 0),
        g(P::Usart0, PRR0, 1),
        g(P::Spi, PRR0, 2),
        g(P::Timer1, PRR0, 3),
        g(P::Timer0, PRR0, 5),
        g(P::Timer2, PRR0, 6),
        g(P::Twi, PRR0, 7),
        g(P::Usart1, PRR1, 0),
        g(P::Timer3, PRR1, 3),
        g(P::Usb, PRR1, 7),
    ],
    all_masks: None,
    clock: Some(CLK_MEGA),
    sreg: SREG_ADDR,
};

pub static AT90USB_LARGE: Family = Family {
    name: "AT90USB646/647/1286/1287, ATmega32U6",
    registers: &[PRR0, PRR1],
    gates: &[
        g(P::Adc, PRR0, 0),
        g(P::Spi, PRR0, 2),
        g(P::Timer1, PRR0, 3),
        g(P::Timer0, PRR0, 5),
        g(P::Timer2, PRR0, 6),
        g(P::Twi, PRR0, 7),
        g(P::Usart1, PRR1, 0),
        g(P::Timer3, PRR1, 3),
        g(P::Usb, PRR1, 7),
    ],
    all_masks: None,
    clock: Some(CLK_MEGA),
    sreg: SREG_ADDR,
};

pub static AT90USB_SMALL: Family = Family {
    name: "AT90USB82/162, ATmega8U2/16U2/32U2",
    registers: &[PRR0, PRR1],
    gates: &[
        g(P::Spi, PRR0, 2),
        g(P::Timer1, PRR0, 3),
        g(P::Timer0, PRR0, 5),
        g(P::Usart1, PRR1, 0),
        g(P::Usb, PRR1, 7),
    ],
    all_masks: None,
    clock: Some(CLK_MEGA),
    sreg: SREG_ADDR,
};

pub static MEGA_X5: Family = Family {
    name: "megaAVR 165/325/645",
    registers: &[PRR],
    gates: &[
        g(P::Adc, PRR, 0),
        g(P::Usart0, PRR, 1),
        g(P::Spi, PRR, 2),
        g(P::Timer1, PRR, 3),
    ],
    all_masks: None,
    clock: Some(CLK_MEGA),
    sreg: SREG_ADDR,
};

pub static MEGA_X9_LCD: Family = Family {
    name: "megaAVR 169/329/649 (LCD)",
    registers: &[PRR],
    gates: &[
        g(P::Adc, PRR, 0),
        g(P::Usart0, PRR, 1),
        g(P::Spi, PRR, 2),
        g(P::Timer1, PRR, 3),
        g(P::Lcd, PRR, 4),
    ],
    all_masks: None,
    clock: Some(CLK_MEGA),
    sreg: SREG_ADDR,
};

pub static MEGA_M1_C1: Family = Family {
    name: "megaAVR 16M1/32M1/64M1/32C1/64C1",
    registers: &[PRR],
    gates: &[
        g(P::Adc, PRR, 0),
        g(P::Lin, PRR, 1),
        g(P::Spi, PRR, 2),
        g(P::Timer0, PRR, 3),
        g(P::Timer1, PRR, 4),
        g(P::Psc, PRR, 5),
        g(P::Can, PRR, 6),
    ],
    all_masks: None,
    clock: Some(CLK_MEGA),
    sreg: SREG_ADDR,
};

/// Smart-battery parts: voltage ADC and regulator monitor, CLKPS is two bits wide.
pub static MEGA_HVB: Family = Family {
    name: "megaAVR 16HVB/32HVB",
    registers: &[PRR0],
    gates: &[
        g(P::Vadc, PRR0, 0),
        g(P::Timer0, PRR0, 1),
        g(P::Timer1, PRR0, 2),
        g(P::Spi, PRR0, 3),
        g(P::Vrm, PRR0, 5),
        g(P::Twi, PRR0, 6),
    ],
    all_masks: None,
    clock: Some(CLK_HVB),
    sreg: SREG_ADDR,
};

pub static MEGA_406: Family = Family {
    name: "megaAVR 406",
    registers: &[PRR0],
    gates: &[
        g(P::Vadc, PRR0, 0),
        g(P::Timer0, PRR0, 1),
        g(P::Timer1, PRR0, 2),
        g(P::Twi, PRR0, 3),
    ],
    all_masks: None,
    clock: None,
    sreg: SREG_ADDR,
};

/// Parts with CLKPR but no power-reduction register.
pub static CLKPR_ONLY: Family = Family {
    name: "AT90CAN / ATmega162 (prescaler only)",
    registers: &[],
    gates: &[],
    all_masks: None,
    clock: Some(CLK_MEGA),
    sreg: SREG_ADDR,
};

pub static XDIV_ONLY: Family = Family {
    name: "ATmega64/103/128 (XDIV)",
    registers: &[],
    gates: &[],
    all_masks: None,
    clock: Some(CLK_XDIV),
    sreg: SREG_ADDR,
};

// ─── tinyAVR ────────────────────────────────────────────────────────────────

pub static TINY_X5: Family = Family {
    name: "tinyAVR 25/45/85",
    registers: &[PRR_TINY_X5],
    gates: &[
        g(P::Adc, PRR_TINY_X5, 0),
        g(P::Usi, PRR_TINY_X5, 1),
        g(P::Timer0, PRR_TINY_X5, 2),
        g(P::Timer1, PRR_TINY_X5, 3),
    ],
    all_masks: None,
    clock: Some(CLK_TINY),
    sreg: SREG_ADDR,
};

pub static TINY_X4: Family = Family {
    name: "tinyAVR 24/44/84/43U",
    registers: &[PRR_TINY_X4],
    gates: &[
        g(P::Adc, PRR_TINY_X4, 0),
        g(P::Usi, PRR_TINY_X4, 1),
        g(P::Timer0, PRR_TINY_X4, 2),
        g(P::Timer1, PRR_TINY_X4, 3),
    ],
    all_masks: None,
    clock: Some(CLK_TINY),
    sreg: SREG_ADDR,
};

pub static TINY_X61: Family = Family {
    name: "tinyAVR 261/461/861",
    registers: &[PRR_TINY_X61],
    gates: &[
        g(P::Adc, PRR_TINY_X61, 0),
        g(P::Usi, PRR_TINY_X61, 1),
        g(P::Timer0, PRR_TINY_X61, 2),
        g(P::Timer1, PRR_TINY_X61, 3),
    ],
    all_masks: None,
    clock: Some(CLK_TINY_X61),
    sreg: SREG_ADDR,
};

pub static TINY_X8: Family = Family {
    name: "tinyAVR 48/88",
    registers: &[PRR],
    gates: &[
        g(P::Adc, PRR, 0),
        g(P::Spi, PRR, 2),
        g(P::Timer1, PRR, 3),
        g(P::Timer0, PRR, 5),
        g(P::Twi, PRR, 7),
    ],
    all_masks: None,
    clock: Some(CLK_MEGA),
    sreg: SREG_ADDR,
};

pub static TINY_X7: Family = Family {
    name: "tinyAVR 87/167",
    registers: &[PRR],
    gates: &[
        g(P::Adc, PRR, 0),
        g(P::Usi, PRR, 1),
        g(P::Timer0, PRR, 2),
        g(P::Timer1, PRR, 3),
        g(P::Spi, PRR, 4),
        g(P::Lin, PRR, 5),
    ],
    all_masks: None,
    clock: Some(CLK_MEGA),
    sreg: SREG_ADDR,
};

pub static TINY_RC: Family = Family {
    name: "tinyAVR 4/5/9/10 (reduced core)",
    registers: &[PRR_TINY_RC],
    gates: &[
        g(P::Timer0, PRR_TINY_RC, 0),
        g(P::Adc, PRR_TINY_RC, 1),
    ],
    all_masks: None,
    clock: Some(CLK_TINY_RC),
    sreg: REDUCED_CORE_SREG_ADDR,
};

/// ATtiny13A: the reduced-core PRR bit pair on a classic core.
pub static TINY_13A: Family = Family {
    name: "tinyAVR 13A",
    registers: &[PRR_TINY_13A],
    gates: &[
        g(P::Adc, PRR_TINY_13A, 0),
        g(P::Timer0, PRR_TINY_13A, 1),
    ],
    all_masks: None,
    clock: Some(CLK_TINY),
    sreg: SREG_ADDR,
};

pub static TINY_CLKPR_ONLY: Family = Family {
    name: "tinyAVR 13/2313/4313 (prescaler only)",
    registers: &[],
    gates: &[],
    all_masks: None,
    clock: Some(CLK_TINY),
    sreg: SREG_ADDR,
};

// ─── XMEGA ──────────────────────────────────────────────────────────────────

const XMEGA_REGS: &[PowerRegister] =
    &[PR_PRGEN, PR_PRPA, PR_PRPB, PR_PRPC, PR_PRPD, PR_PRPE, PR_PRPF];

pub static XMEGA_A: Family = Family {
    name: "XMEGA A1/A3/A4",
    registers: XMEGA_REGS,
    gates: &[
        g(P::Dma, PR_PRGEN, PR_DMA),
        g(P::Evsys, PR_PRGEN, PR_EVSYS),
        g(P::Rtc, PR_PRGEN, PR_RTC),
        g(P::Ebi, PR_PRGEN, PR_EBI),
        g(P::Aes, PR_PRGEN, PR_AES),
        g(P::Aca, PR_PRPA, PR_AC),
        g(P::Adca, PR_PRPA, PR_ADC),
        g(P::Daca, PR_PRPA, PR_DAC),
        g(P::Acb, PR_PRPB, PR_AC),
        g(P::Adcb, PR_PRPB, PR_ADC),
        g(P::Dacb, PR_PRPB, PR_DAC),
        g(P::Tc0c, PR_PRPC, PR_TC0),
        g(P::Tc1c, PR_PRPC, PR_TC1),
        g(P::Hiresc, PR_PRPC, PR_HIRES),
        g(P::Spic, PR_PRPC, PR_SPI),
        g(P::Usartc0, PR_PRPC, PR_USART0),
        g(P::Usartc1, PR_PRPC, PR_USART1),
        g(P::Twic, PR_PRPC, PR_TWI),
        g(P::Tc0d, PR_PRPD, PR_TC0),
        g(P::Tc1d, PR_PRPD, PR_TC1),
        g(P::Hiresd, PR_PRPD, PR_HIRES),
        g(P::Spid, PR_PRPD, PR_SPI),
        g(P::Usartd0, PR_PRPD, PR_USART0),
        g(P::Usartd1, PR_PRPD, PR_USART1),
        g(P::Twid, PR_PRPD, PR_TWI),
        g(P::Tc0e, PR_PRPE, PR_TC0),
        g(P::Tc1e, PR_PRPE, PR_TC1),
        g(P::Hirese, PR_PRPE, PR_HIRES),
        g(P::Spie, PR_PRPE, PR_SPI),
        g(P::Usarte0, PR_PRPE, PR_USART0),
        g(P::Usarte1, PR_PRPE, PR_USART1),
        g(P::Twie, PR_PRPE, PR_TWI),
        g(P::Tc0f, PR_PRPF, PR_TC0),
        g(P::Tc1f, PR_PRPF, PR_TC1),
        g(P::Hiresf, PR_PRPF, PR_HIRES),
        g(P::Spif, PR_PRPF, PR_SPI),
        g(P::Usartf0, PR_PRPF, PR_USART0),
        g(P::Usartf1, PR_PRPF, PR_USART1),
        g(P::Twif, PR_PRPF, PR_TWI),
    ],
    all_masks: Some(&[
        (PR_PRGEN, 0x1F),
        (PR_PRPA, 0x07),
        (PR_PRPB, 0x07),
        (PR_PRPC, 0x7F),
        (PR_PRPD, 0x7F),
        (PR_PRPE, 0x7F),
        (PR_PRPF, 0x7F),
    ]),
    clock: None,
    sreg: SREG_ADDR,
};

/// XMEGA A-series parts with a USB module; same layout as [`XMEGA_A`] plus USB.
pub static XMEGA_A_USB: Family = Family {
    name: "XMEGA AU/BU, 384C3",
    registers: XMEGA_REGS,
    gates: &[
        g(P::Dma, PR_PRGEN, PR_DMA),
        g(P::Evsys, PR_PRGEN, PR_EVSYS),
        g(P::Rtc, PR_PRGEN, PR_RTC),
        g(P::Ebi, PR_PRGEN, PR_EBI),
        g(P::Aes, PR_PRGEN, PR_AES),
        g(P::Usb, PR_PRGEN, PR_USB),
        g(P::Aca, PR_PRPA, PR_AC),
        g(P::Adca, PR_PRPA, PR_ADC),
        g(P::Daca, PR_PRPA, PR_DAC),
        g(P::Acb, PR_PRPB, PR_AC),
        g(P::Adcb, PR_PRPB, PR_ADC),
        g(P::Dacb, PR_PRPB, PR_DAC),
        g(P::Tc0c, PR_PRPC, PR_TC0),
        g(P::Tc1c, PR_PRPC, PR_TC1),
        g(P::Hiresc, PR_PRPC, PR_HIRES),
        g(P::Spic, PR_PRPC, PR_SPI),
        g(P::Usartc0, PR_PRPC, PR_USART0),
        g(P::Usartc1, PR_PRPC, PR_USART1),
        g(P::Twic, PR_PRPC, PR_TWI),
        g(P::Tc0d, PR_PRPD, PR_TC0),
        g(P::Tc1d, PR_PRPD, PR_TC1),
        g(P::Hiresd, PR_PRPD, PR_HIRES),
        g(P::Spid, PR_PRPD, PR_SPI),
        g(P::Usartd0, PR_PRPD, PR_USART0),
        g(P::Usartd1, PR_PRPD, PR_USART1),
        g(P::Twid, PR_PRPD, PR_TWI),
        g(P::Tc0e, PR_PRPE, PR_TC0),
        g(P::Tc1e, PR_PRPE, PR_TC1),
        g(P::Hirese, PR_PRPE, PR_HIRES),
        g(P::Spie, PR_PRPE, PR_SPI),
        g(P::Usarte0, PR_PRPE, PR_USART0),
        g(P::Usarte1, PR_PRPE, PR_USART1),
        g(P::Twie, PR_PRPE, PR_TWI),
        g(P::Tc0f, PR_PRPF, PR_TC0),
        g(P::Tc1f, PR_PRPF, PR_TC1),
        g(P::Hiresf, PR_PRPF, PR_HIRES),
        g(P::Spif, PR_PRPF, PR_SPI),
        g(P::Usartf0, PR_PRPF, PR_USART0),
        g(P::Usartf1, PR_PRPF, PR_USART1),
        g(P::Twif, PR_PRPF, PR_TWI),
    ],
    all_masks: Some(&[
        (PR_PRGEN, 0x5F),
        (PR_PRPA, 0x07),
        (PR_PRPB, 0x07),
        (PR_PRPC, 0x7F),
        (PR_PRPD, 0x7F),
        (PR_PRPE, 0x7F),
        (PR_PRPF, 0x7F),
    ]),
    clock: None,
    sreg: SREG_ADDR,
};

pub static XMEGA_C: Family = Family {
    name: "XMEGA C3/C4",
    registers: XMEGA_REGS,
    gates: &[
        g(P::Dma, PR_PRGEN, PR_DMA),
        g(P::Evsys, PR_PRGEN, PR_EVSYS),
        g(P::Rtc, PR_PRGEN, PR_RTC),
        g(P::Aes, PR_PRGEN, PR_AES),
        g(P::Usb, PR_PRGEN, PR_USB),
        g(P::Aca, PR_PRPA, PR_AC),
        g(P::Adca, PR_PRPA, PR_ADC),
        g(P::Tc0c, PR_PRPC, PR_TC0),
        g(P::Tc1c, PR_PRPC, PR_TC1),
        g(P::Hiresc, PR_PRPC, PR_HIRES),
        g(P::Spic, PR_PRPC, PR_SPI),
        g(P::Usartc0, PR_PRPC, PR_USART0),
        g(P::Usartc1, PR_PRPC, PR_USART1),
        g(P::Twic, PR_PRPC, PR_TWI),
        g(P::Tc0d, PR_PRPD, PR_TC0),
        g(P::Spid, PR_PRPD, PR_SPI),
        g(P::Usartd0, PR_PRPD, PR_USART0),
        g(P::Tc0e, PR_PRPE, PR_TC0),
        g(P::Usarte0, PR_PRPE, PR_USART0),
        g(P::Twie, PR_PRPE, PR_TWI),
        g(P::Tc0f, PR_PRPF, PR_TC0),
        g(P::Usartf0, PR_PRPF, PR_USART0),
    ],
    all_masks: Some(&[
        (PR_PRGEN, 0x57),
        (PR_PRPA, 0x03),
        (PR_PRPC, 0x7F),
        (PR_PRPD, 0x19),
        (PR_PRPE, 0x51),
        (PR_PRPF, 0x11),
    ]),
    clock: None,
    sreg: SREG_ADDR,
};

/// 64/128/192/256 D3 and 64/128 D4.
pub static XMEGA_D: Family = Family {
    name: "XMEGA D3/D4",
    registers: XMEGA_REGS,
    gates: &[
        g(P::Evsys, PR_PRGEN, PR_EVSYS),
        g(P::Rtc, PR_PRGEN, PR_RTC),
        g(P::Aca, PR_PRPA, PR_AC),
        g(P::Adca, PR_PRPA, PR_ADC),
        g(P::Tc0c, PR_PRPC, PR_TC0),
        g(P::Tc1c, PR_PRPC, PR_TC1),
        g(P::Hiresc, PR_PRPC, PR_HIRES),
        g(P::Spic, PR_PRPC, PR_SPI),
        g(P::Usartc0, PR_PRPC, PR_USART0),
        g(P::Twic, PR_PRPC, PR_TWI),
        g(P::Tc0d, PR_PRPD, PR_TC0),
        g(P::Spid, PR_PRPD, PR_SPI),
        g(P::Usartd0, PR_PRPD, PR_USART0),
        g(P::Tc0e, PR_PRPE, PR_TC0),
        g(P::Usarte0, PR_PRPE, PR_USART0),
        g(P::Twie, PR_PRPE, PR_TWI),
        g(P::Tc0f, PR_PRPF, PR_TC0),
        g(P::Usartf0, PR_PRPF, PR_USART0),
    ],
    all_masks: Some(&[
        (PR_PRGEN, 0x06),
        (PR_PRPA, 0x03),
        (PR_PRPC, 0x5F),
        (PR_PRPD, 0x19),
        (PR_PRPE, 0x51),
        (PR_PRPF, 0x11),
    ]),
    clock: None,
    sreg: SREG_ADDR,
};

/// 16D4 and 32D4: every port carries the full timer/serial set.
pub static XMEGA_D_SMALL: Family = Family {
    name: "XMEGA 16D4/32D4",
    registers: XMEGA_REGS,
    gates: &[
        g(P::Evsys, PR_PRGEN, PR_EVSYS),
        g(P::Rtc, PR_PRGEN, PR_RTC),
        g(P::Aca, PR_PRPA, PR_AC),
        g(P::Adca, PR_PRPA, PR_ADC),
        g(P::Acb, PR_PRPB, PR_AC),
        g(P::Adcb, PR_PRPB, PR_ADC),
        g(P::Tc0c, PR_PRPC, PR_TC0),
        g(P::Tc1c, PR_PRPC, PR_TC1),
        g(P::Hiresc, PR_PRPC, PR_HIRES),
        g(P::Spic, PR_PRPC, PR_SPI),
        g(P::Usartc0, PR_PRPC, PR_USART0),
        g(P::Twic, PR_PRPC, PR_TWI),
        g(P::Tc0d, PR_PRPD, PR_TC0),
        g(P::Tc1d, PR_PRPD, PR_TC1),
        g(P::Hiresd, PR_PRPD, PR_HIRES),
        g(P::Spid, PR_PRPD, PR_SPI),
        g(P::Usartd0, PR_PRPD, PR_USART0),
        g(P::Twid, PR_PRPD, PR_TWI),
        g(P::Tc0e, PR_PRPE, PR_TC0),
        g(P::Tc1e, PR_PRPE, PR_TC1),
        g(P::Hirese, PR_PRPE, PR_HIRES),
        g(P::Spie, PR_PRPE, PR_SPI),
        g(P::Usarte0, PR_PRPE, PR_USART0),
        g(P::Twie, PR_PRPE, PR_TWI),
        g(P::Tc0f, PR_PRPF, PR_TC0),
        g(P::Tc1f, PR_PRPF, PR_TC1),
        g(P::Hiresf, PR_PRPF, PR_HIRES),
        g(P::Spif, PR_PRPF, PR_SPI),
        g(P::Usartf0, PR_PRPF, PR_USART0),
        g(P::Twif, PR_PRPF, PR_TWI),
    ],
    all_masks: Some(&[
        (PR_PRGEN, 0x06),
        (PR_PRPA, 0x03),
        (PR_PRPC, 0x5F),
        (PR_PRPD, 0x5F),
        (PR_PRPE, 0x5F),
        (PR_PRPF, 0x5F),
    ]),
    clock: None,
    sreg: SREG_ADDR,
};

/// 32D3 lacks the port B analog blocks of the other small D parts.
pub static XMEGA_32D3: Family = Family {
    name: "XMEGA 32D3",
    registers: XMEGA_REGS,
    gates: &[
        g(P::Evsys, PR_PRGEN, PR_EVSYS),
        g(P::Rtc, PR_PRGEN, PR_RTC),
        g(P::Aca, PR_PRPA, PR_AC),
        g(P::Adca, PR_PRPA, PR_ADC),
        g(P::Tc0c, PR_PRPC, PR_TC0),
        g(P::Tc1c, PR_PRPC, PR_TC1),
        g(P::Hiresc, PR_PRPC, PR_HIRES),
        g(P::Spic, PR_PRPC, PR_SPI),
        g(P::Usartc0, PR_PRPC, PR_USART0),
        g(P::Twic, PR_PRPC, PR_TWI),
        g(P::Tc0d, PR_PRPD, PR_TC0),
        g(P::Tc1d, PR_PRPD, PR_TC1),
        g(P::Hiresd, PR_PRPD, PR_HIRES),
        g(P::Spid, PR_PRPD, PR_SPI),
        g(P::Usartd0, PR_PRPD, PR_USART0),
        g(P::Twid, PR_PRPD, PR_TWI),
        g(P::Tc0e, PR_PRPE, PR_TC0),
        g(P::Tc1e, PR_PRPE, PR_TC1),
        g(P::Hirese, PR_PRPE, PR_HIRES),
        g(P::Spie, PR_PRPE, PR_SPI),
        g(P::Usarte0, PR_PRPE, PR_USART0),
        g(P::Twie, PR_PRPE, PR_TWI),
        g(P::Tc0f, PR_PRPF, PR_TC0),
        g(P::Tc1f, PR_PRPF, PR_TC1),
        g(P::Hiresf, PR_PRPF, PR_HIRES),
        g(P::Spif, PR_PRPF, PR_SPI),
        g(P::Usartf0, PR_PRPF, PR_USART0),
        g(P::Twif, PR_PRPF, PR_TWI),
    ],
    all_masks: Some(&[
        (PR_PRGEN, 0x06),
        (PR_PRPA, 0x03),
        (PR_PRPC, 0x5F),
        (PR_PRPD, 0x5F),
        (PR_PRPE, 0x5F),
        (PR_PRPF, 0x5F),
    ]),
    clock: None,
    sreg: SREG_ADDR,
};

pub static XMEGA_E5: Family = Family {
    name: "XMEGA E5",
    registers: &[PR_PRGEN, PR_PRPA, PR_PRPC, PR_PRPD],
    gates: &[
        g(P::Edma, PR_PRGEN, PR_EDMA),
        g(P::Evsys, PR_PRGEN, PR_EVSYS),
        g(P::Rtc, PR_PRGEN, PR_RTC),
        g(P::Xcl, PR_PRGEN, PR_XCL),
        g(P::Aca, PR_PRPA, PR_AC),
        g(P::Adca, PR_PRPA, PR_ADC),
        g(P::Daca, PR_PRPA, PR_DAC),
        g(P::Tc4c, PR_PRPC, PR_TC4),
        g(P::Tc5c, PR_PRPC, PR_TC5),
        g(P::Hiresc, PR_PRPC, PR_HIRES),
        g(P::Spic, PR_PRPC, PR_SPI),
        g(P::Usartc0, PR_PRPC, PR_USART0),
        g(P::Twic, PR_PRPC, PR_TWI),
        g(P::Tc5d, PR_PRPD, PR_TC5),
        g(P::Usartd0, PR_PRPD, PR_USART0),
    ],
    all_masks: None,
    clock: None,
    sreg: SREG_ADDR,
};

pub static XMEGA_B: Family = Family {
    name: "XMEGA B1/B3",
    registers: XMEGA_REGS,
    gates: &[
        g(P::Dma, PR_PRGEN, PR_DMA),
        g(P::Evsys, PR_PRGEN, PR_EVSYS),
        g(P::Rtc, PR_PRGEN, PR_RTC),
        g(P::Aes, PR_PRGEN, PR_AES),
        g(P::Lcd, PR_PRGEN, PR_LCD),
        g(P::Usb, PR_PRGEN, PR_USB),
        g(P::Aca, PR_PRPA, PR_AC),
        g(P::Adca, PR_PRPA, PR_ADC),
        g(P::Acb, PR_PRPB, PR_AC),
        g(P::Adcb, PR_PRPB, PR_ADC),
        g(P::Tc0c, PR_PRPC, PR_TC0),
        g(P::Tc1c, PR_PRPC, PR_TC1),
        g(P::Hiresc, PR_PRPC, PR_HIRES),
        g(P::Spic, PR_PRPC, PR_SPI),
        g(P::Usartc0, PR_PRPC, PR_USART0),
        g(P::Twic, PR_PRPC, PR_TWI),
        g(P::Tc0e, PR_PRPE, PR_TC0),
        g(P::Usarte0, PR_PRPE, PR_USART0),
    ],
    all_masks: None,
    clock: None,
    sreg: SREG_ADDR,
};

// ─── Device list ────────────────────────────────────────────────────────────

const fn dev(name: &'static str, family: &'static Family) -> Device {
    Device { name, signature: None, family }
}

const fn sig(name: &'static str, signature: [u8; 3], family: &'static Family) -> Device {
    Device { name, signature: Some(signature), family }
}

/// Every known device. Where several parts share a signature only the first
/// listed part carries it, so [`by_signature`] resolves to the base part.
pub static DEVICES: &[Device] = &[
    sig("ATmega48", [0x1E, 0x92, 0x05], &MEGA_X8),
    dev("ATmega48A", &MEGA_X8),
    sig("ATmega48P", [0x1E, 0x92, 0x0A], &MEGA_X8),
    dev("ATmega48PA", &MEGA_X8),
    dev("ATmega48PB", &MEGA_X8),
    sig("ATmega88", [0x1E, 0x93, 0x0A], &MEGA_X8),
    dev("ATmega88A", &MEGA_X8),
    sig("ATmega88P", [0x1E, 0x93, 0x0F], &MEGA_X8),
    dev("ATmega88PA", &MEGA_X8),
    dev("ATmega88PB", &MEGA_X8),
    sig("ATmega168", [0x1E, 0x94, 0x06], &MEGA_X8),
    dev("ATmega168A", &MEGA_X8),
    sig("ATmega168P", [0x1E, 0x94, 0x0B], &MEGA_X8),
    dev("ATmega168PA", &MEGA_X8),
    dev("ATmega168PB", &MEGA_X8),
    sig("ATmega328", [0x1E, 0x95, 0x14], &MEGA_X8),
    sig("ATmega328P", [0x1E, 0x95, 0x0F], &MEGA_X8),
    dev("ATmega164A", &MEGA_X4_DUAL_USART),
    sig("ATmega164P", [0x1E, 0x94, 0x0A], &MEGA_X4_DUAL_USART),
    dev("ATmega324A", &MEGA_X4_DUAL_USART),
    sig("ATmega324P", [0x1E, 0x95, 0x08], &MEGA_X4_DUAL_USART),
    sig("ATmega324PA", [0x1E, 0x95, 0x11], &MEGA_X4_DUAL_USART),
    sig("ATmega644P", [0x1E, 0x96, 0x0A], &MEGA_X4_DUAL_USART),
    dev("ATmega644A", &MEGA_X4_DUAL_USART),
    dev("ATmega644PA", &MEGA_X4_DUAL_USART),
    sig("ATmega644", [0x1E, 0x96, 0x09], &MEGA_644),
    dev("ATmega164PA", &MEGA_644),
    sig("ATmega1284", [0x1E, 0x97, 0x06], &MEGA_1284),
    sig("ATmega1284P", [0x1E, 0x97, 0x05], &MEGA_1284P),
    sig("ATmega640", [0x1E, 0x96, 0x08], &MEGA_2560),
    sig("ATmega1280", [0x1E, 0x97, 0x03], &MEGA_2560),
    sig("ATmega1281", [0x1E, 0x97, 0x04], &MEGA_2560),
    sig("ATmega2560", [0x1E, 0x98, 0x01], &MEGA_2560),
    sig("ATmega2561", [0x1E, 0x98, 0x02], &MEGA_2560),
    sig("ATmega128RFA1", [0x1E, 0xA7, 0x01], &MEGA_128RFA1),
    sig("ATmega64RFR2", [0x1E, 0xA6, 0x02], &MEGA_RFR2),
    sig("ATmega644RFR2", [0x1E, 0xA6, 0x03], &MEGA_RFR2),
    sig("ATmega128RFR2", [0x1E, 0xA7, 0x02], &MEGA_RFR2),
    sig("ATmega1284RFR2", [0x1E, 0xA7, 0x03], &MEGA_RFR2),
    sig("ATmega256RFR2", [0x1E, 0xA8, 0x02], &MEGA_RFR2),
    sig("ATmega2564RFR2", [0x1E, 0xA8, 0x03], &MEGA_RFR2),
    sig("ATmega16U4", [0x1E, 0x94, 0x88], &MEGA_U4),
    sig("ATmega32U4", [0x1E, 0x95, 0x87], &MEGA_U4),
    sig("AT90USB646", [0x1E, 0x96, 0x82], &AT90USB_LARGE),
    dev("AT90USB647", &AT90USB_LARGE),
    sig("AT90USB1286", [0x1E, 0x97, 0x82], &AT90USB_LARGE),
    dev("AT90USB1287", &AT90USB_LARGE),
    sig("ATmega32U6", [0x1E, 0x95, 0x88], &AT90USB_LARGE),
    sig("AT90USB82", [0x1E, 0x93, 0x82], &AT90USB_SMALL),
    sig("AT90USB162", [0x1E, 0x94, 0x82], &AT90USB_SMALL),
    sig("ATmega8U2", [0x1E, 0x93, 0x89], &AT90USB_SMALL),
    sig("ATmega16U2", [0x1E, 0x94, 0x89], &AT90USB_SMALL),
    sig("ATmega32U2", [0x1E, 0x95, 0x8A], &AT90USB_SMALL),
    dev("ATmega165", &MEGA_X5),
    dev("ATmega165A", &MEGA_X5),
    dev("ATmega165P", &MEGA_X5),
    dev("ATmega165PA", &MEGA_X5),
    dev("ATmega325", &MEGA_X5),
    dev("ATmega325A", &MEGA_X5),
    dev("ATmega325P", &MEGA_X5),
    dev("ATmega325PA", &MEGA_X5),
    dev("ATmega3250", &MEGA_X5),
    dev("ATmega3250A", &MEGA_X5),
    dev("ATmega3250P", &MEGA_X5),
    dev("ATmega3250PA", &MEGA_X5),
    dev("ATmega645", &MEGA_X5),
    dev("ATmega645A", &MEGA_X5),
    dev("ATmega645P", &MEGA_X5),
    dev("ATmega6450", &MEGA_X5),
    dev("ATmega6450A", &MEGA_X5),
    dev("ATmega6450P", &MEGA_X5),
    dev("ATmega169", &MEGA_X9_LCD),
    dev("ATmega169A", &MEGA_X9_LCD),
    dev("ATmega169P", &MEGA_X9_LCD),
    dev("ATmega169PA", &MEGA_X9_LCD),
    dev("ATmega329", &MEGA_X9_LCD),
    dev("ATmega329A", &MEGA_X9_LCD),
    dev("ATmega329P", &MEGA_X9_LCD),
    dev("ATmega329PA", &MEGA_X9_LCD),
    dev("ATmega3290", &MEGA_X9_LCD),
    dev("ATmega3290A", &MEGA_X9_LCD),
    dev("ATmega3290P", &MEGA_X9_LCD),
    dev("ATmega3290PA", &MEGA_X9_LCD),
    dev("ATmega649", &MEGA_X9_LCD),
    dev("ATmega649A", &MEGA_X9_LCD),
    dev("ATmega649P", &MEGA_X9_LCD),
    dev("ATmega6490", &MEGA_X9_LCD),
    dev("ATmega6490A", &MEGA_X9_LCD),
    dev("ATmega6490P", &MEGA_X9_LCD),
    sig("ATmega16M1", [0x1E, 0x94, 0x84], &MEGA_M1_C1),
    sig("ATmega32M1", [0x1E, 0x95, 0x84], &MEGA_M1_C1),
    sig("ATmega64M1", [0x1E, 0x96, 0x84], &MEGA_M1_C1),
    sig("ATmega32C1", [0x1E, 0x95, 0x86], &MEGA_M1_C1),
    sig("ATmega64C1", [0x1E, 0x96, 0x86], &MEGA_M1_C1),
    sig("AT90CAN32", [0x1E, 0x95, 0x81], &CLKPR_ONLY),
    sig("AT90CAN64", [0x1E, 0x96, 0x81], &CLKPR_ONLY),
    sig("AT90CAN128", [0x1E, 0x97, 0x81], &CLKPR_ONLY),
    sig("ATmega162", [0x1E, 0x94, 0x04], &CLKPR_ONLY),
    dev("ATmega16HVB", &MEGA_HVB),
    dev("ATmega16HVBrevB", &MEGA_HVB),
    dev("ATmega32HVB", &MEGA_HVB),
    dev("ATmega32HVBrevB", &MEGA_HVB),
    dev("ATmega406", &MEGA_406),
    sig("ATmega64", [0x1E, 0x96, 0x02], &XDIV_ONLY),
    sig("ATmega103", [0x1E, 0x97, 0x01], &XDIV_ONLY),
    sig("ATmega128", [0x1E, 0x97, 0x02], &XDIV_ONLY),
    sig("ATtiny25", [0x1E, 0x91, 0x08], &TINY_X5),
    sig("ATtiny45", [0x1E, 0x92, 0x06], &TINY_X5),
    sig("ATtiny85", [0x1E, 0x93, 0x0B], &TINY_X5),
    sig("ATtiny24", [0x1E, 0x91, 0x0B], &TINY_X4),
    dev("ATtiny24A", &TINY_X4),
    sig("ATtiny44", [0x1E, 0x92, 0x07], &TINY_X4),
    dev("ATtiny44A", &TINY_X4),
    sig("ATtiny84", [0x1E, 0x93, 0x0C], &TINY_X4),
    dev("ATtiny84A", &TINY_X4),
    dev("ATtiny43U", &TINY_X4),
    sig("ATtiny261", [0x1E, 0x91, 0x0C], &TINY_X61),
    dev("ATtiny261A", &TINY_X61),
    sig("ATtiny461", [0x1E, 0x92, 0x08], &TINY_X61),
    dev("ATtiny461A", &TINY_X61),
    sig("ATtiny861", [0x1E, 0x93, 0x0D], &TINY_X61),
    dev("ATtiny861A", &TINY_X61),
    sig("ATtiny48", [0x1E, 0x92, 0x09], &TINY_X8),
    sig("ATtiny88", [0x1E, 0x93, 0x11], &TINY_X8),
    sig("ATtiny87", [0x1E, 0x93, 0x87], &TINY_X7),
    sig("ATtiny167", [0x1E, 0x94, 0x87], &TINY_X7),
    sig("ATtiny4", [0x1E, 0x8F, 0x0A], &TINY_RC),
    sig("ATtiny5", [0x1E, 0x8F, 0x09], &TINY_RC),
    sig("ATtiny9", [0x1E, 0x90, 0x08], &TINY_RC),
    sig("ATtiny10", [0x1E, 0x90, 0x03], &TINY_RC),
    sig("ATtiny13", [0x1E, 0x90, 0x07], &TINY_CLKPR_ONLY),
    dev("ATtiny13A", &TINY_13A),
    sig("ATtiny2313", [0x1E, 0x91, 0x0A], &TINY_CLKPR_ONLY),
    dev("ATtiny2313A", &TINY_CLKPR_ONLY),
    sig("ATtiny4313", [0x1E, 0x92, 0x0D], &TINY_CLKPR_ONLY),
    dev("ATxmega16A4", &XMEGA_A),
    dev("ATxmega32A4", &XMEGA_A),
    dev("ATxmega64A1", &XMEGA_A),
    dev("ATxmega64A1U", &XMEGA_A),
    dev("ATxmega64A3", &XMEGA_A),
    dev("ATxmega128A1", &XMEGA_A),
    dev("ATxmega128A1U", &XMEGA_A),
    dev("ATxmega128A3", &XMEGA_A),
    dev("ATxmega192A3", &XMEGA_A),
    dev("ATxmega256A3", &XMEGA_A),
    dev("ATxmega256A3B", &XMEGA_A),
    dev("ATxmega16A4U", &XMEGA_A_USB),
    dev("ATxmega32A4U", &XMEGA_A_USB),
    dev("ATxmega64A3U", &XMEGA_A_USB),
    dev("ATxmega64A4U", &XMEGA_A_USB),
    dev("ATxmega128A3U", &XMEGA_A_USB),
    dev("ATxmega128A4U", &XMEGA_A_USB),
    dev("ATxmega192A3U", &XMEGA_A_USB),
    dev("ATxmega256A3U", &XMEGA_A_USB),
    dev("ATxmega256A3BU", &XMEGA_A_USB),
    dev("ATxmega384C3", &XMEGA_A_USB),
    dev("ATxmega16C4", &XMEGA_C),
    dev("ATxmega32C3", &XMEGA_C),
    dev("ATxmega32C4", &XMEGA_C),
    dev("ATxmega64C3", &XMEGA_C),
    dev("ATxmega128C3", &XMEGA_C),
    dev("ATxmega192C3", &XMEGA_C),
    dev("ATxmega256C3", &XMEGA_C),
    dev("ATxmega64D3", &XMEGA_D),
    dev("ATxmega128D3", &XMEGA_D),
    dev("ATxmega192D3", &XMEGA_D),
    dev("ATxmega256D3", &XMEGA_D),
    dev("ATxmega64D4", &XMEGA_D),
    dev("ATxmega128D4", &XMEGA_D),
    dev("ATxmega16D4", &XMEGA_D_SMALL),
    dev("ATxmega32D4", &XMEGA_D_SMALL),
    dev("ATxmega32D3", &XMEGA_32D3),
    dev("ATxmega8E5", &XMEGA_E5),
    dev("ATxmega16E5", &XMEGA_E5),
    dev("ATxmega32E5", &XMEGA_E5),
    dev("ATxmega64B1", &XMEGA_B),
    dev("ATxmega64B3", &XMEGA_B),
    dev("ATxmega128B1", &XMEGA_B),
    dev("ATxmega128B3", &XMEGA_B),
];

pub fn devices() -> impl Iterator<Item = &'static Device> {
    DEVICES.iter()
}

/// Case-insensitive lookup by part name (`atmega328p`, `ATtiny85`, ...).
pub fn lookup(name: &str) -> PowerResult<&'static Device> {
    let name = name.trim();
    DEVICES
        .iter()
        .find(|d| d.name.eq_ignore_ascii_case(name))
        .ok_or_else(|| PowerError::UnknownDevice(name.to_string()))
}

pub fn by_signature(signature: [u8; 3]) -> Option<&'static Device> {
    DEVICES.iter().find(|d| d.signature == Some(signature))
}

/// Parse `1E950F`, `1e 95 0f` or `0x1E,0x95,0x0F` into three signature bytes.
pub fn parse_signature(s: &str) -> Option<[u8; 3]> {
    let cleaned: String = s
        .replace("0x", "")
        .replace("0X", "")
        .chars()
        .filter(|c| c.is_ascii_hexdigit())
        .collect();
    if cleaned.len() != 6 {
        return None;
    }
    let mut out = [0u8; 3];
    for (i, byte) in out.iter_mut().enumerate() {
        *byte = u8::from_str_radix(&cleaned[i * 2..i * 2 + 2], 16).ok()?;
    }
    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_is_case_insensitive() {
        let d = lookup("atmega328p").unwrap();
        assert_eq!(d.name, "ATmega328P");
        assert!(std::ptr::eq(d.family, &MEGA_X8));
        assert!(lookup("ATmega9999").is_err());
    }

    #[test]
    fn test_device_names_are_unique() {
        let mut names: Vec<String> = DEVICES.iter().map(|d| d.name.to_ascii_lowercase()).collect();
        names.sort();
        let before = names.len();
        names.dedup();
        assert_eq!(before, names.len());
    }

    #[test]
    fn test_signatures_are_unique() {
        let mut sigs: Vec<[u8; 3]> = DEVICES.iter().filter_map(|d| d.signature).collect();
        sigs.sort();
        let before = sigs.len();
        sigs.dedup();
        assert_eq!(before, sigs.len());
    }

    #[test]
    fn test_no_bit_is_shared_within_a_family() {
        for d in DEVICES {
            let fam = d.family;
            for (i, a) in fam.gates.iter().enumerate() {
                assert!(a.bit < 8, "{}: {} bit {}", fam.name, a.peripheral, a.bit);
                assert!(fam.registers.contains(&a.register), "{}: {} register not listed", fam.name, a.peripheral);
                for b in &fam.gates[i + 1..] {
                    assert_ne!(a.peripheral, b.peripheral, "{}: duplicate {}", fam.name, a.peripheral);
                    assert!(
                        !(a.register == b.register && a.bit == b.bit),
                        "{}: {} and {} share a bit",
                        fam.name, a.peripheral, b.peripheral
                    );
                }
            }
        }
    }

    #[test]
    fn test_all_masks_stay_within_family_registers() {
        for d in DEVICES {
            for (reg, mask) in d.family.all_masks() {
                assert!(d.family.registers.contains(&reg), "{}: {} not listed", d.family.name, reg.name);
                assert_ne!(mask, 0);
            }
        }
    }

    #[test]
    fn test_rfr2_power_all_leaves_pga_alone() {
        let fam = lookup("ATmega256RFR2").unwrap().family;
        let pga = fam.gate(Peripheral::Pga).unwrap();
        let masks = fam.all_masks();
        let prr0 = masks.iter().find(|(r, _)| *r == pga.register).unwrap().1;
        assert_eq!(prr0 & pga.mask(), 0);
        assert!(masks.contains(&(PRR1, 0x79)));
    }

    #[test]
    fn test_mega2560_layout() {
        let fam = lookup("ATmega2560").unwrap().family;
        let t5 = fam.gate(Peripheral::Timer5).unwrap();
        assert_eq!(t5.register.name, "PRR1");
        assert_eq!(t5.register.addr, 0x65);
        assert_eq!(t5.mask(), 0x20);
        let masks = fam.all_masks();
        assert_eq!(masks, vec![(PRR0, 0xEF), (PRR1, 0x3F)]);
    }

    #[test]
    fn test_32u6_has_no_usart0() {
        let d = lookup("ATmega32U6").unwrap();
        assert!(!d.supports(Peripheral::Usart0));
        assert!(d.supports(Peripheral::Usb));
    }

    #[test]
    fn test_xmega_e5_tc5d_lives_on_port_d() {
        let gate = lookup("ATxmega32E5").unwrap().family.gate(Peripheral::Tc5d).unwrap();
        assert_eq!(gate.register.name, "PR_PRPD");
        assert_eq!(gate.mask(), 0x02);
    }

    #[test]
    fn test_tiny13a_gates_adc_and_timer0() {
        let d = lookup("ATtiny13A").unwrap();
        let adc = d.family.gate(Peripheral::Adc).unwrap();
        assert_eq!((adc.register.addr, adc.bit), (0x45, 0));
        let t0 = d.family.gate(Peripheral::Timer0).unwrap();
        assert_eq!((t0.register.addr, t0.bit), (0x45, 1));
        assert_eq!(d.family.all_masks(), vec![(PRR_TINY_13A, 0x03)]);
        assert_eq!(d.family.clock.map(|p| p.register().addr), Some(0x46));
        assert!(!lookup("ATtiny13").unwrap().supports(Peripheral::Adc));
    }

    #[test]
    fn test_hvb_prescaler_stops_at_eight() {
        let clock = lookup("ATmega32HVB").unwrap().family.clock.unwrap();
        assert!(clock.supports(crate::ClockDiv::Div8));
        assert!(!clock.supports(crate::ClockDiv::Div16));
        assert!(lookup("ATmega406").unwrap().family.clock.is_none());
    }

    #[test]
    fn test_every_peripheral_has_a_family() {
        for p in Peripheral::ALL {
            assert!(DEVICES.iter().any(|d| d.supports(*p)), "{} is not gated anywhere", p);
        }
    }

    #[test]
    fn test_signature_lookup() {
        assert_eq!(by_signature([0x1E, 0x95, 0x0F]).unwrap().name, "ATmega328P");
        assert_eq!(by_signature([0x1E, 0x93, 0x0B]).unwrap().name, "ATtiny85");
        assert!(by_signature([0x00, 0x00, 0x00]).is_none());
    }

    #[test]
    fn test_parse_signature_forms() {
        assert_eq!(parse_signature("1E950F"), Some([0x1E, 0x95, 0x0F]));
        assert_eq!(parse_signature("0x1e 0x95 0x0f"), Some([0x1E, 0x95, 0x0F]));
        assert_eq!(parse_signature("1e:95:0f"), Some([0x1E, 0x95, 0x0F]));
        assert_eq!(parse_signature("1E95"), None);
    }
}
