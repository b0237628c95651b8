//! Render a device's table as a C header with the avr-libc macro names.
//!
//! The output is self-contained (registers are addressed through their
//! data-space address) so it can be compiled next to, and compared against,
//! `<avr/power.h>`. The timed prescaler stores are emitted as inline asm so
//! they stay inside the unlock window at any optimisation level.

use std::fmt::Write;

use crate::clock::{ClockDiv, Prescaler, XDIV_MAX, XDIV_SETTLE_CYCLES};
use crate::devices::{Device, Family};
use crate::{CCP_SIGNATURE, CLKPCE, REDUCED_CORE_SREG_ADDR, XDIVEN};

fn reg_macro(name: &str) -> String {
    format!("_AP_{}", name)
}

fn guard(device: &Device) -> String {
    format!("AVR_POWER_{}_H", device.name.to_ascii_uppercase())
}

pub fn render_header(device: &'static Device) -> String {
    let fam = device.family;
    let mut out = String::new();
    let g = guard(device);

    // write! into a String cannot fail
    let _ = writeln!(out, "/* Power reduction macros for {} ({}). */", device.name, fam.name);
    let _ = writeln!(out, "#ifndef {g}\n#define {g}\n\n#include <stdint.h>\n");

    for reg in fam.registers {
        let _ = writeln!(out, "#define {} (*(volatile uint8_t *)0x{:02X})", reg_macro(reg.name), reg.addr);
    }
    if let Some(p) = fam.clock {
        if let Prescaler::Ccp { ccp, .. } = p {
            let _ = writeln!(out, "#define {} (*(volatile uint8_t *)0x{:02X})", reg_macro("CCP"), ccp);
        }
        let reg = p.register();
        let _ = writeln!(out, "#define {} (*(volatile uint8_t *)0x{:02X})", reg_macro(reg.name), reg.addr);
    }
    out.push('\n');

    for gate in fam.gates {
        let reg = reg_macro(gate.register.name);
        let name = gate.peripheral.name();
        let _ = writeln!(out, "#define power_{name}_enable()  ({reg} &= (uint8_t)~(1 << {}))", gate.bit);
        let _ = writeln!(out, "#define power_{name}_disable() ({reg} |= (uint8_t)(1 << {}))", gate.bit);
    }

    let masks = fam.all_masks();
    if !masks.is_empty() {
        out.push('\n');
        for (op, expr) in [("enable", "&= (uint8_t)~"), ("disable", "|= (uint8_t)")] {
            let _ = writeln!(out, "#define power_all_{op}() \\\ndo {{ \\");
            for (reg, mask) in &masks {
                let _ = writeln!(out, "    {} {}(0x{:02X}); \\", reg_macro(reg.name), expr, mask);
            }
            out.push_str("} while (0)\n");
        }
    }

    if let Some(p) = fam.clock {
        out.push('\n');
        render_clock(&mut out, fam, p);
    }

    let _ = writeln!(out, "\n#endif /* {g} */");
    out
}

/// Store instruction for a data address: `out` where the I/O space reaches
/// it, `sts` otherwise.
fn store(fam: &Family, addr: u16, operand: &str) -> String {
    if fam.sreg == REDUCED_CORE_SREG_ADDR {
        format!("out 0x{:02X}, {}", addr, operand)
    } else if addr < 0x60 {
        format!("out 0x{:02X}, {}", addr - 0x20, operand)
    } else {
        format!("sts 0x{:04X}, {}", addr, operand)
    }
}

fn asm_line(out: &mut String, text: &str) {
    let _ = writeln!(out, "        \"{}\" \"\\n\\t\"", text);
}

fn settle(out: &mut String) {
    for _ in 0..XDIV_SETTLE_CYCLES {
        asm_line(out, "nop");
    }
}

fn render_clock(out: &mut String, fam: &Family, p: Prescaler) {
    let reg = p.register();
    let reg_sym = reg_macro(reg.name);
    match p {
        Prescaler::Xdiv { .. } => {
            let _ = writeln!(
                out,
                "static __inline__ void clock_prescale_set(uint8_t __x)\n{{\n    \
                 if (__x == 0 || __x > {max}) return;\n    \
                 uint8_t __tmp = (uint8_t)(0x{en:02X} | ({max} - __x));\n    \
                 __asm__ __volatile__ (",
                max = XDIV_MAX,
                en = XDIVEN,
            );
            asm_line(out, "in __tmp_reg__,__SREG__");
            asm_line(out, "cli");
            asm_line(out, &store(fam, reg.addr, "__zero_reg__"));
            settle(out);
            asm_line(out, "cpi %0, 0x01");
            asm_line(out, "breq L_%=");
            asm_line(out, &store(fam, reg.addr, "%1"));
            settle(out);
            out.push_str(
                "        \"L_%=: out __SREG__, __tmp_reg__\"\n        \
                 : /* no outputs */\n        \
                 : \"d\" (__x), \"r\" (__tmp)\n        \
                 : \"r0\");\n}\n\n",
            );
            let _ = writeln!(
                out,
                "#define clock_prescale_get() \\\n    \
                 (({reg_sym} & 0x{en:02X}) ? (uint8_t)({max} - ({reg_sym} & 0x7F)) : (uint8_t)1)",
                en = XDIVEN,
                max = XDIV_MAX,
            );
        }
        Prescaler::Clkpr { .. } | Prescaler::Ccp { .. } => {
            out.push_str("typedef enum\n{\n");
            for div in ClockDiv::ALL.iter().filter(|d| p.supports(**d)) {
                let label = match div {
                    ClockDiv::Div1Rc => "clock_div_1_rc".to_string(),
                    d => format!("clock_div_{}", d.divisor()),
                };
                let _ = writeln!(out, "    {} = {},", label, div.bits());
            }
            out.push_str("} clock_div_t;\n\n");

            let (unlock_addr, unlock_value) = match p {
                Prescaler::Ccp { ccp, .. } => (ccp, CCP_SIGNATURE),
                _ => (reg.addr, CLKPCE),
            };
            let _ = writeln!(
                out,
                "static __inline__ void clock_prescale_set(clock_div_t __x)\n{{\n    \
                 uint8_t __tmp = 0x{:02X};\n    \
                 __asm__ __volatile__ (",
                unlock_value
            );
            asm_line(out, "in __tmp_reg__,__SREG__");
            asm_line(out, "cli");
            asm_line(out, &store(fam, unlock_addr, "%0"));
            asm_line(out, &store(fam, reg.addr, "%1"));
            out.push_str(
                "        \"out __SREG__, __tmp_reg__\"\n        \
                 : /* no outputs */\n        \
                 : \"d\" (__tmp), \"d\" ((uint8_t)__x)\n        \
                 : \"r0\");\n}\n\n",
            );
            let _ = writeln!(
                out,
                "#define clock_prescale_get() (clock_div_t)({reg_sym} & 0x{:02X})",
                p.select_mask()
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::devices::lookup;

    #[test]
    fn test_mega328p_header() {
        let h = render_header(lookup("ATmega328P").unwrap());
        assert!(h.starts_with("/* Power reduction macros for ATmega328P"));
        assert!(h.contains("#define _AP_PRR (*(volatile uint8_t *)0x64)"));
        assert!(h.contains("#define power_twi_disable() (_AP_PRR |= (uint8_t)(1 << 7))"));
        assert!(h.contains("#define power_adc_enable()  (_AP_PRR &= (uint8_t)~(1 << 0))"));
        assert!(h.contains("    _AP_PRR |= (uint8_t)(0xEF); \\"));
        assert!(h.contains("    clock_div_256 = 8,"));
        assert!(!h.contains("clock_div_1_rc"));
        assert!(h.trim_end().ends_with("#endif /* AVR_POWER_ATMEGA328P_H */"));
    }

    #[test]
    fn test_clkpr_pair_is_inline_asm() {
        let h = render_header(lookup("ATmega328P").unwrap());
        assert!(h.contains("    uint8_t __tmp = 0x80;\n    __asm__ __volatile__ ("));
        assert!(h.contains(
            "        \"cli\" \"\\n\\t\"\n\
             \x20       \"sts 0x0061, %0\" \"\\n\\t\"\n\
             \x20       \"sts 0x0061, %1\" \"\\n\\t\"\n\
             \x20       \"out __SREG__, __tmp_reg__\""
        ));
        assert!(h.contains("#define clock_prescale_get() (clock_div_t)(_AP_CLKPR & 0x0F)"));

        let h = render_header(lookup("ATtiny85").unwrap());
        assert!(h.contains("\"out 0x26, %0\""));
        assert!(h.contains("\"out 0x26, %1\""));
    }

    #[test]
    fn test_rfr2_has_rc_setting() {
        let h = render_header(lookup("ATmega256RFR2").unwrap());
        assert!(h.contains("    clock_div_1_rc = 15,"));
        assert!(h.contains("power_ram3_disable()"));
    }

    #[test]
    fn test_hvb_two_bit_prescaler() {
        let h = render_header(lookup("ATmega16HVB").unwrap());
        assert!(h.contains("    clock_div_8 = 3,"));
        assert!(!h.contains("clock_div_16"));
        assert!(h.contains("(clock_div_t)(_AP_CLKPR & 0x03)"));
    }

    #[test]
    fn test_reduced_core_uses_ccp() {
        let h = render_header(lookup("ATtiny10").unwrap());
        assert!(h.contains("uint8_t __tmp = 0xD8;"));
        assert!(h.contains("\"out 0x3C, %0\""));
        assert!(h.contains("\"out 0x36, %1\""));
        assert!(h.contains("(clock_div_t)(_AP_CLKPSR & 0x0F)"));
    }

    #[test]
    fn test_xdiv_waits_after_each_store() {
        let h = render_header(lookup("ATmega128").unwrap());
        assert!(h.contains("if (__x == 0 || __x > 129) return;"));
        assert!(h.contains("uint8_t __tmp = (uint8_t)(0x80 | (129 - __x));"));
        assert_eq!(h.matches("\"nop\"").count(), 16);
        let clear = h.find("\"out 0x3C, __zero_reg__\"").unwrap();
        let skip = h.find("\"breq L_%=\"").unwrap();
        let write = h.find("\"out 0x3C, %1\"").unwrap();
        assert!(clear < skip && skip < write);
        assert_eq!(h[clear..skip].matches("nop").count(), 8);
        assert_eq!(h[write..].matches("nop").count(), 8);
        assert!(!h.contains("power_all_enable"));
    }

    #[test]
    fn test_xmega_has_no_prescaler() {
        let h = render_header(lookup("ATxmega128A4U").unwrap());
        assert!(h.contains("#define power_usb_disable() (_AP_PR_PRGEN |= (uint8_t)(1 << 6))"));
        assert!(!h.contains("clock_prescale_set"));
    }
}
