//! Text views of power state for the command line and logs.

use crate::devices::Device;
use crate::register::RegisterBus;
use crate::savestate::PowerState;
use crate::PowerController;

// ─── Register Viewer ────────────────────────────────────────────────────────

/// Power-reduction and prescaler registers with hex and binary values.
pub fn dump_power_regs<B: RegisterBus>(device: &'static Device, bus: &mut B) -> String {
    let mut s = String::new();
    for reg in device.family.registers {
        let val = bus.read(reg.addr);
        s.push_str(&format!("  {:>8} (0x{:02X}) = 0x{:02X}  {:08b}\n", reg.name, reg.addr, val, val));
    }
    if let Some(prescaler) = device.family.clock {
        let reg = prescaler.register();
        let val = prescaler.read_raw(bus);
        let div = prescaler.divisor(bus);
        s.push_str(&format!(
            "  {:>8} (0x{:02X}) = 0x{:02X}  {:08b}  clk/{}\n",
            reg.name, reg.addr, val, val, div
        ));
    }
    if s.is_empty() { s.push_str("  (no power registers)\n"); }
    s
}

/// One line per gateable peripheral.
pub fn dump_status<B: RegisterBus>(pc: &mut PowerController<B>) -> String {
    let device = pc.device();
    let mut s = String::new();
    for (peripheral, on) in pc.status() {
        let Some(gate) = device.family.gate(peripheral) else { continue };
        s.push_str(&format!(
            "  {:<12} {:<4} {}.{}  {}\n",
            peripheral.name(),
            if on { "on" } else { "off" },
            gate.register.name,
            gate.bit,
            peripheral.description()
        ));
    }
    if s.is_empty() { s.push_str("  (no gateable peripherals)\n"); }
    s
}

/// Registers whose value differs between two captures.
pub fn dump_diff(old: &PowerState, new: &PowerState) -> String {
    let mut s = String::new();
    if !old.device.eq_ignore_ascii_case(&new.device) {
        s.push_str(&format!("  device: {} → {}\n", old.device, new.device));
    }
    let olds = old.registers.iter().chain(old.clock.iter());
    for o in olds {
        let newer = new
            .registers
            .iter()
            .chain(new.clock.iter())
            .find(|n| n.addr == o.addr);
        if let Some(n) = newer {
            if n.value != o.value {
                s.push_str(&format!(
                    "  {:>8} (0x{:02X}): {:02X} → {:02X}  set {:08b} cleared {:08b}\n",
                    o.name,
                    o.addr,
                    o.value,
                    n.value,
                    n.value & !o.value,
                    o.value & !n.value
                ));
            }
        }
    }
    if s.is_empty() { s.push_str("  (no changes)\n"); }
    s
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::devices::lookup;
    use crate::register::RegisterFile;
    use crate::Peripheral;

    #[test]
    fn test_dump_power_regs() {
        let device = lookup("ATmega32U4").unwrap();
        let mut regs = RegisterFile::new();
        regs.write_raw(0x65, 0x81);
        regs.write_raw(0x61, 0x03);
        let dump = dump_power_regs(device, &mut regs);
        assert!(dump.contains("PRR1 (0x65) = 0x81  10000001"));
        assert!(dump.contains("CLKPR (0x61) = 0x03"));
        assert!(dump.contains("clk/8"));
    }

    #[test]
    fn test_dump_status() {
        let mut pc = PowerController::new(lookup("ATtiny85").unwrap(), RegisterFile::new());
        pc.disable(Peripheral::Usi).unwrap();
        let dump = dump_status(&mut pc);
        assert!(dump.contains("usi          off  PRR.1"));
        assert!(dump.contains("adc          on   PRR.0"));
    }

    #[test]
    fn test_dump_status_without_gates() {
        let mut pc = PowerController::new(lookup("ATmega162").unwrap(), RegisterFile::new());
        assert_eq!(dump_status(&mut pc), "  (no gateable peripherals)\n");
    }

    #[test]
    fn test_dump_diff() {
        let device = lookup("ATmega328P").unwrap();
        let mut regs = RegisterFile::new();
        let before = PowerState::capture(device, &mut regs);
        let mut pc = PowerController::new(device, &mut regs);
        pc.disable(Peripheral::Twi).unwrap();
        let after = PowerState::capture(device, &mut regs);
        let diff = dump_diff(&before, &after);
        assert!(diff.contains("PRR (0x64): 00 → 80"));
        assert!(diff.contains("set 10000000"));
        assert_eq!(dump_diff(&after, &after), "  (no changes)\n");
    }
}
