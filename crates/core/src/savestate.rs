//! Power state files.
//!
//! Captures the power-reduction registers and the clock prescaler of one
//! device so a configuration can be stored, diffed and replayed later.
//!
//! ## File format
//!
//! ```text
//! +------------------+
//! | Magic "APWS"     |  4 bytes
//! +------------------+
//! | Format version   |  u32 little-endian (currently 1)
//! +------------------+
//! | Compressed data  |  deflate-compressed bincode payload
//! +------------------+
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::devices::{self, Device};
use crate::register::{PowerRegister, RegisterBus};
use crate::{PowerError, PowerResult};

/// Magic bytes identifying a power state file.
const MAGIC: &[u8; 4] = b"APWS";
/// Current state file format version.
const FORMAT_VERSION: u32 = 1;
const HEADER_LEN: usize = 8;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterState {
    pub name: String,
    pub addr: u16,
    pub value: u8,
}

impl RegisterState {
    fn matches(&self, reg: &PowerRegister) -> bool {
        self.addr == reg.addr && self.name.eq_ignore_ascii_case(reg.name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PowerState {
    pub device: String,
    pub registers: Vec<RegisterState>,
    /// Raw prescaler register content, if the device has one.
    pub clock: Option<RegisterState>,
}

impl PowerState {
    pub fn capture<B: RegisterBus>(device: &'static Device, bus: &mut B) -> Self {
        let registers = device
            .family
            .registers
            .iter()
            .map(|reg| RegisterState {
                name: reg.name.to_string(),
                addr: reg.addr,
                value: bus.read(reg.addr),
            })
            .collect();
        let clock = device.family.clock.map(|p| {
            let reg = p.register();
            RegisterState {
                name: reg.name.to_string(),
                addr: reg.addr,
                value: p.read_raw(bus),
            }
        });
        PowerState { device: device.name.to_string(), registers, clock }
    }

    /// Device this state was captured from.
    pub fn resolve_device(&self) -> PowerResult<&'static Device> {
        devices::lookup(&self.device)
    }

    /// Write the captured values back. The prescaler goes through its
    /// protected sequence so it also takes effect on real hardware.
    ///
    /// Every entry must name one of the device's own power registers at its
    /// table address; nothing is written unless the whole state checks out.
    pub fn restore<B: RegisterBus>(&self, device: &'static Device, bus: &mut B) -> PowerResult<()> {
        if !self.device.eq_ignore_ascii_case(device.name) {
            return Err(PowerError::State(format!(
                "device mismatch: state={} current={}",
                self.device, device.name
            )));
        }
        for reg in &self.registers {
            if !device.family.registers.iter().any(|r| reg.matches(r)) {
                return Err(PowerError::State(format!(
                    "{} (0x{:02X}) is not a power register on {}",
                    reg.name, reg.addr, device.name
                )));
            }
        }
        let clock = match (&self.clock, device.family.clock) {
            (None, _) => None,
            (Some(clock), Some(prescaler)) if clock.matches(&prescaler.register()) => {
                Some((clock.value, prescaler))
            }
            (Some(clock), _) => {
                return Err(PowerError::State(format!(
                    "{} (0x{:02X}) is not the prescaler register on {}",
                    clock.name, clock.addr, device.name
                )));
            }
        };

        for reg in &self.registers {
            bus.write(reg.addr, reg.value);
        }
        if let Some((value, prescaler)) = clock {
            prescaler.write_protected(bus, device.family.sreg, value);
        }
        Ok(())
    }

    pub fn to_bytes(&self) -> PowerResult<Vec<u8>> {
        let payload = bincode::serialize(self)
            .map_err(|e| PowerError::State(format!("serialize error: {}", e)))?;

        let compressed = miniz_oxide::deflate::compress_to_vec(&payload, 6);

        let mut out = Vec::with_capacity(HEADER_LEN + compressed.len());
        out.extend_from_slice(MAGIC);
        out.extend_from_slice(&FORMAT_VERSION.to_le_bytes());
        out.extend_from_slice(&compressed);
        Ok(out)
    }

    /// Parse a state file image, verifying magic, version, and device.
    pub fn from_bytes(data: &[u8]) -> PowerResult<Self> {
        if data.len() < HEADER_LEN {
            return Err(PowerError::State("file too small".into()));
        }
        if &data[0..4] != MAGIC {
            return Err(PowerError::State("invalid state file (bad magic)".into()));
        }
        let version = u32::from_le_bytes([data[4], data[5], data[6], data[7]]);
        if version != FORMAT_VERSION {
            return Err(PowerError::State(format!(
                "unsupported state version {} (expected {})",
                version, FORMAT_VERSION
            )));
        }

        let decompressed = miniz_oxide::inflate::decompress_to_vec(&data[HEADER_LEN..])
            .map_err(|e| PowerError::State(format!("decompress error: {:?}", e)))?;

        let state: PowerState = bincode::deserialize(&decompressed)
            .map_err(|e| PowerError::State(format!("deserialize error: {}", e)))?;
        state.resolve_device()?;
        Ok(state)
    }
}

pub fn save_to_file(state: &PowerState, path: &Path) -> PowerResult<()> {
    std::fs::write(path, state.to_bytes()?)?;
    Ok(())
}

pub fn load_from_file(path: &Path) -> PowerResult<PowerState> {
    let data = std::fs::read(path)?;
    PowerState::from_bytes(&data)
}

/// Derive a state file path from a profile path.
/// `idle.yaml` → `idle.state`
pub fn state_path(profile_path: &str) -> String {
    let p = Path::new(profile_path);
    let stem = p.file_stem().and_then(|s| s.to_str()).unwrap_or("power");
    let dir = p.parent().unwrap_or(Path::new("."));
    dir.join(format!("{}.state", stem)).to_string_lossy().into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ClockDiv;
    use crate::devices::lookup;
    use crate::register::RegisterFile;
    use crate::sim::SimulatedMcu;
    use crate::{Peripheral, PowerController};

    fn configured() -> PowerState {
        let device = lookup("ATmega2560").unwrap();
        let mut pc = PowerController::new(device, SimulatedMcu::new(device));
        pc.disable(Peripheral::Adc).unwrap();
        pc.disable(Peripheral::Timer5).unwrap();
        pc.clock_prescale_set(ClockDiv::Div4).unwrap();
        PowerState::capture(device, pc.bus_mut())
    }

    #[test]
    fn test_capture_reads_every_register() {
        let state = configured();
        assert_eq!(state.device, "ATmega2560");
        let values: Vec<(u16, u8)> = state.registers.iter().map(|r| (r.addr, r.value)).collect();
        assert_eq!(values, vec![(0x64, 0x01), (0x65, 0x20)]);
        assert_eq!(state.clock.as_ref().map(|c| c.value), Some(0x02));
    }

    #[test]
    fn test_restore_replays_through_protected_sequence() {
        let state = configured();
        let device = lookup("ATmega2560").unwrap();
        let mut mcu = SimulatedMcu::new(device);
        state.restore(device, &mut mcu).unwrap();
        assert_eq!(mcu.peek(0x65), 0x20);
        assert_eq!(mcu.peek(0x61), 0x02);
        assert_eq!(mcu.rejected_writes(), 0);
    }

    #[test]
    fn test_restore_rejects_other_device() {
        let state = configured();
        let err = state
            .restore(lookup("ATmega328P").unwrap(), &mut RegisterFile::new())
            .unwrap_err();
        assert!(err.to_string().contains("device mismatch"));
    }

    #[test]
    fn test_restore_rejects_foreign_address() {
        let mut state = configured();
        state.registers.push(RegisterState { name: "PRR1".into(), addr: 0x5F, value: 0xFF });
        let state = PowerState::from_bytes(&state.to_bytes().unwrap()).unwrap();

        let device = lookup("ATmega2560").unwrap();
        let mut regs = RegisterFile::new();
        let err = state.restore(device, &mut regs).unwrap_err();
        assert!(matches!(err, PowerError::State(ref msg) if msg.contains("0x5F")));
        assert!(regs.take_journal().is_empty());
        assert_eq!(regs.read_raw(0x5F), 0);
    }

    #[test]
    fn test_restore_rejects_moved_prescaler() {
        let mut state = configured();
        if let Some(clock) = state.clock.as_mut() {
            clock.addr = 0x64;
        }
        let mut regs = RegisterFile::new();
        assert!(state.restore(lookup("ATmega2560").unwrap(), &mut regs).is_err());
        assert!(regs.take_journal().is_empty());
    }

    #[test]
    fn test_bytes_header_and_validation() {
        let bytes = configured().to_bytes().unwrap();
        assert_eq!(&bytes[0..4], b"APWS");
        assert_eq!(PowerState::from_bytes(&bytes).unwrap(), configured());

        let mut bad = bytes.clone();
        bad[0] = b'X';
        assert!(PowerState::from_bytes(&bad).unwrap_err().to_string().contains("bad magic"));

        let mut newer = bytes;
        newer[4] = 2;
        assert!(PowerState::from_bytes(&newer).unwrap_err().to_string().contains("version 2"));

        assert!(PowerState::from_bytes(b"APW").is_err());
    }

    #[test]
    fn test_unknown_device_in_payload() {
        let mut state = configured();
        state.device = "ATmega9999".into();
        let bytes = state.to_bytes().unwrap();
        assert!(matches!(
            PowerState::from_bytes(&bytes),
            Err(PowerError::UnknownDevice(_))
        ));
    }

    #[test]
    fn test_file_round_trip() {
        let dir = std::env::temp_dir().join(format!("avr-power-state-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("idle.state");
        let state = configured();
        save_to_file(&state, &path).unwrap();
        assert_eq!(load_from_file(&path).unwrap(), state);
        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_state_path() {
        assert_eq!(state_path("profiles/idle.yaml"), "profiles/idle.state");
    }
}
