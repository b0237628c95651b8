//! YAML power profiles.
//!
//! ```yaml
//! device: ATmega328P
//! disable_all: false
//! disable: [adc, twi, usart0]
//! enable: [spi]
//! clock_div: 8
//! ```
//!
//! Applied in order: `disable_all`, the `disable` list, the `enable` list,
//! then the clock divisor.

use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

use crate::devices::{self, Device};
use crate::power::PowerController;
use crate::register::RegisterBus;
use crate::{Peripheral, PowerError, PowerResult};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Profile {
    pub device: String,
    #[serde(default)]
    pub disable_all: bool,
    #[serde(default)]
    pub disable: Vec<Peripheral>,
    #[serde(default)]
    pub enable: Vec<Peripheral>,
    /// Plain division factor (1, 2, 4, ... or any 1..=129 on XDIV parts).
    #[serde(default)]
    pub clock_div: Option<u16>,
}

impl Profile {
    pub fn from_yaml(text: &str) -> PowerResult<Self> {
        serde_yaml::from_str(text).map_err(|e| PowerError::Profile(e.to_string()))
    }

    pub fn load(path: &Path) -> PowerResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_yaml(&text)
    }

    pub fn to_yaml(&self) -> PowerResult<String> {
        serde_yaml::to_string(self).map_err(|e| PowerError::Profile(e.to_string()))
    }

    pub fn resolve_device(&self) -> PowerResult<&'static Device> {
        devices::lookup(&self.device)
    }

    /// Check every entry against the device before anything is written.
    pub fn validate(&self) -> PowerResult<&'static Device> {
        let device = self.resolve_device()?;
        for &peripheral in self.disable.iter().chain(&self.enable) {
            if !device.supports(peripheral) {
                return Err(PowerError::Unsupported { device: device.name, peripheral });
            }
        }
        if let Some(divisor) = self.clock_div {
            let prescaler = device
                .family
                .clock
                .ok_or(PowerError::NoPrescaler { device: device.name })?;
            if !prescaler.supports_divisor(divisor) {
                return Err(PowerError::UnsupportedDivision { device: device.name, divisor });
            }
        }
        Ok(device)
    }

    pub fn apply<B: RegisterBus>(&self, bus: B) -> PowerResult<PowerController<B>> {
        let device = self.validate()?;
        let mut pc = PowerController::new(device, bus);
        if self.disable_all {
            pc.disable_all();
        }
        for &p in &self.disable {
            pc.disable(p)?;
        }
        for &p in &self.enable {
            pc.enable(p)?;
        }
        if let Some(divisor) = self.clock_div {
            pc.set_clock_divisor(divisor)?;
        }
        info!(
            device = device.name,
            disabled = self.disable.len(),
            enabled = self.enable.len(),
            clock_div = ?self.clock_div,
            "profile applied"
        );
        Ok(pc)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::register::RegisterFile;

    const IDLE: &str = "\
device: atmega328p
disable_all: true
enable: [spi, timer0]
clock_div: 8
";

    #[test]
    fn test_parse_and_apply() {
        let profile = Profile::from_yaml(IDLE).unwrap();
        assert_eq!(profile.enable, vec![Peripheral::Spi, Peripheral::Timer0]);
        let mut pc = profile.apply(RegisterFile::new()).unwrap();
        // 0xEF with SPI (bit 2) and timer0 (bit 5) cleared again
        assert_eq!(pc.bus().read_raw(0x64), 0xCB);
        assert_eq!(pc.clock_divisor().unwrap(), 8);
    }

    #[test]
    fn test_reduced_core_profile_leaves_0x5f_alone() {
        let profile = Profile::from_yaml("device: ATtiny10\ndisable: [ADC]\nclock_div: 2\n").unwrap();
        let mut regs = RegisterFile::new();
        regs.write_raw(0x5F, 0xA5);
        let mut pc = profile.apply(&mut regs).unwrap();
        assert_eq!(pc.clock_divisor().unwrap(), 2);
        drop(pc);
        assert!(regs.take_journal().iter().all(|(addr, _)| *addr != 0x5F));
        assert_eq!(regs.read_raw(0x5F), 0xA5);
        assert_eq!(regs.read_raw(0x35), 0x02);
    }

    #[test]
    fn test_unknown_peripheral_is_reported() {
        let err = Profile::from_yaml("device: ATmega328P\ndisable: [flux]\n").unwrap_err();
        assert!(matches!(err, PowerError::Profile(ref msg) if msg.contains("flux")));
    }

    #[test]
    fn test_unknown_field_is_rejected() {
        assert!(Profile::from_yaml("device: ATmega328P\ndisabel: [adc]\n").is_err());
    }

    #[test]
    fn test_validation_happens_before_writes() {
        let profile = Profile::from_yaml("device: ATtiny85\ndisable: [adc, usb]\n").unwrap();
        let mut regs = RegisterFile::new();
        let err = profile.apply(&mut regs).err().unwrap();
        assert!(matches!(err, PowerError::Unsupported { peripheral: Peripheral::Usb, .. }));
        assert!(regs.take_journal().is_empty());
    }

    #[test]
    fn test_bad_divisor_and_unknown_device() {
        let profile = Profile::from_yaml("device: ATmega32U4\nclock_div: 3\n").unwrap();
        assert!(matches!(profile.validate(), Err(PowerError::UnsupportedDivision { divisor: 3, .. })));

        let profile = Profile::from_yaml("device: ATxmega32E5\nclock_div: 2\n").unwrap();
        assert!(matches!(profile.validate(), Err(PowerError::NoPrescaler { .. })));

        let profile = Profile::from_yaml("device: ATmega9\n").unwrap();
        assert!(matches!(profile.validate(), Err(PowerError::UnknownDevice(_))));
    }

    #[test]
    fn test_yaml_round_trip_keeps_names() {
        let profile = Profile::from_yaml(IDLE).unwrap();
        let text = profile.to_yaml().unwrap();
        assert!(text.contains("- timer0"));
        assert_eq!(Profile::from_yaml(&text).unwrap(), profile);
    }
}
