//! `power_*_enable()` / `power_*_disable()` and the clock prescaler
//! operations, bound to one device.
//!
//! A set bit in a power-reduction register stops the peripheral's clock, so
//! enabling clears the gate bit and disabling sets it. Each call touches only
//! its own bit.
//!
//! Timed prescaler sequences mask interrupts through the device's own SREG
//! address, whatever bus the controller drives.

use tracing::{debug, warn};

use crate::clock::{ClockDiv, Prescaler};
use crate::devices::{Device, Gate};
use crate::register::RegisterBus;
use crate::{Peripheral, PowerError, PowerResult};

pub struct PowerController<B: RegisterBus> {
    device: &'static Device,
    bus: B,
}

impl<B: RegisterBus> PowerController<B> {
    pub fn new(device: &'static Device, bus: B) -> Self {
        PowerController { device, bus }
    }

    pub fn device(&self) -> &'static Device {
        self.device
    }

    pub fn bus(&self) -> &B {
        &self.bus
    }

    pub fn bus_mut(&mut self) -> &mut B {
        &mut self.bus
    }

    pub fn into_inner(self) -> B {
        self.bus
    }

    fn gate(&self, peripheral: Peripheral) -> PowerResult<&'static Gate> {
        self.device
            .family
            .gate(peripheral)
            .ok_or(PowerError::Unsupported { device: self.device.name, peripheral })
    }

    fn prescaler(&self) -> PowerResult<Prescaler> {
        self.device
            .family
            .clock
            .ok_or(PowerError::NoPrescaler { device: self.device.name })
    }

    /// Start the peripheral's clock.
    pub fn enable(&mut self, peripheral: Peripheral) -> PowerResult<()> {
        let gate = self.gate(peripheral)?;
        self.bus.clear_bits(gate.register.addr, gate.mask());
        debug!(device = self.device.name, %peripheral, register = gate.register.name, "enabled");
        Ok(())
    }

    /// Stop the peripheral's clock.
    pub fn disable(&mut self, peripheral: Peripheral) -> PowerResult<()> {
        let gate = self.gate(peripheral)?;
        self.bus.set_bits(gate.register.addr, gate.mask());
        debug!(device = self.device.name, %peripheral, register = gate.register.name, "disabled");
        Ok(())
    }

    pub fn is_enabled(&mut self, peripheral: Peripheral) -> PowerResult<bool> {
        let gate = self.gate(peripheral)?;
        Ok(self.bus.read(gate.register.addr) & gate.mask() == 0)
    }

    /// `power_all_enable()`. A no-op on parts without power reduction.
    pub fn enable_all(&mut self) {
        for (reg, mask) in self.device.family.all_masks() {
            self.bus.clear_bits(reg.addr, mask);
        }
        debug!(device = self.device.name, "all peripherals enabled");
    }

    /// `power_all_disable()`.
    pub fn disable_all(&mut self) {
        for (reg, mask) in self.device.family.all_masks() {
            self.bus.set_bits(reg.addr, mask);
        }
        debug!(device = self.device.name, "all peripherals disabled");
    }

    /// Enabled flag for every gateable peripheral, in table order.
    pub fn status(&mut self) -> Vec<(Peripheral, bool)> {
        let gates = self.device.family.gates;
        gates
            .iter()
            .map(|gate| {
                let on = self.bus.read(gate.register.addr) & gate.mask() == 0;
                (gate.peripheral, on)
            })
            .collect()
    }

    /// `clock_prescale_set()`.
    pub fn clock_prescale_set(&mut self, div: ClockDiv) -> PowerResult<()> {
        let prescaler = self.prescaler()?;
        if !prescaler.set(&mut self.bus, self.device.family.sreg, div) {
            warn!(device = self.device.name, ?div, "division not available");
            return Err(PowerError::UnsupportedDivision {
                device: self.device.name,
                divisor: div.divisor(),
            });
        }
        debug!(device = self.device.name, ?div, "clock prescaler set");
        Ok(())
    }

    /// `clock_prescale_get()`. `None` when the register holds a reserved code,
    /// or an XDIV factor that is not a power of two.
    pub fn clock_prescale_get(&mut self) -> PowerResult<Option<ClockDiv>> {
        let prescaler = self.prescaler()?;
        Ok(prescaler.get(&mut self.bus))
    }

    /// Program a plain division factor. XDIV parts accept any value in
    /// `1..=129`; the others need a power of two their CLKPS field can hold.
    pub fn set_clock_divisor(&mut self, divisor: u16) -> PowerResult<()> {
        let prescaler = self.prescaler()?;
        if !prescaler.set_divisor(&mut self.bus, self.device.family.sreg, divisor) {
            return Err(PowerError::UnsupportedDivision { device: self.device.name, divisor });
        }
        debug!(device = self.device.name, divisor, "clock divisor set");
        Ok(())
    }

    pub fn clock_divisor(&mut self) -> PowerResult<u16> {
        let prescaler = self.prescaler()?;
        Ok(prescaler.divisor(&mut self.bus))
    }
}
