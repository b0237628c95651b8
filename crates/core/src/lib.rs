//! # avr-power-core
//!
//! Peripheral power reduction and clock prescaling for 8-bit AVR
//! microcontrollers, driven by one constant table per device family
//! (peripheral → register → bit), in the style of avr-libc's
//! `<avr/power.h>`.
//!
//! ## Architecture
//!
//! - [`Peripheral`] — Every clock-gateable block (`adc`, `usart0`, `tc0d`, ...)
//! - [`devices`] — Family tables, device list, name and signature lookup
//! - [`register`] — [`RegisterBus`] trait, in-memory [`RegisterFile`], volatile [`Mmio`]
//! - [`PowerController`] — `enable` / `disable` / `power_all_*` / prescaler on one device
//! - [`clock`] — [`ClockDiv`] and the CLKPR, CCP and XDIV write sequences
//! - [`sim`] — Cycle-counting bus that enforces the timed-write windows
//! - [`savestate`] — Compressed power state files
//! - [`profile`] — YAML power profiles
//! - [`report`] — Register, status and diff views
//! - [`header`] — C header rendering for comparison with avr-libc
//! - [`target`] — Cargo-feature device selection
//!
//! ## Example
//!
//! ```
//! use avr_power_core::{devices, Peripheral, PowerController, RegisterFile};
//!
//! let device = devices::lookup("ATmega328P").unwrap();
//! let mut pc = PowerController::new(device, RegisterFile::new());
//! pc.disable(Peripheral::Adc).unwrap();
//! assert!(!pc.is_enabled(Peripheral::Adc).unwrap());
//! ```

pub mod clock;
pub mod devices;
pub mod error;
pub mod header;
pub mod peripheral;
pub mod power;
pub mod profile;
pub mod register;
pub mod report;
pub mod savestate;
pub mod sim;
pub mod target;

pub use clock::{ClockDiv, Prescaler};
pub use devices::{Device, Family, Gate};
pub use error::{PowerError, PowerResult};
pub use peripheral::Peripheral;
pub use power::PowerController;
pub use register::{Mmio, PowerRegister, RegisterBus, RegisterFile};
pub use sim::SimulatedMcu;

/// Registers + I/O + extended I/O (0x00..0xFF); every power and prescaler
/// register lives below this.
pub const IO_SPACE_SIZE: usize = 0x100;

/// SREG data address on classic cores.
pub const SREG_ADDR: u16 = 0x5F;
/// SREG data address on reduced cores (ATtiny4/5/9/10).
pub const REDUCED_CORE_SREG_ADDR: u16 = 0x3F;
/// Global interrupt enable bit mask.
pub const SREG_I: u8 = 0x80;

/// Clock prescaler change enable (CLKPR bit 7).
pub const CLKPCE: u8 = 0x80;
/// Configuration change protection signature for protected I/O.
pub const CCP_SIGNATURE: u8 = 0xD8;
/// XDIV divide enable (bit 7).
pub const XDIVEN: u8 = 0x80;
