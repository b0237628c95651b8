//! Clock-gateable on-chip peripherals.
//!
//! Each variant corresponds to one `power_<name>_enable()` /
//! `power_<name>_disable()` pair in avr-libc. The lowercase variant name is
//! the macro infix, so `Peripheral::Usart0` is `power_usart0_*`.
//!
//! XMEGA parts gate the same block type once per I/O port, so those variants
//! carry the port letter as a suffix (`Spic`, `Tc0d`, `Usarte1`, ...).

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::PowerError;

macro_rules! peripherals {
    ($( $variant:ident => $name:literal, $desc:literal; )*) => {
        /// A peripheral block that can be clock-gated through a power-reduction register.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
        #[serde(rename_all = "lowercase")]
        pub enum Peripheral {
            $( $variant, )*
        }

        impl Peripheral {
            /// Every peripheral known to the table, in declaration order.
            pub const ALL: &'static [Peripheral] = &[ $( Peripheral::$variant, )* ];

            /// Macro infix (`adc`, `usartc0`, ...).
            pub fn name(self) -> &'static str {
                match self {
                    $( Peripheral::$variant => $name, )*
                }
            }

            /// Human-readable description used in reports and rendered headers.
            pub fn description(self) -> &'static str {
                match self {
                    $( Peripheral::$variant => $desc, )*
                }
            }
        }
    };
}

peripherals! {
    Adc => "adc", "Analog to Digital Converter";
    Spi => "spi", "Serial Peripheral Interface";
    Twi => "twi", "Two Wire Interface";
    Usart0 => "usart0", "USART 0";
    Usart1 => "usart1", "USART 1";
    Usart2 => "usart2", "USART 2";
    Usart3 => "usart3", "USART 3";
    Timer0 => "timer0", "Timer/Counter 0";
    Timer1 => "timer1", "Timer/Counter 1";
    Timer2 => "timer2", "Timer/Counter 2";
    Timer3 => "timer3", "Timer/Counter 3";
    Timer4 => "timer4", "Timer/Counter 4";
    Timer5 => "timer5", "Timer/Counter 5";
    Usb => "usb", "USB";
    Usi => "usi", "Universal Serial Interface";
    Lcd => "lcd", "LCD controller";
    Psc => "psc", "Power Stage Controller";
    Can => "can", "CAN controller";
    Lin => "lin", "LIN/UART controller";
    Vadc => "vadc", "Voltage ADC";
    Vrm => "vrm", "Voltage Regulator Monitor";
    Pga => "pga", "Programmable Gain Amplifier";
    Transceiver => "transceiver", "2.4 GHz transceiver";
    Ram0 => "ram0", "SRAM block 0";
    Ram1 => "ram1", "SRAM block 1";
    Ram2 => "ram2", "SRAM block 2";
    Ram3 => "ram3", "SRAM block 3";
    Aes => "aes", "AES crypto module";
    Aca => "aca", "Analog Comparator on port A";
    Acb => "acb", "Analog Comparator on port B";
    Adca => "adca", "ADC on port A";
    Adcb => "adcb", "ADC on port B";
    Daca => "daca", "DAC on port A";
    Dacb => "dacb", "DAC on port B";
    Dma => "dma", "DMA controller";
    Edma => "edma", "Enhanced DMA controller";
    Ebi => "ebi", "External Bus Interface";
    Evsys => "evsys", "Event System";
    Rtc => "rtc", "Real-Time Counter";
    Xcl => "xcl", "XMEGA Custom Logic";
    Hiresc => "hiresc", "High-Resolution extension on port C";
    Hiresd => "hiresd", "High-Resolution extension on port D";
    Hirese => "hirese", "High-Resolution extension on port E";
    Hiresf => "hiresf", "High-Resolution extension on port F";
    Spic => "spic", "SPI on port C";
    Spid => "spid", "SPI on port D";
    Spie => "spie", "SPI on port E";
    Spif => "spif", "SPI on port F";
    Tc0c => "tc0c", "Timer/Counter 0 on port C";
    Tc0d => "tc0d", "Timer/Counter 0 on port D";
    Tc0e => "tc0e", "Timer/Counter 0 on port E";
    Tc0f => "tc0f", "Timer/Counter 0 on port F";
    Tc1c => "tc1c", "Timer/Counter 1 on port C";
    Tc1d => "tc1d", "Timer/Counter 1 on port D";
    Tc1e => "tc1e", "Timer/Counter 1 on port E";
    Tc1f => "tc1f", "Timer/Counter 1 on port F";
    Tc4c => "tc4c", "Timer/Counter 4 on port C";
    Tc5c => "tc5c", "Timer/Counter 5 on port C";
    Tc5d => "tc5d", "Timer/Counter 5 on port D";
    Twic => "twic", "TWI on port C";
    Twid => "twid", "TWI on port D";
    Twie => "twie", "TWI on port E";
    Twif => "twif", "TWI on port F";
    Usartc0 => "usartc0", "USART 0 on port C";
    Usartd0 => "usartd0", "USART 0 on port D";
    Usarte0 => "usarte0", "USART 0 on port E";
    Usartf0 => "usartf0", "USART 0 on port F";
    Usartc1 => "usartc1", "USART 1 on port C";
    Usartd1 => "usartd1", "USART 1 on port D";
    Usarte1 => "usarte1", "USART 1 on port E";
    Usartf1 => "usartf1", "USART 1 on port F";
}

impl fmt::Display for Peripheral {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Peripheral {
    type Err = PowerError;

    /// Accepts the macro infix in any case, with or without the
    /// `power_` prefix and `_enable`/`_disable` suffix.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        let mut key = lower.strip_prefix("power_").unwrap_or(&lower);
        for suffix in ["_enable()", "_disable()", "_enable", "_disable"] {
            if let Some(stripped) = key.strip_suffix(suffix) {
                key = stripped;
                break;
            }
        }
        Peripheral::ALL
            .iter()
            .copied()
            .find(|p| p.name() == key)
            .ok_or_else(|| PowerError::UnknownPeripheral(s.to_string()))
    }
}

/// Same spellings as [`FromStr`], so profiles may write `ADC` or
/// `power_adc_disable`.
impl<'de> Deserialize<'de> for Peripheral {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
