//! Build-time device selection.
//!
//! Firmware crates pick their part with a Cargo feature
//! (`features = ["atmega328p"]`) and reach the table through
//! [`target_device`] instead of naming the device at every call site.

use crate::devices::{self, Device};

#[cfg(feature = "atmega328p")]
pub const TARGET_NAME: Option<&str> = Some("ATmega328P");
#[cfg(all(feature = "atmega32u4", not(feature = "atmega328p")))]
pub const TARGET_NAME: Option<&str> = Some("ATmega32U4");
#[cfg(all(
    feature = "atmega2560",
    not(any(feature = "atmega328p", feature = "atmega32u4"))
))]
pub const TARGET_NAME: Option<&str> = Some("ATmega2560");
#[cfg(all(
    feature = "atmega1284p",
    not(any(feature = "atmega328p", feature = "atmega32u4", feature = "atmega2560"))
))]
pub const TARGET_NAME: Option<&str> = Some("ATmega1284P");
#[cfg(all(
    feature = "attiny85",
    not(any(
        feature = "atmega328p",
        feature = "atmega32u4",
        feature = "atmega2560",
        feature = "atmega1284p"
    ))
))]
pub const TARGET_NAME: Option<&str> = Some("ATtiny85");
#[cfg(all(
    feature = "attiny84",
    not(any(
        feature = "atmega328p",
        feature = "atmega32u4",
        feature = "atmega2560",
        feature = "atmega1284p",
        feature = "attiny85"
    ))
))]
pub const TARGET_NAME: Option<&str> = Some("ATtiny84");
#[cfg(not(any(
    feature = "atmega328p",
    feature = "atmega32u4",
    feature = "atmega2560",
    feature = "atmega1284p",
    feature = "attiny85",
    feature = "attiny84"
)))]
pub const TARGET_NAME: Option<&str> = None;

/// The device selected by Cargo feature, if any. When several features are
/// enabled the first in the list above wins.
pub fn target_device() -> Option<&'static Device> {
    TARGET_NAME.and_then(|name| devices::lookup(name).ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_target_name_resolves() {
        match TARGET_NAME {
            Some(name) => assert_eq!(target_device().map(|d| d.name), Some(name)),
            None => assert!(target_device().is_none()),
        }
    }
}
