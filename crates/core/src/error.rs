//! Error type shared by every fallible operation in the crate.

use crate::Peripheral;

#[derive(Debug, thiserror::Error)]
pub enum PowerError {
    #[error("{peripheral} has no power-reduction bit on {device}")]
    Unsupported {
        device: &'static str,
        peripheral: Peripheral,
    },
    #[error("{device} has no clock prescaler")]
    NoPrescaler { device: &'static str },
    #[error("clock division {divisor} is not available on {device}")]
    UnsupportedDivision { device: &'static str, divisor: u16 },
    #[error("unknown device `{0}`")]
    UnknownDevice(String),
    #[error("unknown peripheral `{0}`")]
    UnknownPeripheral(String),
    #[error("state file error: {0}")]
    State(String),
    #[error("profile error: {0}")]
    Profile(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type PowerResult<T> = Result<T, PowerError>;
