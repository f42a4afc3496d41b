//! Digital outputs addressed as port bits

use crate::error::HalResult;

/// Output port
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Port {
    X,
    Y,
    Z,
    V,
    W,
}

/// A single bit on a port.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PortPin {
    pub port: Port,
    pub pin: u8,
}

impl PortPin {
    pub const fn new(port: Port, pin: u8) -> Self {
        Self { port, pin }
    }
}

/// Port bit set/clear
pub trait DigitalOutputs {
    /// Drive the bit high
    fn set_port_bits(&mut self, pin: PortPin) -> HalResult<()>;

    /// Drive the bit low
    fn clear_port_bits(&mut self, pin: PortPin) -> HalResult<()>;
}
