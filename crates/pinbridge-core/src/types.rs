use serde::{Deserialize, Serialize};
use std::fmt;

/// Electrical signal family of a pin.
///
/// Digital pins carry binary levels (0 or 1); analog pins carry sampled
/// levels (ADC readings on input, PWM duty values on output).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PinKind {
    /// Binary high/low signal.
    Digital,
    /// Sampled or modulated level signal.
    Analog,
}

impl PinKind {
    /// Returns `true` if the kind is digital.
    #[inline]
    #[must_use]
    pub fn is_digital(self) -> bool {
        matches!(self, PinKind::Digital)
    }

    /// Returns `true` if the kind is analog.
    #[inline]
    #[must_use]
    pub fn is_analog(self) -> bool {
        matches!(self, PinKind::Analog)
    }
}

impl fmt::Display for PinKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            PinKind::Digital => write!(f, "digital"),
            PinKind::Analog => write!(f, "analog"),
        }
    }
}

/// Signal direction of a configured pin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PinDirection {
    /// Input: values arrive from the hardware as reported events.
    In,
    /// Output: values are driven from the host.
    Out,
}

impl PinDirection {
    /// Returns `true` if the direction is input.
    #[inline]
    #[must_use]
    pub fn is_input(self) -> bool {
        matches!(self, PinDirection::In)
    }

    /// Returns `true` if the direction is output.
    #[inline]
    #[must_use]
    pub fn is_output(self) -> bool {
        matches!(self, PinDirection::Out)
    }
}

impl fmt::Display for PinDirection {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            PinDirection::In => write!(f, "input"),
            PinDirection::Out => write!(f, "output"),
        }
    }
}

/// Internal pull resistor configuration for an input pin.
///
/// Pull-down is representable so that callers can request it and receive a
/// well-defined configuration error; the supported firmware exposes no
/// pull-down mode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PullMode {
    /// No internal pull resistor.
    #[default]
    Off,
    /// Internal pull-up resistor enabled.
    Up,
    /// Internal pull-down resistor (rejected at setup time).
    Down,
}

impl fmt::Display for PullMode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            PullMode::Off => write!(f, "pull-off"),
            PullMode::Up => write!(f, "pull-up"),
            PullMode::Down => write!(f, "pull-down"),
        }
    }
}

/// Pin numbering convention used to interpret caller-supplied pin numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NumberingMode {
    /// Physical header positions, translated through the board's mapping
    /// table before use.
    Board,
    /// Logical channel numbers (BCM-style), used as-is.
    Logical,
}

impl fmt::Display for NumberingMode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            NumberingMode::Board => write!(f, "board"),
            NumberingMode::Logical => write!(f, "logical"),
        }
    }
}

/// Signal edge selector for edge-detection style APIs.
///
/// Present for interface completeness: the operations that accept an edge
/// are documented as unsupported and fail fast.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Edge {
    /// Low-to-high transition.
    Rising,
    /// High-to-low transition.
    Falling,
    /// Either transition.
    Both,
}

impl fmt::Display for Edge {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Edge::Rising => write!(f, "rising"),
            Edge::Falling => write!(f, "falling"),
            Edge::Both => write!(f, "both"),
        }
    }
}
