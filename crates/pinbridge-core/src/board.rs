//! Board capability tables and pin number translation.
//!
//! A [`BoardScheme`] declares which logical channels of a board support
//! digital/analog reads and writes, and optionally carries a translation
//! table from physical header positions to logical channel numbers. Checking
//! a pin against a scheme is pure and side-effect free, so schemes can be
//! shared and queried concurrently.

use crate::{
    Result,
    error::Error,
    types::{NumberingMode, PinDirection, PinKind},
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Physical header position to logical channel translation for the 40-pin
/// Raspberry Pi header (Pi 2 through Pi 4 families, Zero included).
const RPI_HEADER_MAP: [(u8, u8); 26] = [
    (3, 2),
    (5, 3),
    (7, 4),
    (8, 14),
    (10, 15),
    (11, 17),
    (12, 18),
    (13, 27),
    (15, 22),
    (16, 23),
    (18, 24),
    (19, 10),
    (21, 9),
    (22, 25),
    (23, 11),
    (24, 8),
    (26, 7),
    (29, 5),
    (31, 6),
    (32, 12),
    (33, 13),
    (35, 19),
    (36, 16),
    (37, 26),
    (38, 20),
    (40, 21),
];

/// Static capability table for one board variant.
///
/// Immutable after construction. The four capability sets hold logical
/// channel numbers; the optional board map translates physical header
/// positions into logical channels when callers use
/// [`NumberingMode::Board`].
///
/// # Examples
///
/// ```
/// use pinbridge_core::{BoardScheme, NumberingMode, PinDirection, PinKind};
///
/// let scheme = BoardScheme::arduino_uno();
///
/// // Logical numbering passes through untouched
/// let ch = scheme
///     .check(13, PinKind::Digital, PinDirection::Out, NumberingMode::Logical)
///     .unwrap();
/// assert_eq!(ch, 13);
///
/// // Board numbering translates the physical header position first
/// let ch = scheme
///     .check(11, PinKind::Digital, PinDirection::Out, NumberingMode::Board)
///     .unwrap();
/// assert_eq!(ch, 17);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardScheme {
    /// Channels readable as digital inputs.
    digital_read: Vec<u8>,

    /// Channels drivable as digital outputs.
    digital_write: Vec<u8>,

    /// Channels readable as analog inputs.
    analog_read: Vec<u8>,

    /// Channels drivable as analog (PWM) outputs.
    analog_write: Vec<u8>,

    /// Physical header position to logical channel translation table.
    board_map: Option<HashMap<u8, u8>>,
}

impl BoardScheme {
    /// Create a scheme from explicit capability sets, with no board
    /// translation table.
    pub fn new(
        digital_read: Vec<u8>,
        digital_write: Vec<u8>,
        analog_read: Vec<u8>,
        analog_write: Vec<u8>,
    ) -> Self {
        Self {
            digital_read,
            digital_write,
            analog_read,
            analog_write,
            board_map: None,
        }
    }

    /// Attach a physical-position translation table to the scheme.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::collections::HashMap;
    /// use pinbridge_core::{BoardScheme, NumberingMode};
    ///
    /// let scheme = BoardScheme::new(vec![0, 1], vec![0, 1], vec![], vec![])
    ///     .with_board_map(HashMap::from([(3, 0), (5, 1)]));
    ///
    /// assert_eq!(scheme.resolve(3, NumberingMode::Board).unwrap(), 0);
    /// ```
    #[must_use]
    pub fn with_board_map(mut self, board_map: HashMap<u8, u8>) -> Self {
        self.board_map = Some(board_map);
        self
    }

    /// Capability table for the Arduino Uno, with the Raspberry Pi header
    /// translation attached so existing board-numbered code keeps working.
    ///
    /// Digital channels 14-19 are the analog pins A0-A5, usable as digital
    /// pins as well.
    #[must_use]
    pub fn arduino_uno() -> Self {
        let digital: Vec<u8> = (0..=19).collect();
        Self {
            digital_read: digital.clone(),
            digital_write: digital,
            analog_read: vec![0, 1, 2, 3, 4, 5],
            analog_write: vec![3, 5, 6, 9, 10, 11],
            board_map: Some(rpi_header_map()),
        }
    }

    /// Translate a caller-supplied pin number into a logical channel.
    ///
    /// Logical numbers pass through untouched. Board numbers are looked up
    /// in the translation table.
    ///
    /// # Errors
    ///
    /// Returns `Error::UnmappedBoardPin` in board mode when the position is
    /// absent from the table, or when the scheme has no table at all.
    pub fn resolve(&self, pin: u8, mode: NumberingMode) -> Result<u8> {
        match mode {
            NumberingMode::Logical => Ok(pin),
            NumberingMode::Board => self
                .board_map
                .as_ref()
                .and_then(|map| map.get(&pin).copied())
                .ok_or(Error::UnmappedBoardPin { pin }),
        }
    }

    /// Check whether a logical channel supports the given kind/direction.
    #[must_use]
    pub fn supports(&self, channel: u8, kind: PinKind, direction: PinDirection) -> bool {
        let set = match (kind, direction) {
            (PinKind::Digital, PinDirection::In) => &self.digital_read,
            (PinKind::Digital, PinDirection::Out) => &self.digital_write,
            (PinKind::Analog, PinDirection::In) => &self.analog_read,
            (PinKind::Analog, PinDirection::Out) => &self.analog_write,
        };
        set.contains(&channel)
    }

    /// Resolve a pin number and validate it against the capability set for
    /// the requested kind and direction, returning the logical channel.
    ///
    /// # Errors
    ///
    /// Returns `Error::UnmappedBoardPin` if translation fails, or
    /// `Error::InvalidPin` if the resolved channel lacks the capability.
    pub fn check(
        &self,
        pin: u8,
        kind: PinKind,
        direction: PinDirection,
        mode: NumberingMode,
    ) -> Result<u8> {
        let channel = self.resolve(pin, mode)?;
        if self.supports(channel, kind, direction) {
            Ok(channel)
        } else {
            Err(Error::invalid_pin(channel, kind, direction))
        }
    }
}

/// Build the 40-pin Raspberry Pi header translation table.
#[must_use]
pub fn rpi_header_map() -> HashMap<u8, u8> {
    RPI_HEADER_MAP.iter().copied().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(3, 2)]
    #[case(11, 17)]
    #[case(13, 27)]
    #[case(33, 13)]
    #[case(40, 21)]
    fn test_resolve_board_positions(#[case] position: u8, #[case] channel: u8) {
        let scheme = BoardScheme::arduino_uno();
        assert_eq!(
            scheme.resolve(position, NumberingMode::Board).unwrap(),
            channel
        );
    }

    #[rstest]
    #[case(1)] // 3.3V power pin
    #[case(6)] // ground pin
    #[case(27)] // ID EEPROM, never mapped
    fn test_resolve_unmapped_positions(#[case] position: u8) {
        let scheme = BoardScheme::arduino_uno();
        let result = scheme.resolve(position, NumberingMode::Board);
        assert!(matches!(result, Err(Error::UnmappedBoardPin { pin }) if pin == position));
    }

    #[test]
    fn test_resolve_logical_passthrough() {
        let scheme = BoardScheme::arduino_uno();
        assert_eq!(scheme.resolve(17, NumberingMode::Logical).unwrap(), 17);
        // Logical mode never consults the table, even for unmapped numbers
        assert_eq!(scheme.resolve(1, NumberingMode::Logical).unwrap(), 1);
    }

    #[test]
    fn test_resolve_board_without_table() {
        let scheme = BoardScheme::new(vec![0], vec![0], vec![], vec![]);
        assert!(scheme.resolve(3, NumberingMode::Board).is_err());
    }

    #[rstest]
    #[case(PinKind::Digital, PinDirection::In, 19, true)]
    #[case(PinKind::Digital, PinDirection::Out, 0, true)]
    #[case(PinKind::Digital, PinDirection::Out, 20, false)]
    #[case(PinKind::Analog, PinDirection::In, 5, true)]
    #[case(PinKind::Analog, PinDirection::In, 6, false)]
    #[case(PinKind::Analog, PinDirection::Out, 9, true)]
    #[case(PinKind::Analog, PinDirection::Out, 4, false)]
    fn test_uno_capabilities(
        #[case] kind: PinKind,
        #[case] direction: PinDirection,
        #[case] channel: u8,
        #[case] expected: bool,
    ) {
        let scheme = BoardScheme::arduino_uno();
        assert_eq!(scheme.supports(channel, kind, direction), expected);
    }

    #[test]
    fn test_check_reports_resolved_channel() {
        let scheme = BoardScheme::arduino_uno();
        // Header position 11 resolves to channel 17, which has no analog read
        let result = scheme.check(11, PinKind::Analog, PinDirection::In, NumberingMode::Board);
        assert!(matches!(
            result,
            Err(Error::InvalidPin { channel: 17, .. })
        ));
    }

    #[test]
    fn test_scheme_serde() {
        let scheme = BoardScheme::arduino_uno();
        let json = serde_json::to_string(&scheme).unwrap();
        let parsed: BoardScheme = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, scheme);
    }
}
