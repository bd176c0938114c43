//! CAN Identifier

use crate::error::CanError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Maximum value of an 11-bit standard identifier
const STANDARD_MAX: u32 = 0x7FF;
/// Maximum value of a 29-bit extended identifier
const EXTENDED_MAX: u32 = 0x1FFF_FFFF;

/// A validated CAN message identifier (11-bit standard or 29-bit extended).
///
/// Identifiers are fixed at startup and immutable; construction fails when
/// the raw value exceeds the frame-format width.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CanId {
    raw: u32,
    extended: bool,
}

impl CanId {
    /// Create an 11-bit standard identifier.
    pub fn standard(raw: u32) -> Result<Self, CanError> {
        if raw > STANDARD_MAX {
            return Err(CanError::InvalidId { raw, bits: 11 });
        }
        Ok(Self {
            raw,
            extended: false,
        })
    }

    /// Create a 29-bit extended identifier.
    pub fn extended(raw: u32) -> Result<Self, CanError> {
        if raw > EXTENDED_MAX {
            return Err(CanError::InvalidId { raw, bits: 29 });
        }
        Ok(Self {
            raw,
            extended: true,
        })
    }

    /// Raw identifier value.
    pub fn raw(&self) -> u32 {
        self.raw
    }

    /// Whether this is a 29-bit extended identifier.
    pub fn is_extended(&self) -> bool {
        self.extended
    }
}

impl fmt::Display for CanId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.extended {
            write!(f, "{:#010x}", self.raw)
        } else {
            write!(f, "{:#05x}", self.raw)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_range() {
        assert!(CanId::standard(0x288).is_ok());
        assert!(CanId::standard(0x7FF).is_ok());
        assert!(matches!(
            CanId::standard(0x800),
            Err(CanError::InvalidId { raw: 0x800, bits: 11 })
        ));
    }

    #[test]
    fn test_extended_range() {
        assert!(CanId::extended(0x1FFF_FFFF).is_ok());
        assert!(CanId::extended(0x2000_0000).is_err());
    }

    #[test]
    fn test_display() {
        assert_eq!(CanId::standard(0x288).unwrap().to_string(), "0x288");
    }
}
