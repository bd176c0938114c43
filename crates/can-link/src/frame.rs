//! Frame Data and Payload Views
//!
//! A frame is an identifier plus a fixed 8-byte payload. The payload views
//! decode the two message layouts this core understands: the brake-status
//! flag and the engine-speed record.

use crate::error::CanError;
use crate::id::CanId;
use serde::{Deserialize, Serialize};

/// Payload size of a classic CAN data frame
pub const PAYLOAD_LEN: usize = 8;

/// A received or outgoing CAN frame: identifier, data length code, payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameData {
    pub id: CanId,
    /// Number of valid payload bytes (0..=8)
    pub dlc: u8,
    pub bytes: [u8; PAYLOAD_LEN],
}

impl FrameData {
    /// Create a full-length frame from an 8-byte payload.
    pub fn new(id: CanId, bytes: [u8; PAYLOAD_LEN]) -> Self {
        Self {
            id,
            dlc: PAYLOAD_LEN as u8,
            bytes,
        }
    }

    /// Create a frame carrying fewer than 8 valid bytes.
    pub fn with_dlc(id: CanId, dlc: u8, bytes: [u8; PAYLOAD_LEN]) -> Self {
        Self {
            id,
            dlc: dlc.min(PAYLOAD_LEN as u8),
            bytes,
        }
    }
}

/// Decoded brake-status payload: a single flag in the low bit of byte 0,
/// remaining bits unused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BrakeStatus {
    /// Foot brake applied
    pub foot_brake: bool,
}

impl BrakeStatus {
    /// Number of payload bytes the view requires
    const NEEDED: u8 = 1;

    /// Decode the brake flag from a frame payload.
    pub fn decode(frame: &FrameData) -> Result<Self, CanError> {
        if frame.dlc < Self::NEEDED {
            return Err(CanError::Truncated {
                needed: Self::NEEDED,
                got: frame.dlc,
            });
        }
        Ok(Self {
            foot_brake: frame.bytes[0] & 0x01 != 0,
        })
    }
}

/// Engine-speed payload layout: four little-endian 16-bit words with the
/// speed in the second word, the rest reserved.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineSpeedRecord {
    pub reserved0: u16,
    /// Engine speed field at byte offset 2
    pub engine_speed: u16,
    pub reserved1: u16,
    pub reserved2: u16,
}

impl EngineSpeedRecord {
    /// Number of payload bytes the view requires
    const NEEDED: u8 = PAYLOAD_LEN as u8;

    /// Decode the full record from a frame payload.
    pub fn decode(frame: &FrameData) -> Result<Self, CanError> {
        if frame.dlc < Self::NEEDED {
            return Err(CanError::Truncated {
                needed: Self::NEEDED,
                got: frame.dlc,
            });
        }
        let b = &frame.bytes;
        Ok(Self {
            reserved0: u16::from_le_bytes([b[0], b[1]]),
            engine_speed: u16::from_le_bytes([b[2], b[3]]),
            reserved1: u16::from_le_bytes([b[4], b[5]]),
            reserved2: u16::from_le_bytes([b[6], b[7]]),
        })
    }

    /// Encode the record as an outgoing 8-byte payload.
    pub fn to_bytes(&self) -> [u8; PAYLOAD_LEN] {
        let mut bytes = [0u8; PAYLOAD_LEN];
        bytes[0..2].copy_from_slice(&self.reserved0.to_le_bytes());
        bytes[2..4].copy_from_slice(&self.engine_speed.to_le_bytes());
        bytes[4..6].copy_from_slice(&self.reserved1.to_le_bytes());
        bytes[6..8].copy_from_slice(&self.reserved2.to_le_bytes());
        bytes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id() -> CanId {
        CanId::standard(0x288).unwrap()
    }

    #[test]
    fn test_brake_flag_low_bit() {
        let frame = FrameData::new(id(), [0x01, 0, 0, 0, 0, 0, 0, 0]);
        assert!(BrakeStatus::decode(&frame).unwrap().foot_brake);

        // Upper bits of byte 0 are unused
        let frame = FrameData::new(id(), [0xFE, 0xFF, 0, 0, 0, 0, 0, 0]);
        assert!(!BrakeStatus::decode(&frame).unwrap().foot_brake);
    }

    #[test]
    fn test_brake_decode_truncated() {
        let frame = FrameData::with_dlc(id(), 0, [0; 8]);
        assert!(matches!(
            BrakeStatus::decode(&frame),
            Err(CanError::Truncated { needed: 1, got: 0 })
        ));
    }

    #[test]
    fn test_engine_speed_offset() {
        let mut bytes = [0u8; 8];
        bytes[2..4].copy_from_slice(&1234u16.to_le_bytes());
        let record = EngineSpeedRecord::decode(&FrameData::new(id(), bytes)).unwrap();
        assert_eq!(record.engine_speed, 1234);
        assert_eq!(record.reserved0, 0);
    }

    #[test]
    fn test_record_round_trip_preserves_reserved_words() {
        let record = EngineSpeedRecord {
            reserved0: 0xAAAA,
            engine_speed: 55,
            reserved1: 0xBBBB,
            reserved2: 0xCCCC,
        };
        let frame = FrameData::new(id(), record.to_bytes());
        assert_eq!(EngineSpeedRecord::decode(&frame).unwrap(), record);
    }

    #[test]
    fn test_engine_speed_decode_truncated() {
        let frame = FrameData::with_dlc(id(), 4, [0; 8]);
        assert!(matches!(
            EngineSpeedRecord::decode(&frame),
            Err(CanError::Truncated { needed: 8, got: 4 })
        ));
    }
}
