// Wand — Gesture Payload
//
// The manufacturer-specific AD structure carried in the advertisement:
//   [size = 6][type = 0xFF][5 gesture slots]
// Gesture slots form a ring: each new code overwrites the slot under the
// cursor, nothing is ever shifted.

use crate::config::{AD_TYPE_MANUFACTURER_SPECIFIC, MSD_DATA_NUM_BYTES};
use crate::events::GestureCode;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GesturePayload {
    slots: [u8; MSD_DATA_NUM_BYTES],
    cursor: usize,
}

impl GesturePayload {
    pub const fn new() -> Self {
        Self {
            slots: [0; MSD_DATA_NUM_BYTES],
            cursor: 0,
        }
    }

    pub fn append(&mut self, code: GestureCode) {
        self.slots[self.cursor] = code.as_byte();
        self.cursor = (self.cursor + 1) % MSD_DATA_NUM_BYTES;
    }

    pub fn clear(&mut self) {
        *self = Self::new();
    }

    pub fn slots(&self) -> &[u8; MSD_DATA_NUM_BYTES] {
        &self.slots
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn is_clear(&self) -> bool {
        self.slots.iter().all(|&b| b == 0)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ManufacturerData {
    pub payload: GesturePayload,
}

impl ManufacturerData {
    /// Bytes on the air, including the length prefix.
    pub const LEN: usize = 2 + MSD_DATA_NUM_BYTES;

    pub const fn new() -> Self {
        Self {
            payload: GesturePayload::new(),
        }
    }

    pub fn to_bytes(&self) -> [u8; Self::LEN] {
        let mut bytes = [0u8; Self::LEN];
        // The length prefix does not count itself.
        bytes[0] = (Self::LEN - 1) as u8;
        bytes[1] = AD_TYPE_MANUFACTURER_SPECIFIC;
        bytes[2..].copy_from_slice(self.payload.slots());
        bytes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wraps_over_five_slots() {
        let mut p = GesturePayload::new();
        let codes = [
            GestureCode::Left,
            GestureCode::Right,
            GestureCode::Up,
            GestureCode::Down,
            GestureCode::Left,
            GestureCode::Up,
        ];
        for code in codes {
            p.append(code);
        }
        assert_eq!(p.slots(), &[0x55, 0x52, 0x55, 0x44, 0x4C]);
        assert_eq!(p.cursor(), 1);
    }

    #[test]
    fn clear_zeroes_slots_and_cursor() {
        let mut p = GesturePayload::new();
        p.append(GestureCode::Down);
        p.append(GestureCode::Down);
        p.clear();
        assert!(p.is_clear());
        assert_eq!(p.cursor(), 0);
    }

    #[test]
    fn ad_structure_layout() {
        let mut m = ManufacturerData::new();
        m.payload.append(GestureCode::Right);
        assert_eq!(m.to_bytes(), [6, 0xFF, 0x52, 0, 0, 0, 0]);
    }
}
