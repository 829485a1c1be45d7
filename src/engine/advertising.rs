// Wand — Advertising Payload Publisher
//
// Keeps a copy of the advertising and scan-response data that was handed to
// the stack, with the manufacturer data spliced in at a fixed offset.  Each
// publish rewrites those bytes in place and pushes both buffers to the stack.

use heapless::Vec;

use crate::config::{
    ADV_DATA_MAX_LEN, ADV_FLAGS_RESERVED_LEN, SCAN_RSP_DATA_MAX_LEN, USER_ADVERTISE_DATA,
    USER_SCAN_RESPONSE_DATA,
};
use crate::engine::payload::ManufacturerData;
use crate::error::{WandError, WandResult};
use crate::hal::AdvertiseCommand;

/// Offset of the manufacturer data, with the high bit set when it lives in the
/// scan response rather than the advertising data.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MnfDataIndex(u8);

impl MnfDataIndex {
    const SCAN_RSP_FLAG: u8 = 0x80;

    pub fn in_adv_data(offset: usize) -> Self {
        Self(offset as u8 & !Self::SCAN_RSP_FLAG)
    }

    pub fn in_scan_rsp(offset: usize) -> Self {
        Self(offset as u8 | Self::SCAN_RSP_FLAG)
    }

    pub fn raw(self) -> u8 {
        self.0
    }

    pub fn is_scan_rsp(self) -> bool {
        self.0 & Self::SCAN_RSP_FLAG != 0
    }

    pub fn offset(self) -> usize {
        usize::from(self.0 & !Self::SCAN_RSP_FLAG)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredAdvertisingData {
    pub adv_data: Vec<u8, ADV_DATA_MAX_LEN>,
    pub scan_rsp_data: Vec<u8, SCAN_RSP_DATA_MAX_LEN>,
}

impl StoredAdvertisingData {
    /// Seeded from the base configuration until the first `install`.
    pub fn from_config() -> Self {
        let mut stored = Self {
            adv_data: Vec::new(),
            scan_rsp_data: Vec::new(),
        };
        // Both constants are sized well under the buffer limits.
        let _ = stored.adv_data.extend_from_slice(USER_ADVERTISE_DATA);
        let _ = stored.scan_rsp_data.extend_from_slice(USER_SCAN_RESPONSE_DATA);
        stored
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdvertisingPublisher {
    stored: StoredAdvertisingData,
    index: MnfDataIndex,
    installed: bool,
    continue_updating: bool,
}

impl AdvertisingPublisher {
    pub fn new() -> Self {
        Self {
            stored: StoredAdvertisingData::from_config(),
            index: MnfDataIndex::default(),
            installed: false,
            continue_updating: true,
        }
    }

    /// Append the manufacturer data to the outgoing command, preferring the
    /// advertising data, and snapshot both buffers for in-place updates.
    pub fn install(&mut self, cmd: &mut AdvertiseCommand, mnf: &ManufacturerData) -> WandResult<MnfDataIndex> {
        let bytes = mnf.to_bytes();
        let adv_max = if cmd.connectable {
            ADV_DATA_MAX_LEN - ADV_FLAGS_RESERVED_LEN
        } else {
            ADV_DATA_MAX_LEN
        };

        let index = if adv_max.saturating_sub(cmd.adv_data.len()) >= bytes.len() {
            let offset = cmd.adv_data.len();
            cmd.adv_data
                .extend_from_slice(&bytes)
                .map_err(|_| does_not_fit(cmd, adv_max))?;
            MnfDataIndex::in_adv_data(offset)
        } else if SCAN_RSP_DATA_MAX_LEN.saturating_sub(cmd.scan_rsp_data.len()) >= bytes.len() {
            let offset = cmd.scan_rsp_data.len();
            cmd.scan_rsp_data
                .extend_from_slice(&bytes)
                .map_err(|_| does_not_fit(cmd, adv_max))?;
            MnfDataIndex::in_scan_rsp(offset)
        } else {
            return Err(does_not_fit(cmd, adv_max));
        };

        self.index = index;
        self.installed = true;
        self.stored.adv_data.clone_from(&cmd.adv_data);
        self.stored.scan_rsp_data.clone_from(&cmd.scan_rsp_data);
        log::info!(
            "Manufacturer data installed in {} at offset {}",
            if index.is_scan_rsp() { "scan response" } else { "advertising data" },
            index.offset()
        );
        Ok(index)
    }

    /// Rewrite the manufacturer data bytes inside the stored buffers.
    pub fn splice(&mut self, mnf: &ManufacturerData) {
        if !self.installed {
            return;
        }
        let bytes = mnf.to_bytes();
        let offset = self.index.offset();
        let target: &mut [u8] = if self.index.is_scan_rsp() {
            &mut self.stored.scan_rsp_data
        } else {
            &mut self.stored.adv_data
        };
        if let Some(dst) = target.get_mut(offset..offset + bytes.len()) {
            dst.copy_from_slice(&bytes);
        }
    }

    pub fn stored(&self) -> &StoredAdvertisingData {
        &self.stored
    }

    pub fn index(&self) -> MnfDataIndex {
        self.index
    }

    pub fn continue_updating(&self) -> bool {
        self.continue_updating
    }

    pub fn set_continue_updating(&mut self, enabled: bool) {
        self.continue_updating = enabled;
    }
}

impl Default for AdvertisingPublisher {
    fn default() -> Self {
        Self::new()
    }
}

fn does_not_fit(cmd: &AdvertiseCommand, adv_max: usize) -> WandError {
    WandError::ManufacturerDataDoesNotFit {
        needed: ManufacturerData::LEN,
        adv_len: cmd.adv_data.len(),
        adv_max,
        scan_rsp_len: cmd.scan_rsp_data.len(),
        scan_rsp_max: SCAN_RSP_DATA_MAX_LEN,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::GestureCode;

    fn command(adv_len: usize, scan_rsp_len: usize, connectable: bool) -> AdvertiseCommand {
        let mut cmd = AdvertiseCommand {
            connectable,
            ..Default::default()
        };
        cmd.adv_data.extend_from_slice(&[0xAA; ADV_DATA_MAX_LEN][..adv_len]).unwrap();
        cmd.scan_rsp_data
            .extend_from_slice(&[0xBB; SCAN_RSP_DATA_MAX_LEN][..scan_rsp_len])
            .unwrap();
        cmd
    }

    #[test]
    fn prefers_advertising_data() {
        let mut publisher = AdvertisingPublisher::new();
        let mut cmd = command(6, 0, true);
        let index = publisher.install(&mut cmd, &ManufacturerData::new()).unwrap();

        assert!(!index.is_scan_rsp());
        assert_eq!(index.raw(), 6);
        assert_eq!(cmd.adv_data.len(), 13);
        assert_eq!(&cmd.adv_data[6..], &[6, 0xFF, 0, 0, 0, 0, 0]);
        assert_eq!(publisher.stored().adv_data, cmd.adv_data);
    }

    #[test]
    fn connectable_overflow_goes_to_scan_response() {
        let mut publisher = AdvertisingPublisher::new();
        let mut cmd = command(26, 4, true);
        let index = publisher.install(&mut cmd, &ManufacturerData::new()).unwrap();

        assert!(index.is_scan_rsp());
        assert_eq!(index.raw(), 0x80 | 4);
        assert_eq!(index.offset(), 4);
        assert_eq!(cmd.adv_data.len(), 26);
        assert_eq!(cmd.scan_rsp_data.len(), 11);
    }

    #[test]
    fn non_connectable_uses_full_length() {
        let mut publisher = AdvertisingPublisher::new();
        let mut cmd = command(24, 0, false);
        let index = publisher.install(&mut cmd, &ManufacturerData::new()).unwrap();
        assert_eq!(index, MnfDataIndex::in_adv_data(24));
        assert_eq!(cmd.adv_data.len(), ADV_DATA_MAX_LEN);
    }

    #[test]
    fn no_room_anywhere_is_a_sizing_error() {
        let mut publisher = AdvertisingPublisher::new();
        let mut cmd = command(28, 25, true);
        let err = publisher.install(&mut cmd, &ManufacturerData::new()).unwrap_err();
        assert_eq!(
            err,
            WandError::ManufacturerDataDoesNotFit {
                needed: 7,
                adv_len: 28,
                adv_max: 28,
                scan_rsp_len: 25,
                scan_rsp_max: 31,
            }
        );
        assert_eq!(cmd.adv_data.len(), 28);
        assert_eq!(cmd.scan_rsp_data.len(), 25);
    }

    #[test]
    fn splice_updates_selected_buffer_only() {
        let mut publisher = AdvertisingPublisher::new();
        let mut cmd = command(26, 2, true);
        publisher.install(&mut cmd, &ManufacturerData::new()).unwrap();

        let mut mnf = ManufacturerData::new();
        mnf.payload.append(GestureCode::Down);
        publisher.splice(&mnf);

        assert_eq!(&publisher.stored().scan_rsp_data[2..], &[6, 0xFF, 0x44, 0, 0, 0, 0]);
        assert_eq!(publisher.stored().adv_data, cmd.adv_data);
    }

    #[test]
    fn splice_before_install_is_ignored() {
        let mut publisher = AdvertisingPublisher::new();
        let before = publisher.stored().clone();
        publisher.splice(&ManufacturerData::new());
        assert_eq!(publisher.stored(), &before);
    }
}
