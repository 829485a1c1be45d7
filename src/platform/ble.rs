// Wand — Bluedroid BLE Adapter
//
// Raw GAP calls for advertising, plus GAP/GATTS callbacks that forward the
// notifications the engine cares about into the dispatch channel.  The
// callbacks run on the Bluetooth task and never touch engine state directly.

use std::sync::mpsc::Sender;
use std::sync::Mutex;

use esp_idf_hal::modem::Modem;
use esp_idf_svc::bt::{Ble, BtDriver};
use esp_idf_svc::nvs::EspDefaultNvsPartition;
use esp_idf_sys::*;
use heapless::Vec;

use crate::config::{
    ADVERTISE_CONNECTABLE, ADV_DATA_MAX_LEN, PREFERRED_CONNECTION, USER_ADVERTISE_DATA,
    USER_SCAN_RESPONSE_DATA,
};
use crate::events::{AdvertiseStatus, BleEvent, ConnectionId, ConnectionParams};
use crate::hal::{AdvertiseCommand, BleStack};

/// Flags AD structure: LE General Discoverable, BR/EDR not supported.
const ADV_FLAGS: [u8; 3] = [0x02, 0x01, 0x06];
const ADV_INTERVAL_MIN: u16 = 0x20; // 20 ms (0.625 ms units)
const ADV_INTERVAL_MAX: u16 = 0x40; // 40 ms

static BLE_EVENTS: Mutex<Option<Sender<BleEvent>>> = Mutex::new(None);
static PEER_BDA: Mutex<[u8; 6]> = Mutex::new([0; 6]);

pub struct EspBle {
    _driver: BtDriver<'static, Ble>,
    connectable: bool,
}

impl EspBle {
    pub fn new(
        modem: Modem,
        nvs: EspDefaultNvsPartition,
        events: Sender<BleEvent>,
    ) -> anyhow::Result<Self> {
        let driver = BtDriver::<Ble>::new(modem, Some(nvs))?;

        if let Ok(mut slot) = BLE_EVENTS.lock() {
            *slot = Some(events);
        }

        unsafe {
            esp!(esp_ble_gap_register_callback(Some(gap_event_handler)))?;
            esp!(esp_ble_gatts_register_callback(Some(gatts_event_handler)))?;
            esp!(esp_ble_gatts_app_register(0))?;
        }

        log::info!("Bluetooth LE ready");
        Ok(Self {
            _driver: driver,
            connectable: ADVERTISE_CONNECTABLE,
        })
    }

    fn configure_data(&self, adv_data: &[u8], scan_rsp_data: &[u8]) {
        let mut adv: Vec<u8, ADV_DATA_MAX_LEN> = Vec::new();
        let flags: &[u8] = if self.connectable { &ADV_FLAGS } else { &[] };
        if adv.extend_from_slice(flags).is_err() || adv.extend_from_slice(adv_data).is_err() {
            log::error!("Advertising data too long ({} bytes)", adv_data.len());
            return;
        }
        let mut scan_rsp: Vec<u8, ADV_DATA_MAX_LEN> = Vec::new();
        if scan_rsp.extend_from_slice(scan_rsp_data).is_err() {
            log::error!("Scan response too long ({} bytes)", scan_rsp_data.len());
            return;
        }

        unsafe {
            check(
                "config adv data",
                esp_ble_gap_config_adv_data_raw(adv.as_mut_ptr(), adv.len() as u32),
            );
            check(
                "config scan response",
                esp_ble_gap_config_scan_rsp_data_raw(scan_rsp.as_mut_ptr(), scan_rsp.len() as u32),
            );
        }
    }
}

impl BleStack for EspBle {
    fn active_advertise_command(&mut self) -> AdvertiseCommand {
        let mut cmd = AdvertiseCommand {
            connectable: self.connectable,
            ..Default::default()
        };
        // Both constants are sized well under the buffer limits.
        let _ = cmd.adv_data.extend_from_slice(USER_ADVERTISE_DATA);
        let _ = cmd.scan_rsp_data.extend_from_slice(USER_SCAN_RESPONSE_DATA);
        cmd
    }

    fn start_undirected_advertising(&mut self, cmd: &AdvertiseCommand) {
        self.connectable = cmd.connectable;
        self.configure_data(&cmd.adv_data, &cmd.scan_rsp_data);

        let mut params = esp_ble_adv_params_t {
            adv_int_min: ADV_INTERVAL_MIN,
            adv_int_max: ADV_INTERVAL_MAX,
            adv_type: if cmd.connectable {
                esp_ble_adv_type_t_ADV_TYPE_IND
            } else {
                esp_ble_adv_type_t_ADV_TYPE_NONCONN_IND
            },
            own_addr_type: esp_ble_addr_type_t_BLE_ADDR_TYPE_PUBLIC,
            channel_map: esp_ble_adv_channel_t_ADV_CHNL_ALL,
            adv_filter_policy: esp_ble_adv_filter_t_ADV_FILTER_ALLOW_SCAN_ANY_CON_ANY,
            // No directed peer.
            ..unsafe { core::mem::zeroed() }
        };
        unsafe {
            check("start advertising", esp_ble_gap_start_advertising(&mut params));
        }
    }

    fn stop_advertising(&mut self) {
        unsafe {
            check("stop advertising", esp_ble_gap_stop_advertising());
        }
    }

    fn update_live_advertising_data(&mut self, adv_data: &[u8], scan_rsp_data: &[u8]) {
        self.configure_data(adv_data, scan_rsp_data);
    }

    fn start_connection_param_update(&mut self, conidx: ConnectionId) {
        let bda = PEER_BDA.lock().map(|bda| *bda).unwrap_or_default();
        let mut params = esp_ble_conn_update_params_t {
            bda,
            min_int: PREFERRED_CONNECTION.interval_min,
            max_int: PREFERRED_CONNECTION.interval_max,
            latency: PREFERRED_CONNECTION.latency,
            timeout: PREFERRED_CONNECTION.supervision_timeout,
        };
        log::info!("Requesting preferred connection parameters on link {}", conidx);
        unsafe {
            check("connection parameter update", esp_ble_gap_update_conn_params(&mut params));
        }
    }
}

fn check(what: &str, err: esp_err_t) {
    if err != ESP_OK {
        log::warn!("BLE {} failed ({})", what, err);
    }
}

fn forward(event: BleEvent) {
    if let Ok(slot) = BLE_EVENTS.lock() {
        if let Some(tx) = slot.as_ref() {
            // Receiver gone means dispatch has stopped; nothing left to tell.
            let _ = tx.send(event);
        }
    }
}

unsafe extern "C" fn gap_event_handler(event: esp_gap_ble_cb_event_t, param: *mut esp_ble_gap_cb_param_t) {
    let ble_event = match event {
        esp_gap_ble_cb_event_t_ESP_GAP_BLE_ADV_STOP_COMPLETE_EVT => {
            Some(BleEvent::AdvertiseComplete(AdvertiseStatus::Canceled))
        }
        esp_gap_ble_cb_event_t_ESP_GAP_BLE_ADV_START_COMPLETE_EVT => {
            let status = unsafe { (*param).adv_start_cmpl.status };
            (status != esp_bt_status_t_ESP_BT_STATUS_SUCCESS)
                .then_some(BleEvent::AdvertiseComplete(AdvertiseStatus::Failed))
        }
        esp_gap_ble_cb_event_t_ESP_GAP_BLE_UPDATE_CONN_PARAMS_EVT => {
            let p = unsafe { (*param).update_conn_params };
            Some(BleEvent::ParamsUpdated(ConnectionParams {
                interval: p.conn_int,
                latency: p.latency,
                supervision_timeout: p.timeout,
            }))
        }
        _ => None,
    };
    if let Some(e) = ble_event {
        forward(e);
    }
}

unsafe extern "C" fn gatts_event_handler(
    event: esp_gatts_cb_event_t,
    _gatts_if: esp_gatt_if_t,
    param: *mut esp_ble_gatts_cb_param_t,
) {
    match event {
        esp_gatts_cb_event_t_ESP_GATTS_CONNECT_EVT => {
            let connect = unsafe { (*param).connect };
            if let Ok(mut bda) = PEER_BDA.lock() {
                *bda = connect.remote_bda;
            }
            forward(BleEvent::Connected {
                conidx: connect.conn_id,
                params: ConnectionParams {
                    interval: connect.conn_params.interval,
                    latency: connect.conn_params.latency,
                    supervision_timeout: connect.conn_params.timeout,
                },
            });
        }
        esp_gatts_cb_event_t_ESP_GATTS_DISCONNECT_EVT => {
            let disconnect = unsafe { (*param).disconnect };
            forward(BleEvent::Disconnected {
                conidx: disconnect.conn_id,
                reason: disconnect.reason as u8,
            });
        }
        _ => {}
    }
}
