//! NimBLE GATT server for the pinpad service
//!
//! Exposes the Dwara pinpad service: a write characteristic carrying
//! `user:code` submissions and a read/notify status characteristic. Raw
//! writes are forwarded into the shared [`PinpadServer`].
//!
//! UUIDs must match dwara_proto::ble::{SERVICE_UUID, PINPAD_UUID, STATUS_UUID}.

use esp32_nimble::{uuid128, BLEAdvertising, BLECharacteristic, BLEDevice, NimbleProperties};
use esp32_nimble::utilities::mutex::Mutex as BleMutex;
use esp32_nimble::utilities::BleUuid;
use log::*;
use std::sync::{Arc, Mutex};

use dwara_pinpad::{Credential, PinpadServer, Transport};

const SERVICE_UUID: BleUuid = uuid128!("d3a41000-6f2c-4b1e-0000-000000000000");
const PINPAD_UUID: BleUuid = uuid128!("d3a41001-6f2c-4b1e-0000-000000000000");
const STATUS_UUID: BleUuid = uuid128!("d3a41002-6f2c-4b1e-0000-000000000000");

/// Radio adapter over the NimBLE stack.
///
/// Owns the advertising handle and the status characteristic; the session
/// machine drives both through the [`Transport`] trait.
pub struct NimbleTransport {
    advertising: &'static BleMutex<BLEAdvertising>,
    status: Arc<BleMutex<BLECharacteristic>>,
}

impl Transport for NimbleTransport {
    type Error = anyhow::Error;

    fn start_advertising(&mut self, device_name: &str) -> anyhow::Result<()> {
        self.advertising
            .lock()
            .start()
            .map_err(|e| anyhow::anyhow!("BLE advertising start failed: {e:?}"))?;
        info!("BLE advertising started as '{}'", device_name);
        Ok(())
    }

    fn stop_advertising(&mut self) -> anyhow::Result<()> {
        self.advertising
            .lock()
            .stop()
            .map_err(|e| anyhow::anyhow!("BLE advertising stop failed: {e:?}"))?;
        Ok(())
    }

    fn set_status(&mut self, active: bool) -> anyhow::Result<()> {
        let value: &[u8] = if active { b"active" } else { b"stopped" };
        self.status.lock().set_value(value).notify();
        crate::set_led(active);
        Ok(())
    }
}

/// Build the GATT server, wire its callbacks into a [`PinpadServer`], and
/// start advertising.
pub fn start_pinpad_server(
    credential: Credential,
    device_name: &str,
) -> anyhow::Result<Arc<Mutex<PinpadServer<NimbleTransport>>>> {
    let ble_device = BLEDevice::take();
    BLEDevice::set_device_name(device_name)
        .map_err(|e| anyhow::anyhow!("Failed to set device name: {e:?}"))?;

    let ble_server = ble_device.get_server();
    let service = ble_server.create_service(SERVICE_UUID);

    // Pinpad characteristic (write only): `user:code` submissions
    let pinpad_char = service
        .lock()
        .create_characteristic(PINPAD_UUID, NimbleProperties::WRITE);

    // Status characteristic (read/notify)
    let status_char = service
        .lock()
        .create_characteristic(STATUS_UUID, NimbleProperties::READ | NimbleProperties::NOTIFY);
    status_char.lock().set_value(b"stopped");

    let advertising = ble_device.get_advertising();
    advertising
        .lock()
        .set_data(
            esp32_nimble::BLEAdvertisementData::new()
                .name(device_name)
                .add_service_uuid(SERVICE_UUID),
        )
        .map_err(|e| anyhow::anyhow!("Failed to set advertising data: {e:?}"))?;

    let transport = NimbleTransport {
        advertising,
        status: status_char.clone(),
    };

    let server = Arc::new(Mutex::new(PinpadServer::new(
        credential,
        device_name,
        transport,
    )));

    server.lock().unwrap().events().on_state_changed(|state, user, _cmd| {
        debug!("pinpad state: {state:?} (user '{user}')");
    });

    // Forward raw writes into the session machine. The lock is held only for
    // the duration of one evaluation.
    let write_server = server.clone();
    pinpad_char.lock().on_write(move |args| {
        if let Ok(mut s) = write_server.lock() {
            // Malformed writes are logged and dropped inside.
            let _ = s.on_raw_write(args.recv_data());
        }
    });

    let connect_server = server.clone();
    ble_server.on_connect(move |ble_srv, desc| {
        if let Ok(mut s) = connect_server.lock() {
            s.on_client_connected(&desc.address().to_string());
        }
        // Update connection parameters for better performance
        let _ = ble_srv.update_conn_params(desc.conn_handle(), 24, 48, 0, 60);
    });

    ble_server.on_disconnect(|_desc, _reason| {
        info!("BLE client disconnected");
    });

    server.lock().unwrap().start_advertising()?;

    Ok(server)
}
