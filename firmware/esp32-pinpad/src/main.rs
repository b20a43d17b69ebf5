//! Dwara BLE Pinpad for ESP32
//!
//! This firmware advertises the Dwara pinpad GATT service over NimBLE and
//! validates `user:code` submissions against a TOTP secret stored in NVS.
//! The built-in LED mirrors the advertising state.
//!
//! The shared secret is provisioned once into NVS under `otp_secret`.

mod ble;

use esp_idf_svc::{
    hal::{
        gpio::{Gpio2, Output, PinDriver},
        prelude::Peripherals,
    },
    nvs::{EspDefaultNvsPartition, EspNvs},
};
use log::*;
use std::sync::Mutex;

use dwara_pinpad::{Credential, State};

const NVS_NAMESPACE: &str = "dwara";
const KEY_OTP_SECRET: &str = "otp_secret";

// LED control (GPIO2 is the built-in LED on most ESP32 dev boards)
static LED: Mutex<Option<PinDriver<'static, Gpio2, Output>>> = Mutex::new(None);

/// Set the LED state
pub fn set_led(on: bool) {
    if let Ok(mut guard) = LED.lock() {
        if let Some(led) = guard.as_mut() {
            if on {
                let _ = led.set_high();
            } else {
                let _ = led.set_low();
            }
        }
    }
}

fn main() -> anyhow::Result<()> {
    // Initialize ESP-IDF
    esp_idf_svc::sys::link_patches();
    esp_idf_svc::log::EspLogger::initialize_default();

    info!("Dwara Pinpad v0.1");
    info!("Initializing...");

    let peripherals = Peripherals::take()?;
    let nvs = EspDefaultNvsPartition::take()?;

    // Initialize LED on GPIO2
    let led = PinDriver::output(peripherals.pins.gpio2)?;
    *LED.lock().unwrap() = Some(led);
    info!("LED initialized on GPIO2");

    let device_nvs = EspNvs::new(nvs, NVS_NAMESPACE, true)?;

    let secret = match load_secret(&device_nvs) {
        Some(secret) => secret,
        None => {
            error!("No TOTP secret in NVS (key '{}');", KEY_OTP_SECRET);
            error!("provision the secret and reboot.");
            loop {
                std::thread::sleep(std::time::Duration::from_secs(60));
            }
        }
    };

    let credential = Credential::standard(secret)?;

    let device_name = "Dwara-Pinpad";
    let server = ble::start_pinpad_server(credential, device_name)?;
    info!("Pinpad advertising as '{}'", device_name);

    // The BLE stack drives the server from its callbacks; the main thread
    // just reports decisions.
    let mut last_state = State::Idle;
    loop {
        std::thread::sleep(std::time::Duration::from_millis(200));

        let state = server.lock().unwrap().state();
        if state != last_state {
            match state {
                State::PinAccepted => info!("PIN ACCEPTED"),
                State::PinRejected => info!("PIN REJECTED"),
                State::Idle => info!("Idle"),
                State::Stopped => info!("Stopped"),
            }
            last_state = state;
        }
    }
}

/// Load the shared TOTP secret from NVS
fn load_secret(nvs: &EspNvs<esp_idf_svc::nvs::NvsDefault>) -> Option<Vec<u8>> {
    let mut buf = [0u8; 64];
    let secret = nvs.get_str(KEY_OTP_SECRET, &mut buf).ok()??;
    if secret.is_empty() {
        return None;
    }
    Some(secret.as_bytes().to_vec())
}
