//! Remote BMS peripheral for ESP32
//!
//! Exposes the Remote service (button notifications, text messages) and the
//! Bond Management Service. With no bonds the device advertises openly; once a
//! central has bonded, only bonded centrals can find and connect to it.

mod ble;
mod board;
mod stack;

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use esp32_nimble::BLEDevice;
use esp_idf_svc::hal::gpio::{IOPin, OutputPin};
use esp_idf_svc::hal::prelude::Peripherals;
use esp_idf_svc::nvs::EspDefaultNvsPartition;
use log::*;
use remote_mcu::shared::lock;
use remote_mcu::{AppConfig, RemoteApp};

const BUTTON_POLL_INTERVAL: Duration = Duration::from_millis(20);

fn main() -> anyhow::Result<()> {
    // Initialize ESP-IDF
    esp_idf_svc::sys::link_patches();
    esp_idf_svc::log::EspLogger::initialize_default();

    info!("Starting Bluetooth Peripheral BMS example");

    let config = AppConfig::default();

    let peripherals = Peripherals::take()?;
    // NimBLE keeps bonds in the default NVS partition
    let _nvs = EspDefaultNvsPartition::take()?;

    // Buttons on GPIO0 (BOOT), 13, 14, 27; LEDs on GPIO2 (run) and GPIO4 (connection)
    let pins = peripherals.pins;
    let mut buttons = match board::Buttons::new(vec![
        pins.gpio0.downgrade(),
        pins.gpio13.downgrade(),
        pins.gpio14.downgrade(),
        pins.gpio27.downgrade(),
    ]) {
        Ok(buttons) => Some(buttons),
        Err(e) => {
            error!("Cannot init buttons (err: {:?})", e);
            None
        }
    };

    let leds = match board::BoardLeds::new(pins.gpio2.downgrade_output(), pins.gpio4.downgrade_output()) {
        Ok(leds) => leds,
        Err(e) => {
            error!("LEDs init failed (err {:?})", e);
            return Err(e.into());
        }
    };

    // Display-only pairing: NimBLE injects this passkey without a display callback
    let passkey = unsafe { esp_idf_svc::sys::esp_random() } % 1_000_000;
    info!("Pairing passkey: {:06}", passkey);

    let server = BLEDevice::take().get_server();
    let remote = ble::RemoteService::create(server);
    let app = Arc::new(Mutex::new(RemoteApp::new(config.clone(), remote.clone(), leds)));
    let (subscriptions, subscription_queue) = remote_mcu::subscription_channel();
    ble::register_callbacks(server, &app, &remote, subscriptions);

    let mut stack = stack::NimbleStack::new(app.clone(), &config.device_name, passkey);
    let report = remote_mcu::boot(&config, &mut stack)?;

    lock(&app).set_bonded_at_boot(report.inventory.len());
    info!("Advertising mode: {:?}", report.mode);

    let mut next_blink = Instant::now();
    loop {
        subscription_queue.deliver(&mut *lock(&app));

        if let Some((state, changed)) = buttons.as_mut().and_then(|b| b.poll()) {
            lock(&app).on_button_event(state, changed);
        }

        if Instant::now() >= next_blink {
            lock(&app).blink_run_led();
            next_blink += config.run_led_blink_interval;
        }

        std::thread::sleep(BUTTON_POLL_INTERVAL);
    }
}
