//! BLE Client for Remote BMS peripherals
//!
//! Provides functions to scan for Remote devices, watch their button
//! notifications, send messages and issue Bond Management Service requests.

use btleplug::api::bleuuid::uuid_from_u16;
use btleplug::api::{Central, Characteristic, Manager as _, Peripheral as _, ScanFilter, WriteType};
use btleplug::platform::{Adapter, Manager, Peripheral};
use futures::StreamExt;
use log::*;
use std::time::Duration;
use uuid::Uuid;

use remote_proto::ble::{BUTTON_CHRC_UUID, MESSAGE_CHRC_UUID, REMOTE_SERVICE_UUID, parse_button_value};
use remote_proto::bms::{self, ControlPointRequest, Features, Operation};

use crate::ControllerError;

/// Seconds spent scanning before looking for a target
const FIND_SCAN_SECS: u64 = 5;

/// A discovered device
#[derive(Debug, Clone)]
pub struct RemoteDevice {
    pub name: String,
    pub address: String,
    pub rssi: Option<i16>,
    pub is_remote: bool,
}

/// Parse UUID string into uuid::Uuid
fn parse_uuid(s: &str) -> Uuid {
    Uuid::parse_str(s).expect("invalid UUID in remote_proto")
}

/// Whether an advertiser is a Remote peripheral, by its scan response UUID
pub fn is_remote_device(services: &[Uuid]) -> bool {
    let remote = parse_uuid(REMOTE_SERVICE_UUID);
    services.contains(&remote)
}

/// Whether a device matches a user supplied name/address pattern, or any
/// Remote device when there is no pattern
pub fn matches_target(target: Option<&str>, name: &str, address: &str, is_remote: bool) -> bool {
    match target {
        Some(t) => name.contains(t) || address.eq_ignore_ascii_case(t) || address.contains(t),
        None => is_remote,
    }
}

/// Get the default Bluetooth adapter
pub async fn get_adapter() -> Result<Adapter, ControllerError> {
    let manager = Manager::new().await?;
    let adapters = manager.adapters().await?;
    adapters.into_iter().next().ok_or(ControllerError::NoAdapter)
}

/// Scan for BLE devices
///
/// Returns every discovered device. Remote devices have `is_remote = true`.
pub async fn scan(duration_secs: u64) -> Result<Vec<RemoteDevice>, ControllerError> {
    let adapter = get_adapter().await?;

    adapter.start_scan(ScanFilter::default()).await?;
    tokio::time::sleep(Duration::from_secs(duration_secs)).await;

    let peripherals = adapter.peripherals().await?;
    let mut devices = Vec::new();

    for peripheral in peripherals {
        if let Some(props) = peripheral.properties().await? {
            let name = props.local_name.unwrap_or_else(|| "Unknown".to_string());
            let address = peripheral.address().to_string();
            let is_remote = is_remote_device(&props.services);
            devices.push(RemoteDevice { name, address, rssi: props.rssi, is_remote });
        }
    }

    adapter.stop_scan().await?;
    Ok(devices)
}

/// Find a device by name/address pattern, or find any Remote device
pub async fn find_device(target: Option<&str>) -> Result<Peripheral, ControllerError> {
    let adapter = get_adapter().await?;

    adapter.start_scan(ScanFilter::default()).await?;
    tokio::time::sleep(Duration::from_secs(FIND_SCAN_SECS)).await;

    let peripherals = adapter.peripherals().await?;

    for peripheral in peripherals {
        if let Some(props) = peripheral.properties().await? {
            let name = props.local_name.unwrap_or_default();
            let address = peripheral.address().to_string();

            if matches_target(target, &name, &address, is_remote_device(&props.services)) {
                adapter.stop_scan().await?;
                debug!("found {} ({})", name, address);
                return Ok(peripheral);
            }
        }
    }

    adapter.stop_scan().await?;
    Err(ControllerError::DeviceNotFound)
}

async fn connect(target: Option<&str>) -> Result<Peripheral, ControllerError> {
    let device = find_device(target).await?;
    device.connect().await?;
    device.discover_services().await?;
    Ok(device)
}

fn characteristic(
    device: &Peripheral,
    uuid: Uuid,
    name: &'static str,
) -> Result<Characteristic, ControllerError> {
    device
        .characteristics()
        .into_iter()
        .find(|c| c.uuid == uuid)
        .ok_or(ControllerError::CharacteristicNotFound(name))
}

/// Subscribe to button notifications and call `on_press` for each press
/// until the device disconnects.
///
/// The device must already be bonded with this host if it is advertising to
/// its allow list only.
pub async fn watch_buttons<F>(target: Option<&str>, mut on_press: F) -> Result<(), ControllerError>
where
    F: FnMut(u8),
{
    let device = connect(target).await?;
    let button_uuid = parse_uuid(BUTTON_CHRC_UUID);
    let button = characteristic(&device, button_uuid, "Button")?;

    device.subscribe(&button).await?;
    let mut notifications = device.notifications().await?;

    while let Some(notification) = notifications.next().await {
        if notification.uuid != button_uuid {
            continue;
        }
        match parse_button_value(&notification.value) {
            Some(index) => on_press(index),
            None => warn!("ignoring button value {:?}", notification.value),
        }
    }

    Ok(())
}

/// Write a text message to the Message characteristic
pub async fn send_message(target: Option<&str>, message: &str) -> Result<(), ControllerError> {
    let device = connect(target).await?;
    let chr = characteristic(&device, parse_uuid(MESSAGE_CHRC_UUID), "Message")?;

    device.write(&chr, message.as_bytes(), WriteType::WithResponse).await?;

    let _ = device.disconnect().await;
    Ok(())
}

/// Read the Bond Management Feature characteristic
pub async fn read_features(target: Option<&str>) -> Result<Features, ControllerError> {
    let device = connect(target).await?;
    let chr = characteristic(&device, uuid_from_u16(bms::FEATURE_UUID16), "BMS Feature")?;

    let value = device.read(&chr).await?;
    let _ = device.disconnect().await;
    Ok(Features::from_bytes(&value)?)
}

/// Send a Bond Management Control Point request
///
/// The write fails with an ATT error when the code is refused.
pub async fn bond_management(
    target: Option<&str>,
    op: Operation,
    auth_code: &[u8],
) -> Result<(), ControllerError> {
    let device = connect(target).await?;
    let chr = characteristic(&device, uuid_from_u16(bms::CONTROL_POINT_UUID16), "BMS Control Point")?;

    let request = ControlPointRequest::new(op, auth_code);
    info!("sending {} ({} byte code)", op, auth_code.len());
    let result = device.write(&chr, &request.to_bytes(), WriteType::WithResponse).await;

    let _ = device.disconnect().await;
    result?;
    Ok(())
}
