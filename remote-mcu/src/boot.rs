//! Boot sequence
//!
//! Everything up to "advertising started". An invalid configuration, stack
//! enable, BMS registration and advertising start are fatal: the binding logs
//! the error and never enters its idle loop. Settings, the bond list and the
//! allow list are best effort, so a storage fault cannot leave the device
//! unable to advertise.

use log::*;

use crate::advertising::{
    Advertiser, AdvertisingData, AdvertisingMode, AdvertisingParams, select_mode,
    start_advertising,
};
use crate::ble::BleHost;
use crate::bonds::{AllowList, BondInventory, BondStore, PopulatedAllowList, populate_allow_list};
use crate::config::AppConfig;
use crate::error::BootError;

/// What the boot sequence decided
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BootReport {
    pub inventory: BondInventory,
    pub allow_list: PopulatedAllowList,
    pub mode: AdvertisingMode,
    pub params: AdvertisingParams,
}

/// Bring the stack up and start advertising.
///
/// Order: config check, enable, settings, BMS, bond scan, allow list,
/// advertising. The scan and the allow list pass finish before the advertising
/// start call.
pub fn boot<S>(config: &AppConfig, stack: &mut S) -> Result<BootReport, BootError>
where
    S: BleHost + BondStore + AllowList + Advertiser,
{
    config.validate().map_err(|e| {
        error!("Invalid configuration: {}", e);
        e
    })?;

    stack.enable().map_err(|e| {
        error!("Bluetooth init failed (err {:?})", e);
        BootError::BluetoothInit(format!("{e:?}"))
    })?;
    info!("Bluetooth initialized");

    if stack.has_persistent_settings() {
        info!("Settings available");
        if let Err(e) = stack.load_settings() {
            error!("Failed to load settings (err {:?})", e);
        }
    } else {
        info!("Settings not available");
    }

    stack.register_bms(&config.bms_features).map_err(|e| {
        error!("Failed to init BMS (err:{:?})", e);
        BootError::Bms(format!("{e:?}"))
    })?;

    // An unreadable bond store counts as no bonds: advertise openly
    let inventory = BondInventory::scan(&*stack).unwrap_or_else(|e| {
        error!("Failed to read bond list (err {:?})", e);
        BondInventory::default()
    });
    info!("{} bonded device(s)", inventory.len());

    let allow_list = populate_allow_list(&inventory, stack);
    let mode = select_mode(inventory.len(), config.filtered_interval);
    let data = AdvertisingData::new(&config.device_name);

    let params = start_advertising(&mode, &allow_list, &data, stack).map_err(|e| {
        error!("Advertising failed to start (err {:?})", e);
        BootError::Advertising(format!("{e:?}"))
    })?;
    info!("Advertising successfully started");

    Ok(BootReport { inventory, allow_list, mode, params })
}
