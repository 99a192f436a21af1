//! Remote MCU Library
//!
//! Application logic for a BLE peripheral exposing the Remote service and the
//! Bond Management Service, independent of the BLE stack underneath.
//!
//! This crate provides:
//! - Traits for the host stack, bond store, allow list, advertiser, Remote
//!   service and LEDs
//! - The callback groups a binding forwards stack events to
//! - The boot-time bond inventory, allow list and advertising policy
//! - The authorization gate and control point handling for BMS
//!
//! # Example MCU implementations
//! - ESP32 (NimBLE): see `remote-esp32`

pub mod address;
pub mod advertising;
pub mod app;
pub mod auth;
pub mod ble;
pub mod bms;
pub mod bonds;
pub mod boot;
pub mod buttons;
pub mod callbacks;
pub mod config;
mod error;
pub mod shared;

#[cfg(test)]
mod fake;

pub use address::{AddressKind, PeerAddress};
pub use advertising::{
    Advertiser, AdvertisingData, AdvertisingInterval, AdvertisingMode, AdvertisingParams,
    FilterPolicy,
};
pub use app::RemoteApp;
pub use auth::AuthorizationCode;
pub use ble::*;
pub use bms::BmsError;
pub use bonds::{AllowList, BondInventory, BondStore, PopulatedAllowList};
pub use boot::{BootReport, boot};
pub use buttons::ButtonIndex;
pub use callbacks::*;
pub use config::AppConfig;
pub use error::{BootError, ConfigError};
pub use shared::{SubscriptionQueue, SubscriptionSender, subscription_channel};
