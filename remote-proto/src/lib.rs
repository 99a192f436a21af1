//! Remote wire protocol - GATT UUIDs and Bond Management Service framing
//!
//! Shared by the firmware (`remote-esp32`, through `remote-mcu`) and the host
//! side controller (`remote-ble-controller`). No dependencies, so it builds for
//! both targets.

pub mod ble;
pub mod bms;
