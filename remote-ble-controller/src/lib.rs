//! Remote BLE Controller
//!
//! BLE central for Remote BMS peripherals.
//!
//! # Example
//!
//! ```ignore
//! use remote_ble_controller::ble;
//! use remote_proto::bms::Operation;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), remote_ble_controller::ControllerError> {
//!     // Scan for devices
//!     let devices = ble::scan(5).await?;
//!     for device in &devices {
//!         println!("{} ({})", device.name, device.address);
//!     }
//!
//!     // Send a message to the first Remote device found
//!     ble::send_message(None, "hello").await?;
//!
//!     // Delete every bond on the device
//!     ble::bond_management(None, Operation::DeleteAll, b"ABCD").await?;
//!
//!     Ok(())
//! }
//! ```

pub mod ble;

#[derive(thiserror::Error, Debug)]
pub enum ControllerError {
    #[error("bluetooth error: {0}")]
    Bluetooth(#[from] btleplug::Error),
    #[error("no Bluetooth adapter found")]
    NoAdapter,
    #[error("no Remote device found")]
    DeviceNotFound,
    #[error("{0} characteristic not found")]
    CharacteristicNotFound(&'static str),
    #[error("invalid response: {0}")]
    InvalidResponse(#[from] std::io::Error),
}
