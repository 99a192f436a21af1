//! BLE stack seams for the Remote peripheral
//!
//! Protocol constants (UUIDs, flags) are in remote_proto::ble.
//! This module provides MCU-side types and the traits a binding implements
//! for the host stack, the Remote service and the status LEDs.

// Re-export protocol constants for convenience
pub use remote_proto::ble::{BUTTON_CHRC_UUID, MESSAGE_CHRC_UUID, REMOTE_SERVICE_UUID, ad_flags};

use crate::address::PeerAddress;

/// An established peripheral-role connection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Connection {
    /// Stack connection handle
    pub handle: u16,
    /// Peer's address as seen on this link
    pub peer: PeerAddress,
}

/// Security level reached on a link
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum SecurityLevel {
    /// No encryption, no authentication
    L1,
    /// Encryption without MITM protection
    L2,
    /// Encryption with MITM protection
    L3,
    /// LE Secure Connections with MITM protection
    L4,
}

impl SecurityLevel {
    pub fn as_u8(&self) -> u8 {
        match self {
            SecurityLevel::L1 => 1,
            SecurityLevel::L2 => 2,
            SecurityLevel::L3 => 3,
            SecurityLevel::L4 => 4,
        }
    }
}

/// Board LEDs driven by the application
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Led {
    /// Blinks while the idle loop runs
    RunStatus,
    /// On while a central is connected
    ConnStatus,
}

/// Trait for the host stack lifecycle
///
/// MCU-specific crates implement this trait using their BLE stack.
pub trait BleHost {
    /// Error type for host operations
    type Error: std::fmt::Debug;

    /// Enable the Bluetooth stack
    fn enable(&mut self) -> Result<(), Self::Error>;

    /// Whether persistent settings storage is compiled in
    fn has_persistent_settings(&self) -> bool;

    /// Load persisted settings (bonds, identity)
    fn load_settings(&mut self) -> Result<(), Self::Error>;

    /// Register the Bond Management Service with the given feature set
    fn register_bms(&mut self, features: &remote_proto::bms::Features) -> Result<(), Self::Error>;
}

/// Trait for the Remote GATT service's Button characteristic
pub trait ButtonNotifier {
    /// Error type for notification sends
    type Error: std::fmt::Debug;

    /// Update the value a read of the Button characteristic returns
    fn set_button_value(&mut self, value: u8);

    /// Notify `value` to `conn`; the stack drops it if the peer is not subscribed
    fn send_button_notification(&mut self, conn: &Connection, value: u8) -> Result<(), Self::Error>;
}

/// Trait for board LED control
pub trait StatusLeds {
    /// Error type for LED operations
    type Error: std::fmt::Debug;

    fn set_led(&mut self, led: Led, on: bool) -> Result<(), Self::Error>;
}
