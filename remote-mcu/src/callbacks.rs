//! Callback groups the BLE stack drives
//!
//! A binding registers one object implementing these traits with its stack and
//! forwards every stack callback to the matching method.

use crate::ble::{Connection, SecurityLevel};

/// HCI status or security error code reported by the stack
pub type StackStatus = u8;

/// Connection lifecycle events
pub trait ConnectionObserver {
    /// A central connected (`Ok`) or the connection attempt failed
    fn connected(&mut self, conn: &Connection, result: Result<(), StackStatus>);

    /// The link went down with the given HCI reason
    fn disconnected(&mut self, conn: &Connection, reason: StackStatus);

    /// Link security changed, or the change failed
    fn security_changed(
        &mut self,
        conn: &Connection,
        level: SecurityLevel,
        result: Result<(), StackStatus>,
    );
}

/// Pairing and authentication events
pub trait PairingAuthenticator {
    /// Show `passkey` to the user
    fn passkey_display(&mut self, conn: &Connection, passkey: u32);

    /// Pairing was cancelled
    fn cancel(&mut self, conn: &Connection);

    /// Confirm an incoming pairing request; `true` accepts it
    fn pairing_confirm(&mut self, conn: &Connection) -> bool;

    /// Pairing finished; `bonded` is true when keys were persisted
    fn pairing_complete(&mut self, conn: &Connection, bonded: bool);

    fn pairing_failed(&mut self, conn: &Connection, reason: StackStatus);
}

/// Authorization of privileged Bond Management Service operations
pub trait BondManagementAuthorizer {
    /// Return true to let the operation proceed
    fn authorize(&mut self, conn: &Connection, code: &[u8]) -> bool;
}

/// Remote service events
pub trait RemoteServiceObserver {
    /// The central enabled or disabled Button characteristic notifications
    fn notifications_changed(&mut self, enabled: bool);

    /// The central wrote the Message characteristic
    fn data_received(&mut self, conn: &Connection, data: &[u8]);
}
