//! Application context
//!
//! Holds the state the callbacks share: the current connection, the last
//! pressed button and the number of bonds found at boot. Bindings own one
//! `RemoteApp` and forward every stack callback to it.

use log::*;
use remote_proto::bms::Operation;

use crate::ble::{ButtonNotifier, Connection, Led, SecurityLevel, StatusLeds};
use crate::bms::{BmsError, handle_control_point};
use crate::bonds::BondStore;
use crate::buttons::ButtonIndex;
use crate::callbacks::{
    BondManagementAuthorizer, ConnectionObserver, PairingAuthenticator, RemoteServiceObserver,
    StackStatus,
};
use crate::config::AppConfig;

pub struct RemoteApp<N, L> {
    config: AppConfig,
    notifier: N,
    leds: L,
    current_conn: Option<Connection>,
    button_value: u8,
    bonded_at_boot: usize,
    blink_status: u32,
}

impl<N, L> RemoteApp<N, L>
where
    N: ButtonNotifier,
    L: StatusLeds,
{
    pub fn new(config: AppConfig, notifier: N, leds: L) -> Self {
        Self {
            config,
            notifier,
            leds,
            current_conn: None,
            button_value: remote_proto::ble::BUTTON_UNSET,
            bonded_at_boot: 0,
            blink_status: 0,
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn current_connection(&self) -> Option<&Connection> {
        self.current_conn.as_ref()
    }

    /// Last pressed button, 0 until a button has been pressed
    pub fn button_value(&self) -> u8 {
        self.button_value
    }

    pub fn bonded_at_boot(&self) -> usize {
        self.bonded_at_boot
    }

    pub fn set_bonded_at_boot(&mut self, count: usize) {
        self.bonded_at_boot = count;
    }

    pub fn notifier(&self) -> &N {
        &self.notifier
    }

    pub fn leds(&self) -> &L {
        &self.leds
    }

    /// Handle a button driver event.
    ///
    /// A mapped press is stored in the Button characteristic and notified to
    /// the connected central. Delivery is at most once: a failed send is only
    /// logged.
    pub fn on_button_event(&mut self, button_state: u32, has_changed: u32) -> Option<ButtonIndex> {
        let button = ButtonIndex::from_edge(button_state, has_changed)?;
        info!("Button {} pressed", button);

        self.button_value = button.get();
        self.notifier.set_button_value(button.get());

        match &self.current_conn {
            Some(conn) => {
                if let Err(e) = self.notifier.send_button_notification(conn, button.get()) {
                    error!("couldn't send notification (err: {:?})", e);
                }
            }
            None => debug!("no central connected, button {} not notified", button),
        }
        Some(button)
    }

    /// Toggle the run status LED; called once per idle loop iteration
    pub fn blink_run_led(&mut self) {
        self.blink_status = self.blink_status.wrapping_add(1);
        let on = self.blink_status % 2 == 1;
        if let Err(e) = self.leds.set_led(Led::RunStatus, on) {
            warn!("Failed to set run LED: {:?}", e);
        }
    }

    /// Handle a Bond Management Control Point write
    pub fn handle_bms_write<S: BondStore + ?Sized>(
        &mut self,
        conn: &Connection,
        data: &[u8],
        store: &mut S,
    ) -> Result<Operation, BmsError> {
        let features = self.config.bms_features;
        handle_control_point(&features, conn, data, self, store)
    }

    fn set_conn_led(&mut self, on: bool) {
        if let Err(e) = self.leds.set_led(Led::ConnStatus, on) {
            warn!("Failed to set connection LED: {:?}", e);
        }
    }
}

impl<N, L> ConnectionObserver for RemoteApp<N, L>
where
    N: ButtonNotifier,
    L: StatusLeds,
{
    fn connected(&mut self, conn: &Connection, result: Result<(), StackStatus>) {
        if let Err(err) = result {
            warn!("Connection failed (err {})", err);
            return;
        }

        info!("Connected {}", conn.peer);
        self.current_conn = Some(*conn);
        self.set_conn_led(true);
    }

    fn disconnected(&mut self, _conn: &Connection, reason: StackStatus) {
        info!("Disconnected (reason {})", reason);

        self.set_conn_led(false);
        if let Some(released) = self.current_conn.take() {
            debug!("released connection handle {}", released.handle);
        }
    }

    fn security_changed(
        &mut self,
        conn: &Connection,
        level: SecurityLevel,
        result: Result<(), StackStatus>,
    ) {
        match result {
            Ok(()) => info!("Security changed: {} level {}", conn.peer, level.as_u8()),
            Err(err) => warn!(
                "Security failed: {} level {} err {}",
                conn.peer,
                level.as_u8(),
                err
            ),
        }
    }
}

impl<N, L> PairingAuthenticator for RemoteApp<N, L>
where
    N: ButtonNotifier,
    L: StatusLeds,
{
    fn passkey_display(&mut self, conn: &Connection, passkey: u32) {
        info!("Passkey for {}: {:06}", conn.peer, passkey);
    }

    fn cancel(&mut self, conn: &Connection) {
        info!("Pairing cancelled: {}", conn.peer);
    }

    fn pairing_confirm(&mut self, conn: &Connection) -> bool {
        info!("Pairing confirmed: {}", conn.peer);
        true
    }

    fn pairing_complete(&mut self, conn: &Connection, bonded: bool) {
        info!("Pairing completed: {}, bonded: {}", conn.peer, bonded);
    }

    fn pairing_failed(&mut self, conn: &Connection, reason: StackStatus) {
        warn!("Pairing failed conn: {}, reason {}", conn.peer, reason);
    }
}

impl<N, L> BondManagementAuthorizer for RemoteApp<N, L> {
    fn authorize(&mut self, _conn: &Connection, code: &[u8]) -> bool {
        self.config.auth_code.authorize(code)
    }
}

impl<N, L> RemoteServiceObserver for RemoteApp<N, L> {
    fn notifications_changed(&mut self, enabled: bool) {
        if enabled {
            info!("Notifications enabled");
        } else {
            info!("Notifications disabled");
        }
    }

    fn data_received(&mut self, conn: &Connection, data: &[u8]) {
        info!("Received data on conn {}. Len: {}", conn.handle, data.len());
        info!("Data: {}", String::from_utf8_lossy(data));
    }
}
