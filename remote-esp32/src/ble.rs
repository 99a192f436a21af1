//! Remote GATT service and stack callback wiring
//!
//! Every NimBLE callback is forwarded to the shared `RemoteApp`. The Button
//! subscribe callback runs under the characteristic's lock, which the app takes
//! to notify, so it queues the change for the idle loop instead.
//! Uses UUIDs from remote_mcu::ble protocol.

use std::sync::{Arc, Mutex};

use esp32_nimble::utilities::BleUuid;
use esp32_nimble::utilities::mutex::Mutex as NimbleMutex;
use esp32_nimble::{
    uuid128, BLEAddress, BLEAddressType, BLECharacteristic, BLEConnDesc, BLEError, BLEServer,
    NimbleProperties, NimbleSub,
};
use log::*;
use remote_mcu::shared::lock;
use remote_mcu::{
    AddressKind, ButtonNotifier, Connection, ConnectionObserver, PairingAuthenticator, PeerAddress,
    RemoteApp, RemoteServiceObserver, SecurityLevel, SubscriptionSender,
};

use crate::board::BoardLeds;

// These must match remote_mcu::ble::{REMOTE_SERVICE_UUID, BUTTON_CHRC_UUID, MESSAGE_CHRC_UUID}
// We use uuid128! macro for compile-time generation of BleUuid
pub const REMOTE_SERVICE_UUID: BleUuid = uuid128!("e9ea0001-e19b-482d-9293-c7907585fc48");
const BUTTON_CHRC_UUID: BleUuid = uuid128!("e9ea0002-e19b-482d-9293-c7907585fc48");
const MESSAGE_CHRC_UUID: BleUuid = uuid128!("e9ea0003-e19b-482d-9293-c7907585fc48");

pub type App = RemoteApp<RemoteService, BoardLeds>;
pub type SharedApp = Arc<Mutex<App>>;

/// Handles to the Remote service characteristics
#[derive(Clone)]
pub struct RemoteService {
    button: Arc<NimbleMutex<BLECharacteristic>>,
    message: Arc<NimbleMutex<BLECharacteristic>>,
}

impl RemoteService {
    /// Create the Remote service; callbacks are attached by [`register_callbacks`]
    pub fn create(server: &mut BLEServer) -> Self {
        let service = server.create_service(REMOTE_SERVICE_UUID);

        let button = service.lock().create_characteristic(
            BUTTON_CHRC_UUID,
            NimbleProperties::READ | NimbleProperties::NOTIFY,
        );
        button.lock().set_value(&[remote_proto::ble::BUTTON_UNSET]);

        let message = service
            .lock()
            .create_characteristic(MESSAGE_CHRC_UUID, NimbleProperties::WRITE);

        Self { button, message }
    }
}

impl ButtonNotifier for RemoteService {
    type Error = BLEError;

    fn set_button_value(&mut self, value: u8) {
        self.button.lock().set_value(&[value]);
    }

    fn send_button_notification(&mut self, conn: &Connection, value: u8) -> Result<(), BLEError> {
        self.button.lock().notify_with(&[value], conn.handle)
    }
}

pub fn peer_address(addr: &BLEAddress) -> PeerAddress {
    let kind = match addr.addr_type() {
        BLEAddressType::Public => AddressKind::Public,
        BLEAddressType::Random => AddressKind::Random,
        BLEAddressType::PublicID => AddressKind::PublicIdentity,
        BLEAddressType::RandomID => AddressKind::RandomIdentity,
    };
    PeerAddress::new(kind, addr.as_le_bytes())
}

pub fn ble_address(peer: &PeerAddress) -> BLEAddress {
    let kind = match peer.kind {
        AddressKind::Public => BLEAddressType::Public,
        AddressKind::Random => BLEAddressType::Random,
        AddressKind::PublicIdentity => BLEAddressType::PublicID,
        AddressKind::RandomIdentity => BLEAddressType::RandomID,
    };
    BLEAddress::from_le_bytes(peer.bytes, kind)
}

pub fn connection(desc: &BLEConnDesc) -> Connection {
    Connection {
        handle: desc.conn_handle(),
        peer: peer_address(&desc.address()),
    }
}

fn security_level(desc: &BLEConnDesc) -> SecurityLevel {
    if desc.authenticated() && desc.sec_key_size() == 16 {
        SecurityLevel::L4
    } else if desc.authenticated() {
        SecurityLevel::L3
    } else if desc.encrypted() {
        SecurityLevel::L2
    } else {
        SecurityLevel::L1
    }
}

/// HCI / security status carried by a NimBLE error
pub fn status(e: &BLEError) -> u8 {
    (e.code() & 0xff) as u8
}

/// Forward connection, pairing and Remote service callbacks to `app`
pub fn register_callbacks(
    server: &mut BLEServer,
    app: &SharedApp,
    remote: &RemoteService,
    subscriptions: SubscriptionSender,
) {
    let connect_app = app.clone();
    server.on_connect(move |_server, desc| {
        let conn = connection(desc);
        lock(&connect_app).connected(&conn, Ok(()));
    });

    let disconnect_app = app.clone();
    server.on_disconnect(move |desc, reason| {
        let conn = connection(desc);
        let reason = reason.err().map(|e| status(&e)).unwrap_or(0);
        lock(&disconnect_app).disconnected(&conn, reason);
    });

    let auth_app = app.clone();
    server.on_authentication_complete(move |_server, desc, result| {
        let conn = connection(desc);
        let level = security_level(desc);
        let mut app = lock(&auth_app);
        match result {
            Ok(()) => {
                app.security_changed(&conn, level, Ok(()));
                app.pairing_complete(&conn, desc.bonded());
            }
            Err(e) => {
                app.security_changed(&conn, level, Err(status(&e)));
                app.pairing_failed(&conn, status(&e));
            }
        }
    });

    let confirm_app = app.clone();
    server.on_confirm_pin(move |pin| {
        let mut app = lock(&confirm_app);
        match app.current_connection().copied() {
            Some(conn) => {
                app.passkey_display(&conn, pin);
                app.pairing_confirm(&conn)
            }
            None => {
                warn!("Pairing confirm without a connection");
                false
            }
        }
    });

    // Runs with `remote.button` locked: must not take the app lock
    remote.button.lock().on_subscribe(move |_chr, _desc, sub| {
        subscriptions.send(sub.contains(NimbleSub::NOTIFY));
    });

    let message_app = app.clone();
    remote.message.lock().on_write(move |args| {
        let conn = connection(args.desc());
        lock(&message_app).data_received(&conn, args.recv_data());
    });
}
