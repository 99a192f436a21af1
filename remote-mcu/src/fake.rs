//! In-memory stack used by the unit tests

use std::cell::RefCell;
use std::collections::HashMap;

use remote_proto::bms::Features;

use crate::address::{AddressKind, PeerAddress};
use crate::advertising::{Advertiser, AdvertisingData, AdvertisingParams, FilterPolicy};
use crate::ble::{BleHost, ButtonNotifier, Connection, Led, StatusLeds};
use crate::bonds::{AllowList, BondStore};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FakeError(pub &'static str);

pub fn peer(n: u8) -> PeerAddress {
    PeerAddress::new(AddressKind::Public, [n, 0x00, 0x00, 0x00, 0x00, 0xc0])
}

pub fn conn(n: u8) -> Connection {
    Connection { handle: n as u16, peer: peer(n) }
}

#[derive(Debug, Clone)]
pub struct StartedAdvertising {
    pub params: AdvertisingParams,
    pub data: AdvertisingData,
    pub allow_list_at_start: Vec<PeerAddress>,
}

#[derive(Debug)]
pub struct FakeStack {
    pub bonds: Vec<PeerAddress>,
    pub allow_list: Vec<PeerAddress>,
    pub reject_allow_list: Vec<PeerAddress>,
    pub advertising: Option<StartedAdvertising>,
    pub persistent_settings: bool,
    pub settings_loaded: bool,
    pub bms_features: Option<Features>,
    pub fail_enable: bool,
    pub fail_settings: bool,
    pub fail_bms: bool,
    pub fail_bond_read: bool,
    pub fail_delete: bool,
    pub fail_advertising: bool,
    pub calls: RefCell<Vec<&'static str>>,
}

impl Default for FakeStack {
    fn default() -> Self {
        Self {
            bonds: Vec::new(),
            allow_list: Vec::new(),
            reject_allow_list: Vec::new(),
            advertising: None,
            persistent_settings: true,
            settings_loaded: false,
            bms_features: None,
            fail_enable: false,
            fail_settings: false,
            fail_bms: false,
            fail_bond_read: false,
            fail_delete: false,
            fail_advertising: false,
            calls: RefCell::new(Vec::new()),
        }
    }
}

impl FakeStack {
    fn record(&self, call: &'static str) {
        self.calls.borrow_mut().push(call);
    }

    /// Whether a central at `peer` could connect under the running advertising
    pub fn accepts_connection(&self, peer: &PeerAddress) -> bool {
        match &self.advertising {
            None => false,
            Some(adv) => match adv.params.filter {
                FilterPolicy::None => adv.params.connectable,
                FilterPolicy::ConnectAndScan => {
                    adv.params.connectable && self.allow_list.contains(peer)
                }
            },
        }
    }
}

fn check(fail: bool, what: &'static str) -> Result<(), FakeError> {
    if fail { Err(FakeError(what)) } else { Ok(()) }
}

impl BleHost for FakeStack {
    type Error = FakeError;

    fn enable(&mut self) -> Result<(), FakeError> {
        self.record("enable");
        check(self.fail_enable, "enable")
    }

    fn has_persistent_settings(&self) -> bool {
        self.persistent_settings
    }

    fn load_settings(&mut self) -> Result<(), FakeError> {
        self.record("load_settings");
        check(self.fail_settings, "settings")?;
        self.settings_loaded = true;
        Ok(())
    }

    fn register_bms(&mut self, features: &Features) -> Result<(), FakeError> {
        self.record("register_bms");
        check(self.fail_bms, "bms")?;
        self.bms_features = Some(*features);
        Ok(())
    }
}

impl BondStore for FakeStack {
    type Error = FakeError;

    fn bonded_peers(&self) -> Result<Vec<PeerAddress>, FakeError> {
        self.record("bonded_peers");
        check(self.fail_bond_read, "bond read")?;
        Ok(self.bonds.clone())
    }

    fn delete_bond(&mut self, peer: &PeerAddress) -> Result<(), FakeError> {
        check(self.fail_delete, "delete")?;
        self.bonds.retain(|p| p != peer);
        Ok(())
    }

    fn delete_all_bonds(&mut self) -> Result<(), FakeError> {
        check(self.fail_delete, "delete")?;
        self.bonds.clear();
        Ok(())
    }
}

impl AllowList for FakeStack {
    type Error = FakeError;

    fn add(&mut self, peer: &PeerAddress) -> Result<(), FakeError> {
        let mut calls = self.calls.borrow_mut();
        if calls.last() != Some(&"allow_list_add") {
            calls.push("allow_list_add");
        }
        drop(calls);

        if self.reject_allow_list.contains(peer) {
            return Err(FakeError("allow list full"));
        }
        self.allow_list.push(*peer);
        Ok(())
    }
}

impl Advertiser for FakeStack {
    type Error = FakeError;

    fn start_advertising(
        &mut self,
        params: &AdvertisingParams,
        data: &AdvertisingData,
    ) -> Result<(), FakeError> {
        self.record("start_advertising");
        check(self.fail_advertising, "advertising")?;
        self.advertising = Some(StartedAdvertising {
            params: *params,
            data: data.clone(),
            allow_list_at_start: self.allow_list.clone(),
        });
        Ok(())
    }
}

/// Remote service and LEDs
#[derive(Debug, Default)]
pub struct FakeRemote {
    pub value: u8,
    pub notifications: Vec<(u16, u8)>,
    pub fail_notify: bool,
    pub leds: HashMap<Led, bool>,
}

impl FakeRemote {
    pub fn led(&self, led: Led) -> Option<bool> {
        self.leds.get(&led).copied()
    }
}

impl ButtonNotifier for FakeRemote {
    type Error = FakeError;

    fn set_button_value(&mut self, value: u8) {
        self.value = value;
    }

    fn send_button_notification(&mut self, conn: &Connection, value: u8) -> Result<(), FakeError> {
        check(self.fail_notify, "notify")?;
        self.notifications.push((conn.handle, value));
        Ok(())
    }
}

impl StatusLeds for FakeRemote {
    type Error = FakeError;

    fn set_led(&mut self, led: Led, on: bool) -> Result<(), FakeError> {
        self.leds.insert(led, on);
        Ok(())
    }
}
