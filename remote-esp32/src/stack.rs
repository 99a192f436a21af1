//! remote_mcu stack traits on top of NimBLE
//!
//! Bonds live in NVS through NimBLE's store. The allow list is pushed to the
//! controller as a whole on every append, since NimBLE only offers a set call.

use esp32_nimble::enums::{AdvFilterPolicy, AuthReq, ConnMode, DiscMode, SecurityIOCap};
use esp32_nimble::utilities::BleUuid;
use esp32_nimble::{BLEDevice, BLEError, NimbleProperties};
use esp_idf_svc::sys::{ble_addr_t, ble_gap_wl_set};
use log::*;
use remote_mcu::shared::lock;
use remote_mcu::{
    Advertiser, AdvertisingData, AdvertisingParams, AllowList, BleHost, BondStore, FilterPolicy,
    PeerAddress,
};
use remote_proto::bms::{self, Features};

use crate::ble::{self, SharedApp};

#[derive(Debug)]
pub enum StackError {
    Ble(BLEError),
    /// NimBLE host return code
    Host(i32),
    /// Allow list already holds the controller's maximum
    AllowListFull,
}

impl From<BLEError> for StackError {
    fn from(e: BLEError) -> Self {
        StackError::Ble(e)
    }
}

/// Controller accept list capacity we allow ourselves
const MAX_ALLOW_LIST: usize = 8;

pub struct NimbleStack {
    app: SharedApp,
    device_name: String,
    passkey: u32,
    allow_list: Vec<ble_addr_t>,
}

impl NimbleStack {
    pub fn new(app: SharedApp, device_name: &str, passkey: u32) -> Self {
        Self {
            app,
            device_name: device_name.to_string(),
            passkey,
            allow_list: Vec::new(),
        }
    }
}

impl BleHost for NimbleStack {
    type Error = StackError;

    fn enable(&mut self) -> Result<(), StackError> {
        let device = BLEDevice::take();
        BLEDevice::set_device_name(&self.device_name)?;
        device
            .security()
            .set_auth(AuthReq::Bond | AuthReq::Mitm | AuthReq::Sc)
            .set_passkey(self.passkey)
            .set_io_cap(SecurityIOCap::DisplayOnly)
            .resolve_rpa();
        Ok(())
    }

    fn has_persistent_settings(&self) -> bool {
        cfg!(feature = "settings")
    }

    fn load_settings(&mut self) -> Result<(), StackError> {
        // NimBLE restores its NVS store when the host syncs; reading it back
        // here surfaces a broken store before advertising starts.
        let bonds = BLEDevice::take().bonded_addresses()?;
        info!("Settings loaded: {} stored bond(s)", bonds.len());
        Ok(())
    }

    fn register_bms(&mut self, features: &Features) -> Result<(), StackError> {
        let server = BLEDevice::take().get_server();
        let service = server.create_service(BleUuid::Uuid16(bms::SERVICE_UUID16));

        let feature = service
            .lock()
            .create_characteristic(BleUuid::Uuid16(bms::FEATURE_UUID16), NimbleProperties::READ);
        feature.lock().set_value(&features.to_bytes());

        let control_point = service.lock().create_characteristic(
            BleUuid::Uuid16(bms::CONTROL_POINT_UUID16),
            NimbleProperties::WRITE | NimbleProperties::WRITE_ENC,
        );

        let app = self.app.clone();
        control_point.lock().on_write(move |args| {
            let conn = ble::connection(args.desc());
            let data = args.recv_data().to_vec();
            let result = lock(&app).handle_bms_write(&conn, &data, &mut NimbleBonds);
            if let Err(e) = result {
                warn!("BMS control point rejected: {}", e);
                args.reject_with_error_code(e.att_code());
            }
        });

        info!("BMS registered (features 0x{:06x})", features.mask());
        Ok(())
    }
}

/// NimBLE's persistent bond store
pub struct NimbleBonds;

impl BondStore for NimbleBonds {
    type Error = StackError;

    fn bonded_peers(&self) -> Result<Vec<PeerAddress>, StackError> {
        let addrs = BLEDevice::take().bonded_addresses()?;
        Ok(addrs.iter().map(ble::peer_address).collect())
    }

    fn delete_bond(&mut self, peer: &PeerAddress) -> Result<(), StackError> {
        BLEDevice::take().delete_bond(&ble::ble_address(peer))?;
        Ok(())
    }

    fn delete_all_bonds(&mut self) -> Result<(), StackError> {
        BLEDevice::take().delete_all_bonds()?;
        Ok(())
    }
}

impl BondStore for NimbleStack {
    type Error = StackError;

    fn bonded_peers(&self) -> Result<Vec<PeerAddress>, StackError> {
        NimbleBonds.bonded_peers()
    }

    fn delete_bond(&mut self, peer: &PeerAddress) -> Result<(), StackError> {
        NimbleBonds.delete_bond(peer)
    }

    fn delete_all_bonds(&mut self) -> Result<(), StackError> {
        NimbleBonds.delete_all_bonds()
    }
}

impl AllowList for NimbleStack {
    type Error = StackError;

    fn add(&mut self, peer: &PeerAddress) -> Result<(), StackError> {
        if self.allow_list.len() >= MAX_ALLOW_LIST {
            return Err(StackError::AllowListFull);
        }
        self.allow_list.push(ble_addr_t {
            type_: peer.kind.as_u8(),
            val: peer.bytes,
        });

        let rc = unsafe { ble_gap_wl_set(self.allow_list.as_ptr(), self.allow_list.len() as u8) };
        if rc != 0 {
            // keep the list in sync with what the controller accepted
            self.allow_list.pop();
            return Err(StackError::Host(rc));
        }
        Ok(())
    }
}

impl Advertiser for NimbleStack {
    type Error = StackError;

    fn start_advertising(
        &mut self,
        params: &AdvertisingParams,
        data: &AdvertisingData,
    ) -> Result<(), StackError> {
        let mut advertising = BLEDevice::take().get_advertising().lock();

        advertising.set_raw_data(&data.ad_bytes())?;
        advertising.set_raw_scan_response_data(&data.scan_response_bytes())?;
        advertising
            .advertisement_type(if params.connectable { ConnMode::Und } else { ConnMode::Non })
            .disc_mode(DiscMode::Gen)
            .filter_policy(match params.filter {
                FilterPolicy::None => AdvFilterPolicy::None,
                FilterPolicy::ConnectAndScan => AdvFilterPolicy::Both,
            });
        if let Some(interval) = params.interval {
            advertising.min_interval(interval.min).max_interval(interval.max);
        }

        advertising.start()?;
        Ok(())
    }
}
