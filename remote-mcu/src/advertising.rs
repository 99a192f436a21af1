//! Advertising policy
//!
//! A peripheral with no bonds advertises openly so a first central can find
//! and bond with it. Once anything is bonded, advertising is restricted to the
//! allow list for both connection and scan requests.

use crate::address::PeerAddress;
use crate::bonds::PopulatedAllowList;
use log::*;
use remote_proto::ble::{MAX_AD_LEN, REMOTE_SERVICE_UUID, ad_flags, ad_types, uuid128_le_bytes};

/// Longest device name that fits next to the flags AD structure (3 bytes) and
/// the name header (2 bytes)
pub const MAX_DEVICE_NAME_LEN: usize = MAX_AD_LEN - 3 - 2;

/// One advertising interval unit, in microseconds
pub const INTERVAL_UNIT_US: u32 = 625;

/// Advertising interval bounds in 0.625 ms units
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdvertisingInterval {
    pub min: u16,
    pub max: u16,
}

impl AdvertisingInterval {
    /// 100 ms .. 1000 ms, used while advertising to bonded peers only
    pub const FILTERED: Self = Self { min: 160, max: 1600 };

    pub fn from_millis(min_ms: u32, max_ms: u32) -> Self {
        Self { min: millis_to_units(min_ms), max: millis_to_units(max_ms) }
    }

    pub fn min_millis(&self) -> u32 {
        units_to_millis(self.min)
    }

    pub fn max_millis(&self) -> u32 {
        units_to_millis(self.max)
    }
}

fn millis_to_units(ms: u32) -> u16 {
    let units = ms.saturating_mul(1000) / INTERVAL_UNIT_US;
    units.min(u16::MAX as u32) as u16
}

fn units_to_millis(units: u16) -> u32 {
    units as u32 * INTERVAL_UNIT_US / 1000
}

/// Which advertising the peripheral runs this boot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdvertisingMode {
    /// General discoverable, undirected, unfiltered
    General,
    /// Connectable, filtered by the allow list for connections and scans
    AllowListOnly { interval: AdvertisingInterval },
}

/// Pick the advertising mode from the number of bonded peers
pub fn select_mode(bond_count: usize, filtered_interval: AdvertisingInterval) -> AdvertisingMode {
    if bond_count == 0 {
        AdvertisingMode::General
    } else {
        AdvertisingMode::AllowListOnly { interval: filtered_interval }
    }
}

/// Advertising filter policy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterPolicy {
    /// Any central may scan and connect
    None,
    /// Only allow-listed centrals may scan or connect
    ConnectAndScan,
}

/// Parameters handed to the stack's advertising start
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdvertisingParams {
    pub connectable: bool,
    pub filter: FilterPolicy,
    /// `None` keeps the stack's default interval
    pub interval: Option<AdvertisingInterval>,
    /// Directed advertising target; always `None` here
    pub directed_peer: Option<PeerAddress>,
}

impl AdvertisingParams {
    pub fn for_mode(mode: &AdvertisingMode) -> Self {
        match mode {
            AdvertisingMode::General => Self {
                connectable: true,
                filter: FilterPolicy::None,
                interval: None,
                directed_peer: None,
            },
            AdvertisingMode::AllowListOnly { interval } => Self {
                connectable: true,
                filter: FilterPolicy::ConnectAndScan,
                interval: Some(*interval),
                directed_peer: None,
            },
        }
    }
}

/// Advertising payload and scan response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdvertisingData {
    pub flags: u8,
    pub device_name: String,
    /// 128-bit service UUID placed in the scan response
    pub scan_response_uuid: &'static str,
}

impl AdvertisingData {
    pub fn new(device_name: &str) -> Self {
        Self {
            flags: ad_flags::LE_GENERAL | ad_flags::NO_BREDR,
            device_name: device_name.to_string(),
            scan_response_uuid: REMOTE_SERVICE_UUID,
        }
    }

    /// Advertising payload: flags followed by the local name.
    ///
    /// A name that does not fit is cut on a character boundary and sent as a
    /// shortened name, so the payload never exceeds [`MAX_AD_LEN`].
    pub fn ad_bytes(&self) -> Vec<u8> {
        let (name, ad_type) = shorten_name(&self.device_name);
        let mut buf = Vec::with_capacity(MAX_AD_LEN);
        buf.extend_from_slice(&[2, ad_types::FLAGS, self.flags]);
        // name.len() <= MAX_DEVICE_NAME_LEN, so the length byte cannot overflow
        buf.push(name.len() as u8 + 1);
        buf.push(ad_type);
        buf.extend_from_slice(name.as_bytes());
        buf
    }

    /// Scan response payload: the complete list of 128-bit service UUIDs
    pub fn scan_response_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(18);
        if let Some(uuid) = uuid128_le_bytes(self.scan_response_uuid) {
            buf.push(17);
            buf.push(ad_types::UUID128_ALL);
            buf.extend_from_slice(&uuid);
        }
        buf
    }
}

fn shorten_name(name: &str) -> (&str, u8) {
    if name.len() <= MAX_DEVICE_NAME_LEN {
        return (name, ad_types::NAME_COMPLETE);
    }
    let mut end = MAX_DEVICE_NAME_LEN;
    while !name.is_char_boundary(end) {
        end -= 1;
    }
    warn!("Device name is {} bytes, advertising the first {}", name.len(), end);
    (&name[..end], ad_types::NAME_SHORTENED)
}

/// Trait for the stack's advertiser
pub trait Advertiser {
    /// Error type for advertising operations
    type Error: std::fmt::Debug;

    fn start_advertising(
        &mut self,
        params: &AdvertisingParams,
        data: &AdvertisingData,
    ) -> Result<(), Self::Error>;
}

/// Start advertising in `mode`.
///
/// Requires the allow list population pass to have finished. A start failure
/// is returned to the caller as-is, no retry.
pub fn start_advertising<A: Advertiser + ?Sized>(
    mode: &AdvertisingMode,
    populated: &PopulatedAllowList,
    data: &AdvertisingData,
    advertiser: &mut A,
) -> Result<AdvertisingParams, A::Error> {
    let params = AdvertisingParams::for_mode(mode);
    match mode {
        AdvertisingMode::General => info!("Starting general advertising as '{}'", data.device_name),
        AdvertisingMode::AllowListOnly { interval } => info!(
            "Starting allow list advertising as '{}' ({} peer(s), {}-{} ms)",
            data.device_name,
            populated.added(),
            interval.min_millis(),
            interval.max_millis()
        ),
    }
    advertiser.start_advertising(&params, data)?;
    Ok(params)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bonds::{BondInventory, populate_allow_list};
    use crate::fake::{FakeStack, peer};

    #[test]
    fn no_bonds_selects_general() {
        assert_eq!(select_mode(0, AdvertisingInterval::FILTERED), AdvertisingMode::General);
    }

    #[test]
    fn any_bond_selects_allow_list() {
        for n in [1, 2, 8, 255] {
            assert_eq!(
                select_mode(n, AdvertisingInterval::FILTERED),
                AdvertisingMode::AllowListOnly { interval: AdvertisingInterval::FILTERED }
            );
        }
    }

    #[test]
    fn filtered_interval_is_100_to_1000_ms() {
        let interval = AdvertisingInterval::FILTERED;
        assert_eq!(interval.min_millis(), 100);
        assert_eq!(interval.max_millis(), 1000);
        assert_eq!(AdvertisingInterval::from_millis(100, 1000), interval);
    }

    #[test]
    fn params_per_mode() {
        let general = AdvertisingParams::for_mode(&AdvertisingMode::General);
        assert_eq!(general.filter, FilterPolicy::None);
        assert_eq!(general.interval, None);
        assert!(general.connectable);

        let filtered = AdvertisingParams::for_mode(&AdvertisingMode::AllowListOnly {
            interval: AdvertisingInterval::FILTERED,
        });
        assert_eq!(filtered.filter, FilterPolicy::ConnectAndScan);
        assert_eq!(filtered.interval, Some(AdvertisingInterval::FILTERED));
        assert_eq!(filtered.directed_peer, None);
    }

    #[test]
    fn advertising_data_flags_and_uuid() {
        let data = AdvertisingData::new("Remote BMS");
        assert_eq!(data.flags, 0x06);
        assert_eq!(data.scan_response_uuid, REMOTE_SERVICE_UUID);
    }

    #[test]
    fn payload_encoding() {
        let data = AdvertisingData::new("Remote");
        assert_eq!(
            data.ad_bytes(),
            vec![0x02, 0x01, 0x06, 0x07, 0x09, b'R', b'e', b'm', b'o', b't', b'e']
        );

        let sr = data.scan_response_bytes();
        assert_eq!(sr.len(), 18);
        assert_eq!(&sr[..2], &[0x11, 0x07]);
        assert_eq!(&sr[2..4], &[0x48, 0xfc]);
    }

    #[test]
    fn long_names_are_shortened_to_fit() {
        let exact = AdvertisingData::new(&"x".repeat(MAX_DEVICE_NAME_LEN)).ad_bytes();
        assert_eq!(exact.len(), MAX_AD_LEN);
        assert_eq!(exact[4], ad_types::NAME_COMPLETE);

        for len in [27, 255, 300] {
            let ad = AdvertisingData::new(&"x".repeat(len)).ad_bytes();
            assert_eq!(ad.len(), MAX_AD_LEN);
            assert_eq!(ad[3] as usize, MAX_DEVICE_NAME_LEN + 1);
            assert_eq!(ad[4], ad_types::NAME_SHORTENED);
        }

        // 'é' is two bytes; the cut must not split it
        let name = format!("{}é", "x".repeat(MAX_DEVICE_NAME_LEN - 1));
        let ad = AdvertisingData::new(&name).ad_bytes();
        assert_eq!(&ad[5..], "x".repeat(MAX_DEVICE_NAME_LEN - 1).as_bytes());
        assert_eq!(ad[4], ad_types::NAME_SHORTENED);
    }

    #[test]
    fn allow_list_is_complete_before_start() {
        let mut stack = FakeStack::default();
        stack.bonds = vec![peer(1), peer(2)];
        let inventory = BondInventory::scan(&stack).unwrap();
        let populated = populate_allow_list(&inventory, &mut stack);
        let mode = select_mode(inventory.len(), AdvertisingInterval::FILTERED);

        start_advertising(&mode, &populated, &AdvertisingData::new("r"), &mut stack).unwrap();
        let started = stack.advertising.as_ref().unwrap();
        assert_eq!(started.allow_list_at_start, vec![peer(1), peer(2)]);
        assert_eq!(started.params.filter, FilterPolicy::ConnectAndScan);
    }

    #[test]
    fn start_failure_is_returned() {
        let mut stack = FakeStack { fail_advertising: true, ..Default::default() };
        let populated = populate_allow_list(&BondInventory::default(), &mut stack);
        let result = start_advertising(
            &AdvertisingMode::General,
            &populated,
            &AdvertisingData::new("r"),
            &mut stack,
        );
        assert!(result.is_err());
        assert!(stack.advertising.is_none());
    }
}
