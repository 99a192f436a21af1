//! Remote GATT Service Protocol Constants
//!
//! The Remote service carries a Button characteristic (read/notify, one byte
//! holding the index of the last pressed button) and a Message characteristic
//! (write, free-form bytes).

/// Remote Service UUID: e9ea0001-e19b-482d-9293-c7907585fc48
pub const REMOTE_SERVICE_UUID: &str = "e9ea0001-e19b-482d-9293-c7907585fc48";

/// Button Characteristic UUID (read/notify)
pub const BUTTON_CHRC_UUID: &str = "e9ea0002-e19b-482d-9293-c7907585fc48";

/// Message Characteristic UUID (write)
pub const MESSAGE_CHRC_UUID: &str = "e9ea0003-e19b-482d-9293-c7907585fc48";

/// Advertising data flags
pub mod ad_flags {
    /// LE General Discoverable Mode
    pub const LE_GENERAL: u8 = 0x02;

    /// BR/EDR Not Supported
    pub const NO_BREDR: u8 = 0x04;
}

/// Advertising data AD types
pub mod ad_types {
    pub const FLAGS: u8 = 0x01;
    pub const UUID128_ALL: u8 = 0x07;
    pub const NAME_SHORTENED: u8 = 0x08;
    pub const NAME_COMPLETE: u8 = 0x09;
}

/// Legacy advertising payload limit, in bytes
pub const MAX_AD_LEN: usize = 31;

/// Number of buttons on the board, numbered 1..=BUTTON_COUNT on the wire.
pub const BUTTON_COUNT: u8 = 4;

/// Button characteristic value before any button has been pressed
pub const BUTTON_UNSET: u8 = 0;

/// Decode a Button characteristic value, `None` for unset or out of range.
pub fn parse_button_value(data: &[u8]) -> Option<u8> {
    match data.first() {
        Some(&v) if (1..=BUTTON_COUNT).contains(&v) => Some(v),
        _ => None,
    }
}

/// Parse a textual 128-bit UUID into the little-endian byte order used on air
pub fn uuid128_le_bytes(uuid: &str) -> Option<[u8; 16]> {
    let hex: Vec<u8> = uuid.bytes().filter(|b| *b != b'-').collect();
    if hex.len() != 32 {
        return None;
    }
    let mut out = [0u8; 16];
    for (i, pair) in hex.chunks(2).enumerate() {
        let s = std::str::from_utf8(pair).ok()?;
        out[15 - i] = u8::from_str_radix(s, 16).ok()?;
    }
    Some(out)
}
