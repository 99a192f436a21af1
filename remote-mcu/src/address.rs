//! Peer identity addresses

use std::fmt;

/// Link-layer address type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AddressKind {
    Public,
    Random,
    PublicIdentity,
    RandomIdentity,
}

impl AddressKind {
    pub fn from_u8(v: u8) -> Option<Self> {
        match v {
            0x00 => Some(AddressKind::Public),
            0x01 => Some(AddressKind::Random),
            0x02 => Some(AddressKind::PublicIdentity),
            0x03 => Some(AddressKind::RandomIdentity),
            _ => None,
        }
    }

    pub fn as_u8(&self) -> u8 {
        match self {
            AddressKind::Public => 0x00,
            AddressKind::Random => 0x01,
            AddressKind::PublicIdentity => 0x02,
            AddressKind::RandomIdentity => 0x03,
        }
    }

    fn label(&self) -> &'static str {
        match self {
            AddressKind::Public => "public",
            AddressKind::Random => "random",
            AddressKind::PublicIdentity => "public-id",
            AddressKind::RandomIdentity => "random-id",
        }
    }
}

/// LE peer address; `bytes` are little-endian as carried over the air
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PeerAddress {
    pub kind: AddressKind,
    pub bytes: [u8; 6],
}

impl PeerAddress {
    pub fn new(kind: AddressKind, bytes: [u8; 6]) -> Self {
        Self { kind, bytes }
    }

    /// Build from the most-significant-first order addresses are printed in
    pub fn from_be_bytes(kind: AddressKind, be: [u8; 6]) -> Self {
        let mut bytes = be;
        bytes.reverse();
        Self { kind, bytes }
    }
}

impl fmt::Display for PeerAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let b = &self.bytes;
        write!(
            f,
            "{:02X}:{:02X}:{:02X}:{:02X}:{:02X}:{:02X} ({})",
            b[5],
            b[4],
            b[3],
            b[2],
            b[1],
            b[0],
            self.kind.label()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_prints_most_significant_first() {
        let addr = PeerAddress::new(AddressKind::Random, [0x01, 0x02, 0x03, 0x04, 0x05, 0xc6]);
        assert_eq!(addr.to_string(), "C6:05:04:03:02:01 (random)");
    }

    #[test]
    fn be_bytes_reverse() {
        let addr = PeerAddress::from_be_bytes(AddressKind::Public, [0xaa, 0xbb, 0xcc, 0xdd, 0xee, 0xff]);
        assert_eq!(addr.bytes, [0xff, 0xee, 0xdd, 0xcc, 0xbb, 0xaa]);
        assert_eq!(addr.to_string(), "AA:BB:CC:DD:EE:FF (public)");
    }

    #[test]
    fn kind_codes() {
        for v in 0..4u8 {
            assert_eq!(AddressKind::from_u8(v).map(|k| k.as_u8()), Some(v));
        }
        assert_eq!(AddressKind::from_u8(4), None);
    }
}
