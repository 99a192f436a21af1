//! Bond Management Service (BMS) framing
//!
//! Only the LE variants of the BMS operations are used: this is an LE only
//! peripheral.

use std::io;

/// Bond Management Service UUID (16-bit)
pub const SERVICE_UUID16: u16 = 0x181e;

/// Bond Management Control Point Characteristic UUID (write)
pub const CONTROL_POINT_UUID16: u16 = 0x2aa4;

/// Bond Management Feature Characteristic UUID (read)
pub const FEATURE_UUID16: u16 = 0x2aa5;

/// Control point opcodes
pub mod opcodes {
    /// Delete bond of requesting device (LE transport only)
    pub const DELETE_REQUESTING_LE: u8 = 0x03;

    /// Delete all bonds on server (LE transport only)
    pub const DELETE_ALL_LE: u8 = 0x06;

    /// Delete all but the active bond on server (LE transport only)
    pub const DELETE_REST_LE: u8 = 0x09;
}

/// ATT error codes returned from a control point write
pub mod att {
    /// Insufficient Authorization
    pub const INSUFFICIENT_AUTHORIZATION: u8 = 0x08;

    /// BMS: opcode not supported
    pub const OPCODE_NOT_SUPPORTED: u8 = 0x80;

    /// BMS: operation failed
    pub const OPERATION_FAILED: u8 = 0x81;
}

/// Feature characteristic bits
pub mod feature_bits {
    pub const DELETE_REQUESTING_LE: u32 = 1 << 4;
    pub const DELETE_REQUESTING_LE_AUTH: u32 = 1 << 5;
    pub const DELETE_ALL_LE: u32 = 1 << 10;
    pub const DELETE_ALL_LE_AUTH: u32 = 1 << 11;
    pub const DELETE_REST_LE: u32 = 1 << 16;
    pub const DELETE_REST_LE_AUTH: u32 = 1 << 17;
}

/// Maximum authorization code length carried by a control point write
pub const MAX_AUTH_CODE_LEN: usize = 511;

/// A bond management operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    /// Delete the requesting peer's own bond
    DeleteRequesting,
    /// Delete every bond, the requester's included
    DeleteAll,
    /// Delete every bond except the requester's
    DeleteRest,
}

impl Operation {
    pub fn from_opcode(opcode: u8) -> Option<Self> {
        match opcode {
            opcodes::DELETE_REQUESTING_LE => Some(Operation::DeleteRequesting),
            opcodes::DELETE_ALL_LE => Some(Operation::DeleteAll),
            opcodes::DELETE_REST_LE => Some(Operation::DeleteRest),
            _ => None,
        }
    }

    pub fn opcode(&self) -> u8 {
        match self {
            Operation::DeleteRequesting => opcodes::DELETE_REQUESTING_LE,
            Operation::DeleteAll => opcodes::DELETE_ALL_LE,
            Operation::DeleteRest => opcodes::DELETE_REST_LE,
        }
    }

    /// Whether the operation removes bonds of peers other than the requester
    pub fn affects_other_peers(&self) -> bool {
        !matches!(self, Operation::DeleteRequesting)
    }

    fn feature_bits(&self) -> (u32, u32) {
        match self {
            Operation::DeleteRequesting => (
                feature_bits::DELETE_REQUESTING_LE,
                feature_bits::DELETE_REQUESTING_LE_AUTH,
            ),
            Operation::DeleteAll => (feature_bits::DELETE_ALL_LE, feature_bits::DELETE_ALL_LE_AUTH),
            Operation::DeleteRest => (feature_bits::DELETE_REST_LE, feature_bits::DELETE_REST_LE_AUTH),
        }
    }
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Operation::DeleteRequesting => "delete-requesting",
            Operation::DeleteAll => "delete-all",
            Operation::DeleteRest => "delete-rest",
        };
        f.write_str(name)
    }
}

/// Support level for a single operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct OperationSupport {
    pub supported: bool,
    pub authorize: bool,
}

impl OperationSupport {
    pub const fn open() -> Self {
        Self { supported: true, authorize: false }
    }

    pub const fn with_authorization() -> Self {
        Self { supported: true, authorize: true }
    }
}

/// Operations a server supports, and which of them need an authorization code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Features {
    pub delete_requesting: OperationSupport,
    pub delete_all: OperationSupport,
    pub delete_rest: OperationSupport,
}

impl Features {
    pub fn support(&self, op: Operation) -> OperationSupport {
        match op {
            Operation::DeleteRequesting => self.delete_requesting,
            Operation::DeleteAll => self.delete_all,
            Operation::DeleteRest => self.delete_rest,
        }
    }

    /// Feature bit mask; an operation that needs authorization sets only its
    /// "with authorization code" bit.
    pub fn mask(&self) -> u32 {
        let mut mask = 0;
        for op in [Operation::DeleteRequesting, Operation::DeleteAll, Operation::DeleteRest] {
            let support = self.support(op);
            if !support.supported {
                continue;
            }
            let (plain, auth) = op.feature_bits();
            mask |= if support.authorize { auth } else { plain };
        }
        mask
    }

    /// Feature characteristic value: 24-bit little-endian mask
    pub fn to_bytes(&self) -> [u8; 3] {
        let b = self.mask().to_le_bytes();
        [b[0], b[1], b[2]]
    }

    pub fn from_bytes(data: &[u8]) -> io::Result<Self> {
        if data.is_empty() {
            return Err(io::Error::new(io::ErrorKind::InvalidData, "BMS feature empty"));
        }
        let mut raw = [0u8; 4];
        let n = data.len().min(3);
        raw[..n].copy_from_slice(&data[..n]);
        let mask = u32::from_le_bytes(raw);

        let decode = |op: Operation| {
            let (plain, auth) = op.feature_bits();
            OperationSupport {
                supported: mask & (plain | auth) != 0,
                authorize: mask & auth != 0,
            }
        };

        Ok(Self {
            delete_requesting: decode(Operation::DeleteRequesting),
            delete_all: decode(Operation::DeleteAll),
            delete_rest: decode(Operation::DeleteRest),
        })
    }
}

/// Bond Management Control Point write: opcode followed by an optional
/// authorization code
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControlPointRequest {
    pub opcode: u8,
    pub auth_code: Vec<u8>,
}

impl ControlPointRequest {
    pub fn new(op: Operation, auth_code: &[u8]) -> Self {
        Self { opcode: op.opcode(), auth_code: auth_code.to_vec() }
    }

    pub fn operation(&self) -> Option<Operation> {
        Operation::from_opcode(self.opcode)
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(1 + self.auth_code.len());
        buf.push(self.opcode);
        buf.extend_from_slice(&self.auth_code);
        buf
    }

    pub fn from_bytes(data: &[u8]) -> io::Result<Self> {
        let (&opcode, code) = data
            .split_first()
            .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidData, "control point write empty"))?;
        if code.len() > MAX_AUTH_CODE_LEN {
            return Err(io::Error::new(io::ErrorKind::InvalidData, "authorization code too long"));
        }
        Ok(Self { opcode, auth_code: code.to_vec() })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn default_features() -> Features {
        Features {
            delete_requesting: OperationSupport::open(),
            delete_all: OperationSupport::with_authorization(),
            delete_rest: OperationSupport::with_authorization(),
        }
    }

    #[test]
    fn feature_mask_sets_auth_bits_only_when_authorized() {
        let features = default_features();
        assert_eq!(
            features.mask(),
            feature_bits::DELETE_REQUESTING_LE
                | feature_bits::DELETE_ALL_LE_AUTH
                | feature_bits::DELETE_REST_LE_AUTH
        );
        assert_eq!(features.to_bytes(), [0x10, 0x08, 0x02]);
    }

    #[test]
    fn feature_bytes_decode() {
        let decoded = Features::from_bytes(&[0x10, 0x08, 0x02]).unwrap();
        assert_eq!(decoded, default_features());
        assert!(Features::from_bytes(&[]).is_err());
    }

    #[test]
    fn unsupported_operations_leave_mask_empty() {
        assert_eq!(Features::default().mask(), 0);
    }

    #[test]
    fn control_point_parse() {
        let req = ControlPointRequest::from_bytes(&[0x06, b'A', b'B', b'C', b'D']).unwrap();
        assert_eq!(req.operation(), Some(Operation::DeleteAll));
        assert_eq!(req.auth_code, b"ABCD");

        let req = ControlPointRequest::from_bytes(&[0x03]).unwrap();
        assert_eq!(req.operation(), Some(Operation::DeleteRequesting));
        assert!(req.auth_code.is_empty());

        let req = ControlPointRequest::from_bytes(&[0x01]).unwrap();
        assert_eq!(req.operation(), None);

        assert!(ControlPointRequest::from_bytes(&[]).is_err());
    }

    #[test]
    fn control_point_encode() {
        let req = ControlPointRequest::new(Operation::DeleteRest, b"ABCD");
        assert_eq!(req.to_bytes(), vec![0x09, 0x41, 0x42, 0x43, 0x44]);
    }

    #[test]
    fn only_requesting_leaves_other_peers_alone() {
        assert!(!Operation::DeleteRequesting.affects_other_peers());
        assert!(Operation::DeleteAll.affects_other_peers());
        assert!(Operation::DeleteRest.affects_other_peers());
    }
}
