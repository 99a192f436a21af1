//! Bond Management Service control point handling
//!
//! Wire format and feature bits are in remote_proto::bms. This module decides
//! whether a control point write may proceed and applies it to the bond store.

use log::*;
use remote_proto::bms::{ControlPointRequest, Features, Operation, att};

use crate::ble::Connection;
use crate::bonds::BondStore;
use crate::callbacks::BondManagementAuthorizer;

/// Control point write outcome reported to the central as an ATT error
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum BmsError {
    #[error("opcode not supported")]
    OpcodeNotSupported,
    #[error("insufficient authorization")]
    InsufficientAuthorization,
    #[error("operation failed")]
    OperationFailed,
}

impl BmsError {
    pub fn att_code(&self) -> u8 {
        match self {
            BmsError::OpcodeNotSupported => att::OPCODE_NOT_SUPPORTED,
            BmsError::InsufficientAuthorization => att::INSUFFICIENT_AUTHORIZATION,
            BmsError::OperationFailed => att::OPERATION_FAILED,
        }
    }
}

/// Handle a write to the Bond Management Control Point from `conn`.
///
/// Operations the feature set marks as needing authorization go through
/// `authorizer`; the others run without a code check.
pub fn handle_control_point<A, S>(
    features: &Features,
    conn: &Connection,
    data: &[u8],
    authorizer: &mut A,
    store: &mut S,
) -> Result<Operation, BmsError>
where
    A: BondManagementAuthorizer + ?Sized,
    S: BondStore + ?Sized,
{
    let request = ControlPointRequest::from_bytes(data).map_err(|e| {
        warn!("BMS: malformed control point write: {}", e);
        BmsError::OpcodeNotSupported
    })?;

    let op = match request.operation() {
        Some(op) if features.support(op).supported => op,
        _ => {
            warn!("BMS: unsupported opcode 0x{:02x}", request.opcode);
            return Err(BmsError::OpcodeNotSupported);
        }
    };

    if features.support(op).authorize && !authorizer.authorize(conn, &request.auth_code) {
        return Err(BmsError::InsufficientAuthorization);
    }

    info!("BMS: {} requested by {}", op, conn.peer);
    apply(op, conn, store)?;
    Ok(op)
}

fn apply<S: BondStore + ?Sized>(op: Operation, conn: &Connection, store: &mut S) -> Result<(), BmsError> {
    let failed = |e: S::Error| {
        error!("BMS: {} failed: {:?}", op, e);
        BmsError::OperationFailed
    };

    match op {
        Operation::DeleteRequesting => store.delete_bond(&conn.peer).map_err(failed),
        Operation::DeleteAll => store.delete_all_bonds().map_err(failed),
        Operation::DeleteRest => {
            let peers = store.bonded_peers().map_err(failed)?;
            for peer in peers.iter().filter(|p| **p != conn.peer) {
                store.delete_bond(peer).map_err(failed)?;
                info!("BMS: deleted bond {}", peer);
            }
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::default_bms_features;
    use crate::fake::{FakeStack, conn, peer};
    use remote_proto::bms::{OperationSupport, opcodes};

    struct CodeCheck {
        code: &'static [u8],
        calls: usize,
    }

    impl BondManagementAuthorizer for CodeCheck {
        fn authorize(&mut self, _conn: &Connection, code: &[u8]) -> bool {
            self.calls += 1;
            code == self.code
        }
    }

    fn bonded(n: u8) -> FakeStack {
        FakeStack { bonds: (1..=n).map(peer).collect(), ..Default::default() }
    }

    #[test]
    fn delete_all_with_code() {
        let mut stack = bonded(3);
        let mut auth = CodeCheck { code: b"ABCD", calls: 0 };
        let op = handle_control_point(
            &default_bms_features(),
            &conn(1),
            &[opcodes::DELETE_ALL_LE, b'A', b'B', b'C', b'D'],
            &mut auth,
            &mut stack,
        );
        assert_eq!(op, Ok(Operation::DeleteAll));
        assert_eq!(auth.calls, 1);
        assert!(stack.bonds.is_empty());
    }

    #[test]
    fn delete_all_with_wrong_code_is_refused() {
        let mut stack = bonded(3);
        let mut auth = CodeCheck { code: b"ABCD", calls: 0 };
        let result = handle_control_point(
            &default_bms_features(),
            &conn(1),
            &[opcodes::DELETE_ALL_LE, b'A', b'B', b'C'],
            &mut auth,
            &mut stack,
        );
        assert_eq!(result, Err(BmsError::InsufficientAuthorization));
        assert_eq!(result.unwrap_err().att_code(), 0x08);
        assert_eq!(stack.bonds.len(), 3);
    }

    #[test]
    fn delete_rest_keeps_requester() {
        let mut stack = bonded(3);
        let mut auth = CodeCheck { code: b"ABCD", calls: 0 };
        let op = handle_control_point(
            &default_bms_features(),
            &conn(2),
            &[opcodes::DELETE_REST_LE, b'A', b'B', b'C', b'D'],
            &mut auth,
            &mut stack,
        );
        assert_eq!(op, Ok(Operation::DeleteRest));
        assert_eq!(stack.bonds, vec![peer(2)]);
    }

    #[test]
    fn delete_requesting_needs_no_code() {
        let mut stack = bonded(2);
        let mut auth = CodeCheck { code: b"ABCD", calls: 0 };
        let op = handle_control_point(
            &default_bms_features(),
            &conn(1),
            &[opcodes::DELETE_REQUESTING_LE],
            &mut auth,
            &mut stack,
        );
        assert_eq!(op, Ok(Operation::DeleteRequesting));
        assert_eq!(auth.calls, 0);
        assert_eq!(stack.bonds, vec![peer(2)]);
    }

    #[test]
    fn unknown_and_unsupported_opcodes() {
        let mut stack = bonded(1);
        let mut auth = CodeCheck { code: b"ABCD", calls: 0 };
        let features = default_bms_features();

        let result = handle_control_point(&features, &conn(1), &[0x01], &mut auth, &mut stack);
        assert_eq!(result, Err(BmsError::OpcodeNotSupported));
        assert_eq!(result.unwrap_err().att_code(), 0x80);

        let result = handle_control_point(&features, &conn(1), &[], &mut auth, &mut stack);
        assert_eq!(result, Err(BmsError::OpcodeNotSupported));

        let limited = Features { delete_all: OperationSupport::default(), ..features };
        let result = handle_control_point(
            &limited,
            &conn(1),
            &[opcodes::DELETE_ALL_LE, b'A', b'B', b'C', b'D'],
            &mut auth,
            &mut stack,
        );
        assert_eq!(result, Err(BmsError::OpcodeNotSupported));
        assert_eq!(auth.calls, 0);
        assert_eq!(stack.bonds.len(), 1);
    }

    #[test]
    fn store_failure_is_operation_failed() {
        let mut stack = FakeStack { fail_delete: true, ..bonded(2) };
        let mut auth = CodeCheck { code: b"ABCD", calls: 0 };
        let result = handle_control_point(
            &default_bms_features(),
            &conn(1),
            &[opcodes::DELETE_REQUESTING_LE],
            &mut auth,
            &mut stack,
        );
        assert_eq!(result, Err(BmsError::OperationFailed));
        assert_eq!(result.unwrap_err().att_code(), 0x81);
    }
}
