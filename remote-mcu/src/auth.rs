//! Authorization of bond management operations

use log::*;
use subtle::ConstantTimeEq;

/// Length of the bond management authorization code
pub const AUTH_CODE_LEN: usize = 4;

/// Code a central must present to delete bonds belonging to other peers
pub const DEFAULT_AUTH_CODE: [u8; AUTH_CODE_LEN] = *b"ABCD";

/// Shared-secret authorizer for privileged bond management operations
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct AuthorizationCode([u8; AUTH_CODE_LEN]);

impl AuthorizationCode {
    pub const fn new(code: [u8; AUTH_CODE_LEN]) -> Self {
        Self(code)
    }

    pub fn as_bytes(&self) -> &[u8; AUTH_CODE_LEN] {
        &self.0
    }

    /// True iff `candidate` has the stored length and matches byte for byte.
    pub fn matches(&self, candidate: &[u8]) -> bool {
        // ct_eq on slices is false for a length mismatch
        bool::from(self.0.as_slice().ct_eq(candidate))
    }

    /// [`matches`](Self::matches) plus the outcome log line
    pub fn authorize(&self, candidate: &[u8]) -> bool {
        if self.matches(candidate) {
            info!("Authorization of BMS operation is successful");
            true
        } else {
            warn!("Authorization of BMS operation has failed ({} byte code)", candidate.len());
            false
        }
    }
}

impl Default for AuthorizationCode {
    fn default() -> Self {
        Self(DEFAULT_AUTH_CODE)
    }
}

// Never print the secret
impl std::fmt::Debug for AuthorizationCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("AuthorizationCode(****)")
    }
}
