//! Bond inventory and allow list population
//!
//! Enumeration, the advertising decision and the allow list side effect are
//! separate steps so each can be exercised on its own:
//!
//! 1. [`BondInventory::scan`] reads the bonded peers from the stack.
//! 2. [`crate::advertising::select_mode`] decides from `inventory.len()`.
//! 3. [`populate_allow_list`] appends every bonded peer to the allow list.

use crate::address::PeerAddress;
use log::*;

/// Trait for the stack's persistent bond store
///
/// MCU-specific crates implement this trait on top of their security manager
/// storage (NVS for NimBLE on ESP32, flash settings elsewhere).
pub trait BondStore {
    /// Error type for bond store operations
    type Error: std::fmt::Debug;

    /// Identities of every bonded peer, in no particular order
    fn bonded_peers(&self) -> Result<Vec<PeerAddress>, Self::Error>;

    /// Remove one peer's bond
    fn delete_bond(&mut self, peer: &PeerAddress) -> Result<(), Self::Error>;

    /// Remove every bond
    fn delete_all_bonds(&mut self) -> Result<(), Self::Error>;
}

/// Trait for the controller's accept (allow) list
pub trait AllowList {
    /// Error type for allow list operations
    type Error: std::fmt::Debug;

    /// Append a peer; entries are never removed by the application
    fn add(&mut self, peer: &PeerAddress) -> Result<(), Self::Error>;
}

/// Bonded peers enumerated in one pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BondInventory {
    peers: Vec<PeerAddress>,
}

impl BondInventory {
    /// Enumerate the bond store; each pass starts from an empty count
    pub fn scan<S: BondStore + ?Sized>(store: &S) -> Result<Self, S::Error> {
        let peers = store.bonded_peers()?;
        for peer in &peers {
            info!("Device in bond list: {}", peer);
        }
        Ok(Self { peers })
    }

    pub fn from_peers(peers: Vec<PeerAddress>) -> Self {
        Self { peers }
    }

    pub fn len(&self) -> usize {
        self.peers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.peers.is_empty()
    }

    pub fn peers(&self) -> &[PeerAddress] {
        &self.peers
    }

    pub fn contains(&self, peer: &PeerAddress) -> bool {
        self.peers.contains(peer)
    }
}

/// Proof that a full population pass over the allow list has completed.
///
/// Only [`populate_allow_list`] constructs it, and filtered advertising cannot
/// be started without one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PopulatedAllowList {
    added: usize,
    failed: Vec<PeerAddress>,
}

impl PopulatedAllowList {
    /// Entries the allow list accepted
    pub fn added(&self) -> usize {
        self.added
    }

    /// Entries the allow list refused
    pub fn failed(&self) -> &[PeerAddress] {
        &self.failed
    }
}

/// Append every bonded peer to the allow list.
///
/// A failed entry is logged and skipped; the pass always visits every peer.
pub fn populate_allow_list<A: AllowList + ?Sized>(
    inventory: &BondInventory,
    allow_list: &mut A,
) -> PopulatedAllowList {
    let mut added = 0;
    let mut failed = Vec::new();

    for peer in inventory.peers() {
        match allow_list.add(peer) {
            Ok(()) => {
                info!("allow list add: {}", peer);
                added += 1;
            }
            Err(e) => {
                error!("allow list add: {} FAILED ({:?})", peer, e);
                failed.push(*peer);
            }
        }
    }

    PopulatedAllowList { added, failed }
}
