//! Run-scoped record of which configuration files have been consumed, and by whom.
//!
//! Keys are canonical paths, so a file reached through a symlink or through two
//! vendor aliases maps to one entry. The ledger is created at the start of a scan
//! and dropped with it.

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Adapter family that may own a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AdapterKind {
    ServerMap,
    Generic,
    Cursor,
    Continue,
    Extension,
}

/// Proof that the holder owns a ledger entry.
#[derive(Debug, PartialEq, Eq)]
#[must_use]
pub struct Claim {
    key: String,
    owner: AdapterKind,
}

impl Claim {
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn owner(&self) -> AdapterKind {
        self.owner
    }
}

#[derive(Debug, Default)]
pub struct DedupLedger {
    owners: Mutex<HashMap<String, AdapterKind>>,
}

impl DedupLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolved, symlink-free form of `path`, or the literal path when resolution fails.
    pub fn canonical_key(path: &Path) -> String {
        std::fs::canonicalize(path)
            .unwrap_or_else(|_| path.to_path_buf())
            .to_string_lossy()
            .into_owned()
    }

    /// Atomically insert `path`. Returns `None` when another adapter already holds it.
    pub fn claim(&self, path: &Path, owner: AdapterKind) -> Option<Claim> {
        let key = Self::canonical_key(path);
        let mut owners = self.lock();
        if owners.contains_key(&key) {
            return None;
        }
        owners.insert(key.clone(), owner);
        Some(Claim { key, owner })
    }

    /// Evict and re-insert under one lock, transferring ownership to `to`.
    pub fn hand_off(&self, claim: Claim, to: AdapterKind) -> Claim {
        let mut owners = self.lock();
        owners.remove(&claim.key);
        owners.insert(claim.key.clone(), to);
        Claim {
            key: claim.key,
            owner: to,
        }
    }

    pub fn files_claimed(&self) -> usize {
        self.lock().len()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, AdapterKind>> {
        // Entries are inserted whole, so a poisoned map is still consistent.
        self.owners.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
