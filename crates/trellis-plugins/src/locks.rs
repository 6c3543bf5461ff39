//! Serialises lifecycle operations per plugin directory.
//!
//! Two operations on the same directory name (a delete racing an update, or
//! two installs deriving the same name) must not interleave. Operations on
//! different names never wait for each other.

use std::collections::HashSet;
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};

use tracing::debug;

/// Table of directory names with an operation in flight.
#[derive(Debug, Default)]
pub struct DirectoryLocks {
    busy: Mutex<HashSet<String>>,
    released: Condvar,
}

impl DirectoryLocks {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Blocks until no other lease holds `name`, then claims it.
    ///
    /// The claim is released when the returned lease is dropped.
    pub fn acquire(&self, name: &str) -> DirectoryLease<'_> {
        let mut busy = self.table();
        while busy.contains(name) {
            debug!(plugin = name, "waiting for in-flight operation");
            busy = self
                .released
                .wait(busy)
                .unwrap_or_else(PoisonError::into_inner);
        }
        busy.insert(name.to_owned());
        DirectoryLease {
            locks: self,
            name: name.to_owned(),
        }
    }

    /// Returns `true` while a lease for `name` is outstanding.
    #[must_use]
    pub fn is_held(&self, name: &str) -> bool {
        self.table().contains(name)
    }

    fn table(&self) -> MutexGuard<'_, HashSet<String>> {
        // The set stays consistent even if a holder panicked mid-operation.
        self.busy.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Exclusive claim on one directory name.
#[derive(Debug)]
pub struct DirectoryLease<'a> {
    locks: &'a DirectoryLocks,
    name: String,
}

impl DirectoryLease<'_> {
    /// Name this lease holds.
    #[must_use]
    pub fn name(&self) -> &str {
        self.name.as_str()
    }
}

impl Drop for DirectoryLease<'_> {
    fn drop(&mut self) {
        self.locks.table().remove(&self.name);
        self.locks.released.notify_all();
    }
}
