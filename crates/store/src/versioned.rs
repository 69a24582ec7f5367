//! Version-stamped in-memory maps.
//!
//! Every record carries a version. A write names the version it read; the
//! map accepts it only if nothing was written in between, then bumps the
//! version. Readers get clones and never hold a lock across calls.

use std::fmt::Display;
use std::hash::Hash;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

use crate::error::StoreError;
use furlough_core::balance::{BalanceKey, EmployeeLeaveBalance};
use furlough_core::request::LeaveRequest;
use furlough_shared::types::LeaveRequestId;

/// A record stored under optimistic concurrency.
pub trait Versioned: Clone + Send + Sync {
    /// Key type.
    type Key: Copy + Eq + Hash + Display + Send + Sync;

    /// Record key.
    fn key(&self) -> Self::Key;

    /// Stored version.
    fn version(&self) -> u64;

    /// Stamps a new version.
    fn set_version(&mut self, version: u64);
}

impl Versioned for EmployeeLeaveBalance {
    type Key = BalanceKey;

    fn key(&self) -> BalanceKey {
        self.key
    }

    fn version(&self) -> u64 {
        self.version
    }

    fn set_version(&mut self, version: u64) {
        self.version = version;
    }
}

impl Versioned for LeaveRequest {
    type Key = LeaveRequestId;

    fn key(&self) -> LeaveRequestId {
        self.id
    }

    fn version(&self) -> u64 {
        self.version
    }

    fn set_version(&mut self, version: u64) {
        self.version = version;
    }
}

/// Concurrent map with compare-and-swap writes.
#[derive(Debug)]
pub struct VersionedMap<T: Versioned> {
    entries: DashMap<T::Key, T>,
}

impl<T: Versioned> Default for VersionedMap<T> {
    fn default() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }
}

impl<T: Versioned> VersionedMap<T> {
    /// Creates an empty map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of the record.
    pub fn get(&self, key: &T::Key) -> Option<T> {
        self.entries.get(key).map(|r| r.value().clone())
    }

    /// Stores a new record at version 1.
    pub fn insert_new(&self, mut value: T) -> Result<T, StoreError> {
        match self.entries.entry(value.key()) {
            Entry::Occupied(o) => Err(StoreError::AlreadyExists(o.key().to_string())),
            Entry::Vacant(v) => {
                value.set_version(1);
                v.insert(value.clone());
                Ok(value)
            }
        }
    }

    /// Returns the stored record, inserting `init()` at version 1 if absent.
    pub fn get_or_insert_with(&self, key: T::Key, init: impl FnOnce() -> T) -> T {
        self.entries
            .entry(key)
            .or_insert_with(|| {
                let mut value = init();
                value.set_version(1);
                value
            })
            .value()
            .clone()
    }

    /// Replaces the record if its stored version still equals `value.version()`.
    ///
    /// Returns the stored record with its new version.
    pub fn compare_and_swap(&self, mut value: T) -> Result<T, StoreError> {
        let key = value.key();
        let mut slot = self
            .entries
            .get_mut(&key)
            .ok_or_else(|| StoreError::NotFound(key.to_string()))?;
        let actual = slot.version();
        if actual != value.version() {
            return Err(StoreError::VersionConflict {
                key: key.to_string(),
                expected: value.version(),
                actual,
            });
        }
        value.set_version(actual + 1);
        *slot = value.clone();
        Ok(value)
    }

    /// Copies of every record matching `predicate`.
    pub fn filter(&self, predicate: impl Fn(&T) -> bool) -> Vec<T> {
        self.entries
            .iter()
            .filter(|r| predicate(r.value()))
            .map(|r| r.value().clone())
            .collect()
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
