//! Column metadata recorded per executed result-set statement.
//!
//! The connection sees column metadata with every `query/tuples` response,
//! but a [`ResultPlugin`](crate::ResultPlugin) only receives the shaped rows.
//! The store bridges the two: the connection writes the columns under the
//! statement's compiled SQL text and the plugin reads them back.
//!
//! Known limitations:
//! - Entries are keyed by SQL text, so distinct statements that compile to
//!   the same text share one entry (last write wins).
//! - Entries are never evicted. A workload with unbounded distinct SQL text
//!   grows the store without bound until [`ColumnMetadataStore::reset`].
//! - Concurrent executions of the same SQL text race on the entry; the
//!   store does not order them.

use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
};

use parking_lot::RwLock;

use crate::ColumnMetadata;

#[derive(Debug, Default)]
struct Inner {
    enabled: AtomicBool,
    entries: RwLock<HashMap<String, Arc<[ColumnMetadata]>>>,
}

/// Shared handle; clones observe the same entries.
#[derive(Clone, Debug, Default)]
pub struct ColumnMetadataStore {
    inner: Arc<Inner>,
}

impl ColumnMetadataStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts recording metadata on [`write`](Self::write).
    pub fn enable(&self) {
        self.inner.enabled.store(true, Ordering::Release);
    }

    pub fn is_enabled(&self) -> bool {
        self.inner.enabled.load(Ordering::Acquire)
    }

    /// Records `columns` for `sql`, replacing any earlier entry. A no-op
    /// while the store is disabled.
    pub fn write(&self, sql: &str, columns: &[ColumnMetadata]) {
        if !self.is_enabled() {
            return;
        }

        #[cfg(feature = "tracing")]
        tracing::trace!(sql, columns = columns.len(), "recording column metadata");

        self.inner
            .entries
            .write()
            .insert(sql.to_owned(), Arc::from(columns));
    }

    /// Returns the last metadata recorded for exactly `sql`.
    pub fn read(&self, sql: &str) -> Option<Arc<[ColumnMetadata]>> {
        self.inner.entries.read().get(sql).cloned()
    }

    pub fn len(&self) -> usize {
        self.inner.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drops every entry. Safe to call repeatedly.
    ///
    /// Recording stays on once enabled, so drivers created after a reset
    /// keep feeding an attached plugin.
    pub fn reset(&self) {
        #[cfg(feature = "tracing")]
        tracing::trace!("resetting column metadata store");

        self.inner.entries.write().clear();
    }
}
