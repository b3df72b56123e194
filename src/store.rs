//! Datastore abstraction.
//!
//! This module provides a trait-based abstraction over the underlying
//! key-value/document store, allowing different backends while keeping a
//! consistent API. The store only needs equality and ordered range filters on
//! indexed scalar properties, cursor pagination, and transactions; everything
//! geometric happens above it.
//!
//! # Implementations
//!
//! - [`MemoryStore`]: in-memory backend used by the tests and as a template
//!   for real adapters.

use crate::curve::CurvePosition;
use crate::error::{GeodexError, Result};
use crate::types::{RecordKey, StoredRecord};
use async_trait::async_trait;
use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use std::collections::BTreeMap;
use std::sync::Arc;

/// A single-partition range scan.
///
/// Matches records where `hash_key` is equal and the curve position lies
/// strictly between `min` and `max` (both bounds exclusive). Positions are
/// carried as native 64-bit integers so backends can compare them at full
/// precision; a backend whose index orders the `geohash` field as a string
/// must zero-pad the stored form, because plain lexicographic order only
/// matches numeric order for equal-length strings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RangeQuery {
    pub namespace: String,
    pub table: String,
    pub hash_key: i64,
    pub min: CurvePosition,
    pub max: CurvePosition,
}

/// One page of scan results plus the continuation cursor, if more pages exist.
#[derive(Debug, Clone, Default)]
pub struct QueryPage {
    pub records: Vec<StoredRecord>,
    pub next_cursor: Option<String>,
}

/// Trait for datastore backends.
///
/// All methods are failable; errors are propagated to the caller verbatim and
/// never retried by this crate.
#[async_trait]
pub trait Datastore: Send + Sync {
    /// Persist a new record under a store-allocated id.
    ///
    /// Backends with secondary indexes must index `geohash` (ordered) and
    /// `hash_key` (equality) and exclude `geo_point` from indexing; it exists
    /// only for the exact filter and for returning full-fidelity coordinates.
    async fn save(&self, namespace: &str, table: &str, record: StoredRecord) -> Result<RecordKey>;

    /// Remove a record by identity.
    async fn delete(&self, key: &RecordKey) -> Result<()>;

    /// Run one page of a range scan. Pass the cursor from the previous page
    /// to continue; `None` starts from the beginning.
    async fn run_query(&self, query: &RangeQuery, cursor: Option<&str>) -> Result<QueryPage>;

    /// Begin a transaction.
    async fn begin(&self) -> Result<Box<dyn StoreTransaction>>;
}

/// A store transaction: read, buffered write, then commit or rollback.
///
/// A transaction that has committed or rolled back refuses further use.
#[async_trait]
pub trait StoreTransaction: Send {
    /// Transactional read of a record.
    async fn get(&mut self, key: &RecordKey) -> Result<Option<StoredRecord>>;

    /// Stage a write; it becomes visible on commit.
    async fn save(&mut self, key: &RecordKey, record: StoredRecord) -> Result<()>;

    /// Apply all staged writes.
    async fn commit(&mut self) -> Result<()>;

    /// Discard all staged writes.
    async fn rollback(&mut self) -> Result<()>;
}

const DEFAULT_PAGE_SIZE: usize = 100;

/// In-memory datastore backend.
///
/// Rows live in per-table B-trees keyed by id; scans are answered by
/// filtering on the parsed curve position and paginating deterministically in
/// `(geohash, id)` order. Clones share the same underlying data.
#[derive(Clone)]
pub struct MemoryStore {
    inner: Arc<RwLock<MemoryInner>>,
    page_size: usize,
}

struct MemoryInner {
    tables: FxHashMap<(String, String), MemoryTable>,
}

#[derive(Default)]
struct MemoryTable {
    rows: BTreeMap<i64, StoredRecord>,
    next_id: i64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::with_page_size(DEFAULT_PAGE_SIZE)
    }

    /// Create a store that returns at most `page_size` records per page.
    /// Small sizes are useful for exercising cursor chains in tests.
    pub fn with_page_size(page_size: usize) -> Self {
        assert!(page_size > 0, "Page size must be greater than zero");
        Self {
            inner: Arc::new(RwLock::new(MemoryInner {
                tables: FxHashMap::default(),
            })),
            page_size,
        }
    }

    /// Read a record outside any transaction.
    pub fn get(&self, key: &RecordKey) -> Option<StoredRecord> {
        let inner = self.inner.read();
        inner
            .tables
            .get(&(key.namespace.clone(), key.table.clone()))
            .and_then(|table| table.rows.get(&key.id).cloned())
    }

    /// Number of records in a table.
    pub fn len(&self, namespace: &str, table: &str) -> usize {
        let inner = self.inner.read();
        inner
            .tables
            .get(&(namespace.to_string(), table.to_string()))
            .map(|table| table.rows.len())
            .unwrap_or(0)
    }

    pub fn is_empty(&self, namespace: &str, table: &str) -> bool {
        self.len(namespace, table) == 0
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Datastore for MemoryStore {
    async fn save(&self, namespace: &str, table: &str, record: StoredRecord) -> Result<RecordKey> {
        let mut inner = self.inner.write();
        let table_entry = inner
            .tables
            .entry((namespace.to_string(), table.to_string()))
            .or_default();
        table_entry.next_id += 1;
        let id = table_entry.next_id;
        table_entry.rows.insert(id, record);
        Ok(RecordKey::new(namespace, table, id))
    }

    async fn delete(&self, key: &RecordKey) -> Result<()> {
        let mut inner = self.inner.write();
        if let Some(table) = inner
            .tables
            .get_mut(&(key.namespace.clone(), key.table.clone()))
        {
            table.rows.remove(&key.id);
        }
        Ok(())
    }

    async fn run_query(&self, query: &RangeQuery, cursor: Option<&str>) -> Result<QueryPage> {
        let offset = match cursor {
            Some(token) => token
                .parse::<usize>()
                .map_err(|_| GeodexError::InvalidInput(format!("bad cursor: {token}")))?,
            None => 0,
        };

        let inner = self.inner.read();
        let mut matches: Vec<(i64, i64, &StoredRecord)> = inner
            .tables
            .get(&(query.namespace.clone(), query.table.clone()))
            .map(|table| {
                table
                    .rows
                    .iter()
                    .filter(|(_, record)| record.hash_key == query.hash_key)
                    .filter_map(|(id, record)| {
                        let position = record.geohash.parse::<i64>().ok()?;
                        (position > query.min.value() && position < query.max.value())
                            .then_some((position, *id, record))
                    })
                    .collect()
            })
            .unwrap_or_default();
        matches.sort_by_key(|(position, id, _)| (*position, *id));

        let records: Vec<StoredRecord> = matches
            .iter()
            .skip(offset)
            .take(self.page_size)
            .map(|(_, _, record)| (*record).clone())
            .collect();
        let consumed = offset + records.len();
        let next_cursor = (consumed < matches.len()).then(|| consumed.to_string());

        Ok(QueryPage {
            records,
            next_cursor,
        })
    }

    async fn begin(&self) -> Result<Box<dyn StoreTransaction>> {
        Ok(Box::new(MemoryTransaction {
            inner: Arc::clone(&self.inner),
            staged: Vec::new(),
            state: TxnState::Active,
        }))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TxnState {
    Active,
    Committed,
    RolledBack,
}

struct MemoryTransaction {
    inner: Arc<RwLock<MemoryInner>>,
    staged: Vec<(RecordKey, StoredRecord)>,
    state: TxnState,
}

impl MemoryTransaction {
    fn ensure_active(&self) -> Result<()> {
        if self.state != TxnState::Active {
            return Err(GeodexError::TransactionFinished);
        }
        Ok(())
    }
}

#[async_trait]
impl StoreTransaction for MemoryTransaction {
    async fn get(&mut self, key: &RecordKey) -> Result<Option<StoredRecord>> {
        self.ensure_active()?;
        let inner = self.inner.read();
        Ok(inner
            .tables
            .get(&(key.namespace.clone(), key.table.clone()))
            .and_then(|table| table.rows.get(&key.id).cloned()))
    }

    async fn save(&mut self, key: &RecordKey, record: StoredRecord) -> Result<()> {
        self.ensure_active()?;
        self.staged.push((key.clone(), record));
        Ok(())
    }

    async fn commit(&mut self) -> Result<()> {
        self.ensure_active()?;
        let mut inner = self.inner.write();
        for (key, record) in self.staged.drain(..) {
            let table = inner
                .tables
                .entry((key.namespace.clone(), key.table.clone()))
                .or_default();
            table.next_id = table.next_id.max(key.id);
            table.rows.insert(key.id, record);
        }
        self.state = TxnState::Committed;
        Ok(())
    }

    async fn rollback(&mut self) -> Result<()> {
        self.ensure_active()?;
        self.staged.clear();
        self.state = TxnState::RolledBack;
        Ok(())
    }
}
