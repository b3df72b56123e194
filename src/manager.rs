//! Geo record manager.
//!
//! [`GeoManager`] ties the pieces together: it derives the indexing fields on
//! write, decomposes query rectangles into per-partition curve ranges, fans
//! the scans out concurrently against the store, and applies the exact
//! containment filter to the merged candidates.

use crate::cell;
use crate::error::{GeodexError, Result};
use crate::ranges::{QueryRange, split_into_partition_ranges};
use crate::store::{Datastore, RangeQuery};
use crate::types::{
    Attributes, Config, GeoPoint, GeoRecord, QueryRectangle, RecordKey, StoredRecord,
};
use futures::future::try_join_all;

/// Manages geo-indexed records in one table of the underlying store.
///
/// The manager owns the correctness of the derived `geohash`/`hashKey` fields;
/// the store owns durability. Configuration is immutable for the lifetime of
/// the manager.
///
/// # Example
///
/// ```rust
/// use geodex::{Config, GeoManager, GeoPoint, MemoryStore, QueryRectangle};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> geodex::Result<()> {
/// let manager = GeoManager::new(MemoryStore::new(), Config::new("demo", "places"))?;
///
/// let mut attributes = geodex::Attributes::new();
/// attributes.insert("name".to_string(), "old bridge".into());
/// manager.create(&GeoPoint::new(49.4129, 8.7100), attributes).await?;
///
/// let rectangle = QueryRectangle::new(
///     GeoPoint::new(49.4067, 8.6256),
///     GeoPoint::new(49.4263, 8.7492),
/// );
/// let found = manager.query_rectangle(&rectangle).await?;
/// assert_eq!(found.len(), 1);
/// # Ok(())
/// # }
/// ```
pub struct GeoManager<D: Datastore> {
    store: D,
    config: Config,
}

impl<D: Datastore> GeoManager<D> {
    /// Create a manager over `store` with a validated configuration.
    pub fn new(store: D, config: Config) -> Result<Self> {
        config.validate().map_err(GeodexError::InvalidInput)?;
        Ok(Self { store, config })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn store(&self) -> &D {
        &self.store
    }

    /// Persist a new record: derives the indexing fields from `point` and
    /// stores them with the caller's attributes. Returns the record handle.
    pub async fn create(&self, point: &GeoPoint, attributes: Attributes) -> Result<RecordKey> {
        point.validate().map_err(GeodexError::InvalidInput)?;
        let record = self.build_record(point, attributes);
        self.store
            .save(&self.config.namespace, &self.config.table, record)
            .await
    }

    /// Move and/or relabel an existing record.
    ///
    /// Runs a transactional read-merge-write: the stored record is read
    /// inside the transaction, caller attributes are merged over the stored
    /// ones, the indexing fields are re-derived from the new point, and a
    /// single write is issued. Any failure rolls the transaction back and
    /// re-raises the original error; store state is left unchanged.
    pub async fn update(&self, id: i64, point: &GeoPoint, attributes: Attributes) -> Result<()> {
        point.validate().map_err(GeodexError::InvalidInput)?;
        let key = self.key(id);
        let mut txn = self.store.begin().await?;

        let outcome = async {
            let stored = txn.get(&key).await?.ok_or(GeodexError::NotFound(id))?;

            let mut merged = stored.attributes;
            for (name, value) in attributes {
                merged.insert(name, value);
            }

            txn.save(&key, self.build_record(point, merged)).await?;
            txn.commit().await
        }
        .await;

        if let Err(err) = outcome {
            if let Err(rollback_err) = txn.rollback().await {
                log::warn!("rollback failed after update error: {rollback_err}");
            }
            return Err(err);
        }
        Ok(())
    }

    /// Remove a record by id.
    pub async fn delete(&self, id: i64) -> Result<()> {
        self.store.delete(&self.key(id)).await
    }

    /// Find all records whose point lies inside `rectangle` (bounds
    /// inclusive).
    ///
    /// The rectangle's cell covering is decomposed into per-partition curve
    /// ranges; one paginated scan runs per range, all ranges concurrently.
    /// If any scan fails the whole query fails and nothing is returned.
    /// Survivors of the exact containment filter come back with the internal
    /// indexing fields stripped.
    pub async fn query_rectangle(&self, rectangle: &QueryRectangle) -> Result<Vec<GeoRecord>> {
        let Some((min, max)) = rectangle.corners() else {
            log::warn!("rejecting rectangle query with missing corner");
            return Err(GeodexError::InvalidInput(
                "rectangle requires both corner points".to_string(),
            ));
        };
        min.validate().map_err(GeodexError::InvalidInput)?;
        max.validate().map_err(GeodexError::InvalidInput)?;

        let rect = cell::rect_from_corners(&min, &max);
        let covering = cell::covering_ranges(&rect);
        let ranges = split_into_partition_ranges(&covering, self.config.hash_key_length);
        log::debug!(
            "decomposed query rectangle into {} partition ranges",
            ranges.len()
        );

        let scans = ranges.iter().map(|range| self.scan_range(range));
        let merged = try_join_all(scans).await?;

        let candidates: Vec<StoredRecord> = merged.into_iter().flatten().collect();
        Ok(filter_by_rectangle(candidates, &min, &max))
    }

    /// Follow one range's scan through all of its pages. The cursor chain is
    /// strictly sequential within a range.
    async fn scan_range(&self, range: &QueryRange) -> Result<Vec<StoredRecord>> {
        let query = RangeQuery {
            namespace: self.config.namespace.clone(),
            table: self.config.table.clone(),
            hash_key: range.min.hash_key(self.config.hash_key_length),
            min: range.min,
            max: range.max,
        };

        let mut records = Vec::new();
        let mut cursor: Option<String> = None;
        loop {
            let page = self.store.run_query(&query, cursor.as_deref()).await?;
            records.extend(page.records);
            match page.next_cursor {
                Some(next) => cursor = Some(next),
                None => break,
            }
        }
        Ok(records)
    }

    fn build_record(&self, point: &GeoPoint, attributes: Attributes) -> StoredRecord {
        let position = cell::leaf_position(point);
        StoredRecord {
            geohash: position.to_string(),
            hash_key: position.hash_key(self.config.hash_key_length),
            geo_point: *point,
            attributes,
        }
    }

    fn key(&self, id: i64) -> RecordKey {
        RecordKey::new(self.config.namespace.clone(), self.config.table.clone(), id)
    }
}

/// Drop candidates outside the rectangle and strip the indexing fields from
/// the survivors.
fn filter_by_rectangle(
    candidates: Vec<StoredRecord>,
    min: &GeoPoint,
    max: &GeoPoint,
) -> Vec<GeoRecord> {
    candidates
        .into_iter()
        .filter(|record| cell::rect_contains(min, max, &record.geo_point))
        .map(GeoRecord::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    #[test]
    fn test_new_rejects_invalid_config() {
        let config = Config::new("", "test");
        assert!(matches!(
            GeoManager::new(MemoryStore::new(), config),
            Err(GeodexError::InvalidInput(_))
        ));
    }

    #[tokio::test]
    async fn test_query_rejects_missing_corner() {
        let manager =
            GeoManager::new(MemoryStore::new(), Config::new("ntest", "test")).unwrap();
        let rectangle = QueryRectangle {
            min_point: Some(GeoPoint::new(0.0, 0.0)),
            max_point: None,
        };
        assert!(matches!(
            manager.query_rectangle(&rectangle).await,
            Err(GeodexError::InvalidInput(_))
        ));
    }

    #[tokio::test]
    async fn test_query_rejects_non_finite_corner() {
        let manager =
            GeoManager::new(MemoryStore::new(), Config::new("ntest", "test")).unwrap();
        let rectangle = QueryRectangle::new(
            GeoPoint::new(f64::NAN, 0.0),
            GeoPoint::new(1.0, 1.0),
        );
        assert!(matches!(
            manager.query_rectangle(&rectangle).await,
            Err(GeodexError::InvalidInput(_))
        ));
    }

    #[tokio::test]
    async fn test_create_rejects_invalid_point() {
        let manager =
            GeoManager::new(MemoryStore::new(), Config::new("ntest", "test")).unwrap();
        let result = manager
            .create(&GeoPoint::new(95.0, 0.0), Attributes::new())
            .await;
        assert!(matches!(result, Err(GeodexError::InvalidInput(_))));
    }

    #[test]
    fn test_filter_strips_indexing_fields() {
        let record = StoredRecord {
            geohash: "4416340092237875681".to_string(),
            hash_key: 44,
            geo_point: GeoPoint::new(1.0, 50.0),
            attributes: Attributes::new(),
        };
        let min = GeoPoint::new(0.0, 49.0);
        let max = GeoPoint::new(2.0, 51.0);

        let kept = filter_by_rectangle(vec![record.clone()], &min, &max);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].geo_point, record.geo_point);

        // Outside the rectangle: over-inclusion from the covering is dropped.
        let outside = GeoPoint::new(5.0, 49.0);
        let dropped = filter_by_rectangle(
            vec![StoredRecord {
                geo_point: outside,
                ..record
            }],
            &min,
            &max,
        );
        assert!(dropped.is_empty());
    }
}
