//! Core types and configuration for geodex.
//!
//! This module provides the caller-facing value types (points, rectangles,
//! records) and the serializable manager configuration.

use serde::de::Error;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Default number of leading decimal digits used for the partition hash key.
pub const DEFAULT_HASH_KEY_LENGTH: usize = 2;

/// Caller-supplied record attributes, stored alongside the system fields.
pub type Attributes = serde_json::Map<String, Value>;

/// A geographic point in degrees.
///
/// Latitude comes first, matching the `{latitude, longitude}` document shape
/// records are stored with. Conversions to and from [`geo::Point`] follow the
/// `geo` convention of `x = longitude`, `y = latitude`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoPoint {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Validate that both coordinates are finite and within range.
    pub fn validate(&self) -> Result<(), String> {
        if !self.latitude.is_finite() || !self.longitude.is_finite() {
            return Err("coordinates must be finite".to_string());
        }
        if self.latitude < -90.0 || self.latitude > 90.0 {
            return Err(format!("latitude {} out of range [-90, 90]", self.latitude));
        }
        if self.longitude < -180.0 || self.longitude > 180.0 {
            return Err(format!(
                "longitude {} out of range [-180, 180]",
                self.longitude
            ));
        }
        Ok(())
    }
}

impl From<geo::Point<f64>> for GeoPoint {
    fn from(point: geo::Point<f64>) -> Self {
        Self {
            latitude: point.y(),
            longitude: point.x(),
        }
    }
}

impl From<GeoPoint> for geo::Point<f64> {
    fn from(point: GeoPoint) -> Self {
        geo::Point::new(point.longitude, point.latitude)
    }
}

/// An axis-aligned query rectangle given by two corner points.
///
/// Corners are optional so that the type can be deserialized straight from a
/// request document; a rectangle with a missing corner is rejected by
/// [`GeoManager::query_rectangle`](crate::GeoManager::query_rectangle).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryRectangle {
    #[serde(default)]
    pub min_point: Option<GeoPoint>,
    #[serde(default)]
    pub max_point: Option<GeoPoint>,
}

impl QueryRectangle {
    pub fn new(min_point: GeoPoint, max_point: GeoPoint) -> Self {
        Self {
            min_point: Some(min_point),
            max_point: Some(max_point),
        }
    }

    /// Both corners, or `None` when either is absent.
    pub fn corners(&self) -> Option<(GeoPoint, GeoPoint)> {
        match (self.min_point, self.max_point) {
            (Some(min), Some(max)) => Some((min, max)),
            _ => None,
        }
    }
}

/// Manager configuration.
///
/// Designed to be easily serializable and loadable from JSON or TOML while
/// keeping complexity minimal. `hash_key_length` controls how many leading
/// decimal digits of a curve position form the partition key; partition
/// cardinality is `10^hash_key_length` (doubled in effect for positions on the
/// negative half of the curve).
///
/// # Example
///
/// ```rust
/// use geodex::Config;
///
/// let config = Config::new("production", "drivers");
/// assert_eq!(config.hash_key_length, 2);
///
/// // Load from JSON
/// let json = r#"{
///     "namespace": "production",
///     "table": "drivers",
///     "hash_key_length": 3
/// }"#;
/// let config = Config::from_json(json).unwrap();
/// assert_eq!(config.hash_key_length, 3);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Store namespace the managed table lives in.
    pub namespace: String,

    /// Table (collection/kind) holding the managed records.
    pub table: String,

    /// Leading decimal digits of the curve position used as partition key.
    #[serde(default = "Config::default_hash_key_length")]
    pub hash_key_length: usize,
}

impl Config {
    const fn default_hash_key_length() -> usize {
        DEFAULT_HASH_KEY_LENGTH
    }

    pub fn new(namespace: impl Into<String>, table: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            table: table.into(),
            hash_key_length: Self::default_hash_key_length(),
        }
    }

    pub fn with_hash_key_length(mut self, length: usize) -> Self {
        assert!(
            (1..=12).contains(&length),
            "Hash key length must be between 1 and 12"
        );
        self.hash_key_length = length;
        self
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), String> {
        if self.namespace.is_empty() {
            return Err("Namespace must not be empty".to_string());
        }
        if self.table.is_empty() {
            return Err("Table must not be empty".to_string());
        }
        if self.hash_key_length < 1 || self.hash_key_length > 12 {
            return Err("Hash key length must be between 1 and 12".to_string());
        }
        Ok(())
    }

    /// Load configuration from JSON string
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let config: Config = serde_json::from_str(json)?;
        if let Err(e) = config.validate() {
            return Err(Error::custom(e));
        }
        Ok(config)
    }

    /// Save configuration as JSON string
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Load configuration from TOML string (requires toml feature)
    #[cfg(feature = "toml")]
    pub fn from_toml(toml_str: &str) -> Result<Self, toml::de::Error> {
        let config: Config = toml::from_str(toml_str)?;
        if let Err(e) = config.validate() {
            return Err(toml::de::Error::custom(e));
        }
        Ok(config)
    }

    /// Save configuration as TOML string (requires toml feature)
    #[cfg(feature = "toml")]
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}

/// Identity of a persisted record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RecordKey {
    pub namespace: String,
    pub table: String,
    pub id: i64,
}

impl RecordKey {
    pub fn new(namespace: impl Into<String>, table: impl Into<String>, id: i64) -> Self {
        Self {
            namespace: namespace.into(),
            table: table.into(),
            id,
        }
    }
}

/// A record as persisted in the store: caller attributes plus the three
/// system-managed fields.
///
/// `geohash` is the curve position in decimal string form (indexed, sortable);
/// `hash_key` is the partition key (indexed, equality-filterable); `geo_point`
/// carries the original coordinates at full fidelity and must be excluded from
/// the store's secondary indexes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredRecord {
    pub geohash: String,
    pub hash_key: i64,
    pub geo_point: GeoPoint,
    #[serde(flatten)]
    pub attributes: Attributes,
}

/// A query result returned to callers: the original point and the caller's own
/// attributes, with the internal indexing fields stripped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeoRecord {
    pub geo_point: GeoPoint,
    #[serde(flatten)]
    pub attributes: Attributes,
}

impl From<StoredRecord> for GeoRecord {
    fn from(record: StoredRecord) -> Self {
        Self {
            geo_point: record.geo_point,
            attributes: record.attributes,
        }
    }
}
