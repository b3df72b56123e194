//! Geospatial rectangle queries for plain key-value/document stores.
//!
//! Stores that only support equality and ordered range filters have no notion
//! of geographic containment. geodex bridges the gap: every point is mapped to
//! a position on the S2 space-filling curve, a coarse partition key is derived
//! from the position's leading decimal digits, and a query rectangle becomes a
//! small set of single-partition range scans that run concurrently and are
//! exactly re-filtered afterwards.
//!
//! ```rust
//! use geodex::{Attributes, Config, GeoManager, GeoPoint, MemoryStore, QueryRectangle};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> geodex::Result<()> {
//! let manager = GeoManager::new(MemoryStore::new(), Config::new("demo", "places"))?;
//!
//! let mut attributes = Attributes::new();
//! attributes.insert("name".to_string(), "castle".into());
//! manager.create(&GeoPoint::new(49.4106, 8.7153), attributes).await?;
//!
//! let rectangle = QueryRectangle::new(
//!     GeoPoint::new(49.4067, 8.6256),
//!     GeoPoint::new(49.4263, 8.7492),
//! );
//! let found = manager.query_rectangle(&rectangle).await?;
//! assert_eq!(found.len(), 1);
//! assert_eq!(found[0].attributes["name"], "castle");
//! # Ok(())
//! # }
//! ```

pub mod cell;
pub mod curve;
pub mod error;
pub mod manager;
pub mod ranges;
pub mod store;
pub mod types;

pub use error::{GeodexError, Result};

pub use curve::CurvePosition;

pub use ranges::{CellRange, QueryRange, split_into_partition_ranges};

pub use manager::GeoManager;

pub use store::{Datastore, MemoryStore, QueryPage, RangeQuery, StoreTransaction};

pub use types::{
    Attributes, Config, DEFAULT_HASH_KEY_LENGTH, GeoPoint, GeoRecord, QueryRectangle, RecordKey,
    StoredRecord,
};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Common imports
pub mod prelude {

    pub use crate::{GeoManager, GeodexError, Result};

    pub use crate::{Attributes, Config, GeoPoint, GeoRecord, QueryRectangle, RecordKey};

    pub use crate::{Datastore, MemoryStore, StoreTransaction};

    pub use crate::{CurvePosition, QueryRange};
}
