//! Spherical geometry, backed by the `s2` crate.
//!
//! Points map to leaf cell identifiers on the S2 space-filling curve; query
//! rectangles map to a small covering of cells, each spanning a contiguous
//! curve interval. Everything here is a thin translation layer between the
//! crate's degree-based types and the curve arithmetic in [`crate::curve`].

use crate::curve::CurvePosition;
use crate::ranges::CellRange;
use crate::types::GeoPoint;
use s2::cellid::CellID;
use s2::latlng::LatLng;
use s2::r1;
use s2::rect::Rect;
use s2::region::RegionCoverer;
use s2::s1::{self, Deg};

/// The curve position of the leaf cell containing `point`.
pub fn leaf_position(point: &GeoPoint) -> CurvePosition {
    let latlng = LatLng::new(Deg(point.latitude).into(), Deg(point.longitude).into());
    CurvePosition::new(CellID::from(latlng).0 as i64)
}

/// Build the spherical rectangle spanned by two corner points, in radians.
pub fn rect_from_corners(min: &GeoPoint, max: &GeoPoint) -> Rect {
    Rect {
        lat: r1::interval::Interval {
            lo: min.latitude.to_radians(),
            hi: max.latitude.to_radians(),
        },
        lng: s1::interval::Interval {
            lo: min.longitude.to_radians(),
            hi: max.longitude.to_radians(),
        },
    }
}

/// Compute a covering of `rect` and return each cell's curve interval, in
/// covering order.
pub fn covering_ranges(rect: &Rect) -> Vec<CellRange> {
    // Full level span, at most 8 cells: few cells keep the scan fan-out
    // small and the exact filter corrects the looser approximation.
    let coverer = RegionCoverer {
        min_level: 0,
        max_level: 30,
        level_mod: 1,
        max_cells: 8,
    };
    coverer
        .covering(rect)
        .0
        .iter()
        .map(cell_range)
        .collect()
}

/// The contiguous curve interval fully covering one cell.
pub fn cell_range(cell: &CellID) -> CellRange {
    CellRange::new(
        CurvePosition::new(cell.range_min().0 as i64),
        CurvePosition::new(cell.range_max().0 as i64),
    )
}

/// Exact containment test with inclusive bounds. Coverings over-approximate
/// the rectangle, so candidates outside it are expected and filtered here.
pub fn rect_contains(min: &GeoPoint, max: &GeoPoint, candidate: &GeoPoint) -> bool {
    candidate.latitude >= min.latitude
        && candidate.latitude <= max.latitude
        && candidate.longitude >= min.longitude
        && candidate.longitude <= max.longitude
}
