//! Partition range decomposition.
//!
//! A covering cell spans a contiguous interval of curve positions, but one
//! interval can straddle several partition buckets. Each bucket must be
//! scanned separately (the store only supports an equality filter on the
//! partition key), so every cell interval is cut at bucket boundaries into
//! ranges that each live in exactly one bucket.
//!
//! Bucket boundaries are reconstructed from the bucket number and a decimal
//! denominator. Positive and negative buckets are mirrored rather than
//! negated: truncating-toward-zero division maps both `9` and `-9` toward
//! `0`, so on the negative side the bucket `l` spans
//! `[(l-1)*d + 1, l*d]` instead of `[l*d, (l+1)*d - 1]`.

use crate::curve::{CurvePosition, decimal_len};
use serde::{Deserialize, Serialize};

/// The contiguous curve interval covered by a single cell, as reported by the
/// geometry library.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellRange {
    pub min: CurvePosition,
    pub max: CurvePosition,
}

impl CellRange {
    pub fn new(min: CurvePosition, max: CurvePosition) -> Self {
        Self { min, max }
    }
}

/// A scan interval confined to one partition bucket. Transient; produced per
/// query and never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryRange {
    pub min: CurvePosition,
    pub max: CurvePosition,
}

impl QueryRange {
    pub fn new(min: CurvePosition, max: CurvePosition) -> Self {
        Self { min, max }
    }
}

/// Split a cell covering into per-partition scan ranges.
///
/// A cell whose endpoints share a hash key passes through unchanged. Otherwise
/// one range is emitted per bucket between the endpoint keys, with the cell's
/// own endpoints kept exact on the first and last bucket.
///
/// The denominator is computed once from the cell's lower bound and reused for
/// every bucket of that cell. When the two endpoints differ in decimal digit
/// count the truncated keys are not comparable and the bucket walk can come up
/// empty; such cells contribute no ranges (see the digit-count boundary test).
///
/// Output order follows the covering order and is deterministic.
pub fn split_into_partition_ranges(
    covering: &[CellRange],
    hash_key_length: usize,
) -> Vec<QueryRange> {
    let mut ranges = Vec::new();

    for cell in covering {
        let min_hash_key = cell.min.hash_key(hash_key_length);
        let max_hash_key = cell.max.hash_key(hash_key_length);
        let denominator =
            10_i64.pow((cell.min.digit_count() - decimal_len(min_hash_key)) as u32);

        if min_hash_key == max_hash_key {
            ranges.push(QueryRange::new(cell.min, cell.max));
            continue;
        }

        for bucket in min_hash_key..=max_hash_key {
            let range = if bucket > 0 {
                QueryRange::new(
                    if bucket == min_hash_key {
                        cell.min
                    } else {
                        CurvePosition(bucket * denominator)
                    },
                    if bucket == max_hash_key {
                        cell.max
                    } else {
                        CurvePosition((bucket + 1) * denominator - 1)
                    },
                )
            } else {
                QueryRange::new(
                    if bucket == min_hash_key {
                        cell.min
                    } else {
                        CurvePosition((bucket - 1) * denominator + 1)
                    },
                    if bucket == max_hash_key {
                        cell.max
                    } else {
                        CurvePosition(bucket * denominator)
                    },
                )
            };
            ranges.push(range);
        }
    }

    ranges
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cell(min: i64, max: i64) -> CellRange {
        CellRange::new(CurvePosition(min), CurvePosition(max))
    }

    #[test]
    fn test_single_partition_cell_passes_through() {
        let ranges = split_into_partition_ranges(&[cell(4400, 4499)], 2);
        assert_eq!(ranges, vec![QueryRange::new(CurvePosition(4400), CurvePosition(4499))]);
    }

    #[test]
    fn test_positive_cell_splits_at_bucket_boundaries() {
        // Hash keys 1..=4; exact endpoints on the outer buckets.
        let ranges = split_into_partition_ranges(&[cell(1500, 4700)], 1);
        assert_eq!(
            ranges,
            vec![
                QueryRange::new(CurvePosition(1500), CurvePosition(1999)),
                QueryRange::new(CurvePosition(2000), CurvePosition(2999)),
                QueryRange::new(CurvePosition(3000), CurvePosition(3999)),
                QueryRange::new(CurvePosition(4000), CurvePosition(4700)),
            ]
        );
    }

    #[test]
    fn test_negative_cell_mirrors_bucket_boundaries() {
        let ranges = split_into_partition_ranges(&[cell(-4700, -1500)], 1);
        assert_eq!(
            ranges,
            vec![
                QueryRange::new(CurvePosition(-4700), CurvePosition(-4000)),
                QueryRange::new(CurvePosition(-3999), CurvePosition(-3000)),
                QueryRange::new(CurvePosition(-2999), CurvePosition(-2000)),
                QueryRange::new(CurvePosition(-1999), CurvePosition(-1500)),
            ]
        );
    }

    #[test]
    fn test_split_covers_exactly_once() {
        // No gaps, no overlaps, monotonic distinct hash keys.
        for (min, max, length) in [(1500_i64, 4700_i64, 1), (-4700, -1500, 1), (11_000, 57_999, 2)]
        {
            let ranges = split_into_partition_ranges(&[cell(min, max)], length);
            assert_eq!(ranges.first().unwrap().min.value(), min);
            assert_eq!(ranges.last().unwrap().max.value(), max);
            for pair in ranges.windows(2) {
                assert_eq!(pair[1].min.value(), pair[0].max.value() + 1);
                assert!(pair[1].min.hash_key(length) > pair[0].min.hash_key(length));
            }
            for range in &ranges {
                assert!(range.min <= range.max);
                assert_eq!(range.min.hash_key(length), range.max.hash_key(length));
            }
        }
    }

    #[test]
    fn test_multiple_cells_keep_covering_order() {
        let ranges = split_into_partition_ranges(&[cell(4400, 4499), cell(1500, 1700)], 2);
        assert_eq!(ranges.len(), 2);
        assert_eq!(ranges[0].min.value(), 4400);
        assert_eq!(ranges[1].min.value(), 1500);
    }

    #[test]
    fn test_digit_count_boundary_cell_emits_no_ranges() {
        // The denominator comes from the cell's lower bound. When the bound
        // digit counts differ, the truncated keys land on different scales
        // (here 5 from "50" vs 2 from "250") and the bucket walk is empty.
        // Pins the longstanding behavior rather than fixing it.
        let ranges = split_into_partition_ranges(&[cell(50, 250)], 1);
        assert!(ranges.is_empty());
    }

    #[test]
    fn test_zero_crossing_cell_uses_mirrored_arithmetic() {
        // Bucket 0 spans [-99, 0] on the negative rule; bucket 1 starts at
        // the reconstructed boundary 100. Positions 1..=99 truncate to
        // single-digit keys outside the walked interval, and stay unscanned
        // with this denominator. Pinned, not fixed.
        let ranges = split_into_partition_ranges(&[cell(-150, 250)], 1);
        assert_eq!(
            ranges,
            vec![
                QueryRange::new(CurvePosition(-150), CurvePosition(-100)),
                QueryRange::new(CurvePosition(-99), CurvePosition(0)),
                QueryRange::new(CurvePosition(100), CurvePosition(199)),
                QueryRange::new(CurvePosition(200), CurvePosition(250)),
            ]
        );
    }

    #[test]
    fn test_full_scale_cell_split() {
        // 19-digit positions near the curve's upper end, hash key length 2.
        let min = 5_158_803_897_761_923_073_i64;
        let max = 5_258_803_897_761_923_073_i64;
        let ranges = split_into_partition_ranges(&[cell(min, max)], 2);
        assert_eq!(ranges.len(), 2);
        assert_eq!(ranges[0].min.value(), min);
        assert_eq!(ranges[0].max.value(), 5_199_999_999_999_999_999);
        assert_eq!(ranges[1].min.value(), 5_200_000_000_000_000_000);
        assert_eq!(ranges[1].max.value(), max);
        assert_eq!(ranges[0].min.hash_key(2), 51);
        assert_eq!(ranges[1].min.hash_key(2), 52);
    }
}
