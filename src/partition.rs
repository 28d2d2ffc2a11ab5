//! Splitting a frame count into per-worker ranges.
//!
//! [`partition`] divides `[0, total_frames)` into `workers` contiguous,
//! non-overlapping half-open ranges. Every range except the last is exactly
//! `total_frames / workers` frames long; the last one absorbs the remainder
//! left by integer division.
//!
//! # Example
//!
//! ```
//! use framesplit::partition;
//!
//! let plan = partition(10, 3)?;
//! assert_eq!(plan.boundaries(), &[0, 3, 6, 10]);
//! assert_eq!(plan.range(2), Some(6..10));
//! # Ok::<(), framesplit::ExtractError>(())
//! ```

use std::ops::Range;

use crate::error::ExtractError;

/// Boundary indices dividing a video's frames among workers.
///
/// Holds `workers + 1` non-decreasing values starting at `0` and ending at
/// `total_frames`. Worker `i` owns `boundaries[i]..boundaries[i + 1]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PartitionPlan {
    boundaries: Vec<u64>,
}

impl PartitionPlan {
    /// All `workers + 1` boundary indices.
    pub fn boundaries(&self) -> &[u64] {
        &self.boundaries
    }

    /// Number of workers the plan was computed for.
    pub fn worker_count(&self) -> usize {
        self.boundaries.len() - 1
    }

    /// Total number of frames covered by the plan.
    pub fn total_frames(&self) -> u64 {
        self.boundaries[self.boundaries.len() - 1]
    }

    /// The half-open frame range owned by `worker`, if it exists.
    pub fn range(&self, worker: usize) -> Option<Range<u64>> {
        let start = *self.boundaries.get(worker)?;
        let end = *self.boundaries.get(worker + 1)?;
        Some(start..end)
    }

    /// Iterate over every worker's range in order.
    pub fn ranges(&self) -> impl ExactSizeIterator<Item = Range<u64>> + '_ {
        self.boundaries.windows(2).map(|pair| pair[0]..pair[1])
    }
}

/// Compute the partition plan for `total_frames` frames over `workers`
/// workers.
///
/// Inputs are signed because frame counts reported by containers can be
/// negative or zero when unknown; both are rejected here.
///
/// # Errors
///
/// Returns [`ExtractError::InvalidArgument`] if either argument is not
/// strictly positive.
pub fn partition(total_frames: i64, workers: i64) -> Result<PartitionPlan, ExtractError> {
    if total_frames <= 0 {
        return Err(ExtractError::invalid(
            "total_frames",
            format!("must be greater than 0, got {total_frames}"),
        ));
    }
    if workers <= 0 {
        return Err(ExtractError::invalid(
            "workers",
            format!("must be greater than 0, got {workers}"),
        ));
    }

    let total = total_frames as u64;
    let parts = workers as u64;
    let chunk_size = total / parts;

    let mut boundaries: Vec<u64> = (0..parts).map(|index| index * chunk_size).collect();
    boundaries.push(total);

    Ok(PartitionPlan { boundaries })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn last_range_absorbs_remainder() {
        let plan = partition(10, 3).unwrap();
        assert_eq!(plan.boundaries(), &[0, 3, 6, 10]);
        assert_eq!(plan.worker_count(), 3);
        assert_eq!(plan.total_frames(), 10);
    }

    #[test]
    fn single_worker_owns_everything() {
        let plan = partition(9, 1).unwrap();
        assert_eq!(plan.ranges().collect::<Vec<_>>(), vec![0..9]);
    }

    #[test]
    fn more_workers_than_frames_yields_empty_ranges() {
        let plan = partition(3, 5).unwrap();
        assert_eq!(plan.boundaries(), &[0, 0, 0, 0, 0, 3]);
        let lengths: Vec<u64> = plan.ranges().map(|r| r.end - r.start).collect();
        assert_eq!(lengths, vec![0, 0, 0, 0, 3]);
    }

    #[test]
    fn rejects_non_positive_arguments() {
        for (total, workers) in [(0, 5), (5, 0), (-1, 5), (5, -3)] {
            match partition(total, workers) {
                Err(ExtractError::InvalidArgument { .. }) => {}
                other => panic!("expected InvalidArgument for ({total}, {workers}), got {other:?}"),
            }
        }
    }

    #[test]
    fn range_out_of_bounds_is_none() {
        let plan = partition(10, 2).unwrap();
        assert_eq!(plan.range(1), Some(5..10));
        assert_eq!(plan.range(2), None);
    }
}
