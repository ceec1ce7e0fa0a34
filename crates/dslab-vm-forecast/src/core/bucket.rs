//! Discretization of simulation time into buckets.

use serde::Serialize;

/// Index of a time bucket, equal to `floor(time / width)`.
pub type TimeBucket = u64;

/// Default width of a fine bucket in simulation time units.
pub const DEFAULT_FINE_BUCKET_WIDTH: f64 = 300.;

/// Returns the bucket containing `time`. Negative times map to bucket 0.
pub fn bucket_of(time: f64, width: f64) -> TimeBucket {
    if time <= 0. {
        return 0;
    }
    (time / width).floor() as TimeBucket
}

/// Pair of bucket widths used by a VM: the fine width and the coarse SLOT width,
/// which is an integer multiple of the fine one.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct BucketWidths {
    fine: f64,
    slot_ratio: u64,
}

impl BucketWidths {
    /// Creates widths from the fine width and the number of fine buckets per SLOT.
    ///
    /// Panics if the width is not positive or the ratio is zero. Use
    /// [`ForecastConfig::bucket_widths`](crate::core::config::ForecastConfig::bucket_widths)
    /// to get validated widths from config.
    pub fn new(fine: f64, slot_ratio: u64) -> Self {
        assert!(fine > 0., "bucket width must be positive");
        assert!(slot_ratio > 0, "SLOT must span at least one fine bucket");
        Self { fine, slot_ratio }
    }

    pub fn fine(&self) -> f64 {
        self.fine
    }

    pub fn slot(&self) -> f64 {
        self.fine * self.slot_ratio as f64
    }

    /// Number of fine buckets in one SLOT.
    pub fn slot_ratio(&self) -> u64 {
        self.slot_ratio
    }

    pub fn fine_bucket(&self, time: f64) -> TimeBucket {
        bucket_of(time, self.fine)
    }

    pub fn slot_bucket(&self, time: f64) -> TimeBucket {
        bucket_of(time, self.slot())
    }
}

impl Default for BucketWidths {
    fn default() -> Self {
        Self::new(DEFAULT_FINE_BUCKET_WIDTH, 1)
    }
}
