//! Bucketed utilization history.

use log::trace;
use serde::{Deserialize, Serialize};

use crate::core::bucket::{bucket_of, BucketWidths, TimeBucket};

/// Peak busy fraction observed per time bucket.
///
/// The history always covers an unbroken prefix of buckets starting from bucket 0, which is seeded
/// with 0.0. Each bucket keeps the maximum of the values recorded into it, and when a write skips
/// over some buckets, they receive the value of the last populated bucket (forward fill).
#[derive(Clone, Debug)]
pub struct UtilizationHistory {
    width: f64,
    values: Vec<f64>,
}

impl UtilizationHistory {
    /// Creates history with the specified bucket width.
    pub fn new(width: f64) -> Self {
        assert!(width > 0., "bucket width must be positive");
        Self {
            width,
            values: vec![0.],
        }
    }

    pub fn width(&self) -> f64 {
        self.width
    }

    /// Records the busy fraction observed at `time`.
    pub fn record(&mut self, time: f64, fraction: f64) {
        self.record_bucket(bucket_of(time, self.width), fraction);
    }

    /// Records the busy fraction into the specified bucket.
    ///
    /// The fraction is clamped to `[0, 1]`, NaN is treated as 0.
    pub fn record_bucket(&mut self, bucket: TimeBucket, fraction: f64) {
        let fraction = if fraction.is_nan() { 0. } else { fraction.clamp(0., 1.) };
        let idx = bucket as usize;
        if idx < self.values.len() {
            if self.values[idx] < fraction {
                self.values[idx] = fraction;
            }
            return;
        }
        let fill = self.values[self.values.len() - 1];
        if idx > self.values.len() {
            trace!(
                "forward-filling buckets {}..{} with {}",
                self.values.len(),
                idx,
                fill
            );
        }
        self.values.resize(idx, fill);
        self.values.push(fraction);
    }

    /// Returns the value stored for the bucket, if it is populated.
    pub fn get(&self, bucket: TimeBucket) -> Option<f64> {
        self.values.get(bucket as usize).copied()
    }

    /// Returns the value of the bucket or, if it is beyond the last populated one, the last value.
    pub fn value_at(&self, bucket: TimeBucket) -> f64 {
        let idx = (bucket as usize).min(self.values.len() - 1);
        self.values[idx]
    }

    /// Number of populated buckets (always at least 1).
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Always false, bucket 0 is seeded on creation.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn last_bucket(&self) -> TimeBucket {
        (self.values.len() - 1) as TimeBucket
    }

    /// Values of all populated buckets in bucket order.
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Iterates over `(bucket, value)` pairs in bucket order.
    pub fn iter(&self) -> impl Iterator<Item = (TimeBucket, f64)> + '_ {
        self.values.iter().enumerate().map(|(i, v)| (i as TimeBucket, *v))
    }

    /// Maximum over the populated buckets among `bucket - len + 1 ..= bucket` (0 if none).
    pub fn trailing_max(&self, bucket: TimeBucket, len: u64) -> f64 {
        let from = bucket.saturating_add(1).saturating_sub(len);
        self.max_in_range(from, bucket)
    }

    /// Maximum over the populated buckets among `bucket ..= bucket + len - 1` (0 if none).
    pub fn leading_max(&self, bucket: TimeBucket, len: u64) -> f64 {
        if len == 0 {
            return 0.;
        }
        self.max_in_range(bucket, bucket.saturating_add(len - 1))
    }

    fn max_in_range(&self, from: TimeBucket, to: TimeBucket) -> f64 {
        let to = to.min(self.last_bucket());
        (from..=to).filter_map(|b| self.get(b)).fold(0., f64::max)
    }
}

/// Data channel tracked at the fine bucket width for two-channel forecasting.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    /// Busy PEs of the VM itself divided by the total number of PEs.
    Total,
    /// PEs used by the co-located product workload divided by the total number of PEs.
    Product,
}

impl std::fmt::Display for Channel {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Channel::Total => write!(f, "total"),
            Channel::Product => write!(f, "product"),
        }
    }
}

impl std::str::FromStr for Channel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "total" | "t" => Ok(Channel::Total),
            "product" | "p" => Ok(Channel::Product),
            _ => Err(format!("unknown channel: {}", s)),
        }
    }
}

/// All utilization series kept by a single VM.
#[derive(Clone, Debug)]
pub struct VmHistory {
    widths: BucketWidths,
    fine: UtilizationHistory,
    coarse: UtilizationHistory,
    total: UtilizationHistory,
    product: UtilizationHistory,
}

impl VmHistory {
    pub fn new(widths: BucketWidths) -> Self {
        Self {
            widths,
            fine: UtilizationHistory::new(widths.fine()),
            coarse: UtilizationHistory::new(widths.slot()),
            total: UtilizationHistory::new(widths.fine()),
            product: UtilizationHistory::new(widths.fine()),
        }
    }

    pub fn widths(&self) -> BucketWidths {
        self.widths
    }

    /// Records the VM utilization into both the fine and the coarse series.
    pub fn record_utilization(&mut self, time: f64, fraction: f64) {
        self.fine.record(time, fraction);
        self.coarse.record(time, fraction);
    }

    /// Records the value of the specified channel.
    pub fn record_channel(&mut self, channel: Channel, time: f64, fraction: f64) {
        match channel {
            Channel::Total => self.total.record(time, fraction),
            Channel::Product => self.product.record(time, fraction),
        }
    }

    /// Utilization series at the fine bucket width.
    pub fn fine(&self) -> &UtilizationHistory {
        &self.fine
    }

    /// Utilization series at the SLOT width, used for AR fitting.
    pub fn coarse(&self) -> &UtilizationHistory {
        &self.coarse
    }

    pub fn channel(&self, channel: Channel) -> &UtilizationHistory {
        match channel {
            Channel::Total => &self.total,
            Channel::Product => &self.product,
        }
    }

    /// Maximum of the channel over one SLOT window anchored at the fine bucket.
    ///
    /// The total channel looks back (`bucket - k + 1 ..= bucket`), the product channel looks
    /// ahead (`bucket ..= bucket + k - 1`), where `k` is the number of fine buckets per SLOT.
    pub fn channel_window_max(&self, channel: Channel, bucket: TimeBucket) -> f64 {
        let k = self.widths.slot_ratio();
        match channel {
            Channel::Total => self.total.trailing_max(bucket, k),
            Channel::Product => self.product.leading_max(bucket, k),
        }
    }
}
