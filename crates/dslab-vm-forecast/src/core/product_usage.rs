//! Utilization of the co-located product workload.

use std::collections::BTreeMap;
use std::fs::File;
use std::path::Path;

use log::{debug, info};
use serde::Deserialize;

use crate::core::bucket::TimeBucket;
use crate::core::error::ForecastError;

/// Single row of a product usage CSV file.
#[derive(Debug, Deserialize)]
struct ProductUsageRecord {
    time: TimeBucket,
    #[serde(alias = "cpuUsage")]
    cpu_usage: f64,
    #[serde(default)]
    vm_id: Option<u32>,
}

/// Externally supplied utilization of the product workload sharing the VM, keyed by fine bucket.
///
/// The table is loaded once when the VM is created and never changes afterwards.
/// Buckets without an entry contribute no usage.
#[derive(Clone, Debug, Default)]
pub struct ProductUsageTable {
    usage: BTreeMap<TimeBucket, f64>,
}

impl ProductUsageTable {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the table from `(bucket, fraction)` pairs.
    ///
    /// Fails if some fraction is not a finite number in `[0, 1]`. If a bucket occurs several times,
    /// the largest fraction is kept.
    pub fn from_entries<I: IntoIterator<Item = (TimeBucket, f64)>>(entries: I) -> Result<Self, ForecastError> {
        let mut usage = BTreeMap::new();
        for (bucket, value) in entries {
            if !value.is_finite() || !(0. ..=1.).contains(&value) {
                return Err(ForecastError::InvalidProductUsage { bucket, value });
            }
            let entry = usage.entry(bucket).or_insert(value);
            if *entry < value {
                debug!("duplicate product usage for bucket {}, keeping {}", bucket, value);
                *entry = value;
            }
        }
        Ok(Self { usage })
    }

    /// Loads the table from CSV file with `time` and `cpu_usage` columns.
    ///
    /// If the file has a `vm_id` column and `vm_id` is passed, only the rows of this VM
    /// (or rows without VM id) are used. Any malformed row fails the whole load.
    pub fn load<P: AsRef<Path>>(path: P, vm_id: Option<u32>) -> Result<Self, ForecastError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| ForecastError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let mut reader = csv::Reader::from_reader(file);
        let mut entries = Vec::new();
        for record in reader.deserialize() {
            let record: ProductUsageRecord = record?;
            match (vm_id, record.vm_id) {
                (Some(wanted), Some(actual)) if wanted != actual => continue,
                _ => entries.push((record.time, record.cpu_usage)),
            }
        }
        let table = Self::from_entries(entries)?;
        info!("Read {} product usage entries from {}", table.len(), path.display());
        Ok(table)
    }

    /// Returns the usage of the bucket, if present.
    pub fn get(&self, bucket: TimeBucket) -> Option<f64> {
        self.usage.get(&bucket).copied()
    }

    /// Maximum usage over `len` buckets starting from `bucket` (0 if none of them is present).
    pub fn max_in_window(&self, bucket: TimeBucket, len: u64) -> f64 {
        if len == 0 {
            return 0.;
        }
        self.usage
            .range(bucket..=bucket.saturating_add(len - 1))
            .map(|(_, v)| *v)
            .fold(0., f64::max)
    }

    pub fn len(&self) -> usize {
        self.usage.len()
    }

    pub fn is_empty(&self) -> bool {
        self.usage.is_empty()
    }

    /// Iterates over entries in bucket order.
    pub fn iter(&self) -> impl Iterator<Item = (TimeBucket, f64)> + '_ {
        self.usage.iter().map(|(b, v)| (*b, *v))
    }
}
