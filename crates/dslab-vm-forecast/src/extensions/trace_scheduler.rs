//! Scheduler replaying PE usage recorded in a trace.

use std::fs::File;
use std::path::Path;

use log::info;
use serde::{Deserialize, Serialize};

use crate::core::error::ForecastError;
use crate::core::scheduler::PeScheduler;

/// PE usage of a VM observed at some moment.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct PeUsageRecord {
    pub time: f64,
    pub idle_pes: u32,
    pub busy_pes: u32,
    #[serde(default)]
    pub product_pes: u32,
}

/// Scheduler whose PE usage is a step function defined by trace records.
///
/// The usage at time `t` is taken from the last record with `time <= t`. Before the first record
/// all PEs are idle.
pub struct TraceScheduler {
    total_pes: u32,
    records: Vec<PeUsageRecord>,
}

impl TraceScheduler {
    /// Creates scheduler from records, which are sorted by time.
    pub fn new(total_pes: u32, mut records: Vec<PeUsageRecord>) -> Self {
        records.sort_by(|a, b| a.time.total_cmp(&b.time));
        Self { total_pes, records }
    }

    /// Loads the trace from CSV file with `time`, `idle_pes`, `busy_pes` and optional `product_pes` columns.
    pub fn load<P: AsRef<Path>>(path: P, total_pes: u32) -> Result<Self, ForecastError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| ForecastError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let mut reader = csv::Reader::from_reader(file);
        let mut records = Vec::new();
        for record in reader.deserialize() {
            records.push(record?);
        }
        info!("Read {} PE usage records from {}", records.len(), path.display());
        Ok(Self::new(total_pes, records))
    }

    /// Times of all records in increasing order.
    pub fn times(&self) -> impl Iterator<Item = f64> + '_ {
        self.records.iter().map(|r| r.time)
    }

    pub fn records(&self) -> &[PeUsageRecord] {
        &self.records
    }

    fn record_at(&self, time: f64) -> Option<&PeUsageRecord> {
        let idx = self.records.partition_point(|r| r.time <= time);
        if idx == 0 {
            None
        } else {
            Some(&self.records[idx - 1])
        }
    }
}

impl PeScheduler for TraceScheduler {
    fn idle_pes(&self, time: f64) -> u32 {
        self.record_at(time).map_or(self.total_pes, |r| r.idle_pes)
    }

    fn busy_pes(&self, time: f64) -> u32 {
        self.record_at(time).map_or(0, |r| r.busy_pes)
    }

    fn product_pes(&self, time: f64) -> u32 {
        self.record_at(time).map_or(0, |r| r.product_pes)
    }
}
