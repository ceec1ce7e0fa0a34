//! Current availability policy.

use crate::core::availability_policy::{busy_pes_f64, AvailabilityPolicy, EstimatorInput};

/// Uses idle PEs reported by the scheduler minus the PEs reserved for the product workload.
///
/// The reservation is the maximum product usage over the current SLOT, i.e. over the fine buckets
/// `key ..= key + k - 1`, where `key` is the current fine bucket and `k` is the number of fine
/// buckets per SLOT.
#[derive(Clone, Debug, Default)]
pub struct CurrentAvailability;

impl CurrentAvailability {
    pub fn new() -> Self {
        Self {}
    }

    /// Computes current availability, also used as a baseline by the forecasting policies.
    pub fn estimate(input: &EstimatorInput) -> u32 {
        let key = input.widths.fine_bucket(input.time);
        let max_usage = input.product_usage.max_in_window(key, input.widths.slot_ratio());
        let reserved = busy_pes_f64(max_usage, input.total_pes);
        input.idle().saturating_sub(reserved)
    }
}

impl AvailabilityPolicy for CurrentAvailability {
    fn available_pes(&mut self, input: &EstimatorInput) -> u32 {
        Self::estimate(input)
    }
}
