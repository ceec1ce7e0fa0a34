//! Batch table policy.

use log::debug;

use crate::core::availability_policy::{busy_pes_f64, AvailabilityPolicy, EstimatorInput};

/// Relies only on the product usage table: idle PEs minus the maximum product usage over the
/// current fine bucket and the next `k` ones (`key ..= key + k`).
#[derive(Clone, Debug, Default)]
pub struct BatchTable;

impl BatchTable {
    pub fn new() -> Self {
        Self {}
    }
}

impl AvailabilityPolicy for BatchTable {
    fn available_pes(&mut self, input: &EstimatorInput) -> u32 {
        let key = input.widths.fine_bucket(input.time);
        let max_usage = input.product_usage.max_in_window(key, input.widths.slot_ratio().saturating_add(1));
        let reserved = busy_pes_f64(max_usage, input.total_pes);
        debug!(
            "batch table: bucket {}, max product usage {}, reserved {} PEs",
            key, max_usage, reserved
        );
        input.idle().saturating_sub(reserved)
    }
}
