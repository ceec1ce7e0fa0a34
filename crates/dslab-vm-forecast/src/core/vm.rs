//! Representation of virtual machine with predictive resource availability.

use std::rc::Rc;

use log::trace;
use serde::ser::{SerializeStruct, Serializer};
use serde::Serialize;

use crate::core::availability_policies::current::CurrentAvailability;
use crate::core::availability_policy::{EstimatorInput, PolicyKind};
use crate::core::config::ForecastConfig;
use crate::core::error::ForecastError;
use crate::core::estimator::AvailabilityEstimator;
use crate::core::history::{Channel, VmHistory};
use crate::core::product_usage::ProductUsageTable;
use crate::core::resource_view::VmResourceView;
use crate::core::scheduler::PeScheduler;

/// Represents virtual machine (VM).
///
// VM is characterized by its ID and the number of PEs. On every processing update it records its
// utilization into bucketed histories, which are used together with the product usage table by
// availability policies to estimate how many PEs can be given to new tasks.
#[derive(Clone)]
pub struct VirtualMachine {
    pub id: u32,
    total_pes: u32,
    history: VmHistory,
    product_usage: ProductUsageTable,
    estimator: AvailabilityEstimator,
    config: Rc<ForecastConfig>,
}

impl Serialize for VirtualMachine {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut state = serializer.serialize_struct("VirtualMachine", 4)?;
        state.serialize_field("id", &self.id)?;
        state.serialize_field("total_pes", &self.total_pes)?;
        state.serialize_field("policy", &self.estimator.selected().to_string())?;
        state.serialize_field("history_buckets", &self.history.fine().len())?;
        state.end()
    }
}

impl VirtualMachine {
    /// Creates virtual machine with already loaded product usage table.
    pub fn new(
        id: u32,
        total_pes: u32,
        product_usage: ProductUsageTable,
        config: Rc<ForecastConfig>,
    ) -> Result<Self, ForecastError> {
        if total_pes == 0 {
            return Err(ForecastError::Config(format!("VM {} has no PEs", id)));
        }
        let widths = config.bucket_widths()?;
        let estimator = AvailabilityEstimator::from_config(&config)?;
        Ok(Self {
            id,
            total_pes,
            history: VmHistory::new(widths),
            product_usage,
            estimator,
            config,
        })
    }

    /// Creates virtual machine loading its product usage table from the file specified in config.
    ///
    /// Fails if the table can't be loaded completely.
    pub fn from_config(id: u32, total_pes: u32, config: Rc<ForecastConfig>) -> Result<Self, ForecastError> {
        let product_usage = match &config.product_usage {
            Some(path) => ProductUsageTable::load(path, Some(id))?,
            None => ProductUsageTable::new(),
        };
        Self::new(id, total_pes, product_usage, config)
    }

    pub fn total_pes(&self) -> u32 {
        self.total_pes
    }

    pub fn history(&self) -> &VmHistory {
        &self.history
    }

    pub fn product_usage(&self) -> &ProductUsageTable {
        &self.product_usage
    }

    pub fn estimator(&self) -> &AvailabilityEstimator {
        &self.estimator
    }

    pub fn config(&self) -> &ForecastConfig {
        &self.config
    }

    /// Records VM utilization after the scheduler has updated the processing of tasks.
    ///
    /// The utilization is the share of PEs not available by the current policy. In addition the own
    /// busy PEs and the product workload PEs are recorded into the corresponding channels.
    pub fn update_processing(&mut self, time: f64, scheduler: &dyn PeScheduler) {
        let total = self.total_pes as f64;
        let current = {
            let input = self.input(time, scheduler.idle_pes(time));
            CurrentAvailability::estimate(&input)
        };
        let utilization = (self.total_pes - current) as f64 / total;
        self.history.record_utilization(time, utilization);
        self.history
            .record_channel(Channel::Total, time, scheduler.busy_pes(time) as f64 / total);
        self.history
            .record_channel(Channel::Product, time, scheduler.product_pes(time) as f64 / total);
        trace!("vm #{} utilization at {}: {}", self.id, time, utilization);
    }

    /// Returns the view used by the allocation layer to query available PEs.
    pub fn resources<'a>(&'a mut self, scheduler: &'a dyn PeScheduler) -> VmResourceView<'a> {
        VmResourceView::new(self, scheduler)
    }

    /// Estimates available PEs with the specified policy (or the selected one).
    pub(crate) fn estimate(&mut self, kind: Option<PolicyKind>, time: f64, idle_pes: u32) -> u32 {
        let input = EstimatorInput {
            time,
            total_pes: self.total_pes,
            idle_pes,
            widths: self.history.widths(),
            history: &self.history,
            product_usage: &self.product_usage,
        };
        match kind {
            Some(kind) => self.estimator.estimate(kind, &input),
            None => self.estimator.estimate_selected(&input),
        }
    }

    fn input(&self, time: f64, idle_pes: u32) -> EstimatorInput<'_> {
        EstimatorInput {
            time,
            total_pes: self.total_pes,
            idle_pes,
            widths: self.history.widths(),
            history: &self.history,
            product_usage: &self.product_usage,
        }
    }
}
