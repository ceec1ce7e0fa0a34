//! Per-VM set of availability policies.

use log::debug;

use crate::core::availability_policies::arma_fixed::ArmaFixed;
use crate::core::availability_policies::batch_table::BatchTable;
use crate::core::availability_policies::current::CurrentAvailability;
use crate::core::availability_policies::foar_dual_channel::FoarDualChannel;
use crate::core::availability_policies::gratis_ar2::GratisAr2;
use crate::core::availability_policy::{AvailabilityPolicy, EstimatorInput, PolicyKind};
use crate::core::config::ForecastConfig;
use crate::core::error::ForecastError;
use crate::core::history::Channel;

/// Holds one instance of every policy for a single VM together with the policy selected by config.
///
/// Each forecasting policy owns its model state, so calling one policy never changes
/// the coefficients used by another one or by another VM.
#[derive(Clone, Debug)]
pub struct AvailabilityEstimator {
    selected: PolicyKind,
    current: CurrentAvailability,
    gratis: GratisAr2,
    batch: BatchTable,
    arma: ArmaFixed,
    foar_total: FoarDualChannel,
    foar_product: FoarDualChannel,
}

impl AvailabilityEstimator {
    /// Creates estimator with the specified default policy and fixed-coefficient policy.
    pub fn new(selected: PolicyKind, arma: ArmaFixed) -> Self {
        Self {
            selected,
            current: CurrentAvailability::new(),
            gratis: GratisAr2::new(),
            batch: BatchTable::new(),
            arma,
            foar_total: FoarDualChannel::new(Channel::Total),
            foar_product: FoarDualChannel::new(Channel::Product),
        }
    }

    /// Creates estimator from config.
    pub fn from_config(config: &ForecastConfig) -> Result<Self, ForecastError> {
        let selected = config.policy_kind()?;
        let arma = ArmaFixed::new(config.arma_weights, config.arma_channel);
        Ok(Self::new(selected, arma))
    }

    /// Returns the policy selected by config.
    pub fn selected(&self) -> PolicyKind {
        self.selected
    }

    pub fn set_selected(&mut self, selected: PolicyKind) {
        self.selected = selected;
    }

    pub fn gratis(&self) -> &GratisAr2 {
        &self.gratis
    }

    pub fn foar(&self, channel: Channel) -> &FoarDualChannel {
        match channel {
            Channel::Total => &self.foar_total,
            Channel::Product => &self.foar_product,
        }
    }

    pub fn arma(&self) -> &ArmaFixed {
        &self.arma
    }

    fn policy_mut(&mut self, kind: PolicyKind) -> &mut dyn AvailabilityPolicy {
        match kind {
            PolicyKind::Current => &mut self.current,
            PolicyKind::GratisAr2 => &mut self.gratis,
            PolicyKind::BatchTable => &mut self.batch,
            PolicyKind::ArmaFixed => &mut self.arma,
            PolicyKind::FoarDualChannel(Channel::Total) => &mut self.foar_total,
            PolicyKind::FoarDualChannel(Channel::Product) => &mut self.foar_product,
        }
    }

    /// Estimates available PEs with the specified policy.
    pub fn estimate(&mut self, kind: PolicyKind, input: &EstimatorInput) -> u32 {
        let available = self.policy_mut(kind).available_pes(input).min(input.total_pes);
        debug!("{} policy at time {}: {} PEs available", kind, input.time, available);
        available
    }

    /// Estimates available PEs with the policy selected by config.
    pub fn estimate_selected(&mut self, input: &EstimatorInput) -> u32 {
        self.estimate(self.selected, input)
    }
}
