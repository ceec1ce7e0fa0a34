//! Policies computing the number of PEs a VM can offer to new tasks.

use std::fmt::{Display, Formatter};

use num::ToPrimitive;

use crate::core::bucket::BucketWidths;
use crate::core::config::ConfigValue;
use crate::core::decimal::Decimal;
use crate::core::error::ForecastError;
use crate::core::history::{Channel, VmHistory};
use crate::core::product_usage::ProductUsageTable;

/// Everything a policy may read when estimating availability at a given moment.
pub struct EstimatorInput<'a> {
    pub time: f64,
    pub total_pes: u32,
    /// Idle PEs reported by the VM scheduler.
    pub idle_pes: u32,
    pub widths: BucketWidths,
    pub history: &'a VmHistory,
    pub product_usage: &'a ProductUsageTable,
}

impl EstimatorInput<'_> {
    /// Idle PEs reported by the scheduler, never above the VM size.
    pub fn idle(&self) -> u32 {
        self.idle_pes.min(self.total_pes)
    }
}

/// Trait for implementation of availability policies.
///
/// The policy is a function of the VM state at the current moment, which returns the number of PEs in
/// `[0, total_pes]` that can be allocated. Policies may keep internal model state, e.g. fitted coefficients.
pub trait AvailabilityPolicy {
    fn available_pes(&mut self, input: &EstimatorInput) -> u32;
}

/// Number of PEs needed to serve the busy fraction: `ceil(fraction * total_pes)`.
pub fn busy_pes(fraction: &Decimal, total_pes: u32) -> u32 {
    let fraction = fraction.clone().clamp_unit();
    let busy = (&fraction * &Decimal::from(total_pes)).ceil();
    busy.to_u32().unwrap_or(total_pes).min(total_pes)
}

/// Same as [`busy_pes`] for float fractions, which are converted to decimals first.
pub fn busy_pes_f64(fraction: f64, total_pes: u32) -> u32 {
    busy_pes(&Decimal::from_f64(fraction), total_pes)
}

/// Converts forecasted busy fraction into available PEs. A forecast of 1 or more leaves no PEs.
pub fn available_from_forecast(forecast: &Decimal, total_pes: u32) -> u32 {
    if *forecast >= Decimal::one() {
        return 0;
    }
    total_pes - busy_pes(forecast, total_pes)
}

/// Identifies one of the supported policies.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PolicyKind {
    /// Idle PEs minus the product usage expected within the current SLOT.
    Current,
    /// AR(2) forecast of the VM utilization refitted on every call.
    GratisAr2,
    /// Idle PEs minus the maximum product usage over the table lookahead window.
    BatchTable,
    /// Linear combination of the last two values with fixed weights.
    ArmaFixed,
    /// AR(2) forecast over the selected channel.
    FoarDualChannel(Channel),
}

impl Display for PolicyKind {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        match self {
            PolicyKind::Current => write!(f, "Current"),
            PolicyKind::GratisAr2 => write!(f, "GratisAR2"),
            PolicyKind::BatchTable => write!(f, "BatchTable"),
            PolicyKind::ArmaFixed => write!(f, "ArmaFixed"),
            PolicyKind::FoarDualChannel(channel) => write!(f, "FoarDualChannel[channel={}]", channel),
        }
    }
}

/// Resolves policy from config value such as `GratisAR2` or `FoarDualChannel[channel=product]`.
pub fn policy_resolver(config_str: &str) -> Result<PolicyKind, ForecastError> {
    let value: ConfigValue = config_str.parse()?;
    let kind = match value.name.as_str() {
        "Current" => PolicyKind::Current,
        "GratisAR2" | "Gratis" => PolicyKind::GratisAr2,
        "BatchTable" | "Batch" => PolicyKind::BatchTable,
        "ArmaFixed" | "ARMA" => PolicyKind::ArmaFixed,
        "FoarDualChannel" | "FOAR" => {
            value.check_options(&["channel"])?;
            let channel = match value.option("channel") {
                Some(channel) => channel.parse::<Channel>().map_err(ForecastError::Config)?,
                None => Channel::Total,
            };
            return Ok(PolicyKind::FoarDualChannel(channel));
        }
        _ => return Err(ForecastError::Config(format!("can't resolve policy: {}", config_str))),
    };
    value.check_options(&[])?;
    Ok(kind)
}
