//! Configuration of VM availability forecasting.

use serde::{Deserialize, Serialize};

use crate::core::availability_policies::arma_fixed::{CHANNEL_WEIGHTS, UTILIZATION_WEIGHTS};
use crate::core::availability_policy::{policy_resolver, PolicyKind};
use crate::core::bucket::{BucketWidths, DEFAULT_FINE_BUCKET_WIDTH};
use crate::core::error::ForecastError;
use crate::core::history::Channel;

/// Largest supported number of fine buckets per SLOT.
pub const MAX_SLOT_RATIO: u64 = u32::MAX as u64;

/// Holds raw forecast config parsed from YAML file.
#[derive(Debug, PartialEq, Serialize, Deserialize, Clone, Default)]
struct RawForecastConfig {
    pub fine_bucket_width: Option<f64>,
    pub slot_width: Option<f64>,
    pub policy: Option<String>,
    pub arma_weights: Option<[f64; 2]>,
    pub arma_channel: Option<Channel>,
    pub product_usage: Option<String>,
}

/// Represents forecast configuration.
#[derive(Debug, PartialEq, Serialize, Deserialize, Clone)]
pub struct ForecastConfig {
    /// Width of a fine bucket in simulation time units.
    pub fine_bucket_width: f64,
    /// Width of a SLOT (coarse bucket), must be a multiple of the fine width.
    pub slot_width: f64,
    /// Policy used by default, e.g. `GratisAR2` or `FoarDualChannel[channel=product]`.
    pub policy: String,
    /// Weights of the fixed-coefficient policy for `x(t)` and `x(t - 1)`.
    pub arma_weights: [f64; 2],
    /// Channel used by the fixed-coefficient policy, coarse utilization if not set.
    pub arma_channel: Option<Channel>,
    /// Path to CSV file with product usage.
    pub product_usage: Option<String>,
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self::from_raw(RawForecastConfig::default())
    }
}

impl ForecastConfig {
    fn from_raw(raw: RawForecastConfig) -> Self {
        let fine_bucket_width = raw.fine_bucket_width.unwrap_or(DEFAULT_FINE_BUCKET_WIDTH);
        let default_weights = if raw.arma_channel.is_some() {
            CHANNEL_WEIGHTS
        } else {
            UTILIZATION_WEIGHTS
        };
        Self {
            fine_bucket_width,
            slot_width: raw.slot_width.unwrap_or(fine_bucket_width),
            policy: raw.policy.unwrap_or_else(|| "GratisAR2".to_string()),
            arma_weights: raw.arma_weights.unwrap_or(default_weights),
            arma_channel: raw.arma_channel,
            product_usage: raw.product_usage,
        }
    }

    /// Parses config from YAML string (uses default values if some parameters are absent).
    pub fn from_yaml(yaml: &str) -> Result<Self, ForecastError> {
        let raw: RawForecastConfig = serde_yaml::from_str(yaml)?;
        let config = Self::from_raw(raw);
        config.validate()?;
        Ok(config)
    }

    /// Creates config by reading parameter values from YAML file
    /// (uses default values if some parameters are absent).
    pub fn from_file(file_name: &str) -> Result<Self, ForecastError> {
        let yaml = std::fs::read_to_string(file_name).map_err(|source| ForecastError::Io {
            path: file_name.to_string(),
            source,
        })?;
        Self::from_yaml(&yaml)
    }

    /// Checks bucket widths and policy name.
    pub fn validate(&self) -> Result<(), ForecastError> {
        self.bucket_widths()?;
        self.policy_kind()?;
        Ok(())
    }

    /// Returns bucket widths, failing if SLOT is not a positive multiple of the fine width.
    pub fn bucket_widths(&self) -> Result<BucketWidths, ForecastError> {
        let fine = self.fine_bucket_width;
        if !(fine.is_finite() && fine > 0.) {
            return Err(ForecastError::Config(format!("invalid fine bucket width: {}", fine)));
        }
        let ratio = (self.slot_width / fine).round();
        if !self.slot_width.is_finite() || ratio > MAX_SLOT_RATIO as f64 {
            return Err(ForecastError::Config(format!(
                "SLOT width {} is too large for fine bucket width {}",
                self.slot_width, fine
            )));
        }
        if !(ratio >= 1.) || (ratio * fine - self.slot_width).abs() > 1e-9 * self.slot_width.abs().max(1.) {
            return Err(ForecastError::Config(format!(
                "SLOT width {} is not a multiple of fine bucket width {}",
                self.slot_width, fine
            )));
        }
        Ok(BucketWidths::new(fine, ratio as u64))
    }

    /// Returns the default policy.
    pub fn policy_kind(&self) -> Result<PolicyKind, ForecastError> {
        policy_resolver(&self.policy)
    }
}
