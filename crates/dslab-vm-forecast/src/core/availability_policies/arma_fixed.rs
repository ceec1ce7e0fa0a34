//! Fixed-coefficient forecast policy.

use log::debug;

use crate::core::availability_policies::current::CurrentAvailability;
use crate::core::availability_policies::foar_dual_channel::MIN_SLOTS;
use crate::core::availability_policy::{available_from_forecast, AvailabilityPolicy, EstimatorInput};
use crate::core::decimal::Decimal;
use crate::core::history::Channel;

/// Default weights applied to the coarse utilization series.
pub const UTILIZATION_WEIGHTS: [f64; 2] = [0.667, 0.318];
/// Default weights applied to a channel series.
pub const CHANNEL_WEIGHTS: [f64; 2] = [1.0, 1.0];

/// Forecasts the next value as `w1 * x(t) + w2 * x(t - 1)` with hand-tuned weights, no refitting.
///
/// Without a channel the coarse utilization series is used with one-bucket lookback and the result
/// is not capped. With a channel the lookback is one SLOT over windowed channel maxima, the result
/// is capped by idle PEs and idle PEs are returned until `key >= 3k`.
#[derive(Clone, Debug)]
pub struct ArmaFixed {
    weights: [Decimal; 2],
    channel: Option<Channel>,
}

impl ArmaFixed {
    pub fn new(weights: [f64; 2], channel: Option<Channel>) -> Self {
        Self {
            weights: [Decimal::from_f64(weights[0]), Decimal::from_f64(weights[1])],
            channel,
        }
    }

    pub fn channel(&self) -> Option<Channel> {
        self.channel
    }

    pub fn weights(&self) -> &[Decimal; 2] {
        &self.weights
    }

    fn combine(&self, a: f64, b: f64) -> Decimal {
        let a = Decimal::from_f64(a);
        let b = Decimal::from_f64(b);
        (&(&a * &self.weights[0]) + &(&b * &self.weights[1])).clamp_unit()
    }
}

impl Default for ArmaFixed {
    fn default() -> Self {
        Self::new(UTILIZATION_WEIGHTS, None)
    }
}

impl AvailabilityPolicy for ArmaFixed {
    fn available_pes(&mut self, input: &EstimatorInput) -> u32 {
        match self.channel {
            None => {
                let key = input.widths.slot_bucket(input.time);
                if key < 1 {
                    return CurrentAvailability::estimate(input);
                }
                let history = input.history.coarse();
                let forecast = self.combine(history.value_at(key), history.value_at(key - 1));
                let available = available_from_forecast(&forecast, input.total_pes);
                debug!("fixed ARMA: forecast {}, available {} PEs", forecast, available);
                available
            }
            Some(channel) => {
                let key = input.widths.fine_bucket(input.time);
                let k = input.widths.slot_ratio();
                let now = input.idle();
                if key < k.saturating_mul(MIN_SLOTS) {
                    return now;
                }
                let a = input.history.channel_window_max(channel, key);
                let b = input.history.channel_window_max(channel, key - k);
                let forecast = self.combine(a, b);
                let available = available_from_forecast(&forecast, input.total_pes);
                debug!(
                    "fixed ARMA on {} channel: forecast {}, available {} PEs, idle {} PEs",
                    channel, forecast, available, now
                );
                available.min(now)
            }
        }
    }
}
