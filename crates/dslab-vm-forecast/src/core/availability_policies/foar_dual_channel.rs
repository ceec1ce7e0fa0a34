//! AR(2) forecast over a selectable data channel.

use log::debug;

use crate::core::availability_policy::{available_from_forecast, AvailabilityPolicy, EstimatorInput};
use crate::core::bucket::TimeBucket;
use crate::core::decimal::Decimal;
use crate::core::history::{Channel, VmHistory};
use crate::core::predictor::ArPredictor;

/// Number of SLOTs of channel history required for forecasting.
pub const MIN_SLOTS: u64 = 3;

/// Forecasts the next SLOT of the selected channel (own busy PEs or product workload PEs).
///
/// The channel is recorded at the fine bucket width and aggregated into SLOT windows by windowed maximum,
/// so the model steps one SLOT (`k` fine buckets) at a time. The series used for fitting consists of the
/// windows anchored at `key - j * k` for `j = key / k, ..., 1, 0`. Until `key >= 3k` idle PEs are returned.
/// The result never exceeds idle PEs.
#[derive(Clone, Debug)]
pub struct FoarDualChannel {
    channel: Channel,
    predictor: ArPredictor,
}

impl FoarDualChannel {
    pub fn new(channel: Channel) -> Self {
        Self {
            channel,
            predictor: ArPredictor::new(),
        }
    }

    pub fn channel(&self) -> Channel {
        self.channel
    }

    pub fn predictor(&self) -> &ArPredictor {
        &self.predictor
    }

    /// SLOT-aligned windowed maxima ending at `key`, oldest first.
    pub fn slot_series(history: &VmHistory, channel: Channel, key: TimeBucket) -> Vec<Decimal> {
        let k = history.widths().slot_ratio();
        (0..=key / k)
            .rev()
            .map(|j| Decimal::from_f64(history.channel_window_max(channel, key - j * k)))
            .collect()
    }

    /// Fits the model and returns the clamped forecast, or `None` if the history is too short.
    pub fn forecast(&mut self, input: &EstimatorInput) -> Option<Decimal> {
        let key = input.widths.fine_bucket(input.time);
        let k = input.widths.slot_ratio();
        if key < k.saturating_mul(MIN_SLOTS) {
            return None;
        }
        let channel = self.channel;
        let series = Self::slot_series(input.history, channel, key);
        self.predictor.fit(&series);
        let window = |bucket| Decimal::from_f64(input.history.channel_window_max(channel, bucket));
        let (a, b, c) = (window(key), window(key - k), window(key - 2 * k));
        Some(self.predictor.predict(&a, &b, &c))
    }
}

impl AvailabilityPolicy for FoarDualChannel {
    fn available_pes(&mut self, input: &EstimatorInput) -> u32 {
        let now = input.idle();
        match self.forecast(input) {
            Some(forecast) => {
                let available = available_from_forecast(&forecast, input.total_pes);
                debug!(
                    "FOAR on {} channel: forecast {}, available {} PEs, idle {} PEs",
                    self.channel, forecast, available, now
                );
                available.min(now)
            }
            None => now,
        }
    }
}
