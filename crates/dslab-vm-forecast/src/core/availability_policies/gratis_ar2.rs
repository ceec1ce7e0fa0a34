//! AR(2) forecast of the VM utilization.

use log::debug;

use crate::core::availability_policies::current::CurrentAvailability;
use crate::core::availability_policy::{available_from_forecast, AvailabilityPolicy, EstimatorInput};
use crate::core::decimal::Decimal;
use crate::core::predictor::ArPredictor;

/// Minimal number of coarse buckets needed to fit the model.
pub const MIN_BUCKETS: usize = 3;

/// Forecasts the VM utilization in the next SLOT with AR(2) model refitted over the whole coarse
/// history on every call, and offers the PEs left by the forecast.
///
/// The result never exceeds the [current availability](CurrentAvailability), so the forecast can only
/// tighten the availability. With less than three SLOTs of history the current availability is returned.
#[derive(Clone, Debug, Default)]
pub struct GratisAr2 {
    predictor: ArPredictor,
}

impl GratisAr2 {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_predictor(predictor: ArPredictor) -> Self {
        Self { predictor }
    }

    pub fn predictor(&self) -> &ArPredictor {
        &self.predictor
    }

    /// Fits the model and returns the clamped forecast, or `None` if the history is too short.
    pub fn forecast(&mut self, input: &EstimatorInput) -> Option<Decimal> {
        let history = input.history.coarse();
        let key = input.widths.slot_bucket(input.time);
        if history.len() < MIN_BUCKETS || key < 2 {
            return None;
        }
        let series: Vec<Decimal> = history.values().iter().map(|x| Decimal::from_f64(*x)).collect();
        self.predictor.fit(&series);
        let a = Decimal::from_f64(history.value_at(key));
        let b = Decimal::from_f64(history.value_at(key - 1));
        let c = Decimal::from_f64(history.value_at(key - 2));
        Some(self.predictor.predict(&a, &b, &c))
    }
}

impl AvailabilityPolicy for GratisAr2 {
    fn available_pes(&mut self, input: &EstimatorInput) -> u32 {
        let now = CurrentAvailability::estimate(input);
        match self.forecast(input) {
            Some(forecast) => {
                let available = available_from_forecast(&forecast, input.total_pes);
                debug!(
                    "gratis AR(2): forecast {}, available {} PEs, current {} PEs",
                    forecast, available, now
                );
                available.min(now)
            }
            None => {
                debug!("gratis AR(2): not enough history, using current availability");
                now
            }
        }
    }
}
