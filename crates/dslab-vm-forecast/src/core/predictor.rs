//! Order-2 autoregressive model fitted with Yule-Walker moment estimation.

use log::trace;

use crate::core::decimal::Decimal;

/// Coefficients of the AR(2) model.
#[derive(Clone, Debug, PartialEq)]
pub struct ArCoefficients {
    pub phi1: Decimal,
    pub phi2: Decimal,
}

impl Default for ArCoefficients {
    fn default() -> Self {
        Self {
            phi1: Decimal::new(-509, 3),
            phi2: Decimal::new(-21, 2),
        }
    }
}

/// Sample moments used by the Yule-Walker equations.
#[derive(Clone, Debug, PartialEq)]
pub struct SampleMoments {
    pub mean: Decimal,
    pub variance: Decimal,
    pub r0: Decimal,
    pub r1: Decimal,
    pub r2: Decimal,
}

impl SampleMoments {
    /// Computes the moments of a series with at least 3 samples.
    ///
    /// Note that `r0` is `mean + variance` rather than the plain variance.
    pub fn of(series: &[Decimal]) -> Option<Self> {
        if series.len() < 3 {
            return None;
        }
        let n = Decimal::from(series.len() as u64);
        let mean = series.iter().cloned().sum::<Decimal>().div(&n);
        let centered: Vec<Decimal> = series.iter().map(|x| x - &mean).collect();

        let variance = centered.iter().map(|x| x * x).sum::<Decimal>().div(&n);
        let r0 = &mean + &variance;
        let r1 = lagged_sum(&centered, 1).div(&Decimal::from(series.len() as u64 - 1));
        let r2 = lagged_sum(&centered, 2).div(&Decimal::from(series.len() as u64 - 2));
        Some(Self {
            mean,
            variance,
            r0,
            r1,
            r2,
        })
    }

    /// Solves the Yule-Walker equations.
    ///
    /// When the denominator `r0^2 - r1^2` is exactly zero, the numerators are returned as is.
    pub fn solve(&self) -> ArCoefficients {
        let (r0, r1, r2) = (&self.r0, &self.r1, &self.r2);
        let denominator = &(r0 * r0) - &(r1 * r1);
        let num1 = &(r1 * r0) - &(r1 * r2);
        let num2 = &(r0 * r2) - &(r1 * r1);
        if denominator.is_zero() {
            return ArCoefficients { phi1: num1, phi2: num2 };
        }
        ArCoefficients {
            phi1: num1.div(&denominator),
            phi2: num2.div(&denominator),
        }
    }
}

fn lagged_sum(centered: &[Decimal], lag: usize) -> Decimal {
    centered
        .iter()
        .zip(centered.iter().skip(lag))
        .map(|(x, y)| x * y)
        .sum()
}

/// AR(2) predictor owning its current coefficients.
///
/// Every fit replaces the coefficients using the whole series passed in, so the predictor always
/// reflects the last fitted prefix of the history.
#[derive(Clone, Debug, Default)]
pub struct ArPredictor {
    coefficients: ArCoefficients,
    fits: u64,
}

impl ArPredictor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates predictor with the given initial coefficients.
    pub fn with_coefficients(coefficients: ArCoefficients) -> Self {
        Self { coefficients, fits: 0 }
    }

    pub fn coefficients(&self) -> &ArCoefficients {
        &self.coefficients
    }

    /// Number of successful fits so far.
    pub fn fits(&self) -> u64 {
        self.fits
    }

    /// Refits the coefficients over the series. Series shorter than 3 samples keep the old ones.
    pub fn fit(&mut self, series: &[Decimal]) -> &ArCoefficients {
        if let Some(moments) = SampleMoments::of(series) {
            self.coefficients = moments.solve();
            self.fits += 1;
            trace!(
                "AR(2) refit over {} samples: phi1 = {}, phi2 = {}",
                series.len(),
                self.coefficients.phi1,
                self.coefficients.phi2
            );
        }
        &self.coefficients
    }

    /// Fits the model over float samples converted to decimals.
    pub fn fit_f64(&mut self, series: &[f64]) -> &ArCoefficients {
        let series: Vec<Decimal> = series.iter().map(|x| Decimal::from_f64(*x)).collect();
        self.fit(&series)
    }

    /// Forecasts the next value from the values at `t` (`a`), `t - 1` (`b`) and `t - 2` (`c`):
    /// `a * (phi1 + 1) + b * (phi2 - phi1) - c * phi2`, clamped to `[0, 1]`.
    pub fn predict(&self, a: &Decimal, b: &Decimal, c: &Decimal) -> Decimal {
        let ArCoefficients { phi1, phi2 } = &self.coefficients;
        let forecast = &(&(a * &(phi1 + &Decimal::one())) + &(b * &(phi2 - phi1))) - &(c * phi2);
        forecast.clamp_unit()
    }
}
