use crate::config::MetricsSettings;
use crate::data::PriceSeries;
use log::{debug, warn};
use ndarray::{Array1, ArrayView1};
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MetricsError {
    #[error("insufficient data for {ticker}: {n_obs} observation(s), need at least 2")]
    InsufficientData { ticker: String, n_obs: usize },
}

pub type Result<T> = std::result::Result<T, MetricsError>;

/// Period-over-period returns derived from one security's closes.
#[derive(Debug, Clone)]
pub struct ReturnSeries {
    pub ticker: String,
    returns: Array1<f64>,
}

impl ReturnSeries {
    /// Simple period return at each step: (close_t - close_{t-1}) / close_{t-1}.
    pub fn from_prices(prices: &PriceSeries) -> Result<Self> {
        if prices.len() < 2 {
            return Err(MetricsError::InsufficientData {
                ticker: prices.ticker.clone(),
                n_obs: prices.len(),
            });
        }

        let closes = prices.closes();
        let mut returns = Array1::zeros(closes.len() - 1);
        for i in 1..closes.len() {
            returns[i - 1] = (closes[i] - closes[i - 1]) / closes[i - 1];
        }

        Ok(Self {
            ticker: prices.ticker.clone(),
            returns,
        })
    }

    pub fn len(&self) -> usize {
        self.returns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.returns.is_empty()
    }

    pub fn values(&self) -> ArrayView1<'_, f64> {
        self.returns.view()
    }

    pub fn mean(&self) -> f64 {
        self.returns.mean().unwrap_or(0.0)
    }

    /// Sample standard deviation (n - 1 denominator). A single return has no
    /// spread to estimate, so it is reported as exactly 0, which routes the
    /// security into the zero-variance handling downstream.
    pub fn sample_std(&self) -> f64 {
        if self.returns.len() < 2 {
            return 0.0;
        }
        self.returns.std(1.0)
    }
}

/// Annualized risk/return figures for one security. Immutable once computed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SecurityMetrics {
    pub ticker: String,
    pub annualized_return: f64,
    pub annualized_volatility: f64,
    /// None when volatility is zero; a ratio against no risk is undefined.
    pub sharpe_ratio: Option<f64>,
}

pub struct MetricsCalculator {
    periods_per_year: f64,
    risk_free_rate: f64,
}

impl MetricsCalculator {
    pub fn new(settings: &MetricsSettings) -> Self {
        Self {
            periods_per_year: settings.periods_per_year,
            risk_free_rate: settings.risk_free_rate,
        }
    }

    /// Annualize one security's return series.
    ///
    /// Mean return scales linearly with the periods-per-year factor; the
    /// standard deviation scales with its square root (variance is what
    /// aggregates over time).
    pub fn compute(&self, prices: &PriceSeries) -> Result<SecurityMetrics> {
        let returns = ReturnSeries::from_prices(prices)?;

        let annualized_return = returns.mean() * self.periods_per_year;
        let annualized_volatility = returns.sample_std() * self.periods_per_year.sqrt();
        let sharpe_ratio = (annualized_volatility > 0.0)
            .then(|| (annualized_return - self.risk_free_rate) / annualized_volatility);

        debug!(
            "{}: {} returns, annualized return {:.4}, annualized volatility {:.4}",
            returns.ticker,
            returns.len(),
            annualized_return,
            annualized_volatility
        );

        Ok(SecurityMetrics {
            ticker: returns.ticker,
            annualized_return,
            annualized_volatility,
            sharpe_ratio,
        })
    }

    /// Compute metrics for every security, excluding (and logging) the ones
    /// with too little data. One thin series never sinks the batch.
    pub fn compute_batch(&self, series: &[PriceSeries]) -> Vec<SecurityMetrics> {
        let mut metrics = Vec::with_capacity(series.len());
        for prices in series {
            match self.compute(prices) {
                Ok(m) => metrics.push(m),
                Err(err) => warn!("excluding security from analysis: {err}"),
            }
        }
        metrics
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Observation;
    use approx::assert_relative_eq;
    use chrono::NaiveDate;

    fn series(ticker: &str, closes: &[f64]) -> PriceSeries {
        let start = NaiveDate::from_ymd_opt(2011, 1, 7).unwrap();
        let observations = closes
            .iter()
            .enumerate()
            .map(|(i, &close)| Observation {
                ticker: ticker.to_string(),
                date: start + chrono::Duration::weeks(i as i64),
                open: close,
                high: close * 1.01,
                low: close * 0.99,
                close,
                volume: 1_000_000.0,
            })
            .collect();
        PriceSeries {
            ticker: ticker.to_string(),
            observations,
        }
    }

    fn settings(periods_per_year: f64, risk_free_rate: f64) -> MetricsSettings {
        MetricsSettings {
            periods_per_year,
            risk_free_rate,
        }
    }

    #[test]
    fn test_return_series_values() {
        let returns = ReturnSeries::from_prices(&series("AA", &[10.0, 11.0, 9.9])).unwrap();
        assert_eq!(returns.len(), 2);
        assert_relative_eq!(returns.values()[0], 0.10, epsilon = 1e-12);
        assert_relative_eq!(returns.values()[1], -0.10, epsilon = 1e-12);
    }

    #[test]
    fn test_return_series_needs_two_observations() {
        let err = ReturnSeries::from_prices(&series("AA", &[10.0])).unwrap_err();
        assert!(matches!(
            err,
            MetricsError::InsufficientData { n_obs: 1, .. }
        ));
    }

    #[test]
    fn test_annualization_scaling() {
        let prices = series("AA", &[10.0, 10.5, 10.2, 11.0, 10.8]);
        let weekly = MetricsCalculator::new(&settings(52.0, 0.0))
            .compute(&prices)
            .unwrap();
        let doubled = MetricsCalculator::new(&settings(104.0, 0.0))
            .compute(&prices)
            .unwrap();

        assert_relative_eq!(
            doubled.annualized_return,
            2.0 * weekly.annualized_return,
            max_relative = 1e-12
        );
        assert_relative_eq!(
            doubled.annualized_volatility,
            2.0_f64.sqrt() * weekly.annualized_volatility,
            max_relative = 1e-12
        );
    }

    #[test]
    fn test_constant_closes_have_zero_volatility() {
        let metrics = MetricsCalculator::new(&settings(52.0, 0.02))
            .compute(&series("AA", &[30.0, 30.0, 30.0, 30.0]))
            .unwrap();
        assert_relative_eq!(metrics.annualized_volatility, 0.0);
        assert_relative_eq!(metrics.annualized_return, 0.0);
        assert_eq!(metrics.sharpe_ratio, None);
    }

    #[test]
    fn test_sharpe_ratio_definition() {
        let metrics = MetricsCalculator::new(&settings(52.0, 0.02))
            .compute(&series("AA", &[10.0, 10.5, 10.2, 11.0, 10.8]))
            .unwrap();
        let sharpe = metrics.sharpe_ratio.unwrap();
        assert_relative_eq!(
            sharpe,
            (metrics.annualized_return - 0.02) / metrics.annualized_volatility,
            max_relative = 1e-12
        );
    }

    #[test]
    fn test_compute_batch_absorbs_thin_series() {
        let calculator = MetricsCalculator::new(&settings(52.0, 0.02));
        let batch = vec![
            series("AA", &[10.0, 10.5, 10.2]),
            series("BA", &[69.0]),
            series("CAT", &[93.0, 94.0, 95.5]),
        ];
        let metrics = calculator.compute_batch(&batch);
        assert_eq!(metrics.len(), 2);
        assert_eq!(metrics[0].ticker, "AA");
        assert_eq!(metrics[1].ticker, "CAT");
    }

    #[test]
    fn test_metrics_are_idempotent() {
        let calculator = MetricsCalculator::new(&settings(52.0, 0.02));
        let prices = series("AA", &[16.42, 15.97, 15.79, 16.13, 17.14]);
        let first = calculator.compute(&prices).unwrap();
        let second = calculator.compute(&prices).unwrap();
        assert_eq!(first, second);
    }
}
