use super::metrics::SecurityMetrics;
use crate::config::ModelSettings;
use log::warn;
use serde::Serialize;
use statrs::distribution::{ContinuousCDF, StudentsT};
use std::fmt;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RegressionError {
    #[error("insufficient samples: {n} securities with usable metrics, need at least {min}")]
    InsufficientSamples { n: usize, min: usize },
}

pub type Result<T> = std::result::Result<T, RegressionError>;

/// Answer to the research question: is higher risk associated with higher
/// return across the index constituents?
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Conclusion {
    Positive,
    Negative,
    NoRelationship,
}

impl fmt::Display for Conclusion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Conclusion::Positive => "POSITIVE",
            Conclusion::Negative => "NEGATIVE",
            Conclusion::NoRelationship => "NO_RELATIONSHIP",
        };
        write!(f, "{label}")
    }
}

/// Fitted line and test statistics for return regressed on volatility.
///
/// `correlation` and `p_value` are None when the sample is degenerate
/// (no spread in the predictor or the response); the conclusion then
/// falls back to NoRelationship instead of surfacing NaN.
#[derive(Debug, Clone, Serialize)]
pub struct RegressionResult {
    pub slope: f64,
    pub intercept: f64,
    pub correlation: Option<f64>,
    pub p_value: Option<f64>,
    pub n_samples: usize,
    /// Tickers left out of the regression domain (zero or non-finite volatility).
    pub excluded: Vec<String>,
    pub significance_level: f64,
    pub conclusion: Conclusion,
}

impl RegressionResult {
    pub fn r_squared(&self) -> Option<f64> {
        self.correlation.map(|r| r * r)
    }
}

pub struct RelationshipModel {
    significance_level: f64,
    min_samples: usize,
}

impl RelationshipModel {
    pub fn new(settings: &ModelSettings) -> Self {
        Self {
            significance_level: settings.significance_level,
            min_samples: settings.min_securities,
        }
    }

    /// Ordinary least squares of annualized return on annualized volatility,
    /// with the Pearson correlation and its two-sided significance.
    pub fn fit(&self, metrics: &[SecurityMetrics]) -> Result<RegressionResult> {
        let mut xs = Vec::with_capacity(metrics.len());
        let mut ys = Vec::with_capacity(metrics.len());
        let mut excluded = Vec::new();

        for m in metrics {
            let usable = m.annualized_volatility.is_finite()
                && m.annualized_volatility > 0.0
                && m.annualized_return.is_finite();
            if usable {
                xs.push(m.annualized_volatility);
                ys.push(m.annualized_return);
            } else {
                warn!(
                    "excluding {} from regression: zero or non-finite volatility",
                    m.ticker
                );
                excluded.push(m.ticker.clone());
            }
        }

        let n = xs.len();
        if n < self.min_samples {
            return Err(RegressionError::InsufficientSamples {
                n,
                min: self.min_samples,
            });
        }

        let mean_x = xs.iter().sum::<f64>() / n as f64;
        let mean_y = ys.iter().sum::<f64>() / n as f64;
        let sxx: f64 = xs.iter().map(|&x| (x - mean_x).powi(2)).sum();
        let syy: f64 = ys.iter().map(|&y| (y - mean_y).powi(2)).sum();
        let sxy: f64 = xs
            .iter()
            .zip(ys.iter())
            .map(|(&x, &y)| (x - mean_x) * (y - mean_y))
            .sum();

        if sxx == 0.0 {
            // Every usable volatility is identical; the slope is indeterminate.
            warn!("predictor has no spread across {n} securities, fit is undefined");
            return Ok(RegressionResult {
                slope: 0.0,
                intercept: mean_y,
                correlation: None,
                p_value: None,
                n_samples: n,
                excluded,
                significance_level: self.significance_level,
                conclusion: Conclusion::NoRelationship,
            });
        }

        let slope = sxy / sxx;
        let intercept = mean_y - slope * mean_x;
        let correlation = (syy > 0.0).then(|| sxy / (sxx.sqrt() * syy.sqrt()));
        let p_value = correlation.and_then(|r| p_value(r, n));
        let conclusion = self.classify(slope, p_value);

        Ok(RegressionResult {
            slope,
            intercept,
            correlation,
            p_value,
            n_samples: n,
            excluded,
            significance_level: self.significance_level,
            conclusion,
        })
    }

    fn classify(&self, slope: f64, p_value: Option<f64>) -> Conclusion {
        match p_value {
            Some(p) if p < self.significance_level && slope > 0.0 => Conclusion::Positive,
            Some(p) if p < self.significance_level && slope < 0.0 => Conclusion::Negative,
            _ => Conclusion::NoRelationship,
        }
    }
}

/// Two-sided p-value for the null hypothesis of zero correlation, from the
/// t statistic r * sqrt((n - 2) / (1 - r^2)) with n - 2 degrees of freedom.
fn p_value(r: f64, n: usize) -> Option<f64> {
    let df = (n - 2) as f64;
    let denom = 1.0 - r * r;
    if denom <= 1e-12 {
        // Perfectly collinear sample (up to rounding); the t statistic diverges.
        return Some(0.0);
    }
    let t = r * (df / denom).sqrt();
    let dist = StudentsT::new(0.0, 1.0, df).ok()?;
    Some(2.0 * (1.0 - dist.cdf(t.abs())))
}
