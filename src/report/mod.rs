pub mod plot;

use crate::analysis::metrics::SecurityMetrics;
use crate::analysis::regression::{Conclusion, RegressionResult};
use std::fmt;

/// Terminal artifact of the pipeline: per-security metrics plus the fitted
/// relationship. Rendering is this module's whole job; the statistical core
/// never touches an output backend.
#[derive(Debug)]
pub struct AnalysisReport {
    pub metrics: Vec<SecurityMetrics>,
    pub regression: RegressionResult,
}

impl AnalysisReport {
    pub fn new(metrics: Vec<SecurityMetrics>, regression: RegressionResult) -> Self {
        Self {
            metrics,
            regression,
        }
    }

    fn conclusion_sentence(&self) -> String {
        let pct = self.regression.significance_level * 100.0;
        match self.regression.conclusion {
            Conclusion::Positive => format!(
                "Higher volatility is associated with higher return at the {pct}% significance level."
            ),
            Conclusion::Negative => format!(
                "Higher volatility is associated with lower return at the {pct}% significance level."
            ),
            Conclusion::NoRelationship => format!(
                "No statistically significant relationship between volatility and return at the {pct}% significance level."
            ),
        }
    }
}

fn optional(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{v:.4}"),
        None => "undefined".to_string(),
    }
}

impl fmt::Display for AnalysisReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== Risk/Return Metrics ===")?;
        writeln!(f)?;
        writeln!(
            f,
            "{:<8} {:>13} {:>17} {:>9}",
            "Ticker", "Ann. Return", "Ann. Volatility", "Sharpe"
        )?;
        writeln!(f, "{:-<50}", "")?;
        for m in &self.metrics {
            let sharpe = match m.sharpe_ratio {
                Some(s) => format!("{s:.2}"),
                None => "n/a".to_string(),
            };
            writeln!(
                f,
                "{:<8} {:>12.2}% {:>16.2}% {:>9}",
                m.ticker,
                m.annualized_return * 100.0,
                m.annualized_volatility * 100.0,
                sharpe
            )?;
        }

        let reg = &self.regression;
        writeln!(f)?;
        writeln!(f, "=== Risk vs. Return Regression ===")?;
        writeln!(f)?;
        if reg.excluded.is_empty() {
            writeln!(f, "Securities in sample: {}", reg.n_samples)?;
        } else {
            writeln!(
                f,
                "Securities in sample: {} (excluded: {})",
                reg.n_samples,
                reg.excluded.join(", ")
            )?;
        }
        writeln!(f, "Slope:       {:.4}", reg.slope)?;
        writeln!(f, "Intercept:   {:.4}", reg.intercept)?;
        writeln!(f, "Correlation: {}", optional(reg.correlation))?;
        writeln!(f, "R-squared:   {}", optional(reg.r_squared()))?;
        writeln!(f, "p-value:     {}", optional(reg.p_value))?;
        writeln!(f)?;
        writeln!(f, "Conclusion: {}", reg.conclusion)?;
        writeln!(f, "{}", self.conclusion_sentence())?;
        Ok(())
    }
}
