use risk_return::analysis::regression::RegressionError;
use risk_return::analysis::{Conclusion, MetricsCalculator, RelationshipModel};
use risk_return::config::Config;
use risk_return::data::loader::DataLoader;
use risk_return::report::plot::ScatterPlot;
use risk_return::report::AnalysisReport;

const FIXTURE: &str = "tests/data/weekly_prices.csv";

#[test]
fn test_full_pipeline_over_fixture() {
    let config = Config::default();

    let (series, summary) = DataLoader::load(FIXTURE).expect("failed to load fixture");
    // 38 data rows: 36 good, one N/A close, one duplicate date.
    assert_eq!(summary.rows_read, 38);
    assert_eq!(summary.rows_rejected, 2);
    assert_eq!(summary.securities, 6);
    for prices in &series {
        assert_eq!(prices.len(), 6);
    }

    let metrics = MetricsCalculator::new(&config.metrics).compute_batch(&series);
    assert_eq!(metrics.len(), 6);
    for m in &metrics {
        assert!(m.annualized_return.is_finite());
        assert!(m.annualized_volatility > 0.0);
        assert!(m.sharpe_ratio.is_some());
    }

    let regression = RelationshipModel::new(&config.model)
        .fit(&metrics)
        .expect("regression failed");
    assert_eq!(regression.n_samples, 6);
    assert!(regression.excluded.is_empty());
    assert!(regression.slope.is_finite());
    let p = regression.p_value.expect("p-value should be defined");
    assert!((0.0..=1.0).contains(&p));
    assert!(regression.correlation.is_some());

    let report = AnalysisReport::new(metrics, regression);
    let text = report.to_string();
    assert!(text.contains("=== Risk/Return Metrics ==="));
    assert!(text.contains("Conclusion:"));
    for ticker in ["AA", "AXP", "BA", "CAT", "CSCO", "DD"] {
        assert!(text.contains(ticker), "report is missing {ticker}");
    }

    let svg = ScatterPlot::new(&report.metrics, &report.regression).render_svg();
    assert_eq!(svg.matches("<circle").count(), 6);
}

#[test]
fn test_pipeline_is_idempotent() {
    let config = Config::default();
    let calculator = MetricsCalculator::new(&config.metrics);

    let (series, _) = DataLoader::load(FIXTURE).expect("failed to load fixture");
    let first = calculator.compute_batch(&series);
    let second = calculator.compute_batch(&series);
    assert_eq!(first, second);

    // Reloading from disk yields the same cleaned table, hence the same metrics.
    let (reloaded, _) = DataLoader::load(FIXTURE).expect("failed to reload fixture");
    assert_eq!(series, reloaded);
}

#[test]
fn test_too_few_securities_aborts_before_plotting() {
    let config = Config::default();

    let (series, _) = DataLoader::load(FIXTURE).expect("failed to load fixture");
    let metrics = MetricsCalculator::new(&config.metrics).compute_batch(&series[..2]);
    assert_eq!(metrics.len(), 2);

    let err = RelationshipModel::new(&config.model)
        .fit(&metrics)
        .unwrap_err();
    assert!(matches!(
        err,
        RegressionError::InsufficientSamples { n: 2, min: 3 }
    ));
}

#[test]
fn test_fixture_conclusion_is_stable() {
    // The fixture numbers are fixed, so the classification must be too.
    // CSCO pairs the highest volatility with a sharply negative return while
    // the other five cluster together, so the fitted line slopes down hard
    // (r is about -0.97, p about 0.002).
    let config = Config::default();
    let (series, _) = DataLoader::load(FIXTURE).expect("failed to load fixture");
    let metrics = MetricsCalculator::new(&config.metrics).compute_batch(&series);
    let regression = RelationshipModel::new(&config.model)
        .fit(&metrics)
        .expect("regression failed");
    assert_eq!(regression.conclusion, Conclusion::Negative);
    assert!(regression.slope < 0.0);
    assert!(regression.p_value.unwrap() < 0.05);
}
