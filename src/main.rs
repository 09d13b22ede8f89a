use anyhow::{Context, Result};
use log::info;
use risk_return::analysis::{MetricsCalculator, RelationshipModel};
use risk_return::config::Config;
use risk_return::data::loader::DataLoader;
use risk_return::report::plot::ScatterPlot;
use risk_return::report::AnalysisReport;
use std::env;

fn main() -> Result<()> {
    env_logger::init();

    let data_path = env::args()
        .nth(1)
        .unwrap_or_else(|| "data/dow_jones_index.csv".to_string());
    let config_path = env::args()
        .nth(2)
        .unwrap_or_else(|| "config/analysis.yaml".to_string());

    let config = Config::load_or_default(&config_path)
        .with_context(|| format!("failed to load config from {config_path}"))?;

    info!("loading price data from {data_path}");
    let (series, summary) = DataLoader::load(&data_path)
        .with_context(|| format!("failed to load price data from {data_path}"))?;
    println!(
        "Loaded {} securities ({} rows, {} rejected)",
        summary.securities, summary.rows_read, summary.rows_rejected
    );

    let calculator = MetricsCalculator::new(&config.metrics);
    let metrics = calculator.compute_batch(&series);

    let model = RelationshipModel::new(&config.model);
    let regression = model.fit(&metrics)?;

    let report = AnalysisReport::new(metrics, regression);
    println!();
    print!("{report}");

    let plot = ScatterPlot::new(&report.metrics, &report.regression);
    plot.write_to(&config.report.plot_path)
        .with_context(|| format!("failed to write plot to {}", config.report.plot_path.display()))?;
    println!("\nScatter plot written to {}", config.report.plot_path.display());

    Ok(())
}
