use super::{DataError, Observation, PriceSeries, Result};
use chrono::NaiveDate;
use csv::ReaderBuilder;
use log::warn;
use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use std::path::Path;

const REQUIRED_COLUMNS: [&str; 7] = ["stock", "date", "open", "high", "low", "close", "volume"];
const DATE_FORMATS: [&str; 2] = ["%m/%d/%Y", "%Y-%m-%d"];

/// Raw CSV row before cleaning. Price fields arrive as decorated currency
/// strings ("$16.42"), so everything is deserialized as text and validated
/// in one place.
#[derive(Debug, Deserialize)]
struct RawRecord {
    stock: String,
    date: String,
    open: String,
    high: String,
    low: String,
    close: String,
    volume: String,
}

impl RawRecord {
    fn parse(&self) -> Result<Observation> {
        let ticker = self.stock.trim().to_uppercase();
        let date = parse_date(&ticker, &self.date)?;
        let open = parse_numeric(&ticker, "open", &self.open)?;
        let high = parse_numeric(&ticker, "high", &self.high)?;
        let low = parse_numeric(&ticker, "low", &self.low)?;
        let close = parse_numeric(&ticker, "close", &self.close)?;
        let volume = parse_numeric(&ticker, "volume", &self.volume)?;

        if close <= 0.0 {
            return Err(DataError::InvalidClose {
                ticker,
                date,
                value: close,
            });
        }

        Ok(Observation {
            ticker,
            date,
            open,
            high,
            low,
            close,
            volume,
        })
    }
}

/// Strip currency decoration ("$", thousands separators, whitespace) and
/// parse the remainder as a finite number.
fn parse_numeric(ticker: &str, field: &'static str, value: &str) -> Result<f64> {
    let cleaned = value.trim().trim_start_matches('$').replace(',', "");
    match cleaned.parse::<f64>() {
        Ok(parsed) if parsed.is_finite() => Ok(parsed),
        _ => Err(DataError::MalformedPrice {
            ticker: ticker.to_string(),
            field,
            value: value.to_string(),
        }),
    }
}

fn parse_date(ticker: &str, value: &str) -> Result<NaiveDate> {
    let trimmed = value.trim();
    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(trimmed, format) {
            return Ok(date);
        }
    }
    Err(DataError::MalformedDate {
        ticker: ticker.to_string(),
        value: value.to_string(),
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadSummary {
    pub rows_read: usize,
    pub rows_rejected: usize,
    pub securities: usize,
}

pub struct DataLoader;

impl DataLoader {
    fn verify_required_columns(headers: &[String]) -> Result<()> {
        let headers_set: HashSet<_> = headers.iter().map(|s| s.to_lowercase()).collect();

        for column in REQUIRED_COLUMNS {
            if !headers_set.contains(column) {
                return Err(DataError::MissingColumn(column.to_string()));
            }
        }
        Ok(())
    }

    /// Load the dataset and produce one date-ordered price series per ticker.
    ///
    /// Malformed rows are rejected and logged, never fatal: the remaining
    /// securities must still be analyzable when a few rows are bad. Only an
    /// unreadable file, a missing column, or a dataset with no valid rows
    /// at all aborts the load.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<(Vec<PriceSeries>, LoadSummary)> {
        let mut rdr = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_path(&path)?;

        let headers: Vec<String> = rdr.headers()?.iter().map(|s| s.to_string()).collect();
        Self::verify_required_columns(&headers)?;

        let mut by_ticker: HashMap<String, Vec<Observation>> = HashMap::new();
        let mut rows_read = 0;
        let mut rows_rejected = 0;

        for result in rdr.deserialize() {
            rows_read += 1;
            let raw: RawRecord = match result {
                Ok(record) => record,
                Err(err) => {
                    warn!("skipping unreadable row: {err}");
                    rows_rejected += 1;
                    continue;
                }
            };
            match raw.parse() {
                Ok(obs) => by_ticker.entry(obs.ticker.clone()).or_default().push(obs),
                Err(err) => {
                    warn!("skipping row: {err}");
                    rows_rejected += 1;
                }
            }
        }

        if by_ticker.is_empty() {
            return Err(DataError::EmptyDataset(
                path.as_ref().display().to_string(),
            ));
        }

        // Sort each ticker's rows by date and drop duplicate dates (keep the
        // first), so dates are strictly increasing within every series.
        let mut tickers: Vec<_> = by_ticker.keys().cloned().collect();
        tickers.sort();

        let mut series = Vec::with_capacity(tickers.len());
        for ticker in tickers {
            let mut observations = by_ticker.remove(&ticker).unwrap_or_default();
            observations.sort_by(|a, b| a.date.cmp(&b.date));
            observations.dedup_by(|dup, kept| {
                if dup.date == kept.date {
                    warn!("duplicate date {} for {ticker}, keeping first row", dup.date);
                    rows_rejected += 1;
                    true
                } else {
                    false
                }
            });
            series.push(PriceSeries {
                ticker,
                observations,
            });
        }

        let summary = LoadSummary {
            rows_read,
            rows_rejected,
            securities: series.len(),
        };
        Ok((series, summary))
    }
}
