pub mod loader;

use chrono::NaiveDate;
use ndarray::Array1;
use thiserror::Error;

/// One validated row of the input dataset.
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    pub ticker: String,
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

/// One security's observations, ordered by date ascending.
///
/// The loader guarantees strictly increasing dates before a series is
/// handed to the metrics stage.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceSeries {
    pub ticker: String,
    pub observations: Vec<Observation>,
}

impl PriceSeries {
    pub fn len(&self) -> usize {
        self.observations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    pub fn closes(&self) -> Array1<f64> {
        self.observations.iter().map(|obs| obs.close).collect()
    }
}

#[derive(Debug, Error)]
pub enum DataError {
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("missing required column: {0}")]
    MissingColumn(String),
    #[error("malformed {field} value {value:?} for {ticker}")]
    MalformedPrice {
        ticker: String,
        field: &'static str,
        value: String,
    },
    #[error("malformed date {value:?} for {ticker}")]
    MalformedDate { ticker: String, value: String },
    #[error("non-positive close {value} for {ticker} on {date}")]
    InvalidClose {
        ticker: String,
        date: NaiveDate,
        value: f64,
    },
    #[error("no valid rows in {0}")]
    EmptyDataset(String),
}

pub type Result<T> = std::result::Result<T, DataError>;
