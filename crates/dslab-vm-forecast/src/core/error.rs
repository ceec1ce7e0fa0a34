//! Error type of the crate.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ForecastError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("invalid product usage entry for bucket {bucket}: {value}")]
    InvalidProductUsage { bucket: u64, value: f64 },

    #[error("configuration error: {0}")]
    Config(String),
}
