use log::SetLoggerError;
use reqwest::StatusCode;
use thiserror::Error;

/// Why a single transfer could not produce a speed.
///
/// Never leaves the sampler: every variant is logged and turned into a zero
/// sample at the `Sampler` boundary.
#[derive(Error, Debug)]
pub enum MeasurementError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("server responded with {0}")]
    Status(StatusCode),

    #[error("transfer finished faster than the clock can measure")]
    ZeroElapsed,
}

/// Failures while setting the program up, before any test runs.
#[derive(Error, Debug)]
pub enum InitializationError {
    #[error("logger initialization error: {0}")]
    Logger(#[from] SetLoggerError),

    #[error("could not open log file: {0}")]
    LogFile(#[from] std::io::Error),

    #[error("HTTP client initialization error: {0}")]
    HttpClient(#[from] reqwest::Error),

    #[error("configuration error: {0}")]
    Config(#[from] config::ConfigError),
}
