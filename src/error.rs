use thiserror::Error;

#[derive(Debug, Error)]
pub enum IrrigatorError {
    #[error("unknown location '{0}'")]
    UnknownLocation(String),

    #[error("forecast has {dates} dates but {probabilities} precipitation probabilities")]
    ForecastShape { dates: usize, probabilities: usize },

    #[error("home directory not found: set HOME environment variable")]
    HomeNotFound,

    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, IrrigatorError>;
