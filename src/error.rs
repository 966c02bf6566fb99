use thiserror::Error;

#[derive(Error, Debug)]
pub enum DashError {
    #[error("Failed to fetch {url}: HTTP {status}")]
    Fetch {
        url: String,
        status: reqwest::StatusCode,
    },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Malformed status document: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Missing field '{field}' for system '{system}'")]
    MissingField { system: String, field: &'static str },

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, DashError>;
