use thiserror::Error;

#[derive(Debug, Error)]
pub enum PairingError {
    #[error("not initialized: run 'pairing init'")]
    NotInitialized,

    #[error("no manager found for {actor}: directory access token missing or expired?")]
    MissingManager { actor: String },

    #[error("directory lookup failed for {actor}: {message}")]
    Directory { actor: String, message: String },

    #[error("oracle failed in round {round}: {message}")]
    Oracle { round: usize, message: String },

    #[error("unparsable oracle response in round {round}: {message}")]
    UnparsableResponse { round: usize, message: String },

    #[error("invalid config: {0}")]
    InvalidConfig(String),

    #[error("unsupported file format '{0}': expected .json, .yaml or .yml")]
    UnsupportedFormat(String),

    #[error("population file not found: {0}")]
    PopulationNotFound(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

pub type Result<T> = std::result::Result<T, PairingError>;
