use thiserror::Error;

#[derive(Debug, Error)]
pub enum AgentError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse claude output: {source}\n  line: {line}")]
    Parse {
        line: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Process error: {0}")]
    Process(String),

    #[error("Completion timed out after {secs}s")]
    Timeout { secs: u64 },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Completion endpoint returned {status}: {body}")]
    Api { status: u16, body: String },

    #[error("Completion returned no text")]
    EmptyResponse,
}
