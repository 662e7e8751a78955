use thiserror::Error;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("URL does not point at a supported paste service: {0}")]
    UnsupportedUrl(String),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("response exceeds the {limit} byte limit")]
    TooLarge { limit: u64 },

    #[error("paste service response carries no log content")]
    MalformedResponse,

    #[error("document is empty")]
    EmptyDocument,

    #[error("failed to read log file: {0}")]
    Io(#[from] std::io::Error),
}

pub type FetchResult<T> = Result<T, FetchError>;
