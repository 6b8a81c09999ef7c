use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("font error: {0}")]
    Font(String),

    #[error("image error: {0}")]
    Image(String),

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("mail dispatch failed: {0}")]
    Mail(String),

    #[error("dossier store error: {0}")]
    Store(String),

    #[error("workflow {endpoint} failed with status {status}: {message}")]
    Workflow {
        status: u16,
        endpoint: String,
        message: String,
    },

    #[error("configuration error: {0}")]
    Config(String),
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Error::Http(e.to_string())
    }
}
