use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Download of {url} returned status {status}")]
    Status { url: String, status: u16 },

    #[error("Failed to write downloaded file to {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}
