use thiserror::Error;

#[derive(Error, Debug)]
pub enum DiscoveryError {
    #[error("Scan concurrency must be at least 1")]
    InvalidConcurrency,
    #[error("Failed to create HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),
}
