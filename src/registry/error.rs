// ABOUTME: Error types for registry HTTP calls.
// ABOUTME: Separates transport, status, auth, and decoding failures.

#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("registry returned {status} for {url}: {body}")]
    Status {
        url: String,
        status: u16,
        body: String,
    },

    #[error("registry denied access to {url}")]
    Unauthorized { url: String },

    #[error("unsupported authentication challenge: {0}")]
    InvalidChallenge(String),

    #[error("failed to decode response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: reqwest::Error,
    },
}
