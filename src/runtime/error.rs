// ABOUTME: Engine connection error types with SNAFU pattern.
// ABOUTME: Unifies detection and client construction failures.

use snafu::Snafu;

use super::detection::DetectionError;

/// Failure to obtain an engine client.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum ConnectError {
    #[snafu(display("runtime detection failed: {source}"))]
    Detection { source: DetectionError },

    #[snafu(display("failed to connect to engine at {address}: {source}"))]
    Connection {
        address: String,
        source: bollard::errors::Error,
    },
}

impl From<DetectionError> for ConnectError {
    fn from(source: DetectionError) -> Self {
        ConnectError::Detection { source }
    }
}
