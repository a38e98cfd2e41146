// ABOUTME: Container engine access for Docker and Podman.
// ABOUTME: Capability traits, the bollard implementation, and local detection.

mod bollard;
mod detection;
mod error;
pub mod traits;

pub use self::bollard::BollardEngine;
pub use detection::{DetectionError, RuntimeInfo, RuntimeType, detect_local};
pub use error::ConnectError;
pub use traits::*;
