// ABOUTME: Errors from candidate listing and tag resolution.
// ABOUTME: Listing failures name the source that failed; no match is its own case.

use crate::registry::RegistryError;
use crate::runtime::ImageError;
use crate::types::ImageName;
use snafu::Snafu;

/// A candidate source could not produce its list.
#[derive(Debug, thiserror::Error)]
pub enum ListingError {
    #[error(transparent)]
    Engine(#[from] ImageError),

    #[error(transparent)]
    Registry(#[from] RegistryError),
}

/// Failure to turn a ranged reference into one tag.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum ResolveError {
    #[snafu(display("failed to list local images for {image}: {source}"))]
    LocalListing {
        image: ImageName,
        source: ListingError,
    },

    #[snafu(display("failed to list registry tags for {image}: {source}"))]
    RegistryListing {
        image: ImageName,
        source: ListingError,
    },

    #[snafu(display("no tag of {} matches {}", image.name_with_registry(), image.tag()))]
    NoMatchingTag { image: ImageName },
}

impl ResolveError {
    /// True when both sources answered but nothing satisfied the reference.
    pub fn is_no_match(&self) -> bool {
        matches!(self, ResolveError::NoMatchingTag { .. })
    }
}
