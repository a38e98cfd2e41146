// ABOUTME: Resolution of ranged and wildcard image tags to one concrete tag.
// ABOUTME: Lists candidates local-first under a force policy and picks the most recent.

mod error;
mod source;

pub use error::{ListingError, LocalListingSnafu, NoMatchingTagSnafu, RegistryListingSnafu, ResolveError};
pub use source::{CandidateSource, LocalCandidates, RegistryCandidates};

use crate::types::ImageName;
use snafu::{OptionExt, ResultExt};
use tracing::{debug, info};

/// Picks the single most recent candidate `image` contains.
///
/// `latest` wins outright. Otherwise the first contained candidate is kept
/// until a candidate with a strictly greater version shows up; candidates
/// without a version never replace it. Equal versions keep the earlier one.
pub fn select_most_recent<'a>(
    image: &ImageName,
    candidates: &'a [ImageName],
) -> Option<&'a ImageName> {
    let mut best: Option<&ImageName> = None;

    for candidate in candidates.iter().filter(|c| image.contains(c)) {
        if candidate.is_latest() {
            return Some(candidate);
        }

        let Some(current) = best else {
            best = Some(candidate);
            continue;
        };

        if let (Some(current_version), Some(version)) =
            (current.tag_as_version(), candidate.tag_as_version())
            && version > current_version
        {
            best = Some(candidate);
        }
    }

    best
}

/// Resolves references against a local and a remote candidate source.
pub struct TagResolver<L, R> {
    local: L,
    remote: R,
}

impl<L: CandidateSource, R: CandidateSource> TagResolver<L, R> {
    pub fn new(local: L, remote: R) -> Self {
        Self { local, remote }
    }

    /// Resolve `image` to a concrete tag.
    ///
    /// Exact tags come back unchanged without listing anything. Otherwise
    /// local candidates are used unless there are none or `force` is set,
    /// in which case the registry's list replaces them.
    pub async fn resolve(&self, image: &ImageName, force: bool) -> Result<String, ResolveError> {
        if !image.needs_resolution() {
            return Ok(image.tag().to_string());
        }

        let mut candidates = Vec::new();
        if !force {
            candidates = self
                .local
                .list_candidates(image)
                .await
                .context(LocalListingSnafu {
                    image: image.clone(),
                })?;
        }

        if candidates.is_empty() {
            debug!(image = %image, force, "consulting registry");
            candidates = self
                .remote
                .list_candidates(image)
                .await
                .context(RegistryListingSnafu {
                    image: image.clone(),
                })?;
        }

        let best = select_most_recent(image, &candidates).context(NoMatchingTagSnafu {
            image: image.clone(),
        })?;

        info!(image = %image, tag = %best.tag(), "resolved tag");
        Ok(best.tag().to_string())
    }
}
