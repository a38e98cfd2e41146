// ABOUTME: Type-safe identifiers and validated domain types.
// ABOUTME: Image names with tag constraints plus phantom-typed engine IDs.

mod id;
mod image_name;

pub use id::{ContainerId, ImageId};
pub use image_name::{
    ImageName, LATEST, ParseImageNameError, TagConstraint, WILDCARD, parse_version,
};
