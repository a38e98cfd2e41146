// ABOUTME: Composable capability traits for container engines.
// ABOUTME: Defines ImageOps and ContainerOps plus their shared types.

mod container;
mod image;
mod shared_types;

pub use container::{ContainerError, ContainerOps};
pub use image::{ImageError, ImageOps};
pub use shared_types::*;
