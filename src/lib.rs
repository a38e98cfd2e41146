// ABOUTME: Library root for tagpull - image tag resolution and streaming pulls.
// ABOUTME: The main binary is in main.rs.

pub mod bridge;
pub mod config;
pub mod error;
pub mod progress;
pub mod pull;
pub mod registry;
pub mod resolve;
pub mod runtime;
pub mod types;
