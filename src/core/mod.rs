//! Core data model: the project manifest and the output layout.

pub mod config;
pub mod layout;

pub use config::{Manifest, ManifestError, ProtobufConfig, StalenessMode};
pub use layout::TargetLayout;
