//! Protoforge - a build-time orchestrator for Protocol Buffer code
//! generation.
//!
//! This crate provisions a `protoc` toolchain on demand (download,
//! unpack, configure, make - memoized in a version-keyed cache),
//! resolves transitive `.proto` imports with a bundled
//! well-known-type fallback, decides incrementality from aggregate
//! timestamps, and drives the compiler over the requested files.

pub mod builder;
pub mod core;
pub mod deps;
pub mod ops;
pub mod toolchain;
pub mod util;

/// Test doubles for unit tests.
///
/// This module is only available when compiling tests. It provides a
/// recording process runner and an in-memory resource set.
#[cfg(test)]
pub mod test_support;

pub use crate::core::{Manifest, ProtobufConfig, StalenessMode, TargetLayout};
pub use builder::{CompileDriver, CompileOutcome, CompileRequest, JavaBuildModel};
pub use toolchain::{CacheStore, Provisioner};
