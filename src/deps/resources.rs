//! Bundled fallback copies of well-known interface definitions.
//!
//! User schemas routinely import vendor-provided common types
//! (`google/protobuf/*.proto`) that are not part of their own source
//! tree. Shipping a fallback copy lets the compiler see a consistent
//! version without the user managing those files; the extractor only
//! consults these after the user's own tree, so a user-provided copy
//! always wins.

/// Lookup of bundled interface-definition sources by relative path.
pub trait ResourceSet {
    /// Contents of the bundled file at `rel`, or `None` when the
    /// resource set does not carry it.
    fn read(&self, rel: &str) -> Option<Vec<u8>>;
}

static WELL_KNOWN: &[(&str, &str)] = &[
    (
        "google/protobuf/any.proto",
        include_str!("../../resources/google/protobuf/any.proto"),
    ),
    (
        "google/protobuf/duration.proto",
        include_str!("../../resources/google/protobuf/duration.proto"),
    ),
    (
        "google/protobuf/empty.proto",
        include_str!("../../resources/google/protobuf/empty.proto"),
    ),
    (
        "google/protobuf/timestamp.proto",
        include_str!("../../resources/google/protobuf/timestamp.proto"),
    ),
    (
        "google/protobuf/wrappers.proto",
        include_str!("../../resources/google/protobuf/wrappers.proto"),
    ),
];

/// The resource set compiled into this binary.
#[derive(Debug, Default, Clone, Copy)]
pub struct EmbeddedResources;

impl ResourceSet for EmbeddedResources {
    fn read(&self, rel: &str) -> Option<Vec<u8>> {
        WELL_KNOWN
            .iter()
            .find(|(path, _)| *path == rel)
            .map(|(_, contents)| contents.as_bytes().to_vec())
    }
}
