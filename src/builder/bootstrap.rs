//! Self-compile of the toolchain's descriptor schema.
//!
//! The protobuf core library is the one project that cannot import its
//! reflective metadata format from anywhere: `descriptor.proto` lives
//! in the toolchain source tree, and its generated bindings must land
//! in that tree's own Java source directory before general-purpose
//! compilation proceeds. Only the fetch/unpack half of provisioning is
//! needed here; the built compiler is ensured by the caller.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::builder::{CompileDriver, CompileRequest, Downstream};
use crate::core::ProtobufConfig;
use crate::toolchain::Provisioner;
use crate::util::fs as fsutil;

/// The reflective schema definition inside the toolchain source tree.
pub const DESCRIPTOR_PROTO: &str = "google/protobuf/descriptor.proto";

/// Java source directory inside the fetched toolchain tree that
/// receives the descriptor bindings.
pub const BOOTSTRAP_JAVA_SRC: &str = "java/src/main/java";

/// Seed the project's own generated-binding namespace from the fetched
/// toolchain source tree.
pub fn bootstrap_descriptor(
    provisioner: &Provisioner<'_>,
    config: &ProtobufConfig,
    proto_root: &Path,
    driver: &CompileDriver<'_>,
    downstream: &mut dyn Downstream,
) -> Result<()> {
    let srcdir = provisioner.ensure_source(config)?;

    let bundled = srcdir.join("src").join(DESCRIPTOR_PROTO);
    let local = proto_root.join(DESCRIPTOR_PROTO);
    let copied = fsutil::copy_if_newer(&bundled, &local)
        .with_context(|| format!("failed to stage {DESCRIPTOR_PROTO} into the proto root"))?;
    if copied {
        tracing::info!("staged {DESCRIPTOR_PROTO} from the toolchain source tree");
    }

    let req = CompileRequest::new(vec![PathBuf::from(DESCRIPTOR_PROTO)])
        .with_generated_dir(srcdir.join(BOOTSTRAP_JAVA_SRC))
        .without_downstream();
    driver.compile(&req, downstream)?;
    Ok(())
}
