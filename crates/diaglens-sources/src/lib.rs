// Sources layer - bundle access, format parsers, snapshot assembly
// Sits between raw diagnostic bundles and the evaluation engine

pub mod archive;
pub mod builder;
pub mod error;
pub mod extract;
pub mod jsonpath;
pub mod logscan;
pub mod table;

pub use archive::{DiagnosticArchive, DirBundle, ExtractLimits, ZipBundle, open_bundle};
pub use builder::SnapshotBuilder;
pub use error::{ArchiveError, ParseError, Result};
pub use extract::{SourceExtractor, SourceSet};
pub use jsonpath::{EntityPaths, JsonPathExtractor, Scalar, TargetKind};
pub use logscan::{LogEvent, LogScanner, Scan};
pub use table::{TableParser, TableRecord};

use diaglens_types::ClusterSnapshot;
use std::path::Path;

/// Open a bundle at `path` (ZIP or extracted directory) and build its
/// snapshot.
///
/// Archive-level failures are fatal; per-source parse failures degrade
/// into snapshot warnings.
pub fn snapshot_from_path(path: &Path, limits: ExtractLimits) -> Result<ClusterSnapshot> {
    let mut archive = open_bundle(path, limits)?;
    let sources = SourceExtractor::extract(archive.as_mut())?;
    Ok(SnapshotBuilder::from_sources(&sources))
}
