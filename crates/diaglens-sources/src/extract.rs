use crate::archive::DiagnosticArchive;
use crate::error::Result;
use std::collections::BTreeMap;
use tracing::debug;

/// Logical source contents pulled out of a bundle.
///
/// Keys are logical source names, not paths: tabular sources keep their
/// file stem ("cat_health"), JSON dumps their stem ("nodes",
/// "indices_stats", "manifest"), logs their stem under `logs/` ("gc",
/// "server"). Absent keys mean the bundle simply did not carry that
/// source.
#[derive(Debug, Default)]
pub struct SourceSet {
    pub tables: BTreeMap<String, String>,
    pub json: BTreeMap<String, String>,
    pub logs: BTreeMap<String, String>,
}

impl SourceSet {
    pub fn table(&self, name: &str) -> Option<&str> {
        self.tables.get(name).map(String::as_str)
    }

    pub fn json(&self, name: &str) -> Option<&str> {
        self.json.get(name).map(String::as_str)
    }
}

/// Maps physical bundle entries to logical source names.
pub struct SourceExtractor;

impl SourceExtractor {
    /// Pull every recognized source out of `archive`.
    ///
    /// Unrecognized entries are skipped; read failures at this level are
    /// bundle-level failures and abort the run.
    pub fn extract(archive: &mut dyn DiagnosticArchive) -> Result<SourceSet> {
        let mut sources = SourceSet::default();

        for name in archive.entry_names() {
            let Some((kind, key)) = classify(&name) else {
                debug!(entry = %name, "skipping unrecognized bundle entry");
                continue;
            };

            let bytes = archive.read(&name)?;
            let text = String::from_utf8_lossy(&bytes).into_owned();
            match kind {
                SourceKind::Table => sources.tables.insert(key, text),
                SourceKind::Json => sources.json.insert(key, text),
                SourceKind::Log => sources.logs.insert(key, text),
            };
        }

        Ok(sources)
    }
}

enum SourceKind {
    Table,
    Json,
    Log,
}

/// Classify one entry path. Returns the source kind and logical name.
fn classify(entry: &str) -> Option<(SourceKind, String)> {
    let path = entry.trim_start_matches("./");

    if let Some(rest) = path.strip_prefix("cat/") {
        let stem = rest.strip_suffix(".txt")?;
        if stem.is_empty() || rest.contains('/') {
            return None;
        }
        return Some((SourceKind::Table, stem.to_string()));
    }

    if let Some(rest) = path.strip_prefix("logs/") {
        let stem = rest.strip_suffix(".log")?;
        if stem.is_empty() || rest.contains('/') {
            return None;
        }
        return Some((SourceKind::Log, stem.to_string()));
    }

    // Top-level JSON API dumps (nodes.json, indices_stats.json, manifest.json)
    if !path.contains('/') {
        if let Some(stem) = path.strip_suffix(".json") {
            if !stem.is_empty() {
                return Some((SourceKind::Json, stem.to_string()));
            }
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ArchiveError;

    struct FakeArchive {
        entries: Vec<(String, Vec<u8>)>,
    }

    impl DiagnosticArchive for FakeArchive {
        fn entry_names(&self) -> Vec<String> {
            self.entries.iter().map(|(n, _)| n.clone()).collect()
        }

        fn read(&mut self, name: &str) -> std::result::Result<Vec<u8>, ArchiveError> {
            self.entries
                .iter()
                .find(|(n, _)| n == name)
                .map(|(_, b)| b.clone())
                .ok_or_else(|| ArchiveError::NotFound(name.into()))
        }
    }

    #[test]
    fn test_extract_classifies_known_sources() {
        let mut archive = FakeArchive {
            entries: vec![
                ("cat/cat_health.txt".to_string(), b"h".to_vec()),
                ("cat/cat_nodes.txt".to_string(), b"n".to_vec()),
                ("nodes.json".to_string(), b"{}".to_vec()),
                ("manifest.json".to_string(), b"{}".to_vec()),
                ("logs/gc.log".to_string(), b"g".to_vec()),
                ("logs/server.log".to_string(), b"s".to_vec()),
                ("diagnostics.log".to_string(), b"d".to_vec()),
                ("README.txt".to_string(), b"r".to_vec()),
            ],
        };

        let sources = SourceExtractor::extract(&mut archive).unwrap();
        assert_eq!(sources.table("cat_health"), Some("h"));
        assert_eq!(sources.table("cat_nodes"), Some("n"));
        assert_eq!(sources.json("nodes"), Some("{}"));
        assert_eq!(sources.json("manifest"), Some("{}"));
        assert_eq!(sources.logs.get("gc").map(String::as_str), Some("g"));
        assert_eq!(sources.logs.get("server").map(String::as_str), Some("s"));
        // The collector's own execution log and stray files are not sources
        assert_eq!(sources.logs.len(), 2);
        assert!(sources.tables.len() == 2 && sources.json.len() == 2);
    }

    #[test]
    fn test_extract_empty_archive_yields_empty_set() {
        let mut archive = FakeArchive { entries: vec![] };
        let sources = SourceExtractor::extract(&mut archive).unwrap();
        assert!(sources.tables.is_empty());
        assert!(sources.json.is_empty());
        assert!(sources.logs.is_empty());
    }
}
