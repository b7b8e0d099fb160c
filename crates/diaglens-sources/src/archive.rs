use crate::error::{ArchiveError, Result};
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;
use zip::ZipArchive;

/// Byte caps applied while reading bundle entries.
///
/// Diagnostic bundles are compressed; the cap bounds total decompressed
/// bytes so a hostile or accidentally enormous archive fails with a
/// resource-limit error instead of exhausting memory.
#[derive(Debug, Clone, Copy)]
pub struct ExtractLimits {
    pub max_total_bytes: u64,
}

impl Default for ExtractLimits {
    fn default() -> Self {
        Self {
            // 512 MiB of decompressed diagnostics is already far beyond any
            // bundle the collector produces.
            max_total_bytes: 512 * 1024 * 1024,
        }
    }
}

/// Read access to an opened diagnostic bundle.
///
/// The seam between the pipeline and archive mechanics: ZIP bundles and
/// pre-extracted directories both satisfy it, and tests can supply
/// in-memory fakes.
pub trait DiagnosticArchive {
    /// All entry names, with `/` separators, relative to the bundle root.
    fn entry_names(&self) -> Vec<String>;

    /// Read one entry fully. Counts against the extraction cap.
    fn read(&mut self, name: &str) -> Result<Vec<u8>>;
}

/// Open `path` as a bundle: a `.zip` file or an extracted directory.
pub fn open_bundle(path: &Path, limits: ExtractLimits) -> Result<Box<dyn DiagnosticArchive>> {
    if path.is_dir() {
        Ok(Box::new(DirBundle::open(path, limits)?))
    } else if path.is_file() {
        Ok(Box::new(ZipBundle::open(path, limits)?))
    } else {
        Err(ArchiveError::NotFound(path.to_path_buf()))
    }
}

/// ZIP-backed bundle with a running decompressed-bytes budget.
pub struct ZipBundle {
    archive: ZipArchive<File>,
    limits: ExtractLimits,
    read_total: u64,
}

impl ZipBundle {
    pub fn open(path: &Path, limits: ExtractLimits) -> Result<Self> {
        let file = File::open(path)?;
        let archive = ZipArchive::new(file)?;
        Ok(Self {
            archive,
            limits,
            read_total: 0,
        })
    }
}

impl DiagnosticArchive for ZipBundle {
    fn entry_names(&self) -> Vec<String> {
        self.archive
            .file_names()
            .filter(|n| !n.ends_with('/'))
            .map(|n| n.to_string())
            .collect()
    }

    fn read(&mut self, name: &str) -> Result<Vec<u8>> {
        let remaining = self
            .limits
            .max_total_bytes
            .saturating_sub(self.read_total);
        let entry = self.archive.by_name(name)?;

        // Read through a take() bound rather than trusting the header's
        // declared size; the header can lie.
        let mut buf = Vec::new();
        entry.take(remaining + 1).read_to_end(&mut buf)?;
        if buf.len() as u64 > remaining {
            return Err(ArchiveError::SizeLimit {
                limit_bytes: self.limits.max_total_bytes,
            });
        }
        self.read_total += buf.len() as u64;
        Ok(buf)
    }
}

/// Bundle already extracted to a directory tree.
pub struct DirBundle {
    root: PathBuf,
    limits: ExtractLimits,
    read_total: u64,
}

impl DirBundle {
    pub fn open(root: &Path, limits: ExtractLimits) -> Result<Self> {
        if !root.is_dir() {
            return Err(ArchiveError::NotFound(root.to_path_buf()));
        }
        Ok(Self {
            root: root.to_path_buf(),
            limits,
            read_total: 0,
        })
    }
}

impl DiagnosticArchive for DirBundle {
    fn entry_names(&self) -> Vec<String> {
        WalkDir::new(&self.root)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().is_file())
            .filter_map(|entry| {
                entry
                    .path()
                    .strip_prefix(&self.root)
                    .ok()
                    .map(|rel| rel.to_string_lossy().replace('\\', "/"))
            })
            .collect()
    }

    fn read(&mut self, name: &str) -> Result<Vec<u8>> {
        let remaining = self
            .limits
            .max_total_bytes
            .saturating_sub(self.read_total);
        let file = File::open(self.root.join(name))?;
        let mut buf = Vec::new();
        file.take(remaining + 1).read_to_end(&mut buf)?;
        if buf.len() as u64 > remaining {
            return Err(ArchiveError::SizeLimit {
                limit_bytes: self.limits.max_total_bytes,
            });
        }
        self.read_total += buf.len() as u64;
        Ok(buf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_dir_bundle_lists_and_reads() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("cat")).unwrap();
        std::fs::write(dir.path().join("cat/cat_health.txt"), "header\nrow").unwrap();
        std::fs::write(dir.path().join("manifest.json"), "{}").unwrap();

        let mut bundle = DirBundle::open(dir.path(), ExtractLimits::default()).unwrap();
        let names = bundle.entry_names();
        assert!(names.contains(&"cat/cat_health.txt".to_string()));
        assert!(names.contains(&"manifest.json".to_string()));

        let bytes = bundle.read("cat/cat_health.txt").unwrap();
        assert_eq!(bytes, b"header\nrow");
    }

    #[test]
    fn test_dir_bundle_enforces_size_cap() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("big.json"), vec![b'x'; 64]).unwrap();

        let limits = ExtractLimits {
            max_total_bytes: 16,
        };
        let mut bundle = DirBundle::open(dir.path(), limits).unwrap();
        match bundle.read("big.json") {
            Err(ArchiveError::SizeLimit { limit_bytes }) => assert_eq!(limit_bytes, 16),
            other => panic!("expected SizeLimit, got {:?}", other.map(|b| b.len())),
        }
    }

    #[test]
    fn test_zip_bundle_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let zip_path = dir.path().join("bundle.zip");
        let file = File::create(&zip_path).unwrap();
        let mut writer = zip::ZipWriter::new(file);
        let options = zip::write::SimpleFileOptions::default();
        writer.start_file("nodes.json", options).unwrap();
        writer.write_all(b"{\"nodes\":{}}").unwrap();
        writer.finish().unwrap();

        let mut bundle = ZipBundle::open(&zip_path, ExtractLimits::default()).unwrap();
        assert_eq!(bundle.entry_names(), vec!["nodes.json".to_string()]);
        assert_eq!(bundle.read("nodes.json").unwrap(), b"{\"nodes\":{}}");
    }

    #[test]
    fn test_zip_bundle_enforces_size_cap() {
        let dir = tempfile::tempdir().unwrap();
        let zip_path = dir.path().join("bundle.zip");
        let file = File::create(&zip_path).unwrap();
        let mut writer = zip::ZipWriter::new(file);
        let options = zip::write::SimpleFileOptions::default();
        writer.start_file("logs/huge.log", options).unwrap();
        writer.write_all(&vec![b'a'; 4096]).unwrap();
        writer.finish().unwrap();

        let limits = ExtractLimits {
            max_total_bytes: 128,
        };
        let mut bundle = ZipBundle::open(&zip_path, limits).unwrap();
        assert!(matches!(
            bundle.read("logs/huge.log"),
            Err(ArchiveError::SizeLimit { .. })
        ));
    }

    #[test]
    fn test_open_bundle_missing_path() {
        let result = open_bundle(Path::new("/no/such/bundle.zip"), ExtractLimits::default());
        assert!(matches!(result, Err(ArchiveError::NotFound(_))));
    }
}
