//! Writing rendered documents to disk.
//!
//! Everything is rendered in memory first; files are only touched once the
//! whole run has succeeded. Each file is written to a temporary sibling and
//! renamed into place.

use anyhow::{Context, Result};
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::info;
use xxhash_rust::xxh64::xxh64;

use crate::assemble::Datasets;

/// A document rendered in memory, not yet on disk
#[derive(Debug, Clone)]
pub struct Rendered {
    pub file_name: String,
    pub features: usize,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Written {
    pub path: PathBuf,
    pub features: usize,
    pub digest: u64,
}

/// Serialize every dataset; fails before anything is written
pub fn render(datasets: &Datasets, file_prefix: &str) -> Result<Vec<Rendered>> {
    datasets
        .iter()
        .map(|dataset| {
            Ok(Rendered {
                file_name: dataset.file_name(file_prefix),
                features: dataset.features.len(),
                bytes: dataset
                    .to_geojson()
                    .with_context(|| format!("Failed to serialize dataset {}", dataset.key))?,
            })
        })
        .collect()
}

/// Atomically replace `path` with `bytes`
pub fn persist(path: &Path, bytes: &[u8]) -> Result<()> {
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("."));

    let mut tmp = NamedTempFile::new_in(dir)
        .with_context(|| format!("Failed to create temporary file in {}", dir.display()))?;
    tmp.write_all(bytes)?;
    tmp.flush()?;
    tmp.persist(path)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}

/// Write rendered documents into `dir`, creating it if needed
pub fn write_all(dir: &Path, rendered: &[Rendered]) -> Result<Vec<Written>> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create output directory {}", dir.display()))?;

    let mut written = Vec::with_capacity(rendered.len());
    for doc in rendered {
        let path = dir.join(&doc.file_name);
        persist(&path, &doc.bytes)?;

        let digest = xxh64(&doc.bytes, 0);
        info!(
            "Wrote {} ({} features, xxh64 {:016x})",
            path.display(),
            doc.features,
            digest
        );
        written.push(Written {
            path,
            features: doc.features,
            digest,
        });
    }

    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assemble::Dataset;

    fn datasets() -> Datasets {
        Datasets {
            all: Dataset {
                key: "00_all".to_string(),
                features: vec![],
            },
            regions: vec![Dataset {
                key: "13".to_string(),
                features: vec![],
            }],
        }
    }

    #[test]
    fn test_render_names_files() {
        let rendered = render(&datasets(), "tobichi").unwrap();
        let names: Vec<&str> = rendered.iter().map(|r| r.file_name.as_str()).collect();
        assert_eq!(names, vec!["tobichi_00_all.geojson", "tobichi_13.geojson"]);
    }

    #[test]
    fn test_write_all_creates_dir_and_files() {
        let tmp = tempfile::tempdir().unwrap();
        let out = tmp.path().join("nested").join("out");
        let rendered = render(&datasets(), "tobichi").unwrap();

        let written = write_all(&out, &rendered).unwrap();
        assert_eq!(written.len(), 2);
        for w in &written {
            let bytes = std::fs::read(&w.path).unwrap();
            assert_eq!(xxh64(&bytes, 0), w.digest);
        }
        // No temporary files left behind
        assert_eq!(std::fs::read_dir(&out).unwrap().count(), 2);
    }

    #[test]
    fn test_persist_overwrites() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("report.csv");
        persist(&path, b"first").unwrap();
        persist(&path, b"second").unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), b"second");
    }
}
