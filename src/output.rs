//! Writing report artifacts to disk.

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use log::debug;
use tempfile::NamedTempFile;

use crate::aggregate::Aggregates;

/// File name under which the finished report is offered for download.
pub const DOWNLOAD_FILE_NAME: &str = "lca_detailed_report.pdf";

/// Writes `bytes` to `path` through a sibling temporary file that is renamed into place.
///
/// Readers of `path` either see the previous complete file or the new complete file.
pub fn write_atomically(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let directory = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };

    let mut staged = NamedTempFile::new_in(&directory)?;
    staged.write_all(bytes)?;
    staged.as_file().sync_all()?;
    staged.persist(path)?;

    debug!("Wrote {} bytes to {}", bytes.len(), path.display());
    Ok(())
}

/// A finished report ready to be handed to the user.
#[derive(Clone, Debug, PartialEq)]
pub struct ReportArtifact {
    /// Location of the PDF on disk.
    pub path: PathBuf,
    /// Location of the embedded chart image.
    pub chart_path: PathBuf,
    /// File name offered to the user when downloading.
    pub download_name: String,
    pub size_bytes: usize,
    /// Headline figures of the run that produced the artifact.
    pub aggregates: Aggregates,
}

impl ReportArtifact {
    /// Reads the stored PDF back for download.
    pub fn read_bytes(&self) -> io::Result<Vec<u8>> {
        std::fs::read(&self.path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replaces_existing_file() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("report.pdf");

        write_atomically(&path, b"first run, longer content").expect("first write");
        write_atomically(&path, b"second").expect("second write");

        assert_eq!(std::fs::read(&path).expect("read back"), b"second");
    }

    #[test]
    fn leaves_no_staging_files_behind() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("chart.png");
        write_atomically(&path, b"png").expect("write");

        let entries: Vec<_> = std::fs::read_dir(dir.path())
            .expect("list dir")
            .filter_map(Result::ok)
            .map(|entry| entry.file_name())
            .collect();
        assert_eq!(entries, vec![std::ffi::OsString::from("chart.png")]);
    }

    #[test]
    fn missing_directory_is_an_error() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("missing").join("report.pdf");
        assert!(write_atomically(&path, b"pdf").is_err());
    }
}
