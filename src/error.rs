//! Top-level error returned by a report run.

use std::fmt;
use std::io;
use std::path::PathBuf;

use crate::builder::PdfBuildError;
use crate::chart::ChartError;

/// Errors that abort a report run.
#[derive(Debug)]
pub enum ReportError {
    /// The chart image could not be produced or stored.
    Chart(ChartError),
    /// The document could not be laid out or serialized.
    Pdf(PdfBuildError),
    /// The finished report could not be written to its destination.
    Io { path: PathBuf, source: io::Error },
}

impl ReportError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

impl From<ChartError> for ReportError {
    fn from(err: ChartError) -> Self {
        Self::Chart(err)
    }
}

impl From<PdfBuildError> for ReportError {
    fn from(err: PdfBuildError) -> Self {
        Self::Pdf(err)
    }
}

impl fmt::Display for ReportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Chart(_) => write!(f, "Failed to produce the emissions chart"),
            Self::Pdf(_) => write!(f, "Failed to build the report PDF"),
            Self::Io { path, .. } => write!(f, "Failed to write report to {}", path.display()),
        }
    }
}

impl std::error::Error for ReportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Chart(err) => Some(err),
            Self::Pdf(err) => Some(err),
            Self::Io { source, .. } => Some(source),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::error::Error as _;

    use super::*;

    #[test]
    fn io_error_names_path_and_keeps_source() {
        let err = ReportError::io(
            "out/report.pdf",
            io::Error::new(io::ErrorKind::NotFound, "no such directory"),
        );
        assert_eq!(err.to_string(), "Failed to write report to out/report.pdf");
        let source = err.source().expect("source");
        assert_eq!(source.to_string(), "no such directory");
    }

    #[test]
    fn chart_errors_convert() {
        let chart = ChartError::Io(io::Error::new(io::ErrorKind::Other, "disk full"));
        let err = ReportError::from(chart);
        assert!(matches!(err, ReportError::Chart(ChartError::Io(_))));
        assert!(err.source().is_some());
    }
}
