//! Synthetic life cycle assessment (LCA) reports rendered to PDF.
//!
//! A run samples a five-stage inventory, sums it up, draws a GHG bar chart and lays everything
//! out as a paginated report with `genpdf`:
//!
//! ```no_run
//! use lca_report::{run_report_with_config, ReportConfig};
//!
//! let config = ReportConfig::new().with_product_name("Widget").with_seed(42);
//! let artifact = run_report_with_config(&config)?;
//! println!("{} ({} bytes)", artifact.path.display(), artifact.size_bytes);
//! # Ok::<(), lca_report::ReportError>(())
//! ```

pub mod aggregate;
pub mod builder;
pub mod chart;
pub mod config;
pub mod elements;
pub mod error;
pub mod fonts;
pub mod inventory;
pub mod model;
pub mod output;
pub mod pipeline;
pub mod richtext;
pub mod sections;

#[cfg(feature = "bookmarks")]
pub mod bookmarks;

pub use aggregate::{compute_aggregates, Aggregates};
pub use builder::{PdfBuildError, PdfBuilder, RenderedPdf};
pub use chart::{BarChart, ChartError, ChartFont};
pub use config::ReportConfig;
pub use error::ReportError;
pub use inventory::{
    generate_inventory, InventoryRecord, InventoryTable, RandomSampler, Sampler, Stage,
};
pub use output::{ReportArtifact, DOWNLOAD_FILE_NAME};
pub use pipeline::{run_report, run_report_with_config, ReportRun, RunState};
pub use sections::{build_document, build_sections};
