//! Drives one report run from sampling to the stored PDF.

use log::{debug, info};

use crate::aggregate::compute_aggregates;
use crate::builder::{PdfBuilder, RenderedPdf};
use crate::chart::{BarChart, ChartFont};
use crate::config::ReportConfig;
use crate::error::ReportError;
use crate::inventory::{generate_inventory, Sampler};
use crate::model::ReportDocument;
use crate::output::{self, ReportArtifact, DOWNLOAD_FILE_NAME};
use crate::sections;

/// Progress of a [`ReportRun`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum RunState {
    #[default]
    Idle,
    /// Sampling the inventory and drawing the chart.
    Generating,
    /// Laying out, serializing and storing the PDF.
    Rendering,
    Done,
    Failed,
}

/// A single report run.
///
/// Each call to [`ReportRun::execute`] starts from scratch; nothing is carried over from a
/// previous run apart from the files it overwrites.
#[derive(Debug, Default)]
pub struct ReportRun {
    state: RunState,
}

impl ReportRun {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    fn transition(&mut self, next: RunState) {
        debug!("Report run: {:?} -> {:?}", self.state, next);
        self.state = next;
    }

    /// Generates a fresh inventory with `sampler` and writes the report described by `config`.
    ///
    /// Ends in [`RunState::Done`] on success. Any failure leaves the run in
    /// [`RunState::Failed`] and is returned unchanged; nothing is retried.
    pub fn execute<S: Sampler>(
        &mut self,
        config: &ReportConfig,
        sampler: S,
    ) -> Result<ReportArtifact, ReportError> {
        self.state = RunState::Idle;
        info!(
            "Generating LCA report for '{}' into {}",
            config.product_name(),
            config.output_path().display()
        );

        match self.run(config, sampler) {
            Ok(artifact) => {
                self.transition(RunState::Done);
                info!(
                    "Report ready at {} ({} bytes)",
                    artifact.path.display(),
                    artifact.size_bytes
                );
                Ok(artifact)
            }
            Err(err) => {
                self.transition(RunState::Failed);
                Err(err)
            }
        }
    }

    fn run<S: Sampler>(
        &mut self,
        config: &ReportConfig,
        sampler: S,
    ) -> Result<ReportArtifact, ReportError> {
        self.transition(RunState::Generating);
        let table = generate_inventory(sampler);
        let aggregates = compute_aggregates(&table);
        debug!(
            "Totals: {:.2} MJ, {:.2} kg CO2-eq, {:.2} L; top contributor {}",
            aggregates.energy_total,
            aggregates.ghg_total,
            aggregates.water_total,
            aggregates.top_stage
        );

        BarChart::from_inventory(&table)
            .with_font(ChartFont::load_default()?)
            .save(config.chart_path())?;

        self.transition(RunState::Rendering);
        let document = sections::build_document(
            config.product_name(),
            config.report_date(),
            &table,
            &aggregates,
            config.chart_path(),
        );
        let rendered = render(document, config.bookmarks())?;

        let path = config.output_path();
        output::write_atomically(path, &rendered.bytes)
            .map_err(|err| ReportError::io(path, err))?;

        Ok(ReportArtifact {
            path: path.to_path_buf(),
            chart_path: config.chart_path().to_path_buf(),
            download_name: DOWNLOAD_FILE_NAME.to_owned(),
            size_bytes: rendered.bytes.len(),
            aggregates,
        })
    }
}

#[cfg(feature = "bookmarks")]
fn render(document: ReportDocument, bookmarks: bool) -> Result<RenderedPdf, ReportError> {
    let builder = PdfBuilder::from_document(document);
    let rendered = if bookmarks {
        builder.render_with_bookmarks()?
    } else {
        builder.render()?
    };
    Ok(rendered)
}

#[cfg(not(feature = "bookmarks"))]
fn render(document: ReportDocument, bookmarks: bool) -> Result<RenderedPdf, ReportError> {
    if bookmarks {
        log::warn!("Bookmarks requested but the `bookmarks` feature is disabled");
    }
    Ok(PdfBuilder::from_document(document).render()?)
}

/// Runs a single report with a fresh [`ReportRun`].
pub fn run_report<S: Sampler>(
    config: &ReportConfig,
    sampler: S,
) -> Result<ReportArtifact, ReportError> {
    ReportRun::new().execute(config, sampler)
}

/// Runs a single report with the sampler described by `config`.
///
/// A configured seed makes the inventory, and with a fixed date the whole report, reproducible.
pub fn run_report_with_config(config: &ReportConfig) -> Result<ReportArtifact, ReportError> {
    run_report(config, config.sampler())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chart::ChartError;
    use crate::fonts;
    use crate::inventory::RandomSampler;

    #[test]
    fn new_run_is_idle() {
        assert_eq!(ReportRun::new().state(), RunState::Idle);
    }

    #[test]
    fn unwritable_chart_path_fails_the_run() {
        let dir = tempfile::tempdir().expect("temp dir");
        let config = ReportConfig::new()
            .with_chart_path(dir.path().join("missing").join("chart.png"))
            .with_output_path(dir.path().join("report.pdf"));

        let mut run = ReportRun::new();
        let err = run
            .execute(&config, RandomSampler::seeded(3))
            .expect_err("chart directory does not exist");

        if fonts::default_fonts_available() {
            assert!(matches!(err, ReportError::Chart(ChartError::Io(_))), "{err:?}");
        } else {
            assert!(matches!(err, ReportError::Chart(ChartError::FontLookup(_))), "{err:?}");
        }
        assert_eq!(run.state(), RunState::Failed);
        assert!(!dir.path().join("report.pdf").exists());
    }
}
