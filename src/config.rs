//! Settings for one report run.

use std::path::{Path, PathBuf};

use chrono::{Local, NaiveDate};

use crate::inventory::RandomSampler;
use crate::output::DOWNLOAD_FILE_NAME;

/// Product assessed when none is named.
pub const DEFAULT_PRODUCT_NAME: &str = "Generic Product";
/// Default location of the intermediate chart image.
pub const DEFAULT_CHART_PATH: &str = "chart.png";

/// Where a run writes its artifacts and what it reports on.
#[derive(Clone, Debug, PartialEq)]
pub struct ReportConfig {
    product_name: String,
    output_path: PathBuf,
    chart_path: PathBuf,
    date: Option<NaiveDate>,
    seed: Option<u64>,
    bookmarks: bool,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            product_name: DEFAULT_PRODUCT_NAME.to_owned(),
            output_path: PathBuf::from(DOWNLOAD_FILE_NAME),
            chart_path: PathBuf::from(DEFAULT_CHART_PATH),
            date: None,
            seed: None,
            bookmarks: false,
        }
    }
}

impl ReportConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_product_name(mut self, product_name: impl Into<String>) -> Self {
        self.product_name = product_name.into();
        self
    }

    pub fn with_output_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.output_path = path.into();
        self
    }

    pub fn with_chart_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.chart_path = path.into();
        self
    }

    /// Fixes the report date instead of using today's local date.
    pub fn with_date(mut self, date: impl Into<Option<NaiveDate>>) -> Self {
        self.date = date.into();
        self
    }

    /// Seed for reproducible sampling; `None` draws from system entropy.
    ///
    /// Used by [`ReportConfig::sampler`] and therefore by
    /// [`run_report_with_config`](crate::pipeline::run_report_with_config).
    pub fn with_seed(mut self, seed: impl Into<Option<u64>>) -> Self {
        self.seed = seed.into();
        self
    }

    /// Requests a PDF outline with one entry per section.
    ///
    /// Only honoured when the crate is built with the `bookmarks` feature.
    pub fn with_bookmarks(mut self, bookmarks: bool) -> Self {
        self.bookmarks = bookmarks;
        self
    }

    pub fn product_name(&self) -> &str {
        &self.product_name
    }

    pub fn output_path(&self) -> &Path {
        &self.output_path
    }

    pub fn chart_path(&self) -> &Path {
        &self.chart_path
    }

    pub fn seed(&self) -> Option<u64> {
        self.seed
    }

    /// Fresh sampler for one run, seeded when a seed is configured.
    pub fn sampler(&self) -> RandomSampler {
        RandomSampler::from_seed(self.seed)
    }

    pub fn bookmarks(&self) -> bool {
        self.bookmarks
    }

    /// Configured date, or today's local date when none was set.
    pub fn report_date(&self) -> NaiveDate {
        self.date.unwrap_or_else(|| Local::now().date_naive())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inventory::generate_inventory;

    #[test]
    fn defaults_target_fixed_download_name() {
        let config = ReportConfig::default();
        assert_eq!(config.product_name(), "Generic Product");
        assert_eq!(config.output_path(), Path::new("lca_detailed_report.pdf"));
        assert_eq!(config.chart_path(), Path::new("chart.png"));
        assert_eq!(config.seed(), None);
        assert!(!config.bookmarks());
    }

    #[test]
    fn explicit_date_overrides_today() {
        let date = NaiveDate::from_ymd_opt(2023, 12, 31).expect("date");
        let config = ReportConfig::new()
            .with_product_name("Widget")
            .with_date(date)
            .with_seed(7);
        assert_eq!(config.report_date(), date);
        assert_eq!(config.seed(), Some(7));
        assert_eq!(config.product_name(), "Widget");
    }

    #[test]
    fn configured_seed_reaches_the_sampler() {
        let config = ReportConfig::new().with_seed(42);
        assert_eq!(
            generate_inventory(config.sampler()),
            generate_inventory(config.sampler())
        );
        assert_ne!(
            generate_inventory(config.sampler()),
            generate_inventory(ReportConfig::new().with_seed(43).sampler())
        );
    }
}
