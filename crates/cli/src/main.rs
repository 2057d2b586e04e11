use std::error::Error;
use std::path::PathBuf;

use chrono::NaiveDate;
use clap::Parser;
use env_logger::Env;
use lca_report::config::{DEFAULT_CHART_PATH, DEFAULT_PRODUCT_NAME};
use lca_report::{run_report_with_config, ReportConfig, DOWNLOAD_FILE_NAME};

/// Generates a synthetic life cycle assessment report as a PDF.
///
/// Fonts are looked up under `assets/fonts` next to the binary or in the
/// directory named by `LCA_REPORT_FONTS_DIR`; system fonts are used as a
/// fallback. Set `RUST_LOG=debug` to follow the run.
#[derive(Parser)]
#[command(author, version, about = "Synthetic LCA report generator")]
struct Cli {
    /// Name of the assessed product.
    #[arg(long, default_value = DEFAULT_PRODUCT_NAME)]
    product: String,

    /// Where the finished PDF is written.
    #[arg(long, default_value = DOWNLOAD_FILE_NAME)]
    output: PathBuf,

    /// Where the intermediate chart image is written.
    #[arg(long, default_value = DEFAULT_CHART_PATH)]
    chart: PathBuf,

    /// Seed for reproducible inventory values.
    #[arg(long)]
    seed: Option<u64>,

    /// Report date (YYYY-MM-DD); defaults to today.
    #[arg(long, value_parser = parse_date)]
    date: Option<NaiveDate>,

    /// Add a PDF outline with one entry per section.
    #[cfg(feature = "bookmarks")]
    #[arg(long)]
    bookmarks: bool,
}

impl Cli {
    fn config(&self) -> ReportConfig {
        let config = ReportConfig::new()
            .with_product_name(self.product.clone())
            .with_output_path(self.output.clone())
            .with_chart_path(self.chart.clone())
            .with_seed(self.seed)
            .with_date(self.date);
        #[cfg(feature = "bookmarks")]
        let config = config.with_bookmarks(self.bookmarks);
        config
    }
}

fn parse_date(value: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|err| format!("expected YYYY-MM-DD: {err}"))
}

fn main() {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();
    let config = cli.config();

    match run_report_with_config(&config) {
        Ok(artifact) => {
            println!("LCA complete! Detailed report ready for download.");
            println!(
                "  {} -> {} ({} bytes)",
                artifact.path.display(),
                artifact.download_name,
                artifact.size_bytes
            );
        }
        Err(err) => {
            log::error!("Report run failed");
            eprintln!("Error: {}", err);
            print_error_sources(&err);
            std::process::exit(1);
        }
    }
}

fn print_error_sources(mut error: &(dyn Error + 'static)) {
    while let Some(source) = error.source() {
        eprintln!("  caused by: {}", source);
        error = source;
    }
}
