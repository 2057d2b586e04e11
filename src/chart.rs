//! Raster bar chart of greenhouse gas emissions per life-cycle stage.
//!
//! Bars, grid and axes are drawn pixel by pixel with the [`image`] crate.  Stage names under the
//! bars, tick values beside the value axis and the two axis titles are rasterised with
//! `imageproc` from a TrueType face found by [`crate::fonts`].

use std::fmt;
use std::fs;
use std::io::{self, Cursor};
use std::path::{Path, PathBuf};

use image::{DynamicImage, ImageOutputFormat, Rgb, RgbImage};
use imageproc::drawing::draw_text_mut;
use rusttype::{point, Font, Scale};

use crate::fonts;
use crate::inventory::InventoryTable;
use crate::output;

const DEFAULT_WIDTH_PX: u32 = 1200;
const DEFAULT_HEIGHT_PX: u32 = 800;

const MARGIN_LEFT_PX: u32 = 110;
const MARGIN_RIGHT_PX: u32 = 30;
const MARGIN_TOP_PX: u32 = 60;
const MARGIN_BOTTOM_PX: u32 = 90;
const TICK_LENGTH_PX: u32 = 10;
const AXIS_THICKNESS_PX: u32 = 2;

/// Share of each category slot covered by its bar.
const BAR_WIDTH_RATIO: f64 = 0.5;
const TARGET_TICKS: f64 = 5.0;

const BACKGROUND: Rgb<u8> = Rgb([255, 255, 255]);
const GRID: Rgb<u8> = Rgb([225, 225, 225]);
const AXIS: Rgb<u8> = Rgb([0, 0, 0]);
const TEXT: Rgb<u8> = Rgb([30, 30, 30]);

const LABEL_SCALE_PX: f32 = 20.0;
const LABEL_GAP_PX: u32 = 8;
const VALUE_AXIS_TITLE: &str = "GHG Emissions (kg CO2-eq)";
const CATEGORY_AXIS_TITLE: &str = "Process";
/// Fill colour of every bar.
pub const BAR_COLOR: Rgb<u8> = Rgb([31, 119, 180]);

/// Errors raised while loading the label font, encoding or storing a chart.
#[derive(Debug)]
pub enum ChartError {
    /// The raster could not be encoded as PNG.
    Encode(image::ImageError),
    /// The encoded chart could not be written to disk, or a font file could not be read.
    Io(io::Error),
    /// No font face for the labels could be located.
    FontLookup(genpdf::error::Error),
    /// The font file is not a usable TrueType face.
    InvalidFont(PathBuf),
}

impl From<image::ImageError> for ChartError {
    fn from(err: image::ImageError) -> Self {
        Self::Encode(err)
    }
}

impl From<io::Error> for ChartError {
    fn from(err: io::Error) -> Self {
        Self::Io(err)
    }
}

impl fmt::Display for ChartError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Encode(err) => write!(f, "Failed to encode chart image: {err}"),
            Self::Io(err) => write!(f, "Chart I/O failed: {err}"),
            Self::FontLookup(err) => write!(f, "No font available for chart labels: {err}"),
            Self::InvalidFont(path) => {
                write!(f, "Font file {} could not be parsed", path.display())
            }
        }
    }
}

impl std::error::Error for ChartError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Encode(err) => Some(err),
            Self::Io(err) => Some(err),
            Self::FontLookup(err) => Some(err),
            Self::InvalidFont(_) => None,
        }
    }
}

/// TrueType face used for the axis labels.
#[derive(Clone)]
pub struct ChartFont(Font<'static>);

impl ChartFont {
    pub fn load(path: &Path) -> Result<Self, ChartError> {
        let bytes = fs::read(path)?;
        Font::try_from_vec(bytes)
            .map(Self)
            .ok_or_else(|| ChartError::InvalidFont(path.to_path_buf()))
    }

    /// Loads the regular face of the report font family.
    pub fn load_default() -> Result<Self, ChartError> {
        let path = fonts::default_regular_font_path().map_err(ChartError::FontLookup)?;
        Self::load(&path)
    }

    fn text_width(&self, text: &str) -> u32 {
        self.0
            .layout(text, label_scale(), point(0.0, 0.0))
            .filter_map(|glyph| glyph.pixel_bounding_box())
            .map(|bounds| bounds.max.x)
            .max()
            .map_or(0, |right| right.max(0) as u32)
    }

    fn draw(&self, canvas: &mut RgbImage, x: u32, y: u32, text: &str) {
        draw_text_mut(canvas, TEXT, x, y, label_scale(), &self.0, text);
    }
}

impl fmt::Debug for ChartFont {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChartFont").finish_non_exhaustive()
    }
}

fn label_scale() -> Scale {
    Scale::uniform(LABEL_SCALE_PX)
}

fn is_whole(value: f64) -> bool {
    (value - value.round()).abs() < 1e-9
}

/// Tick label with as many decimals as the tick step needs.
fn format_tick(value: f64, step: f64) -> String {
    let decimals = if is_whole(step) {
        0
    } else if is_whole(step * 10.0) {
        1
    } else {
        2
    };
    format!("{value:.decimals$}")
}

/// A labelled value drawn as one bar.
#[derive(Clone, Debug, PartialEq)]
pub struct Bar {
    pub label: String,
    pub value: f64,
}

/// Vertical bar chart with one bar per category, in insertion order.
///
/// Labels and axis titles are only drawn once a font has been set with [`BarChart::with_font`].
#[derive(Clone, Debug)]
pub struct BarChart {
    bars: Vec<Bar>,
    width: u32,
    height: u32,
    font: Option<ChartFont>,
}

impl BarChart {
    pub fn new(bars: Vec<Bar>) -> Self {
        Self {
            bars,
            width: DEFAULT_WIDTH_PX,
            height: DEFAULT_HEIGHT_PX,
            font: None,
        }
    }

    /// GHG emissions per stage, in table order.
    pub fn from_inventory(table: &InventoryTable) -> Self {
        Self::new(
            table
                .iter()
                .map(|record| Bar {
                    label: record.stage.label().to_owned(),
                    value: record.ghg_kg_co2e,
                })
                .collect(),
        )
    }

    /// Overrides the raster size in pixels.
    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    /// Sets the face used for tick values, stage names and axis titles.
    pub fn with_font(mut self, font: ChartFont) -> Self {
        self.font = Some(font);
        self
    }

    pub fn bars(&self) -> &[Bar] {
        &self.bars
    }

    /// Upper bound of the value axis, rounded up to a whole number of ticks.
    pub fn axis_max(&self) -> f64 {
        self.axis_scale().0
    }

    fn axis_scale(&self) -> (f64, f64) {
        let max = self
            .bars
            .iter()
            .map(|bar| bar.value)
            .fold(0.0_f64, f64::max);
        if max <= 0.0 || !max.is_finite() {
            return (1.0, 0.2);
        }

        let raw_step = max / TARGET_TICKS;
        let magnitude = 10_f64.powf(raw_step.log10().floor());
        let step = [1.0, 2.0, 2.5, 5.0, 10.0]
            .iter()
            .map(|factor| factor * magnitude)
            .find(|candidate| *candidate >= raw_step)
            .unwrap_or(10.0 * magnitude);
        ((max / step).ceil() * step, step)
    }

    fn ticks(&self) -> (f64, f64, Vec<f64>) {
        let (axis_max, step) = self.axis_scale();
        let mut ticks = Vec::new();
        let mut tick = 0.0;
        while tick <= axis_max + step / 2.0 {
            ticks.push(tick);
            tick += step;
        }
        (axis_max, step, ticks)
    }

    fn bar_slot(&self, area: &PlotArea) -> f64 {
        area.width() as f64 / self.bars.len().max(1) as f64
    }

    fn plot_area(&self) -> PlotArea {
        PlotArea {
            left: MARGIN_LEFT_PX,
            right: self.width.saturating_sub(MARGIN_RIGHT_PX),
            top: MARGIN_TOP_PX,
            bottom: self.height.saturating_sub(MARGIN_BOTTOM_PX),
        }
    }

    /// Draws the chart.
    pub fn render(&self) -> RgbImage {
        let mut canvas = RgbImage::from_pixel(self.width, self.height, BACKGROUND);
        let area = self.plot_area();
        let (axis_max, _, ticks) = self.ticks();

        for tick in &ticks {
            let y = area.y_for(tick / axis_max);
            fill_rect(&mut canvas, area.left, y, area.right, y + 1, GRID);
            fill_rect(
                &mut canvas,
                area.left.saturating_sub(TICK_LENGTH_PX),
                y,
                area.left,
                y + 1,
                AXIS,
            );
        }

        if !self.bars.is_empty() {
            let slot = self.bar_slot(&area);
            let bar_width = slot * BAR_WIDTH_RATIO;
            for (index, bar) in self.bars.iter().enumerate() {
                let x0 = area.left as f64 + index as f64 * slot + (slot - bar_width) / 2.0;
                let x1 = x0 + bar_width;
                let top = area.y_for((bar.value / axis_max).clamp(0.0, 1.0));
                fill_rect(
                    &mut canvas,
                    x0.round() as u32,
                    top,
                    x1.round() as u32,
                    area.bottom,
                    BAR_COLOR,
                );

                let centre = (x0 + bar_width / 2.0).round() as u32;
                fill_rect(
                    &mut canvas,
                    centre,
                    area.bottom,
                    centre + 1,
                    area.bottom + TICK_LENGTH_PX,
                    AXIS,
                );
            }
        }

        fill_rect(
            &mut canvas,
            area.left.saturating_sub(AXIS_THICKNESS_PX),
            area.top,
            area.left,
            area.bottom + AXIS_THICKNESS_PX,
            AXIS,
        );
        fill_rect(
            &mut canvas,
            area.left.saturating_sub(AXIS_THICKNESS_PX),
            area.bottom,
            area.right,
            area.bottom + AXIS_THICKNESS_PX,
            AXIS,
        );

        if let Some(font) = &self.font {
            self.draw_labels(&mut canvas, font, &area);
        }

        canvas
    }

    fn draw_labels(&self, canvas: &mut RgbImage, font: &ChartFont, area: &PlotArea) {
        let (axis_max, step, ticks) = self.ticks();
        let half_line = (LABEL_SCALE_PX / 2.0).round() as u32;

        let value_right = area.left.saturating_sub(TICK_LENGTH_PX + LABEL_GAP_PX);
        for tick in ticks {
            let text = format_tick(tick, step);
            let x = value_right.saturating_sub(font.text_width(&text));
            let y = area.y_for(tick / axis_max).saturating_sub(half_line);
            font.draw(canvas, x, y, &text);
        }

        let slot = self.bar_slot(area);
        let label_top = area.bottom + TICK_LENGTH_PX + LABEL_GAP_PX / 2;
        for (index, bar) in self.bars.iter().enumerate() {
            let centre = area.left as f64 + slot * (index as f64 + 0.5);
            let x = (centre - font.text_width(&bar.label) as f64 / 2.0).max(0.0);
            font.draw(canvas, x.round() as u32, label_top, &bar.label);
        }

        font.draw(canvas, LABEL_GAP_PX, LABEL_GAP_PX, VALUE_AXIS_TITLE);
        let title_x = (area.left + area.width() / 2)
            .saturating_sub(font.text_width(CATEGORY_AXIS_TITLE) / 2);
        let title_y = self
            .height
            .saturating_sub(LABEL_GAP_PX + LABEL_SCALE_PX.round() as u32);
        font.draw(canvas, title_x, title_y, CATEGORY_AXIS_TITLE);
    }

    /// Draws the chart and encodes it as PNG.
    pub fn to_png_bytes(&self) -> Result<Vec<u8>, ChartError> {
        let mut bytes = Vec::new();
        DynamicImage::ImageRgb8(self.render())
            .write_to(&mut Cursor::new(&mut bytes), ImageOutputFormat::Png)?;
        Ok(bytes)
    }

    /// Writes the PNG encoding to `path`, replacing any previous chart.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ChartError> {
        let bytes = self.to_png_bytes()?;
        output::write_atomically(path.as_ref(), &bytes)?;
        Ok(())
    }
}

#[derive(Clone, Copy, Debug)]
struct PlotArea {
    left: u32,
    right: u32,
    top: u32,
    bottom: u32,
}

impl PlotArea {
    fn width(&self) -> u32 {
        self.right.saturating_sub(self.left)
    }

    fn height(&self) -> u32 {
        self.bottom.saturating_sub(self.top)
    }

    /// Pixel row for a value expressed as a fraction of the axis maximum.
    fn y_for(&self, fraction: f64) -> u32 {
        let offset = (fraction * self.height() as f64).round() as u32;
        self.bottom.saturating_sub(offset.min(self.height()))
    }
}

/// Fills the half-open pixel rectangle `[x0, x1) x [y0, y1)`, clipped to the canvas.
fn fill_rect(canvas: &mut RgbImage, x0: u32, y0: u32, x1: u32, y1: u32, color: Rgb<u8>) {
    let x1 = x1.min(canvas.width());
    let y1 = y1.min(canvas.height());
    for y in y0..y1 {
        for x in x0..x1 {
            canvas.put_pixel(x, y, color);
        }
    }
}
