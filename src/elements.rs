//! Report-specific elements built on top of `genpdf` primitives.
//!
//! This module adds a captioned image with width control, a shaded section heading that remembers
//! the page it was placed on, and the bordered inventory grid.

use std::cell::Cell;
use std::path::Path;
use std::rc::Rc;

use image::GenericImageView;

use genpdf::elements::{FrameCellDecorator, Image, Paragraph, TableLayout};
use genpdf::error::{Context as _, Error};
use genpdf::style::{Color, Style, StyledString};
use genpdf::{render, Alignment, Element, Mm, Position, RenderResult, Scale, Size};

use crate::model::TableBlock;

const DEFAULT_IMAGE_DPI: f64 = 300.0;
const MM_PER_INCH: f64 = 25.4;
const DEFAULT_CAPTION_SPACING_MM: f64 = 2.0;
const HEADING_PADDING_MM: f64 = 1.5;
const HEADING_SPACING_MM: f64 = 3.0;
/// Distance between the strokes that fill the heading band; below the default stroke width.
const BAND_STROKE_STEP_MM: f64 = 0.25;
const HEADING_FONT_SIZE: u8 = 12;
const TABLE_FONT_SIZE: u8 = 10;
const CELL_PADDING_MM: f64 = 1.5;
const HEADING_BAND_COLOR: Color = Color::Greyscale(230);

pub(crate) fn mm_from_f64(value: f64) -> Mm {
    Mm::from(printpdf::Mm(value))
}

pub(crate) fn mm_to_f64(value: Mm) -> f64 {
    let mm: printpdf::Mm = value.into();
    mm.0
}

fn estimated_image_size(image: &image::DynamicImage, dpi: f64) -> Size {
    let (px_width, px_height) = image.dimensions();
    let width_mm = MM_PER_INCH * (px_width as f64) / dpi;
    let height_mm = MM_PER_INCH * (px_height as f64) / dpi;
    Size::new(mm_from_f64(width_mm), mm_from_f64(height_mm))
}

/// Loads an image from the given path with descriptive errors.
pub fn decode_image_from_path(path: impl AsRef<Path>) -> Result<image::DynamicImage, Error> {
    let path = path.as_ref();
    let reader = image::io::Reader::open(path)
        .with_context(|| format!("Failed to open image file {}", path.display()))?;
    reader
        .with_guessed_format()
        .context("Unable to determine image format")?
        .decode()
        .with_context(|| format!("Failed to decode image file {}", path.display()))
}

fn image_from_dynamic(image: image::DynamicImage) -> Result<(Image, Size), Error> {
    // PDF images are embedded without an alpha channel.
    let image = if image.color().has_alpha() {
        image::DynamicImage::ImageRgb8(image.to_rgb8())
    } else {
        image
    };
    let size = estimated_image_size(&image, DEFAULT_IMAGE_DPI);
    let image = Image::from_dynamic_image(image)?;
    Ok((image, size))
}

/// Renders an image with a caption stacked underneath.
///
/// The image and the caption share one alignment, and the image can be rescaled to a requested
/// width while keeping its aspect ratio.
pub struct CaptionedImage {
    image: Image,
    caption: Paragraph,
    alignment: Alignment,
    natural_size: Size,
    requested_width: Option<Mm>,
    spacing: Mm,
}

impl CaptionedImage {
    fn new(image: Image, caption: Paragraph, natural_size: Size) -> Self {
        Self {
            image,
            caption,
            alignment: Alignment::Left,
            natural_size,
            requested_width: None,
            spacing: mm_from_f64(DEFAULT_CAPTION_SPACING_MM),
        }
    }

    pub fn from_dynamic_image(
        image: image::DynamicImage,
        caption: Paragraph,
    ) -> Result<Self, Error> {
        let (image, size) = image_from_dynamic(image)?;
        Ok(Self::new(image, caption, size))
    }

    pub fn from_path(path: impl AsRef<Path>, caption: Paragraph) -> Result<Self, Error> {
        Self::from_dynamic_image(decode_image_from_path(path)?, caption)
    }

    /// Sets the horizontal alignment and returns the updated element.
    pub fn with_alignment(mut self, alignment: Alignment) -> Self {
        self.alignment = alignment;
        self
    }

    /// Constrains the rendered width and returns the updated element.
    pub fn with_width(mut self, width: impl Into<Option<Mm>>) -> Self {
        self.requested_width = width.into();
        self
    }

    /// Scale factor applied to the image for the requested width.
    pub fn scale(&self) -> f64 {
        match self.requested_width {
            Some(width) => {
                let natural = mm_to_f64(self.natural_size.width);
                if natural > f64::EPSILON {
                    mm_to_f64(width) / natural
                } else {
                    1.0
                }
            }
            None => 1.0,
        }
    }

    fn apply_layout(&mut self) {
        self.image.set_alignment(self.alignment);
        self.caption.set_alignment(self.alignment);
        let scale = self.scale();
        self.image.set_scale(Scale::new(scale, scale));
    }
}

impl Element for CaptionedImage {
    fn render(
        &mut self,
        context: &genpdf::Context,
        mut area: render::Area<'_>,
        style: Style,
    ) -> Result<RenderResult, Error> {
        self.apply_layout();

        let mut result = RenderResult::default();
        let image_result = self.image.render(context, area.clone(), style)?;
        result.size = result.size.stack_vertical(image_result.size);
        result.has_more |= image_result.has_more;
        if image_result.has_more {
            return Ok(result);
        }

        area.add_offset(Position::new(0, image_result.size.height + self.spacing));
        result.size = result.size.stack_vertical(Size::new(0, self.spacing));

        let caption_result = self.caption.render(context, area, style)?;
        result.size = result.size.stack_vertical(caption_result.size);
        result.has_more |= caption_result.has_more;

        Ok(result)
    }
}

/// Shared page counter advanced by the page decorator.
#[derive(Clone, Debug, Default)]
pub struct PageTracker(Rc<Cell<usize>>);

impl PageTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of the page currently being laid out (1-indexed, 0 before the first page).
    pub fn current(&self) -> usize {
        self.0.get()
    }

    pub(crate) fn advance(&self) -> usize {
        let page = self.0.get() + 1;
        self.0.set(page);
        page
    }
}

/// Slot filled with the page a [`SectionHeading`] ended up on.
#[derive(Clone, Debug, Default)]
pub struct PageMarker(Rc<Cell<Option<usize>>>);

impl PageMarker {
    pub fn page(&self) -> Option<usize> {
        self.0.get()
    }
}

/// Bold section title printed on a light grey band.
pub struct SectionHeading {
    title: String,
    style: Style,
    tracker: PageTracker,
    marker: PageMarker,
}

impl SectionHeading {
    pub fn new(title: impl Into<String>, tracker: PageTracker) -> Self {
        Self {
            title: title.into(),
            style: Style::new().bold().with_font_size(HEADING_FONT_SIZE),
            tracker,
            marker: PageMarker::default(),
        }
    }

    /// Handle that reports the heading's page once the document has been rendered.
    pub fn marker(&self) -> PageMarker {
        self.marker.clone()
    }
}

/// Vertical offsets (mm) of the strokes that fill a band of `height_mm`, top to bottom.
fn band_stroke_offsets(height_mm: f64) -> Vec<f64> {
    let steps = (height_mm / BAND_STROKE_STEP_MM).ceil().max(0.0) as usize;
    (0..=steps)
        .map(|step| (step as f64 * BAND_STROKE_STEP_MM).min(height_mm))
        .collect()
}

fn fill_band(area: &render::Area<'_>, height: Mm) {
    let width = area.size().width;
    let style = Style::new().with_color(HEADING_BAND_COLOR);
    for offset in band_stroke_offsets(mm_to_f64(height)) {
        let y = mm_from_f64(offset);
        area.draw_line(vec![Position::new(0, y), Position::new(width, y)], style);
    }
}

impl Element for SectionHeading {
    fn render(
        &mut self,
        context: &genpdf::Context,
        area: render::Area<'_>,
        style: Style,
    ) -> Result<RenderResult, Error> {
        let mut title_style = style;
        title_style.merge(self.style);
        let padding = mm_from_f64(HEADING_PADDING_MM);
        let band_height = title_style.line_height(&context.font_cache) + padding + padding;

        if band_height > area.size().height {
            return Ok(RenderResult {
                has_more: true,
                ..RenderResult::default()
            });
        }

        // The band is painted first so the title stays on top of it.
        fill_band(&area, band_height);
        let mut text_area = area.clone();
        text_area.add_offset(Position::new(padding, padding));
        let mut title = Paragraph::new(StyledString::new(self.title.clone(), self.style));
        title.render(context, text_area, style)?;

        self.marker.0.set(Some(self.tracker.current()));

        Ok(RenderResult {
            size: Size::new(
                area.size().width,
                band_height + mm_from_f64(HEADING_SPACING_MM),
            ),
            has_more: false,
        })
    }
}

fn table_cell(text: String, style: Style) -> impl Element {
    Paragraph::new(StyledString::new(text, style)).padded(mm_from_f64(CELL_PADDING_MM))
}

/// Builds a bordered grid with a bold header row and one row per table row.
pub fn table_element(table: &TableBlock) -> Result<TableLayout, Error> {
    let columns = table.column_count().max(1);
    let mut layout = TableLayout::new(vec![1; columns]);
    layout.set_cell_decorator(FrameCellDecorator::new(true, true, false));

    let body = Style::new().with_font_size(TABLE_FONT_SIZE);
    let header = body.bold();

    let mut row = layout.row();
    for title in table.header() {
        row.push_element(table_cell(title.clone(), header));
    }
    row.push()?;

    for cells in table.rows() {
        let mut row = layout.row();
        for index in 0..columns {
            let text = cells.get(index).map(|cell| cell.display()).unwrap_or_default();
            row.push_element(table_cell(text, body));
        }
        row.push()?;
    }

    Ok(layout)
}
