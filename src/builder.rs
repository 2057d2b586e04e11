//! Turns the report content model into a paginated PDF.
//!
//! [`DocumentBuilder`] configures the `genpdf` document and its page decorator, while
//! [`PdfBuilder`] walks the sections of a report and renders them into PDF bytes.

use std::fmt;

use genpdf::elements::{Break, LinearLayout, Paragraph};
use genpdf::error::{Error, ErrorKind};
use genpdf::fonts::{FontData, FontFamily};
use genpdf::style::{self, Style, StyledString};
use genpdf::{self, Alignment, Element, Margins, Mm, PageDecorator, PaperSize, Position, Size};
use log::debug;

use crate::elements::{self, CaptionedImage, PageMarker, PageTracker, SectionHeading};
use crate::fonts;
use crate::model::{Block, HorizontalAlignment, ImageBlock, ReportDocument, RichParagraph, Section};

#[cfg(feature = "bookmarks")]
use crate::bookmarks::{self, BookmarkError};

const PAGE_MARGIN_MM: f64 = 15.0;
const FOOTER_HEIGHT_MM: f64 = 10.0;
const BODY_FONT_SIZE: u8 = 11;
const TITLE_FONT_SIZE: u8 = 16;
const SUBTITLE_FONT_SIZE: u8 = 9;
const FOOTER_FONT_SIZE: u8 = 8;
const BLOCK_SPACING_LINES: f64 = 0.6;

type ElementFactory = dyn Fn(usize) -> Box<dyn Element>;

/// Builder for `genpdf::Document` instances with margins, running header and footer.
#[derive(Default)]
pub struct DocumentBuilder {
    paper_size: Option<Size>,
    margins: Option<Margins>,
    header: Option<Box<ElementFactory>>,
    footer: Option<FooterSpec>,
    tracker: PageTracker,
}

impl DocumentBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the paper size used for newly created documents.
    pub fn with_paper_size(mut self, paper_size: impl Into<Size>) -> Self {
        self.paper_size = Some(paper_size.into());
        self
    }

    /// Sets the margins applied through the page decorator.
    pub fn with_margins(mut self, margins: impl Into<Margins>) -> Self {
        self.margins = Some(margins.into());
        self
    }

    /// Configures a header callback that is invoked for every page.
    pub fn with_header<F, E>(mut self, header: F) -> Self
    where
        F: Fn(usize) -> E + 'static,
        E: Element + 'static,
    {
        self.header = Some(Box::new(move |page| {
            Box::new(header(page)) as Box<dyn Element>
        }));
        self
    }

    /// Configures a footer callback with a fixed height that is invoked for every page.
    pub fn with_footer<F, E>(mut self, height: impl Into<Mm>, footer: F) -> Self
    where
        F: Fn(usize) -> E + 'static,
        E: Element + 'static,
    {
        self.footer = Some(FooterSpec::new(height, footer));
        self
    }

    /// Shares `tracker` with the page decorator so elements can read the current page.
    pub fn with_page_tracker(mut self, tracker: PageTracker) -> Self {
        self.tracker = tracker;
        self
    }

    /// Builds a configured `genpdf::Document` using `font_family` as the default font.
    pub fn build(self, font_family: FontFamily<FontData>) -> genpdf::Document {
        let mut document = genpdf::Document::new(font_family);
        document.set_font_size(BODY_FONT_SIZE);

        if let Some(paper_size) = self.paper_size {
            document.set_paper_size(paper_size);
        }

        document.set_page_decorator(ConfiguredPageDecorator {
            tracker: self.tracker,
            margins: self.margins,
            header: self.header,
            footer: self.footer,
        });
        document
    }
}

/// Definition of a footer rendered through the page decorator.
pub struct FooterSpec {
    height: Mm,
    factory: Box<ElementFactory>,
}

impl FooterSpec {
    pub fn new<F, E>(height: impl Into<Mm>, factory: F) -> Self
    where
        F: Fn(usize) -> E + 'static,
        E: Element + 'static,
    {
        Self {
            height: height.into(),
            factory: Box::new(move |page| Box::new(factory(page)) as Box<dyn Element>),
        }
    }
}

struct ConfiguredPageDecorator {
    tracker: PageTracker,
    margins: Option<Margins>,
    header: Option<Box<ElementFactory>>,
    footer: Option<FooterSpec>,
}

impl PageDecorator for ConfiguredPageDecorator {
    fn decorate_page<'a>(
        &mut self,
        context: &genpdf::Context,
        mut area: genpdf::render::Area<'a>,
        style: style::Style,
    ) -> Result<genpdf::render::Area<'a>, Error> {
        let page = self.tracker.advance();

        if let Some(margins) = self.margins {
            area.add_margins(margins);
        }

        if let Some(header_cb) = &self.header {
            let mut element = header_cb(page);
            let result = element.render(context, area.clone(), style)?;
            area.add_offset(Position::new(0, result.size.height));
        }

        if let Some(footer) = &self.footer {
            let available = area.size().height;
            if footer.height > available {
                return Err(Error::new(
                    "Footer height exceeds available space",
                    ErrorKind::InvalidData,
                ));
            }

            let mut footer_area = area.clone();
            footer_area.add_offset(Position::new(0, available - footer.height));
            let mut element = (footer.factory)(page);
            let result = element.render(context, footer_area, style)?;
            if result.has_more {
                return Err(Error::new(
                    "Footer element does not fit into the reserved space",
                    ErrorKind::PageSizeExceeded,
                ));
            }

            area.set_height(available - footer.height);
        }

        Ok(area)
    }
}

/// Errors produced while turning report sections into PDF bytes.
#[derive(Debug)]
pub enum PdfBuildError {
    /// No usable font family could be loaded.
    FontLoad(Error),
    /// An image block could not be decoded or embedded.
    Image(Error),
    /// Layout or serialization of the document failed.
    Render(Error),
    /// The outline could not be added to the rendered document.
    #[cfg(feature = "bookmarks")]
    Bookmarks(BookmarkError),
}

impl fmt::Display for PdfBuildError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FontLoad(err) => write!(f, "Failed to load fonts: {err}"),
            Self::Image(err) => write!(f, "Failed to embed image: {err}"),
            Self::Render(err) => write!(f, "Failed to render PDF: {err}"),
            #[cfg(feature = "bookmarks")]
            Self::Bookmarks(err) => write!(f, "Failed to add bookmarks: {err}"),
        }
    }
}

impl std::error::Error for PdfBuildError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::FontLoad(err) | Self::Image(err) | Self::Render(err) => Some(err),
            #[cfg(feature = "bookmarks")]
            Self::Bookmarks(err) => Some(err),
        }
    }
}

#[cfg(feature = "bookmarks")]
impl From<BookmarkError> for PdfBuildError {
    fn from(err: BookmarkError) -> Self {
        Self::Bookmarks(err)
    }
}

/// Output of a successful render.
#[derive(Clone, Debug)]
pub struct RenderedPdf {
    pub bytes: Vec<u8>,
    /// Page (1-indexed) on which each section heading landed, in section order.
    pub section_pages: Vec<Option<usize>>,
}

/// Collects report sections and renders them with a running title header and page footer.
pub struct PdfBuilder {
    title: String,
    subtitle: Option<String>,
    sections: Vec<Section>,
}

impl PdfBuilder {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            subtitle: None,
            sections: Vec::new(),
        }
    }

    /// Prepares a builder for `document`, showing the report date under the running title.
    pub fn from_document(document: ReportDocument) -> Self {
        let subtitle = format!("Report date: {}", document.date().format("%Y-%m-%d"));
        let builder = Self::new(document.title()).with_subtitle(Some(subtitle));
        document
            .into_sections()
            .into_iter()
            .fold(builder, PdfBuilder::add_section)
    }

    pub fn with_subtitle(mut self, subtitle: impl Into<Option<String>>) -> Self {
        self.subtitle = subtitle.into();
        self
    }

    /// Appends a section and returns the updated builder.
    pub fn add_section(mut self, section: Section) -> Self {
        self.sections.push(section);
        self
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    /// Lays out every section on A4 pages and serializes the document.
    pub fn render(self) -> Result<RenderedPdf, PdfBuildError> {
        let font_family = fonts::default_font_family().map_err(PdfBuildError::FontLoad)?;
        let tracker = PageTracker::new();

        let header_title = self.title.clone();
        let header_subtitle = self.subtitle.clone();
        let mut document = DocumentBuilder::new()
            .with_paper_size(PaperSize::A4)
            .with_margins(Margins::all(elements::mm_from_f64(PAGE_MARGIN_MM)))
            .with_page_tracker(tracker.clone())
            .with_header(move |_| running_header(&header_title, header_subtitle.as_deref()))
            .with_footer(elements::mm_from_f64(FOOTER_HEIGHT_MM), page_footer)
            .build(font_family);
        document.set_title(self.title.clone());

        let mut markers: Vec<PageMarker> = Vec::with_capacity(self.sections.len());
        for section in &self.sections {
            let heading = SectionHeading::new(section.title(), tracker.clone());
            markers.push(heading.marker());
            document.push(heading);

            for block in section.blocks() {
                push_block(&mut document, block)?;
            }
        }

        let mut bytes = Vec::new();
        document.render(&mut bytes).map_err(PdfBuildError::Render)?;

        let section_pages: Vec<_> = markers.iter().map(PageMarker::page).collect();
        debug!(
            "Rendered '{}' across {} page(s); section pages {:?}",
            self.title,
            tracker.current(),
            section_pages
        );

        Ok(RenderedPdf {
            bytes,
            section_pages,
        })
    }

    /// Renders the document and adds an outline: the title on top, one entry per section below.
    #[cfg(feature = "bookmarks")]
    pub fn render_with_bookmarks(self) -> Result<RenderedPdf, PdfBuildError> {
        let title = self.title.clone();
        let sections = self.sections.clone();
        let rendered = self.render()?;
        let bytes = bookmarks::apply_section_bookmarks(
            &rendered.bytes,
            &title,
            &sections,
            &rendered.section_pages,
        )?;
        Ok(RenderedPdf {
            bytes,
            section_pages: rendered.section_pages,
        })
    }
}

fn running_header(title: &str, subtitle: Option<&str>) -> LinearLayout {
    let mut layout = LinearLayout::vertical();

    let mut title_line = Paragraph::new(StyledString::new(
        title.to_owned(),
        Style::new().bold().with_font_size(TITLE_FONT_SIZE),
    ));
    title_line.set_alignment(Alignment::Center);
    layout.push(title_line);

    if let Some(subtitle) = subtitle {
        let mut subtitle_line = Paragraph::new(StyledString::new(
            subtitle.to_owned(),
            Style::new().with_font_size(SUBTITLE_FONT_SIZE),
        ));
        subtitle_line.set_alignment(Alignment::Center);
        layout.push(subtitle_line);
    }

    layout.push(Break::new(1.0));
    layout
}

fn page_footer(page: usize) -> Paragraph {
    let mut line = Paragraph::new(StyledString::new(
        format!("Page {page}"),
        Style::new().italic().with_font_size(FOOTER_FONT_SIZE),
    ));
    line.set_alignment(Alignment::Center);
    line
}

fn alignment(alignment: HorizontalAlignment) -> Alignment {
    match alignment {
        HorizontalAlignment::Left => Alignment::Left,
        HorizontalAlignment::Center => Alignment::Center,
    }
}

fn paragraph_element(paragraph: &RichParagraph) -> Paragraph {
    let mut element = Paragraph::default();
    for span in paragraph.spans() {
        element.push(span.to_styled_string());
    }
    element.set_alignment(alignment(paragraph.alignment()));
    element
}

fn image_element(block: &ImageBlock) -> Result<CaptionedImage, Error> {
    let caption = block.caption().map(paragraph_element).unwrap_or_default();
    Ok(CaptionedImage::from_path(block.path(), caption)?
        .with_alignment(alignment(block.alignment()))
        .with_width(block.width_mm().map(elements::mm_from_f64)))
}

fn push_block(document: &mut genpdf::Document, block: &Block) -> Result<(), PdfBuildError> {
    match block {
        Block::Paragraph(paragraph) => document.push(paragraph_element(paragraph)),
        Block::Table(table) => {
            document.push(elements::table_element(table).map_err(PdfBuildError::Render)?)
        }
        Block::Image(image) => {
            document.push(image_element(image).map_err(PdfBuildError::Image)?)
        }
    }
    document.push(Break::new(BLOCK_SPACING_LINES));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::richtext::Span;

    #[test]
    fn from_document_keeps_section_order_and_title() {
        let date = chrono::NaiveDate::from_ymd_opt(2024, 4, 1).expect("valid date");
        let document = ReportDocument::new(
            "ISO-Compliant LCA Report for Widget",
            date,
            vec![Section::new("First"), Section::new("Second")],
        );

        let builder = PdfBuilder::from_document(document);
        assert_eq!(builder.title(), "ISO-Compliant LCA Report for Widget");
        let titles: Vec<_> = builder.sections().iter().map(Section::title).collect();
        assert_eq!(titles, ["First", "Second"]);
        assert_eq!(builder.subtitle.as_deref(), Some("Report date: 2024-04-01"));
    }

    #[test]
    fn paragraph_element_keeps_every_span() {
        let paragraph = RichParagraph::new(vec![Span::new("Scope: ").bold(), Span::new("all")])
            .with_alignment(HorizontalAlignment::Center);
        // Building the element must not drop styled spans.
        let _ = paragraph_element(&paragraph);
        assert_eq!(paragraph.plain_text(), "Scope: all");
    }

    #[test]
    fn missing_chart_file_fails_to_embed() {
        let dir = tempfile::tempdir().expect("temp dir");
        let block = ImageBlock::new(dir.path().join("absent.png"));
        assert!(image_element(&block).is_err());
    }

    #[test]
    fn stored_png_is_embedded() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("chart.png");
        crate::chart::BarChart::new(vec![crate::chart::Bar {
            label: "Transport".into(),
            value: 2.0,
        }])
        .with_size(120, 80)
        .save(&path)
        .expect("save chart");

        let block = ImageBlock::new(path).with_width_mm(Some(100.0));
        assert!(image_element(&block).is_ok());
    }
}
