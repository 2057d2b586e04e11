//! Data structures describing the logical content of a report.
//!
//! The model is independent of the layout engine: sections are plain values holding paragraphs,
//! tables and images, and only [`crate::builder`] knows how to turn them into `genpdf` elements.

use std::path::{Path, PathBuf};

use chrono::NaiveDate;

use crate::richtext::{self, Span};

/// Horizontal placement of paragraphs and images.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum HorizontalAlignment {
    #[default]
    Left,
    Center,
}

/// Rich text paragraph carrying inline styling information and alignment metadata.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RichParagraph {
    spans: Vec<Span>,
    alignment: HorizontalAlignment,
}

impl RichParagraph {
    /// Creates a paragraph from the provided spans using left alignment.
    pub fn new(spans: impl Into<Vec<Span>>) -> Self {
        Self {
            spans: spans.into(),
            ..Self::default()
        }
    }

    pub fn spans(&self) -> &[Span] {
        &self.spans
    }

    pub fn alignment(&self) -> HorizontalAlignment {
        self.alignment
    }

    /// Sets the alignment and returns the updated paragraph.
    pub fn with_alignment(mut self, alignment: HorizontalAlignment) -> Self {
        self.alignment = alignment;
        self
    }

    /// Returns the paragraph text without styling.
    pub fn plain_text(&self) -> String {
        richtext::plain_text(&self.spans)
    }
}

/// Image file placed in the document flow with an optional caption underneath.
///
/// The width is stored in millimetres and the image keeps its aspect ratio when scaled.  The file
/// is read when the document is rendered.
#[derive(Clone, Debug, PartialEq)]
pub struct ImageBlock {
    path: PathBuf,
    caption: Option<RichParagraph>,
    alignment: HorizontalAlignment,
    width_mm: Option<f64>,
}

impl ImageBlock {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            caption: None,
            alignment: HorizontalAlignment::Left,
            width_mm: None,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn caption(&self) -> Option<&RichParagraph> {
        self.caption.as_ref()
    }

    pub fn alignment(&self) -> HorizontalAlignment {
        self.alignment
    }

    pub fn width_mm(&self) -> Option<f64> {
        self.width_mm
    }

    pub fn with_caption(mut self, caption: impl Into<Option<RichParagraph>>) -> Self {
        self.caption = caption.into();
        self
    }

    pub fn with_alignment(mut self, alignment: HorizontalAlignment) -> Self {
        self.alignment = alignment;
        self
    }

    /// Constrains the rendered width (in millimetres) and returns the updated block.
    pub fn with_width_mm(mut self, width_mm: impl Into<Option<f64>>) -> Self {
        self.width_mm = width_mm.into();
        self
    }
}

/// A single grid value.
///
/// Whether a value is numeric is decided when the table is built; rendering only asks the cell for
/// its display text.
#[derive(Clone, Debug, PartialEq)]
pub enum Cell {
    Number(f64),
    Text(String),
}

impl Cell {
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }

    /// Display form: numbers rounded to two decimals, text verbatim.
    pub fn display(&self) -> String {
        match self {
            Cell::Number(value) => format!("{value:.2}"),
            Cell::Text(value) => value.clone(),
        }
    }
}

/// Grid with a header row and equally weighted columns.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TableBlock {
    header: Vec<String>,
    rows: Vec<Vec<Cell>>,
}

impl TableBlock {
    pub fn new<I, S>(header: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            header: header.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    /// Appends a row and returns the updated table.
    pub fn with_row(mut self, row: Vec<Cell>) -> Self {
        self.rows.push(row);
        self
    }

    pub fn header(&self) -> &[String] {
        &self.header
    }

    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }

    pub fn column_count(&self) -> usize {
        self.header.len()
    }
}

/// Individual content blocks that make up a section.
#[derive(Clone, Debug, PartialEq)]
pub enum Block {
    Paragraph(RichParagraph),
    Table(TableBlock),
    Image(ImageBlock),
}

impl Block {
    /// Convenience helper for building a paragraph block.
    pub fn paragraph(spans: impl Into<Vec<Span>>) -> Self {
        Self::Paragraph(RichParagraph::new(spans))
    }

    /// Convenience helper for a paragraph made of one unstyled span.
    pub fn text(text: impl Into<String>) -> Self {
        Self::paragraph(vec![Span::new(text)])
    }
}

/// Logical representation of a document section.
#[derive(Clone, Debug, PartialEq)]
pub struct Section {
    identifier: Option<String>,
    title: String,
    blocks: Vec<Block>,
}

impl Section {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            identifier: None,
            title: title.into(),
            blocks: Vec::new(),
        }
    }

    /// Returns the section identifier used for bookmarks.
    pub fn identifier(&self) -> Option<&str> {
        self.identifier.as_deref()
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn with_identifier(mut self, identifier: impl Into<Option<String>>) -> Self {
        self.identifier = identifier.into();
        self
    }

    /// Appends a block and returns the updated section.
    pub fn with_block(mut self, block: Block) -> Self {
        self.blocks.push(block);
        self
    }

    pub fn with_blocks<I>(mut self, blocks: I) -> Self
    where
        I: IntoIterator<Item = Block>,
    {
        self.blocks.extend(blocks);
        self
    }

    /// Text of every paragraph in the section joined by newlines.
    pub fn plain_text(&self) -> String {
        self.blocks
            .iter()
            .filter_map(|block| match block {
                Block::Paragraph(paragraph) => Some(paragraph.plain_text()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn tables(&self) -> impl Iterator<Item = &TableBlock> {
        self.blocks.iter().filter_map(|block| match block {
            Block::Table(table) => Some(table),
            _ => None,
        })
    }

    pub fn images(&self) -> impl Iterator<Item = &ImageBlock> {
        self.blocks.iter().filter_map(|block| match block {
            Block::Image(image) => Some(image),
            _ => None,
        })
    }
}

/// Complete report: title, date and ordered sections.
#[derive(Clone, Debug, PartialEq)]
pub struct ReportDocument {
    title: String,
    date: NaiveDate,
    sections: Vec<Section>,
}

impl ReportDocument {
    pub fn new(title: impl Into<String>, date: NaiveDate, sections: Vec<Section>) -> Self {
        Self {
            title: title.into(),
            date,
            sections,
        }
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    pub fn into_sections(self) -> Vec<Section> {
        self.sections
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn number_cells_round_to_two_decimals() {
        assert_eq!(Cell::Number(12.345_67).display(), "12.35");
        assert_eq!(Cell::Number(50.0).display(), "50.00");
        assert_eq!(Cell::text("Use phase").display(), "Use phase");
    }

    #[test]
    fn plain_text_skips_non_paragraph_blocks() {
        let section = Section::new("Inventory")
            .with_block(Block::text("Lead-in"))
            .with_block(Block::Table(TableBlock::new(["A"]).with_row(vec![Cell::Number(1.0)])))
            .with_block(Block::Image(ImageBlock::new("chart.png")))
            .with_block(Block::text("Tail"));

        assert_eq!(section.plain_text(), "Lead-in\nTail");
        assert_eq!(section.tables().count(), 1);
        assert_eq!(section.images().count(), 1);
    }
}
