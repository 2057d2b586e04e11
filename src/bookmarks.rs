//! PDF outline for a rendered report, written with `lopdf`.
//!
//! The outline has a single top-level entry for the report that opens on the first page, with
//! one child per placed section.

use std::collections::BTreeMap;
use std::fmt;

use lopdf::{Dictionary, Document, Object, ObjectId};

use crate::model::Section;

const FIRST_PAGE: u32 = 1;

/// Errors raised while adding the outline to a rendered report.
#[derive(Debug)]
pub enum BookmarkError {
    /// The PDF bytes could not be parsed or saved by `lopdf`.
    Parse(lopdf::Error),
    /// The trailer has no usable `/Root` catalog.
    MissingCatalog,
    /// The catalog object is not a dictionary.
    InvalidCatalog,
    /// A section refers to a page the rendered document does not have.
    MissingPage {
        section_index: usize,
        page_number: usize,
    },
}

impl From<lopdf::Error> for BookmarkError {
    fn from(err: lopdf::Error) -> Self {
        Self::Parse(err)
    }
}

impl From<std::io::Error> for BookmarkError {
    fn from(err: std::io::Error) -> Self {
        Self::Parse(err.into())
    }
}

impl fmt::Display for BookmarkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Parse(err) => write!(f, "Failed to read or write the PDF outline: {err}"),
            Self::MissingCatalog => write!(f, "PDF has no document catalog"),
            Self::InvalidCatalog => write!(f, "PDF document catalog is not a dictionary"),
            Self::MissingPage {
                section_index,
                page_number,
            } => write!(
                f,
                "Section {section_index} starts on page {page_number}, which was not rendered"
            ),
        }
    }
}

impl std::error::Error for BookmarkError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Parse(err) => Some(err),
            _ => None,
        }
    }
}

/// One node of the outline tree before it is linked into the document.
struct OutlineNode {
    id: ObjectId,
    title: String,
    identifier: Option<String>,
    page: ObjectId,
}

/// Sibling and parent links of an outline node.
#[derive(Clone, Copy)]
struct Links {
    parent: ObjectId,
    prev: Option<ObjectId>,
    next: Option<ObjectId>,
}

impl OutlineNode {
    fn dictionary(&self, links: Links) -> Dictionary {
        let mut entry = Dictionary::new();
        entry.set("Title", Object::string_literal(self.title.as_str()));
        entry.set(
            "Dest",
            vec![Object::Reference(self.page), Object::Name(b"Fit".to_vec())],
        );
        entry.set("Parent", links.parent);
        if let Some(identifier) = &self.identifier {
            entry.set("NM", Object::string_literal(identifier.as_str()));
        }
        if let Some(prev) = links.prev {
            entry.set("Prev", prev);
        }
        if let Some(next) = links.next {
            entry.set("Next", next);
        }
        entry
    }
}

/// Adds an outline to `pdf_bytes`: the report title on top, its sections underneath.
///
/// `section_pages[i]` is the 1-indexed page on which `sections[i]` starts. Sections without a
/// page are left out; if none is placed the bytes are returned unchanged.
pub fn apply_section_bookmarks(
    pdf_bytes: &[u8],
    report_title: &str,
    sections: &[Section],
    section_pages: &[Option<usize>],
) -> Result<Vec<u8>, BookmarkError> {
    let mut document = Document::load_mem(pdf_bytes)?;
    let pages = document.get_pages();

    let children = section_nodes(&mut document, sections, section_pages, &pages)?;
    let Some(first_page) = pages.get(&FIRST_PAGE).copied().filter(|_| !children.is_empty())
    else {
        return Ok(pdf_bytes.to_vec());
    };

    let outlines_id = document.new_object_id();
    let report = OutlineNode {
        id: document.new_object_id(),
        title: report_title.to_owned(),
        identifier: None,
        page: first_page,
    };

    let mut report_entry = report.dictionary(Links {
        parent: outlines_id,
        prev: None,
        next: None,
    });
    link_children(&mut report_entry, &children);
    document
        .objects
        .insert(report.id, Object::Dictionary(report_entry));

    for (index, child) in children.iter().enumerate() {
        let links = Links {
            parent: report.id,
            prev: index.checked_sub(1).map(|prev| children[prev].id),
            next: children.get(index + 1).map(|next| next.id),
        };
        document
            .objects
            .insert(child.id, Object::Dictionary(child.dictionary(links)));
    }

    let mut outlines = Dictionary::new();
    outlines.set("Type", Object::Name(b"Outlines".to_vec()));
    outlines.set("First", report.id);
    outlines.set("Last", report.id);
    outlines.set("Count", Object::Integer(1 + children.len() as i64));
    document
        .objects
        .insert(outlines_id, Object::Dictionary(outlines));

    let catalog = catalog_mut(&mut document)?;
    catalog.set("Outlines", outlines_id);
    catalog.set("PageMode", Object::Name(b"UseOutlines".to_vec()));

    let mut buffer = Vec::new();
    document.save_to(&mut buffer)?;
    Ok(buffer)
}

/// Points `parent` at its first and last child and keeps it expanded.
fn link_children(parent: &mut Dictionary, children: &[OutlineNode]) {
    if let (Some(first), Some(last)) = (children.first(), children.last()) {
        parent.set("First", first.id);
        parent.set("Last", last.id);
        parent.set("Count", Object::Integer(children.len() as i64));
    }
}

fn catalog_mut(document: &mut Document) -> Result<&mut Dictionary, BookmarkError> {
    let catalog_id = document
        .trailer
        .get(b"Root")
        .and_then(Object::as_reference)
        .map_err(|_| BookmarkError::MissingCatalog)?;
    document
        .objects
        .get_mut(&catalog_id)
        .ok_or(BookmarkError::MissingCatalog)?
        .as_dict_mut()
        .map_err(|_| BookmarkError::InvalidCatalog)
}

fn section_nodes(
    document: &mut Document,
    sections: &[Section],
    section_pages: &[Option<usize>],
    pages: &BTreeMap<u32, ObjectId>,
) -> Result<Vec<OutlineNode>, BookmarkError> {
    sections
        .iter()
        .zip(section_pages)
        .enumerate()
        .filter_map(|(index, (section, page))| page.map(|page| (index, section, page)))
        .map(|(section_index, section, page_number)| {
            let page = u32::try_from(page_number)
                .ok()
                .and_then(|number| pages.get(&number).copied())
                .ok_or(BookmarkError::MissingPage {
                    section_index,
                    page_number,
                })?;
            Ok(OutlineNode {
                id: document.new_object_id(),
                title: section.title().to_owned(),
                identifier: section.identifier().map(str::to_owned),
                page,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use lopdf::dictionary;

    use super::*;

    fn blank_pdf(page_count: usize) -> Vec<u8> {
        let mut document = Document::with_version("1.5");
        let pages_id = document.new_object_id();
        let kids: Vec<Object> = (0..page_count)
            .map(|_| {
                document
                    .add_object(dictionary! { "Type" => "Page", "Parent" => pages_id })
                    .into()
            })
            .collect();
        document.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => page_count as i64,
            }),
        );
        let catalog_id =
            document.add_object(dictionary! { "Type" => "Catalog", "Pages" => pages_id });
        document.trailer.set("Root", catalog_id);

        let mut bytes = Vec::new();
        document.save_to(&mut bytes).expect("save blank pdf");
        bytes
    }

    fn sections(count: usize) -> Vec<Section> {
        (1..=count)
            .map(|n| Section::new(format!("{n}. Section")))
            .collect()
    }

    #[test]
    fn nests_placed_sections_under_report_entry() {
        let bytes = apply_section_bookmarks(
            &blank_pdf(2),
            "ISO-Compliant LCA Report for Widget",
            &sections(3),
            &[Some(1), None, Some(2)],
        )
        .expect("apply outline");

        let mut document = Document::load_mem(&bytes).expect("reload");
        let outlines_id = catalog_mut(&mut document)
            .expect("catalog")
            .get(b"Outlines")
            .and_then(Object::as_reference)
            .expect("outlines reference");
        let outlines = document.get_dictionary(outlines_id).expect("outlines");
        assert_eq!(outlines.get(b"Count").and_then(Object::as_i64).ok(), Some(3));

        let report_id = outlines
            .get(b"First")
            .and_then(Object::as_reference)
            .expect("report entry");
        let report = document.get_dictionary(report_id).expect("report dictionary");
        assert_eq!(report.get(b"Count").and_then(Object::as_i64).ok(), Some(2));
    }

    #[test]
    fn unknown_page_is_rejected() {
        let err = apply_section_bookmarks(&blank_pdf(1), "Report", &sections(1), &[Some(4)])
            .expect_err("page 4 does not exist");
        assert!(matches!(
            err,
            BookmarkError::MissingPage {
                section_index: 0,
                page_number: 4
            }
        ));
    }

    #[test]
    fn unplaced_sections_leave_pdf_untouched() {
        let pdf = blank_pdf(1);
        let bytes =
            apply_section_bookmarks(&pdf, "Report", &sections(2), &[None, None]).expect("apply");
        assert_eq!(bytes, pdf);
    }
}
