use lca_report::builder::PdfBuilder;
use lca_report::fonts;
use lca_report::{
    build_document, compute_aggregates, generate_inventory, BarChart, ChartFont, RandomSampler,
};
use sha2::{Digest, Sha256};

const SKIP_HINT: &str =
    "no usable fonts. Set LCA_REPORT_FONTS_DIR or copy assets/fonts next to the binary.";

/// Builds the seeded sample report; the chart file lives in the returned directory.
fn sample_builder(seed: u64) -> (tempfile::TempDir, PdfBuilder) {
    let table = generate_inventory(RandomSampler::seeded(seed));
    let aggregates = compute_aggregates(&table);

    let dir = tempfile::tempdir().expect("temp dir");
    let chart_path = dir.path().join("chart.png");
    BarChart::from_inventory(&table)
        .with_font(ChartFont::load_default().expect("chart font"))
        .save(&chart_path)
        .expect("save chart");

    let date = chrono::NaiveDate::from_ymd_opt(2024, 1, 15).expect("valid date");
    let builder = PdfBuilder::from_document(build_document(
        "Widget",
        date,
        &table,
        &aggregates,
        &chart_path,
    ));
    (dir, builder)
}

fn render_sample_pdf(seed: u64) -> Option<lca_report::RenderedPdf> {
    if !fonts::default_fonts_available() {
        return None;
    }
    let (_dir, builder) = sample_builder(seed);
    Some(builder.render().expect("render sample pdf"))
}

fn scrub_pdf(bytes: &[u8]) -> Vec<u8> {
    fn scrub_segment(data: &mut [u8], tag: &[u8], terminator: u8) {
        let mut index = 0;
        while index + tag.len() < data.len() {
            if !data[index..].starts_with(tag) {
                index += 1;
                continue;
            }
            let mut cursor = index + tag.len();
            while cursor < data.len() && data[cursor] != terminator {
                let keep = terminator != b')'
                    && matches!(data[cursor], b'<' | b'>' | b' ' | b'\n' | b'\r' | b'\t');
                if !keep {
                    data[cursor] = b'0';
                }
                cursor += 1;
            }
            index = cursor;
        }
    }

    fn scrub_xml(data: &mut [u8], start: &[u8], end: &[u8]) {
        let mut offset = 0;
        while let Some(start_pos) = data[offset..]
            .windows(start.len())
            .position(|window| window == start)
        {
            let start_index = offset + start_pos + start.len();
            let Some(end_pos) = data[start_index..]
                .windows(end.len())
                .position(|window| window == end)
            else {
                break;
            };
            for byte in &mut data[start_index..start_index + end_pos] {
                if !matches!(*byte, b'<' | b'>' | b'/' | b' ' | b'\n' | b'\r' | b'\t') {
                    *byte = b'0';
                }
            }
            offset = start_index + end_pos + end.len();
        }
    }

    let mut normalized = bytes.to_vec();
    scrub_segment(&mut normalized, b"/CreationDate(", b')');
    scrub_segment(&mut normalized, b"/ModDate(", b')');
    scrub_segment(&mut normalized, b"/Producer(", b')');
    scrub_segment(&mut normalized, b"/ID[", b']');
    for field in [
        "xmp:CreateDate",
        "xmp:ModifyDate",
        "xmp:MetadataDate",
        "xmpMM:DocumentID",
        "xmpMM:InstanceID",
        "xmpMM:VersionID",
    ] {
        let start = format!("<{field}>");
        let end = format!("</{field}>");
        scrub_xml(&mut normalized, start.as_bytes(), end.as_bytes());
    }
    normalized
}

fn normalized_hash(bytes: &[u8]) -> [u8; 32] {
    Sha256::digest(scrub_pdf(bytes)).into()
}

#[test]
fn renders_pdf_with_every_section_placed() {
    let Some(rendered) = render_sample_pdf(11) else {
        eprintln!("Skipping renders_pdf_with_every_section_placed: {SKIP_HINT}");
        return;
    };

    assert!(rendered.bytes.starts_with(b"%PDF"), "output should be a PDF");
    assert_eq!(rendered.section_pages.len(), 5);

    let pages: Vec<usize> = rendered
        .section_pages
        .iter()
        .map(|page| page.expect("every section heading is placed"))
        .collect();
    assert_eq!(pages[0], 1, "report starts on the first page");
    assert!(
        pages.windows(2).all(|pair| pair[0] <= pair[1]),
        "sections appear in order: {pages:?}"
    );
}

#[test]
fn rendering_is_deterministic() {
    let (Some(first), Some(second)) = (render_sample_pdf(5), render_sample_pdf(5)) else {
        eprintln!("Skipping rendering_is_deterministic: {SKIP_HINT}");
        return;
    };

    assert_eq!(first.bytes.len(), second.bytes.len(), "PDF sizes should match");
    assert_eq!(
        normalized_hash(&first.bytes),
        normalized_hash(&second.bytes),
        "PDF renders must be deterministic after metadata normalization"
    );
}

#[cfg(feature = "bookmarks")]
#[test]
fn bookmarks_add_outline() {
    if !fonts::default_fonts_available() {
        eprintln!("Skipping bookmarks_add_outline: {SKIP_HINT}");
        return;
    }

    let (_dir, builder) = sample_builder(7);
    let rendered = builder
        .render_with_bookmarks()
        .expect("render with bookmarks");
    let document = lopdf::Document::load_mem(&rendered.bytes).expect("parse pdf");
    let catalog_id = document
        .trailer
        .get(b"Root")
        .and_then(lopdf::Object::as_reference)
        .expect("catalog reference");
    let catalog = document.get_dictionary(catalog_id).expect("catalog");
    assert!(catalog.get(b"Outlines").is_ok());
}
