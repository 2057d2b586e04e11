//! Narrative sections of the LCA report.
//!
//! Sections are assembled in a fixed order from the inventory and its aggregates.  Method and
//! standard names appear as labels only; nothing here evaluates them.

use std::path::Path;

use chrono::NaiveDate;

use crate::aggregate::Aggregates;
use crate::inventory::InventoryTable;
use crate::model::{
    Block, Cell, HorizontalAlignment, ImageBlock, ReportDocument, RichParagraph, Section,
    TableBlock,
};
use crate::richtext::{labelled, Span};

/// Width of the embedded chart in millimetres.
pub const CHART_WIDTH_MM: f64 = 170.0;

const SCOPE: &str = "Cradle-to-grave";
const IMPACT_METHODS: &str = "IPCC 2021 (GWP100), ReCiPe Midpoint (H)";
const STANDARD: &str = "ISO 14040/44";

/// Column headings of the inventory grid.
pub const INVENTORY_HEADER: [&str; 4] = [
    "Process",
    "Energy (MJ)",
    "GHG Emissions (kg CO2-eq)",
    "Water Use (L)",
];

/// The five report sections in document order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SectionKind {
    ExecutiveSummary,
    GoalAndScope,
    InventoryAnalysis,
    ImpactAssessment,
    Interpretation,
}

impl SectionKind {
    pub const ALL: [SectionKind; 5] = [
        SectionKind::ExecutiveSummary,
        SectionKind::GoalAndScope,
        SectionKind::InventoryAnalysis,
        SectionKind::ImpactAssessment,
        SectionKind::Interpretation,
    ];

    /// Numbered heading printed in the document.
    pub fn title(self) -> &'static str {
        match self {
            SectionKind::ExecutiveSummary => "1. Executive Summary",
            SectionKind::GoalAndScope => "2. Goal and Scope",
            SectionKind::InventoryAnalysis => "3. Inventory Analysis",
            SectionKind::ImpactAssessment => "4. Life Cycle Impact Assessment (LCIA)",
            SectionKind::Interpretation => "5. Interpretation",
        }
    }

    /// Stable identifier used for bookmarks.
    pub fn identifier(self) -> &'static str {
        match self {
            SectionKind::ExecutiveSummary => "executive-summary",
            SectionKind::GoalAndScope => "goal-and-scope",
            SectionKind::InventoryAnalysis => "inventory-analysis",
            SectionKind::ImpactAssessment => "impact-assessment",
            SectionKind::Interpretation => "interpretation",
        }
    }

    fn section(self) -> Section {
        Section::new(self.title()).with_identifier(Some(self.identifier().to_owned()))
    }
}

/// Report title for `product_name`.
pub fn report_title(product_name: &str) -> String {
    format!("ISO-Compliant LCA Report for {product_name}")
}

fn ghg(value: f64) -> String {
    format!("{value:.2} kg CO2-eq")
}

fn energy(value: f64) -> String {
    format!("{value:.2} MJ")
}

fn water(value: f64) -> String {
    format!("{value:.2} L")
}

fn bullet(label: &str, value: String) -> Block {
    let mut spans = vec![Span::new("- ")];
    spans.extend(labelled(label, value));
    Block::paragraph(spans)
}

fn executive_summary(product_name: &str, aggregates: &Aggregates) -> Section {
    SectionKind::ExecutiveSummary.section().with_blocks([
        Block::text(format!(
            "This report presents an ISO-compliant Life Cycle Assessment (LCA) of {product_name}."
        )),
        Block::paragraph(labelled("Scope: ", SCOPE)),
        Block::paragraph(labelled(
            "Functional Unit: ",
            format!("1 unit of {product_name}"),
        )),
        Block::paragraph(labelled("Impact Methods: ", IMPACT_METHODS)),
        Block::paragraph(vec![Span::new("Key Results:").bold()]),
        bullet("GHG Emissions: ", ghg(aggregates.ghg_total)),
        bullet("Energy Use: ", energy(aggregates.energy_total)),
        bullet("Water Use: ", water(aggregates.water_total)),
        bullet(
            "Primary impact contributor: ",
            aggregates.top_stage.to_string(),
        ),
    ])
}

fn goal_and_scope(product_name: &str) -> Section {
    SectionKind::GoalAndScope.section().with_blocks([
        Block::text(format!(
            "The goal of this study is to quantify the environmental impacts of {product_name} \
             across its full life cycle."
        )),
        Block::text(format!(
            "The study follows {STANDARD} standards, considering a cradle-to-grave boundary, \
             using test inventory data."
        )),
    ])
}

/// Inventory grid: stage names as text, metrics as numbers.
pub fn inventory_table(table: &InventoryTable) -> TableBlock {
    table.iter().fold(TableBlock::new(INVENTORY_HEADER), |grid, record| {
        grid.with_row(vec![
            Cell::text(record.stage.label()),
            Cell::Number(record.energy_mj),
            Cell::Number(record.ghg_kg_co2e),
            Cell::Number(record.water_l),
        ])
    })
}

fn inventory_analysis(table: &InventoryTable) -> Section {
    SectionKind::InventoryAnalysis.section().with_blocks([
        Block::text(
            "The following inventory summarizes the key processes and associated resource use:",
        ),
        Block::Table(inventory_table(table)),
    ])
}

fn chart_caption(table: &InventoryTable) -> RichParagraph {
    let bars = table
        .iter()
        .map(|record| format!("{} ({:.2})", record.stage, record.ghg_kg_co2e))
        .collect::<Vec<_>>()
        .join(", ");
    RichParagraph::new(vec![
        Span::new("Figure 1: ").bold(),
        Span::new(format!(
            "GHG emissions (kg CO2-eq) by life-cycle stage. Bars from left to right: {bars}."
        )),
    ])
    .with_alignment(HorizontalAlignment::Center)
}

fn impact_assessment(table: &InventoryTable, aggregates: &Aggregates, chart: &Path) -> Section {
    let figure = ImageBlock::new(chart)
        .with_caption(Some(chart_caption(table)))
        .with_alignment(HorizontalAlignment::Center)
        .with_width_mm(Some(CHART_WIDTH_MM));

    SectionKind::ImpactAssessment.section().with_blocks([
        Block::text(
            "Using the IPCC and ReCiPe Midpoint (H) methods, the following impact categories \
             were assessed:",
        ),
        bullet("Total GHG Emissions: ", ghg(aggregates.ghg_total)),
        bullet("Total Water Use: ", water(aggregates.water_total)),
        bullet("Total Energy Use: ", energy(aggregates.energy_total)),
        Block::Image(figure),
    ])
}

fn interpretation(aggregates: &Aggregates) -> Section {
    SectionKind::Interpretation.section().with_blocks([
        Block::paragraph(labelled(
            "The process contributing most to GHG emissions is: ",
            format!("{}.", aggregates.top_stage),
        )),
        Block::text("Energy and material inputs are primary drivers of environmental impact."),
        Block::text(
            "The results highlight hotspots and can guide further improvement opportunities.",
        ),
    ])
}

/// Builds the report sections in document order.
///
/// The PNG at `chart` is embedded in the impact assessment; it should show the GHG value of
/// every stage in table order.
pub fn build_sections(
    product_name: &str,
    table: &InventoryTable,
    aggregates: &Aggregates,
    chart: &Path,
) -> Vec<Section> {
    vec![
        executive_summary(product_name, aggregates),
        goal_and_scope(product_name),
        inventory_analysis(table),
        impact_assessment(table, aggregates, chart),
        interpretation(aggregates),
    ]
}

/// Assembles the complete report document.
pub fn build_document(
    product_name: &str,
    date: NaiveDate,
    table: &InventoryTable,
    aggregates: &Aggregates,
    chart: &Path,
) -> ReportDocument {
    ReportDocument::new(
        report_title(product_name),
        date,
        build_sections(product_name, table, aggregates, chart),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::compute_aggregates;
    use crate::inventory::{generate_inventory, RandomSampler};

    fn widget_table() -> InventoryTable {
        InventoryTable::from_metrics([
            (50.0, 5.0, 20.0),
            (80.0, 8.0, 30.0),
            (20.0, 2.0, 10.0),
            (10.0, 1.0, 5.0),
            (15.0, 1.5, 8.0),
        ])
    }

    fn widget_sections() -> Vec<Section> {
        let table = widget_table();
        let aggregates = compute_aggregates(&table);
        build_sections(
            "Widget",
            &table,
            &aggregates,
            Path::new("chart.png"),
        )
    }

    #[test]
    fn sections_follow_fixed_order() {
        for seed in [1, 2, 3] {
            let table = generate_inventory(RandomSampler::seeded(seed));
            let sections = build_sections(
                "Generic Product",
                &table,
                &compute_aggregates(&table),
                Path::new("chart.png"),
            );
            let titles: Vec<_> = sections.iter().map(Section::title).collect();
            let expected: Vec<_> = SectionKind::ALL.iter().map(|kind| kind.title()).collect();
            assert_eq!(titles, expected);
        }
    }

    #[test]
    fn executive_summary_reports_widget_figures() {
        let summary = widget_sections()[0].plain_text();
        assert!(summary.contains("17.50 kg CO2-eq"), "{summary}");
        assert!(summary.contains("175.00 MJ"), "{summary}");
        assert!(summary.contains("73.00 L"), "{summary}");
        assert!(summary.contains("Primary impact contributor: Manufacturing"));
        assert!(summary.contains("Scope: Cradle-to-grave"));
        assert!(summary.contains("Functional Unit: 1 unit of Widget"));
        assert!(summary.contains("IPCC 2021 (GWP100), ReCiPe Midpoint (H)"));
    }

    #[test]
    fn goal_and_scope_names_product_and_standard() {
        let text = widget_sections()[1].plain_text();
        assert!(text.contains("environmental impacts of Widget"));
        assert!(text.contains("ISO 14040/44"));
    }

    #[test]
    fn inventory_grid_has_header_and_typed_cells() {
        let sections = widget_sections();
        let grid = sections[2].tables().next().expect("inventory grid");

        assert_eq!(grid.header(), INVENTORY_HEADER);
        assert_eq!(grid.rows().len(), 5);
        assert_eq!(grid.rows()[0][0], Cell::text("Raw material extraction"));
        assert_eq!(grid.rows()[4][2], Cell::Number(1.5));
        assert_eq!(grid.rows()[4][2].display(), "1.50");
    }

    #[test]
    fn impact_assessment_embeds_chart_after_totals() {
        let sections = widget_sections();
        let impact = &sections[3];
        assert!(matches!(impact.blocks().last(), Some(Block::Image(_))));

        let image = impact.images().next().expect("chart block");
        assert_eq!(image.path(), Path::new("chart.png"));
        assert_eq!(image.width_mm(), Some(CHART_WIDTH_MM));

        let caption = image.caption().expect("caption").plain_text();
        assert!(caption.contains("Raw material extraction (5.00), Manufacturing (8.00)"));

        let text = impact.plain_text();
        let ghg = text.find("Total GHG Emissions: 17.50 kg CO2-eq").expect("ghg");
        let water = text.find("Total Water Use: 73.00 L").expect("water");
        let energy = text.find("Total Energy Use: 175.00 MJ").expect("energy");
        assert!(ghg < water && water < energy);
    }

    #[test]
    fn interpretation_names_top_contributor() {
        let text = widget_sections()[4].plain_text();
        assert!(text.contains("contributing most to GHG emissions is: Manufacturing."));
        assert!(text.contains("hotspots"));
    }

    #[test]
    fn document_title_uses_product_name() {
        let table = widget_table();
        let date = NaiveDate::from_ymd_opt(2024, 5, 6).expect("date");
        let document = build_document(
            "Widget",
            date,
            &table,
            &compute_aggregates(&table),
            Path::new("chart.png"),
        );
        assert_eq!(document.title(), "ISO-Compliant LCA Report for Widget");
        assert_eq!(document.date(), date);
        assert_eq!(document.sections().len(), 5);
    }
}
