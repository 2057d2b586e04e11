//! Totals and hotspot detection over an [`InventoryTable`].

use crate::inventory::{InventoryTable, Stage};

/// Column totals and the stage with the highest greenhouse gas emissions.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Aggregates {
    pub energy_total: f64,
    pub ghg_total: f64,
    pub water_total: f64,
    pub top_stage: Stage,
}

/// Sums every metric column and picks the top GHG contributor.
///
/// When several stages share the maximum GHG value the earliest stage in table order wins.
pub fn compute_aggregates(table: &InventoryTable) -> Aggregates {
    let mut energy_total = 0.0;
    let mut ghg_total = 0.0;
    let mut water_total = 0.0;
    let mut top: Option<(Stage, f64)> = None;

    for record in table.iter() {
        energy_total += record.energy_mj;
        ghg_total += record.ghg_kg_co2e;
        water_total += record.water_l;

        match top {
            Some((_, best)) if record.ghg_kg_co2e <= best => {}
            _ => top = Some((record.stage, record.ghg_kg_co2e)),
        }
    }

    Aggregates {
        energy_total,
        ghg_total,
        water_total,
        top_stage: top.map_or(Stage::ALL[0], |(stage, _)| stage),
    }
}
