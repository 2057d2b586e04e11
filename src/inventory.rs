//! Synthetic life-cycle inventory generation.
//!
//! The inventory is placeholder data: every metric is an independent uniform draw and does not
//! describe any real product.  Sampling goes through the [`Sampler`] trait so callers can swap the
//! random source for a deterministic one.

use std::fmt;
use std::ops::Range;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Range for the energy metric in megajoules.
pub const ENERGY_RANGE_MJ: Range<f64> = 10.0..100.0;
/// Range for greenhouse gas emissions in kilograms of CO2 equivalent.
pub const GHG_RANGE_KG_CO2E: Range<f64> = 1.0..10.0;
/// Range for water use in litres.
pub const WATER_RANGE_L: Range<f64> = 5.0..50.0;

/// Number of life-cycle stages in every inventory.
pub const STAGE_COUNT: usize = 5;

/// Life-cycle stages in presentation order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Stage {
    RawMaterialExtraction,
    Manufacturing,
    Transport,
    UsePhase,
    EndOfLife,
}

impl Stage {
    /// All stages in the order they appear in the report.
    pub const ALL: [Stage; STAGE_COUNT] = [
        Stage::RawMaterialExtraction,
        Stage::Manufacturing,
        Stage::Transport,
        Stage::UsePhase,
        Stage::EndOfLife,
    ];

    /// Human-readable label used in tables, captions and narrative text.
    pub fn label(self) -> &'static str {
        match self {
            Stage::RawMaterialExtraction => "Raw material extraction",
            Stage::Manufacturing => "Manufacturing",
            Stage::Transport => "Transport",
            Stage::UsePhase => "Use phase",
            Stage::EndOfLife => "End-of-life",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Source of uniformly distributed values.
pub trait Sampler {
    /// Returns a value in the half-open `range`.
    fn sample(&mut self, range: Range<f64>) -> f64;
}

/// [`Sampler`] backed by a seedable standard RNG.
#[derive(Clone, Debug)]
pub struct RandomSampler {
    rng: StdRng,
}

impl RandomSampler {
    /// Creates a sampler seeded from operating system entropy.
    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    /// Creates a reproducible sampler from a fixed seed.
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Seeded when `seed` is given, entropy-backed otherwise.
    pub fn from_seed(seed: Option<u64>) -> Self {
        seed.map_or_else(Self::from_entropy, Self::seeded)
    }
}

impl Default for RandomSampler {
    fn default() -> Self {
        Self::from_entropy()
    }
}

impl Sampler for RandomSampler {
    fn sample(&mut self, range: Range<f64>) -> f64 {
        self.rng.gen_range(range)
    }
}

impl<S: Sampler + ?Sized> Sampler for &mut S {
    fn sample(&mut self, range: Range<f64>) -> f64 {
        (**self).sample(range)
    }
}

/// Metrics recorded for a single life-cycle stage.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct InventoryRecord {
    pub stage: Stage,
    pub energy_mj: f64,
    pub ghg_kg_co2e: f64,
    pub water_l: f64,
}

/// Inventory of all five stages in presentation order.
///
/// The table can only be built from per-stage metrics, so the stage column is always the fixed
/// stage list without gaps or duplicates.
#[derive(Clone, Debug, PartialEq)]
pub struct InventoryTable {
    records: [InventoryRecord; STAGE_COUNT],
}

impl InventoryTable {
    /// Builds a table from `(energy_mj, ghg_kg_co2e, water_l)` triples given in stage order.
    pub fn from_metrics(metrics: [(f64, f64, f64); STAGE_COUNT]) -> Self {
        let mut index = 0;
        let records = Stage::ALL.map(|stage| {
            let (energy_mj, ghg_kg_co2e, water_l) = metrics[index];
            index += 1;
            InventoryRecord {
                stage,
                energy_mj,
                ghg_kg_co2e,
                water_l,
            }
        });
        Self { records }
    }

    /// Returns the records in stage order.
    pub fn records(&self) -> &[InventoryRecord] {
        &self.records
    }

    /// Looks up the record for `stage`.
    pub fn record(&self, stage: Stage) -> &InventoryRecord {
        // Records are stored in `Stage::ALL` order.
        &self.records[stage as usize]
    }

    pub fn iter(&self) -> impl Iterator<Item = &InventoryRecord> {
        self.records.iter()
    }
}

/// Draws a fresh inventory from `sampler`.
///
/// Values are drawn column by column: five energy values, then five GHG values, then five water
/// values, each in stage order.
pub fn generate_inventory<S: Sampler>(mut sampler: S) -> InventoryTable {
    let energy = Stage::ALL.map(|_| sampler.sample(ENERGY_RANGE_MJ));
    let ghg = Stage::ALL.map(|_| sampler.sample(GHG_RANGE_KG_CO2E));
    let water = Stage::ALL.map(|_| sampler.sample(WATER_RANGE_L));

    let mut index = 0;
    let metrics = Stage::ALL.map(|_| {
        let triple = (energy[index], ghg[index], water[index]);
        index += 1;
        triple
    });
    InventoryTable::from_metrics(metrics)
}
