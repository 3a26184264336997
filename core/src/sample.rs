//! Deterministic sample dataset generator.
//!
//! RULE: nothing here may call a platform RNG. All randomness flows
//! from one Pcg64Mcg seeded by the master seed, so the same seed
//! produces a byte-identical dataset and therefore identical
//! aggregates. Used by the runner's `--seed-sample` mode and by
//! tests; real runs load an externally produced household file.

use crate::{
    error::AggResult,
    fields,
    source::HouseholdSource,
    table::{Cell, FieldInfo},
    types::{Geoid, GEOID_COUNTY_SCALE},
};
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg64Mcg;

/// Which (end-use, fuel) consumption columns the sample carries.
/// Cooling and fans/pumps are always electric.
pub const END_USE_FUELS: &[(&str, &[&str])] = &[
    ("heating", &["electricity", "natural_gas", "fuel_oil", "propane"]),
    ("cooling", &["electricity"]),
    ("water_heating", &["electricity", "natural_gas", "propane"]),
    ("fans_pumps", &["electricity"]),
    ("other", &["electricity"]),
];

pub const FUELS: &[&str] = &["electricity", "natural_gas", "fuel_oil", "propane"];

// $/kWh-equivalent price and kg CO2e/kWh factor per fuel.
const FUEL_RATES: &[(&str, f64)] = &[
    ("electricity", 0.145),
    ("natural_gas", 0.035),
    ("fuel_oil", 0.095),
    ("propane", 0.085),
];
const FUEL_FACTORS: &[(&str, f64)] = &[
    ("electricity", 0.386),
    ("natural_gas", 0.181),
    ("fuel_oil", 0.264),
    ("propane", 0.215),
];

const SAMPLE_STATE: Geoid = 53;
const BATCH: usize = 1024;

#[derive(Debug, Clone)]
pub struct SampleConfig {
    pub households: usize,
    pub counties: u32,
    pub seed: u64,
}

impl Default for SampleConfig {
    fn default() -> Self {
        Self { households: 2_000, counties: 8, seed: 42 }
    }
}

/// The full sample schema: geoid, income, burden fields, consumption
/// per (end-use, fuel), rate and emission factor per fuel.
pub fn sample_schema() -> Vec<FieldInfo> {
    let mut schema = vec![
        FieldInfo::int("geoid"),
        FieldInfo::float("income"),
        FieldInfo::float("burden_pct"),
        FieldInfo::float("gap_usd"),
    ];
    for (end_use, fuels) in END_USE_FUELS {
        for fuel in *fuels {
            schema.push(FieldInfo::float(&fields::consumption_field(end_use, fuel)));
        }
    }
    for fuel in FUELS {
        schema.push(FieldInfo::float(&fields::rate_field(fuel)));
    }
    for fuel in FUELS {
        schema.push(FieldInfo::float(&fields::emission_factor_field(fuel)));
    }
    schema
}

/// Populate `source` with a fresh sample household table.
pub fn generate(source: &HouseholdSource, cfg: &SampleConfig) -> AggResult<()> {
    let schema = sample_schema();
    source.create_table(&schema)?;

    let mut rng = Pcg64Mcg::seed_from_u64(cfg.seed);
    let mut batch: Vec<Vec<Cell>> = Vec::with_capacity(BATCH);

    for _ in 0..cfg.households {
        batch.push(household_row(&mut rng, cfg));
        if batch.len() == BATCH {
            source.append_rows(&schema, &batch)?;
            batch.clear();
        }
    }
    if !batch.is_empty() {
        source.append_rows(&schema, &batch)?;
    }

    log::info!(
        "sample: {} households across {} counties (seed {})",
        cfg.households,
        cfg.counties,
        cfg.seed
    );
    Ok(())
}

fn household_row(rng: &mut Pcg64Mcg, cfg: &SampleConfig) -> Vec<Cell> {
    // Tract-level GEOID under a synthetic state: county code 53001..,
    // six tract digits below the county scale.
    let county = SAMPLE_STATE * 1_000 + 1 + rng.gen_range(0..cfg.counties) as Geoid;
    let tract = 100_100 + rng.gen_range(0..800u64) * 100;
    let geoid = county * GEOID_COUNTY_SCALE + tract;

    // Income: skewed low, long right tail.
    let income = 18_000.0 * rng.gen_range(0.0f64..1.0).max(1e-3).powf(-0.45);
    let income = income.min(450_000.0);

    // Fuel prices vary a little per household (regional variation);
    // emission factors are per-fuel constants.
    let mut rates = Vec::with_capacity(FUELS.len());
    for (_, base) in FUEL_RATES {
        rates.push(base * rng.gen_range(0.9..1.1));
    }

    // Consumption in kWh-equivalent per year. Not every household
    // uses every fuel.
    let mut consumption = Vec::new();
    for (end_use, fuels) in END_USE_FUELS {
        for fuel in *fuels {
            let uses_fuel = match *fuel {
                "electricity" => true,
                "natural_gas" => rng.gen_bool(0.55),
                "fuel_oil" => rng.gen_bool(0.08),
                "propane" => rng.gen_bool(0.12),
                _ => false,
            };
            let quantity = if !uses_fuel {
                0.0
            } else {
                match *end_use {
                    "heating" => rng.gen_range(2_000.0..14_000.0),
                    "cooling" => rng.gen_range(300.0..3_500.0),
                    "water_heating" => rng.gen_range(1_000.0..4_500.0),
                    "fans_pumps" => rng.gen_range(150.0..900.0),
                    _ => rng.gen_range(1_500.0..6_000.0),
                }
            };
            consumption.push((*fuel, quantity));
        }
    }

    // Annual bill from the same rates the deriver will use, so the
    // stored burden ratio is consistent with derived costs.
    let mut annual_cost = 0.0;
    for (fuel, quantity) in &consumption {
        let i = FUELS.iter().position(|f| f == fuel).unwrap_or(0);
        annual_cost += quantity * rates[i];
    }
    let burden_pct = annual_cost / income * 100.0;
    let gap_usd = (annual_cost - 0.06 * income).max(0.0);

    let mut row = vec![
        Cell::Int(geoid as i64),
        Cell::Float(income),
        Cell::Float(burden_pct),
        Cell::Float(gap_usd),
    ];
    for (_, quantity) in consumption {
        row.push(Cell::Float(quantity));
    }
    for rate in rates {
        row.push(Cell::Float(rate));
    }
    for (_, factor) in FUEL_FACTORS {
        row.push(Cell::Float(*factor));
    }
    row
}
