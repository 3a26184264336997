//! agg-runner: headless aggregation runner.
//!
//! Loads (or seeds) a household dataset, runs the standard chart
//! aggregations, and writes renderer-ready JSON tables.
//!
//! Usage:
//!   agg-runner --db households.db --coords counties.json --out out
//!   agg-runner --seed-sample 2000 --seed 42 --out out

use anyhow::Result;
use enburden_core::{
    aggregator::{Aggregator, BracketRequest, GeographicRequest},
    coords::CoordinateMap,
    derive::{Derivation, EndUseFold},
    fields,
    reduce::{AggregationResult, BracketSpec, ReduceOp},
    sample::{self, SampleConfig},
    source::HouseholdSource,
    types::GEOID_COUNTY_SCALE,
};
use std::env;
use std::fs;
use std::path::Path;

/// What this run produced, written alongside the chart tables so the
/// renderer can locate them without guessing filenames.
#[derive(serde::Serialize)]
struct RunManifest {
    db: String,
    seed: u64,
    sampled_households: usize,
    counties: usize,
    marker_counties: usize,
    outputs: Vec<&'static str>,
}

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let db = str_arg(&args, "--db", ":memory:");
    let out_dir = str_arg(&args, "--out", "./out");
    let coords_path = args
        .windows(2)
        .find(|w| w[0] == "--coords")
        .map(|w| w[1].clone());
    let seed = parse_arg(&args, "--seed", 42u64);
    let counties = parse_arg(&args, "--counties", 8u32);
    let default_sample: usize = if db == ":memory:" { 2_000 } else { 0 };
    let sample_size = parse_arg(&args, "--seed-sample", default_sample);

    println!("agg-runner");
    println!("  db:      {db}");
    println!("  out:     {out_dir}");
    println!("  coords:  {}", coords_path.as_deref().unwrap_or("(synthetic)"));
    if sample_size > 0 {
        println!("  sample:  {sample_size} households, {counties} counties, seed {seed}");
    }
    println!();

    let source = HouseholdSource::open(&db)?;
    if sample_size > 0 {
        sample::generate(
            &source,
            &SampleConfig { households: sample_size, counties, seed },
        )?;
    }

    let coords = match &coords_path {
        Some(path) => CoordinateMap::load(Path::new(path))?,
        None => CoordinateMap::from_json(&synthetic_coords(counties))?,
    };

    let agg = Aggregator::new(source);
    fs::create_dir_all(&out_dir)?;

    // ── Costs by county ────────────────────────────────────────────

    let consumption = agg.source().fields_with_prefix(fields::CONSUMPTION)?;
    let rates = agg.source().fields_with_prefix(fields::RATE)?;
    let factors = agg.source().fields_with_prefix(fields::EMISSION_FACTOR)?;

    let fold = EndUseFold::fans_into_cooling();
    let cost_ops = derived_sum_ops(&consumption, &fold, fields::COST);
    let mut cost_fields = consumption.clone();
    cost_fields.extend(rates);

    let cost_req = GeographicRequest {
        key_field: "geoid".to_string(),
        fields: cost_fields,
        fold: Some(fold.clone()),
        derive: vec![Derivation::Cost],
        scale: GEOID_COUNTY_SCALE,
        ops: cost_ops,
    };
    let costs = agg.geographic(&cost_req)?;
    write_table(&out_dir, "costs_by_county.json", &costs)?;

    // ── Emission markers by county ─────────────────────────────────

    let emission_ops = derived_sum_ops(&consumption, &fold, fields::EMISSIONS);
    let mut emission_fields = consumption.clone();
    emission_fields.extend(factors);

    let emission_req = GeographicRequest {
        key_field: "geoid".to_string(),
        fields: emission_fields,
        fold: Some(fold),
        derive: vec![Derivation::Emissions],
        scale: GEOID_COUNTY_SCALE,
        ops: emission_ops,
    };
    let markers = agg.geographic_with_markers(&emission_req, &coords)?;
    fs::write(
        Path::new(&out_dir).join("emission_markers.json"),
        serde_json::to_string_pretty(&markers)?,
    )?;

    // ── Burden brackets ────────────────────────────────────────────

    let bracket_req = BracketRequest {
        ratio_field: "burden_pct".to_string(),
        fields: vec!["gap_usd".to_string()],
        fold: None,
        derive: Vec::new(),
        brackets: BracketSpec::burden_default(),
        ops: vec![
            ReduceOp::Count("households".to_string()),
            ReduceOp::Sum("gap_usd".to_string()),
        ],
    };
    let brackets = agg.bracketed(&bracket_req)?;
    write_table(&out_dir, "burden_brackets.json", &brackets)?;

    // ── Spending by bracket ────────────────────────────────────────

    let spending_req = BracketRequest {
        ratio_field: "burden_pct".to_string(),
        fields: cost_req.fields.clone(),
        fold: cost_req.fold.clone(),
        derive: vec![Derivation::Cost],
        brackets: BracketSpec::burden_default(),
        ops: derived_sum_ops(&consumption, &EndUseFold::fans_into_cooling(), fields::COST),
    };
    let spending = agg.bracketed(&spending_req)?;
    write_table(&out_dir, "costs_by_bracket.json", &spending)?;

    let manifest = RunManifest {
        db,
        seed,
        sampled_households: sample_size,
        counties: costs.groups.len(),
        marker_counties: markers.len(),
        outputs: vec![
            "costs_by_county.json",
            "emission_markers.json",
            "burden_brackets.json",
            "costs_by_bracket.json",
        ],
    };
    fs::write(
        Path::new(&out_dir).join("manifest.json"),
        serde_json::to_string_pretty(&manifest)?,
    )?;

    print_summary(&costs, markers.len(), &brackets);
    Ok(())
}

/// One Sum op per derived column, accounting for the fold: the folded
/// end-use's columns disappear, their target's appear once.
fn derived_sum_ops(consumption: &[String], fold: &EndUseFold, prefix: &str) -> Vec<ReduceOp> {
    let mut ops: Vec<ReduceOp> = Vec::new();
    for name in consumption {
        let effective = if fields::end_use_of(name) == Some(fold.from.as_str()) {
            match fields::fuel_of(name) {
                Some(fuel) => fields::consumption_field(&fold.into, fuel),
                None => continue,
            }
        } else {
            name.clone()
        };
        if let Some(derived) = fields::with_prefix(&effective, prefix) {
            if !ops.iter().any(|op| op.output_name() == derived) {
                ops.push(ReduceOp::Sum(derived));
            }
        }
    }
    ops
}

/// Deterministic marker coordinates for the synthetic sample
/// counties: two slightly offset points per county on a simple grid.
fn synthetic_coords(counties: u32) -> String {
    let mut entries = Vec::with_capacity(counties as usize);
    for i in 0..counties {
        let county = 53_001 + i as u64;
        let x = -122.0 + (i % 4) as f64 * 1.5;
        let y = 46.0 + (i / 4) as f64 * 1.2;
        entries.push(format!(
            "\"{county}\": [[{x:.3}, {y:.3}], [{:.3}, {y:.3}]]",
            x + 0.15
        ));
    }
    format!("{{{}}}", entries.join(", "))
}

fn write_table(out_dir: &str, name: &str, table: &AggregationResult) -> Result<()> {
    let path = Path::new(out_dir).join(name);
    fs::write(&path, serde_json::to_string_pretty(table)?)?;
    log::info!("wrote {}", path.display());
    Ok(())
}

fn print_summary(costs: &AggregationResult, marker_count: usize, brackets: &AggregationResult) {
    println!("=== AGGREGATION SUMMARY ===");
    println!("  counties:        {}", costs.groups.len());
    println!("  marker counties: {marker_count}");

    let total_cost: f64 = costs.groups.iter().map(|(_, t)| t.iter().sum::<f64>()).sum();
    println!("  total cost:      ${total_cost:.0}");

    println!();
    println!("=== BURDEN BRACKETS ===");
    for (key, totals) in &brackets.groups {
        let label = match key {
            enburden_core::reduce::GroupKey::Bracket(l) => l.clone(),
            enburden_core::reduce::GroupKey::County(c) => c.to_string(),
        };
        let households = totals.first().copied().unwrap_or(0.0);
        let gap = totals.get(1).copied().unwrap_or(0.0);
        println!("  {label:>6}: {households:>7.0} households | gap ${gap:.0}");
    }
}

fn str_arg(args: &[String], flag: &str, default: &str) -> String {
    args.windows(2)
        .find(|w| w[0] == flag)
        .map(|w| w[1].clone())
        .unwrap_or_else(|| default.to_string())
}

fn parse_arg<T: std::str::FromStr + Copy>(args: &[String], flag: &str, default: T) -> T {
    args.windows(2)
        .find(|w| w[0] == flag)
        .and_then(|w| w[1].parse().ok())
        .unwrap_or(default)
}
