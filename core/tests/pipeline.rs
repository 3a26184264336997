//! End-to-end pipeline tests over a generated sample dataset:
//! load -> fold -> derive -> reduce -> join through the Aggregator.

use enburden_core::{
    aggregator::{Aggregator, BracketRequest, GeographicRequest},
    coords::CoordinateMap,
    derive::{Derivation, EndUseFold},
    fields,
    reduce::{BracketSpec, GroupKey, ReduceOp},
    sample::{self, SampleConfig},
    source::HouseholdSource,
    table::{Cell, FieldInfo},
};

const HOUSEHOLDS: usize = 500;
const COUNTIES: u32 = 6;

fn sample_aggregator(seed: u64) -> Aggregator {
    let source = HouseholdSource::in_memory().unwrap();
    sample::generate(
        &source,
        &SampleConfig { households: HOUSEHOLDS, counties: COUNTIES, seed },
    )
    .unwrap();
    Aggregator::new(source)
}

fn cost_request(agg: &Aggregator) -> GeographicRequest {
    let consumption = agg.source().fields_with_prefix(fields::CONSUMPTION).unwrap();
    let rates = agg.source().fields_with_prefix(fields::RATE).unwrap();
    let fold = EndUseFold::fans_into_cooling();

    let mut ops = vec![ReduceOp::Count("households".to_string())];
    for name in &consumption {
        if fields::end_use_of(name) == Some(fold.from.as_str()) {
            continue; // folds into cooling, already covered
        }
        if let Some(cost) = fields::with_prefix(name, fields::COST) {
            ops.push(ReduceOp::Sum(cost));
        }
    }

    let mut load = consumption;
    load.extend(rates);
    GeographicRequest {
        key_field: "geoid".to_string(),
        fields: load,
        fold: Some(fold),
        derive: vec![Derivation::Cost],
        scale: enburden_core::types::GEOID_COUNTY_SCALE,
        ops,
    }
}

/// County cost aggregation covers every sampled household, lands on
/// the expected county keys, and produces finite non-negative totals.
#[test]
fn county_costs_cover_all_households() {
    let agg = sample_aggregator(42);
    let result = agg.geographic(&cost_request(&agg)).unwrap();

    assert!(!result.groups.is_empty() && result.groups.len() <= COUNTIES as usize);

    let mut counted = 0.0;
    for (key, totals) in &result.groups {
        let GroupKey::County(county) = key else {
            panic!("bracket key in geographic result")
        };
        assert!(
            (53_001..53_001 + COUNTIES as u64).contains(county),
            "unexpected county {county}"
        );
        counted += totals[0];
        for v in totals {
            assert!(v.is_finite() && *v >= 0.0, "bad total {v} for county {county}");
        }
    }
    assert_eq!(counted as usize, HOUSEHOLDS);
}

/// Bracket counts partition the population: they sum to the number
/// of households.
#[test]
fn bracket_counts_partition_households() {
    let agg = sample_aggregator(42);
    let result = agg
        .bracketed(&BracketRequest {
            ratio_field: "burden_pct".to_string(),
            fields: vec!["gap_usd".to_string()],
            fold: None,
            derive: Vec::new(),
            brackets: BracketSpec::burden_default(),
            ops: vec![
                ReduceOp::Count("households".to_string()),
                ReduceOp::Sum("gap_usd".to_string()),
            ],
        })
        .unwrap();

    let total: f64 = result.groups.iter().map(|(_, t)| t[0]).sum();
    assert_eq!(total as usize, HOUSEHOLDS);

    let gap: f64 = result.groups.iter().map(|(_, t)| t[1]).sum();
    assert!(gap.is_finite() && gap >= 0.0);
}

/// The marker join drops only unmapped counties and leaves matched
/// totals untouched.
#[test]
fn marker_join_preserves_matched_totals() {
    let agg = sample_aggregator(42);
    let req = cost_request(&agg);
    let unjoined = agg.geographic(&req).unwrap();

    // Map only the first two counties.
    let coords = CoordinateMap::from_json(
        r#"{"53001": [[0.0, 0.0], [0.1, 0.0]], "53002": [[1.0, 0.0], [1.1, 0.0]]}"#,
    )
    .unwrap();
    let joined = agg.geographic_with_markers(&req, &coords).unwrap();

    assert!(joined.len() <= 2);
    for marker in &joined {
        let expected = unjoined
            .totals(&GroupKey::County(marker.county))
            .expect("joined county missing from unjoined result");
        assert_eq!(marker.totals, expected, "join changed totals");
    }
}

/// Spending per bracket: the bracket path runs the same fold and
/// derivation steps as the geographic path, so derived cost columns
/// can be summed per bracket through the one entry point.
#[test]
fn bracketed_sums_derived_costs() {
    let source = HouseholdSource::in_memory().unwrap();
    let schema = vec![
        FieldInfo::float("burden_pct"),
        FieldInfo::float("consumption.heating.electricity"),
        FieldInfo::float("consumption.fans_pumps.electricity"),
        FieldInfo::float("rate.electricity"),
    ];
    source.create_table(&schema).unwrap();
    source
        .append_rows(
            &schema,
            &[
                vec![Cell::Float(2.0), Cell::Float(100.0), Cell::Float(20.0), Cell::Float(2.0)],
                vec![Cell::Float(4.0), Cell::Float(50.0), Cell::Float(10.0), Cell::Float(1.5)],
                vec![Cell::Float(20.0), Cell::Float(10.0), Cell::Float(0.0), Cell::Float(1.0)],
            ],
        )
        .unwrap();

    let agg = Aggregator::new(source);
    let result = agg
        .bracketed(&BracketRequest {
            ratio_field: "burden_pct".to_string(),
            fields: vec![
                "consumption.heating.electricity".to_string(),
                "consumption.fans_pumps.electricity".to_string(),
                "rate.electricity".to_string(),
            ],
            fold: Some(EndUseFold::fans_into_cooling()),
            derive: vec![Derivation::Cost],
            brackets: BracketSpec::burden_default(),
            ops: vec![
                ReduceOp::Sum("cost.heating.electricity".to_string()),
                ReduceOp::Sum("cost.cooling.electricity".to_string()),
            ],
        })
        .unwrap();

    let expect = |label: &str, totals: &[f64]| {
        let key = GroupKey::Bracket(label.to_string());
        assert_eq!(result.totals(&key).unwrap(), totals, "bracket {label}");
    };
    expect("<3%", &[200.0, 40.0]);
    expect("3-6%", &[75.0, 15.0]);
    expect("6-9%", &[0.0, 0.0]);
    expect("15+%", &[10.0, 0.0]);
}

/// Requesting a field the schema lacks fails the whole request.
#[test]
fn unknown_field_fails_request() {
    let agg = sample_aggregator(42);
    let err = agg
        .bracketed(&BracketRequest {
            ratio_field: "burden_pct".to_string(),
            fields: vec!["no_such_field".to_string()],
            fold: None,
            derive: Vec::new(),
            brackets: BracketSpec::burden_default(),
            ops: vec![ReduceOp::Count("households".to_string())],
        })
        .unwrap_err();
    assert!(matches!(err, enburden_core::error::AggError::SchemaMismatch { .. }));
}
