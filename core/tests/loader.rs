//! Field loader tests: schema discovery, column pruning, and
//! schema-mismatch behavior.

use enburden_core::{
    error::AggError,
    source::HouseholdSource,
    table::{Cell, ColumnKind, FieldInfo},
};

fn seeded_source() -> HouseholdSource {
    let source = HouseholdSource::in_memory().unwrap();
    let schema = vec![
        FieldInfo::int("geoid"),
        FieldInfo::float("income"),
        FieldInfo::float("consumption.heating.electricity"),
        FieldInfo::float("consumption.heating.natural_gas"),
        FieldInfo::float("rate.electricity"),
        FieldInfo::float("rate.natural_gas"),
    ];
    source.create_table(&schema).unwrap();
    source
        .append_rows(
            &schema,
            &[
                vec![
                    Cell::Int(53_001_100_100),
                    Cell::Float(42_000.0),
                    Cell::Float(100.0),
                    Cell::Float(50.0),
                    Cell::Float(2.0),
                    Cell::Float(1.5),
                ],
                vec![
                    Cell::Int(53_002_200_200),
                    Cell::Float(85_000.0),
                    Cell::Float(80.0),
                    Cell::Float(0.0),
                    Cell::Float(2.1),
                    Cell::Float(1.4),
                ],
            ],
        )
        .unwrap();
    source
}

/// The schema is queryable without reading any row data.
#[test]
fn schema_reports_names_and_kinds() {
    let source = seeded_source();
    let schema = source.schema().unwrap();

    assert_eq!(schema.len(), 6);
    assert_eq!(schema[0].name, "geoid");
    assert_eq!(schema[0].kind, ColumnKind::Int);
    assert_eq!(schema[1].name, "income");
    assert_eq!(schema[1].kind, ColumnKind::Float);
}

/// Only the requested columns are materialized, in request order.
#[test]
fn load_prunes_to_requested_columns() {
    let source = seeded_source();
    let table = source
        .load(&["income", "consumption.heating.electricity"])
        .unwrap();

    assert_eq!(table.num_rows(), 2);
    assert_eq!(table.num_columns(), 2);
    let names: Vec<&str> = table.field_names().collect();
    assert_eq!(names, vec!["income", "consumption.heating.electricity"]);
    assert!(!table.contains("geoid"), "unrequested column was materialized");
}

/// A request naming an absent field fails before any read.
#[test]
fn unknown_field_is_schema_mismatch() {
    let source = seeded_source();
    let err = source
        .load(&["income", "consumption.heating.kerosene"])
        .unwrap_err();

    match err {
        AggError::SchemaMismatch { field } => {
            assert_eq!(field, "consumption.heating.kerosene");
        }
        other => panic!("expected SchemaMismatch, got {other}"),
    }
}

/// Pattern filtering: prefix at a dot boundary plus fuel suffix.
#[test]
fn fields_matching_prefix_and_fuel() {
    let source = seeded_source();
    let matched = source.fields_matching("consumption", "electricity").unwrap();

    assert_eq!(matched, vec!["consumption.heating.electricity"]);

    let all_consumption = source.fields_with_prefix("consumption").unwrap();
    assert_eq!(all_consumption.len(), 2);
}

/// Integer columns load as integers (GEOIDs survive losslessly).
#[test]
fn geoid_column_loads_as_integers() {
    let source = seeded_source();
    let table = source.load(&["geoid"]).unwrap();

    assert_eq!(table.int("geoid").unwrap(), &[53_001_100_100, 53_002_200_200]);
}
