//! The one parameterized aggregation entry point.
//!
//! Every chart the renderer asks for is one of two named modes over
//! the same load -> derive -> reduce pipeline:
//!
//!   - geographic: totals per county, optionally joined with marker
//!     coordinates;
//!   - bracketed: totals per burden bracket, ascending label order.
//!
//! All configuration (field lists, fold rule, derivations, scale,
//! bracket edges, reduce ops) is carried explicitly on the request;
//! there is no module-level state.

use crate::{
    coords::{attach_markers, CoordinateMap, CountyMarkers},
    derive::{derive, fold_end_use, Derivation, EndUseFold},
    error::AggResult,
    reduce::{reduce_by_bracket, reduce_by_county, AggregationResult, BracketSpec, ReduceOp},
    source::HouseholdSource,
    table::Table,
    types::GEOID_COUNTY_SCALE,
};

#[derive(Debug, Clone)]
pub struct GeographicRequest {
    /// The fine-grained identifier column (tract-level GEOID).
    pub key_field: String,
    /// Value columns to load: consumption plus whatever per-fuel
    /// columns the derivations need.
    pub fields: Vec<String>,
    /// End-use fold applied before derivation (fans/pumps -> cooling).
    pub fold: Option<EndUseFold>,
    /// Derivations to run before reducing.
    pub derive: Vec<Derivation>,
    /// Coarsening divisor for the key field.
    pub scale: u64,
    pub ops: Vec<ReduceOp>,
}

impl GeographicRequest {
    /// A tract-to-county request with the standard scale.
    pub fn county(key_field: &str, fields: Vec<String>, ops: Vec<ReduceOp>) -> Self {
        Self {
            key_field: key_field.to_string(),
            fields,
            fold: None,
            derive: Vec::new(),
            scale: GEOID_COUNTY_SCALE,
            ops,
        }
    }
}

#[derive(Debug, Clone)]
pub struct BracketRequest {
    /// The ratio column brackets are assigned from (burden %).
    pub ratio_field: String,
    /// Additional value columns to load: fields to sum directly,
    /// plus whatever the derivations need.
    pub fields: Vec<String>,
    /// End-use fold applied before derivation (fans/pumps -> cooling).
    pub fold: Option<EndUseFold>,
    /// Derivations to run before reducing (spending per bracket sums
    /// derived cost columns).
    pub derive: Vec<Derivation>,
    pub brackets: BracketSpec,
    pub ops: Vec<ReduceOp>,
}

pub struct Aggregator {
    source: HouseholdSource,
}

impl Aggregator {
    pub fn new(source: HouseholdSource) -> Self {
        Self { source }
    }

    pub fn source(&self) -> &HouseholdSource {
        &self.source
    }

    fn load_with(&self, first: &str, rest: &[String]) -> AggResult<Table> {
        let mut requested: Vec<&str> = Vec::with_capacity(rest.len() + 1);
        requested.push(first);
        for f in rest {
            if !requested.contains(&f.as_str()) {
                requested.push(f);
            }
        }
        self.source.load(&requested)
    }

    /// Totals per county.
    pub fn geographic(&self, req: &GeographicRequest) -> AggResult<AggregationResult> {
        let mut table = self.load_with(&req.key_field, &req.fields)?;
        let households = table.num_rows();

        if let Some(fold) = &req.fold {
            fold_end_use(&mut table, fold)?;
        }
        for what in &req.derive {
            derive(&mut table, *what)?;
        }

        let result = reduce_by_county(&table, &req.key_field, req.scale, &req.ops)?;
        log::info!(
            "geographic: {households} households -> {} counties x {} totals",
            result.groups.len(),
            result.fields.len()
        );
        Ok(result)
    }

    /// Totals per county, with marker coordinates joined on.
    pub fn geographic_with_markers(
        &self,
        req: &GeographicRequest,
        coords: &CoordinateMap,
    ) -> AggResult<Vec<CountyMarkers>> {
        Ok(attach_markers(&self.geographic(req)?, coords))
    }

    /// Totals per burden bracket, ascending label order.
    pub fn bracketed(&self, req: &BracketRequest) -> AggResult<AggregationResult> {
        let mut table = self.load_with(&req.ratio_field, &req.fields)?;
        let households = table.num_rows();

        if let Some(fold) = &req.fold {
            fold_end_use(&mut table, fold)?;
        }
        for what in &req.derive {
            derive(&mut table, *what)?;
        }

        let result = reduce_by_bracket(&table, &req.ratio_field, &req.brackets, &req.ops)?;
        log::info!(
            "bracketed: {households} households -> {} brackets x {} totals",
            result.groups.len(),
            result.fields.len()
        );
        Ok(result)
    }
}
