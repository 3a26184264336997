//! Grouped reduction.
//!
//! Two grouping strategies cover every chart the renderer asks for:
//!
//!   - geographic: coarsen the GEOID key by integer division and sum
//!     per county;
//!   - bracket: bucket a ratio field against ascending half-open
//!     edges and sum/count per bracket, label order preserved.
//!
//! A NaN or infinite value in any field required for reduction aborts
//! the whole call; totals are never silently wrong.

use crate::{
    error::{AggError, AggResult},
    table::Table,
    types::Geoid,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// What a group of households is keyed by.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum GroupKey {
    County(Geoid),
    Bracket(String),
}

/// Per-group reduced totals, handed to the renderer.
///
/// `fields` names the output columns; each group's totals line up
/// with it. Bracket groups are in canonical ascending-label order;
/// county groups are sorted by id for determinism.
#[derive(Debug, Clone, Serialize)]
pub struct AggregationResult {
    pub fields: Vec<String>,
    pub groups: Vec<(GroupKey, Vec<f64>)>,
}

impl AggregationResult {
    /// Totals for one group key, if present.
    pub fn totals(&self, key: &GroupKey) -> Option<&[f64]> {
        self.groups
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, t)| t.as_slice())
    }
}

/// One reduction per output column: sum a field, or count households.
#[derive(Debug, Clone)]
pub enum ReduceOp {
    Sum(String),
    /// Count of households in the group, under the given output name.
    Count(String),
}

impl ReduceOp {
    pub fn output_name(&self) -> &str {
        match self {
            ReduceOp::Sum(f) => f,
            ReduceOp::Count(n) => n,
        }
    }
}

// Resolve the Sum columns up front; Count needs no input column.
fn sum_inputs<'t>(table: &'t Table, ops: &[ReduceOp]) -> AggResult<Vec<Option<&'t [f64]>>> {
    ops.iter()
        .map(|op| match op {
            ReduceOp::Sum(field) => table.float(field).map(Some),
            ReduceOp::Count(_) => Ok(None),
        })
        .collect()
}

fn finite(field: &str, row: usize, value: f64) -> AggResult<f64> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(AggError::UnboundedValue { field: field.to_string(), row })
    }
}

// ── Geographic reduction ───────────────────────────────────────────

/// Sum per coarse geographic key: `coarse = floor(fine / scale)`.
///
/// Output keys are exactly the coarse keys present in the input,
/// never more. Key values must be non-negative; a negative id is a
/// data error, not a new group.
pub fn reduce_by_county(
    table: &Table,
    key_field: &str,
    scale: u64,
    ops: &[ReduceOp],
) -> AggResult<AggregationResult> {
    if scale == 0 {
        return Err(AggError::InvalidScale);
    }
    let keys = table.int(key_field)?;
    let inputs = sum_inputs(table, ops)?;

    let mut acc: BTreeMap<Geoid, Vec<f64>> = BTreeMap::new();
    for row in 0..table.num_rows() {
        let fine = keys[row];
        if fine < 0 {
            return Err(AggError::NegativeKey { field: key_field.to_string(), row });
        }
        let coarse = fine as Geoid / scale;
        let totals = acc.entry(coarse).or_insert_with(|| vec![0.0; ops.len()]);
        for (j, op) in ops.iter().enumerate() {
            match (op, inputs[j]) {
                (ReduceOp::Sum(field), Some(values)) => {
                    totals[j] += finite(field, row, values[row])?;
                }
                _ => totals[j] += 1.0,
            }
        }
    }

    Ok(AggregationResult {
        fields: ops.iter().map(|op| op.output_name().to_string()).collect(),
        groups: acc
            .into_iter()
            .map(|(k, t)| (GroupKey::County(k), t))
            .collect(),
    })
}

// ── Bracket reduction ──────────────────────────────────────────────

/// Ascending half-open brackets over a ratio field.
///
/// Bracket 0 is closed at its left edge; every other bracket is
/// left-exclusive/right-inclusive. Values beyond the last edge land
/// in the open-ended top bracket, values below the first edge in the
/// bottom one, so the family partitions the real line.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BracketSpec {
    edges: Vec<f64>,
    labels: Vec<String>,
}

impl BracketSpec {
    pub fn new(edges: Vec<f64>, labels: Vec<String>) -> AggResult<Self> {
        if edges.len() < 2 {
            return Err(AggError::InvalidBrackets {
                reason: "need at least two edges".to_string(),
            });
        }
        if labels.len() != edges.len() - 1 {
            return Err(AggError::InvalidBrackets {
                reason: format!(
                    "{} edges require {} labels, got {}",
                    edges.len(),
                    edges.len() - 1,
                    labels.len()
                ),
            });
        }
        if edges.iter().any(|e| !e.is_finite()) {
            return Err(AggError::InvalidBrackets { reason: "edges must be finite".to_string() });
        }
        if edges.windows(2).any(|w| w[0] >= w[1]) {
            return Err(AggError::InvalidBrackets {
                reason: "edges must be strictly ascending".to_string(),
            });
        }
        Ok(Self { edges, labels })
    }

    /// The canonical burden brackets used by the affordability charts.
    pub fn burden_default() -> Self {
        // Validated inputs, cannot fail.
        Self {
            edges: vec![0.0, 3.0, 6.0, 9.0, 12.0, 15.0, 100.0],
            labels: ["<3%", "3-6%", "6-9%", "9-12%", "12-15%", "15+%"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// The bracket a finite value falls in.
    pub fn index_of(&self, value: f64) -> usize {
        for i in 0..self.labels.len() {
            if value <= self.edges[i + 1] {
                return i;
            }
        }
        self.labels.len() - 1
    }
}

/// Bucket each household by `ratio_field`, then sum/count per
/// bracket. Every label appears in the output, in ascending order;
/// empty brackets carry zero totals.
pub fn reduce_by_bracket(
    table: &Table,
    ratio_field: &str,
    spec: &BracketSpec,
    ops: &[ReduceOp],
) -> AggResult<AggregationResult> {
    let ratios = table.float(ratio_field)?;
    let inputs = sum_inputs(table, ops)?;

    let mut acc = vec![vec![0.0; ops.len()]; spec.labels.len()];
    for row in 0..table.num_rows() {
        let bucket = spec.index_of(finite(ratio_field, row, ratios[row])?);
        for (j, op) in ops.iter().enumerate() {
            match (op, inputs[j]) {
                (ReduceOp::Sum(field), Some(values)) => {
                    acc[bucket][j] += finite(field, row, values[row])?;
                }
                _ => acc[bucket][j] += 1.0,
            }
        }
    }

    Ok(AggregationResult {
        fields: ops.iter().map(|op| op.output_name().to_string()).collect(),
        groups: spec
            .labels
            .iter()
            .cloned()
            .map(GroupKey::Bracket)
            .zip(acc)
            .collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec() -> BracketSpec {
        BracketSpec::burden_default()
    }

    #[test]
    fn lowest_bracket_is_left_closed() {
        assert_eq!(spec().index_of(0.0), 0);
        assert_eq!(spec().index_of(3.0), 0);
    }

    #[test]
    fn interior_edges_are_left_exclusive() {
        // Just past an edge belongs to the next bracket up.
        assert_eq!(spec().index_of(3.0000001), 1);
        assert_eq!(spec().index_of(6.0), 1);
    }

    #[test]
    fn beyond_last_edge_goes_to_top_bracket() {
        assert_eq!(spec().index_of(100.0), 5);
        assert_eq!(spec().index_of(250.0), 5);
    }

    #[test]
    fn below_first_edge_goes_to_bottom_bracket() {
        assert_eq!(spec().index_of(-1.0), 0);
    }

    #[test]
    fn brackets_partition_without_gap_or_overlap() {
        let s = spec();
        // Walk a fine grid over and past the edge range; each value
        // maps to exactly one index and indices never decrease.
        let mut prev = 0;
        let mut v = -2.0;
        while v < 120.0 {
            let i = s.index_of(v);
            assert!(i < s.labels().len());
            assert!(i >= prev, "bracket index decreased at {v}");
            prev = i;
            v += 0.01;
        }
    }

    #[test]
    fn descending_edges_rejected() {
        let err = BracketSpec::new(vec![0.0, 5.0, 5.0], vec!["a".into(), "b".into()]);
        assert!(matches!(err, Err(AggError::InvalidBrackets { .. })));
    }

    #[test]
    fn label_count_must_match_edges() {
        let err = BracketSpec::new(vec![0.0, 5.0, 10.0], vec!["a".into()]);
        assert!(matches!(err, Err(AggError::InvalidBrackets { .. })));
    }
}
