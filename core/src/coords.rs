//! County marker coordinates.
//!
//! The renderer places two colocated-but-offset markers per county
//! (one for cost, one for emissions), so the coordinate file carries
//! a sequence of `[x, y]` pairs per county id; only the first two are
//! used.
//!
//! Join semantics are deliberately asymmetric with the reducers: a
//! county with no coordinate entry is metadata we cannot plot, and is
//! dropped silently; an invalid measurement value aborts the whole
//! computation (see reduce.rs). Missing metadata drops a row, bad
//! data never does.

use crate::{
    error::{AggError, AggResult},
    reduce::{AggregationResult, GroupKey},
    types::Geoid,
};
use serde::Serialize;
use std::collections::HashMap;
use std::path::Path;

/// Two representative points per county.
pub type MarkerPoints = [[f64; 2]; 2];

#[derive(Debug)]
pub struct CoordinateMap {
    points: HashMap<Geoid, MarkerPoints>,
}

impl CoordinateMap {
    /// Load a JSON file of `{ "<county id>": [[x, y], ...], ... }`.
    pub fn load(path: &Path) -> AggResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    pub fn from_json(text: &str) -> AggResult<Self> {
        let raw: HashMap<String, Vec<[f64; 2]>> = serde_json::from_str(text)?;
        let mut points = HashMap::with_capacity(raw.len());
        for (key, pairs) in raw {
            let id: Geoid = key
                .parse()
                .map_err(|_| AggError::BadCoordinateKey { key: key.clone() })?;
            if pairs.len() < 2 {
                // Unplottable metadata; the join will drop this
                // county anyway.
                log::debug!("county {id}: only {} coordinate pair(s), skipping", pairs.len());
                continue;
            }
            points.insert(id, [pairs[0], pairs[1]]);
        }
        Ok(Self { points })
    }

    pub fn get(&self, county: Geoid) -> Option<&MarkerPoints> {
        self.points.get(&county)
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// One county's totals with its two marker points attached.
#[derive(Debug, Clone, Serialize)]
pub struct CountyMarkers {
    pub county: Geoid,
    pub totals: Vec<f64>,
    pub points: MarkerPoints,
}

/// Inner join of a geographic result against the coordinate map.
///
/// Counties absent from the map are dropped, not nulled; matched
/// counties keep their totals unchanged.
pub fn attach_markers(result: &AggregationResult, coords: &CoordinateMap) -> Vec<CountyMarkers> {
    let mut joined = Vec::with_capacity(result.groups.len());
    let mut dropped = 0usize;

    for (key, totals) in &result.groups {
        let GroupKey::County(county) = key else {
            continue;
        };
        match coords.get(*county) {
            Some(points) => joined.push(CountyMarkers {
                county: *county,
                totals: totals.clone(),
                points: *points,
            }),
            None => {
                dropped += 1;
                log::debug!("county {county}: no coordinate entry, dropped from join");
            }
        }
    }

    if dropped > 0 {
        let total = joined.len() + dropped;
        if dropped * 4 > total {
            log::warn!("coordinate join dropped {dropped} of {total} counties");
        } else {
            log::debug!("coordinate join dropped {dropped} of {total} counties");
        }
    }
    joined
}
