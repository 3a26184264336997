//! Cost and emission derivation.
//!
//! Every `consumption.<end_use>.<fuel>` column is multiplied by the
//! matching per-fuel column (`rate.<fuel>` or `emission_factor.<fuel>`)
//! to produce one derived column at the same granularity
//! (`cost.<end_use>.<fuel>` / `emissions.<end_use>.<fuel>`).
//!
//! A consumption column whose fuel has no rate/factor column is a
//! data-quality error and aborts the run; it is never coerced to
//! zero.

use crate::{
    error::{AggError, AggResult},
    fields,
    table::{Column, Table},
};

/// Which derived quantity to produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Derivation {
    Cost,
    Emissions,
}

impl Derivation {
    /// Prefix of the derived output columns.
    pub fn output_prefix(self) -> &'static str {
        match self {
            Derivation::Cost => fields::COST,
            Derivation::Emissions => fields::EMISSIONS,
        }
    }

    /// Prefix of the per-fuel multiplier columns.
    pub fn per_fuel_prefix(self) -> &'static str {
        match self {
            Derivation::Cost => fields::RATE,
            Derivation::Emissions => fields::EMISSION_FACTOR,
        }
    }
}

/// Fold one end-use's consumption into another, same fuel, then drop
/// the source columns.
///
/// The fans/pumps sub-load is always electric, so its consumption is
/// attributed to space cooling before any cost or emission is
/// derived.
#[derive(Debug, Clone)]
pub struct EndUseFold {
    pub from: String,
    pub into: String,
}

impl EndUseFold {
    /// The standard fold: fans/pumps into cooling.
    pub fn fans_into_cooling() -> Self {
        Self { from: "fans_pumps".to_string(), into: "cooling".to_string() }
    }
}

/// Apply a fold to every matching consumption column. Target columns
/// that do not exist yet are created; source columns are dropped.
pub fn fold_end_use(table: &mut Table, fold: &EndUseFold) -> AggResult<()> {
    let sources: Vec<String> = table
        .field_names()
        .filter(|n| fields::is_consumption(n) && fields::end_use_of(n) == Some(fold.from.as_str()))
        .map(String::from)
        .collect();

    for name in sources {
        let fuel = match fields::fuel_of(&name) {
            Some(f) => f.to_string(),
            None => continue,
        };
        let target = fields::consumption_field(&fold.into, &fuel);

        let source_col = match table.remove(&name) {
            Some(Column::Float(v)) => v,
            Some(other) => {
                // Put it back untouched; a non-REAL consumption
                // column is a schema problem the deriver will report.
                table.insert(&name, other);
                return Err(AggError::WrongKind { field: name, wanted: "REAL" });
            }
            None => continue,
        };

        if table.contains(&target) {
            let dst = table.float_mut(&target)?;
            for (d, s) in dst.iter_mut().zip(&source_col) {
                *d += s;
            }
        } else {
            table.insert(&target, Column::Float(source_col));
        }
        log::debug!("folded '{name}' into '{target}'");
    }
    Ok(())
}

/// Derive one output column per consumption column.
///
/// Returns the names of the columns created, in the order the
/// consumption columns appear in the table.
pub fn derive(table: &mut Table, what: Derivation) -> AggResult<Vec<String>> {
    let consumption: Vec<String> = table
        .field_names()
        .filter(|n| fields::is_consumption(n))
        .map(String::from)
        .collect();

    let mut created = Vec::with_capacity(consumption.len());
    for name in consumption {
        let wanted = match fields::fuel_of(&name) {
            Some(fuel) => format!("{}.{fuel}", what.per_fuel_prefix()),
            None => {
                return Err(AggError::MissingRateOrFactor {
                    consumption: name,
                    wanted: format!("{}.<fuel>", what.per_fuel_prefix()),
                })
            }
        };
        if !table.contains(&wanted) {
            return Err(AggError::MissingRateOrFactor { consumption: name, wanted });
        }

        let product: Vec<f64> = {
            let quantity = table.float(&name)?;
            let per_unit = table.float(&wanted)?;
            quantity.iter().zip(per_unit).map(|(q, r)| q * r).collect()
        };

        let out = match fields::with_prefix(&name, what.output_prefix()) {
            Some(out) => out,
            None => continue, // unreachable for structured names
        };
        table.insert(&out, Column::Float(product));
        created.push(out);
    }
    Ok(created)
}
