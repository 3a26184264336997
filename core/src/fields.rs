//! Field-name grammar.
//!
//! RULE: Every column name in the household dataset follows
//! `quantity[.end_use].fuel`, dot-separated, lowercase:
//!
//!   consumption.heating.electricity     (per end-use, per fuel)
//!   rate.natural_gas                    (per fuel)
//!   emission_factor.fuel_oil            (per fuel)
//!   cost.heating.electricity            (derived)
//!   emissions.heating.electricity       (derived)
//!
//! Scalar per-household fields (`geoid`, `income`, `burden_pct`,
//! `gap_usd`) are bare names with no dots.

/// Prefix for raw energy-quantity columns.
pub const CONSUMPTION: &str = "consumption";
/// Prefix for per-fuel price columns.
pub const RATE: &str = "rate";
/// Prefix for per-fuel CO2e-mass columns.
pub const EMISSION_FACTOR: &str = "emission_factor";
/// Prefix for derived dollar columns.
pub const COST: &str = "cost";
/// Prefix for derived CO2e columns.
pub const EMISSIONS: &str = "emissions";

/// The fuel code of a structured field name: its last dot-separated
/// segment. Bare scalar names have no fuel.
pub fn fuel_of(name: &str) -> Option<&str> {
    let (_, fuel) = name.rsplit_once('.')?;
    Some(fuel)
}

/// The end-use of a three-segment field name (`prefix.end_use.fuel`).
pub fn end_use_of(name: &str) -> Option<&str> {
    let mut parts = name.split('.');
    let _prefix = parts.next()?;
    let end_use = parts.next()?;
    // Only valid if a fuel segment follows.
    parts.next()?;
    Some(end_use)
}

pub fn consumption_field(end_use: &str, fuel: &str) -> String {
    format!("{CONSUMPTION}.{end_use}.{fuel}")
}

pub fn rate_field(fuel: &str) -> String {
    format!("{RATE}.{fuel}")
}

pub fn emission_factor_field(fuel: &str) -> String {
    format!("{EMISSION_FACTOR}.{fuel}")
}

pub fn is_consumption(name: &str) -> bool {
    has_prefix(name, CONSUMPTION)
}

/// True if `name` is `prefix` followed by a dot (never a bare match
/// or a longer-prefix collision: `rate.x` yes, `rated.x` no).
pub fn has_prefix(name: &str, prefix: &str) -> bool {
    name.len() > prefix.len() && name.starts_with(prefix) && name.as_bytes()[prefix.len()] == b'.'
}

/// Replace the quantity prefix of a structured name, preserving the
/// rest (`consumption.heating.electricity` -> `cost.heating.electricity`).
pub fn with_prefix(name: &str, new_prefix: &str) -> Option<String> {
    let (_, rest) = name.split_once('.')?;
    Some(format!("{new_prefix}.{rest}"))
}
