//! Aggregation core for simulated household energy records.
//!
//! Turns a columnar household dataset into the derived, grouped
//! tables a chart renderer consumes:
//!
//! - [`source`]: column-pruned loading from a SQLite household file;
//! - [`derive`]: per-record cost/emission derivation (consumption x
//!   per-fuel rate or factor), with the fans/pumps-into-cooling fold;
//! - [`reduce`]: geographic (tract -> county) and burden-bracket
//!   reduction;
//! - [`coords`]: the county marker-coordinate join;
//! - [`aggregator`]: the parameterized entry point tying it together;
//! - [`sample`]: deterministic sample dataset generation.

pub mod aggregator;
pub mod coords;
pub mod derive;
pub mod error;
pub mod fields;
pub mod reduce;
pub mod sample;
pub mod source;
pub mod table;
pub mod types;
