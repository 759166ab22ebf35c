//! Song catalog reconciliation - turns the per-session timestamp log into a
//! deduplicated, sorted catalog and diffs it against the published one.

pub mod config;
pub mod diff;
pub mod error;
pub mod join;
pub mod models;
pub mod normalize;
pub mod pipeline;
pub mod progress;
pub mod safety;
pub mod select;
pub mod sequence;
pub mod similarity;
pub mod sort_key;
pub mod tsv;
