//! Log Triage configuration loading and validation.
//!
//! This crate provides:
//! - Typed Rust structs for the input JSON document
//! - Compilation into an immutable, validated run configuration
//! - Semantic validation (operators, combine policy, date options)

pub mod detection;
pub mod model;
pub mod selection;
pub mod validate;

pub use detection::{
    CombinePolicy, Cmp, Detection, RuleValue, StateChangeRule, ThresholdRule, WindowSpec,
};
pub use model::{RunConfig, ScanConfig, StateChangeEntry, ThresholdEntry};
pub use selection::{DateFilter, Selection};
pub use validate::ValidationError;
