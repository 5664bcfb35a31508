//! Detection providers implemented inside the core.
//!
//! Remote providers live in the adapters crate.

mod attributes;
mod heuristic;

pub use attributes::{AttributeSource, FixedAttributes, StochasticAttributes, StochasticAttributesConfig};
pub use heuristic::HeuristicProvider;
