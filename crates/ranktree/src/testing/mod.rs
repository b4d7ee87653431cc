//! Test utilities: seeded synthetic ranking data.
//!
//! Used by unit tests, integration tests and benchmarks. Everything here is
//! deterministic for a given seed.

mod data;

pub use data::{random_dense_features, split_lists, synthetic_rank_lists, SyntheticLists};
