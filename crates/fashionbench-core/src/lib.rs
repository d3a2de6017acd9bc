//! fashionbench-core: Scoring primitives, task policies, aggregation and the
//! eval engine.
//!
//! This crate defines the data model, the responder contract and the scoring
//! logic that the rest of fashionbench builds on.

pub mod engine;
pub mod error;
pub mod fields;
pub mod model;
pub mod parser;
pub mod report;
pub mod results;
pub mod scorer;
pub mod similarity;
pub mod statistics;
pub mod synonyms;
pub mod traits;
