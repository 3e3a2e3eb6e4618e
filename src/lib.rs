// Loupe: descriptive and bias statistics for text datasets.
//
// This is the library root. Each module corresponds to a major subsystem
// of the measurement pipeline.

pub mod cache;
pub mod config;
pub mod corpus;
pub mod error;
pub mod measure;
pub mod npmi;
pub mod output;
pub mod stats;
pub mod vocab;

pub use error::{Error, Result};
