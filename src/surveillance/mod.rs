//! HHS hospitalization surveillance - query, fetch, snapshot and freshness check

pub mod error;
pub mod fetch;
pub mod parse;
pub mod query;
pub mod types;
pub mod utils;
pub mod write;

#[cfg(test)]
mod testing;

pub use error::{FetchError, Result};
pub use fetch::SurveillanceClient;
pub use query::{DiseaseQuery, QueryParams, CHUNK_LIMIT, DEFAULT_ORDER};
pub use types::*;
pub use utils::{HttpTransport, Transport, DEFAULT_API};
