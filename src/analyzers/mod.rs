//! Pure computations over traffic records.
//!
//! Every function here takes a slice of records already fetched from a store
//! and recomputes its result from scratch; nothing is cached between calls.

pub mod aggregate;
pub mod forecast;
pub mod types;
pub mod utility;
pub mod window;
