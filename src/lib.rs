pub mod analyzers;
pub mod config;
pub mod engine;
pub mod error;
pub mod explain;
pub mod ingest;
pub mod model;
pub mod paging;
pub mod report;
pub mod store;

pub use engine::TrafficAnalytics;
pub use error::TrafficError;
pub use model::TrafficRecord;
