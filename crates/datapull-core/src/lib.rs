pub mod billing;
pub mod business;
pub mod error;
pub mod fields;
pub mod geo;
pub mod hash;
pub mod job;
pub mod lead;
pub mod matching;
pub mod query;
pub mod settings;

// Re-exports
pub use error::{Error, Result};
pub use fields::LeadField;
pub use geo::{BoundingBox, Circle, Coordinate};
pub use job::{FetchLeadsJob, JobRecord, JobState, JobStatusView, ResultSource};
pub use lead::{GoogleMapsLead, LeadCreate};
pub use query::ParsedQuery;
pub use settings::Settings;
