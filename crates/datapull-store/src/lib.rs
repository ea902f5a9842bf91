pub mod database;
pub mod error;
pub mod import;
pub mod memory;
pub mod models;
pub mod ports;
pub mod redis_store;
pub mod retry;

// Re-exports
pub use database::Database;
pub use error::{Error, Result};
pub use import::read_leads_from_json;
pub use memory::MemoryStore;
pub use models::UploadSummary;
pub use ports::{JobQueue, JobStatusStore, LeadCache, LeadRepository, TokenLedger};
pub use redis_store::{cache_key, RedisStore};
pub use retry::RetryPolicy;
