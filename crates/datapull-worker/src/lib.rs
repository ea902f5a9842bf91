pub mod error;
pub mod processor;
pub mod runner;

pub use error::{Error, Result};
pub use processor::{JobProcessor, ProcessedJob};
pub use runner::{RunOutcome, Worker, WorkerConfig};
