use serde::{Deserialize, Serialize};

/// Outcome of a batch upload.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadSummary {
    pub total: usize,
    pub successful: usize,
    pub failed: usize,
}

impl UploadSummary {
    pub fn record(&mut self, ok: bool) {
        self.total += 1;
        if ok {
            self.successful += 1;
        } else {
            self.failed += 1;
        }
    }

    pub fn log(&self, what: &str) {
        tracing::info!(
            "Upload summary for {}: Total: {}, Successful: {}, Failed: {}",
            what,
            self.total,
            self.successful,
            self.failed
        );
    }
}
