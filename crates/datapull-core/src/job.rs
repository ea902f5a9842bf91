use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, GoogleMapsLead, LeadField, Result};

pub const DEFAULT_MAX_LEADS: u32 = 1000;
pub const MAX_LEADS_LIMIT: u32 = 5000;

/// A request to collect Google Maps leads, as it travels through the queue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FetchLeadsJob {
    pub id: String,
    pub query: String,
    pub max_leads: u32,
    #[serde(default)]
    pub fields: Vec<LeadField>,
    pub user_id: String,
    #[serde(default)]
    pub matched_business_type: Option<String>,
    #[serde(default)]
    pub enrich_contacts: bool,
    pub created_at: DateTime<Utc>,
}

impl FetchLeadsJob {
    pub fn new(query: String, max_leads: u32, user_id: String) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            query,
            max_leads,
            fields: Vec::new(),
            user_id,
            matched_business_type: None,
            enrich_contacts: false,
            created_at: Utc::now(),
        }
    }

    pub fn with_fields(mut self, fields: Vec<LeadField>) -> Self {
        self.fields = fields;
        self
    }

    pub fn with_business_type(mut self, business_type: Option<String>) -> Self {
        self.matched_business_type = business_type;
        self
    }

    pub fn with_contact_enrichment(mut self, enrich: bool) -> Self {
        self.enrich_contacts = enrich;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.query.trim().is_empty() {
            return Err(Error::InvalidQuery("query must not be empty".to_string()));
        }
        if !(1..=MAX_LEADS_LIMIT).contains(&self.max_leads) {
            return Err(Error::InvalidQuery(format!(
                "max_leads must be between 1 and {}",
                MAX_LEADS_LIMIT
            )));
        }
        if self.user_id.trim().is_empty() {
            return Err(Error::InvalidQuery("user_id must not be empty".to_string()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobState {
    Pending,
    Running,
    Completed,
    Failed,
}

impl JobState {
    pub fn is_finished(&self) -> bool {
        matches!(self, JobState::Completed | JobState::Failed)
    }
}

/// Where a completed job's leads came from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResultSource {
    Cache,
    #[default]
    PlacesApi,
    TextSearch,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobRecord {
    pub job: FetchLeadsJob,
    pub state: JobState,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub result: Vec<GoogleMapsLead>,
    pub source: Option<ResultSource>,
    pub error: Option<String>,
}

impl JobRecord {
    pub fn new(job: FetchLeadsJob) -> Self {
        Self {
            job,
            state: JobState::Pending,
            started_at: None,
            finished_at: None,
            result: Vec::new(),
            source: None,
            error: None,
        }
    }

    pub fn id(&self) -> &str {
        &self.job.id
    }

    pub fn start(&mut self) -> Result<()> {
        self.expect_state(JobState::Pending, "start")?;
        self.state = JobState::Running;
        self.started_at = Some(Utc::now());
        Ok(())
    }

    pub fn complete(&mut self, leads: Vec<GoogleMapsLead>, source: ResultSource) -> Result<()> {
        self.expect_state(JobState::Running, "complete")?;
        self.state = JobState::Completed;
        self.finished_at = Some(Utc::now());
        self.result = leads;
        self.source = Some(source);
        Ok(())
    }

    pub fn fail(&mut self, error: String) -> Result<()> {
        self.expect_state(JobState::Running, "fail")?;
        self.state = JobState::Failed;
        self.finished_at = Some(Utc::now());
        self.error = Some(error);
        Ok(())
    }

    fn expect_state(&self, expected: JobState, action: &str) -> Result<()> {
        if self.state != expected {
            return Err(Error::InvalidJobState(format!(
                "cannot {} job {} in state {:?}",
                action, self.job.id, self.state
            )));
        }
        Ok(())
    }

    pub fn status_view(&self) -> JobStatusView {
        let user_id = self.job.user_id.clone();
        match self.state {
            JobState::Pending => JobStatusView::Pending { user_id },
            JobState::Running => JobStatusView::Running { user_id },
            JobState::Completed => JobStatusView::Completed {
                progress: 100,
                total_leads: self.result.len(),
                result: self.result.clone(),
                source: self.source.unwrap_or_default(),
            },
            JobState::Failed => JobStatusView::Failed {
                error: self.error.clone().unwrap_or_default(),
                user_id,
            },
        }
    }
}

/// Job status as returned to clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum JobStatusView {
    Pending {
        user_id: String,
    },
    Running {
        user_id: String,
    },
    Completed {
        progress: u8,
        total_leads: usize,
        result: Vec<GoogleMapsLead>,
        source: ResultSource,
    },
    Failed {
        error: String,
        user_id: String,
    },
}
