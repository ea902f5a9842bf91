use std::sync::Arc;
use std::time::Duration;

use datapull_core::{JobRecord, JobState};
use datapull_store::{JobQueue, JobStatusStore};
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::processor::JobProcessor;
use crate::Error;

#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// How long one dequeue blocks before checking for shutdown.
    pub poll_timeout: Duration,
    pub job_timeout: Duration,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            poll_timeout: Duration::from_secs(5),
            job_timeout: Duration::from_secs(3600),
        }
    }
}

#[derive(Debug)]
pub enum RunOutcome {
    Idle,
    Finished {
        job_id: String,
        state: JobState,
        /// Caching, upload and billing left running after the status was saved.
        background: Option<JoinHandle<()>>,
    },
}

pub struct Worker {
    processor: Arc<JobProcessor>,
    queue: Arc<dyn JobQueue>,
    statuses: Arc<dyn JobStatusStore>,
    config: WorkerConfig,
}

impl Worker {
    pub fn new(
        processor: Arc<JobProcessor>,
        queue: Arc<dyn JobQueue>,
        statuses: Arc<dyn JobStatusStore>,
        config: WorkerConfig,
    ) -> Self {
        Self {
            processor,
            queue,
            statuses,
            config,
        }
    }

    /// Takes at most one job off the queue and runs it to a final state.
    pub async fn run_once(&self) -> anyhow::Result<RunOutcome> {
        let Some(job) = self.queue.dequeue(self.config.poll_timeout).await? else {
            return Ok(RunOutcome::Idle);
        };

        tracing::info!("Processing job {} for query {:?}", job.id, job.query);
        let mut record = JobRecord::new(job);
        record.start()?;
        self.statuses.save_record(&record).await?;

        let job = record.job.clone();
        let result = match tokio::time::timeout(
            self.config.job_timeout,
            self.processor.process(&job),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => Err(Error::Timeout(self.config.job_timeout)),
        };

        let mut background = None;
        match result {
            Ok(processed) => {
                let persist = processed.needs_persisting();
                let leads = if persist { processed.leads.clone() } else { Vec::new() };
                record.complete(processed.leads, processed.source)?;

                if persist {
                    let processor = self.processor.clone();
                    let job = job.clone();
                    let cost = processed.token_cost;
                    background = Some(tokio::spawn(async move {
                        processor.persist(&job, &leads, cost).await;
                    }));
                }
                tracing::info!("Job {} completed", job.id);
            }
            Err(e) => {
                tracing::error!("Job {} failed: {}", job.id, e);
                record.fail(e.to_string())?;
            }
        }

        self.statuses.save_record(&record).await?;

        Ok(RunOutcome::Finished {
            job_id: job.id,
            state: record.state,
            background,
        })
    }

    /// Runs jobs until `shutdown` turns true, then waits for background
    /// persistence to finish. A job already taken is always finished; an
    /// idle worker notices shutdown within one poll timeout.
    pub async fn run(&self, shutdown: watch::Receiver<bool>) {
        let mut background: Vec<JoinHandle<()>> = Vec::new();

        while !*shutdown.borrow() {
            match self.run_once().await {
                Ok(RunOutcome::Finished {
                    background: Some(handle),
                    ..
                }) => background.push(handle),
                Ok(_) => {}
                Err(e) => {
                    tracing::error!("Worker error: {}", e);
                    tokio::time::sleep(Duration::from_secs(1)).await;
                }
            }
            background.retain(|handle| !handle.is_finished());
        }

        tracing::info!("Worker stopping, waiting for {} background tasks", background.len());
        for handle in background {
            if let Err(e) = handle.await {
                tracing::error!("Background task panicked: {}", e);
            }
        }
    }
}
