//! Runs against a live Redis: `REDIS_URL=redis://localhost:6379/0 cargo test -- --ignored`

use std::time::Duration;

use datapull_core::{FetchLeadsJob, GoogleMapsLead, JobRecord, JobState, ResultSource};
use datapull_store::{JobQueue, JobStatusStore, LeadCache, RedisStore};

async fn store() -> RedisStore {
    let url = std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://127.0.0.1:6379/0".to_string());
    RedisStore::connect(&url).await.unwrap()
}

#[tokio::test]
#[ignore = "needs a running Redis"]
async fn test_queue_round_trip() {
    let store = store().await;
    let job = FetchLeadsJob::new("bakeries in chicago".to_string(), 5, "it-user".to_string());
    store.enqueue(&job).await.unwrap();

    let mut received = None;
    for _ in 0..5 {
        match store.dequeue(Duration::from_secs(1)).await.unwrap() {
            Some(popped) if popped.id == job.id => {
                received = Some(popped);
                break;
            }
            _ => {}
        }
    }
    assert!(received.is_some());
}

#[tokio::test]
#[ignore = "needs a running Redis"]
async fn test_pending_pop_does_not_block_other_connection() {
    let queue = store().await;
    let shared = store().await;

    let pop = tokio::spawn(async move {
        let popped = queue.dequeue(Duration::from_secs(2)).await.unwrap();
        // hand back anything another test queued meanwhile
        if let Some(job) = popped {
            queue.enqueue(&job).await.unwrap();
        }
    });
    tokio::time::sleep(Duration::from_millis(100)).await;

    let record = JobRecord::new(FetchLeadsJob::new(
        "cafes in boston".to_string(),
        5,
        "it-user".to_string(),
    ));
    tokio::time::timeout(Duration::from_millis(500), shared.save_record(&record))
        .await
        .expect("save waited behind the blocking pop")
        .unwrap();

    pop.await.unwrap();
}

#[tokio::test]
#[ignore = "needs a running Redis"]
async fn test_job_record_round_trip() {
    let store = store().await;
    let mut record = JobRecord::new(FetchLeadsJob::new(
        "gyms in austin".to_string(),
        5,
        "it-user".to_string(),
    ));
    record.start().unwrap();
    record
        .complete(
            vec![GoogleMapsLead::new("h1".to_string(), "Gym".to_string())],
            ResultSource::PlacesApi,
        )
        .unwrap();
    store.save_record(&record).await.unwrap();

    let loaded = store.get_record(record.id()).await.unwrap().unwrap();
    assert_eq!(loaded.state, JobState::Completed);
    assert_eq!(loaded.result.len(), 1);
}

#[tokio::test]
#[ignore = "needs a running Redis"]
async fn test_lead_cache() {
    let store = store().await;
    let query = format!("it cache {}", uuid_like());
    let leads = vec![
        GoogleMapsLead::new("1".to_string(), "One".to_string()),
        GoogleMapsLead::new("2".to_string(), "Two".to_string()),
    ];
    store.cache_leads(&query, &leads).await.unwrap();

    assert_eq!(store.get_cached_leads(&query, 2).await.unwrap().len(), 2);
    assert!(store.get_cached_leads(&query, 3).await.is_none());
}

fn uuid_like() -> String {
    FetchLeadsJob::new(String::new(), 1, String::new()).id
}
