use datapull_core::billing::{actual_token_cost, max_token_hold};
use datapull_core::fields::{parse_fields, requires_scraper};
use datapull_core::matching::resolve_business_type;
use datapull_core::query::parse_complex_query;
use datapull_core::{FetchLeadsJob, GoogleMapsLead, JobRecord, JobState, JobStatusView, ResultSource};

#[test]
fn test_request_to_completed_status() {
    let parsed = parse_complex_query("Italian restaurants in New York");
    assert!(parsed.is_complete());
    assert_eq!(parsed.location, "new york");

    let fields = parse_fields(&["website", "rating", "website"]).unwrap();
    assert_eq!(fields.len(), 2);
    assert!(!requires_scraper(&fields));

    let job = FetchLeadsJob::new("Italian restaurants in New York".to_string(), 100, "u-1".to_string())
        .with_fields(fields)
        .with_business_type(resolve_business_type("restaurants"));
    job.validate().unwrap();
    assert_eq!(job.matched_business_type.as_deref(), Some("restaurant"));
    assert_eq!(max_token_hold(job.max_leads, job.fields.len()), 120);

    // survives the queue
    let job: FetchLeadsJob = serde_json::from_str(&serde_json::to_string(&job).unwrap()).unwrap();

    let mut record = JobRecord::new(job);
    record.start().unwrap();
    let leads: Vec<GoogleMapsLead> = (0..7)
        .map(|i| GoogleMapsLead::new(format!("h{}", i), format!("Trattoria {}", i)))
        .collect();
    record.complete(leads, ResultSource::PlacesApi).unwrap();
    assert_eq!(record.state, JobState::Completed);
    assert!(record.fail("late".to_string()).is_err());

    assert_eq!(actual_token_cost(record.result.len(), record.job.fields.len()), 8);
    let JobStatusView::Completed { total_leads, .. } = record.status_view() else {
        panic!("expected a completed view");
    };
    assert_eq!(total_leads, 7);
}
