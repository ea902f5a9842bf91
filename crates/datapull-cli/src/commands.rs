use anyhow::{bail, Context, Result};
use std::sync::Arc;

use crate::cli::{Cli, Commands};
use datapull_core::billing::max_token_hold;
use datapull_core::matching::{find_best_matches, resolve_business_type, DEFAULT_SIMILARITY_THRESHOLD};
use datapull_core::query::parse_complex_query;
use datapull_core::{FetchLeadsJob, JobRecord, Settings};
use datapull_places::fetch::validate_fields;
use datapull_places::{ContactEnricher, LeadFetcher, NominatimGeocoder, PlacesClient};
use datapull_store::{
    read_leads_from_json, Database, JobQueue, JobStatusStore, LeadRepository, MemoryStore, RedisStore,
};
use datapull_worker::JobProcessor;

const CLI_USER: &str = "cli";

pub async fn execute(cli: Cli, settings: Settings) -> Result<()> {
    match cli.command {
        Commands::Parse { query } => {
            let parsed = parse_complex_query(&query);
            println!("Business type: {:?}", parsed.business_type);
            println!("Location:      {:?}", parsed.location);
            if !parsed.additional_keywords.is_empty() {
                println!("Keywords:      {}", parsed.additional_keywords.join(", "));
            }

            match resolve_business_type(&parsed.business_type) {
                Some(resolved) => println!("✓ Resolved place type: {}", resolved),
                None => println!("✗ No matching place type, workers will use text search"),
            }

            let matches = find_best_matches(&parsed.business_type, DEFAULT_SIMILARITY_THRESHOLD);
            if !matches.is_empty() {
                println!("  Close matches: {}", matches.join(", "));
            }
        }

        Commands::Search {
            query,
            max_leads,
            fields,
            enrich,
        } => {
            let fields = validate_fields(&fields)?;
            let job = FetchLeadsJob::new(query, max_leads, CLI_USER.to_string())
                .with_fields(fields)
                .with_contact_enrichment(enrich);
            job.validate()?;

            // Inline runs are not billed; grant exactly the hold
            let store = Arc::new(MemoryStore::new());
            store
                .set_user_tokens(CLI_USER, max_token_hold(job.max_leads, job.fields.len()))
                .await;

            let places = Arc::new(PlacesClient::new(
                settings.require_google_maps_api_key()?.to_string(),
            ));
            let geocoder = Arc::new(NominatimGeocoder::new(settings.nominatim_url.clone())?);
            let mut processor = JobProcessor::new(
                LeadFetcher::new(places, geocoder),
                store.clone(),
                store.clone(),
                store,
            );
            if enrich {
                processor = processor.with_enricher(ContactEnricher::new()?);
            }

            tracing::info!("Running job {} in process", job.id);
            let processed = processor.process(&job).await?;
            eprintln!(
                "✓ {} leads from {:?} ({} tokens)",
                processed.leads.len(),
                processed.source,
                processed.token_cost
            );
            println!("{}", serde_json::to_string_pretty(&processed.leads)?);
        }

        Commands::Submit {
            query,
            user_id,
            max_leads,
            fields,
            enrich,
        } => {
            let fields = validate_fields(&fields)?;
            let parsed = parse_complex_query(&query);
            if !parsed.is_complete() {
                bail!("Could not extract business type and location from query.");
            }

            let job = FetchLeadsJob::new(query, max_leads, user_id)
                .with_fields(fields)
                .with_business_type(resolve_business_type(&parsed.business_type))
                .with_contact_enrichment(enrich);
            job.validate()?;

            let redis = connect_redis(&cli.redis_url, &settings).await?;
            redis.save_record(&JobRecord::new(job.clone())).await?;
            redis.enqueue(&job).await?;

            println!("✓ Job queued: {}", job.id);
            println!("  Query: {}", job.query);
            if let Some(ref business_type) = job.matched_business_type {
                println!("  Place type: {}", business_type);
            }
        }

        Commands::Status { task_id } => {
            let redis = connect_redis(&cli.redis_url, &settings).await?;
            let Some(record) = redis.get_record(&task_id).await? else {
                bail!("Task not found: {}", task_id);
            };
            println!("{}", serde_json::to_string_pretty(&record.status_view())?);
        }

        Commands::Import { file } => {
            let db = connect_database(&cli.database_url, &settings).await?;
            let leads = read_leads_from_json(&file)
                .await
                .with_context(|| format!("reading {}", file.display()))?;
            println!("Importing {} leads from {}...", leads.len(), file.display());

            let summary = db.upsert_leads(&leads).await?;
            println!(
                "✓ Uploaded {} of {} leads ({} failed)",
                summary.successful, summary.total, summary.failed
            );
        }

        Commands::InitDb => {
            let db = connect_database(&cli.database_url, &settings).await?;
            db.init_schema().await?;
            println!("✓ Database schema ready");
        }
    }

    Ok(())
}

async fn connect_redis(url: &Option<String>, settings: &Settings) -> Result<RedisStore> {
    let url = url.clone().unwrap_or_else(|| settings.redis_url());
    Ok(RedisStore::connect(&url).await?)
}

async fn connect_database(url: &Option<String>, settings: &Settings) -> Result<Database> {
    let url = match url {
        Some(url) => url.as_str(),
        None => settings.require_database_url()?,
    };
    Ok(Database::new(url).await?)
}
