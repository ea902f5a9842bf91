use async_trait::async_trait;
use datapull_core::{GoogleMapsLead, LeadCreate};
use sqlx::{postgres::PgPoolOptions, types::Json, Pool, Postgres};

use crate::{
    ports::{LeadRepository, TokenLedger},
    retry::RetryPolicy,
    Result, UploadSummary,
};

#[derive(Clone)]
pub struct Database {
    pool: Pool<Postgres>,
    retry: RetryPolicy,
}

impl Database {
    /// Create new database connection
    pub async fn new(database_url: &str) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect(database_url)
            .await?;

        Ok(Self {
            pool,
            retry: RetryPolicy::default(),
        })
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Initialize database schema
    pub async fn init_schema(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS leads (
                id BIGSERIAL PRIMARY KEY,
                name TEXT NOT NULL,
                source TEXT NOT NULL,
                external_id TEXT NOT NULL,
                business_phone TEXT,
                business_email TEXT,
                decision_maker_name TEXT,
                decision_maker_linkedin TEXT,
                decision_maker_email TEXT,
                decision_maker_phone TEXT,
                source_attributes JSONB NOT NULL DEFAULT '{}',
                created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                UNIQUE (source, external_id)
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS google_maps_leads (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                business_phone TEXT,
                formatted_address TEXT,
                website TEXT,
                rating DOUBLE PRECISION,
                user_ratings_total BIGINT,
                types TEXT[],
                business_status TEXT,
                latitude DOUBLE PRECISION,
                longitude DOUBLE PRECISION,
                additional_properties JSONB NOT NULL DEFAULT '{}',
                images TEXT[],
                reviews JSONB,
                similar_businesses JSONB,
                about TEXT,
                updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS users (
                id TEXT PRIMARY KEY,
                tokens BIGINT NOT NULL DEFAULT 0
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    // ========================================================================
    // Lead Operations
    // ========================================================================

    async fn upsert_google_maps_lead(&self, lead: &GoogleMapsLead) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO google_maps_leads (
                id, name, business_phone, formatted_address, website, rating,
                user_ratings_total, types, business_status, latitude, longitude,
                additional_properties, images, reviews, similar_businesses, about
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)
            ON CONFLICT (id) DO UPDATE SET
                name = $2,
                business_phone = $3,
                formatted_address = $4,
                website = $5,
                rating = $6,
                user_ratings_total = $7,
                types = $8,
                business_status = $9,
                latitude = $10,
                longitude = $11,
                additional_properties = $12,
                images = $13,
                reviews = $14,
                similar_businesses = $15,
                about = $16,
                updated_at = NOW()
            "#,
        )
        .bind(&lead.id)
        .bind(&lead.name)
        .bind(&lead.business_phone)
        .bind(&lead.formatted_address)
        .bind(&lead.website)
        .bind(lead.rating)
        .bind(lead.user_ratings_total)
        .bind(&lead.types)
        .bind(&lead.business_status)
        .bind(lead.latitude)
        .bind(lead.longitude)
        .bind(Json(&lead.additional_properties))
        .bind(&lead.images)
        .bind(lead.reviews.as_ref().map(Json))
        .bind(lead.similar_businesses.as_ref().map(Json))
        .bind(&lead.about)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn upsert_lead(&self, lead: &LeadCreate) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO leads (
                name, source, external_id, business_phone, business_email,
                decision_maker_name, decision_maker_linkedin, decision_maker_email,
                decision_maker_phone, source_attributes
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            ON CONFLICT (source, external_id) DO UPDATE SET
                name = $1,
                business_phone = $4,
                business_email = $5,
                decision_maker_name = $6,
                decision_maker_linkedin = $7,
                decision_maker_email = $8,
                decision_maker_phone = $9,
                source_attributes = $10,
                updated_at = NOW()
            "#,
        )
        .bind(&lead.name)
        .bind(&lead.source)
        .bind(&lead.external_id)
        .bind(&lead.business_phone)
        .bind(&lead.business_email)
        .bind(&lead.decision_maker_name)
        .bind(&lead.decision_maker_linkedin)
        .bind(&lead.decision_maker_email)
        .bind(&lead.decision_maker_phone)
        .bind(Json(&lead.source_attributes))
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

#[async_trait]
impl LeadRepository for Database {
    async fn upsert_google_maps_leads(&self, leads: &[GoogleMapsLead]) -> Result<UploadSummary> {
        let mut summary = UploadSummary::default();
        for lead in leads {
            let label = format!("Google Maps lead {}", lead.name);
            let ok = self
                .retry
                .run_checked(&label, lead.validate(), || self.upsert_google_maps_lead(lead))
                .await;
            summary.record(ok);
        }
        summary.log("google_maps_leads");
        Ok(summary)
    }

    async fn upsert_leads(&self, leads: &[LeadCreate]) -> Result<UploadSummary> {
        let mut summary = UploadSummary::default();
        for lead in leads {
            let label = format!("lead {}", lead.name);
            let ok = self
                .retry
                .run_checked(&label, lead.validate(), || self.upsert_lead(lead))
                .await;
            summary.record(ok);
        }
        summary.log("leads");
        Ok(summary)
    }
}

// ========================================================================
// Token Operations
// ========================================================================

#[async_trait]
impl TokenLedger for Database {
    async fn get_user_tokens(&self, user_id: &str) -> Result<i64> {
        let tokens: Option<i64> = sqlx::query_scalar("SELECT tokens FROM users WHERE id = $1")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(tokens.unwrap_or(0))
    }

    async fn update_user_tokens(&self, user_id: &str, delta: i64) -> Result<i64> {
        let tokens: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO users (id, tokens) VALUES ($1, $2)
            ON CONFLICT (id) DO UPDATE SET tokens = users.tokens + EXCLUDED.tokens
            RETURNING tokens
            "#,
        )
        .bind(user_id)
        .bind(delta)
        .fetch_one(&self.pool)
        .await?;

        tracing::info!("User {} tokens changed by {}, balance {}", user_id, delta, tokens);
        Ok(tokens)
    }
}
