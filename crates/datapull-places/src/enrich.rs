//! Website contact enrichment: visit each lead's website and pick up an
//! e-mail address and social profile links.

use std::collections::BTreeMap;
use std::sync::OnceLock;
use std::time::Duration;

use datapull_core::GoogleMapsLead;
use futures_util::{stream, StreamExt};
use regex::Regex;
use reqwest::Client;
use serde_json::Value;

use crate::Result;

pub const DEFAULT_ENRICH_CONCURRENCY: usize = 10;
const PAGE_TIMEOUT: Duration = Duration::from_secs(10);
const IMAGE_SUFFIXES: &[&str] = &[".png", ".jpg", ".jpeg", ".gif", ".svg", ".webp"];
const SOCIAL_NETWORKS: &[(&str, &str)] = &[
    ("instagram.com", "instagram"),
    ("facebook.com", "facebook"),
    ("linkedin.com", "linkedin"),
];

fn email_regex() -> &'static Regex {
    static EMAIL: OnceLock<Regex> = OnceLock::new();
    EMAIL.get_or_init(|| {
        Regex::new(r"[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}").expect("email pattern is valid")
    })
}

fn social_regex() -> &'static Regex {
    static SOCIAL: OnceLock<Regex> = OnceLock::new();
    SOCIAL.get_or_init(|| {
        Regex::new(r#"https?://(?:www\.)?(instagram\.com|facebook\.com|linkedin\.com)/[^\s"'<>]+"#)
            .expect("social pattern is valid")
    })
}

/// First e-mail address in `html`, skipping retina asset names like
/// `logo@2x.png`.
pub fn extract_email(html: &str) -> Option<String> {
    email_regex()
        .find_iter(html)
        .map(|m| m.as_str())
        .find(|candidate| {
            let lower = candidate.to_lowercase();
            !IMAGE_SUFFIXES.iter().any(|suffix| lower.ends_with(suffix))
        })
        .map(str::to_string)
}

/// First link per network, keyed `instagram`, `facebook`, `linkedin`.
pub fn extract_social_links(html: &str) -> BTreeMap<&'static str, String> {
    let mut links = BTreeMap::new();
    for caps in social_regex().captures_iter(html) {
        let domain = &caps[1];
        if let Some((_, key)) = SOCIAL_NETWORKS.iter().find(|(d, _)| *d == domain) {
            links.entry(*key).or_insert_with(|| caps[0].to_string());
        }
    }
    links
}

#[derive(Debug, Default, PartialEq)]
struct Contacts {
    email: Option<String>,
    social: BTreeMap<&'static str, String>,
}

pub struct ContactEnricher {
    client: Client,
    concurrency: usize,
}

impl ContactEnricher {
    pub fn new() -> Result<Self> {
        let client = Client::builder().timeout(PAGE_TIMEOUT).build()?;
        Ok(Self {
            client,
            concurrency: DEFAULT_ENRICH_CONCURRENCY,
        })
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Adds contacts found on each lead's website to its
    /// `additional_properties`. Returns how many leads gained something.
    pub async fn enrich(&self, leads: &mut [GoogleMapsLead]) -> usize {
        let targets: Vec<(usize, String)> = leads
            .iter()
            .enumerate()
            .filter_map(|(i, lead)| lead.website.clone().map(|url| (i, url)))
            .collect();

        tracing::info!("Enriching contacts from {} websites", targets.len());

        let found: Vec<(usize, Contacts)> = stream::iter(targets)
            .map(|(i, url)| async move {
                match self.fetch_contacts(&url).await {
                    Ok(contacts) => Some((i, contacts)),
                    Err(e) => {
                        tracing::warn!("Could not enrich from {}: {}", url, e);
                        None
                    }
                }
            })
            .buffer_unordered(self.concurrency)
            .filter_map(|result| async move { result })
            .collect()
            .await;

        let mut enriched = 0;
        for (i, contacts) in found {
            if contacts == Contacts::default() {
                continue;
            }
            let extras = &mut leads[i].additional_properties;
            if let Some(email) = contacts.email {
                extras.insert("email".to_string(), Value::String(email));
            }
            for (key, link) in contacts.social {
                extras.insert(key.to_string(), Value::String(link));
            }
            enriched += 1;
        }
        enriched
    }

    async fn fetch_contacts(&self, url: &str) -> Result<Contacts> {
        let html = self
            .client
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        Ok(Contacts {
            email: extract_email(&html),
            social: extract_social_links(&html),
        })
    }
}
