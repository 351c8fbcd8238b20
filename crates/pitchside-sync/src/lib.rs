//! Batch driver: read the venue catalog, scrape + reconcile each venue, write it back once.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use pitchside_adapters::{adapter_for_source, AdapterContext, AdapterError};
use pitchside_core::{CanonicalVenueRecord, RawVenueRecord, SourceId};
use pitchside_reconcile::{cleanup_value, merge, SourceRecords};
use pitchside_storage::{CatalogStore, HttpClientConfig, HttpFetcher, RawRecordArchive};
use serde::Serialize;
use serde_json::{json, Map, Value as JsonValue};
use tracing::{debug, info, warn};
use uuid::Uuid;

pub const CRATE_NAME: &str = "pitchside-sync";

/// Original entry keys carried into a reconciled entry.
pub const RETAINED_KEYS: [&str; 13] = [
    "_id",
    "sVenueKey",
    "sName",
    "sLocation",
    "sTimezone",
    "eTagStatus",
    "bTagEnabled",
    "dCreated",
    "dUpdated",
    "__v",
    "sLatitude",
    "sLongitude",
    "oThirdparty",
];

pub const THIRD_PARTY_KEY: &str = "oThirdparty";
pub const SCRAPE_MARKER_KEY: &str = "oScraped";
const LEGACY_SCRAPED_KEY: &str = "scraped";
const STATS_KEY: &str = "stats";

#[derive(Debug, Clone)]
pub struct SyncConfig {
    pub catalog_path: PathBuf,
    pub archive_dir: Option<PathBuf>,
    pub user_agent: String,
    pub http_timeout_secs: u64,
    pub concurrent_adapters: bool,
}

impl SyncConfig {
    pub fn from_env() -> Self {
        Self {
            catalog_path: std::env::var("PITCHSIDE_CATALOG")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("./venues.json")),
            archive_dir: std::env::var("PITCHSIDE_ARCHIVE_DIR")
                .ok()
                .filter(|v| !v.trim().is_empty())
                .map(PathBuf::from),
            user_agent: std::env::var("PITCHSIDE_USER_AGENT")
                .unwrap_or_else(|_| "Mozilla/5.0 (compatible; pitchside/0.1)".to_string()),
            http_timeout_secs: std::env::var("PITCHSIDE_HTTP_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(15),
            concurrent_adapters: std::env::var("PITCHSIDE_CONCURRENT_ADAPTERS")
                .map(|v| matches!(v.as_str(), "1" | "true" | "TRUE" | "True"))
                .unwrap_or(true),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct BatchRunSummary {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub total_venues: usize,
    pub scraped: usize,
    pub fallback: usize,
    pub passed_through: usize,
    pub adapter_failures: usize,
    pub catalog_path: String,
}

/// Fetches one source page and turns it into a raw record.
#[async_trait]
pub trait VenueScraper: Send + Sync {
    async fn scrape(
        &self,
        ctx: &AdapterContext,
        source: SourceId,
        url: &str,
    ) -> Result<RawVenueRecord, AdapterError>;
}

/// Live scraper: shared HTTP client plus the registered adapter per source.
pub struct HttpVenueScraper {
    http: HttpFetcher,
}

impl HttpVenueScraper {
    pub fn new(http: HttpFetcher) -> Self {
        Self { http }
    }
}

#[async_trait]
impl VenueScraper for HttpVenueScraper {
    async fn scrape(
        &self,
        ctx: &AdapterContext,
        source: SourceId,
        url: &str,
    ) -> Result<RawVenueRecord, AdapterError> {
        adapter_for_source(source).scrape(&self.http, ctx, url).await
    }
}

/// The entry's third-party URL map, when it has one worth scraping.
pub fn third_party_sources(entry: &JsonValue) -> Option<&Map<String, JsonValue>> {
    entry
        .get(THIRD_PARTY_KEY)
        .and_then(JsonValue::as_object)
        .filter(|sources| !sources.is_empty())
}

pub fn source_url(sources: &Map<String, JsonValue>, source: SourceId) -> Option<&str> {
    sources
        .get(source.url_key())
        .and_then(JsonValue::as_str)
        .map(str::trim)
        .filter(|url| !url.is_empty())
}

/// Keys that only the catalog may set; scraped passthrough keys never replace them.
fn is_catalog_owned(key: &str) -> bool {
    key == SCRAPE_MARKER_KEY || RETAINED_KEYS.contains(&key)
}

fn scrape_marker(success: bool, at: DateTime<Utc>) -> JsonValue {
    json!({
        "bResult": success,
        "timestamp": at.to_rfc3339_opts(SecondsFormat::Millis, true),
    })
}

/// Build the output entry for a venue that went through the scrape path.
///
/// Only [`RETAINED_KEYS`] survive from the original. A non-empty `venue`
/// contributes its fields; an empty one falls back to the entry's legacy
/// `scraped` flag and its previous stats.
pub fn splice_entry(entry: &JsonValue, venue: &CanonicalVenueRecord, at: DateTime<Utc>) -> Result<JsonValue> {
    let Some(original) = entry.as_object() else {
        return Ok(entry.clone());
    };
    let mut spliced = RETAINED_KEYS
        .iter()
        .filter_map(|key| original.get(*key).map(|v| ((*key).to_string(), v.clone())))
        .collect::<Map<_, _>>();

    if venue.is_empty() {
        if let Some(legacy) = original.get(LEGACY_SCRAPED_KEY) {
            spliced.insert(LEGACY_SCRAPED_KEY.to_string(), legacy.clone());
        }
        spliced.insert(SCRAPE_MARKER_KEY.to_string(), scrape_marker(false, at));
        if let Some(stats) = original.get(STATS_KEY).and_then(cleanup_value) {
            if stats.is_object() {
                spliced.insert(STATS_KEY.to_string(), stats);
            }
        }
        return Ok(JsonValue::Object(spliced));
    }

    let fields = match serde_json::to_value(venue).context("serializing canonical venue record")? {
        JsonValue::Object(fields) => fields,
        other => anyhow::bail!("canonical venue record serialized to a non-object: {other}"),
    };
    spliced.extend(fields.into_iter().filter(|(key, _)| !is_catalog_owned(key)));
    spliced.insert(SCRAPE_MARKER_KEY.to_string(), scrape_marker(true, at));
    Ok(JsonValue::Object(spliced))
}

#[derive(Debug, Default)]
struct Tally {
    scraped: usize,
    fallback: usize,
    passed_through: usize,
    adapter_failures: usize,
}

pub struct BatchPipeline {
    config: SyncConfig,
    catalog: CatalogStore,
    archive: Option<RawRecordArchive>,
    scraper: Box<dyn VenueScraper>,
}

impl BatchPipeline {
    pub fn new(config: SyncConfig) -> Result<Self> {
        let http = HttpFetcher::new(HttpClientConfig {
            timeout: Duration::from_secs(config.http_timeout_secs),
            user_agent: Some(config.user_agent.clone()),
            ..Default::default()
        })?;
        Ok(Self {
            catalog: CatalogStore::new(config.catalog_path.clone()),
            archive: config.archive_dir.clone().map(RawRecordArchive::new),
            scraper: Box::new(HttpVenueScraper::new(http)),
            config,
        })
    }

    pub fn with_scraper(mut self, scraper: Box<dyn VenueScraper>) -> Self {
        self.scraper = scraper;
        self
    }

    pub async fn run_once(&self) -> Result<BatchRunSummary> {
        let started_at = Utc::now();
        let run_id = Uuid::new_v4();
        let ctx = AdapterContext::new(run_id);

        let entries = self
            .catalog
            .read()
            .await
            .with_context(|| format!("loading catalog {}", self.catalog.path().display()))?;
        let total_venues = entries.len();
        info!(%run_id, total_venues, catalog = %self.catalog.path().display(), "batch run started");

        let mut tally = Tally::default();
        let mut updated = Vec::with_capacity(total_venues);
        for (index, entry) in entries.into_iter().enumerate() {
            let name = entry.get("sName").and_then(JsonValue::as_str).map(str::to_string);
            let Some(sources) = third_party_sources(&entry) else {
                debug!(%run_id, index, name = name.as_deref(), "no third-party sources; passing through");
                tally.passed_through += 1;
                updated.push(entry);
                continue;
            };

            info!(%run_id, venue = index + 1, total_venues, name = name.as_deref(), "processing venue");
            let records = self.collect_records(&ctx, sources, &mut tally).await;
            self.archive_records(started_at, name.as_deref(), &records).await;

            let venue = merge(&records);
            if venue.is_empty() {
                info!(%run_id, name = name.as_deref(), "no data scraped; keeping cleaned original");
                tally.fallback += 1;
            } else {
                tally.scraped += 1;
            }
            updated.push(splice_entry(&entry, &venue, Utc::now())?);
        }

        self.catalog
            .write(&updated)
            .await
            .with_context(|| format!("writing catalog {}", self.catalog.path().display()))?;

        let finished_at = Utc::now();
        info!(
            %run_id,
            scraped = tally.scraped,
            fallback = tally.fallback,
            passed_through = tally.passed_through,
            adapter_failures = tally.adapter_failures,
            "batch run finished"
        );
        Ok(BatchRunSummary {
            run_id,
            started_at,
            finished_at,
            total_venues,
            scraped: tally.scraped,
            fallback: tally.fallback,
            passed_through: tally.passed_through,
            adapter_failures: tally.adapter_failures,
            catalog_path: self.catalog.path().display().to_string(),
        })
    }

    async fn collect_records(
        &self,
        ctx: &AdapterContext,
        sources: &Map<String, JsonValue>,
        tally: &mut Tally,
    ) -> SourceRecords {
        let urls = SourceId::PRIORITY.map(|source| source_url(sources, source));
        let [cricbuzz, espn, cricket_dot_com] = if self.config.concurrent_adapters {
            let (a, b, c) = tokio::join!(
                self.scrape_soft(ctx, SourceId::Cricbuzz, urls[0]),
                self.scrape_soft(ctx, SourceId::Espn, urls[1]),
                self.scrape_soft(ctx, SourceId::CricketDotCom, urls[2]),
            );
            [a, b, c]
        } else {
            [
                self.scrape_soft(ctx, SourceId::Cricbuzz, urls[0]).await,
                self.scrape_soft(ctx, SourceId::Espn, urls[1]).await,
                self.scrape_soft(ctx, SourceId::CricketDotCom, urls[2]).await,
            ]
        };
        let mut take = |outcome: Option<RawVenueRecord>| {
            outcome.unwrap_or_else(|| {
                tally.adapter_failures += 1;
                RawVenueRecord::new()
            })
        };
        SourceRecords::new(take(cricbuzz), take(espn), take(cricket_dot_com))
    }

    /// `None` only when the adapter failed. A missing URL is an empty record.
    async fn scrape_soft(&self, ctx: &AdapterContext, source: SourceId, url: Option<&str>) -> Option<RawVenueRecord> {
        let Some(url) = url else {
            return Some(RawVenueRecord::new());
        };
        match self.scraper.scrape(ctx, source, url).await {
            Ok(record) => Some(record),
            Err(err) => {
                warn!(run_id = %ctx.run_id, %source, url, error = %err, "adapter failed; using empty record");
                None
            }
        }
    }

    async fn archive_records(&self, run_started_at: DateTime<Utc>, name: Option<&str>, records: &SourceRecords) {
        let Some(archive) = &self.archive else {
            return;
        };
        for source in SourceId::PRIORITY {
            match archive.store_record(run_started_at, source, name, records.get(source)).await {
                Ok(Some(stored)) => {
                    debug!(%source, path = %stored.relative_path.display(), bytes = stored.byte_size, "archived raw record")
                }
                Ok(None) => {}
                Err(err) => warn!(%source, error = %format!("{err:#}"), "failed to archive raw record"),
            }
        }
    }
}
