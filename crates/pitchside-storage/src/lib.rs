//! Venue catalog persistence, raw-record archive, and HTTP fetch utilities.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use chrono::{DateTime, Utc};
use pitchside_core::{RawVenueRecord, SourceId};
use serde_json::Value as JsonValue;
use thiserror::Error;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::Semaphore;
use tracing::{debug, info_span, Instrument};
use uuid::Uuid;

pub const CRATE_NAME: &str = "pitchside-storage";

/// Write `bytes` to `path` through a sibling temp file and a rename, so readers
/// never observe a partially written file.
pub async fn write_atomic(path: &Path, bytes: &[u8]) -> anyhow::Result<()> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    fs::create_dir_all(&parent)
        .await
        .with_context(|| format!("creating directory {}", parent.display()))?;

    let temp_path = parent.join(format!(".{}.{}.tmp", Uuid::new_v4(), bytes.len()));
    let mut file = fs::OpenOptions::new()
        .create_new(true)
        .write(true)
        .open(&temp_path)
        .await
        .with_context(|| format!("opening temp file {}", temp_path.display()))?;
    let written = async {
        file.write_all(bytes).await?;
        file.flush().await?;
        file.sync_all().await
    }
    .await;
    drop(file);
    if let Err(err) = written {
        let _ = fs::remove_file(&temp_path).await;
        return Err(err).with_context(|| format!("writing temp file {}", temp_path.display()));
    }

    if let Err(err) = fs::rename(&temp_path, path).await {
        let _ = fs::remove_file(&temp_path).await;
        return Err(err).with_context(|| {
            format!(
                "atomically renaming {} -> {}",
                temp_path.display(),
                path.display()
            )
        });
    }
    Ok(())
}

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("reading catalog {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("parsing catalog {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("catalog {} is not a JSON array", .path.display())]
    NotAnArray { path: PathBuf },
    #[error("serializing catalog: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("writing catalog {}: {message}", .path.display())]
    Write { path: PathBuf, message: String },
}

/// The venue catalog file: a JSON array of loosely-shaped entries, read once
/// and rewritten in place.
#[derive(Debug, Clone)]
pub struct CatalogStore {
    path: PathBuf,
}

impl CatalogStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn read(&self) -> Result<Vec<JsonValue>, CatalogError> {
        let text = fs::read_to_string(&self.path)
            .await
            .map_err(|source| CatalogError::Read {
                path: self.path.clone(),
                source,
            })?;
        let value: JsonValue = serde_json::from_str(&text).map_err(|source| CatalogError::Parse {
            path: self.path.clone(),
            source,
        })?;
        match value {
            JsonValue::Array(entries) => Ok(entries),
            _ => Err(CatalogError::NotAnArray {
                path: self.path.clone(),
            }),
        }
    }

    /// Replace the whole catalog with `entries`, pretty-printed with two-space indentation.
    pub async fn write(&self, entries: &[JsonValue]) -> Result<(), CatalogError> {
        let bytes = serde_json::to_vec_pretty(entries)?;
        write_atomic(&self.path, &bytes)
            .await
            .map_err(|err| CatalogError::Write {
                path: self.path.clone(),
                message: format!("{err:#}"),
            })?;
        debug!(path = %self.path.display(), entries = entries.len(), "catalog written");
        Ok(())
    }
}

const UNKNOWN_VENUE: &str = "Unknown Venue";
const MIN_SLUG_LEN: usize = 3;

/// File-name-safe form of a venue name.
///
/// Lowercase ASCII letters, digits, and hyphens survive; whitespace runs become
/// one hyphen. Missing names or slugs shorter than three characters carry a
/// millisecond timestamp so they do not collide.
pub fn venue_slug(name: Option<&str>, now: DateTime<Utc>) -> String {
    let millis = now.timestamp_millis();
    let name = name.map(str::trim).unwrap_or_default();
    if name.is_empty() || name == UNKNOWN_VENUE {
        return format!("venue_{millis}");
    }

    let kept = name
        .to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c.is_whitespace() || *c == '-')
        .collect::<String>();
    let mut slug = kept.split_whitespace().collect::<Vec<_>>().join(" ");
    if slug.len() < MIN_SLUG_LEN {
        slug = format!("{slug}_{millis}");
    }

    slug.replace(' ', "-")
        .split('-')
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchivedRecord {
    pub relative_path: PathBuf,
    pub absolute_path: PathBuf,
    pub byte_size: usize,
}

/// Per-run dump of the raw records each adapter returned.
#[derive(Debug, Clone)]
pub struct RawRecordArchive {
    root: PathBuf,
}

impl RawRecordArchive {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn record_relative_path(&self, run_started_at: DateTime<Utc>, source: SourceId, slug: &str) -> PathBuf {
        let stamp = run_started_at.format("%Y%m%d_%H%M%S").to_string();
        PathBuf::from(stamp)
            .join(source.as_str())
            .join(format!("{slug}.json"))
    }

    /// Store one raw record. Empty records are not written and yield `None`.
    pub async fn store_record(
        &self,
        run_started_at: DateTime<Utc>,
        source: SourceId,
        venue_name: Option<&str>,
        record: &RawVenueRecord,
    ) -> anyhow::Result<Option<ArchivedRecord>> {
        if record.is_empty() {
            return Ok(None);
        }
        let slug = venue_slug(venue_name, Utc::now());
        let relative_path = self.record_relative_path(run_started_at, source, &slug);
        let absolute_path = self.root.join(&relative_path);
        let bytes = serde_json::to_vec_pretty(record).context("serializing raw record")?;
        write_atomic(&absolute_path, &bytes).await?;
        Ok(Some(ArchivedRecord {
            relative_path,
            absolute_path,
            byte_size: bytes.len(),
        }))
    }
}

#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    pub timeout: Duration,
    pub user_agent: Option<String>,
    pub max_concurrency: usize,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(15),
            user_agent: None,
            max_concurrency: 3,
        }
    }
}

/// One GET per call, bounded by the request timeout. Every failure is final.
#[derive(Debug)]
pub struct HttpFetcher {
    client: reqwest::Client,
    limit: Semaphore,
}

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("http status {status} for {url}")]
    HttpStatus { status: u16, url: String },
    #[error("fetcher is shut down")]
    Closed,
}

impl HttpFetcher {
    pub fn new(config: HttpClientConfig) -> anyhow::Result<Self> {
        let mut builder = reqwest::Client::builder()
            .gzip(true)
            .brotli(true)
            .timeout(config.timeout);

        if let Some(user_agent) = &config.user_agent {
            builder = builder.user_agent(user_agent.clone());
        }

        let client = builder.build().context("building reqwest client")?;

        Ok(Self {
            client,
            limit: Semaphore::new(config.max_concurrency.max(1)),
        })
    }

    pub async fn fetch_bytes(&self, run_id: Uuid, source: SourceId, url: &str) -> Result<Vec<u8>, FetchError> {
        let _permit = self.limit.acquire().await.map_err(|_| FetchError::Closed)?;
        let span = info_span!("http_fetch", %run_id, %source, url);
        self.get(url).instrument(span).await
    }

    pub async fn fetch_text(&self, run_id: Uuid, source: SourceId, url: &str) -> Result<String, FetchError> {
        let body = self.fetch_bytes(run_id, source, url).await?;
        Ok(String::from_utf8_lossy(&body).into_owned())
    }

    async fn get(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        let resp = self.client.get(url).send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(FetchError::HttpStatus {
                status: status.as_u16(),
                url: resp.url().to_string(),
            });
        }
        let body = resp.bytes().await?.to_vec();
        debug!(status = status.as_u16(), bytes = body.len(), "fetched");
        Ok(body)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use super::*;
    use serde_json::json;
    use tempfile::tempdir;
    use tokio::io::AsyncReadExt;
    use tokio::net::TcpListener;

    fn at(rfc3339: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(rfc3339)
            .expect("ts")
            .with_timezone(&Utc)
    }

    #[test]
    fn venue_slug_matches_catalog_file_naming() {
        let now = at("2026-02-24T12:00:00Z");
        assert_eq!(venue_slug(Some("Eden Gardens"), now), "eden-gardens");
        assert_eq!(venue_slug(Some("  Lord's Cricket   Ground "), now), "lords-cricket-ground");
        assert_eq!(venue_slug(Some("Sher-e-Bangla -- Stadium"), now), "sher-e-bangla-stadium");
        assert_eq!(venue_slug(Some("M. A. Chidambaram"), now), "m-a-chidambaram");
    }

    #[test]
    fn venue_slug_disambiguates_missing_or_short_names() {
        let now = at("2026-02-24T12:00:00Z");
        let millis = now.timestamp_millis();
        assert_eq!(venue_slug(None, now), format!("venue_{millis}"));
        assert_eq!(venue_slug(Some("Unknown Venue"), now), format!("venue_{millis}"));
        assert_eq!(venue_slug(Some("GG"), now), format!("gg_{millis}"));
        assert_eq!(venue_slug(Some("!!"), now), format!("_{millis}"));
    }

    #[tokio::test]
    async fn catalog_round_trips_and_writes_pretty_json() {
        let dir = tempdir().expect("tempdir");
        let store = CatalogStore::new(dir.path().join("venues.json"));
        let entries = vec![json!({ "_id": "1", "sName": "Eden Gardens" }), json!({ "_id": "2" })];

        store.write(&entries).await.expect("write");
        let text = std::fs::read_to_string(store.path()).expect("read back");
        assert!(text.starts_with("[\n  {\n    \"_id\": \"1\""));
        assert_eq!(store.read().await.expect("read"), entries);

        let leftovers = std::fs::read_dir(dir.path())
            .expect("list")
            .filter_map(Result::ok)
            .filter(|entry| entry.file_name().to_string_lossy().ends_with(".tmp"))
            .count();
        assert_eq!(leftovers, 0);
    }

    #[tokio::test]
    async fn catalog_read_failures_are_typed() {
        let dir = tempdir().expect("tempdir");

        let missing = CatalogStore::new(dir.path().join("missing.json"));
        assert!(matches!(missing.read().await, Err(CatalogError::Read { .. })));

        let broken_path = dir.path().join("broken.json");
        std::fs::write(&broken_path, "[{").expect("seed");
        let broken = CatalogStore::new(&broken_path);
        assert!(matches!(broken.read().await, Err(CatalogError::Parse { .. })));

        let object_path = dir.path().join("object.json");
        std::fs::write(&object_path, "{}").expect("seed");
        let object = CatalogStore::new(&object_path);
        assert!(matches!(object.read().await, Err(CatalogError::NotAnArray { .. })));
    }

    #[tokio::test]
    async fn archive_skips_empty_records_and_nests_by_run_and_source() {
        let dir = tempdir().expect("tempdir");
        let archive = RawRecordArchive::new(dir.path());
        let started = at("2026-02-24T12:00:00Z");

        let skipped = archive
            .store_record(started, SourceId::Espn, Some("Eden Gardens"), &RawVenueRecord::new())
            .await
            .expect("store empty");
        assert!(skipped.is_none());

        let mut record = RawVenueRecord::new();
        record.insert("Name", "Eden Gardens");
        let stored = archive
            .store_record(started, SourceId::Cricbuzz, Some("Eden Gardens"), &record)
            .await
            .expect("store")
            .expect("non-empty record is archived");

        assert_eq!(
            stored.relative_path,
            PathBuf::from("20260224_120000/cricbuzz/eden-gardens.json")
        );
        let back: RawVenueRecord =
            serde_json::from_slice(&std::fs::read(&stored.absolute_path).expect("read")).expect("parse");
        assert_eq!(back, record);
    }

    #[tokio::test]
    async fn failed_catalog_write_leaves_target_and_no_temp_files() {
        let dir = tempdir().expect("tempdir");
        let target = dir.path().join("venues.json");
        std::fs::create_dir(&target).expect("seed dir");
        std::fs::write(target.join("keep.txt"), "keep").expect("seed file");

        let store = CatalogStore::new(&target);
        let err = store.write(&[json!({ "_id": "1" })]).await.expect_err("rename onto a directory");
        assert!(matches!(err, CatalogError::Write { .. }));
        assert!(err.to_string().contains("atomically renaming"));

        assert_eq!(std::fs::read_to_string(target.join("keep.txt")).expect("kept"), "keep");
        let leftovers = std::fs::read_dir(dir.path())
            .expect("list")
            .filter_map(Result::ok)
            .filter(|entry| entry.file_name().to_string_lossy().ends_with(".tmp"))
            .count();
        assert_eq!(leftovers, 0);
    }

    #[tokio::test]
    async fn catalog_write_keeps_entry_key_order() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("venues.json");
        std::fs::write(&path, r#"[{"sName":"Eden Gardens","_id":"1","dCreated":"x"}]"#).expect("seed");

        let store = CatalogStore::new(&path);
        let entries = store.read().await.expect("read");
        store.write(&entries).await.expect("write");

        let text = std::fs::read_to_string(&path).expect("read back");
        let name = text.find("\"sName\"").expect("sName");
        let id = text.find("\"_id\"").expect("_id");
        let created = text.find("\"dCreated\"").expect("dCreated");
        assert!(name < id && id < created, "{text}");
    }

    /// Local listener that answers every connection with `status_line` and counts requests.
    async fn serve_status(status_line: &'static str) -> (String, Arc<AtomicUsize>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("addr");
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = hits.clone();
        tokio::spawn(async move {
            while let Ok((mut stream, _)) = listener.accept().await {
                counter.fetch_add(1, Ordering::SeqCst);
                let mut buf = [0u8; 1024];
                let _ = stream.read(&mut buf).await;
                let reply = format!("HTTP/1.1 {status_line}\r\ncontent-length: 4\r\nconnection: close\r\n\r\nbody");
                let _ = stream.write_all(reply.as_bytes()).await;
                let _ = stream.shutdown().await;
            }
        });
        (format!("http://{addr}/venue"), hits)
    }

    #[tokio::test]
    async fn error_status_fails_on_the_first_attempt() {
        let (url, hits) = serve_status("503 Service Unavailable").await;
        let fetcher = HttpFetcher::new(HttpClientConfig::default()).expect("client");

        let err = fetcher
            .fetch_text(Uuid::new_v4(), SourceId::Espn, &url)
            .await
            .expect_err("503 is an error");
        assert!(matches!(err, FetchError::HttpStatus { status: 503, .. }));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn success_status_returns_the_body() {
        let (url, hits) = serve_status("200 OK").await;
        let fetcher = HttpFetcher::new(HttpClientConfig::default()).expect("client");

        let body = fetcher
            .fetch_text(Uuid::new_v4(), SourceId::Cricbuzz, &url)
            .await
            .expect("fetch");
        assert_eq!(body, "body");
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }
}
