//! Source adapter contract + best-effort HTML parsers for the three venue sites.

use std::sync::LazyLock;

use async_trait::async_trait;
use pitchside_core::{RawVenueRecord, SourceId};
use pitchside_storage::{FetchError, HttpFetcher};
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

mod cricbuzz;
mod cricket_dot_com;
mod espn;

pub use cricbuzz::CricbuzzAdapter;
pub use cricket_dot_com::CricketDotComAdapter;
pub use espn::EspnAdapter;

pub const CRATE_NAME: &str = "pitchside-adapters";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdapterContext {
    pub run_id: Uuid,
}

impl AdapterContext {
    pub fn new(run_id: Uuid) -> Self {
        Self { run_id }
    }
}

#[derive(Debug, Error)]
pub enum AdapterError {
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error("invalid selector {selector:?}: {message}")]
    Selector { selector: String, message: String },
    #[error("{0}")]
    Message(String),
}

/// One venue site. `parse` never needs the network; `scrape` fetches and parses.
#[async_trait]
pub trait SourceAdapter: Send + Sync {
    fn source(&self) -> SourceId;

    /// Pull whatever venue fields the page carries. Missing markup yields
    /// missing keys, not an error.
    fn parse(&self, html: &str) -> Result<RawVenueRecord, AdapterError>;

    async fn scrape(
        &self,
        http: &HttpFetcher,
        ctx: &AdapterContext,
        url: &str,
    ) -> Result<RawVenueRecord, AdapterError> {
        let body = http.fetch_text(ctx.run_id, self.source(), url).await?;
        let record = self.parse(&body)?;
        debug!(source = %self.source(), url, keys = record.len(), "parsed venue page");
        Ok(record)
    }
}

pub fn adapter_for_source(source: SourceId) -> Box<dyn SourceAdapter> {
    match source {
        SourceId::Cricbuzz => Box::new(CricbuzzAdapter),
        SourceId::Espn => Box::new(EspnAdapter),
        SourceId::CricketDotCom => Box::new(CricketDotComAdapter),
    }
}

pub(crate) fn selector(css: &str) -> Result<Selector, AdapterError> {
    Selector::parse(css).map_err(|e| AdapterError::Selector {
        selector: css.to_string(),
        message: e.to_string(),
    })
}

/// Element text with whitespace runs collapsed.
pub(crate) fn element_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

pub(crate) fn text_or_none(value: String) -> Option<String> {
    let trimmed = value.trim().to_string();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed)
    }
}

pub(crate) fn select_first_text(document: &Html, css: &str) -> Result<Option<String>, AdapterError> {
    let sel = selector(css)?;
    Ok(document
        .select(&sel)
        .next()
        .and_then(|n| text_or_none(element_text(n))))
}

pub(crate) fn split_list(text: &str) -> Vec<String> {
    text.split(',')
        .filter_map(|s| text_or_none(s.to_string()))
        .collect()
}

static YEAR: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b(\d{4})\b").expect("year pattern"));

pub(crate) fn year_in(text: &str) -> Option<String> {
    YEAR.captures(text).map(|caps| caps[1].to_string())
}

/// Nearest enclosing element with the given tag name.
pub(crate) fn closest<'a>(element: ElementRef<'a>, tag: &str) -> Option<ElementRef<'a>> {
    element
        .ancestors()
        .filter_map(ElementRef::wrap)
        .find(|ancestor| ancestor.value().name() == tag)
}

/// First following sibling element.
pub(crate) fn next_element<'a>(element: ElementRef<'a>) -> Option<ElementRef<'a>> {
    element.next_siblings().find_map(ElementRef::wrap)
}
