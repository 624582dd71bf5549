//! Snapshot parsing and metadata extraction.
//!
//! This module turns one archived capture into a recovered record:
//! - removal-notice detection (captures of the deletion state are unusable)
//! - embedded page-state decoding (`ytInitialPlayerResponse`, `ytplayer.config`,
//!   `ytInitialData`), preferred whenever present
//! - legacy markup scraping (meta tags, microdata, watch-page elements)
//! - category name mapping and channel-candidate discovery
//! - an optional `PageRenderer` consulted when static extraction finds too little

mod blob;
mod categories;
mod channel;
mod meta;
mod patterns;
mod removal;
mod renderer;
mod values;
mod video;

use std::sync::Arc;

use scraper::Html;
use url::Url;

use crate::cdx::CdxSnapshot;
use crate::config::MIN_STATIC_FIELDS;
use crate::error_handling::FetchError;
use crate::fetch::HttpFetcher;
use crate::models::{RecoveredChannelData, RecoveredRecord, RecoveredVideoData};

// Re-export public API
pub use categories::category_id;
pub use removal::{detect_removal_notice, RemovalNotice};
pub use renderer::{PageRenderer, RenderError, UnavailableRenderer};
pub use values::{parse_count, parse_date, parse_iso_duration};

/// First capture year in which pages are expected to embed their state.
const EMBEDDED_STATE_ERA_START: i32 = 2017;

/// Outcome of parsing one snapshot.
#[derive(Debug, Clone, PartialEq)]
pub enum PageExtraction<T> {
    /// At least one field was extracted.
    Recovered { data: T, warnings: Vec<String> },
    /// The capture shows a removal notice instead of the original page.
    RemovalNotice(RemovalNotice),
    /// Nothing usable could be extracted; the reason is diagnostic text.
    NoUsableData(String),
}

impl<T: RecoveredRecord> PageExtraction<T> {
    fn from_record(data: T, warnings: Vec<String>) -> Self {
        if data.recovered_count() > 0 {
            return PageExtraction::Recovered { data, warnings };
        }
        if warnings.is_empty() {
            PageExtraction::NoUsableData("no recognisable metadata in page".to_string())
        } else {
            PageExtraction::NoUsableData(format!(
                "no recognisable metadata in page ({})",
                warnings.join("; ")
            ))
        }
    }
}

/// A record type that can be extracted from a page body.
pub trait PageRecord: RecoveredRecord + Send + 'static {
    /// Extracts every field the body yields. Missing fields are `None`;
    /// structural problems are reported through `warnings`.
    fn parse_static(body: &str, snapshot: &CdxSnapshot, warnings: &mut Vec<String>) -> Self;
}

fn is_embedded_state_era(snapshot: &CdxSnapshot) -> bool {
    snapshot
        .year()
        .is_some_and(|year| year >= EMBEDDED_STATE_ERA_START)
}

impl PageRecord for RecoveredVideoData {
    fn parse_static(body: &str, snapshot: &CdxSnapshot, warnings: &mut Vec<String>) -> Self {
        let timestamp = &snapshot.timestamp;
        let mut data = match blob::find_player_state(body) {
            Ok(Some(state)) => video::from_player_state(&state, timestamp, warnings),
            Ok(None) => {
                if is_embedded_state_era(snapshot) {
                    warnings.push("post-2017 capture without embedded player state".to_string());
                }
                RecoveredVideoData::empty(timestamp)
            }
            Err(e) => {
                warnings.push(format!("embedded player state is malformed: {e}"));
                RecoveredVideoData::empty(timestamp)
            }
        };

        let document = Html::parse_document(body);
        data.merge_missing(video::from_markup(&document, timestamp, warnings));
        if data.like_count.is_none() {
            data.like_count = video::like_count_from_body(body);
        }
        if let Some(channel_id) = &data.channel_id {
            data.channel_candidates.insert(channel_id.clone());
        }
        data
    }
}

impl PageRecord for RecoveredChannelData {
    fn parse_static(body: &str, snapshot: &CdxSnapshot, warnings: &mut Vec<String>) -> Self {
        let timestamp = &snapshot.timestamp;
        let mut data = match blob::find_initial_data(body) {
            Ok(Some(state)) => channel::from_initial_data(&state, timestamp),
            Ok(None) => {
                if is_embedded_state_era(snapshot) {
                    warnings.push("post-2017 capture without embedded page data".to_string());
                }
                RecoveredChannelData::empty(timestamp)
            }
            Err(e) => {
                warnings.push(format!("embedded page data is malformed: {e}"));
                RecoveredChannelData::empty(timestamp)
            }
        };

        let document = Html::parse_document(body);
        data.merge_missing(channel::from_markup(&document, body, timestamp));
        data
    }
}

/// Parses an already-fetched snapshot body.
///
/// Removal notices are checked first; a page showing one never yields a
/// record, even a partial one.
pub fn parse_page<T: PageRecord>(body: &str, snapshot: &CdxSnapshot) -> PageExtraction<T> {
    if let Some(notice) = detect_removal_notice(body) {
        return PageExtraction::RemovalNotice(notice);
    }
    let mut warnings = Vec::new();
    let data = T::parse_static(body, snapshot, &mut warnings);
    PageExtraction::from_record(data, warnings)
}

/// Fetches archived snapshots and extracts metadata from them.
///
/// Cheap to clone; clones share the fetcher and renderer.
#[derive(Clone)]
pub struct PageParser {
    fetcher: HttpFetcher,
    replay_base: String,
    renderer: Arc<dyn PageRenderer>,
}

impl PageParser {
    /// Creates a parser replaying snapshots from `replay_base_url`, without a
    /// page renderer.
    ///
    /// # Errors
    ///
    /// Returns `FetchError::InvalidUrl` if `replay_base_url` is not an absolute URL.
    pub fn new(fetcher: HttpFetcher, replay_base_url: &str) -> Result<Self, FetchError> {
        let base = Url::parse(replay_base_url)
            .map_err(|_| FetchError::InvalidUrl(replay_base_url.to_string()))?;
        if base.cannot_be_a_base() {
            return Err(FetchError::InvalidUrl(replay_base_url.to_string()));
        }
        Ok(Self {
            fetcher,
            replay_base: replay_base_url.trim_end_matches('/').to_string(),
            renderer: Arc::new(UnavailableRenderer),
        })
    }

    /// Uses `renderer` when static extraction finds fewer than
    /// `MIN_STATIC_FIELDS` fields.
    pub fn with_renderer(mut self, renderer: Arc<dyn PageRenderer>) -> Self {
        self.renderer = renderer;
        self
    }

    /// Replay URL of `snapshot`: `{replay_base}/{timestamp}/{original_url}`.
    pub fn replay_url(&self, snapshot: &CdxSnapshot) -> Result<Url, FetchError> {
        let raw = format!(
            "{}/{}/{}",
            self.replay_base, snapshot.timestamp, snapshot.original_url
        );
        Url::parse(&raw).map_err(|_| FetchError::InvalidUrl(raw))
    }

    pub async fn extract_video(
        &self,
        snapshot: &CdxSnapshot,
    ) -> Result<PageExtraction<RecoveredVideoData>, FetchError> {
        self.extract(snapshot).await
    }

    pub async fn extract_channel(
        &self,
        snapshot: &CdxSnapshot,
    ) -> Result<PageExtraction<RecoveredChannelData>, FetchError> {
        self.extract(snapshot).await
    }

    /// Fetches `snapshot` and extracts a record from it.
    ///
    /// # Errors
    ///
    /// Returns a `FetchError` only when the capture could not be fetched.
    /// Missing fields, malformed page state and removal notices are reported
    /// through `PageExtraction`.
    pub async fn extract<T: PageRecord>(
        &self,
        snapshot: &CdxSnapshot,
    ) -> Result<PageExtraction<T>, FetchError> {
        let url = self.replay_url(snapshot)?;
        let body = self.fetcher.get_text(&url).await?;
        log::debug!(
            "Fetched snapshot {} ({} bytes)",
            snapshot.timestamp,
            body.len()
        );

        let extraction = parse_page::<T>(&body, snapshot);
        if !self.renderer.is_available() {
            return Ok(extraction);
        }
        let extraction = match extraction {
            PageExtraction::Recovered { data, warnings }
                if data.recovered_count() < MIN_STATIC_FIELDS =>
            {
                self.merge_rendered(&url, snapshot, data, warnings).await
            }
            PageExtraction::NoUsableData(reason) => {
                log::debug!("Snapshot {}: {}", snapshot.timestamp, reason);
                let empty = T::empty(&snapshot.timestamp);
                self.merge_rendered(&url, snapshot, empty, Vec::new()).await
            }
            other => other,
        };
        Ok(extraction)
    }

    async fn merge_rendered<T: PageRecord>(
        &self,
        url: &Url,
        snapshot: &CdxSnapshot,
        mut data: T,
        mut warnings: Vec<String>,
    ) -> PageExtraction<T> {
        log::debug!(
            "Static extraction of snapshot {} found {} field(s); rendering page",
            snapshot.timestamp,
            data.recovered_count()
        );
        match self.renderer.render(url).await {
            Ok(html) => match parse_page::<T>(&html, snapshot) {
                PageExtraction::Recovered {
                    data: rendered,
                    warnings: rendered_warnings,
                } => {
                    data.merge_missing(rendered);
                    warnings.extend(rendered_warnings);
                }
                PageExtraction::RemovalNotice(notice) => {
                    warnings.push(format!("rendered page shows a removal notice ({notice})"));
                }
                PageExtraction::NoUsableData(_) => {}
            },
            Err(e) => warnings.push(e.to_string()),
        }
        PageExtraction::from_record(data, warnings)
    }
}

#[cfg(test)]
mod tests {
    include!("tests.rs");
}
