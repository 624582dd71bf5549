//! Metadata recovered from a single snapshot.
//!
//! Every attribute is independently optional: `None` means the snapshot did not
//! yield that field. Field names are fixed per record type so the orchestrator
//! can partition them into recovered and skipped sets.

use std::collections::BTreeSet;

use chrono::NaiveDate;
use serde::Serialize;

/// Field names of `RecoveredVideoData`, in declaration order.
pub const VIDEO_FIELDS: &[&str] = &[
    "title",
    "description",
    "channel_id",
    "channel_title",
    "view_count",
    "like_count",
    "published_at",
    "duration_seconds",
    "thumbnail_url",
    "tags",
    "category_id",
    "default_language",
];

/// Field names of `RecoveredChannelData`, in declaration order.
pub const CHANNEL_FIELDS: &[&str] = &[
    "title",
    "description",
    "channel_id",
    "custom_url",
    "subscriber_count",
    "video_count",
    "view_count",
    "joined_date",
    "thumbnail_url",
    "banner_url",
    "country",
    "keywords",
];

/// Common behaviour of recovered records.
pub trait RecoveredRecord: Sized {
    /// Every field name this record type can carry.
    const FIELDS: &'static [&'static str];

    /// Empty record for a snapshot.
    fn empty(snapshot_timestamp: &str) -> Self;

    /// Each field name paired with whether it holds a value.
    fn field_presence(&self) -> Vec<(&'static str, bool)>;

    fn snapshot_timestamp(&self) -> &str;

    /// Fills fields that are still `None` from `other`; present values win.
    fn merge_missing(&mut self, other: Self);

    /// Channel ids discovered while parsing (video pages only).
    fn channel_candidates(&self) -> BTreeSet<String> {
        BTreeSet::new()
    }

    /// Number of fields holding a value.
    fn recovered_count(&self) -> usize {
        self.field_presence()
            .into_iter()
            .filter(|(_, present)| *present)
            .count()
    }
}

fn fill<T>(slot: &mut Option<T>, value: Option<T>) {
    if slot.is_none() {
        *slot = value;
    }
}

/// Metadata recovered from an archived watch page.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RecoveredVideoData {
    /// Capture the fields were read from
    pub snapshot_timestamp: String,
    pub title: Option<String>,
    pub description: Option<String>,
    /// Uploader channel id (`UC…`)
    pub channel_id: Option<String>,
    pub channel_title: Option<String>,
    pub view_count: Option<u64>,
    pub like_count: Option<u64>,
    pub published_at: Option<NaiveDate>,
    pub duration_seconds: Option<u64>,
    pub thumbnail_url: Option<String>,
    pub tags: Option<Vec<String>>,
    /// Canonical numeric category id
    pub category_id: Option<u32>,
    pub default_language: Option<String>,
    /// Channel ids seen on the page, queued for opportunistic channel recovery
    #[serde(skip_serializing_if = "BTreeSet::is_empty")]
    pub channel_candidates: BTreeSet<String>,
}

impl RecoveredRecord for RecoveredVideoData {
    const FIELDS: &'static [&'static str] = VIDEO_FIELDS;

    fn empty(snapshot_timestamp: &str) -> Self {
        Self {
            snapshot_timestamp: snapshot_timestamp.to_string(),
            ..Default::default()
        }
    }

    fn field_presence(&self) -> Vec<(&'static str, bool)> {
        let Self {
            snapshot_timestamp: _,
            title,
            description,
            channel_id,
            channel_title,
            view_count,
            like_count,
            published_at,
            duration_seconds,
            thumbnail_url,
            tags,
            category_id,
            default_language,
            channel_candidates: _,
        } = self;
        vec![
            ("title", title.is_some()),
            ("description", description.is_some()),
            ("channel_id", channel_id.is_some()),
            ("channel_title", channel_title.is_some()),
            ("view_count", view_count.is_some()),
            ("like_count", like_count.is_some()),
            ("published_at", published_at.is_some()),
            ("duration_seconds", duration_seconds.is_some()),
            ("thumbnail_url", thumbnail_url.is_some()),
            ("tags", tags.is_some()),
            ("category_id", category_id.is_some()),
            ("default_language", default_language.is_some()),
        ]
    }

    fn snapshot_timestamp(&self) -> &str {
        &self.snapshot_timestamp
    }

    fn merge_missing(&mut self, other: Self) {
        let Self {
            snapshot_timestamp: _,
            title,
            description,
            channel_id,
            channel_title,
            view_count,
            like_count,
            published_at,
            duration_seconds,
            thumbnail_url,
            tags,
            category_id,
            default_language,
            channel_candidates,
        } = other;
        fill(&mut self.title, title);
        fill(&mut self.description, description);
        fill(&mut self.channel_id, channel_id);
        fill(&mut self.channel_title, channel_title);
        fill(&mut self.view_count, view_count);
        fill(&mut self.like_count, like_count);
        fill(&mut self.published_at, published_at);
        fill(&mut self.duration_seconds, duration_seconds);
        fill(&mut self.thumbnail_url, thumbnail_url);
        fill(&mut self.tags, tags);
        fill(&mut self.category_id, category_id);
        fill(&mut self.default_language, default_language);
        self.channel_candidates.extend(channel_candidates);
    }

    fn channel_candidates(&self) -> BTreeSet<String> {
        self.channel_candidates.clone()
    }
}

/// Metadata recovered from an archived channel page.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RecoveredChannelData {
    /// Capture the fields were read from
    pub snapshot_timestamp: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub channel_id: Option<String>,
    /// Vanity URL or handle
    pub custom_url: Option<String>,
    pub subscriber_count: Option<u64>,
    pub video_count: Option<u64>,
    pub view_count: Option<u64>,
    pub joined_date: Option<NaiveDate>,
    pub thumbnail_url: Option<String>,
    pub banner_url: Option<String>,
    pub country: Option<String>,
    pub keywords: Option<Vec<String>>,
}

impl RecoveredRecord for RecoveredChannelData {
    const FIELDS: &'static [&'static str] = CHANNEL_FIELDS;

    fn empty(snapshot_timestamp: &str) -> Self {
        Self {
            snapshot_timestamp: snapshot_timestamp.to_string(),
            ..Default::default()
        }
    }

    fn field_presence(&self) -> Vec<(&'static str, bool)> {
        let Self {
            snapshot_timestamp: _,
            title,
            description,
            channel_id,
            custom_url,
            subscriber_count,
            video_count,
            view_count,
            joined_date,
            thumbnail_url,
            banner_url,
            country,
            keywords,
        } = self;
        vec![
            ("title", title.is_some()),
            ("description", description.is_some()),
            ("channel_id", channel_id.is_some()),
            ("custom_url", custom_url.is_some()),
            ("subscriber_count", subscriber_count.is_some()),
            ("video_count", video_count.is_some()),
            ("view_count", view_count.is_some()),
            ("joined_date", joined_date.is_some()),
            ("thumbnail_url", thumbnail_url.is_some()),
            ("banner_url", banner_url.is_some()),
            ("country", country.is_some()),
            ("keywords", keywords.is_some()),
        ]
    }

    fn snapshot_timestamp(&self) -> &str {
        &self.snapshot_timestamp
    }

    fn merge_missing(&mut self, other: Self) {
        let Self {
            snapshot_timestamp: _,
            title,
            description,
            channel_id,
            custom_url,
            subscriber_count,
            video_count,
            view_count,
            joined_date,
            thumbnail_url,
            banner_url,
            country,
            keywords,
        } = other;
        fill(&mut self.title, title);
        fill(&mut self.description, description);
        fill(&mut self.channel_id, channel_id);
        fill(&mut self.custom_url, custom_url);
        fill(&mut self.subscriber_count, subscriber_count);
        fill(&mut self.video_count, video_count);
        fill(&mut self.view_count, view_count);
        fill(&mut self.joined_date, joined_date);
        fill(&mut self.thumbnail_url, thumbnail_url);
        fill(&mut self.banner_url, banner_url);
        fill(&mut self.country, country);
        fill(&mut self.keywords, keywords);
    }
}
