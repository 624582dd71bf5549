//! Watch-page extraction.
//!
//! Two sources are read:
//! - the embedded player state (`videoDetails` and
//!   `microformat.playerMicroformatRenderer`, or flat legacy player args)
//! - legacy markup: `meta`/Open Graph tags, `itemprop` microdata and the
//!   `#eow-*` watch-page elements

use regex::Regex;
use scraper::{Html, Selector};
use serde_json::Value;
use std::sync::LazyLock;

use super::blob::{as_count, largest_thumbnail, text_of, PlayerState};
use super::categories::category_id;
use super::meta;
use super::patterns::{compile_regex_unsafe, parse_selector_unsafe};
use super::values::{find_channel_id, parse_count, parse_date, parse_iso_duration, split_keywords};
use crate::models::{RecoveredRecord, RecoveredVideoData};

// Like counts only appear in accessibility labels of the like button
const LIKE_LABEL_PATTERN: &str = r#"(?i)"label"\s*:\s*"([\d.,]+\s*[KMB]?) likes?""#;
const LIKE_ALONG_PATTERN: &str = r"(?i)like this video along with ([\d.,]+) other";

static LIKE_LABEL_RE: LazyLock<Regex> =
    LazyLock::new(|| compile_regex_unsafe(LIKE_LABEL_PATTERN, "LIKE_LABEL_RE"));
static LIKE_ALONG_RE: LazyLock<Regex> =
    LazyLock::new(|| compile_regex_unsafe(LIKE_ALONG_PATTERN, "LIKE_ALONG_RE"));

// Automatic captions are generated in the spoken language
const AUTO_CAPTION_KIND: &str = "asr";

struct WatchSelectors {
    title: Selector,
    meta_title: Selector,
    og_title: Selector,
    eow_title: Selector,
    eow_description: Selector,
    og_description: Selector,
    meta_description: Selector,
    channel_id: Selector,
    owner_link: Selector,
    owner_name: Selector,
    author_name: Selector,
    interaction_count: Selector,
    view_count: Selector,
    like_button: Selector,
    date_published: Selector,
    watch_date: Selector,
    duration: Selector,
    thumbnail_link: Selector,
    og_image: Selector,
    og_tags: Selector,
    meta_keywords: Selector,
    genre: Selector,
    eow_category: Selector,
    in_language: Selector,
}

static SELECTORS: LazyLock<WatchSelectors> = LazyLock::new(|| {
    let s = |css: &str| parse_selector_unsafe(css, "watch page selectors");
    WatchSelectors {
        title: s("title"),
        meta_title: s("meta[name='title']"),
        og_title: s("meta[property='og:title']"),
        eow_title: s("#eow-title"),
        eow_description: s("#eow-description"),
        og_description: s("meta[property='og:description']"),
        meta_description: s("meta[name='description']"),
        channel_id: s("meta[itemprop='channelId']"),
        owner_link: s(".yt-user-info a[href], #watch7-user-header a[href], #watch-uploader-info a[href]"),
        owner_name: s(".yt-user-info a, #watch7-user-header .yt-user-name, #watch-uploader-info .author"),
        author_name: s("[itemprop='author'] link[itemprop='name']"),
        interaction_count: s("meta[itemprop='interactionCount']"),
        view_count: s(".watch-view-count, #watch7-views-info .watch-view-count"),
        like_button: s(".like-button-renderer-like-button .yt-uix-button-content, #watch-like .yt-uix-button-content, .likes-count"),
        date_published: s("meta[itemprop='datePublished']"),
        watch_date: s("#eow-date, .watch-time-text"),
        duration: s("meta[itemprop='duration']"),
        thumbnail_link: s("link[itemprop='thumbnailUrl']"),
        og_image: s("meta[property='og:image']"),
        og_tags: s("meta[property='og:video:tag']"),
        meta_keywords: s("meta[name='keywords']"),
        genre: s("meta[itemprop='genre']"),
        eow_category: s("#eow-category a, #eow-category"),
        in_language: s("meta[itemprop='inLanguage']"),
    }
});

/// Maps a player state onto a video record.
pub(crate) fn from_player_state(
    state: &PlayerState,
    snapshot_timestamp: &str,
    warnings: &mut Vec<String>,
) -> RecoveredVideoData {
    let mut data = RecoveredVideoData::empty(snapshot_timestamp);
    match state {
        PlayerState::Response(response) => apply_player_response(&mut data, response, warnings),
        PlayerState::LegacyArgs(args) => apply_legacy_args(&mut data, args),
    }
    data
}

fn apply_player_response(data: &mut RecoveredVideoData, response: &Value, warnings: &mut Vec<String>) {
    let details = response.get("videoDetails").unwrap_or(&Value::Null);
    let micro = response
        .pointer("/microformat/playerMicroformatRenderer")
        .unwrap_or(&Value::Null);

    data.title = details
        .get("title")
        .and_then(text_of)
        .or_else(|| micro.get("title").and_then(text_of));
    data.description = details
        .get("shortDescription")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .map(str::to_string)
        .or_else(|| micro.get("description").and_then(text_of));
    data.channel_id = details
        .get("channelId")
        .and_then(Value::as_str)
        .or_else(|| micro.get("externalChannelId").and_then(Value::as_str))
        .and_then(find_channel_id);
    data.channel_title = details
        .get("author")
        .and_then(text_of)
        .or_else(|| micro.get("ownerChannelName").and_then(text_of));
    data.view_count = details
        .get("viewCount")
        .and_then(as_count)
        .or_else(|| micro.get("viewCount").and_then(as_count));
    data.published_at = micro
        .get("publishDate")
        .or_else(|| micro.get("uploadDate"))
        .and_then(Value::as_str)
        .and_then(parse_date);
    data.duration_seconds = details
        .get("lengthSeconds")
        .and_then(as_count)
        .or_else(|| micro.get("lengthSeconds").and_then(as_count));
    data.thumbnail_url = details
        .get("thumbnail")
        .and_then(largest_thumbnail)
        .or_else(|| micro.get("thumbnail").and_then(largest_thumbnail));
    data.tags = details
        .get("keywords")
        .and_then(Value::as_array)
        .map(|words| {
            words
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect::<Vec<_>>()
        })
        .filter(|tags| !tags.is_empty());
    if let Some(name) = micro.get("category").and_then(Value::as_str) {
        data.category_id = lookup_category(name, warnings);
    }
    data.default_language = response
        .pointer("/captions/playerCaptionsTracklistRenderer/captionTracks")
        .and_then(Value::as_array)
        .and_then(|tracks| {
            tracks.iter().find(|track| {
                track.get("kind").and_then(Value::as_str) == Some(AUTO_CAPTION_KIND)
            })
        })
        .and_then(|track| track.get("languageCode"))
        .and_then(Value::as_str)
        .map(str::to_string);
}

fn apply_legacy_args(data: &mut RecoveredVideoData, args: &Value) {
    let string = |key: &str| args.get(key).and_then(text_of);
    data.title = string("title");
    data.channel_title = string("author");
    data.channel_id = string("ucid").as_deref().and_then(find_channel_id);
    data.view_count = args.get("view_count").and_then(as_count);
    data.duration_seconds = args.get("length_seconds").and_then(as_count);
    data.thumbnail_url = string("iurlhq")
        .or_else(|| string("thumbnail_url"))
        .or_else(|| string("iurl"));
    data.tags = string("keywords")
        .map(|k| split_keywords(&k))
        .filter(|tags| !tags.is_empty());
}

/// Extracts a video record from legacy watch-page markup.
pub(crate) fn from_markup(
    document: &Html,
    snapshot_timestamp: &str,
    warnings: &mut Vec<String>,
) -> RecoveredVideoData {
    let sel = &*SELECTORS;
    let mut data = RecoveredVideoData::empty(snapshot_timestamp);

    data.title = meta::content(document, &sel.meta_title)
        .or_else(|| meta::attr(document, &sel.eow_title, "title"))
        .or_else(|| meta::text(document, &sel.eow_title))
        .or_else(|| meta::content(document, &sel.og_title))
        .or_else(|| meta::page_title(document, &sel.title));
    data.description = meta::multiline_text(document, &sel.eow_description)
        .or_else(|| meta::content(document, &sel.og_description))
        .or_else(|| meta::content(document, &sel.meta_description));
    data.channel_id = meta::content(document, &sel.channel_id)
        .as_deref()
        .and_then(find_channel_id)
        .or_else(|| {
            document
                .select(&sel.owner_link)
                .filter_map(|a| a.value().attr("href"))
                .find_map(find_channel_id)
        });
    data.channel_title = meta::text(document, &sel.owner_name)
        .or_else(|| meta::attr(document, &sel.author_name, "content"));
    data.view_count = meta::content(document, &sel.interaction_count)
        .or_else(|| meta::text(document, &sel.view_count))
        .as_deref()
        .and_then(parse_count);
    data.like_count = meta::text(document, &sel.like_button)
        .as_deref()
        .and_then(parse_count);
    data.published_at = meta::content(document, &sel.date_published)
        .or_else(|| meta::text(document, &sel.watch_date))
        .as_deref()
        .and_then(parse_date);
    data.duration_seconds = meta::content(document, &sel.duration)
        .as_deref()
        .and_then(parse_iso_duration);
    data.thumbnail_url = meta::attr(document, &sel.thumbnail_link, "href")
        .or_else(|| meta::content(document, &sel.og_image));

    let og_tags = meta::all_contents(document, &sel.og_tags);
    data.tags = if og_tags.is_empty() {
        meta::content(document, &sel.meta_keywords)
            .map(|k| split_keywords(&k))
            .filter(|tags| !tags.is_empty())
    } else {
        Some(og_tags)
    };

    if let Some(name) =
        meta::content(document, &sel.genre).or_else(|| meta::text(document, &sel.eow_category))
    {
        data.category_id = lookup_category(&name, warnings);
    }
    data.default_language = meta::content(document, &sel.in_language);
    data
}

/// Like count from like-button accessibility labels anywhere in the body.
pub(crate) fn like_count_from_body(body: &str) -> Option<u64> {
    LIKE_LABEL_RE
        .captures(body)
        .or_else(|| LIKE_ALONG_RE.captures(body))
        .and_then(|caps| caps.get(1))
        .and_then(|m| parse_count(m.as_str()))
}

fn lookup_category(name: &str, warnings: &mut Vec<String>) -> Option<u32> {
    let id = category_id(name);
    if id.is_none() {
        warnings.push(format!("unknown category name '{}'", name.trim()));
    }
    id
}
