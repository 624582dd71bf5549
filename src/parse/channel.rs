//! Channel-page extraction.
//!
//! Modern captures carry `ytInitialData` with `channelMetadataRenderer`, a
//! `c4TabbedHeaderRenderer` header and (on about pages) a
//! `channelAboutFullMetadataRenderer`. Older captures only have markup: meta
//! tags, the branded page header and the about-page stats.

use regex::Regex;
use scraper::{Html, Selector};
use serde_json::Value;
use std::sync::LazyLock;
use url::Url;

use super::blob::{find_key, largest_thumbnail, text_of};
use super::meta;
use super::patterns::{compile_regex_unsafe, parse_selector_unsafe};
use super::values::{find_channel_id, parse_count, parse_date, split_keywords};
use crate::models::{RecoveredChannelData, RecoveredRecord};

const BANNER_STYLE_PATTERN: &str =
    r"#c4-header-bg-container\s*\{[^}]*background-image:\s*url\(\s*['\x22]?([^)'\x22]+)";

static BANNER_STYLE_RE: LazyLock<Regex> =
    LazyLock::new(|| compile_regex_unsafe(BANNER_STYLE_PATTERN, "BANNER_STYLE_RE"));

struct ChannelSelectors {
    title: Selector,
    meta_title: Selector,
    og_title: Selector,
    header_title: Selector,
    about_description: Selector,
    meta_description: Selector,
    og_description: Selector,
    channel_id: Selector,
    canonical: Selector,
    og_url: Selector,
    subscriber_button: Selector,
    about_stat: Selector,
    profile_image: Selector,
    og_image: Selector,
    country: Selector,
    meta_keywords: Selector,
}

static SELECTORS: LazyLock<ChannelSelectors> = LazyLock::new(|| {
    let s = |css: &str| parse_selector_unsafe(css, "channel page selectors");
    ChannelSelectors {
        title: s("title"),
        meta_title: s("meta[name='title']"),
        og_title: s("meta[property='og:title']"),
        header_title: s(".branded-page-header-title-link"),
        about_description: s(".about-description"),
        meta_description: s("meta[name='description']"),
        og_description: s("meta[property='og:description']"),
        channel_id: s("meta[itemprop='channelId']"),
        canonical: s("link[rel='canonical']"),
        og_url: s("meta[property='og:url']"),
        subscriber_button: s(".yt-subscription-button-subscriber-count-branded-horizontal"),
        about_stat: s(".about-stats .about-stat, .about-stat"),
        profile_image: s(".channel-header-profile-image, .appbar-nav-avatar"),
        og_image: s("meta[property='og:image']"),
        country: s(".country-inline"),
        meta_keywords: s("meta[name='keywords']"),
    }
});

/// Maps a channel page's `ytInitialData` onto a channel record.
pub(crate) fn from_initial_data(data: &Value, snapshot_timestamp: &str) -> RecoveredChannelData {
    let mut record = RecoveredChannelData::empty(snapshot_timestamp);
    let metadata = data
        .pointer("/metadata/channelMetadataRenderer")
        .unwrap_or(&Value::Null);
    let header = data
        .pointer("/header/c4TabbedHeaderRenderer")
        .unwrap_or(&Value::Null);
    let micro = data
        .pointer("/microformat/microformatDataRenderer")
        .unwrap_or(&Value::Null);
    let about = find_key(data, "channelAboutFullMetadataRenderer").unwrap_or(&Value::Null);

    record.title = metadata
        .get("title")
        .and_then(text_of)
        .or_else(|| header.get("title").and_then(text_of))
        .or_else(|| micro.get("title").and_then(text_of));
    record.description = metadata
        .get("description")
        .and_then(text_of)
        .or_else(|| about.get("description").and_then(text_of))
        .or_else(|| micro.get("description").and_then(text_of));
    record.channel_id = metadata
        .get("externalId")
        .or_else(|| header.get("channelId"))
        .and_then(Value::as_str)
        .and_then(find_channel_id);
    record.custom_url = metadata
        .get("vanityChannelUrl")
        .and_then(Value::as_str)
        .and_then(custom_path);
    record.subscriber_count = header
        .get("subscriberCountText")
        .or_else(|| about.get("subscriberCountText"))
        .and_then(text_of)
        .as_deref()
        .and_then(parse_count);
    record.video_count = header
        .get("videosCountText")
        .and_then(text_of)
        .as_deref()
        .and_then(parse_count);
    record.view_count = about
        .get("viewCountText")
        .and_then(text_of)
        .as_deref()
        .and_then(parse_count);
    record.joined_date = about
        .get("joinedDateText")
        .and_then(text_of)
        .as_deref()
        .and_then(parse_date);
    record.thumbnail_url = metadata
        .get("avatar")
        .and_then(largest_thumbnail)
        .or_else(|| header.get("avatar").and_then(largest_thumbnail))
        .or_else(|| micro.get("thumbnail").and_then(largest_thumbnail));
    record.banner_url = header.get("banner").and_then(largest_thumbnail);
    record.country = about.get("country").and_then(text_of);
    record.keywords = metadata
        .get("keywords")
        .and_then(Value::as_str)
        .map(split_keywords)
        .filter(|k| !k.is_empty());
    record
}

/// Extracts a channel record from legacy channel-page markup.
pub(crate) fn from_markup(document: &Html, body: &str, snapshot_timestamp: &str) -> RecoveredChannelData {
    let sel = &*SELECTORS;
    let mut record = RecoveredChannelData::empty(snapshot_timestamp);

    record.title = meta::content(document, &sel.og_title)
        .or_else(|| meta::content(document, &sel.meta_title))
        .or_else(|| meta::text(document, &sel.header_title))
        .or_else(|| meta::page_title(document, &sel.title));
    record.description = meta::multiline_text(document, &sel.about_description)
        .or_else(|| meta::content(document, &sel.meta_description))
        .or_else(|| meta::content(document, &sel.og_description));

    let canonical = meta::attr(document, &sel.canonical, "href")
        .or_else(|| meta::content(document, &sel.og_url));
    record.channel_id = meta::content(document, &sel.channel_id)
        .or_else(|| canonical.clone())
        .as_deref()
        .and_then(find_channel_id);
    record.custom_url = meta::attr(document, &sel.header_title, "href")
        .or(canonical)
        .as_deref()
        .and_then(custom_path);

    let stats: Vec<String> = document
        .select(&sel.about_stat)
        .filter_map(|el| meta::element_text(&el))
        .collect();
    let stat = |word: &str| {
        stats
            .iter()
            .find(|s| s.to_lowercase().contains(word))
            .map(String::as_str)
    };

    record.subscriber_count = meta::attr(document, &sel.subscriber_button, "title")
        .or_else(|| meta::text(document, &sel.subscriber_button))
        .as_deref()
        .and_then(parse_count)
        .or_else(|| stat("subscriber").and_then(parse_count));
    record.video_count = stat("video").and_then(parse_count);
    record.view_count = stat("view").and_then(parse_count);
    record.joined_date = stat("joined").and_then(parse_date);
    record.thumbnail_url = meta::attr(document, &sel.profile_image, "src")
        .or_else(|| meta::content(document, &sel.og_image))
        .map(absolute_url);
    record.banner_url = BANNER_STYLE_RE
        .captures(body)
        .and_then(|caps| caps.get(1))
        .map(|m| absolute_url(m.as_str().trim().to_string()));
    record.country = meta::text(document, &sel.country);
    record.keywords = meta::content(document, &sel.meta_keywords)
        .map(|k| split_keywords(&k))
        .filter(|k| !k.is_empty());
    record
}

/// Vanity path of a channel URL (`user/Name`, `c/Name` or `@handle`);
/// `/channel/UC…` URLs have none.
fn custom_path(url: &str) -> Option<String> {
    let path = match Url::parse(url) {
        Ok(parsed) => parsed.path().to_string(),
        Err(_) => url.to_string(),
    };
    let path = path.trim_matches('/');
    let is_vanity = path.starts_with('@') || path.starts_with("user/") || path.starts_with("c/");
    (is_vanity && !path.contains("/channel/")).then(|| path.to_string())
}

fn absolute_url(url: String) -> String {
    if url.starts_with("//") {
        format!("https:{url}")
    } else {
        url
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_custom_path() {
        assert_eq!(
            custom_path("http://www.youtube.com/@someone").as_deref(),
            Some("@someone")
        );
        assert_eq!(
            custom_path("https://www.youtube.com/user/SomeOne").as_deref(),
            Some("user/SomeOne")
        );
        assert_eq!(custom_path("/c/Name").as_deref(), Some("c/Name"));
        assert_eq!(
            custom_path("https://www.youtube.com/channel/UCuAXFkgsw1L7xaCfnd5JJOw"),
            None
        );
    }

    #[test]
    fn test_absolute_url() {
        assert_eq!(
            absolute_url("//yt3.ggpht.com/banner".to_string()),
            "https://yt3.ggpht.com/banner"
        );
    }
}
