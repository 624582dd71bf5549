//! Removal-notice detection.
//!
//! A capture taken after a video or channel disappeared shows a notice instead
//! of the original metadata. Such captures must never count as recovered, so
//! every fetched body is checked before extraction.
//!
//! Phrases are matched against the document's visible page chrome only.
//! Script text (translations, player configuration) and uploader or viewer
//! content (titles, descriptions, comments, related videos) are skipped, so a
//! description saying "no copyright infringement intended" does not read as a
//! takedown. The embedded `playabilityStatus` is checked structurally.

use regex::Regex;
use scraper::{Html, Node};
use std::sync::LazyLock;
use strum::IntoEnumIterator;
use strum_macros::EnumIter;

use super::patterns::compile_regex_unsafe;

const PLAYABILITY_PATTERN: &str =
    r#""playabilityStatus"\s*:\s*\{\s*"status"\s*:\s*"(ERROR|UNPLAYABLE|LOGIN_REQUIRED)"(?:[^{}]*?"reason"\s*:\s*"([^"]*)")?"#;

static PLAYABILITY_RE: LazyLock<Regex> =
    LazyLock::new(|| compile_regex_unsafe(PLAYABILITY_PATTERN, "PLAYABILITY_RE"));

// Elements whose text is never rendered in the page body
const HIDDEN_ELEMENTS: &[&str] = &["script", "style", "noscript", "template", "title"];

// Containers of text written by uploaders and viewers
const USER_CONTENT_IDS: &[&str] = &[
    "eow-title",
    "eow-description",
    "watch-headline-title",
    "watch-description",
    "watch-discussion",
    "watch7-sidebar",
    "watch-sidebar",
    "comments",
    "related",
    "description",
    "channel-description",
];
const USER_CONTENT_CLASSES: &[&str] = &[
    "about-description",
    "comment-text",
    "comment-renderer-text-content",
    "yt-lockup-title",
    "yt-lockup-description",
    "video-list-item",
    "channel-header",
    "branded-page-header-title",
];

/// Kinds of removal notice an archived page can show.
///
/// Variants are checked in declaration order, so more specific notices come
/// before the generic ones they would otherwise be mistaken for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter)]
pub enum RemovalNotice {
    AccountTerminated,
    RemovedByUploader,
    CopyrightTakedown,
    GuidelineViolation,
    Private,
    RegionBlocked,
    AgeRestricted,
    ChannelMissing,
    PlaylistDeleted,
    NotFoundShell,
    EmptyPlayer,
    VideoUnavailable,
}

impl RemovalNotice {
    /// Lower-case phrases identifying this notice in visible text.
    fn phrases(&self) -> &'static [&'static str] {
        match self {
            RemovalNotice::AccountTerminated => &[
                "account has been terminated",
                "account associated with this video has been terminated",
                "channel has been terminated",
                "account has been suspended",
            ],
            RemovalNotice::RemovedByUploader => &[
                "removed by the uploader",
                "removed by the user",
                "has been removed by the video owner",
            ],
            RemovalNotice::CopyrightTakedown => &[
                "copyright claim",
                "due to a copyright",
                "copyright infringement",
            ],
            RemovalNotice::GuidelineViolation => &[
                "violating youtube's community guidelines",
                "violation of youtube's community guidelines",
                "violating youtube's terms of service",
                "violation of youtube's terms of service",
                "removed for violating",
            ],
            RemovalNotice::Private => &["this video is private", "video is private"],
            RemovalNotice::RegionBlocked => &[
                "not available in your country",
                "not made this video available in your country",
                "blocked in your country",
            ],
            RemovalNotice::AgeRestricted => &[
                "sign in to confirm your age",
                "this video is age-restricted",
                "may be inappropriate for some users",
            ],
            RemovalNotice::ChannelMissing => &[
                "this channel does not exist",
                "channel is not available",
                "this account has been closed",
            ],
            RemovalNotice::PlaylistDeleted => &[
                "this playlist does not exist",
                "the playlist does not exist",
                "playlist was deleted",
            ],
            RemovalNotice::NotFoundShell => &[
                "404 not found",
                "this page isn't available",
                "this page is not available",
                "the requested url was not found",
            ],
            RemovalNotice::EmptyPlayer => &[
                "an error occurred. please try again later",
                "this video is not available",
            ],
            RemovalNotice::VideoUnavailable => &[
                "video unavailable",
                "this video is unavailable",
                "this video is no longer available",
                "this video has been removed",
                "this video does not exist",
            ],
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RemovalNotice::AccountTerminated => "account terminated",
            RemovalNotice::RemovedByUploader => "removed by uploader",
            RemovalNotice::CopyrightTakedown => "copyright takedown",
            RemovalNotice::GuidelineViolation => "guideline violation",
            RemovalNotice::Private => "private",
            RemovalNotice::RegionBlocked => "region blocked",
            RemovalNotice::AgeRestricted => "age restricted",
            RemovalNotice::ChannelMissing => "channel does not exist",
            RemovalNotice::PlaylistDeleted => "playlist deleted",
            RemovalNotice::NotFoundShell => "not found page",
            RemovalNotice::EmptyPlayer => "empty player",
            RemovalNotice::VideoUnavailable => "video unavailable",
        }
    }

    fn classify(text: &str) -> Option<RemovalNotice> {
        RemovalNotice::iter().find(|notice| notice.phrases().iter().any(|p| text.contains(p)))
    }
}

impl std::fmt::Display for RemovalNotice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returns the removal notice shown by `body`, if any.
pub fn detect_removal_notice(body: &str) -> Option<RemovalNotice> {
    if let Some(notice) = playability_notice(body) {
        return Some(notice);
    }
    let document = Html::parse_document(body);
    RemovalNotice::classify(&visible_text(&document))
}

/// Lower-cased, whitespace-collapsed text of every rendered text node outside
/// user content.
pub(crate) fn visible_text(document: &Html) -> String {
    let mut text = String::new();
    for node in document.tree.root().descendants() {
        let Node::Text(chunk) = node.value() else {
            continue;
        };
        let skipped = node
            .ancestors()
            .filter_map(|ancestor| ancestor.value().as_element())
            .any(|el| is_hidden(el) || is_user_content(el));
        if skipped {
            continue;
        }
        for word in chunk.split_whitespace() {
            if !text.is_empty() {
                text.push(' ');
            }
            text.push_str(&word.to_lowercase());
        }
    }
    text
}

fn is_hidden(el: &scraper::node::Element) -> bool {
    HIDDEN_ELEMENTS.contains(&el.name())
}

fn is_user_content(el: &scraper::node::Element) -> bool {
    el.id().is_some_and(|id| USER_CONTENT_IDS.contains(&id))
        || el.classes().any(|class| USER_CONTENT_CLASSES.contains(&class))
}

fn playability_notice(body: &str) -> Option<RemovalNotice> {
    let caps = PLAYABILITY_RE.captures(body)?;
    let status = caps.get(1)?.as_str();
    let reason = caps
        .get(2)
        .map(|m| m.as_str().to_lowercase())
        .unwrap_or_default();
    if let Some(notice) = RemovalNotice::classify(&reason) {
        return Some(notice);
    }
    match status {
        "ERROR" => Some(RemovalNotice::VideoUnavailable),
        "LOGIN_REQUIRED" if reason.contains("age") => Some(RemovalNotice::AgeRestricted),
        "LOGIN_REQUIRED" => Some(RemovalNotice::Private),
        _ => Some(RemovalNotice::EmptyPlayer),
    }
}
