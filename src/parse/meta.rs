//! Document lookups shared by the legacy markup extractors.

use scraper::{ElementRef, Html, Selector};

use super::values::clean_text;

const SITE_TITLE_SUFFIX: &str = " - YouTube";
const SITE_TITLE: &str = "YouTube";

/// `content` attribute of the first element matching `selector`.
pub(crate) fn content(document: &Html, selector: &Selector) -> Option<String> {
    attr(document, selector, "content")
}

/// Named attribute of the first matching element that carries a non-empty value.
pub(crate) fn attr(document: &Html, selector: &Selector, name: &str) -> Option<String> {
    document
        .select(selector)
        .filter_map(|el| el.value().attr(name))
        .find_map(clean_text)
}

/// `content` of every matching element, in document order.
pub(crate) fn all_contents(document: &Html, selector: &Selector) -> Vec<String> {
    document
        .select(selector)
        .filter_map(|el| el.value().attr("content"))
        .filter_map(clean_text)
        .collect()
}

/// Whitespace-collapsed text of the first matching element with any text.
pub(crate) fn text(document: &Html, selector: &Selector) -> Option<String> {
    document.select(selector).find_map(|el| element_text(&el))
}

/// Text of the first matching element, keeping line breaks.
pub(crate) fn multiline_text(document: &Html, selector: &Selector) -> Option<String> {
    document.select(selector).find_map(|el| {
        let raw: String = el.text().collect();
        let lines: Vec<&str> = raw
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .collect();
        (!lines.is_empty()).then(|| lines.join("\n"))
    })
}

pub(crate) fn element_text(el: &ElementRef<'_>) -> Option<String> {
    clean_text(&el.text().collect::<String>())
}

/// Page `<title>` without the site suffix; the bare site name yields `None`.
pub(crate) fn page_title(document: &Html, title_selector: &Selector) -> Option<String> {
    let title = text(document, title_selector)?;
    let title = title
        .strip_suffix(SITE_TITLE_SUFFIX)
        .unwrap_or(&title)
        .trim()
        .to_string();
    if title.is_empty() || title == SITE_TITLE {
        None
    } else {
        Some(title)
    }
}
