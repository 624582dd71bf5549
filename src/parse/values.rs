//! Parsing of human-formatted values found on archived pages.
//!
//! Counts appear as `1,234 views` or `1.2M subscribers`, dates as ISO
//! `2012-01-05` or `Jan 5, 2012` behind prefixes such as "Published on", and
//! durations as ISO-8601 (`PT4M13S`).

use chrono::NaiveDate;
use regex::Regex;
use std::sync::LazyLock;

use super::patterns::compile_regex_unsafe;

const COUNT_PATTERN: &str = r"(?i)(\d+(?:[.,]\d+)*)\s*([kmb])?(?:\b|$)";
const ISO_DURATION_PATTERN: &str =
    r"^P(?:(\d+)D)?(?:T(?:(\d+)H)?(?:(\d+)M)?(?:(\d+(?:\.\d+)?)S)?)?$";
const CHANNEL_ID_PATTERN: &str = r"UC[0-9A-Za-z_-]{22}";

static COUNT_RE: LazyLock<Regex> =
    LazyLock::new(|| compile_regex_unsafe(COUNT_PATTERN, "COUNT_RE"));
static ISO_DURATION_RE: LazyLock<Regex> =
    LazyLock::new(|| compile_regex_unsafe(ISO_DURATION_PATTERN, "ISO_DURATION_RE"));
pub(crate) static CHANNEL_ID_RE: LazyLock<Regex> =
    LazyLock::new(|| compile_regex_unsafe(CHANNEL_ID_PATTERN, "CHANNEL_ID_RE"));

// Leading phrases stripped before date parsing
const DATE_PREFIXES: &[&str] = &[
    "published on",
    "uploaded on",
    "streamed live on",
    "premiered on",
    "premiered",
    "added on",
    "joined on",
    "joined",
];

const DATE_FORMATS: &[&str] = &["%b %d, %Y", "%d %b %Y", "%B %d %Y", "%Y/%m/%d"];

/// Parses the first count in `text`, honouring K/M/B suffixes.
///
/// `"No views"` and similar zero phrases yield `Some(0)`.
pub fn parse_count(text: &str) -> Option<u64> {
    let trimmed = text.trim();
    if trimmed.to_ascii_lowercase().starts_with("no ") {
        return Some(0);
    }

    let caps = COUNT_RE.captures(trimmed)?;
    let number = caps.get(1)?.as_str();
    match caps.get(2) {
        Some(suffix) => {
            let multiplier = match suffix.as_str().to_ascii_lowercase().as_str() {
                "k" => 1_000.0,
                "m" => 1_000_000.0,
                _ => 1_000_000_000.0,
            };
            let value: f64 = number.replace(',', ".").parse().ok()?;
            Some((value * multiplier).round() as u64)
        }
        None => {
            let digits: String = number.chars().filter(char::is_ascii_digit).collect();
            digits.parse().ok()
        }
    }
}

/// Parses a date in ISO form or `Mon D, YYYY` form, after stripping a leading
/// phrase such as "Published on" or "Joined".
pub fn parse_date(text: &str) -> Option<NaiveDate> {
    let mut value = text.trim();
    let lower = value.to_ascii_lowercase();
    for prefix in DATE_PREFIXES {
        if lower.starts_with(prefix) {
            value = value[prefix.len()..].trim_start_matches([':', ' ']).trim();
            break;
        }
    }

    if let Some(iso) = value.get(..10) {
        if let Ok(date) = NaiveDate::parse_from_str(iso, "%Y-%m-%d") {
            return Some(date);
        }
    }

    let cleaned = value.trim_end_matches('.');
    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(cleaned, format).ok())
}

/// Parses an ISO-8601 duration such as `PT4M13S` into whole seconds.
pub fn parse_iso_duration(text: &str) -> Option<u64> {
    let text = text.trim();
    if text.len() < 3 {
        return None;
    }
    let caps = ISO_DURATION_RE.captures(text)?;
    let part = |i: usize| -> Option<f64> {
        caps.get(i)
            .map(|m| m.as_str().parse::<f64>().ok())
            .unwrap_or(Some(0.0))
    };
    let seconds = part(1)? * 86_400.0 + part(2)? * 3_600.0 + part(3)? * 60.0 + part(4)?;
    Some(seconds.round() as u64)
}

/// Returns the first channel id (`UC` + 22 characters) in `text`.
pub fn find_channel_id(text: &str) -> Option<String> {
    CHANNEL_ID_RE.find(text).map(|m| m.as_str().to_string())
}

/// Splits a keyword string, keeping double-quoted phrases together.
///
/// Both `"a b" c` (space separated with quotes) and `a, b, c` are accepted.
pub fn split_keywords(text: &str) -> Vec<String> {
    if text.contains(',') && !text.contains('"') {
        return text
            .split(',')
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .map(str::to_string)
            .collect();
    }

    let mut keywords = Vec::new();
    let mut current = String::new();
    let mut quoted = false;
    for c in text.chars() {
        match c {
            '"' => {
                quoted = !quoted;
                if !quoted && !current.trim().is_empty() {
                    keywords.push(current.trim().to_string());
                    current.clear();
                }
            }
            c if c.is_whitespace() && !quoted => {
                if !current.trim().is_empty() {
                    keywords.push(current.trim().to_string());
                }
                current.clear();
            }
            c => current.push(c),
        }
    }
    if !current.trim().is_empty() {
        keywords.push(current.trim().to_string());
    }
    keywords
}

/// Collapses whitespace runs and trims; empty results become `None`.
pub(crate) fn clean_text(text: &str) -> Option<String> {
    let cleaned = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if cleaned.is_empty() {
        None
    } else {
        Some(cleaned)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_count() {
        assert_eq!(parse_count("1,234 views"), Some(1234));
        assert_eq!(parse_count("1.2M subscribers"), Some(1_200_000));
        assert_eq!(parse_count("15K"), Some(15_000));
        assert_eq!(parse_count("3 videos"), Some(3));
        assert_eq!(parse_count("No views"), Some(0));
        assert_eq!(parse_count("views"), None);
        // "members" must not be read as a millions suffix
        assert_eq!(parse_count("12 members"), Some(12));
    }

    #[test]
    fn test_parse_date() {
        let expected = NaiveDate::from_ymd_opt(2012, 1, 5);
        assert_eq!(parse_date("2012-01-05"), expected);
        assert_eq!(parse_date("2012-01-05T08:00:00-08:00"), expected);
        assert_eq!(parse_date("Published on Jan 5, 2012"), expected);
        assert_eq!(parse_date("Uploaded on Jan 05, 2012"), expected);
        assert_eq!(
            parse_date("Joined Mar 3, 2008"),
            NaiveDate::from_ymd_opt(2008, 3, 3)
        );
        assert_eq!(parse_date("yesterday"), None);
    }

    #[test]
    fn test_parse_iso_duration() {
        assert_eq!(parse_iso_duration("PT4M13S"), Some(253));
        assert_eq!(parse_iso_duration("PT1H2M3S"), Some(3723));
        assert_eq!(parse_iso_duration("PT45S"), Some(45));
        assert_eq!(parse_iso_duration("P1D"), Some(86_400));
        assert_eq!(parse_iso_duration("4:13"), None);
        assert_eq!(parse_iso_duration("PT"), None);
    }

    #[test]
    fn test_split_keywords() {
        assert_eq!(
            split_keywords(r#""stand up" comedy sketch"#),
            vec!["stand up", "comedy", "sketch"]
        );
        assert_eq!(split_keywords("music, live ,"), vec!["music", "live"]);
    }

    #[test]
    fn test_find_channel_id() {
        assert_eq!(
            find_channel_id("/channel/UCuAXFkgsw1L7xaCfnd5JJOw/videos").as_deref(),
            Some("UCuAXFkgsw1L7xaCfnd5JJOw")
        );
        assert_eq!(find_channel_id("/user/someone"), None);
    }
}
