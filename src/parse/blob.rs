//! Embedded page-state objects.
//!
//! Modern watch and channel pages assign JSON objects to script variables
//! (`ytInitialPlayerResponse`, `ytInitialData`); older watch pages carry a
//! `ytplayer.config` object whose `args.player_response` is string-encoded JSON.

use serde_json::Value;

const PLAYER_RESPONSE_MARKER: &str = "ytInitialPlayerResponse";
const PLAYER_CONFIG_MARKER: &str = "ytplayer.config";
const INITIAL_DATA_MARKER: &str = "ytInitialData";

// How far past a marker the opening brace may appear
const MAX_ASSIGNMENT_GAP: usize = 32;

/// Player state found on a watch page.
#[derive(Debug, Clone)]
pub enum PlayerState {
    /// A player response (`videoDetails`, `microformat`, ...)
    Response(Value),
    /// Flat `ytplayer.config.args` from captures that predate player responses
    LegacyArgs(Value),
}

/// Finds the watch page's player state.
///
/// Returns `Ok(None)` when the page has no player state and an error when one
/// is present but not valid JSON.
pub fn find_player_state(body: &str) -> Result<Option<PlayerState>, serde_json::Error> {
    if let Some(raw) = find_assigned_object(body, PLAYER_RESPONSE_MARKER) {
        let value: Value = serde_json::from_str(raw)?;
        return Ok(Some(PlayerState::Response(value)));
    }

    let Some(raw) = find_assigned_object(body, PLAYER_CONFIG_MARKER) else {
        return Ok(None);
    };
    let config: Value = serde_json::from_str(raw)?;
    let args = config.get("args").cloned().unwrap_or(Value::Null);
    match args.get("player_response").and_then(Value::as_str) {
        Some(encoded) => {
            let value: Value = serde_json::from_str(encoded)?;
            Ok(Some(PlayerState::Response(value)))
        }
        None if args.is_object() => Ok(Some(PlayerState::LegacyArgs(args))),
        None => Ok(None),
    }
}

/// Finds the page's `ytInitialData` object.
pub fn find_initial_data(body: &str) -> Result<Option<Value>, serde_json::Error> {
    find_assigned_object(body, INITIAL_DATA_MARKER)
        .map(serde_json::from_str::<Value>)
        .transpose()
}

/// Returns the source text of the object literal assigned to `marker`.
///
/// Handles `var x = {`, `window["x"] = {` and `"x": {` forms. The first
/// occurrence followed by an object literal wins.
pub(crate) fn find_assigned_object<'a>(body: &'a str, marker: &str) -> Option<&'a str> {
    let bytes = body.as_bytes();
    let mut search_from = 0;
    while let Some(offset) = body[search_from..].find(marker) {
        let after_marker = search_from + offset + marker.len();
        search_from = after_marker;

        let mut pos = after_marker;
        let mut assigned = false;
        while pos < bytes.len() && pos - after_marker <= MAX_ASSIGNMENT_GAP {
            match bytes[pos] {
                b'=' | b':' => assigned = true,
                b'"' | b'\'' | b']' | b' ' | b'\t' | b'\r' | b'\n' => {}
                b'{' if assigned => {
                    if let Some(end) = matching_brace(bytes, pos) {
                        return Some(&body[pos..=end]);
                    }
                    break;
                }
                _ => break,
            }
            pos += 1;
        }
    }
    None
}

/// Text of a renderer text node: a plain string, `{"simpleText": ..}` or
/// `{"runs": [{"text": ..}, ..]}`.
pub(crate) fn text_of(value: &Value) -> Option<String> {
    let text = match value {
        Value::String(s) => s.clone(),
        Value::Object(map) => {
            if let Some(simple) = map.get("simpleText").and_then(Value::as_str) {
                simple.to_string()
            } else {
                map.get("runs")?
                    .as_array()?
                    .iter()
                    .filter_map(|run| run.get("text").and_then(Value::as_str))
                    .collect()
            }
        }
        _ => return None,
    };
    let text = text.trim();
    (!text.is_empty()).then(|| text.to_string())
}

/// Depth-first search for the first object member named `key`.
pub(crate) fn find_key<'a>(value: &'a Value, key: &str) -> Option<&'a Value> {
    match value {
        Value::Object(map) => map
            .get(key)
            .or_else(|| map.values().find_map(|child| find_key(child, key))),
        Value::Array(items) => items.iter().find_map(|child| find_key(child, key)),
        _ => None,
    }
}

/// URL of the largest entry in a `{"thumbnails": [..]}` list.
pub(crate) fn largest_thumbnail(value: &Value) -> Option<String> {
    value
        .get("thumbnails")?
        .as_array()?
        .last()?
        .get("url")?
        .as_str()
        .map(|url| {
            if url.starts_with("//") {
                format!("https:{url}")
            } else {
                url.to_string()
            }
        })
}

/// A number stored either as a JSON number or a numeric string.
pub(crate) fn as_count(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Index of the `}` closing the object that opens at `start`.
///
/// Braces inside string literals are ignored.
fn matching_brace(bytes: &[u8], start: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;
    for (i, &b) in bytes.iter().enumerate().skip(start) {
        if in_string {
            if escaped {
                escaped = false;
            } else if b == b'\\' {
                escaped = true;
            } else if b == b'"' {
                in_string = false;
            }
            continue;
        }
        match b {
            b'"' => in_string = true,
            b'{' => depth += 1,
            b'}' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}
