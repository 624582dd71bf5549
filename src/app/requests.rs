//! Request file parsing.

use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use log::warn;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};

use crate::models::EntityKind;
use crate::recovery::RecoveryRequest;

/// Longest entity id accepted from a request file.
const MAX_ENTITY_ID_LENGTH: usize = 64;

/// Parses one request line.
///
/// Accepted form: `video <id>` or `channel <id>`, optionally followed by the
/// RFC 3339 time the entity was last recovered. Blank lines and lines starting
/// with `#` are ignored. Malformed lines log a warning and return `None`.
pub fn parse_request_line(line: &str) -> Option<RecoveryRequest> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return None;
    }

    let mut fields = line.split_whitespace();
    let (Some(kind), Some(entity_id)) = (fields.next(), fields.next()) else {
        warn!("Skipping request without an entity id: {line}");
        return None;
    };
    let kind = match kind.parse::<EntityKind>() {
        Ok(kind) => kind,
        Err(e) => {
            warn!("Skipping request: {e}: {line}");
            return None;
        }
    };
    if !is_valid_entity_id(entity_id) {
        warn!(
            "Skipping request with invalid {} id: {}",
            kind,
            entity_id.chars().take(50).collect::<String>()
        );
        return None;
    }

    let last_recovered_at = match fields.next() {
        None => None,
        Some(raw) => match DateTime::parse_from_rfc3339(raw) {
            Ok(parsed) => Some(parsed.with_timezone(&Utc)),
            Err(e) => {
                warn!("Skipping request with invalid timestamp '{raw}' ({e}): {line}");
                return None;
            }
        },
    };
    if fields.next().is_some() {
        warn!("Skipping request with trailing fields: {line}");
        return None;
    }

    Some(RecoveryRequest {
        entity_id: entity_id.to_string(),
        kind,
        last_recovered_at,
    })
}

fn is_valid_entity_id(id: &str) -> bool {
    !id.is_empty()
        && id.len() <= MAX_ENTITY_ID_LENGTH
        && id
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
}

/// Reads every valid request from a reader.
pub async fn parse_requests<R: AsyncBufRead + Unpin>(reader: R) -> Result<Vec<RecoveryRequest>> {
    let mut lines = reader.lines();
    let mut requests = Vec::new();
    while let Some(line) = lines
        .next_line()
        .await
        .context("Failed to read request line")?
    {
        if let Some(request) = parse_request_line(&line) {
            requests.push(request);
        }
    }
    Ok(requests)
}

/// Reads requests from `path`, or from stdin when `path` is `-`.
///
/// # Errors
///
/// Returns an error if the file cannot be opened or read.
pub async fn read_requests(path: &Path) -> Result<Vec<RecoveryRequest>> {
    if path.as_os_str() == "-" {
        log::info!("Reading requests from stdin");
        return parse_requests(BufReader::new(tokio::io::stdin())).await;
    }
    let file = tokio::fs::File::open(path)
        .await
        .with_context(|| format!("Failed to open request file {}", path.display()))?;
    parse_requests(BufReader::new(file)).await
}
