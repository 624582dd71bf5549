//! Recovery targets.

use serde::Serialize;

/// What kind of entity a recovery is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Video,
    Channel,
}

impl EntityKind {
    /// Canonical page URL whose captures hold the entity's metadata.
    pub fn target_url(&self, id: &str) -> String {
        match self {
            EntityKind::Video => format!("https://www.youtube.com/watch?v={id}"),
            EntityKind::Channel => format!("https://www.youtube.com/channel/{id}"),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Video => "video",
            EntityKind::Channel => "channel",
        }
    }
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for EntityKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "video" | "v" => Ok(EntityKind::Video),
            "channel" | "c" => Ok(EntityKind::Channel),
            other => Err(format!("unknown entity kind '{other}'")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_target_urls() {
        assert_eq!(
            EntityKind::Video.target_url("dQw4w9WgXcQ"),
            "https://www.youtube.com/watch?v=dQw4w9WgXcQ"
        );
        assert_eq!(
            EntityKind::Channel.target_url("UCuAXFkgsw1L7xaCfnd5JJOw"),
            "https://www.youtube.com/channel/UCuAXFkgsw1L7xaCfnd5JJOw"
        );
    }

    #[test]
    fn test_from_str() {
        assert_eq!("video".parse::<EntityKind>(), Ok(EntityKind::Video));
        assert_eq!(" Channel ".parse::<EntityKind>(), Ok(EntityKind::Channel));
        assert!("playlist".parse::<EntityKind>().is_err());
    }
}
