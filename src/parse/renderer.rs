//! Optional JavaScript-rendering capability.
//!
//! Some captures only show their metadata after scripts run. A `PageRenderer`
//! returns the rendered HTML of a replay URL; without one, extraction works
//! from the static HTML alone.

use async_trait::async_trait;
use thiserror::Error;
use url::Url;

/// Rendering failures. Never fatal: the static extraction result stands.
#[derive(Error, Debug)]
pub enum RenderError {
    #[error("page rendering is not available")]
    Unavailable,

    #[error("rendering {url} failed: {reason}")]
    Failed { url: String, reason: String },
}

/// Renders a page with scripts executed and returns the resulting HTML.
#[async_trait]
pub trait PageRenderer: Send + Sync {
    /// Whether `render` can be expected to work.
    fn is_available(&self) -> bool;

    async fn render(&self, url: &Url) -> Result<String, RenderError>;
}

/// Renderer used when no rendering backend is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnavailableRenderer;

#[async_trait]
impl PageRenderer for UnavailableRenderer {
    fn is_available(&self) -> bool {
        false
    }

    async fn render(&self, _url: &Url) -> Result<String, RenderError> {
        Err(RenderError::Unavailable)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_unavailable_renderer() {
        let renderer = UnavailableRenderer;
        assert!(!renderer.is_available());
        let url = Url::parse("https://web.archive.org/web/2012/https://example.com").unwrap();
        assert!(matches!(
            renderer.render(&url).await,
            Err(RenderError::Unavailable)
        ));
    }
}
