//! Rate-limited, retried HTTP fetching.
//!
//! Every request to the archive (CDX queries and snapshot replays) goes through
//! `HttpFetcher`, which:
//! - acquires a token from the shared `RateLimiter` before every attempt
//! - retries transient failures (timeouts, 429, 5xx) with exponential backoff
//! - bounds the response body size

mod request;

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use tokio_retry::RetryIf;
use url::Url;

use crate::config::MAX_RESPONSE_BODY_SIZE;
use crate::error_handling::{is_retriable, FetchError, RetryPolicy};
use crate::initialization::RateLimiter;

use request::RequestHeaders;

/// Shared HTTP fetcher.
///
/// Cheap to clone; clones share the client connection pool and the rate limiter.
#[derive(Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
    limiter: Arc<RateLimiter>,
    retry: RetryPolicy,
}

impl HttpFetcher {
    pub fn new(client: reqwest::Client, limiter: Arc<RateLimiter>, retry: RetryPolicy) -> Self {
        Self {
            client,
            limiter,
            retry,
        }
    }

    /// The rate limiter this fetcher draws tokens from.
    pub fn limiter(&self) -> &Arc<RateLimiter> {
        &self.limiter
    }

    /// Fetches `url` and returns the response body as text.
    ///
    /// # Errors
    ///
    /// Returns the last `FetchError` once a non-retriable error occurs or the
    /// retry policy is exhausted.
    pub async fn get_text(&self, url: &Url) -> Result<String, FetchError> {
        self.get_text_retrying(url, is_retriable).await
    }

    /// Like `get_text`, but retries only the errors `should_retry` accepts.
    ///
    /// # Errors
    ///
    /// Returns the last `FetchError` once `should_retry` rejects an error or
    /// the retry policy is exhausted.
    pub async fn get_text_retrying<P>(&self, url: &Url, should_retry: P) -> Result<String, FetchError>
    where
        P: Fn(&FetchError) -> bool,
    {
        let attempts = Arc::new(AtomicU32::new(0));
        let result = RetryIf::start(
            self.retry.strategy(),
            || {
                let attempts = Arc::clone(&attempts);
                async move {
                    let attempt = attempts.fetch_add(1, Ordering::SeqCst) + 1;
                    if attempt > 1 {
                        log::debug!("Retrying {} (attempt {})", url, attempt);
                    }
                    self.limiter.acquire().await;
                    self.get_once(url).await
                }
            },
            |error: &FetchError| {
                let retry = should_retry(error);
                if retry {
                    log::debug!("Transient failure, will retry if attempts remain: {}", error);
                }
                retry
            },
        )
        .await;

        if let Err(ref error) = result {
            log::debug!(
                "Giving up on {} after {} attempt(s): {}",
                url,
                attempts.load(Ordering::SeqCst),
                error
            );
        }
        result
    }

    async fn get_once(&self, url: &Url) -> Result<String, FetchError> {
        let url_str = url.as_str();
        let builder = RequestHeaders::apply_to_request_builder(self.client.get(url.clone()));
        let response = builder
            .send()
            .await
            .map_err(|e| FetchError::from_reqwest(url_str, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url_str.to_string(),
                status: status.as_u16(),
            });
        }

        if let Some(length) = response.content_length() {
            if length > MAX_RESPONSE_BODY_SIZE as u64 {
                return Err(FetchError::BodyTooLarge {
                    url: url_str.to_string(),
                    limit: MAX_RESPONSE_BODY_SIZE,
                });
            }
        }

        let body = response
            .text()
            .await
            .map_err(|e| FetchError::from_reqwest(url_str, e))?;
        if body.len() > MAX_RESPONSE_BODY_SIZE {
            return Err(FetchError::BodyTooLarge {
                url: url_str.to_string(),
                limit: MAX_RESPONSE_BODY_SIZE,
            });
        }
        Ok(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn fetcher(max_attempts: usize) -> HttpFetcher {
        HttpFetcher::new(
            reqwest::Client::new(),
            Arc::new(RateLimiter::unlimited()),
            RetryPolicy::new(max_attempts, Duration::from_millis(2), Duration::from_millis(10)),
        )
    }

    #[tokio::test]
    async fn test_get_text_success() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/page"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>ok</html>"))
            .expect(1)
            .mount(&server)
            .await;

        let url = Url::parse(&format!("{}/page", server.uri())).unwrap();
        let body = fetcher(3).get_text(&url).await.unwrap();
        assert_eq!(body, "<html>ok</html>");
    }

    #[tokio::test]
    async fn test_get_text_retries_server_errors_until_exhausted() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/flaky"))
            .respond_with(ResponseTemplate::new(503))
            .expect(3)
            .mount(&server)
            .await;

        let url = Url::parse(&format!("{}/flaky", server.uri())).unwrap();
        let err = fetcher(3).get_text(&url).await.unwrap_err();
        assert_eq!(err.status(), Some(503));
    }

    #[tokio::test]
    async fn test_get_text_retries_429_then_succeeds() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/limited"))
            .respond_with(ResponseTemplate::new(429))
            .up_to_n_times(1)
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/limited"))
            .respond_with(ResponseTemplate::new(200).set_body_string("fine"))
            .expect(1)
            .mount(&server)
            .await;

        let url = Url::parse(&format!("{}/limited", server.uri())).unwrap();
        assert_eq!(fetcher(3).get_text(&url).await.unwrap(), "fine");
    }

    #[tokio::test]
    async fn test_get_text_does_not_retry_404() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/missing"))
            .respond_with(ResponseTemplate::new(404))
            .expect(1)
            .mount(&server)
            .await;

        let url = Url::parse(&format!("{}/missing", server.uri())).unwrap();
        let err = fetcher(5).get_text(&url).await.unwrap_err();
        assert_eq!(err.status(), Some(404));
    }

    #[tokio::test]
    async fn test_get_text_retrying_honours_predicate() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/flaky"))
            .respond_with(ResponseTemplate::new(503))
            .expect(1)
            .mount(&server)
            .await;

        let url = Url::parse(&format!("{}/flaky", server.uri())).unwrap();
        let err = fetcher(3)
            .get_text_retrying(&url, |_| false)
            .await
            .unwrap_err();
        assert_eq!(err.status(), Some(503));
    }

    #[tokio::test]
    async fn test_get_text_connection_refused_is_connect_error() {
        // Bind and drop a listener so the port is very likely closed.
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let url = Url::parse(&format!("http://127.0.0.1:{port}/")).unwrap();
        let err = fetcher(2).get_text(&url).await.unwrap_err();
        assert!(
            matches!(err, FetchError::Connect { .. } | FetchError::Transport { .. }),
            "unexpected error: {err:?}"
        );
    }
}
