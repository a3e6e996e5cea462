//! Issue a single GET with timeout and optional redirect handling,
//! capturing the final URL, status, headers, and raw body bytes.

use crate::errors::RenderError;
use std::time::Duration;

const BODY_CAP_BYTES: usize = 32 * 1024 * 1024;
const MAX_REDIRECT_HOPS: usize = 10;

#[derive(Debug, Clone)]
pub struct FetchResult {
    pub status_code: u16,
    pub final_url: String,
    pub redirect_url: Option<String>,
    pub headers: reqwest::header::HeaderMap,
    pub body: bytes::Bytes,
}

#[derive(Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new() -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .build()?;
        Ok(Self { client })
    }

    /// `fetch(ctx, url, ua, timeout, followRedirects) -> FetchResult | Error`.
    ///
    /// Redirects are followed manually (one hop per loop iteration) rather
    /// than via reqwest's built-in policy, so that disabling `follow`
    /// returns the first non-2xx/3xx response with `redirectURL` populated
    /// from the initial `Location` header, resolved to an absolute URL
    /// against the redirect response's own final URL.
    pub async fn fetch(
        &self,
        url: &str,
        user_agent: &str,
        timeout: Duration,
        follow_redirects: bool,
    ) -> Result<FetchResult, RenderError> {
        let mut current = url.to_string();
        let mut first_redirect_location = None;
        let mut hops = 0usize;

        loop {
            let response = tokio::time::timeout(
                timeout,
                self.client
                    .get(&current)
                    .header(reqwest::header::USER_AGENT, user_agent)
                    .send(),
            )
            .await
            .map_err(|_| RenderError::RenderTimeout)?
            .map_err(map_transport_error)?;

            let status = response.status();
            let final_url = response.url().to_string();
            let headers = response.headers().clone();

            if status.is_redirection() {
                let location = headers
                    .get(reqwest::header::LOCATION)
                    .and_then(|v| v.to_str().ok())
                    .map(str::to_string);
                if first_redirect_location.is_none() {
                    first_redirect_location = location.as_deref().map(|loc| resolve_redirect(&final_url, loc));
                }

                if follow_redirects && hops < MAX_REDIRECT_HOPS {
                    if let Some(location) = location {
                        current = resolve_redirect(&final_url, &location);
                        hops += 1;
                        continue;
                    }
                }

                let body = read_capped_body(response).await?;
                return Ok(FetchResult {
                    status_code: status.as_u16(),
                    final_url,
                    redirect_url: first_redirect_location,
                    headers,
                    body,
                });
            }

            let body = read_capped_body(response).await?;
            return Ok(FetchResult {
                status_code: status.as_u16(),
                final_url,
                redirect_url: if follow_redirects { None } else { first_redirect_location },
                headers,
                body,
            });
        }
    }
}

async fn read_capped_body(response: reqwest::Response) -> Result<bytes::Bytes, RenderError> {
    use futures_util::StreamExt;
    let mut stream = response.bytes_stream();
    let mut buf = Vec::new();
    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(map_transport_error)?;
        buf.extend_from_slice(&chunk);
        if buf.len() > BODY_CAP_BYTES {
            return Err(RenderError::FetchFailed(format!(
                "response body exceeded {BODY_CAP_BYTES} byte cap"
            )));
        }
    }
    Ok(bytes::Bytes::from(buf))
}

fn resolve_redirect(base: &str, location: &str) -> String {
    url::Url::parse(base)
        .and_then(|b| b.join(location))
        .map(|u| u.to_string())
        .unwrap_or_else(|_| location.to_string())
}

fn map_transport_error(err: reqwest::Error) -> RenderError {
    if err.is_timeout() {
        return RenderError::RenderTimeout;
    }
    if err.is_connect() {
        let message = err.to_string();
        if message.contains("dns") || message.contains("resolve") || message.contains("lookup") {
            return RenderError::DomainNotFound(message);
        }
    }
    RenderError::FetchFailed(err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn fetches_simple_200() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server.mock("GET", "/").with_status(200).with_body("hello").create_async().await;
        let fetcher = HttpFetcher::new().unwrap();
        let result = fetcher.fetch(&server.url(), "test-agent", Duration::from_secs(5), true).await.unwrap();
        assert_eq!(result.status_code, 200);
        assert_eq!(result.body, bytes::Bytes::from_static(b"hello"));
    }

    #[tokio::test]
    async fn non_followed_redirect_reports_location() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/")
            .with_status(302)
            .with_header("Location", "/elsewhere")
            .create_async()
            .await;
        let fetcher = HttpFetcher::new().unwrap();
        let result = fetcher.fetch(&server.url(), "test-agent", Duration::from_secs(5), false).await.unwrap();
        assert_eq!(result.status_code, 302);
        let expected = format!("{}/elsewhere", server.url());
        assert_eq!(result.redirect_url.as_deref(), Some(expected.as_str()));
    }

    #[tokio::test]
    async fn followed_redirect_reaches_final_url() {
        let mut server = mockito::Server::new_async().await;
        let target = format!("{}/final", server.url());
        let _redirect = server
            .mock("GET", "/")
            .with_status(302)
            .with_header("Location", target.as_str())
            .create_async()
            .await;
        let _final = server.mock("GET", "/final").with_status(200).with_body("done").create_async().await;
        let fetcher = HttpFetcher::new().unwrap();
        let result = fetcher.fetch(&server.url(), "test-agent", Duration::from_secs(5), true).await.unwrap();
        assert_eq!(result.status_code, 200);
        assert!(result.final_url.ends_with("/final"));
    }
}
