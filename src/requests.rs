use reqwest::{Client, ClientBuilder, Response, header};

use crate::ratelimit::RateLimiter;

/// HTTP client for the account pages. Carries the session cookie (when the
/// user provided one) and the self-imposed rate-limiting policy.
pub struct RequestClient {
    client: Client,
    rate_limiter: RateLimiter,
    cookie: Option<String>,
}

impl RequestClient {
    pub fn new(cookie: Option<String>) -> anyhow::Result<Self> {
        let client = ClientBuilder::new().build()?;
        let rate_limiter = RateLimiter::new();
        Ok(Self {
            client,
            rate_limiter,
            cookie,
        })
    }

    pub async fn fetch_url_response(&self, url: &str) -> anyhow::Result<Response> {
        // Wait (non-blocking) until we're allowed to make a request according
        // to our self-imposed rate-limiting policy.
        self.rate_limiter.wait_until_ready().await;

        let mut request = self.client.get(url);
        if let Some(cookie) = &self.cookie {
            request = request.header(header::COOKIE, cookie.as_str());
        }
        let response = request.send().await?;
        Ok(response)
    }
}
