use log::debug;
use regex::Regex;
use reqwest::header;
use serde_json::Value;

use crate::requests::RequestClient;

pub const USAGE_PAGE_PATH: &str = "/account-setting#usage";
pub const ACTIVITY_PAGE_PATH: &str = "/account-setting#profile";

/// One fetched page: the body as HTML, plus the body re-read as JSON when a
/// usage-looking URL answered `application/json` (the fetch-world stand-in
/// for sniffing XHR responses out of a real browser).
#[derive(Debug, Clone, Default)]
pub struct PageSnapshot {
    pub html: String,
    pub captured_json: Option<Value>,
}

/// Where page snapshots come from. The HTTP loader is the production source;
/// tests hand the service canned snapshots instead.
#[allow(async_fn_in_trait)]
pub trait PageSource {
    async fn load_usage_page(&self) -> Option<PageSnapshot>;
    async fn load_activity_page(&self) -> Option<PageSnapshot>;
}

pub struct HttpPageLoader {
    client: RequestClient,
    usage_url: String,
    activity_url: String,
}

impl HttpPageLoader {
    pub fn new(base_url: &str, cookie: Option<String>) -> anyhow::Result<Self> {
        let client = RequestClient::new(cookie)?;
        let base = base_url.trim_end_matches('/');
        Ok(Self {
            client,
            usage_url: format!("{base}{USAGE_PAGE_PATH}"),
            activity_url: format!("{base}{ACTIVITY_PAGE_PATH}"),
        })
    }

    // Any failure here is an extraction miss, not an error: the caller falls
    // through to its next strategy or serves the stale cache.
    async fn load(&self, url: &str) -> Option<PageSnapshot> {
        let response = match self.client.fetch_url_response(url).await {
            Ok(response) => response,
            Err(e) => {
                debug!("page fetch failed for {url}: {e}");
                return None;
            }
        };
        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string();
        let body = response.text().await.ok()?;

        let captured_json = if looks_like_usage_api(url) && content_type.contains("application/json")
        {
            serde_json::from_str(&body).ok()
        } else {
            None
        };
        Some(PageSnapshot { html: body, captured_json })
    }
}

impl PageSource for HttpPageLoader {
    async fn load_usage_page(&self) -> Option<PageSnapshot> {
        self.load(&self.usage_url).await
    }

    async fn load_activity_page(&self) -> Option<PageSnapshot> {
        self.load(&self.activity_url).await
    }
}

fn looks_like_usage_api(url: &str) -> bool {
    let api_re = Regex::new(r"(?i)usage|quota|plan|account").unwrap();
    api_re.is_match(url)
}
