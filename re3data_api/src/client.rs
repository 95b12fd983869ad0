//! HTTP client for the re3data registry API.

use std::time::Duration;

use url::Url;

use crate::{
    query::{Query, RepositoryQuery},
    types::{parse_listing, RepositoryLink},
    user_agent::get_user_agent,
    Error,
};

/// Default request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

const LISTING_PATH: &str = "/api/beta/repositories";
const DETAIL_PATH: &str = "/api/v1/repository";

/// HTTP client for the re3data registry API.
///
/// Each request builds a fresh `reqwest::Client` with the configured timeout.
/// There is no retry and no caching: every call is exactly one GET.
pub struct Client {
    /// Base URL for the API. Defaults to `https://www.re3data.org`.
    base_api_url: String,
    timeout: Duration,
}

impl Default for Client {
    fn default() -> Self {
        Self::new()
    }
}

impl Client {
    /// Creates a new client pointing at the production registry.
    pub fn new() -> Self {
        Self {
            base_api_url: "https://www.re3data.org".to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Creates a new client with a custom base URL. Used for testing with wiremock.
    pub fn with_base_url(base_url: &str) -> Self {
        Self {
            base_api_url: base_url.trim_end_matches('/').to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Overrides the per-request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_api_url
    }

    fn get_url<Q: Query>(&self, path: &str, query: Option<&Q>) -> Result<Url, Error> {
        let url = Url::parse(format!("{}{}", &self.base_api_url, path).as_str()).map_err(|e| {
            tracing::error!("Invalid URL constructed: {}", e);
            Error::InvalidUrl(format!("{}{}: {}", self.base_api_url, path, e))
        })?;
        Ok(match query {
            Some(query) => query.add_to_url(&url),
            None => url,
        })
    }

    async fn get(&self, url: Url) -> Result<String, Error> {
        let client = reqwest::Client::builder()
            .user_agent(get_user_agent())
            .timeout(self.timeout)
            .build()
            .map_err(|e| {
                tracing::error!("Failed to build HTTP client: {}", e);
                Error::RequestFailed(e.to_string())
            })?;
        tracing::debug!("GET {}", url);
        let resp = client
            .get(url)
            .header("accept", "application/xml, text/xml;q=0.9, */*;q=0.8")
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Failed to get resource: {}", e);
                Error::RequestFailed(e.to_string())
            })?;

        let status = resp.status();
        let body = resp.text().await.map_err(|e| {
            tracing::error!("Failed to read response body: {}", e);
            Error::RequestFailed(e.to_string())
        })?;

        if !status.is_success() {
            let snippet = truncate_body(&body);
            tracing::error!("Request failed with status {}: {}", status, snippet);
            return Err(Error::HttpStatus {
                status: status.as_u16(),
                body: snippet,
            });
        }

        Ok(body)
    }

    /// Fetches the repository listing matching `query` and returns its detail
    /// links in listing order. An empty listing is an empty vector.
    pub async fn list_repositories(
        &self,
        query: &RepositoryQuery,
    ) -> Result<Vec<RepositoryLink>, Error> {
        let url = self.get_url(LISTING_PATH, Some(query))?;
        let body = self.get(url.clone()).await?;
        let links = parse_listing(&body, &url).map_err(|e| {
            let snippet = truncate_body(&body);
            tracing::error!("Failed to parse listing: {} | body: {}", e, snippet);
            Error::MalformedDocument(e)
        })?;
        tracing::info!("Listing returned {} repositories", links.len());
        Ok(links)
    }

    /// Fetches the raw detail document behind `link`.
    pub async fn get_repository(&self, link: &RepositoryLink) -> Result<String, Error> {
        self.get(link.url().clone()).await
    }

    /// Builds the detail link for a repository ID such as `r3d100010134`.
    pub fn repository_link(&self, repository_id: &str) -> Result<RepositoryLink, Error> {
        let url = self.get_url::<RepositoryQuery>(
            format!("{}/{}", DETAIL_PATH, repository_id).as_str(),
            None,
        )?;
        Ok(RepositoryLink::new(url))
    }

    /// Fetches the raw detail document for a repository ID.
    pub async fn get_repository_by_id(&self, repository_id: &str) -> Result<String, Error> {
        let link = self.repository_link(repository_id)?;
        self.get_repository(&link).await
    }
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 2000;
    if body.len() <= MAX {
        body.to_string()
    } else {
        let mut end = MAX;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}...[truncated]", &body[..end])
    }
}
