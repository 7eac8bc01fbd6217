use anyhow::{anyhow, Context, Result};
use reqwest::StatusCode;
use reqwest::blocking::{Client, Response};
use std::time::Duration;
use tracing::debug;

use super::models::{CardList, ScryfallCard};
use super::strategy::{CardSource, NamedMatch, SearchRequest};
use crate::config::ScryfallConfig;

/// Blocking HTTP client for the Scryfall REST API.
pub struct ScryfallClient {
    http: Client,
    base_url: String,
}

impl ScryfallClient {
    pub fn new(config: &ScryfallConfig) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(config.user_agent.clone())
            .build()
            .context("failed to build HTTP client")?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn get(&self, path: &str, query: &[(&str, &str)]) -> Result<Response> {
        let url = format!("{}{}", self.base_url, path);
        debug!("GET {} {:?}", url, query);
        self.http
            .get(&url)
            .header("Accept", "application/json")
            .query(query)
            .send()
            .with_context(|| format!("request to {} failed", url))
    }
}

/// 404 is Scryfall's "no such card" (`Ok(true)`); any other non-success
/// is a failure.
fn is_not_found(status: StatusCode) -> Result<bool> {
    if status == StatusCode::NOT_FOUND {
        return Ok(true);
    }
    if !status.is_success() {
        return Err(anyhow!("Scryfall returned HTTP {}", status));
    }
    Ok(false)
}

/// Query pairs of a `cards/search` request, newest printing first.
fn search_params(request: &SearchRequest) -> [(&'static str, &str); 6] {
    let flag = if request.permissive { "true" } else { "false" };
    [
        ("q", request.query.as_str()),
        ("unique", request.unique.param()),
        ("order", "released"),
        ("dir", "desc"),
        ("include_extras", flag),
        ("include_variations", flag),
    ]
}

impl CardSource for ScryfallClient {
    fn named(&self, mode: NamedMatch, name: &str) -> Result<Option<ScryfallCard>> {
        let response = self.get("/cards/named", &[(mode.param(), name)])?;
        if is_not_found(response.status())? {
            return Ok(None);
        }
        let card = response
            .json::<ScryfallCard>()
            .context("failed to parse card")?;
        Ok(Some(card))
    }

    fn search(&self, request: &SearchRequest) -> Result<Vec<ScryfallCard>> {
        let response = self.get("/cards/search", &search_params(request))?;
        if is_not_found(response.status())? {
            return Ok(Vec::new());
        }
        let list = response
            .json::<CardList>()
            .context("failed to parse search results")?;
        if list.has_more {
            debug!(
                "Search '{}' has more pages ({:?}), using the first",
                request.query, list.next_page
            );
        }
        Ok(list.data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_classification() {
        assert!(!is_not_found(StatusCode::OK).unwrap());
        assert!(is_not_found(StatusCode::NOT_FOUND).unwrap());
        assert!(is_not_found(StatusCode::BAD_REQUEST).is_err());
        assert!(is_not_found(StatusCode::TOO_MANY_REQUESTS).is_err());
        assert!(is_not_found(StatusCode::INTERNAL_SERVER_ERROR).is_err());
        assert!(is_not_found(StatusCode::SERVICE_UNAVAILABLE).is_err());
    }

    #[test]
    fn test_strict_search_params() {
        let request = SearchRequest::new("name:\"Bolt\"");
        assert_eq!(
            search_params(&request),
            [
                ("q", "name:\"Bolt\""),
                ("unique", "cards"),
                ("order", "released"),
                ("dir", "desc"),
                ("include_extras", "false"),
                ("include_variations", "false"),
            ]
        );
    }

    #[test]
    fn test_permissive_search_params() {
        let request = SearchRequest::new("Bolt").prints().permissive();
        assert_eq!(
            search_params(&request),
            [
                ("q", "Bolt"),
                ("unique", "prints"),
                ("order", "released"),
                ("dir", "desc"),
                ("include_extras", "true"),
                ("include_variations", "true"),
            ]
        );
    }

    #[test]
    fn test_base_url_trailing_slash_is_trimmed() {
        let config = ScryfallConfig {
            base_url: "https://example.test/".to_string(),
            ..Default::default()
        };
        let client = ScryfallClient::new(&config).unwrap();
        assert_eq!(client.base_url, "https://example.test");
    }
}
