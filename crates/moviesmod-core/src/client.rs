//! HTTP plumbing for the resolver
//!
//! Wraps `reqwest` behind the handful of request shapes the hop chain
//! needs: referer-tagged GETs, form POSTs with per-call headers, and
//! short-lived cookie sessions for the handshake protocols.

use std::time::Duration;

use crate::config::ScraperConfig;
use crate::error::Result;

/// Browser-like user agent sent on every request; several gateway hosts
/// refuse the reqwest default.
pub const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

/// Shared HTTP client used by all stateless fetches
///
/// Carries no cookie store; hops that need cookie continuity (worker-bot
/// token exchange, SID handshake) create a [`CookieSession`] instead.
pub struct HttpClient {
    client: reqwest::Client,
    config: ScraperConfig,
}

impl HttpClient {
    pub fn new(config: ScraperConfig) -> Result<Self> {
        let client = Self::builder(&config).build()?;
        Ok(Self { client, config })
    }

    fn builder(config: &ScraperConfig) -> reqwest::ClientBuilder {
        reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(USER_AGENT)
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
    }

    /// Fetch a page body
    pub async fn get(&self, url: &str) -> Result<String> {
        let response = self.client.get(url).send().await?.error_for_status()?;
        Ok(response.text().await?)
    }

    /// Fetch a page body with a `Referer` header
    ///
    /// The intermediate hosts in the hop chain check the referer and
    /// serve a decoy page without it.
    pub async fn get_with_referer(&self, url: &str, referer: &str) -> Result<String> {
        let response = self
            .client
            .get(url)
            .header(reqwest::header::REFERER, referer)
            .send()
            .await?
            .error_for_status()?;
        Ok(response.text().await?)
    }

    /// POST a form and parse the JSON response
    pub async fn post_form_json(
        &self,
        url: &str,
        form: &[(&str, &str)],
        headers: &[(&str, &str)],
    ) -> Result<serde_json::Value> {
        let mut request = self.client.post(url).form(form);
        for (name, value) in headers {
            request = request.header(*name, *value);
        }
        let response = request.send().await?.error_for_status()?;
        Ok(response.json().await?)
    }

    /// Open a fresh cookie-bearing session
    ///
    /// Each session is exclusively owned by one resolution call and is
    /// never shared across concurrent gateway resolutions.
    pub fn session(&self) -> Result<CookieSession> {
        let client = Self::builder(&self.config).cookie_store(true).build()?;
        Ok(CookieSession { client })
    }
}

/// A cookie-jar-backed client for multi-step handshakes
pub struct CookieSession {
    client: reqwest::Client,
}

impl CookieSession {
    pub async fn get(&self, url: &str) -> Result<String> {
        let response = self.client.get(url).send().await?.error_for_status()?;
        Ok(response.text().await?)
    }

    /// POST a form and return the response body as text
    pub async fn post_form_text(
        &self,
        url: &str,
        form: &[(&str, &str)],
        headers: &[(&str, &str)],
    ) -> Result<String> {
        let response = self.post_form(url, form, headers).await?;
        Ok(response.text().await?)
    }

    /// POST a form and parse the JSON response
    pub async fn post_form_json(
        &self,
        url: &str,
        form: &[(&str, &str)],
        headers: &[(&str, &str)],
    ) -> Result<serde_json::Value> {
        let response = self.post_form(url, form, headers).await?;
        Ok(response.json().await?)
    }

    async fn post_form(
        &self,
        url: &str,
        form: &[(&str, &str)],
        headers: &[(&str, &str)],
    ) -> Result<reqwest::Response> {
        let mut request = self.client.post(url).form(form);
        for (name, value) in headers {
            request = request.header(*name, *value);
        }
        Ok(request.send().await?.error_for_status()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        let client = HttpClient::new(ScraperConfig::default());
        assert!(client.is_ok());
    }

    #[test]
    fn test_session_creation() {
        let client = HttpClient::new(ScraperConfig::default()).unwrap();
        assert!(client.session().is_ok());
    }
}
