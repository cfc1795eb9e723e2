//! Gateway resolution
//!
//! Given a terminal gateway page, extracts file metadata and the offered
//! download options, then resolves every option in parallel with its
//! type-specific protocol. The winner is picked by the strict priority
//! order resume > worker > instant, never by completion order.

use futures::future::join_all;
use url::Url;

use crate::client::HttpClient;
use crate::parser::gateway::{
    extract_redirect_path, extract_worker_script, extract_worker_token_id,
    extract_worker_token_id_fallback, find_resume_final_link, parse_download_options,
    parse_file_info,
};
use crate::types::{DownloadOption, GatewayFileInfo, OptionKind};

/// Referer expected by the gateway host on the landing fetch
const GATEWAY_REFERER: &str = "https://links.modpro.blog/";

/// Outcome of resolving one gateway link
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayResolution {
    pub file_info: GatewayFileInfo,
    /// Final direct download URL
    pub url: String,
    /// Method that produced the URL
    pub kind: OptionKind,
}

pub struct GatewayResolver<'a> {
    client: &'a HttpClient,
}

impl<'a> GatewayResolver<'a> {
    pub fn new(client: &'a HttpClient) -> Self {
        Self { client }
    }

    /// Resolve a gateway page to a direct URL, or `None` when no option
    /// succeeds; failures never propagate past this link.
    pub async fn resolve(&self, gateway_url: &str) -> Option<GatewayResolution> {
        match self.try_resolve(gateway_url).await {
            Ok(resolution) => resolution,
            Err(e) => {
                tracing::debug!(gateway_url, error = %e, "gateway resolution failed");
                None
            }
        }
    }

    async fn try_resolve(&self, gateway_url: &str) -> crate::error::Result<Option<GatewayResolution>> {
        let Some(origin) = origin_of(gateway_url) else {
            tracing::debug!(gateway_url, "gateway URL has no origin");
            return Ok(None);
        };

        let landing = self.client.get_with_referer(gateway_url, GATEWAY_REFERER).await?;

        // Some landings bounce through a client-side redirect to the
        // real file page; others serve it directly.
        let (file_page, file_page_url) = match extract_redirect_path(&landing) {
            Some(path) => {
                let target = format!("{}{}", origin, path);
                tracing::debug!(target, "following gateway redirect script");
                let page = self.client.get_with_referer(&target, gateway_url).await?;
                (page, target)
            }
            None => (landing, gateway_url.to_string()),
        };

        let file_info = parse_file_info(&file_page);
        let options = parse_download_options(&file_page, &origin);
        if options.is_empty() {
            tracing::debug!(url = %file_page_url, "no download options on gateway page");
            return Ok(None);
        }

        // All options race in parallel; the pick is by priority order.
        let origin = origin.as_str();
        let attempts = options.iter().map(|option| async move {
            let url = self.resolve_option(option, origin).await?;
            Some((option.kind, url))
        });

        let mut successes: Vec<(OptionKind, String)> =
            join_all(attempts).await.into_iter().flatten().collect();
        successes.sort_by_key(|(kind, _)| kind.priority());

        Ok(successes.into_iter().next().map(|(kind, url)| {
            tracing::debug!(method = kind.label(), "gateway link resolved");
            GatewayResolution {
                file_info: file_info.clone(),
                url,
                kind,
            }
        }))
    }

    async fn resolve_option(&self, option: &DownloadOption, gateway_origin: &str) -> Option<String> {
        let result = match option.kind {
            OptionKind::Resume => self.resolve_resume(&option.url, gateway_origin).await,
            OptionKind::Worker => self.resolve_worker(&option.url).await,
            OptionKind::Instant => self.resolve_instant(&option.url).await,
        };
        if result.is_none() {
            tracing::debug!(kind = option.kind.label(), url = %option.url, "option failed to resolve");
        }
        result
    }

    /// Resume Cloud: one more page, then the labeled download anchor
    async fn resolve_resume(&self, option_url: &str, gateway_origin: &str) -> Option<String> {
        let referer = format!("{}/", gateway_origin);
        let page = self
            .client
            .get_with_referer(option_url, &referer)
            .await
            .ok()?;
        find_resume_final_link(&page)
    }

    /// Worker bot: token/id scraped from the page script, exchanged via
    /// a cookie-continuous POST on the same session as the GET
    async fn resolve_worker(&self, option_url: &str) -> Option<String> {
        let session = self.client.session().ok()?;
        let page = session.get(option_url).await.ok()?;

        let script = extract_worker_script(&page)?;
        let (token, id) = extract_worker_token_id(&script)
            .or_else(|| extract_worker_token_id_fallback(&script))?;

        let origin = origin_of(option_url)?;
        let api_url = format!("{}/download?id={}", origin, id);

        let response = session
            .post_form_json(
                &api_url,
                &[("token", token.as_str())],
                &[
                    ("x-requested-with", "XMLHttpRequest"),
                    ("Referer", option_url),
                ],
            )
            .await
            .ok()?;
        json_url(&response)
    }

    /// Instant: the option URL's `url` parameter posted as `keys`
    async fn resolve_instant(&self, option_url: &str) -> Option<String> {
        let parsed = Url::parse(option_url).ok()?;
        let keys = parsed
            .query_pairs()
            .find(|(key, _)| key == "url")
            .map(|(_, value)| value.into_owned())?;

        let api_url = format!("{}/api", origin_of(option_url)?);
        let hostname = parsed.host_str()?.to_string();

        let response = self
            .client
            .post_form_json(
                &api_url,
                &[("keys", keys.as_str())],
                &[("x-token", hostname.as_str())],
            )
            .await
            .ok()?;
        json_url(&response)
    }
}

/// `scheme://host[:port]` of a URL
fn origin_of(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    let origin = parsed.origin().ascii_serialization();
    (origin != "null").then_some(origin)
}

fn json_url(response: &serde_json::Value) -> Option<String> {
    response
        .get("url")
        .and_then(|url| url.as_str())
        .map(|url| url.to_string())
}
