//! Hop resolution
//!
//! A hop is one network fetch plus site-specific extraction. Candidate
//! links point at redirect/aggregator hosts, each with its own
//! obfuscation scheme; this module classifies a URL by host into a
//! closed [`HopKind`] and runs the matching extraction procedure,
//! recursing until terminal gateway links are reached. Recursion is
//! depth-bounded, and any failure yields an empty branch without
//! touching siblings.

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use futures::future::{BoxFuture, join_all};
use scraper::{Html, Selector};
use url::Url;

use crate::client::HttpClient;
use crate::error::{MoviesModError, Result};
use crate::resolver::sid;
use crate::types::GatewayLink;

/// Closed set of hop behaviors, derived once from a URL's host
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HopKind {
    /// Multi-redirect aggregator listing per-quality intermediate links
    Aggregator,
    /// Intermediate host whose anchors carry quality/size annotations
    QualityIntermediate,
    /// Older intermediate host with gateway anchors in the content area
    LegacyIntermediate,
    /// Redirector hiding the target behind a base64 query parameter
    ObfuscatedRedirect,
    /// The terminal file-hosting gateway itself
    Gateway,
    /// Cookie/form login gate in front of a gateway redirect
    SidGate,
    Unknown,
}

/// Classifies a URL by host identity
pub fn classify(url: &str) -> HopKind {
    let Ok(parsed) = Url::parse(url) else {
        return HopKind::Unknown;
    };
    let Some(host) = parsed.host_str() else {
        return HopKind::Unknown;
    };

    if host.contains("dramadrip.com") {
        HopKind::Aggregator
    } else if host.contains("cinematickit.org") {
        HopKind::QualityIntermediate
    } else if host.contains("episodes.modpro.blog") {
        HopKind::LegacyIntermediate
    } else if host.contains("modrefer.in") {
        HopKind::ObfuscatedRedirect
    } else if host.contains("driveseed.org") {
        HopKind::Gateway
    } else if host.contains("tech.unblockedgames.world") {
        HopKind::SidGate
    } else {
        HopKind::Unknown
    }
}

/// Resolves candidate links down to terminal gateway links
pub struct HopResolver<'a> {
    client: &'a HttpClient,
    max_depth: u8,
}

impl<'a> HopResolver<'a> {
    pub fn new(client: &'a HttpClient, max_depth: u8) -> Self {
        Self { client, max_depth }
    }

    /// Resolve one URL, recursing through further hops as needed
    ///
    /// Never fails: network or parse errors collapse the branch to an
    /// empty list so sibling branches are unaffected.
    pub fn resolve<'b>(&'b self, url: &'b str, referer: &'b str, depth: u8) -> BoxFuture<'b, Vec<GatewayLink>> {
        Box::pin(async move {
            match self.try_resolve(url, referer, depth).await {
                Ok(links) => links,
                Err(e) => {
                    tracing::debug!(url, error = %e, "hop resolution failed");
                    Vec::new()
                }
            }
        })
    }

    async fn try_resolve(&self, url: &str, referer: &str, depth: u8) -> Result<Vec<GatewayLink>> {
        if depth >= self.max_depth {
            tracing::warn!(url, depth, "hop recursion limit reached");
            return Ok(Vec::new());
        }

        match classify(url) {
            HopKind::Aggregator => self.resolve_aggregator(url, referer, depth).await,
            HopKind::QualityIntermediate => self.resolve_quality_intermediate(url, referer).await,
            HopKind::LegacyIntermediate => self.resolve_legacy_intermediate(url, referer).await,
            HopKind::ObfuscatedRedirect => self.resolve_obfuscated(url, referer).await,
            HopKind::Gateway => Ok(vec![GatewayLink {
                server: "Direct".to_string(),
                url: url.to_string(),
                quality_info: None,
            }]),
            HopKind::SidGate => Ok(self.resolve_sid_gate(url).await),
            HopKind::Unknown => {
                tracing::warn!(url, "unknown hop host");
                Ok(Vec::new())
            }
        }
    }

    /// Aggregator: per-quality intermediate anchors, resolved in
    /// parallel and tagged with their quality annotation; strict
    /// fallback to the legacy intermediate when none are present.
    async fn resolve_aggregator(&self, url: &str, referer: &str, depth: u8) -> Result<Vec<GatewayLink>> {
        let html = self.client.get_with_referer(url, referer).await?;

        let quality_anchors: Vec<(String, String)> =
            select_anchors(&html, r#"a[href*="cinematickit.org"]"#)
                .into_iter()
                .filter(|(_, text)| !text.is_empty() && !text.to_lowercase().contains("480p"))
                .collect();

        if !quality_anchors.is_empty() {
            tracing::debug!(count = quality_anchors.len(), "found quality-tier links");
            let branches = quality_anchors.into_iter().map(|(href, text)| async move {
                let links = self.resolve(&href, url, depth + 1).await;
                (links, text)
            });

            let mut all = Vec::new();
            for (links, quality) in join_all(branches).await {
                for mut link in links {
                    link.quality_info = Some(quality.clone());
                    all.push(link);
                }
            }
            return Ok(all);
        }

        if let Some((href, _)) = select_anchors(&html, r#"a[href*="episodes.modpro.blog"]"#)
            .into_iter()
            .next()
        {
            return Ok(self.resolve(&href, url, depth + 1).await);
        }

        tracing::debug!(url, "aggregator page had no known intermediate links");
        Ok(Vec::new())
    }

    /// Quality intermediate: gateway anchors, with a non-recursing
    /// fallback to other known redirect hosts.
    async fn resolve_quality_intermediate(&self, url: &str, referer: &str) -> Result<Vec<GatewayLink>> {
        let html = self.client.get_with_referer(url, referer).await?;

        let links = gateway_anchors(&html, r#"a[href*="driveseed.org"]"#);
        if !links.is_empty() {
            return Ok(links);
        }

        let fallback = select_anchors(&html, r#"a[href*="modrefer.in"], a[href*="dramadrip.com"]"#)
            .into_iter()
            .filter(|(_, text)| !text.is_empty() && !text.to_lowercase().contains("480p"))
            .map(|(href, text)| GatewayLink {
                server: text,
                url: href,
                quality_info: None,
            })
            .collect();
        Ok(fallback)
    }

    /// Legacy intermediate: gateway anchors inside the content area
    async fn resolve_legacy_intermediate(&self, url: &str, referer: &str) -> Result<Vec<GatewayLink>> {
        let html = self.client.get_with_referer(url, referer).await?;
        Ok(gateway_anchors(&html, r#".entry-content a[href*="driveseed.org"]"#))
    }

    /// Obfuscated redirect: the real target is base64-encoded in the
    /// `url` query parameter; anchors live in a timed-reveal block.
    async fn resolve_obfuscated(&self, url: &str, referer: &str) -> Result<Vec<GatewayLink>> {
        let target = decode_obfuscated_target(url)?;
        let html = self.client.get_with_referer(&target, referer).await?;

        let links = select_anchors(&html, ".timed-content-client_show_0_5_0 a")
            .into_iter()
            .map(|(href, text)| GatewayLink {
                server: text,
                url: href,
                quality_info: None,
            })
            .collect();
        Ok(links)
    }

    /// SID gate: run the login handshake; the redirect URL it yields is
    /// consumable by the gateway resolver.
    async fn resolve_sid_gate(&self, url: &str) -> Vec<GatewayLink> {
        match sid::resolve_sid_redirect(self.client, url).await {
            Some(redirect) => vec![GatewayLink {
                server: "SID".to_string(),
                url: redirect,
                quality_info: None,
            }],
            None => Vec::new(),
        }
    }
}

/// Decodes the base64 `url` parameter of an obfuscated-redirect link
pub fn decode_obfuscated_target(url: &str) -> Result<String> {
    let parsed = Url::parse(url).map_err(|_| MoviesModError::InvalidUrl(url.to_string()))?;
    let encoded = parsed
        .query_pairs()
        .find(|(key, _)| key == "url")
        .map(|(_, value)| value.into_owned())
        .ok_or_else(|| MoviesModError::ElementNotFound("url query parameter".to_string()))?;

    let bytes = BASE64
        .decode(encoded.as_bytes())
        .map_err(|e| MoviesModError::Parse(format!("base64 decode failed: {}", e)))?;
    String::from_utf8(bytes).map_err(|e| MoviesModError::Parse(format!("decoded URL not UTF-8: {}", e)))
}

/// All `(href, collapsed text)` pairs matching a selector
fn select_anchors(html: &str, selector_str: &str) -> Vec<(String, String)> {
    let document = Html::parse_document(html);
    let Ok(selector) = Selector::parse(selector_str) else {
        return Vec::new();
    };

    document
        .select(&selector)
        .filter_map(|anchor| {
            let href = anchor.value().attr("href")?;
            let text = collapse_whitespace(&anchor.text().collect::<String>());
            Some((href.to_string(), text))
        })
        .collect()
}

/// Gateway anchors with the batch/480p exclusions applied
fn gateway_anchors(html: &str, selector_str: &str) -> Vec<GatewayLink> {
    select_anchors(html, selector_str)
        .into_iter()
        .filter(|(_, text)| {
            let lower = text.to_lowercase();
            !text.is_empty() && !lower.contains("batch") && !lower.contains("480p")
        })
        .map(|(href, text)| GatewayLink {
            server: text,
            url: href,
            quality_info: None,
        })
        .collect()
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_known_hosts() {
        assert_eq!(classify("https://dramadrip.com/show"), HopKind::Aggregator);
        assert_eq!(classify("https://cinematickit.org/ep"), HopKind::QualityIntermediate);
        assert_eq!(classify("https://episodes.modpro.blog/x"), HopKind::LegacyIntermediate);
        assert_eq!(classify("https://modrefer.in/?url=abc"), HopKind::ObfuscatedRedirect);
        assert_eq!(classify("https://driveseed.org/file/1"), HopKind::Gateway);
        assert_eq!(
            classify("https://tech.unblockedgames.world/?sid=1"),
            HopKind::SidGate
        );
    }

    #[test]
    fn test_classify_unknown() {
        assert_eq!(classify("https://example.com/page"), HopKind::Unknown);
        assert_eq!(classify("not a url"), HopKind::Unknown);
    }

    #[test]
    fn test_decode_obfuscated_target() {
        // "https://links.modpro.blog/abc" base64-encoded
        let url = "https://modrefer.in/?url=aHR0cHM6Ly9saW5rcy5tb2Rwcm8uYmxvZy9hYmM=";
        assert_eq!(
            decode_obfuscated_target(url).unwrap(),
            "https://links.modpro.blog/abc"
        );
    }

    #[test]
    fn test_decode_obfuscated_target_missing_param() {
        let result = decode_obfuscated_target("https://modrefer.in/?other=1");
        assert!(matches!(result, Err(MoviesModError::ElementNotFound(_))));
    }

    #[test]
    fn test_gateway_anchors_exclusions() {
        let html = r#"
        <div class="entry-content">
            <a href="https://driveseed.org/file/1">Episode   1</a>
            <a href="https://driveseed.org/file/2">Batch Zip</a>
            <a href="https://driveseed.org/file/3">480p Episode 3</a>
        </div>
        "#;
        let links = gateway_anchors(html, r#"a[href*="driveseed.org"]"#);
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].server, "Episode 1");
        assert_eq!(links[0].url, "https://driveseed.org/file/1");
    }

    #[test]
    fn test_select_anchors_collapses_whitespace() {
        let html = r#"<a href="https://cinematickit.org/e1">1080p
            x265   (1.9GB)</a>"#;
        let anchors = select_anchors(html, r#"a[href*="cinematickit.org"]"#);
        assert_eq!(anchors[0].1, "1080p x265 (1.9GB)");
    }
}
