//! Top-level resolution pipeline
//!
//! `MoviesModScraper::resolve_streams` ties the stages together: cache
//! lookup, metadata fetch, site search, best-match selection, content
//! page extraction, parallel hop resolution, cache write, and stream
//! assembly. A cache hit re-runs only the assembly stage over the stored
//! link tree; the crawl stages never repeat within the TTL.

use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;

use crate::assembler::StreamAssembler;
use crate::cache::{DISABLE_CACHE_ENV, MemoryCache, NoopCache, ResultCache, cache_key};
use crate::client::HttpClient;
use crate::config::ScraperConfig;
use crate::error::Result;
use crate::matcher::find_best_match;
use crate::parser::{extract_download_links, parse_search_results};
use crate::resolver::hop::HopResolver;
use crate::tmdb::MetadataProvider;
use crate::types::{
    CacheEntry, CandidateLink, MediaInfo, MediaType, ResolvedQuality, ResolvedStream,
};

pub struct MoviesModScraper {
    client: HttpClient,
    config: ScraperConfig,
    cache: Arc<dyn ResultCache>,
    metadata: Arc<dyn MetadataProvider>,
}

impl MoviesModScraper {
    /// Build a scraper with the default cache backend
    ///
    /// Setting the `DISABLE_CACHE` environment variable to "true" swaps
    /// the in-memory TTL cache for a no-op one.
    pub fn new(config: ScraperConfig, metadata: Arc<dyn MetadataProvider>) -> Result<Self> {
        let cache: Arc<dyn ResultCache> = if cache_disabled() {
            tracing::debug!("result cache disabled via environment");
            Arc::new(NoopCache)
        } else {
            Arc::new(MemoryCache::new(Duration::from_secs(config.cache_ttl_secs)))
        };
        Self::with_cache(config, metadata, cache)
    }

    pub fn with_cache(
        config: ScraperConfig,
        metadata: Arc<dyn MetadataProvider>,
        cache: Arc<dyn ResultCache>,
    ) -> Result<Self> {
        let client = HttpClient::new(config.clone())?;
        Ok(Self {
            client,
            config,
            cache,
            metadata,
        })
    }

    /// Resolve every available stream for one title
    ///
    /// Failures inside the pipeline are logged and surfaced as an empty
    /// list; the call itself only errs on unusable input.
    pub async fn resolve_streams(
        &self,
        media_id: &str,
        media_type: MediaType,
        season: Option<u32>,
        episode: Option<u32>,
    ) -> Result<Vec<ResolvedStream>> {
        let key = cache_key(media_id, media_type, season, episode);

        let entry = match self.cache.get(&key).await {
            Some(entry) => entry,
            None => match self.build_link_tree(media_id, media_type, season).await {
                Ok(entry) => {
                    self.cache.put(&key, entry.clone()).await;
                    entry
                }
                Err(e) => {
                    tracing::error!(media_id, error = %e, "stream resolution failed");
                    return Ok(Vec::new());
                }
            },
        };

        if entry.qualities.is_empty() {
            return Ok(Vec::new());
        }

        let assembler = StreamAssembler::new(&self.client);
        let streams = assembler
            .assemble(
                &entry.qualities,
                &entry.media_info,
                media_type,
                season,
                episode,
            )
            .await;
        tracing::debug!(media_id, count = streams.len(), "resolution complete");
        Ok(streams)
    }

    /// Crawl stages: metadata, search, match, extract, hop-resolve
    ///
    /// Returns an entry even when a stage comes up empty, so known
    /// misses are cached alongside successes.
    async fn build_link_tree(
        &self,
        media_id: &str,
        media_type: MediaType,
        season: Option<u32>,
    ) -> Result<CacheEntry> {
        let Some(media_info) = self.metadata.fetch_title_year(media_id, media_type).await? else {
            tracing::warn!(media_id, "no metadata for id");
            return Ok(empty_entry(MediaInfo::default()));
        };
        tracing::debug!(title = %media_info.title, year = ?media_info.year, "resolved metadata");

        let results = self.search(&media_info.title).await?;
        if results.is_empty() {
            tracing::debug!(title = %media_info.title, "no search results");
            return Ok(empty_entry(media_info));
        }

        let Some(best) = find_best_match(&results, &media_info.title, media_info.year, media_type)
        else {
            tracing::debug!(title = %media_info.title, "no acceptable search match");
            return Ok(empty_entry(media_info));
        };
        tracing::debug!(matched = %best.title, "selected content page");

        let page = self.client.get(&best.url).await?;
        let candidates = extract_download_links(&page)?;
        let relevant = filter_candidates(candidates, media_type, season);
        if relevant.is_empty() {
            tracing::debug!("no candidate links after filtering");
            return Ok(empty_entry(media_info));
        }

        // Hop chains for each candidate run in parallel; a failed chain
        // contributes nothing without affecting the others.
        let resolver = HopResolver::new(&self.client, self.config.max_hop_depth);
        let referer = best.url.clone();
        let branches = relevant.into_iter().map(|candidate| {
            let resolver = &resolver;
            let referer = referer.as_str();
            async move {
                let links = resolver.resolve(&candidate.url, referer, 0).await;
                if links.is_empty() {
                    tracing::debug!(quality = %candidate.quality, "candidate yielded no gateway links");
                    return None;
                }
                Some(ResolvedQuality {
                    source: candidate,
                    links,
                })
            }
        });
        let qualities: Vec<ResolvedQuality> =
            join_all(branches).await.into_iter().flatten().collect();

        Ok(CacheEntry {
            qualities,
            media_info,
        })
    }

    async fn search(&self, title: &str) -> Result<Vec<crate::types::SearchResult>> {
        let url = format!(
            "{}/?s={}",
            self.config.base_url,
            urlencoding::encode(title)
        );
        let html = self.client.get(&url).await?;
        parse_search_results(&html)
    }
}

fn cache_disabled() -> bool {
    std::env::var(DISABLE_CACHE_ENV)
        .map(|value| value.eq_ignore_ascii_case("true"))
        .unwrap_or(false)
}

fn empty_entry(media_info: MediaInfo) -> CacheEntry {
    CacheEntry {
        qualities: Vec::new(),
        media_info,
    }
}

/// Drops 480p tiers outright and, for series, anything outside the
/// requested season
fn filter_candidates(
    candidates: Vec<CandidateLink>,
    media_type: MediaType,
    season: Option<u32>,
) -> Vec<CandidateLink> {
    let non_480p = candidates
        .into_iter()
        .filter(|c| !c.quality.to_lowercase().contains("480p"));

    match (media_type, season) {
        (MediaType::Tv, Some(season)) => non_480p
            .filter(|c| {
                let lower = c.quality.to_lowercase();
                lower.contains(&format!("season {}", season)) || lower.contains(&format!("s{}", season))
            })
            .collect(),
        _ => non_480p.collect(),
    }
}
