//! Pipeline-level tests: a warm cache must re-derive streams from the
//! stored link tree without re-running the crawl stages.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use moviesmod_core::{
    CacheEntry, CandidateLink, GatewayLink, MediaInfo, MediaType, MemoryCache, MetadataProvider,
    MoviesModScraper, ResolvedQuality, Result, ResultCache, ScraperConfig, cache_key,
};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Metadata stub that fails the test if the crawl stages run
struct UnreachableMetadata;

#[async_trait]
impl MetadataProvider for UnreachableMetadata {
    async fn fetch_title_year(
        &self,
        _media_id: &str,
        _media_type: MediaType,
    ) -> Result<Option<MediaInfo>> {
        panic!("metadata lookup ran despite a warm cache");
    }
}

fn cached_entry(gateway_url: &str) -> CacheEntry {
    CacheEntry {
        qualities: vec![ResolvedQuality {
            source: CandidateLink {
                quality: "1080p [2.1GB]".to_string(),
                url: "https://modrefer.in/?url=abc".to_string(),
            },
            links: vec![GatewayLink {
                server: "Direct".to_string(),
                url: gateway_url.to_string(),
                quality_info: None,
            }],
        }],
        media_info: MediaInfo {
            title: "Inception".to_string(),
            year: Some(2010),
        },
    }
}

#[tokio::test]
async fn cache_hit_skips_search_and_extraction() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/gw"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"
            <ul class="list-group">
                <li>Name : Inception.2010.1080p.mkv</li>
                <li>Size : 2.1 GB</li>
            </ul>
            <a href="/zfile/abc">Resume Cloud</a>
            "#,
        ))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/zfile/abc"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"<a href="https://cdn.example.com/final.mkv">Cloud Resume Download</a>"#,
        ))
        .mount(&server)
        .await;

    let cache = Arc::new(MemoryCache::new(Duration::from_secs(60)));
    let key = cache_key("27205", MediaType::Movie, None, None);
    cache
        .put(&key, cached_entry(&format!("{}/gw", server.uri())))
        .await;

    let scraper = MoviesModScraper::with_cache(
        ScraperConfig::default(),
        Arc::new(UnreachableMetadata),
        cache,
    )
    .expect("scraper should build");

    let streams = scraper
        .resolve_streams("27205", MediaType::Movie, None, None)
        .await
        .expect("resolution should succeed");

    assert_eq!(streams.len(), 1);
    assert_eq!(streams[0].url, "https://cdn.example.com/final.mkv");
    assert_eq!(streams[0].method, "Resume Cloud");
    assert_eq!(
        streams[0].file_name.as_deref(),
        Some("Inception.2010.1080p.mkv")
    );
}

#[tokio::test]
async fn cached_empty_tree_short_circuits() {
    let cache = Arc::new(MemoryCache::new(Duration::from_secs(60)));
    let key = cache_key("27205", MediaType::Movie, None, None);
    cache
        .put(
            &key,
            CacheEntry {
                qualities: vec![],
                media_info: MediaInfo {
                    title: "Inception".to_string(),
                    year: Some(2010),
                },
            },
        )
        .await;

    let scraper = MoviesModScraper::with_cache(
        ScraperConfig::default(),
        Arc::new(UnreachableMetadata),
        cache,
    )
    .expect("scraper should build");

    let streams = scraper
        .resolve_streams("27205", MediaType::Movie, None, None)
        .await
        .expect("resolution should succeed");
    assert!(streams.is_empty());
}
