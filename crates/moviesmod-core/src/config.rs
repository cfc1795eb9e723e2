//! Configuration for the resolver pipeline

/// Configuration for the scraper and its HTTP client
#[derive(Debug, Clone)]
pub struct ScraperConfig {
    /// Base URL of the content site (default: https://moviesmod.chat)
    pub base_url: String,
    /// Per-request timeout in seconds (default: 30)
    pub timeout_secs: u64,
    /// Redirect-follow cap per request (default: 10)
    pub max_redirects: usize,
    /// Recursion limit across hop kinds (default: 6)
    pub max_hop_depth: u8,
    /// TTL for cached link trees in seconds (default: 4 hours)
    pub cache_ttl_secs: u64,
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            base_url: "https://moviesmod.chat".to_string(),
            timeout_secs: 30,
            max_redirects: 10,
            max_hop_depth: 6,
            cache_ttl_secs: 4 * 60 * 60,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = ScraperConfig::default();
        assert_eq!(config.base_url, "https://moviesmod.chat");
        assert_eq!(config.timeout_secs, 30);
        assert_eq!(config.max_redirects, 10);
        assert_eq!(config.max_hop_depth, 6);
        assert_eq!(config.cache_ttl_secs, 14_400);
    }
}
