//! Core data types for the moviesmod resolver
//!
//! Everything that crosses a stage boundary lives here, including the
//! intermediate link tree persisted by the result cache.

use serde::{Deserialize, Serialize};

/// Kind of media being resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    Movie,
    Tv,
}

impl MediaType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaType::Movie => "movie",
            MediaType::Tv => "tv",
        }
    }
}

/// One hit from a title search on the content site
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResult {
    pub title: String,
    pub url: String,
}

/// One quality tier (movie) or season/episode-group (series) offer on a
/// content page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateLink {
    /// Quality label, e.g. "1080p" or "Season 2 1080p - Episode Links"
    pub quality: String,
    pub url: String,
}

/// A terminal, hop-resolved link to a file-hosting gateway page
///
/// Persisted inside the cached link tree; gateway resolution runs fresh
/// on every call because gateway-issued tokens expire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatewayLink {
    /// Server/button label as shown on the intermediate page
    pub server: String,
    pub url: String,
    /// Quality annotation carried down from the aggregator hop, if any
    pub quality_info: Option<String>,
}

/// Resolution method offered on a gateway page
///
/// The variant order is the resolution-priority order: when several
/// options resolve successfully for the same gateway link, the
/// lowest-priority-number success wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OptionKind {
    Resume,
    Worker,
    Instant,
}

impl OptionKind {
    /// Strict total priority order; lower wins
    pub fn priority(&self) -> u8 {
        match self {
            OptionKind::Resume => 1,
            OptionKind::Worker => 2,
            OptionKind::Instant => 3,
        }
    }

    /// User-facing method label
    pub fn label(&self) -> &'static str {
        match self {
            OptionKind::Resume => "Resume Cloud",
            OptionKind::Worker => "Resume Worker Bot",
            OptionKind::Instant => "Instant Download",
        }
    }
}

/// One resolution method offered on a gateway page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadOption {
    pub title: String,
    pub kind: OptionKind,
    pub url: String,
}

impl DownloadOption {
    pub fn priority(&self) -> u8 {
        self.kind.priority()
    }
}

/// File metadata parsed off a gateway page
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatewayFileInfo {
    pub size: Option<String>,
    pub file_name: Option<String>,
}

/// Canonical title/year pair from the metadata collaborator
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaInfo {
    pub title: String,
    pub year: Option<i32>,
}

/// One candidate link with its hop-resolved gateway links
///
/// An edge bundle of the intermediate link tree: the original content-page
/// offer plus every gateway page the hop chain reached from it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedQuality {
    pub source: CandidateLink,
    pub links: Vec<GatewayLink>,
}

/// Cached value for one (media, type, season, episode) key
///
/// Only the intermediate tree is cached; final URLs are re-derived on
/// every call since gateway tokens are short-lived. Empty trees are
/// cached too, to avoid re-crawling known misses within the TTL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub qualities: Vec<ResolvedQuality>,
    pub media_info: MediaInfo,
}

/// One final consumable stream; never mutated after creation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedStream {
    /// Short display name: provider + quality + codec/bit-depth tags
    pub name: String,
    /// Multi-line descriptive title with a tech-details line
    pub title: String,
    /// Direct download URL
    pub url: String,
    pub provider: String,
    pub quality: String,
    pub size: Option<String>,
    /// Resolution method label, e.g. "Resume Cloud"
    pub method: String,
    pub file_name: Option<String>,
}
