//! MoviesMod Resolver Core Library
//!
//! Provides an async API for resolving direct download links for movies
//! and TV episodes hosted behind moviesmod-style multi-hop link chains.
//!
//! # Overview
//!
//! This crate implements the full resolution pipeline:
//! - Title search on the content site plus fuzzy best-match selection
//! - Content page extraction into per-quality/per-season candidate links
//! - Depth-bounded hop resolution across the known redirect hosts,
//!   including the base64 redirector and the SID login gate
//! - Terminal gateway resolution over three protocols (resume cloud,
//!   worker bot, instant) picked by a strict priority order
//! - Stream assembly with display names, sizes, and codec/audio tags
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use moviesmod_core::{MediaType, MoviesModScraper, Result, ScraperConfig, TmdbClient};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let tmdb = Arc::new(TmdbClient::new("tmdb-api-key")?);
//!     let scraper = MoviesModScraper::new(ScraperConfig::default(), tmdb)?;
//!
//!     let streams = scraper
//!         .resolve_streams("27205", MediaType::Movie, None, None)
//!         .await?;
//!
//!     for stream in &streams {
//!         println!("{} [{}]: {}", stream.name, stream.method, stream.url);
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! # Caching
//!
//! Only the intermediate link tree is cached (4 h TTL by default). Final
//! URLs carry short-lived gateway tokens and are re-derived on every
//! call. Set the `DISABLE_CACHE` environment variable to `true` to skip
//! caching entirely.

pub mod assembler;
pub mod cache;
mod client;
mod config;
mod error;
mod matcher;
pub mod parser;
pub mod resolver;
mod scraper;
mod tmdb;
mod types;

// Re-export client types
pub use client::{CookieSession, HttpClient, USER_AGENT};

// Re-export configuration
pub use config::ScraperConfig;

// Re-export error types
pub use error::{MoviesModError, Result};

// Re-export matcher entry point
pub use matcher::find_best_match;

// Re-export parser functions
pub use parser::{extract_download_links, parse_search_results};

// Re-export cache collaborators
pub use cache::{MemoryCache, NoopCache, ResultCache, cache_key};

// Re-export metadata collaborators
pub use tmdb::{MetadataProvider, TmdbClient};

// Re-export main scraper API
pub use scraper::MoviesModScraper;

// Re-export data types
pub use types::{
    CacheEntry, CandidateLink, DownloadOption, GatewayFileInfo, GatewayLink, MediaInfo, MediaType,
    OptionKind, ResolvedQuality, ResolvedStream, SearchResult,
};
