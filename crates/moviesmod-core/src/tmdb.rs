//! Metadata collaborator
//!
//! Resolution starts from a TMDB id; the site is searched by canonical
//! title, so the pipeline needs a title/year lookup first. The trait
//! keeps the lookup swappable (tests inject a stub).

use async_trait::async_trait;
use serde::Deserialize;

use crate::error::{MoviesModError, Result};
use crate::types::{MediaInfo, MediaType};

const TMDB_API_URL: &str = "https://api.themoviedb.org/3";

/// Source of canonical title/year metadata for a media id
#[async_trait]
pub trait MetadataProvider: Send + Sync {
    /// Look up title and release year; `None` when the id is unknown
    async fn fetch_title_year(
        &self,
        media_id: &str,
        media_type: MediaType,
    ) -> Result<Option<MediaInfo>>;
}

#[derive(Debug, Deserialize)]
struct TmdbDetails {
    // movies use `title`/`release_date`, series use `name`/`first_air_date`
    title: Option<String>,
    name: Option<String>,
    release_date: Option<String>,
    first_air_date: Option<String>,
}

/// TMDB-backed [`MetadataProvider`]
pub struct TmdbClient {
    client: reqwest::Client,
    api_key: String,
    api_url: String,
}

impl TmdbClient {
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        Self::with_api_url(api_key, TMDB_API_URL)
    }

    /// Point the client at a different API root (used by tests)
    pub fn with_api_url(api_key: impl Into<String>, api_url: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()?;
        Ok(Self {
            client,
            api_key: api_key.into(),
            api_url: api_url.into(),
        })
    }

    fn year_of(date: Option<&str>) -> Option<i32> {
        date.and_then(|d| d.get(0..4)).and_then(|y| y.parse().ok())
    }
}

#[async_trait]
impl MetadataProvider for TmdbClient {
    async fn fetch_title_year(
        &self,
        media_id: &str,
        media_type: MediaType,
    ) -> Result<Option<MediaInfo>> {
        if media_id.trim().is_empty() {
            return Err(MoviesModError::InvalidId(
                "Media ID cannot be empty".to_string(),
            ));
        }

        let url = format!(
            "{}/{}/{}?api_key={}&language=en-US",
            self.api_url,
            media_type.as_str(),
            media_id,
            self.api_key
        );

        let response = self.client.get(&url).send().await?;
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let details: TmdbDetails = response.error_for_status()?.json().await?;

        let (title, date) = match media_type {
            MediaType::Movie => (details.title, details.release_date),
            MediaType::Tv => (details.name, details.first_air_date),
        };

        match title {
            Some(title) => Ok(Some(MediaInfo {
                title,
                year: Self::year_of(date.as_deref()),
            })),
            None => Ok(None),
        }
    }
}
