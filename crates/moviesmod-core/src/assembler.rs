//! Stream assembly
//!
//! Turns the cached intermediate link tree into final streams: filters
//! gateway links down to the requested episode, resolves each gateway
//! page, then derives display names and titles from the quality
//! annotations, the final URL, and the gateway file metadata. Gateway
//! resolution always runs fresh here because its tokens are short-lived.

use std::collections::HashSet;

use futures::future::join_all;
use regex::Regex;

use crate::client::HttpClient;
use crate::parser::content::extract_quality;
use crate::resolver::gateway::{GatewayResolution, GatewayResolver};
use crate::types::{
    CandidateLink, GatewayLink, MediaInfo, MediaType, ResolvedQuality, ResolvedStream,
};

pub struct StreamAssembler<'a> {
    client: &'a HttpClient,
}

impl<'a> StreamAssembler<'a> {
    pub fn new(client: &'a HttpClient) -> Self {
        Self { client }
    }

    /// Resolve every gateway link of the tree and build final streams
    ///
    /// Qualities are processed in parallel; the file-name dedup set is
    /// applied sequentially over the joined results so no two streams
    /// point at the same file.
    pub async fn assemble(
        &self,
        qualities: &[ResolvedQuality],
        media_info: &MediaInfo,
        media_type: MediaType,
        season: Option<u32>,
        episode: Option<u32>,
    ) -> Vec<ResolvedStream> {
        let branches = qualities.iter().map(|quality| async move {
            self.assemble_quality(quality, media_info, media_type, season, episode)
                .await
        });

        let mut seen_files: HashSet<String> = HashSet::new();
        let mut streams = Vec::new();
        for branch in join_all(branches).await {
            for (file_name, stream) in branch {
                if let Some(name) = &file_name {
                    if !seen_files.insert(name.clone()) {
                        tracing::debug!(file = %name, "skipping duplicate file");
                        continue;
                    }
                }
                streams.push(stream);
            }
        }
        streams
    }

    async fn assemble_quality(
        &self,
        quality: &ResolvedQuality,
        media_info: &MediaInfo,
        media_type: MediaType,
        season: Option<u32>,
        episode: Option<u32>,
    ) -> Vec<(Option<String>, ResolvedStream)> {
        let targets: Vec<&GatewayLink> = match (media_type, episode) {
            (MediaType::Tv, Some(episode)) => {
                let matched: Vec<&GatewayLink> = quality
                    .links
                    .iter()
                    .filter(|link| matches_episode(&link.server, episode))
                    .collect();
                if matched.is_empty() {
                    tracing::debug!(
                        quality = %quality.source.quality,
                        episode,
                        "no matching episode link, skipping quality"
                    );
                    return Vec::new();
                }
                matched
            }
            _ => quality.links.iter().collect(),
        };

        let resolver = GatewayResolver::new(self.client);
        let attempts = targets.into_iter().map(|link| {
            let resolver = &resolver;
            async move {
                let resolution = resolver.resolve(&link.url).await?;
                Some((link, resolution))
            }
        });

        join_all(attempts)
            .await
            .into_iter()
            .flatten()
            .map(|(link, resolution)| {
                let stream = build_stream(
                    &quality.source,
                    link,
                    &resolution,
                    media_info,
                    media_type,
                    season,
                    episode,
                );
                (resolution.file_info.file_name, stream)
            })
            .collect()
    }
}

/// Episode links are matched by their server label
fn matches_episode(server: &str, episode: u32) -> bool {
    let lower = server.to_lowercase();
    lower.contains(&format!("episode {}", episode))
        || lower.contains(&format!("ep {}", episode))
        || lower.contains(&format!("e{}", episode))
}

/// Builds one display-ready stream from a resolved gateway link
fn build_stream(
    source: &CandidateLink,
    link: &GatewayLink,
    resolution: &GatewayResolution,
    media_info: &MediaInfo,
    media_type: MediaType,
    season: Option<u32>,
    episode: Option<u32>,
) -> ResolvedStream {
    let final_url = &resolution.url;
    let url_file = url_filename(final_url);

    let mut size = resolution.file_info.size.clone();
    if size.is_none() {
        size = match &link.quality_info {
            Some(info) => capture_between(info, r"\(([^)]+)\)"),
            None => capture_between(&source.quality, r"\[([^\]]+)\]"),
        };
    }

    let mut quality = "Unknown".to_string();
    let mut tech_tags: Vec<String> = Vec::new();

    if let Some(info) = &link.quality_info {
        if let Some(token) = quality_token(info) {
            quality = token;
        }
        let lower = info.to_lowercase();
        if lower.contains("x264") {
            tech_tags.push("x264".to_string());
        }
        if lower.contains("x265") || lower.contains("hevc") {
            tech_tags.push("HEVC".to_string());
        }
        if lower.contains("10bit") {
            tech_tags.push("10-bit".to_string());
        }
        if size.is_none() {
            size = capture_between(info, r"\(([^)]+)\)");
        }
    } else {
        quality = quality_token(&url_file).unwrap_or_else(|| extract_quality(&source.quality));

        let lower = url_file.to_lowercase();
        if lower.contains("x264") {
            tech_tags.push("x264".to_string());
        }
        if lower.contains("x265") || lower.contains("hevc") {
            tech_tags.push("HEVC".to_string());
        }
        if lower.contains("10bit") {
            tech_tags.push("10-bit".to_string());
        }
        if lower.contains("hdr") {
            tech_tags.push("HDR".to_string());
        }
        if let Some(audio) = audio_tag(&url_file) {
            tech_tags.push(audio);
        }
        if lower.contains("msubs") || lower.contains("subs") {
            tech_tags.push("Subs".to_string());
        }
    }

    let name = stream_name(&quality, link.quality_info.as_deref(), &url_file);
    let title = stream_title(
        resolution.file_info.file_name.as_deref(),
        media_info,
        media_type,
        season,
        episode,
        final_url,
        size.as_deref(),
        &tech_tags,
    );

    ResolvedStream {
        name,
        title,
        url: final_url.clone(),
        provider: "MoviesMod".to_string(),
        quality,
        size,
        method: resolution.kind.label().to_string(),
        file_name: resolution.file_info.file_name.clone(),
    }
}

/// `"MoviesMod - {quality}"` plus codec/bit-depth extras
fn stream_name(quality: &str, quality_info: Option<&str>, url_file: &str) -> String {
    let mut name = "MoviesMod".to_string();
    if quality != "Unknown" {
        name.push_str(&format!(" - {}", quality));
    }

    let source = quality_info.unwrap_or(url_file).to_lowercase();
    let mut extras = Vec::new();
    if source.contains("10bit") {
        extras.push("10-bit");
    }
    if source.contains("x265") || source.contains("hevc") {
        extras.push("HEVC");
    } else if source.contains("x264") {
        extras.push("x264");
    }
    if !extras.is_empty() {
        name.push_str(&format!(" | {}", extras.join(" | ")));
    }
    name
}

/// First line from the file name or the canonical title, second line
/// from size and tech tags
#[allow(clippy::too_many_arguments)]
fn stream_title(
    file_name: Option<&str>,
    media_info: &MediaInfo,
    media_type: MediaType,
    season: Option<u32>,
    episode: Option<u32>,
    final_url: &str,
    size: Option<&str>,
    tech_tags: &[String],
) -> String {
    let mut title = if let Some(file_name) = file_name {
        clean_file_name(file_name)
    } else if let (MediaType::Tv, Some(season), Some(episode)) = (media_type, season, episode) {
        let mut line = format!("{} S{:02}E{:02}", media_info.title, season, episode);
        if let Some(episode_title) = episode_title_from_url(final_url) {
            line.push_str(&format!(" • {}", episode_title));
        }
        line
    } else {
        match media_info.year {
            Some(year) => format!("{} ({})", media_info.title, year),
            None => media_info.title.clone(),
        }
    };

    let mut tech_line = Vec::new();
    if let Some(size) = size {
        tech_line.push(size.to_string());
    }
    if !tech_tags.is_empty() {
        tech_line.push(tech_tags.join(" | "));
    }
    if !tech_line.is_empty() {
        title.push_str(&format!("\n{}", tech_line.join(" • ")));
    }
    title
}

/// Strips the extension and turns dots into spaces
fn clean_file_name(file_name: &str) -> String {
    let stem = match file_name.rsplit_once('.') {
        Some((stem, ext)) if !ext.contains('/') => stem,
        _ => file_name,
    };
    stem.replace('.', " ")
}

/// Episode title embedded in a release file name, e.g.
/// `Show.S01E03.Homecoming.1080p.mkv`
///
/// Only a single dot-separated segment after the episode marker is
/// considered; multi-word titles split across dots stay untitled.
fn episode_title_from_url(url: &str) -> Option<String> {
    let file = url_filename(url);
    let re = Regex::new(r"(?i)(?:S\d+)?E\d+\.([^.]+)(?:\.\d+p)?").ok()?;
    let captured = re.captures(&file)?.get(1)?.as_str();
    let cleaned = captured.replace(['.', '_'], " ").trim().to_string();

    let looks_like_resolution = Regex::new(r"(?i)^\d+p$")
        .map(|re| re.is_match(&cleaned))
        .unwrap_or(false);
    (cleaned.len() > 3 && !looks_like_resolution).then_some(cleaned)
}

/// Audio tag derived from language markers in a release file name
fn audio_tag(url_file: &str) -> Option<String> {
    let re = Regex::new(r"(?i)(Hindi|English|Korean|Tamil|Telugu|Spanish|French|Dual|Multi)").ok()?;

    let mut languages: Vec<String> = Vec::new();
    for capture in re.find_iter(url_file) {
        let mut normalized = capture.as_str().to_lowercase();
        if let Some(first) = normalized.get_mut(0..1) {
            first.make_ascii_uppercase();
        }
        if !languages.contains(&normalized) {
            languages.push(normalized);
        }
    }

    if languages.iter().any(|l| l == "Multi") || languages.len() > 2 {
        Some("Multi Audio".to_string())
    } else if languages.iter().any(|l| l == "Dual") || languages.len() == 2 {
        Some("Dual Audio".to_string())
    } else if languages.len() == 1 && languages[0] != "English" {
        Some(languages.remove(0))
    } else {
        None
    }
}

fn quality_token(text: &str) -> Option<String> {
    let re = Regex::new(r"(?i)(480p|720p|1080p|2160p|4k)").ok()?;
    re.find(text).map(|m| m.as_str().to_string())
}

fn capture_between(text: &str, pattern: &str) -> Option<String> {
    let re = Regex::new(pattern).ok()?;
    re.captures(text)?.get(1).map(|m| m.as_str().to_string())
}

fn url_filename(url: &str) -> String {
    url.rsplit('/').next().unwrap_or("").to_string()
}
