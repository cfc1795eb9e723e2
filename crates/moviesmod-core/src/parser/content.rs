//! Content page extractor
//!
//! A content page is a sequence of headers, each followed by sibling
//! elements up to the next header: `h3` season headers for series, `h4`
//! quality-tier headers for movies. This module flattens that structure
//! into an ordered list of candidate links, dropping every 480p block
//! before any network hop is attempted.

use regex::Regex;
use scraper::{ElementRef, Html, Selector};

use crate::error::{MoviesModError, Result};
use crate::types::CandidateLink;

/// Extracts per-quality (movie) or per-season (series) candidate links
pub fn extract_download_links(html: &str) -> Result<Vec<CandidateLink>> {
    let document = Html::parse_document(html);

    let content_selector = Selector::parse(".thecontent")
        .map_err(|e| MoviesModError::Parse(format!("Invalid selector: {:?}", e)))?;
    let header_selector = Selector::parse("h3, h4")
        .map_err(|e| MoviesModError::Parse(format!("Invalid selector: {:?}", e)))?;

    let Some(content) = document.select(&content_selector).next() else {
        return Ok(Vec::new());
    };

    let mut links = Vec::new();

    for header in content.select(&header_selector) {
        let header_text = element_text(&header);
        let lower = header_text.to_lowercase();

        let is_season_header = header.value().name() == "h3" && lower.contains("season");
        let is_movie_header = header.value().name() == "h4";
        if !is_season_header && !is_movie_header {
            continue;
        }

        // 480p tiers are dropped wholesale, block included
        if lower.contains("480p") {
            tracing::debug!(header = %header_text, "skipping 480p block");
            continue;
        }

        let block = block_elements(&header);
        if is_season_header {
            collect_season_links(&block, &header_text, &mut links);
        } else {
            collect_movie_link(&block, &header_text, &mut links);
        }
    }

    Ok(links)
}

/// Sibling elements between a header and the next h3/h4
fn block_elements<'a>(header: &ElementRef<'a>) -> Vec<ElementRef<'a>> {
    let mut block = Vec::new();
    for sibling in header.next_siblings() {
        if let Some(element) = ElementRef::wrap(sibling) {
            let name = element.value().name();
            if name == "h3" || name == "h4" {
                break;
            }
            block.push(element);
        }
    }
    block
}

/// Episode/zip anchors under a season header
fn collect_season_links(block: &[ElementRef], header_text: &str, links: &mut Vec<CandidateLink>) {
    let Ok(selector) = Selector::parse("a.maxbutton-episode-links, a.maxbutton-batch-zip") else {
        return;
    };

    for element in block {
        for anchor in element.select(&selector) {
            let button_text = element_text(&anchor);
            let Some(href) = anchor.value().attr("href") else {
                continue;
            };
            let lower = button_text.to_lowercase();
            if lower.contains("batch") || lower.contains("480p") {
                continue;
            }
            links.push(CandidateLink {
                quality: format!("{} - {}", header_text, button_text),
                url: href.to_string(),
            });
        }
    }
}

/// First redirect-gateway anchor under a movie quality header
fn collect_movie_link(block: &[ElementRef], header_text: &str, links: &mut Vec<CandidateLink>) {
    let Ok(selector) = Selector::parse(r#"a[href*="modrefer.in"]"#) else {
        return;
    };

    for element in block {
        if let Some(anchor) = element.select(&selector).next()
            && let Some(href) = anchor.value().attr("href")
        {
            links.push(CandidateLink {
                quality: extract_quality(header_text),
                url: href.to_string(),
            });
            return;
        }
    }
}

fn element_text(element: &ElementRef) -> String {
    element.text().collect::<String>().trim().to_string()
}

/// Extracts a quality token from freeform text
///
/// Prefers the token together with its parenthesis-delimited suffix when
/// one follows, e.g. "1080p HEVC (900MB)".
pub fn extract_quality(text: &str) -> String {
    if let Ok(re) = Regex::new(r"(?i)(480p|720p|1080p|2160p|4k)[^)]*\)")
        && let Some(m) = re.find(text)
    {
        return m.as_str().to_string();
    }

    if let Ok(re) = Regex::new(r"(?i)(480p|720p|1080p|2160p|4k)")
        && let Some(m) = re.find(text)
    {
        return m.as_str().to_string();
    }

    "Unknown".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_quality_plain_token() {
        assert_eq!(extract_quality("1080p x264 [1.9GB]"), "1080p");
        assert_eq!(extract_quality("download in 4k"), "4k");
        assert_eq!(extract_quality("no quality here"), "Unknown");
    }

    #[test]
    fn test_extract_quality_prefers_paren_suffix() {
        assert_eq!(extract_quality("720p 10Bit HEVC (900MB)"), "720p 10Bit HEVC (900MB)");
    }

    #[test]
    fn test_movie_page_extraction() {
        let html = r#"
        <div class="thecontent">
            <h4>Download Inception (2010) 720p [1.2GB]</h4>
            <p><a href="https://modrefer.in/?url=aaa">Download Links</a></p>
            <h4>Download Inception (2010) 1080p (2.5GB)</h4>
            <p><a href="https://modrefer.in/?url=bbb">Download Links</a></p>
        </div>
        "#;

        let links = extract_download_links(html).unwrap();
        assert_eq!(links.len(), 2);
        assert_eq!(links[0].quality, "720p");
        assert_eq!(links[0].url, "https://modrefer.in/?url=aaa");
        assert_eq!(links[1].quality, "1080p (2.5GB)");
    }

    #[test]
    fn test_movie_480p_block_skipped() {
        let html = r#"
        <div class="thecontent">
            <h4>Download Inception (2010) 480p [400MB]</h4>
            <p><a href="https://modrefer.in/?url=skip-me">Download Links</a></p>
            <h4>Download Inception (2010) 1080p [2.5GB]</h4>
            <p><a href="https://modrefer.in/?url=keep-me">Download Links</a></p>
        </div>
        "#;

        let links = extract_download_links(html).unwrap();
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].url, "https://modrefer.in/?url=keep-me");
    }

    #[test]
    fn test_season_blocks_and_480p_header_skip() {
        let html = r#"
        <div class="thecontent">
            <h3>Season 1 480p</h3>
            <p><a class="maxbutton-episode-links" href="https://dramadrip.com/s1-480p">Episode Links</a></p>
            <h3>Season 1 1080p</h3>
            <p><a class="maxbutton-episode-links" href="https://dramadrip.com/s1-1080p">Episode Links</a></p>
        </div>
        "#;

        let links = extract_download_links(html).unwrap();
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].quality, "Season 1 1080p - Episode Links");
        assert_eq!(links[0].url, "https://dramadrip.com/s1-1080p");
    }

    #[test]
    fn test_season_batch_buttons_excluded() {
        let html = r#"
        <div class="thecontent">
            <h3>Season 2 720p</h3>
            <p>
                <a class="maxbutton-episode-links" href="https://dramadrip.com/s2-episodes">Episode Links</a>
                <a class="maxbutton-batch-zip" href="https://dramadrip.com/s2-batch">Batch/Zip File</a>
            </p>
        </div>
        "#;

        let links = extract_download_links(html).unwrap();
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].url, "https://dramadrip.com/s2-episodes");
    }

    #[test]
    fn test_h3_without_season_ignored() {
        let html = r#"
        <div class="thecontent">
            <h3>About this release</h3>
            <p><a class="maxbutton-episode-links" href="https://dramadrip.com/x">Episode Links</a></p>
        </div>
        "#;

        let links = extract_download_links(html).unwrap();
        assert!(links.is_empty());
    }

    #[test]
    fn test_no_content_area() {
        let links = extract_download_links("<html><body><p>empty</p></body></html>").unwrap();
        assert!(links.is_empty());
    }
}
