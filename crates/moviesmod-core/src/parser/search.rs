//! Search results parser
//!
//! Parses the content site's search page into title/url pairs.

use scraper::{ElementRef, Html, Selector};

use crate::error::{MoviesModError, Result};
use crate::types::SearchResult;

/// Parses search results HTML and returns the hits in page order
///
/// Each hit is a `.latestPost` card whose anchor carries the post title
/// in its `title` attribute. Cards missing either attribute are skipped.
pub fn parse_search_results(html: &str) -> Result<Vec<SearchResult>> {
    let document = Html::parse_document(html);

    let post_selector = Selector::parse(".latestPost")
        .map_err(|e| MoviesModError::Parse(format!("Invalid selector: {:?}", e)))?;

    let mut results = Vec::new();
    for element in document.select(&post_selector) {
        if let Some(hit) = parse_post_card(&element) {
            results.push(hit);
        }
    }

    Ok(results)
}

fn parse_post_card(element: &ElementRef) -> Option<SearchResult> {
    let anchor_selector = Selector::parse("a").ok()?;
    let anchor = element.select(&anchor_selector).next()?;
    let title = anchor.value().attr("title")?.trim();
    let url = anchor.value().attr("href")?.trim();

    if title.is_empty() || url.is_empty() {
        return None;
    }

    Some(SearchResult {
        title: title.to_string(),
        url: url.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_empty_html() {
        let html = "<html><body></body></html>";
        let results = parse_search_results(html).unwrap();
        assert!(results.is_empty());
    }

    #[test]
    fn test_parse_search_results() {
        let html = r#"
        <html><body>
        <div class="latestPost">
            <a title="Download Inception (2010) Dual Audio" href="https://moviesmod.chat/inception-2010/">
                <img src="thumb.jpg">
            </a>
        </div>
        <div class="latestPost">
            <a title="Download Tenet (2020)" href="https://moviesmod.chat/tenet-2020/"></a>
        </div>
        </body></html>
        "#;

        let results = parse_search_results(html).unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].title, "Download Inception (2010) Dual Audio");
        assert_eq!(results[0].url, "https://moviesmod.chat/inception-2010/");
        assert_eq!(results[1].title, "Download Tenet (2020)");
    }

    #[test]
    fn test_skip_cards_without_title_attribute() {
        let html = r#"
        <html><body>
        <div class="latestPost"><a href="https://moviesmod.chat/untitled/">plain link</a></div>
        <div class="latestPost">
            <a title="Download Dune (2021)" href="https://moviesmod.chat/dune-2021/"></a>
        </div>
        </body></html>
        "#;

        let results = parse_search_results(html).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].title, "Download Dune (2021)");
    }
}
