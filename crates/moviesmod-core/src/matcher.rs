//! Search result matching
//!
//! Scores candidate search results against a target title/year/type and
//! selects the best one. Below the acceptance threshold the outcome is
//! "no match", which is recoverable, never an error.

use regex::Regex;

use crate::types::{MediaType, SearchResult};

/// Minimum score for a candidate to be accepted
const SCORE_THRESHOLD: f64 = 30.0;

/// Markers for non-feature content that should never match a title query
const BLOCKED_MARKERS: [&str; 5] = [
    "conversation",
    "behind the scenes",
    "making of",
    "documentary",
    "interview",
];

/// Lower-case, strip punctuation, collapse whitespace
fn normalize(text: &str) -> String {
    let lowered: String = text
        .to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect();
    lowered.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Words of length > 2, from a normalized string
fn significant_words(normalized: &str) -> Vec<&str> {
    normalized.split(' ').filter(|w| w.len() > 2).collect()
}

/// Score one candidate against the target; see module docs for weights
fn score_candidate(
    candidate: &SearchResult,
    normalized_target: &str,
    target_words: &[&str],
    target_year: Option<i32>,
    media_type: MediaType,
) -> f64 {
    let normalized = normalize(&candidate.title);
    let mut score = 0.0;

    if normalized.contains(normalized_target) {
        score += 50.0;
    }

    let candidate_words = significant_words(&normalized);
    if !target_words.is_empty() {
        let common = target_words
            .iter()
            .filter(|w| candidate_words.contains(w))
            .count();
        score += (common as f64 / target_words.len() as f64) * 30.0;
    }

    if let Some(year) = target_year
        && let Ok(re) = Regex::new(r"\((\d{4})\)")
        && let Some(caps) = re.captures(&candidate.title)
        && let Ok(candidate_year) = caps[1].parse::<i32>()
    {
        let diff = (candidate_year - year).abs();
        if diff == 0 {
            score += 20.0;
        } else if diff <= 1 {
            score += 10.0;
        } else if diff > 3 {
            score -= 20.0;
        }
    }

    let extra_words = candidate_words
        .iter()
        .filter(|w| !target_words.contains(w))
        .count();
    if extra_words > 3 {
        score -= 10.0;
    }

    if BLOCKED_MARKERS.iter().any(|m| normalized.contains(m)) {
        score -= 30.0;
    }

    if media_type == MediaType::Tv
        && (normalized.contains("season")
            || normalized.contains("series")
            || normalized.contains("complete"))
    {
        score += 15.0;
    }

    score
}

/// Select the best-scoring search result, or `None` below the threshold
pub fn find_best_match<'a>(
    results: &'a [SearchResult],
    target_title: &str,
    target_year: Option<i32>,
    media_type: MediaType,
) -> Option<&'a SearchResult> {
    let normalized_target = normalize(target_title);
    let target_words = significant_words(&normalized_target);

    let mut best: Option<&SearchResult> = None;
    let mut best_score = 0.0;

    for result in results {
        let score = score_candidate(
            result,
            &normalized_target,
            &target_words,
            target_year,
            media_type,
        );
        tracing::debug!(title = %result.title, score, "match score");
        if score > best_score {
            best_score = score;
            best = Some(result);
        }
    }

    if best_score >= SCORE_THRESHOLD {
        if let Some(result) = best {
            tracing::debug!(title = %result.title, best_score, "best match");
        }
        best
    } else {
        tracing::debug!(best_score, "no match above threshold");
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(title: &str) -> SearchResult {
        SearchResult {
            title: title.to_string(),
            url: format!("https://moviesmod.chat/{}", normalize(title).replace(' ', "-")),
        }
    }

    #[test]
    fn test_normalize_strips_punctuation_and_case() {
        assert_eq!(normalize("Spider-Man: No Way Home!"), "spider man no way home");
    }

    #[test]
    fn test_exact_substring_match_wins() {
        let results = vec![
            result("Download Inception (2010) Dual Audio"),
            result("Download Inception Documentary (2015)"),
        ];
        let best = find_best_match(&results, "Inception", Some(2010), MediaType::Movie);
        assert_eq!(best.unwrap().title, "Download Inception (2010) Dual Audio");
    }

    #[test]
    fn test_no_match_below_threshold() {
        let results = vec![result("Random Documentary")];
        let best = find_best_match(&results, "Inception", Some(2010), MediaType::Movie);
        assert!(best.is_none());
    }

    #[test]
    fn test_empty_results_no_match() {
        let best = find_best_match(&[], "Inception", None, MediaType::Movie);
        assert!(best.is_none());
    }

    #[test]
    fn test_year_mismatch_penalized() {
        let results = vec![
            result("Download Dune (1984) BluRay"),
            result("Download Dune (2021) BluRay"),
        ];
        let best = find_best_match(&results, "Dune", Some(2021), MediaType::Movie);
        assert_eq!(best.unwrap().title, "Download Dune (2021) BluRay");
    }

    #[test]
    fn test_blocked_markers_penalized() {
        let results = vec![
            result("Download The Matrix Making Of Special (1999)"),
            result("Download The Matrix (1999) 1080p"),
        ];
        let best = find_best_match(&results, "The Matrix", Some(1999), MediaType::Movie);
        assert_eq!(best.unwrap().title, "Download The Matrix (1999) 1080p");
    }

    #[test]
    fn test_tv_prefers_season_mentions() {
        let results = vec![
            result("Download Severance Special"),
            result("Download Severance Season 1 Complete"),
        ];
        let best = find_best_match(&results, "Severance", None, MediaType::Tv);
        assert_eq!(best.unwrap().title, "Download Severance Season 1 Complete");
    }

    #[test]
    fn test_word_overlap_scoring() {
        let target = normalize("The Lord of the Rings");
        let words = significant_words(&target);
        let candidate = result("Download The Lord of the Rings Extended");
        let score = score_candidate(&candidate, &target, &words, None, MediaType::Movie);
        // substring (+50) plus full word overlap (+30), minus nothing
        assert!(score >= 80.0);
    }
}
