//! HTML parsers for the pages the hop chain visits
//!
//! Each module is a set of pure functions over raw markup so every
//! site-specific pattern stays independently testable.

pub mod content;
pub mod gateway;
pub mod search;

pub use content::extract_download_links;
pub use search::parse_search_results;
