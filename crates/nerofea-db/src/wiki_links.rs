//! Wiki-link token extraction from note content.
//!
//! Note content may embed `[[Title]]` markers denoting an intended reference
//! to another note by title. Extraction is a plain regex scan: no markdown
//! awareness, no escaping rules. Tokens spanning lines are not matched.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;

static WIKI_LINK_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[\[([^\[\]\n]*?)\]\]").expect("wiki-link pattern must compile"));

/// Extract link-target titles from note content.
///
/// Titles are trimmed and deduplicated, preserving first-occurrence order.
/// Empty tokens (`[[]]` or `[[   ]]`) are skipped.
///
/// # Examples
///
/// ```
/// use nerofea_db::extract_wiki_link_titles;
///
/// let content = "<p>See [[Binary Search]] and [[Heaps]], then [[Binary Search]] again.</p>";
/// let titles = extract_wiki_link_titles(content);
/// assert_eq!(titles, vec!["Binary Search".to_string(), "Heaps".to_string()]);
/// ```
pub fn extract_wiki_link_titles(content: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut titles = Vec::new();

    for cap in WIKI_LINK_PATTERN.captures_iter(content) {
        if let Some(title) = cap.get(1) {
            let trimmed = title.as_str().trim();
            if trimmed.is_empty() {
                continue;
            }
            if seen.insert(trimmed.to_string()) {
                titles.push(trimmed.to_string());
            }
        }
    }

    titles
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extracts_multiple_titles() {
        let titles = extract_wiki_link_titles("[[A]] text [[B]]");
        assert_eq!(titles, vec!["A", "B"]);
    }

    #[test]
    fn test_no_tokens_yields_empty() {
        assert!(extract_wiki_link_titles("plain content, no links").is_empty());
        assert!(extract_wiki_link_titles("").is_empty());
    }

    #[test]
    fn test_trims_whitespace_inside_token() {
        let titles = extract_wiki_link_titles("[[  Two Sum  ]]");
        assert_eq!(titles, vec!["Two Sum"]);
    }

    #[test]
    fn test_deduplicates_preserving_order() {
        let titles = extract_wiki_link_titles("[[B]] [[A]] [[B]] [[A]]");
        assert_eq!(titles, vec!["B", "A"]);
    }

    #[test]
    fn test_skips_empty_tokens() {
        let titles = extract_wiki_link_titles("[[]] [[  ]] [[Real]]");
        assert_eq!(titles, vec!["Real"]);
    }

    #[test]
    fn test_tokens_inside_html() {
        let content = "<p>Compare with <strong>[[Merge Sort]]</strong> notes.</p>";
        assert_eq!(extract_wiki_link_titles(content), vec!["Merge Sort"]);
    }

    #[test]
    fn test_does_not_match_across_lines() {
        assert!(extract_wiki_link_titles("[[broken\ntoken]]").is_empty());
    }

    #[test]
    fn test_single_brackets_ignored() {
        assert!(extract_wiki_link_titles("[not a link] (also not)").is_empty());
    }
}
