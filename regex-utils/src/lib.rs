//! Regex utilities for fngen
//! Compiled patterns used when recovering JSON from decorated model replies

use once_cell::sync::Lazy;
use regex::Regex;

/// Markdown code fence patterns
pub mod fence {
    use super::*;

    /// A fenced block anywhere in the text, with an optional language tag.
    pub static BLOCK_PATTERN: Lazy<Regex> = Lazy::new(|| {
        Regex::new(r"(?s)```[A-Za-z0-9_+\-]*[ \t]*\r?\n(.*?)\r?\n[ \t]*```")
            .expect("Invalid regex pattern")
    });

    /// Extract the interior of every fenced block, in order of appearance
    pub fn extract_all(text: &str) -> Vec<&str> {
        BLOCK_PATTERN
            .captures_iter(text)
            .filter_map(|caps| caps.get(1))
            .map(|m| m.as_str().trim())
            .filter(|interior| !interior.is_empty())
            .collect()
    }
}

/// JSON value boundary patterns
pub mod json {
    use super::*;

    pub static OPENER_PATTERN: Lazy<Regex> =
        Lazy::new(|| Regex::new(r"[\{\[]").expect("Invalid regex pattern"));

    /// Byte offsets where a JSON object or array could begin.
    ///
    /// Callers try each offset with a streaming parser; the pattern only
    /// narrows the search.
    pub fn candidate_starts(text: &str) -> impl Iterator<Item = usize> + '_ {
        OPENER_PATTERN.find_iter(text).map(|m| m.start())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fence_extract_all() {
        let reply = "Here is the result:\n```json\n[1, 2, 3]\n```\nHope this helps.";
        assert_eq!(fence::extract_all(reply), vec!["[1, 2, 3]"]);

        let two = "```json\n1\n```\nand\n```\n2\n```";
        assert_eq!(fence::extract_all(two), vec!["1", "2"]);

        let untagged = "```\n{\"a\": 1}\n```";
        assert_eq!(fence::extract_all(untagged), vec!["{\"a\": 1}"]);

        assert!(fence::extract_all("no fences here").is_empty());
        assert!(fence::extract_all("```json\n\n```").is_empty());
    }

    #[test]
    fn test_json_candidate_starts() {
        let starts: Vec<usize> = json::candidate_starts("The answer is {\"x\": [1]}").collect();
        assert_eq!(starts, vec![14, 20]);

        assert_eq!(json::candidate_starts("plain text").count(), 0);
    }
}
