use regex::Regex;
use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;

pub const MAX_KEYWORDS: usize = 10;

/// Tokens this short or shorter are never keywords.
const MAX_IGNORED_TOKEN_CHARS: usize = 2;

static NON_WORD_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^\w\s]").unwrap());

static STOP_WORDS: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    [
        "a", "an", "the", "and", "or", "but", "is", "are", "was", "were", "in", "on", "at", "to",
        "for", "with", "by", "about", "as", "of", "that", "this", "these", "those", "it", "its",
        "they", "them", "their", "we", "our", "you", "your", "he", "she", "his", "her",
    ]
    .into_iter()
    .collect()
});

pub fn is_stop_word(token: &str) -> bool {
    STOP_WORDS.contains(token)
}

/// Rank the most frequent meaningful words in `text`.
///
/// Purely local and deterministic. Ties keep first-seen order.
pub fn extract_keywords(text: &str) -> Vec<String> {
    let lowered = text.to_lowercase();
    let cleaned = NON_WORD_REGEX.replace_all(&lowered, "");

    // (token, count) in first-seen order
    let mut tally: Vec<(&str, usize)> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();
    for token in cleaned.split_whitespace() {
        if token.chars().count() <= MAX_IGNORED_TOKEN_CHARS || is_stop_word(token) {
            continue;
        }
        match index.get(token) {
            Some(&slot) => tally[slot].1 += 1,
            None => {
                index.insert(token, tally.len());
                tally.push((token, 1));
            }
        }
    }

    tally.sort_by(|a, b| b.1.cmp(&a.1));
    tally
        .into_iter()
        .take(MAX_KEYWORDS)
        .map(|(token, _)| token.to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dominant_word_comes_first() {
        let text = "the glacier and the glacier is in the glacier of a glacier at the glacier";
        assert_eq!(extract_keywords(text), vec!["glacier"]);
    }

    #[test]
    fn ranks_by_frequency_then_first_seen() {
        let text = "Rust compiles. Cargo builds. Rust tests! Cargo publishes; crates crates crates.";
        assert_eq!(
            extract_keywords(text),
            vec!["crates", "rust", "cargo", "compiles", "builds", "tests", "publishes"]
        );
    }

    #[test]
    fn drops_stop_words_short_tokens_and_punctuation() {
        let keywords = extract_keywords("It is an ox. We go by car, they said: \"wow!\"");
        assert_eq!(keywords, vec!["car", "said", "wow"]);
        for keyword in &keywords {
            assert!(keyword.chars().count() > 2);
            assert!(!is_stop_word(keyword));
        }
    }

    #[test]
    fn returns_at_most_ten() {
        let text = (0..50)
            .map(|i| format!("token{i} "))
            .collect::<String>();
        let keywords = extract_keywords(&text);
        assert_eq!(keywords.len(), MAX_KEYWORDS);
        assert_eq!(keywords[0], "token0");
        assert_eq!(keywords[9], "token9");
    }

    #[test]
    fn is_deterministic_and_duplicate_free() {
        let text = "Harbour lights, harbour walls, market stalls and market bells ring across the harbour.";
        let first = extract_keywords(text);
        let second = extract_keywords(text);
        assert_eq!(first, second);
        let unique: HashSet<_> = first.iter().collect();
        assert_eq!(unique.len(), first.len());
        assert_eq!(first[0], "harbour");
        assert_eq!(first[1], "market");
    }

    #[test]
    fn empty_text_has_no_keywords() {
        assert!(extract_keywords("").is_empty());
        assert!(extract_keywords("a an the of").is_empty());
    }
}

#[cfg(all(test, feature = "fuzz"))]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn never_returns_stop_words_or_short_tokens(text in "\\PC{0,400}") {
            let keywords = extract_keywords(&text);
            prop_assert!(keywords.len() <= MAX_KEYWORDS);
            for keyword in &keywords {
                prop_assert!(keyword.chars().count() > 2);
                prop_assert!(!is_stop_word(keyword));
            }
            prop_assert_eq!(keywords, extract_keywords(&text));
        }
    }
}
