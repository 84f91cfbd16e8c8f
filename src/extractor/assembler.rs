use thiserror::Error;

use crate::extractor::scoring::ScoredBlock;

/// Blocks scoring above this are treated as confident content.
pub const CONTENT_THRESHOLD: f64 = 3.0;

/// Extraction found nothing article-like.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("document contains no extractable content")]
pub struct EmptyContentError;

/// Select the winning blocks and join their text.
///
/// Every block above [`CONTENT_THRESHOLD`] is kept, best first. When none
/// clears it, the single best block is used instead. Only an empty block
/// list is an error.
pub fn assemble(mut blocks: Vec<ScoredBlock>) -> Result<String, EmptyContentError> {
    // stable: equal totals keep document order
    blocks.sort_by(|a, b| b.scores.total.total_cmp(&a.scores.total));

    let confident = blocks
        .iter()
        .take_while(|block| block.scores.total > CONTENT_THRESHOLD)
        .count();
    let selected = &blocks[..confident.max(1).min(blocks.len())];

    let text = selected
        .iter()
        .map(|block| collapse_whitespace(&block.block.text))
        .filter(|text| !text.is_empty())
        .collect::<Vec<_>>()
        .join("\n\n");

    if text.is_empty() {
        return Err(EmptyContentError);
    }
    Ok(text)
}

pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
