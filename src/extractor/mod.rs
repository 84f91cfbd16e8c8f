pub mod assembler;
pub mod blocks;
pub mod dom;
pub mod normalizer;
pub mod scoring;

#[cfg(test)]
mod tests;

pub use assembler::{EmptyContentError, assemble};
pub use blocks::{CandidateBlock, identify};
pub use dom::DocumentTree;
pub use normalizer::normalize;
pub use scoring::{ScoreVector, ScoredBlock, score};

use tracing::debug;

/// Extract the main text of an HTML document.
///
/// Runs normalize, identify, score and assemble strictly in sequence.
pub fn extract_html(html: &str) -> Result<String, EmptyContentError> {
    // 1. Drop structural boilerplate
    let tree = normalize(html);

    // 2. Propose candidate containers
    let blocks = identify(&tree);
    let candidates = blocks.len();

    // 3. Score them
    let scored = score(&tree, blocks);

    // 4. Pick the winners
    let text = assemble(scored)?;

    debug!(
        nodes = tree.len(),
        candidates,
        chars = text.chars().count(),
        "extracted main content"
    );
    Ok(text)
}
