use crate::extractor::dom::{DocumentTree, NodeId};

/// Container tags considered as candidate blocks.
pub const CANDIDATE_TAGS: &[&str] = &["article", "section", "div", "main"];

/// Blocks with less trimmed text than this are never content.
pub const MIN_BLOCK_CHARS: usize = 100;

/// A container element proposed as main content.
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateBlock {
    pub node: NodeId,
    /// Trimmed rendered text.
    pub text: String,
    /// Length of `text` in characters.
    pub text_length: usize,
    pub link_count: usize,
    /// Links per 100 characters of text.
    pub link_density: f64,
}

impl CandidateBlock {
    pub fn new(node: NodeId, text: String, link_count: usize) -> Self {
        let text_length = text.chars().count();
        Self {
            node,
            text,
            text_length,
            link_count,
            link_density: link_density(link_count, text_length),
        }
    }
}

pub fn link_density(link_count: usize, text_length: usize) -> f64 {
    if text_length == 0 {
        0.0
    } else {
        link_count as f64 / (text_length as f64 / 100.0)
    }
}

/// Propose candidate blocks in document order.
///
/// Nested containers are emitted separately; overlap is left for the scorer
/// and assembler to resolve.
pub fn identify(tree: &DocumentTree) -> Vec<CandidateBlock> {
    tree.elements()
        .filter(|&id| tree.tag(id).is_some_and(|tag| CANDIDATE_TAGS.contains(&tag)))
        .filter_map(|id| {
            let text = tree.text(id).trim().to_string();
            if text.chars().count() < MIN_BLOCK_CHARS {
                return None;
            }
            let link_count = tree.count_descendant_tags(id, &["a"]);
            Some(CandidateBlock::new(id, text, link_count))
        })
        .collect()
}
