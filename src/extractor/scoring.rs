//! Heuristic scoring of candidate blocks.
//!
//! Six independent signals are summed into one total. Each is cheap and
//! none can zero out the others; boilerplate is the only signal that
//! subtracts.

use regex::{Regex, RegexSet};
use serde::Serialize;
use std::sync::LazyLock;

use crate::extractor::blocks::CandidateBlock;
use crate::extractor::dom::{DocumentTree, NodeId};

const HEADING_TAGS: &[&str] = &["h1", "h2", "h3", "h4", "h5", "h6"];

/// Blocks shallower than this are page-level wrappers.
const MIN_CONTENT_DEPTH: usize = 3;

const BOILERPLATE_PENALTY: f64 = 0.5;

static SENTENCE_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\.\s+[A-Z]").unwrap());

static PARAGRAPH_BREAK_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n\s*\n").unwrap());

static BOILERPLATE_PHRASES: LazyLock<RegexSet> = LazyLock::new(|| {
    RegexSet::new([
        r"(?i)copyright",
        r"(?i)all rights reserved",
        r"(?i)terms of service",
        r"(?i)privacy policy",
        r"(?i)contact us",
        r"(?i)sign up for our newsletter|newsletter sign-?up",
        r"(?i)share this",
        r"(?i)related articles",
    ])
    .unwrap()
});

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct ScoreVector {
    pub text_density: f64,
    pub link_density: f64,
    pub heading_proximity: f64,
    pub sentence_structure: f64,
    pub boilerplate_match: f64,
    pub position: f64,
    pub total: f64,
}

impl ScoreVector {
    fn with_total(mut self) -> Self {
        self.total = self.text_density
            + self.link_density
            + self.heading_proximity
            + self.sentence_structure
            + self.boilerplate_match
            + self.position;
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScoredBlock {
    pub block: CandidateBlock,
    pub scores: ScoreVector,
}

/// Score every block. Output order matches input order.
pub fn score(tree: &DocumentTree, blocks: Vec<CandidateBlock>) -> Vec<ScoredBlock> {
    blocks
        .into_iter()
        .map(|block| {
            let scores = ScoreVector {
                text_density: text_density_score(block.text_length),
                link_density: link_density_score(block.link_density),
                heading_proximity: heading_proximity_score(tree, block.node),
                sentence_structure: sentence_structure_score(&block.text),
                boilerplate_match: boilerplate_score(&block.text),
                position: position_score(tree, block.node),
                total: 0.0,
            }
            .with_total();
            ScoredBlock { block, scores }
        })
        .collect()
}

/// `min(len / 500, 3)`
pub fn text_density_score(text_length: usize) -> f64 {
    (text_length as f64 / 500.0).min(3.0)
}

pub fn link_density_score(density: f64) -> f64 {
    if density < 0.1 {
        2.0
    } else if density < 0.25 {
        1.0
    } else {
        0.0
    }
}

/// 2 if the block contains a heading, 1.5 if a heading directly precedes it.
pub fn heading_proximity_score(tree: &DocumentTree, node: NodeId) -> f64 {
    if tree.count_descendant_tags(node, HEADING_TAGS) > 0 {
        return 2.0;
    }
    let preceded_by_heading = tree
        .previous_element_sibling(node)
        .and_then(|sibling| tree.tag(sibling))
        .is_some_and(|tag| HEADING_TAGS.contains(&tag));
    if preceded_by_heading { 1.5 } else { 0.0 }
}

pub fn sentence_structure_score(text: &str) -> f64 {
    let sentences = SENTENCE_REGEX.find_iter(text).count();
    let paragraphs = PARAGRAPH_BREAK_REGEX
        .split(text)
        .filter(|p| !p.trim().is_empty())
        .count();
    (sentences as f64 / 3.0).min(2.0) + (paragraphs as f64).min(1.0)
}

/// -0.5 for each boilerplate phrase present in the text.
pub fn boilerplate_score(text: &str) -> f64 {
    let matched = BOILERPLATE_PHRASES.matches(text).iter().count();
    -(matched as f64) * BOILERPLATE_PENALTY
}

pub fn position_score(tree: &DocumentTree, node: NodeId) -> f64 {
    if tree.ancestor_count(node) < MIN_CONTENT_DEPTH {
        0.0
    } else {
        1.0
    }
}
