//! Arena-backed document tree.
//!
//! Nodes live in a single `Vec` and refer to each other by index. Nodes are
//! appended in document (pre-)order, so iterating the arena front to back
//! visits elements in the order they appear in the page.

pub type NodeId = usize;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementData {
    /// Lowercase tag name.
    pub tag: String,
    pub id: Option<String>,
    pub class: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeData {
    Element(ElementData),
    Text(String),
}

#[derive(Debug, Clone)]
pub struct Node {
    pub data: NodeData,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
    /// Number of element ancestors.
    pub depth: usize,
    /// Closest preceding sibling that is an element (text is skipped).
    pub prev_element_sibling: Option<NodeId>,
}

#[derive(Debug, Default, Clone)]
pub struct DocumentTree {
    nodes: Vec<Node>,
}

impl DocumentTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn root(&self) -> Option<NodeId> {
        (!self.nodes.is_empty()).then_some(0)
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id]
    }

    pub fn push_element(&mut self, element: ElementData, parent: Option<NodeId>) -> NodeId {
        self.push(NodeData::Element(element), parent)
    }

    pub fn push_text(&mut self, text: impl Into<String>, parent: NodeId) -> NodeId {
        self.push(NodeData::Text(text.into()), Some(parent))
    }

    fn push(&mut self, data: NodeData, parent: Option<NodeId>) -> NodeId {
        let id = self.nodes.len();
        let (depth, prev_element_sibling) = match parent {
            Some(parent_id) => {
                let parent_node = &self.nodes[parent_id];
                let prev = parent_node
                    .children
                    .iter()
                    .rev()
                    .copied()
                    .find(|&sibling| self.is_element(sibling));
                (parent_node.depth + 1, prev)
            }
            None => (0, None),
        };

        self.nodes.push(Node {
            data,
            parent,
            children: Vec::new(),
            depth,
            prev_element_sibling,
        });
        if let Some(parent_id) = parent {
            self.nodes[parent_id].children.push(id);
        }
        id
    }

    pub fn is_element(&self, id: NodeId) -> bool {
        matches!(self.nodes[id].data, NodeData::Element(_))
    }

    pub fn tag(&self, id: NodeId) -> Option<&str> {
        match &self.nodes[id].data {
            NodeData::Element(element) => Some(element.tag.as_str()),
            NodeData::Text(_) => None,
        }
    }

    /// Element ids in document order.
    pub fn elements(&self) -> impl Iterator<Item = NodeId> + '_ {
        (0..self.nodes.len()).filter(|&id| self.is_element(id))
    }

    /// All descendants of `id` (excluding `id`) in document order.
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.nodes[id].children.iter().rev().copied().collect();
        while let Some(next) = stack.pop() {
            out.push(next);
            stack.extend(self.nodes[next].children.iter().rev().copied());
        }
        out
    }

    /// Concatenated text of every descendant text node, untrimmed.
    pub fn text(&self, id: NodeId) -> String {
        let mut text = String::new();
        for node in self.descendants(id) {
            if let NodeData::Text(chunk) = &self.nodes[node].data {
                text.push_str(chunk);
            }
        }
        text
    }

    /// Number of descendant elements whose tag is one of `tags`.
    pub fn count_descendant_tags(&self, id: NodeId, tags: &[&str]) -> usize {
        self.descendants(id)
            .into_iter()
            .filter(|&node| self.tag(node).is_some_and(|tag| tags.contains(&tag)))
            .count()
    }

    pub fn ancestor_count(&self, id: NodeId) -> usize {
        self.nodes[id].depth
    }

    pub fn previous_element_sibling(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id].prev_element_sibling
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn element(tag: &str) -> ElementData {
        ElementData {
            tag: tag.to_string(),
            id: None,
            class: None,
        }
    }

    #[test]
    fn builds_parent_and_sibling_links() {
        let mut tree = DocumentTree::new();
        let html = tree.push_element(element("html"), None);
        let body = tree.push_element(element("body"), Some(html));
        let h2 = tree.push_element(element("h2"), Some(body));
        tree.push_text("Title", h2);
        tree.push_text("\n", body);
        let div = tree.push_element(element("div"), Some(body));
        tree.push_text("Body text", div);

        assert_eq!(tree.root(), Some(html));
        assert_eq!(tree.ancestor_count(div), 2);
        assert_eq!(tree.previous_element_sibling(div), Some(h2));
        assert_eq!(tree.previous_element_sibling(h2), None);
        assert_eq!(tree.text(body), "Title\nBody text");
        assert_eq!(tree.count_descendant_tags(body, &["h2", "div"]), 2);
        assert_eq!(tree.elements().collect::<Vec<_>>(), vec![html, body, h2, div]);
    }

    #[test]
    fn empty_tree_has_no_root() {
        let tree = DocumentTree::new();
        assert!(tree.is_empty());
        assert_eq!(tree.root(), None);
    }
}
