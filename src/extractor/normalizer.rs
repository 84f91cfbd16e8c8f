use scraper::{ElementRef, Html};

use crate::extractor::dom::{DocumentTree, ElementData, NodeId};

/// Elements that are never article content.
const STRIPPED_TAGS: &[&str] = &[
    "nav", "header", "footer", "aside", "script", "style", "iframe",
];

/// Substrings of `class`/`id` values that mark chrome rather than content.
const STRIPPED_MARKERS: &[&str] = &[
    "nav", "header", "footer", "sidebar", "menu", "ads", "comments", "share", "social",
];

enum Pending<'a> {
    Element(ElementRef<'a>, Option<NodeId>),
    Text(&'a str, NodeId),
}

/// Parse `html` and copy it into an arena tree, dropping boilerplate
/// subtrees entirely. Comments and processing instructions are discarded.
///
/// Parsing is best-effort; garbage in yields a small or empty tree.
pub fn normalize(html: &str) -> DocumentTree {
    let document = Html::parse_document(html);
    let mut tree = DocumentTree::new();

    let root = document.root_element();
    if is_stripped(root) {
        return tree;
    }

    let mut stack = vec![Pending::Element(root, None)];
    while let Some(pending) = stack.pop() {
        match pending {
            Pending::Text(text, parent) => {
                tree.push_text(text, parent);
            }
            Pending::Element(element, parent) => {
                let id = tree.push_element(element_data(element), parent);
                let mut children = Vec::new();
                for child in element.children() {
                    if let Some(child_element) = ElementRef::wrap(child) {
                        if !is_stripped(child_element) {
                            children.push(Pending::Element(child_element, Some(id)));
                        }
                    } else if let Some(text) = child.value().as_text() {
                        children.push(Pending::Text(&**text, id));
                    }
                }
                // reversed so the next pop is the first child
                stack.extend(children.into_iter().rev());
            }
        }
    }

    tree
}

fn element_data(element: ElementRef<'_>) -> ElementData {
    let value = element.value();
    ElementData {
        tag: value.name().to_ascii_lowercase(),
        id: value.id().map(str::to_string),
        class: value.attr("class").map(str::to_string),
    }
}

fn is_stripped(element: ElementRef<'_>) -> bool {
    let value = element.value();
    if STRIPPED_TAGS.contains(&value.name()) {
        return true;
    }
    [value.attr("class"), value.id()]
        .into_iter()
        .flatten()
        .any(|attr| {
            let attr = attr.to_lowercase();
            STRIPPED_MARKERS.iter().any(|marker| attr.contains(marker))
        })
}
