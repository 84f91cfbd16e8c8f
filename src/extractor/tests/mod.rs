use crate::extractor::{EmptyContentError, extract_html};

const PARAGRAPH_ONE: &str = "The river town woke slowly under a grey sky. Fishermen dragged their boats onto the mud and began sorting the night's catch. Nobody spoke much, and the gulls did most of the talking.";
const PARAGRAPH_TWO: &str = "By mid morning the market square was full. Traders argued over prices while children ran between the stalls. A brass band rehearsed somewhere out of sight, missing the same note again and again.";
const PARAGRAPH_THREE: &str = "In the afternoon the rain finally came. The square emptied within minutes. Only the old baker stayed, leaning in his doorway and watching the water run down toward the harbour.";

fn article_page() -> String {
    let nav_links: String = (0..20)
        .map(|i| format!("<li><a href='/section/{i}'>Section number {i}</a></li>"))
        .collect();
    format!(
        r#"<!DOCTYPE html>
<html>
<head><title>Market Day</title><script>window.tracker = 1;</script></head>
<body>
<nav><ul>{nav_links}</ul></nav>
<article>
<h2>Market Day</h2>
<p>{PARAGRAPH_ONE}</p>

<p>{PARAGRAPH_TWO} Read the <a href="/history">town history</a>.</p>

<p>{PARAGRAPH_THREE}</p>
</article>
</body>
</html>"#
    )
}

#[test]
fn selects_article_and_drops_navigation() {
    let text = extract_html(&article_page()).unwrap();

    assert!(text.contains("The river town woke slowly"));
    assert!(text.contains("missing the same note"));
    assert!(text.contains("down toward the harbour"));
    assert!(!text.contains("Section number"));
    assert!(!text.contains("window.tracker"));
}

#[test]
fn output_is_whitespace_normalized() {
    let text = extract_html(&article_page()).unwrap();
    for part in text.split("\n\n") {
        assert!(!part.contains('\n'));
        assert!(!part.contains("  "));
        assert_eq!(part, part.trim());
    }
}

#[test]
fn comment_and_share_widgets_never_reach_output() {
    let body = "A long investigation into how small towns keep their libraries open. Volunteers run the desk. Donations pay for heating. ".repeat(5);
    let html = format!(
        r#"<html><body>
<div class="layout"><div class="column">
<article>{body}</article>
<div class="comments-list">I disagree with everything written above, and here is a long comment explaining why in far too many words.</div>
<div class="share-bar">Share this on every network you can think of, right now, please, it helps us a lot more than you know.</div>
</div></div>
</body></html>"#
    );

    let text = extract_html(&html).unwrap();
    assert!(text.contains("Volunteers run the desk."));
    assert!(!text.contains("I disagree"));
    assert!(!text.contains("every network"));
}

#[test]
fn page_without_candidates_is_empty_content() {
    let html = "<html><head><title>Nothing</title></head><body><p>Short.</p><nav>Home About Contact</nav></body></html>";
    assert_eq!(extract_html(html), Err(EmptyContentError));
}

#[test]
fn empty_and_garbage_documents_are_empty_content() {
    assert_eq!(extract_html(""), Err(EmptyContentError));
    assert_eq!(extract_html("<<<>>> not html at all"), Err(EmptyContentError));
}

#[test]
fn weak_page_falls_back_to_best_block() {
    // shallow, link heavy, no headings or sentences: nothing clears the threshold
    let links: String = (0..30)
        .map(|i| format!("<a href='/{i}'>item{i} </a>"))
        .collect();
    let html = format!("<html><body><div>{links}</div></body></html>");

    let text = extract_html(&html).unwrap();
    assert!(text.starts_with("item0"));
}

#[test]
fn malformed_html_is_handled() {
    let html = format!(
        "<html><head><title>Broken</title><body><div><div><div>{}<p>Unclosed tags<div>More content",
        "Some filler sentence that keeps going. ".repeat(5)
    );
    let text = extract_html(&html).unwrap();
    assert!(text.contains("Unclosed tags"));
}

#[cfg(feature = "fuzz")]
mod fuzz {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn extract_never_panics(html in ".*") {
            let _ = extract_html(&html);
        }

        #[test]
        fn success_is_never_blank(html in "(<div>|</div>|<p>|[a-zA-Z .]{0,40}){0,60}") {
            if let Ok(text) = extract_html(&html) {
                prop_assert!(!text.trim().is_empty());
            }
        }
    }
}
