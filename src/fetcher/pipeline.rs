use crate::fetcher::types::PageResponse;
use bytes::Bytes;
use encoding_rs::Encoding;
use regex::Regex;
use reqwest::StatusCode;
use std::sync::LazyLock;
use url::Url;

/// How many leading bytes are sniffed for `<meta>` charset declarations.
const SNIFF_WINDOW: usize = 4096;

static CHARSET_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)charset\s*=\s*["']?([^"'\s;]+)"#).unwrap());

static META_CHARSET_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)<meta\s+[^>]*?charset\s*=\s*["']?([^"'\s/>]+)"#).unwrap());

/// Decode a response body into a `PageResponse`.
///
/// Decoding is lossy: undecodable sequences become U+FFFD so that slightly
/// broken pages still reach the extractor.
pub fn process_response(
    url_final: Url,
    status: StatusCode,
    content_type: &str,
    body_bytes: Bytes,
) -> PageResponse {
    let encoding = detect_encoding(content_type, &body_bytes);
    let (decoded, _, had_errors) = encoding.decode(&body_bytes);
    if had_errors {
        tracing::debug!(encoding = encoding.name(), "body contained undecodable bytes");
    }

    PageResponse {
        url_final,
        status,
        encoding: encoding.name(),
        body_utf8: decoded.into_owned(),
    }
}

/// Header charset first, then `<meta>` declarations, then statistical guess.
fn detect_encoding(content_type: &str, body_bytes: &[u8]) -> &'static Encoding {
    if let Some(encoding) = label_from(&CHARSET_REGEX, content_type) {
        return encoding;
    }

    let window = &body_bytes[..body_bytes.len().min(SNIFF_WINDOW)];
    let head = String::from_utf8_lossy(window);
    // `charset=` inside an http-equiv content attribute is caught here too.
    if let Some(encoding) = label_from(&META_CHARSET_REGEX, &head)
        .or_else(|| label_from(&CHARSET_REGEX, &head))
    {
        return encoding;
    }

    let mut detector = chardetng::EncodingDetector::new();
    detector.feed(window, body_bytes.len() <= SNIFF_WINDOW);
    detector.guess(None, true)
}

fn label_from(regex: &Regex, haystack: &str) -> Option<&'static Encoding> {
    let label = regex.captures(haystack)?.get(1)?.as_str().to_lowercase();
    Encoding::for_label(label.as_bytes())
}
