#![no_main]

use bytes::Bytes;
use libfuzzer_sys::fuzz_target;
use reqwest::StatusCode;
use url::Url;

use distill::extractor::extract_html;
use distill::fetcher::pipeline::process_response;
use distill::insights::extract_keywords;

fuzz_target!(|data: &[u8]| {
    // Raw bytes go through charset sniffing exactly like a fetched body
    let page = process_response(
        Url::parse("https://example.com").unwrap(),
        StatusCode::OK,
        "text/html",
        Bytes::copy_from_slice(data),
    );

    // Neither stage may panic, whatever the input
    if let Ok(text) = extract_html(&page.body_utf8) {
        assert!(!text.trim().is_empty());
        let _ = extract_keywords(&text);
    }
});
