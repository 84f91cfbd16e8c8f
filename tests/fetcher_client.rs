use distill::fetcher::{BROWSER_USER_AGENT, DEFAULT_FETCH_TIMEOUT, FetchError, Fetcher};
use std::time::Duration;
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{method, path},
};

fn fetcher() -> Fetcher {
    Fetcher::new(DEFAULT_FETCH_TIMEOUT).unwrap()
}

#[tokio::test]
async fn test_fetch_success_sends_browser_user_agent() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/test"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_bytes(
                    "<html><head><title>Test</title></head><body>Hello World</body></html>"
                        .as_bytes(),
                )
                .insert_header("Content-Type", "text/html; charset=utf-8"),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let url = format!("{}/test", mock_server.uri());
    let result = fetcher().fetch(&url).await.unwrap();

    assert!(result.status.is_success());
    assert!(result.body_utf8.contains("Hello World"));
    assert_eq!(result.url_final.as_str(), url);
    assert_eq!(result.encoding, "UTF-8");

    // The agent string contains commas, so compare the raw header value.
    let requests = mock_server.received_requests().await.unwrap();
    let user_agent = requests[0].headers.get("user-agent").unwrap();
    assert_eq!(user_agent.to_str().unwrap(), BROWSER_USER_AGENT);
}

#[tokio::test]
async fn test_fetch_404() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/notfound"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;

    let url = format!("{}/notfound", mock_server.uri());
    let result = fetcher().fetch(&url).await;

    match result {
        Err(FetchError::Http { status }) => assert_eq!(status.as_u16(), 404),
        other => panic!("Expected HTTP 404 error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_fetch_500_is_not_retried() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/error"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&mock_server)
        .await;

    let url = format!("{}/error", mock_server.uri());
    let result = fetcher().fetch(&url).await;

    match result {
        Err(FetchError::Http { status }) => assert_eq!(status.as_u16(), 500),
        other => panic!("Expected HTTP 500 error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_fetch_redirect() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/redirect"))
        .respond_with(ResponseTemplate::new(302).insert_header("location", "/final"))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/final"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_bytes("<html><body>Final page</body></html>".as_bytes())
                .insert_header("Content-Type", "text/html"),
        )
        .mount(&mock_server)
        .await;

    let url = format!("{}/redirect", mock_server.uri());
    let result = fetcher().fetch(&url).await.unwrap();

    assert!(result.status.is_success());
    assert!(result.body_utf8.contains("Final page"));
    assert!(result.url_final.as_str().ends_with("/final"));
}

#[tokio::test]
async fn test_fetch_gzip_compression() {
    use flate2::Compression;
    use flate2::write::GzEncoder;
    use std::io::Write;

    let original_content =
        "<html><head><title>Compressed</title></head><body>This content is gzipped!</body></html>";

    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(original_content.as_bytes()).unwrap();
    let compressed_data = encoder.finish().unwrap();

    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/gzipped"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_bytes(compressed_data)
                .insert_header("Content-Type", "text/html; charset=utf-8")
                .insert_header("Content-Encoding", "gzip"),
        )
        .mount(&mock_server)
        .await;

    let url = format!("{}/gzipped", mock_server.uri());
    let result = fetcher().fetch(&url).await.unwrap();

    assert!(result.status.is_success());
    assert!(result.body_utf8.contains("This content is gzipped!"));
}

#[tokio::test]
async fn test_fetch_decodes_declared_charset() {
    let mock_server = MockServer::start().await;

    // "café" in ISO-8859-1
    let body = b"<html><body><p>caf\xe9</p></body></html>".to_vec();
    Mock::given(method("GET"))
        .and(path("/latin1"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_bytes(body)
                .insert_header("Content-Type", "text/html; charset=iso-8859-1"),
        )
        .mount(&mock_server)
        .await;

    let url = format!("{}/latin1", mock_server.uri());
    let result = fetcher().fetch(&url).await.unwrap();

    assert!(result.body_utf8.contains("café"));
    assert_eq!(result.encoding, "windows-1252");
}

#[tokio::test]
async fn test_fetch_timeout() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw("<html><body>too late</body></html>", "text/html")
                .set_delay(Duration::from_secs(2)),
        )
        .mount(&mock_server)
        .await;

    let fetcher = Fetcher::new(Duration::from_millis(200)).unwrap();
    let url = format!("{}/slow", mock_server.uri());
    let err = fetcher.fetch(&url).await.unwrap_err();

    assert!(err.is_timeout(), "expected timeout, got {err:?}");
}

#[tokio::test]
async fn test_fetch_unsupported_content_type() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/image"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_bytes(vec![0xFF, 0xD8, 0xFF]) // JPEG header
                .insert_header("Content-Type", "image/jpeg"),
        )
        .mount(&mock_server)
        .await;

    let url = format!("{}/image", mock_server.uri());
    let result = fetcher().fetch(&url).await;

    match result {
        Err(FetchError::UnsupportedContentType(content_type)) => {
            assert_eq!(content_type, "image/jpeg");
        }
        other => panic!("Expected UnsupportedContentType error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_fetch_body_too_large() {
    let mock_server = MockServer::start().await;

    // 6MB > 5MB limit
    let large_body = "x".repeat(6 * 1024 * 1024);

    Mock::given(method("GET"))
        .and(path("/large"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_bytes(large_body.as_bytes())
                .insert_header("Content-Type", "text/html"),
        )
        .mount(&mock_server)
        .await;

    let url = format!("{}/large", mock_server.uri());
    let result = fetcher().fetch(&url).await;

    match result {
        Err(FetchError::BodyTooLarge(size)) => assert_eq!(size, 6 * 1024 * 1024),
        other => panic!("Expected BodyTooLarge error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_fetch_invalid_url() {
    let result = fetcher().fetch("not-a-valid-url").await;

    match result {
        Err(FetchError::InvalidUrl(_)) => {}
        other => panic!("Expected InvalidUrl error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_fetch_rejects_non_http_scheme() {
    let result = fetcher().fetch("ftp://example.com/file.html").await;

    match result {
        Err(FetchError::UnsupportedScheme(scheme)) => assert_eq!(scheme, "ftp"),
        other => panic!("Expected UnsupportedScheme error, got {other:?}"),
    }
}
