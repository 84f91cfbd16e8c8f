use reqwest::StatusCode;
use url::Url;

/// A fetched page, already decoded to UTF-8.
#[derive(Debug)]
pub struct PageResponse {
    pub url_final: Url,
    pub status: StatusCode,
    /// Label of the encoding the body was decoded from.
    pub encoding: &'static str,
    pub body_utf8: String,
}
