use std::time::SystemTime;

use http::{
    HeaderMap, HeaderValue, Response, StatusCode, Version,
    header::{CONNECTION, CONTENT_TYPE, DATE, SERVER},
};

use crate::roundtrip::{Body, sniff::TEXT_PLAIN};

/// Value of the `Server` header on every response
pub const SERVER_NAME: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// Build a response from a status, body and initial headers.
///
/// Caller headers are appended after `Server`. `Date` and `Content-Type`
/// are filled in when absent, and non-200 responses get
/// `Connection: close` unless a `Connection` header was given.
pub(crate) fn build(status: StatusCode, body: Body, headers: HeaderMap) -> Response<Body> {
    let mut h = HeaderMap::new();
    h.insert(SERVER, HeaderValue::from_static(SERVER_NAME));

    for (name, value) in &headers {
        h.append(name.clone(), value.clone());
    }

    if !h.contains_key(DATE) {
        if let Some(now) = http_date(SystemTime::now()) {
            h.insert(DATE, now);
        }
    }

    if !h.contains_key(CONTENT_TYPE) {
        h.insert(CONTENT_TYPE, HeaderValue::from_static(TEXT_PLAIN));
    }

    if status != StatusCode::OK && !h.contains_key(CONNECTION) {
        h.insert(CONNECTION, HeaderValue::from_static("close"));
    }

    let mut response = Response::new(body);
    *response.status_mut() = status;
    *response.version_mut() = Version::HTTP_11;
    *response.headers_mut() = h;

    response
}

/// Format a time as an HTTP date, always in GMT
pub(crate) fn http_date(time: SystemTime) -> Option<HeaderValue> {
    HeaderValue::from_str(&httpdate::fmt_http_date(time)).ok()
}

#[cfg(test)]
mod tests {
    use std::time::{Duration, UNIX_EPOCH};

    use http::header::{CONTENT_LENGTH, LAST_MODIFIED};

    use super::*;

    #[test]
    fn defaults_are_applied() {
        let response = build(StatusCode::OK, Body::empty(), HeaderMap::new());
        let headers = response.headers();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.version(), Version::HTTP_11);
        assert_eq!(headers[SERVER], SERVER_NAME);
        assert_eq!(headers[CONTENT_TYPE], TEXT_PLAIN);
        assert!(headers.contains_key(DATE));
        assert!(!headers.contains_key(CONNECTION));
    }

    #[test]
    fn non_ok_closes_connection() {
        let response = build(StatusCode::NOT_FOUND, Body::empty(), HeaderMap::new());

        assert_eq!(response.headers()[CONNECTION], "close");
    }

    #[test]
    fn explicit_headers_win() {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("image/png"));
        headers.insert(DATE, HeaderValue::from_static("Sun, 06 Nov 1994 08:49:37 GMT"));
        headers.insert(CONNECTION, HeaderValue::from_static("keep-alive"));

        let response = build(StatusCode::METHOD_NOT_ALLOWED, Body::empty(), headers);
        let headers = response.headers();

        assert_eq!(headers[CONTENT_TYPE], "image/png");
        assert_eq!(headers[DATE], "Sun, 06 Nov 1994 08:49:37 GMT");
        assert_eq!(headers[CONNECTION], "keep-alive");
        assert_eq!(headers.get_all(CONTENT_TYPE).iter().count(), 1);
    }

    #[test]
    fn multi_valued_headers_are_kept() {
        let mut headers = HeaderMap::new();
        headers.append(SERVER, HeaderValue::from_static("upstream"));
        headers.append(CONTENT_LENGTH, HeaderValue::from(3u64));
        headers.append("x-tag", HeaderValue::from_static("a"));
        headers.append("x-tag", HeaderValue::from_static("b"));

        let response = build(StatusCode::OK, Body::empty(), headers);
        let headers = response.headers();

        let servers: Vec<_> = headers.get_all(SERVER).iter().collect();
        let tags: Vec<_> = headers.get_all("x-tag").iter().collect();

        assert_eq!(servers, vec![SERVER_NAME, "upstream"]);
        assert_eq!(tags, vec!["a", "b"]);
        assert_eq!(headers[CONTENT_LENGTH], "3");
        assert!(!headers.contains_key(LAST_MODIFIED));
    }

    #[test]
    fn http_date_is_gmt() {
        let time = UNIX_EPOCH + Duration::from_secs(784_111_777);

        assert_eq!(http_date(time).unwrap(), "Sun, 06 Nov 1994 08:49:37 GMT");
    }
}
