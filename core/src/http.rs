//! HTTP request and response types.
//!
//! # Design
//! Requests and responses are plain owned data. Turning them into bytes and
//! back is the codec's job; this module only knows how to interpret a raw
//! status/header block once the codec has found where it ends.

use std::fmt;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::HttpError;
use crate::url::Endpoint;

/// HTTP method for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An outgoing request. Built per call and discarded after it is sent.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub endpoint: Endpoint,
    /// Already-encoded JSON payload.
    pub body: Option<Vec<u8>>,
}

impl HttpRequest {
    pub fn new(method: HttpMethod, endpoint: Endpoint) -> Self {
        Self {
            method,
            endpoint,
            body: None,
        }
    }

    /// Attach `data` as the JSON body. The payload is encoded exactly once, so
    /// the bytes measured for `Content-Length` are the bytes that get sent.
    pub fn with_json<T: Serialize + ?Sized>(mut self, data: &T) -> Result<Self, HttpError> {
        let body =
            serde_json::to_vec(data).map_err(|e| HttpError::Serialization(e.to_string()))?;
        self.body = Some(body);
        Ok(self)
    }
}

/// Response headers in arrival order.
///
/// Every occurrence is kept, names are lowercased on insert. Lookups through
/// [`Headers::get`] are case-insensitive and resolve duplicates to the last
/// occurrence.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Headers {
    entries: Vec<(String, String)>,
}

impl Headers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: &str, value: &str) {
        self.entries
            .push((name.to_ascii_lowercase(), value.to_string()));
    }

    /// Value of the last header called `name`.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .rev()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Every value of `name`, in arrival order.
    pub fn get_all<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.entries
            .iter()
            .filter(move |(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// A parsed response.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Headers,
    pub body: Vec<u8>,
}

impl HttpResponse {
    /// Build a response from the raw head (status line and header lines,
    /// without the terminating blank line) and the body bytes.
    pub fn from_parts(head: &[u8], body: Vec<u8>) -> Result<Self, HttpError> {
        let head = std::str::from_utf8(head)
            .map_err(|e| HttpError::Protocol(format!("header block is not UTF-8: {e}")))?;
        let mut lines = head.split("\r\n");

        let status_line = lines.next().unwrap_or_default();
        let status = status_line
            .split_whitespace()
            .nth(1)
            .ok_or_else(|| HttpError::Protocol(format!("malformed status line `{status_line}`")))?
            .parse::<u16>()
            .map_err(|_| HttpError::Protocol(format!("invalid status code in `{status_line}`")))?;

        let mut headers = Headers::new();
        for line in lines {
            let (name, value) = line
                .split_once(": ")
                .ok_or_else(|| HttpError::Protocol(format!("malformed header line `{line}`")))?;
            headers.insert(name, value);
        }

        Ok(Self {
            status,
            headers,
            body,
        })
    }

    /// The body decoded as UTF-8. Recomputed on every call.
    pub fn text(&self) -> Result<&str, HttpError> {
        std::str::from_utf8(&self.body).map_err(|e| HttpError::Decode(e.to_string()))
    }

    /// The body decoded as JSON into `T`. Recomputed on every call.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, HttpError> {
        serde_json::from_str(self.text()?).map_err(|e| HttpError::Decode(e.to_string()))
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    fn head(status: u16, headers: &[(&str, &str)]) -> Vec<u8> {
        let mut out = format!("HTTP/1.1 {status} OK");
        for (name, value) in headers {
            out.push_str(&format!("\r\n{name}: {value}"));
        }
        out.into_bytes()
    }

    #[test]
    fn method_names_are_uppercase() {
        assert_eq!(HttpMethod::Get.to_string(), "GET");
        assert_eq!(HttpMethod::Patch.as_str(), "PATCH");
        assert_eq!(HttpMethod::Delete.as_str(), "DELETE");
    }

    #[test]
    fn with_json_encodes_once() {
        let endpoint = Endpoint::parse("http://a.com/post").unwrap();
        let req = HttpRequest::new(HttpMethod::Post, endpoint)
            .with_json(&json!({"credits": "someone"}))
            .unwrap();
        assert_eq!(req.body.as_deref(), Some(br#"{"credits":"someone"}"#.as_slice()));
    }

    #[test]
    fn parses_status_and_headers() {
        let resp = HttpResponse::from_parts(
            &head(201, &[("Content-Type", "application/json"), ("X-Id", "7")]),
            Vec::new(),
        )
        .unwrap();
        assert_eq!(resp.status, 201);
        assert!(resp.is_success());
        assert_eq!(resp.headers.get("content-type"), Some("application/json"));
        assert_eq!(resp.headers.get("CONTENT-TYPE"), Some("application/json"));
        assert_eq!(resp.headers.get("x-id"), Some("7"));
        assert_eq!(resp.headers.len(), 2);
    }

    #[test]
    fn duplicate_header_last_wins() {
        let resp =
            HttpResponse::from_parts(&head(200, &[("X-Test", "a"), ("x-test", "b")]), Vec::new())
                .unwrap();
        assert_eq!(resp.headers.get("x-test"), Some("b"));
        assert_eq!(resp.headers.get_all("X-Test").collect::<Vec<_>>(), ["a", "b"]);
    }

    #[test]
    fn header_values_keep_embedded_separators() {
        let resp =
            HttpResponse::from_parts(&head(200, &[("Link", "<a>; rel=\"x: y\"")]), Vec::new())
                .unwrap();
        assert_eq!(resp.headers.get("link"), Some("<a>; rel=\"x: y\""));
    }

    #[test]
    fn status_line_without_code_is_protocol_error() {
        let err = HttpResponse::from_parts(b"HTTP/1.1", Vec::new()).unwrap_err();
        assert!(matches!(err, HttpError::Protocol(_)));

        let err = HttpResponse::from_parts(b"HTTP/1.1 abc OK", Vec::new()).unwrap_err();
        assert!(matches!(err, HttpError::Protocol(_)));
    }

    #[test]
    fn header_line_without_separator_is_protocol_error() {
        let err = HttpResponse::from_parts(b"HTTP/1.1 200 OK\r\nbroken", Vec::new()).unwrap_err();
        assert!(matches!(err, HttpError::Protocol(_)));
    }

    #[test]
    fn json_roundtrip_through_response() {
        #[derive(Debug, PartialEq, Serialize, Deserialize)]
        struct Payload {
            name: String,
            tags: Vec<String>,
        }

        let value = Payload {
            name: "widget".to_string(),
            tags: vec!["a".to_string(), "b".to_string()],
        };
        let body = serde_json::to_vec(&value).unwrap();
        let resp =
            HttpResponse::from_parts(&head(200, &[("content-type", "application/json")]), body)
                .unwrap();
        assert_eq!(resp.json::<Payload>().unwrap(), value);
    }

    #[test]
    fn text_rejects_invalid_utf8() {
        let resp = HttpResponse::from_parts(&head(200, &[]), vec![0xff, 0xfe]).unwrap();
        assert!(matches!(resp.text().unwrap_err(), HttpError::Decode(_)));
    }

    #[test]
    fn json_rejects_non_json_text() {
        let resp = HttpResponse::from_parts(&head(200, &[]), b"not json".to_vec()).unwrap();
        let err = resp.json::<serde_json::Value>().unwrap_err();
        assert!(matches!(err, HttpError::Decode(_)));
    }
}
