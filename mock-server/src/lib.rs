use std::collections::BTreeMap;

use axum::{
    body::Bytes,
    extract::Path,
    http::{header, HeaderMap, Method, StatusCode, Uri},
    response::{AppendHeaders, IntoResponse},
    routing::{delete, get, patch, post, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::net::TcpListener;

/// Largest body `/bytes/{n}` will generate.
pub const MAX_BYTES: usize = 10 * 1024 * 1024;

/// What the server saw, sent back as the response body.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Echo {
    pub method: String,
    pub path: String,
    pub headers: BTreeMap<String, String>,
    #[serde(default)]
    pub json: Option<Value>,
}

pub fn app() -> Router {
    Router::new()
        .route("/get", get(echo))
        .route("/post", post(echo_with_body))
        .route("/put", put(echo_with_body))
        .route("/patch", patch(echo_with_body))
        .route("/delete", delete(echo_with_body))
        .route("/bytes/{n}", get(bytes))
        .route("/status/{code}", get(status))
        .route("/headers/duplicate", get(duplicate_headers))
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

/// Deterministic filler for `/bytes/{n}`.
pub fn pattern(n: usize) -> Vec<u8> {
    (0..n).map(|i| (i % 251) as u8).collect()
}

fn describe(method: &Method, uri: &Uri, headers: &HeaderMap, json: Option<Value>) -> Echo {
    let headers = headers
        .iter()
        .filter_map(|(name, value)| Some((name.as_str().to_string(), value.to_str().ok()?.to_string())))
        .collect();
    Echo {
        method: method.as_str().to_string(),
        path: uri
            .path_and_query()
            .map_or_else(|| uri.path().to_string(), |pq| pq.to_string()),
        headers,
        json,
    }
}

async fn echo(method: Method, uri: Uri, headers: HeaderMap) -> Json<Echo> {
    Json(describe(&method, &uri, &headers, None))
}

async fn echo_with_body(
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<Echo>, StatusCode> {
    let json = if body.is_empty() {
        None
    } else {
        Some(serde_json::from_slice(&body).map_err(|_| StatusCode::BAD_REQUEST)?)
    };
    Ok(Json(describe(&method, &uri, &headers, json)))
}

async fn bytes(Path(n): Path<usize>) -> Result<impl IntoResponse, StatusCode> {
    if n > MAX_BYTES {
        return Err(StatusCode::BAD_REQUEST);
    }
    Ok(([(header::CONTENT_TYPE, "application/octet-stream")], pattern(n)))
}

async fn status(Path(code): Path<u16>) -> Result<StatusCode, StatusCode> {
    StatusCode::from_u16(code).map_err(|_| StatusCode::BAD_REQUEST)
}

async fn duplicate_headers() -> impl IntoResponse {
    (AppendHeaders([("x-test", "a"), ("x-test", "b")]), "ok")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn echo_serializes_to_json() {
        let echo = Echo {
            method: "POST".to_string(),
            path: "/post".to_string(),
            headers: BTreeMap::from([("host".to_string(), "localhost".to_string())]),
            json: Some(json!({"k": "v"})),
        };
        let value = serde_json::to_value(&echo).unwrap();
        assert_eq!(value["method"], "POST");
        assert_eq!(value["headers"]["host"], "localhost");
        assert_eq!(value["json"]["k"], "v");
    }

    #[test]
    fn echo_without_json_field_deserializes() {
        let echo: Echo =
            serde_json::from_str(r#"{"method":"GET","path":"/get","headers":{}}"#).unwrap();
        assert!(echo.json.is_none());
    }

    #[test]
    fn describe_keeps_query_string() {
        let uri: Uri = "/get?a=1&b=2".parse().unwrap();
        let echo = describe(&Method::GET, &uri, &HeaderMap::new(), None);
        assert_eq!(echo.path, "/get?a=1&b=2");
    }

    #[test]
    fn pattern_wraps_at_251() {
        let bytes = pattern(600);
        assert_eq!(bytes.len(), 600);
        assert_eq!(bytes[0], 0);
        assert_eq!(bytes[250], 250);
        assert_eq!(bytes[251], 0);
    }
}
