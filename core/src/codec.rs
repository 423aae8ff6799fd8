//! Wire framing for HTTP/1.1 requests and responses.
//!
//! # Design
//! Message boundaries are found with `Content-Length` only. The head ends at
//! the first `\r\n\r\n`; the body is whatever follows, topped up from the
//! stream until `Content-Length` bytes are present. A response without the
//! header gets exactly the bytes that arrived with the head. There is no
//! chunked decoding and no read-until-close.
//!
//! Functions here work on any `Read`/`Write`, so tests drive them with
//! in-memory streams.

use std::io::{self, Read, Write};

use log::warn;

use crate::error::HttpError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};

/// Upper bound for a single read from the connection (1 MiB).
pub const READ_CHUNK_SIZE: usize = 1024 * 1024;

const HEAD_TERMINATOR: &[u8] = b"\r\n\r\n";

/// Serialize the request line, headers and body.
///
/// `GET` requests carry no body and no `Content-Length`. Every other method
/// sends `Content-Length` and `Content-Type: application/json`; a missing
/// payload is sent as an empty body.
pub fn encode_request(request: &HttpRequest) -> Vec<u8> {
    let endpoint = &request.endpoint;
    let mut out = format!(
        "{} {} HTTP/1.1\r\nHost: {}\r\n",
        request.method,
        endpoint.request_target(),
        endpoint.host()
    )
    .into_bytes();

    if request.method == HttpMethod::Get {
        out.extend_from_slice(b"\r\n");
        return out;
    }

    let body = request.body.as_deref().unwrap_or_default();
    out.extend_from_slice(
        format!(
            "Content-Length: {}\r\nContent-Type: application/json\r\n\r\n",
            body.len()
        )
        .as_bytes(),
    );
    out.extend_from_slice(body);
    out
}

/// Write the whole request in one call.
pub fn write_request<W: Write>(stream: &mut W, bytes: &[u8]) -> Result<(), HttpError> {
    stream.write_all(bytes)?;
    stream.flush()?;
    Ok(())
}

/// Read one response from `stream`, in reads of at most `chunk_size` bytes.
pub fn read_response<R: Read>(stream: &mut R, chunk_size: usize) -> Result<HttpResponse, HttpError> {
    let mut chunk = vec![0u8; chunk_size.max(1)];
    let mut received = Vec::new();

    let head_end = loop {
        let search_from = received.len().saturating_sub(HEAD_TERMINATOR.len() - 1);
        let n = read_chunk(stream, &mut chunk)?;
        if n == 0 {
            return Err(HttpError::closed("connection closed before the response head"));
        }
        received.extend_from_slice(&chunk[..n]);
        if let Some(pos) = find(&received[search_from..], HEAD_TERMINATOR) {
            break search_from + pos;
        }
    };

    let mut body = received.split_off(head_end + HEAD_TERMINATOR.len());
    received.truncate(head_end);
    let mut response = HttpResponse::from_parts(&received, Vec::new())?;

    if let Some(expected) = content_length(&response)? {
        while body.len() < expected {
            let n = read_chunk(stream, &mut chunk)?;
            if n == 0 {
                return Err(HttpError::closed(&format!(
                    "connection closed after {} of {expected} body bytes",
                    body.len()
                )));
            }
            body.extend_from_slice(&chunk[..n]);
        }
        if body.len() > expected {
            warn!(
                "discarding {} bytes received past Content-Length",
                body.len() - expected
            );
            body.truncate(expected);
        }
    }

    response.body = body;
    Ok(response)
}

fn content_length(response: &HttpResponse) -> Result<Option<usize>, HttpError> {
    response
        .headers
        .get("content-length")
        .map(|value| {
            value.trim().parse::<usize>().map_err(|_| {
                HttpError::Protocol(format!("invalid Content-Length `{value}`"))
            })
        })
        .transpose()
}

fn read_chunk<R: Read>(stream: &mut R, chunk: &mut [u8]) -> Result<usize, HttpError> {
    loop {
        match stream.read(chunk) {
            Ok(n) => return Ok(n),
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        }
    }
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}
