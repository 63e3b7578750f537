//! Loopback HTTP server for a bundled video UI, and the media URL resolver
//! whose output the UI is opened with.

use std::fs::File;
use std::io::{self, prelude::*};

pub use http::{header, Method, Response, StatusCode, Version};
use http::{HeaderName, HeaderValue};

pub mod assets;
pub mod config;
pub mod error;
pub mod logging;
pub mod media;
pub mod search;
pub mod server;

use assets::AssetPath;
use config::READ_CHUNK_SIZE;
pub use error::{AssetError, HttpError, MediaError, SearchError, ServerError};

/// A request as read off one connection.
#[derive(Debug, Clone)]
pub struct Request {
    pub method: Method,
    pub target: String,
    /// Everything received, headers included
    pub raw: Vec<u8>,
}

fn parse_request_line(raw: &[u8]) -> Result<(Method, String), HttpError> {
    let line_end = raw.iter().position(|&b| b == b'\n').unwrap_or(raw.len());
    let line_bytes = &raw[..line_end];

    let malformed = || HttpError::MalformedRequest {
        line: String::from_utf8_lossy(line_bytes).into_owned(),
    };

    let line = std::str::from_utf8(line_bytes).map_err(|_| malformed())?;
    let line = line.strip_suffix('\r').unwrap_or(line);

    let mut fields = line.split(' ');
    let (method, target) = match (fields.next(), fields.next()) {
        (Some(method), Some(target)) if !method.is_empty() && !target.is_empty() => {
            (method, target)
        }
        _ => return Err(malformed()),
    };

    let method = Method::from_bytes(method.as_bytes()).map_err(|_| malformed())?;

    Ok((method, target.to_owned()))
}

/// Reads one request from `input`.
///
/// Bytes are read in [`READ_CHUNK_SIZE`] chunks until a read comes back short
/// or the stream ends. That is enough for the small header-only GETs a local
/// browser sends; request bodies are never framed.
///
/// # Errors
///
/// [`HttpError::ConnectionClosed`] when nothing arrives,
/// [`HttpError::MalformedRequest`] when the request line has fewer than two
/// tokens, and [`HttpError::Io`] for read failures including timeouts.
pub fn read_request(input: &mut impl Read) -> Result<Request, HttpError> {
    let mut raw = Vec::new();
    let mut chunk = [0u8; READ_CHUNK_SIZE];

    loop {
        let n = match input.read(&mut chunk) {
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        };

        raw.extend_from_slice(&chunk[..n]);

        if n < READ_CHUNK_SIZE {
            break;
        }
    }

    if raw.is_empty() {
        return Err(HttpError::ConnectionClosed);
    }

    let (method, target) = parse_request_line(&raw)?;

    Ok(Request {
        method,
        target,
        raw,
    })
}

/// Rejects everything but GET.
///
/// # Errors
///
/// [`HttpError::UnsupportedMethod`] for any other method.
pub fn require_get(request: &Request) -> Result<(), HttpError> {
    if request.method == Method::GET {
        Ok(())
    } else {
        Err(HttpError::UnsupportedMethod {
            method: request.method.to_string(),
        })
    }
}

/// `content-length` -> `Content-Length`
fn canonical_header_name(name: &HeaderName) -> String {
    name.as_str()
        .split('-')
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join("-")
}

fn content_length(response: &Response<impl Read>) -> u64 {
    response
        .headers()
        .get(header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<u64>().ok())
        .unwrap_or(0)
}

/// Writes `response` and flushes `output`.
///
/// Headers go out in insertion order with canonical casing, followed by
/// exactly `Content-Length` bytes of the body.
///
/// # Errors
///
/// Any write failure, or [`io::ErrorKind::UnexpectedEof`] when the body is
/// shorter than its declared length.
pub fn write_response(output: &mut impl Write, mut response: Response<impl Read>) -> io::Result<()> {
    let mut head = format!("{:?} {}\r\n", response.version(), response.status());

    for (header_name, header_value) in response.headers().iter() {
        if let Ok(value) = header_value.to_str() {
            head.push_str(&format!(
                "{}: {}\r\n",
                canonical_header_name(header_name),
                value
            ));
        }
    }

    head.push_str("\r\n");
    output.write_all(head.as_bytes())?;

    let length = content_length(&response);
    if length > 0 {
        let body = response.body_mut();
        let copied = io::copy(&mut body.by_ref().take(length), output)?;

        if copied < length {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!("Body ended after {copied} of {length} bytes"),
            ));
        }
    }

    output.flush()
}

fn close_headers(response: &mut Response<impl Read>, length: u64) {
    let headers = response.headers_mut();
    headers.insert(header::CONTENT_LENGTH, HeaderValue::from(length));
    headers.insert(header::CONNECTION, HeaderValue::from_static("close"));
}

/// Bodiless response closing the connection (400, 404, 405).
pub fn empty_response(status: StatusCode) -> Response<io::Empty> {
    let mut response = Response::new(io::empty());
    *response.status_mut() = status;
    close_headers(&mut response, 0);
    response
}

/// `200 OK` streaming the asset's file.
///
/// # Errors
///
/// Fails if the file cannot be opened or its size read.
pub fn ok_response(asset: &AssetPath, with_content_type: bool) -> io::Result<Response<File>> {
    let file = File::open(asset.as_path())?;
    let length = file.metadata()?.len();

    let mut response = Response::new(file);
    close_headers(&mut response, length);

    if with_content_type {
        if let Ok(value) = HeaderValue::from_str(asset.content_type().as_ref()) {
            response.headers_mut().insert(header::CONTENT_TYPE, value);
        }
    }

    Ok(response)
}
