//! Minimal HTTP/1.1 plumbing over a raw `TcpStream`: one request per
//! connection, `Connection: close` on every response.

use anyhow::{bail, Context, Result};
use serde::Serialize;
use std::collections::HashMap;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

pub const MAX_REQUEST_BYTES: usize = 1 << 20;

#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    pub method: String,
    pub path:   String,
    pub query:  HashMap<String, String>,
    pub body:   Vec<u8>,
}

#[derive(Debug, PartialEq)]
pub enum Parsed {
    Incomplete,
    Done(Request),
    Invalid(&'static str),
}

fn find_header_end(buf: &[u8]) -> Option<usize> {
    buf.windows(4).position(|w| w == b"\r\n\r\n")
}

pub fn parse_request(buf: &[u8]) -> Parsed {
    let Some(head_end) = find_header_end(buf) else {
        return Parsed::Incomplete;
    };
    let head = String::from_utf8_lossy(&buf[..head_end]);
    let mut lines = head.lines();

    let first_line = lines.next().unwrap_or_default();
    let mut parts = first_line.split_whitespace();
    let method = parts.next().unwrap_or("");
    let target = parts.next().unwrap_or("");
    if method.is_empty() || !target.starts_with('/') {
        return Parsed::Invalid("malformed request line");
    }

    let mut content_length = 0usize;
    for line in lines {
        if let Some((name, value)) = line.split_once(':') {
            if name.trim().eq_ignore_ascii_case("content-length") {
                match value.trim().parse() {
                    Ok(n) => content_length = n,
                    Err(_) => return Parsed::Invalid("bad content-length"),
                }
            }
        }
    }

    let body_start = head_end + 4;
    let Some(body_end) = body_start.checked_add(content_length).filter(|end| *end <= MAX_REQUEST_BYTES) else {
        return Parsed::Invalid("content-length too large");
    };
    if buf.len() < body_end {
        return Parsed::Incomplete;
    }

    let Ok(url) = reqwest::Url::parse(&format!("http://localhost{target}")) else {
        return Parsed::Invalid("bad request target");
    };

    Parsed::Done(Request {
        method: method.to_string(),
        path:   url.path().trim_end_matches('/').to_string(),
        query:  url.query_pairs().into_owned().collect(),
        body:   buf[body_start..body_end].to_vec(),
    })
}

/// Reads until one full request is buffered. `None` when the peer closed
/// without sending anything.
pub async fn read_request(stream: &mut TcpStream) -> Result<Option<Request>> {
    let mut buf = Vec::with_capacity(8192);
    let mut chunk = vec![0u8; 8192];

    loop {
        let n = stream.read(&mut chunk).await.context("http read")?;
        if n == 0 {
            if buf.is_empty() {
                return Ok(None);
            }
            bail!("connection closed mid-request");
        }
        buf.extend_from_slice(&chunk[..n]);

        match parse_request(&buf) {
            Parsed::Done(req) => return Ok(Some(req)),
            Parsed::Invalid(why) => bail!("invalid request: {why}"),
            Parsed::Incomplete if buf.len() > MAX_REQUEST_BYTES => bail!("request too large"),
            Parsed::Incomplete => {}
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    pub status:       u16,
    pub content_type: &'static str,
    pub body:         String,
}

impl Response {
    pub fn text(status: u16, body: impl Into<String>) -> Self {
        Self { status, content_type: "text/plain; charset=utf-8", body: body.into() }
    }

    pub fn json<T: Serialize>(status: u16, value: &T) -> Self {
        let body = serde_json::to_string_pretty(value).unwrap_or_else(|_| "{}".to_string());
        Self { status, content_type: "application/json; charset=utf-8", body }
    }

    fn reason(&self) -> &'static str {
        match self.status {
            200 => "OK",
            400 => "Bad Request",
            404 => "Not Found",
            405 => "Method Not Allowed",
            _ => "Internal Server Error",
        }
    }

    pub fn to_http(&self) -> String {
        format!(
            "HTTP/1.1 {} {}\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            self.status,
            self.reason(),
            self.content_type,
            self.body.len(),
            self.body
        )
    }

    pub async fn write_to(&self, stream: &mut TcpStream) -> Result<()> {
        stream.write_all(self.to_http().as_bytes()).await.context("http write")?;
        Ok(())
    }
}
