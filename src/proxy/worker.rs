//! Connection Worker
//!
//! Runs the proxy pipeline for one client connection:
//! parse request line → cache lookup → (hit) serve cached body, or
//! (miss) connect → forward request → relay response and maybe cache it.
//! The client connection is closed when the worker returns.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::io::{AsyncBufRead, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::{debug, error, info, warn};

use crate::cache::CacheStore;
use crate::error::Result;
use crate::proxy::request::{build_outbound_header, parse_uri, RequestLine};
use crate::proxy::upstream::{read_line_bounded, UpstreamConnection};
use crate::proxy::{MAX_HEADER_BYTES, MAX_LINE};

// == Outcome ==
/// How a connection ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Client closed before sending a request line
    Empty,
    /// GET without a URI, a line longer than the read bound, bytes that
    /// are not UTF-8, or an oversized header block
    Malformed,
    /// Method other than GET; nothing was sent back
    Rejected { method: String },
    /// Served from the cache
    CacheHit { bytes: usize },
    /// Origin unreachable; nothing was sent back
    UpstreamUnavailable,
    /// Response relayed from the origin
    Relayed { bytes: usize, cached: bool },
}

// == Worker ==
/// Per-connection proxy pipeline sharing one cache with every other worker.
#[derive(Debug, Clone)]
pub struct Worker {
    cache: Arc<CacheStore>,
}

impl Worker {
    pub fn new(cache: Arc<CacheStore>) -> Self {
        Self { cache }
    }

    // == Serve ==
    /// Runs [`handle`](Self::handle) and logs the result. Never fails.
    pub async fn serve<S>(&self, client: S, peer: SocketAddr)
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        match self.handle(client).await {
            Ok(outcome) => debug!("Connection from {} finished: {:?}", peer, outcome),
            Err(e) => error!("Connection from {} failed: {}", peer, e),
        }
    }

    // == Handle ==
    /// Drives one client connection to completion.
    pub async fn handle<S>(&self, client: S) -> Result<Outcome>
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        let (reader, mut writer) = tokio::io::split(client);
        let mut reader = BufReader::new(reader);

        // Parse request line
        let mut line = Vec::new();
        let n = read_line_bounded(&mut reader, &mut line, MAX_LINE).await?;
        if n == 0 {
            return Ok(Outcome::Empty);
        }
        let Some(text) = complete_line(&line, n) else {
            warn!("Request line is not valid UTF-8 or exceeds {} bytes", MAX_LINE);
            return Ok(Outcome::Malformed);
        };
        let request = RequestLine::parse(text);
        info!("Request: {} {} {}", request.method, request.uri, request.version);

        if !request.is_get() {
            warn!("Proxy does not implement method {}", request.method);
            return Ok(Outcome::Rejected {
                method: request.method,
            });
        }
        if request.uri.is_empty() {
            return Ok(Outcome::Malformed);
        }
        let Some(headers) = read_headers(&mut reader).await? else {
            warn!("Malformed request headers for {}", request.uri);
            return Ok(Outcome::Malformed);
        };

        // Cache lookup
        if let Some(handle) = self.cache.find(&request.uri).await {
            writer.write_all(handle.body()).await?;
            writer.flush().await?;
            let bytes = handle.body().len();
            handle.release();
            info!("Served {} from cache ({} bytes)", request.uri, bytes);
            return Ok(Outcome::CacheHit { bytes });
        }

        // Connect
        let target = parse_uri(&request.uri);
        let mut upstream = match UpstreamConnection::connect(&target.host, target.port).await {
            Ok(conn) => conn,
            Err(e) => {
                warn!("Connection failed for {}: {}", request.uri, e);
                return Ok(Outcome::UpstreamUnavailable);
            }
        };

        // Forward request
        let outbound = build_outbound_header(&target, &headers);
        upstream.write_all(&outbound).await?;

        // Relay and maybe cache
        let limit = self.cache.max_object_size();
        let mut body = Vec::new();
        let mut total = 0usize;
        let mut buf = Vec::with_capacity(MAX_LINE);
        loop {
            let n = upstream.read_line(&mut buf).await?;
            if n == 0 {
                break;
            }
            total += n;
            if total < limit {
                body.extend_from_slice(&buf);
            } else if !body.is_empty() {
                body = Vec::new();
            }
            writer.write_all(&buf).await?;
            debug!("Relayed {} bytes from {}", n, target.host);
        }
        writer.flush().await?;
        drop(upstream);

        let cached = total > 0 && total < limit && self.cache_body(&request.uri, &body).await;
        info!(
            "Relayed {} ({} bytes, cached: {})",
            request.uri, total, cached
        );
        Ok(Outcome::Relayed {
            bytes: total,
            cached,
        })
    }

    async fn cache_body(&self, uri: &str, body: &[u8]) -> bool {
        match self.cache.insert(uri, body).await {
            Ok(_) => true,
            Err(e) => {
                warn!("Not caching {}: {}", uri, e);
                false
            }
        }
    }
}

/// Decodes one line read with a bound of [`MAX_LINE`] bytes.
///
/// A full-length piece without its `\n` is the front of a longer line and
/// is refused, as is anything that is not UTF-8. The text returned is
/// exactly the bytes the client sent.
fn complete_line(line: &[u8], n: usize) -> Option<&str> {
    if n >= MAX_LINE && !line.ends_with(b"\n") {
        return None;
    }
    std::str::from_utf8(line).ok()
}

/// Reads header lines up to the blank line or EOF.
///
/// Returns None if the block grows past [`MAX_HEADER_BYTES`] or a line is
/// refused by [`complete_line`].
async fn read_headers<R>(reader: &mut R) -> Result<Option<Vec<String>>>
where
    R: AsyncBufRead + Unpin,
{
    let mut headers = Vec::new();
    let mut line = Vec::new();
    let mut total = 0usize;
    loop {
        let n = read_line_bounded(reader, &mut line, MAX_LINE).await?;
        if n == 0 || line == b"\r\n" || line == b"\n" {
            return Ok(Some(headers));
        }
        total += n;
        if total > MAX_HEADER_BYTES {
            return Ok(None);
        }
        match complete_line(&line, n) {
            Some(text) => headers.push(text.to_string()),
            None => return Ok(None),
        }
    }
}
