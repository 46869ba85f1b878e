//! Request Translation
//!
//! Pure string transforms between the client's request and the request sent
//! to the origin. No I/O happens here.

/// Port used when the URI names none
pub const DEFAULT_HTTP_PORT: u16 = 80;

/// User-Agent sent to every origin in place of the client's own
pub const USER_AGENT: &str =
    "Mozilla/5.0 (X11; Linux x86_64; rv:10.0.3) Gecko/20120305 Firefox/10.0.3";

/// Headers the proxy always replaces with its own values
const REPLACED_HEADERS: [&str; 4] = ["host", "connection", "proxy-connection", "user-agent"];

// == Request Line ==
/// First line of a client request, split on whitespace.
///
/// Missing fields are left empty rather than rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestLine {
    pub method: String,
    pub uri: String,
    pub version: String,
}

impl RequestLine {
    pub fn parse(line: &str) -> Self {
        let mut parts = line.split_whitespace();
        let mut next = || parts.next().unwrap_or_default().to_string();
        Self {
            method: next(),
            uri: next(),
            version: next(),
        }
    }

    /// The proxy only relays GET, matched case-insensitively.
    pub fn is_get(&self) -> bool {
        self.method.eq_ignore_ascii_case("GET")
    }
}

// == Target ==
/// Where a request URI points: origin host, port and path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    pub host: String,
    pub port: u16,
    /// Empty when the URI names only a host
    pub path: String,
}

impl Target {
    /// Path to put on the outbound request line, `/` when none was given.
    pub fn request_path(&self) -> &str {
        if self.path.is_empty() {
            "/"
        } else {
            &self.path
        }
    }
}

// == Parse URI ==
/// Splits a proxy request URI into host, port and path.
///
/// Accepts `scheme://host:port/path`, `scheme://host/path` and a bare
/// `host`; the scheme prefix is optional. An unparsable port falls back
/// to 80.
pub fn parse_uri(uri: &str) -> Target {
    let uri = uri.trim();
    // Only a leading `scheme://` is stripped; `//` inside the path stays
    let rest = match uri.split_once("://") {
        Some((scheme, rest)) if !scheme.contains('/') => rest,
        _ => uri,
    };

    let (authority, path) = match rest.find('/') {
        Some(pos) => rest.split_at(pos),
        None => (rest, ""),
    };

    let (host, port) = match authority.split_once(':') {
        Some((host, port)) => (host, port.parse().unwrap_or(DEFAULT_HTTP_PORT)),
        None => (authority, DEFAULT_HTTP_PORT),
    };

    Target {
        host: host.to_string(),
        port,
        path: path.to_string(),
    }
}

// == Header Helpers ==
/// Returns the header name of a raw `Name: value\r\n` line.
fn header_name(line: &str) -> &str {
    line.split_once(':').map_or("", |(name, _)| name.trim())
}

fn is_replaced(line: &str) -> bool {
    let name = header_name(line);
    REPLACED_HEADERS
        .iter()
        .any(|replaced| name.eq_ignore_ascii_case(replaced))
}

/// Ensures a header line ends with CRLF.
fn push_line(out: &mut Vec<u8>, line: &str) {
    let line = line.trim_end_matches(['\r', '\n']);
    out.extend_from_slice(line.as_bytes());
    out.extend_from_slice(b"\r\n");
}

// == Build Outbound Header ==
/// Builds the request block sent to the origin.
///
/// The request line is always HTTP/1.0. `Host` is taken from the client
/// when it sent one, otherwise synthesised from `target`. `Connection`,
/// `Proxy-Connection` and `User-Agent` are replaced; every other client
/// header is forwarded verbatim. Terminated by a blank line.
pub fn build_outbound_header(target: &Target, client_headers: &[String]) -> Vec<u8> {
    let mut out = Vec::with_capacity(256);
    push_line(&mut out, &format!("GET {} HTTP/1.0", target.request_path()));

    let client_host = client_headers
        .iter()
        .find(|line| header_name(line).eq_ignore_ascii_case("host"));
    match client_host {
        Some(line) => push_line(&mut out, line),
        None => push_line(&mut out, &format!("Host: {}", target.host)),
    }

    push_line(&mut out, "Connection: close");
    push_line(&mut out, "Proxy-Connection: close");
    push_line(&mut out, &format!("User-Agent: {}", USER_AGENT));

    for line in client_headers.iter().filter(|line| !is_replaced(line)) {
        push_line(&mut out, line);
    }

    out.extend_from_slice(b"\r\n");
    out
}
