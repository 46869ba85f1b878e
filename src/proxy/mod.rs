//! Proxy Module
//!
//! The per-connection pipeline and the accept loop that drives it.
//!
//! # Flow
//! Dispatcher accepts a connection and spawns a detached Worker. The Worker
//! reads the request, serves it from the cache when it can, and otherwise
//! relays it to the origin, caching small responses on the way back.

mod listener;
mod request;
mod upstream;
mod worker;

pub use listener::Dispatcher;
pub use request::{
    build_outbound_header, parse_uri, RequestLine, Target, DEFAULT_HTTP_PORT, USER_AGENT,
};
pub use upstream::{read_line_bounded, UpstreamConnection};
pub use worker::{Outcome, Worker};

/// Longest line read in one piece from either peer
pub const MAX_LINE: usize = 8192;

/// Cap on the client's request header block
pub const MAX_HEADER_BYTES: usize = 64 * 1024;
