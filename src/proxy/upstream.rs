//! Upstream Connector
//!
//! One TCP connection to an origin server with line-oriented reads.

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;

use crate::error::{ProxyError, Result};
use crate::proxy::MAX_LINE;

/// Reads up to and including the next `\n`, but never more than `limit` bytes.
///
/// A longer line comes back in `limit`-sized pieces. Returns 0 at EOF.
pub async fn read_line_bounded<R>(reader: &mut R, buf: &mut Vec<u8>, limit: usize) -> Result<usize>
where
    R: AsyncBufRead + Unpin,
{
    buf.clear();
    let n = reader.take(limit as u64).read_until(b'\n', buf).await?;
    Ok(n)
}

// == Upstream Connection ==
/// Connection to an origin server, closed when dropped.
#[derive(Debug)]
pub struct UpstreamConnection {
    stream: BufReader<TcpStream>,
}

impl UpstreamConnection {
    /// Opens a connection to `host:port`, resolving the name if needed.
    pub async fn connect(host: &str, port: u16) -> Result<Self> {
        let stream = TcpStream::connect((host, port))
            .await
            .map_err(|source| ProxyError::Connect {
                host: host.to_string(),
                port,
                source,
            })?;
        Ok(Self {
            stream: BufReader::new(stream),
        })
    }

    /// Reads one response line into `buf`. Returns 0 once the origin closes.
    pub async fn read_line(&mut self, buf: &mut Vec<u8>) -> Result<usize> {
        read_line_bounded(&mut self.stream, buf, MAX_LINE).await
    }

    pub async fn write_all(&mut self, bytes: &[u8]) -> Result<()> {
        self.stream.write_all(bytes).await?;
        self.stream.flush().await?;
        Ok(())
    }
}
