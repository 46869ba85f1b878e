//! Listener / Dispatcher
//!
//! Accept loop that hands every inbound connection to its own detached worker.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::{TcpListener, ToSocketAddrs};
use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::cache::CacheStore;
use crate::error::Result;
use crate::proxy::Worker;

// == Dispatcher ==
/// Owns the listening socket and the process-wide cache.
///
/// There is no connection limit: each accepted connection gets a new task
/// that is never joined.
#[derive(Debug)]
pub struct Dispatcher {
    listener: TcpListener,
    cache: Arc<CacheStore>,
}

impl Dispatcher {
    pub fn new(listener: TcpListener, cache: Arc<CacheStore>) -> Self {
        Self { listener, cache }
    }

    /// Binds `addr` and wraps it in a Dispatcher.
    pub async fn bind<A: ToSocketAddrs>(addr: A, cache: Arc<CacheStore>) -> Result<Self> {
        let listener = TcpListener::bind(addr).await?;
        Ok(Self::new(listener, cache))
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// The cache shared with every worker.
    pub fn cache(&self) -> &Arc<CacheStore> {
        &self.cache
    }

    // == Run ==
    /// Accepts connections forever.
    ///
    /// Accept failures are logged and the loop keeps going.
    pub async fn run(self) {
        loop {
            match self.listener.accept().await {
                Ok((stream, peer)) => {
                    info!("Accepted connection from {}", peer);
                    let worker = Worker::new(Arc::clone(&self.cache));
                    tokio::spawn(async move { worker.serve(stream, peer).await });
                }
                Err(e) => error!("Failed to accept connection: {}", e),
            }
        }
    }

    /// Runs the accept loop on its own task.
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }
}
