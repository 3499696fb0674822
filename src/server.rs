//! TCP Server Module
//!
//! Binds the listener and spawns one connection task per accepted client.
//! Every task shares the same storage engine and connection statistics.

use crate::commands::CommandHandler;
use crate::connection::{handle_connection, ConnectionStats};
use crate::storage::StorageEngine;
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::{TcpListener, ToSocketAddrs};
use tracing::{debug, error, info};

/// A bound flashmc server.
pub struct Server {
    listener: TcpListener,
    storage: Arc<StorageEngine>,
    stats: Arc<ConnectionStats>,
}

impl Server {
    /// Binds the listener. Fails if the address is unusable or taken.
    pub async fn bind(
        addr: impl ToSocketAddrs,
        storage: Arc<StorageEngine>,
        stats: Arc<ConnectionStats>,
    ) -> io::Result<Self> {
        let listener = TcpListener::bind(addr).await?;

        Ok(Self {
            listener,
            storage,
            stats,
        })
    }

    /// The address the listener is bound to.
    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Accepts connections until the future is dropped.
    ///
    /// A failed accept is logged and the loop carries on.
    pub async fn run(self) {
        if let Ok(addr) = self.listener.local_addr() {
            info!(address = %addr, "Server listening");
        }

        loop {
            match self.listener.accept().await {
                Ok((stream, addr)) => {
                    debug!(peer = %addr, "New connection");

                    if let Err(e) = stream.set_nodelay(true) {
                        debug!(peer = %addr, error = %e, "Failed to set TCP_NODELAY");
                    }

                    let handler = CommandHandler::new(Arc::clone(&self.storage));
                    let stats = Arc::clone(&self.stats);

                    tokio::spawn(async move {
                        handle_connection(stream, addr, handler, stats).await;
                    });
                }
                Err(e) => {
                    error!(error = %e, "Failed to accept connection");
                }
            }
        }
    }
}
