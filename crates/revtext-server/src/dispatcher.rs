//! Accept loop, worker registry, and coordinated shutdown.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;

use revtext_common::protocol::{Result, RevtextError};

use crate::session::handle_connection;

/// Default per-chunk processing delay (models bounded server-side work).
pub const DEFAULT_PROCESSING_DELAY: Duration = Duration::from_millis(500);
/// How long shutdown waits for in-flight workers before aborting them.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

static NEXT_WORKER_ID: AtomicU64 = AtomicU64::new(0);

/// TCP server for the reversal exchange.
///
/// Accepts connections in a loop raced against the shutdown signal and
/// spawns one independent worker per connection; the dispatcher never
/// blocks on any single connection's lifetime. Live workers are tracked
/// strictly for coordinated shutdown. Since each worker task owns its
/// socket, aborting the task is also the forcible close of its connection.
///
/// # Example
///
/// ```no_run
/// use revtext_server::Dispatcher;
///
/// # async fn example() -> revtext_common::Result<()> {
/// let dispatcher = Dispatcher::bind("0.0.0.0:9400").await?;
/// let handle = dispatcher.shutdown_handle();
/// tokio::spawn(async move {
///     tokio::signal::ctrl_c().await.ok();
///     handle.shutdown();
/// });
/// dispatcher.run().await
/// # }
/// ```
pub struct Dispatcher {
    listener: TcpListener,
    shutdown_tx: Arc<watch::Sender<bool>>,
    workers: Mutex<HashMap<u64, JoinHandle<()>>>,
    processing_delay: Duration,
}

impl Dispatcher {
    /// Bind to `addr` (e.g. "0.0.0.0:9400"; port 0 picks a free port).
    pub async fn bind(addr: &str) -> Result<Self> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| RevtextError::Connection(format!("Failed to bind to {}: {}", addr, e)))?;
        let (shutdown_tx, _) = watch::channel(false);

        Ok(Self {
            listener,
            shutdown_tx: Arc::new(shutdown_tx),
            workers: Mutex::new(HashMap::new()),
            processing_delay: DEFAULT_PROCESSING_DELAY,
        })
    }

    /// Override the per-chunk processing delay.
    pub fn with_processing_delay(mut self, delay: Duration) -> Self {
        self.processing_delay = delay;
        self
    }

    /// The actual bound address.
    pub fn local_addr(&self) -> Result<SocketAddr> {
        self.listener
            .local_addr()
            .map_err(|e| RevtextError::Connection(format!("Failed to get local addr: {}", e)))
    }

    /// A handle that triggers coordinated shutdown of a running dispatcher.
    pub fn shutdown_handle(&self) -> ShutdownHandle {
        ShutdownHandle {
            tx: self.shutdown_tx.clone(),
        }
    }

    /// Accept connections until shutdown is requested, then drain workers.
    pub async fn run(self) -> Result<()> {
        let mut shutdown_rx = self.shutdown_tx.subscribe();
        tracing::info!(
            "Reversal server listening on {}, waiting for connections",
            self.local_addr()?
        );

        loop {
            tokio::select! {
                accepted = self.listener.accept() => {
                    match accepted {
                        Ok((stream, peer)) => self.spawn_worker(stream, peer).await,
                        Err(e) => tracing::error!("Failed to accept connection: {}", e),
                    }
                }
                _ = shutdown_rx.changed() => break,
            }
        }

        self.drain_workers().await;
        tracing::info!("Server stopped");
        Ok(())
    }

    async fn spawn_worker(&self, stream: TcpStream, peer: SocketAddr) {
        let id = NEXT_WORKER_ID.fetch_add(1, Ordering::SeqCst);
        let shutdown_rx = self.shutdown_tx.subscribe();
        let delay = self.processing_delay;

        tracing::info!("Client {} connected", peer);
        let handle = tokio::spawn(async move {
            match handle_connection(stream, peer, shutdown_rx, delay).await {
                Ok(()) => tracing::info!("Client {} disconnected", peer),
                Err(e) => tracing::error!("Session with {} failed: {}", peer, e),
            }
        });

        let mut workers = self.workers.lock().await;
        // Reap entries whose sessions already ended; the registry only needs
        // to cover workers that are still live at shutdown.
        workers.retain(|_, worker| !worker.is_finished());
        workers.insert(id, handle);
    }

    /// Give in-flight workers a bounded grace period, then abort stragglers.
    ///
    /// The shutdown flag is already set when this runs, which stops new
    /// work and unblocks every worker's pending read. Aborting a straggler
    /// drops its socket, closing the connection abruptly.
    async fn drain_workers(&self) {
        let workers: Vec<(u64, JoinHandle<()>)> =
            self.workers.lock().await.drain().collect();
        let live = workers.iter().filter(|(_, w)| !w.is_finished()).count();
        tracing::info!(
            "Waiting up to {:?} for {} active connections to finish",
            SHUTDOWN_GRACE,
            live
        );

        let deadline = tokio::time::Instant::now() + SHUTDOWN_GRACE;
        for (id, mut handle) in workers {
            let remaining = deadline.saturating_duration_since(tokio::time::Instant::now());
            match tokio::time::timeout(remaining, &mut handle).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => tracing::error!("Worker {} panicked: {}", id, e),
                Err(_) => {
                    tracing::warn!(
                        "Worker {} did not exit within the grace period, aborting",
                        id
                    );
                    handle.abort();
                }
            }
        }
    }
}

/// Triggers coordinated shutdown of a running [`Dispatcher`].
///
/// Cloneable and cheap; typically wired to Ctrl+C in the binary and called
/// directly in tests.
#[derive(Clone)]
pub struct ShutdownHandle {
    tx: Arc<watch::Sender<bool>>,
}

impl ShutdownHandle {
    /// Flip the shutdown flag: the accept loop stops taking new work and
    /// in-flight sessions abort at their next read or chunk boundary.
    pub fn shutdown(&self) {
        tracing::info!("Shutdown requested, no new connections will be accepted");
        let _ = self.tx.send(true);
    }
}
