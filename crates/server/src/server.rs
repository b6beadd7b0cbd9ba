//! Listener loop and per-connection request handling.

use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use rfshare_file_service::FileService;
use rfshare_protocol::constants::ERR_SHUTTING_DOWN;
use rfshare_protocol::{Request, RequestFrame, read_frame, write_frame};
use tokio::io::{BufReader, BufWriter};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::ServerError;
use crate::dispatch::dispatch;

/// Port used when none is configured.
pub const DEFAULT_PORT: u16 = 8000;

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind (port 0 = OS-assigned).
    pub bind_addr: SocketAddr,
}

impl ServerConfig {
    /// Binds all interfaces on `port`.
    pub fn with_port(port: u16) -> Self {
        Self {
            bind_addr: ([0, 0, 0, 0], port).into(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self::with_port(DEFAULT_PORT)
    }
}

/// Serves a single [`FileService`] over TCP.
///
/// Connections are independent: each one gets its own task and its calls
/// are answered strictly in order. Calls from different connections run
/// concurrently and are not serialized against each other.
pub struct FileServer {
    bind_addr: SocketAddr,
    service: FileService,
    cancel: CancellationToken,
    local_addr: Mutex<Option<SocketAddr>>,
    running: AtomicBool,
}

impl FileServer {
    pub fn new(config: ServerConfig, service: FileService) -> Arc<Self> {
        Arc::new(Self {
            bind_addr: config.bind_addr,
            service,
            cancel: CancellationToken::new(),
            local_addr: Mutex::new(None),
            running: AtomicBool::new(false),
        })
    }

    /// Returns the local address the server is listening on.
    ///
    /// Only available after [`run`](Self::run) binds the socket.
    pub async fn local_addr(&self) -> Option<SocketAddr> {
        *self.local_addr.lock().await
    }

    /// Stops accepting connections and unbinds the listener.
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }

    /// Returns `true` once shutdown has been requested.
    pub fn is_shut_down(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Runs the server until shutdown.
    ///
    /// Returns once the listener has been dropped. Connection tasks finish
    /// the call they are serving and then exit.
    pub async fn run(self: &Arc<Self>) -> Result<(), ServerError> {
        if self.running.swap(true, Ordering::SeqCst) {
            return Err(ServerError::AlreadyRunning);
        }

        let listener = TcpListener::bind(self.bind_addr).await?;
        let local_addr = listener.local_addr()?;
        *self.local_addr.lock().await = Some(local_addr);
        info!(
            root = %self.service.root().display(),
            "file server listening on {local_addr}"
        );

        loop {
            tokio::select! {
                _ = self.cancel.cancelled() => {
                    info!("server shutting down");
                    break;
                }

                result = listener.accept() => {
                    match result {
                        Ok((stream, peer_addr)) => {
                            let server = Arc::clone(self);
                            tokio::spawn(async move {
                                if let Err(e) = server.handle_connection(stream, peer_addr).await {
                                    tracing::error!(%peer_addr, "connection error: {e}");
                                }
                            });
                        }
                        Err(e) => {
                            tracing::error!("accept error: {e}");
                        }
                    }
                }
            }
        }

        drop(listener);
        *self.local_addr.lock().await = None;
        info!("server unbound from {local_addr}");
        Ok(())
    }

    async fn handle_connection(
        &self,
        stream: TcpStream,
        peer_addr: SocketAddr,
    ) -> Result<(), ServerError> {
        stream.set_nodelay(true)?;
        debug!(%peer_addr, "client connected");

        let (reader, writer) = stream.into_split();
        let mut reader = BufReader::new(reader);
        let mut writer = BufWriter::new(writer);

        loop {
            let next = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => break,
                result = read_frame::<_, RequestFrame>(&mut reader) => result?,
            };
            let Some(frame) = next else {
                debug!(%peer_addr, "client disconnected");
                break;
            };

            if self.cancel.is_cancelled() {
                let reply = frame.reply_error(ERR_SHUTTING_DOWN, "server is shutting down");
                write_frame(&mut writer, &reply).await?;
                break;
            }

            let reply = dispatch(&self.service, &frame).await;
            write_frame(&mut writer, &reply).await?;

            if matches!(frame.request, Request::Shutdown) {
                info!(%peer_addr, "shutdown requested by client");
                self.cancel.cancel();
                break;
            }
        }

        Ok(())
    }
}
