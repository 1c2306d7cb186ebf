use log::{debug, error, info, warn};
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::io::AsyncWriteExt;
use tokio::net::tcp::OwnedWriteHalf;
use tokio::net::{TcpListener, TcpStream};

use crate::client::{Registry, handle_client};
use crate::config::ServerConfig;
use crate::error::{Rejected, ServerError};
use crate::protocol::responses::SERVER_FULL;

/// Registry of TCP clients as used by the server
pub type ChatRegistry = Registry<OwnedWriteHalf>;

pub struct Server {
    registry: Arc<ChatRegistry>,
    listener: TcpListener,
    config: Arc<ServerConfig>,
}

impl Server {
    /// Binds the listener and creates an empty registry sized by
    /// `max_clients`.
    pub async fn bind(config: ServerConfig) -> Result<Self, ServerError> {
        let addr = config.listen_addr();
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|e| ServerError::Bind(addr.clone(), e))?;
        info!("Server bound to {}", addr);

        let registry =
            Registry::new(config.max_clients).with_send_timeout(config.send_timeout());

        Ok(Self {
            registry: Arc::new(registry),
            listener,
            config: Arc::new(config),
        })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    pub fn registry(&self) -> Arc<ChatRegistry> {
        Arc::clone(&self.registry)
    }

    /// Runs the accept loop until Ctrl-C.
    pub async fn start(&self) {
        self.run_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!("Failed to listen for shutdown signal: {}", e);
                std::future::pending::<()>().await;
            }
        })
        .await;
    }

    /// Runs the accept loop until `shutdown` resolves.
    pub async fn run_until<F>(&self, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        info!(
            "Starting chat server on {} (max {} clients)",
            self.config.listen_addr(),
            self.registry.capacity()
        );

        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                accepted = self.listener.accept() => match accepted {
                    Ok((stream, addr)) => {
                        let registry = Arc::clone(&self.registry);
                        let config = Arc::clone(&self.config);

                        // Spawn a task for each client so accept loop doesn't block
                        tokio::spawn(handle_new_client(stream, addr, registry, config));
                    }
                    Err(e) => {
                        error!("Error accepting connection: {}", e);
                    }
                },
                _ = &mut shutdown => {
                    info!("Shutdown requested, no longer accepting connections");
                    break;
                }
            }
        }
    }
}

/// Registers a new connection and runs its session, or turns it away when
/// every slot is taken.
async fn handle_new_client(
    stream: TcpStream,
    client_addr: SocketAddr,
    registry: Arc<ChatRegistry>,
    config: Arc<ServerConfig>,
) {
    if let Err(e) = stream.set_nodelay(true) {
        warn!("Failed to set TCP_NODELAY for {}: {}", client_addr, e);
    }

    let (read_half, write_half) = stream.into_split();

    match registry.insert(write_half).await {
        Ok(membership) => {
            info!(
                "Client {} assigned slot {}",
                client_addr,
                membership.client.slot_id()
            );
            let reason =
                handle_client(read_half, registry, membership, config.max_line_length).await;
            info!("Session for {} ended: {:?}", client_addr, reason);
        }
        Err(Rejected { mut writer }) => {
            warn!(
                "Rejected client {}: server is full ({} clients)",
                client_addr,
                registry.capacity()
            );
            if let Err(e) = writer.write_all(SERVER_FULL.as_bytes()).await {
                warn!("Failed to notify rejected client {}: {}", client_addr, e);
            }
            if let Err(e) = writer.shutdown().await {
                debug!("Shutdown of rejected connection {} failed: {}", client_addr, e);
            }
        }
    }
}
