use std::io;
use std::net::SocketAddr;
use std::sync::Arc;

use irc_sanitizer::RuleTable;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::broadcast;
use tracing::{debug, info, info_span, warn, Instrument};

use crate::dialer::Dialer;
use crate::session::run_session;

/// Configuration for the relay listener.
pub struct ProxyConfig {
    /// Address to bind the plaintext listening socket to.
    pub listen_addr: String,
    /// Address of the upstream IRC server, as `host:port`.
    pub upstream_addr: String,
    /// Opens the upstream side of every session.
    pub dialer: Arc<dyn Dialer>,
    /// Command rules applied in both directions.
    pub rules: &'static RuleTable,
    /// Longest frame accepted from either side, in bytes.
    pub max_line_length: usize,
}

/// The relay server.
///
/// Accepts plaintext client connections and runs one session per client,
/// each with its own upstream connection.
pub struct Proxy {
    listener: TcpListener,
    config: Arc<ProxyConfig>,
}

impl Proxy {
    /// Bind the listening socket.
    pub async fn bind(config: ProxyConfig) -> io::Result<Self> {
        let listener = TcpListener::bind(&config.listen_addr).await?;
        Ok(Self {
            listener,
            config: Arc::new(config),
        })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Accept connections until `shutdown` fires.
    ///
    /// Each connection is handled in its own task; a failed session never
    /// affects the listener. An accept error is returned to the caller.
    pub async fn serve(self, mut shutdown: broadcast::Receiver<()>) -> io::Result<()> {
        info!(
            addr = %self.local_addr()?,
            upstream = %self.config.upstream_addr,
            "relay listening"
        );

        loop {
            let (stream, remote_addr) = tokio::select! {
                accepted = self.listener.accept() => accepted?,
                _ = shutdown.recv() => {
                    info!("relay listener stopping");
                    return Ok(());
                }
            };

            let config = Arc::clone(&self.config);
            tokio::spawn(handle_connection(stream, remote_addr, config));
        }
    }
}

/// Handle a single client from accept through session teardown.
async fn handle_connection(stream: TcpStream, remote_addr: SocketAddr, config: Arc<ProxyConfig>) {
    let session_id = uuid::Uuid::new_v4();
    let span = info_span!("session", %session_id, %remote_addr);

    async move {
        info!("client connected");
        if let Err(err) = stream.set_nodelay(true) {
            debug!(%err, "failed to set TCP_NODELAY on client socket");
        }

        let err = run_session(
            stream,
            config.dialer.as_ref(),
            &config.upstream_addr,
            config.rules,
            config.max_line_length,
        )
        .await;

        if err.is_clean_close() {
            info!(%err, "session closed");
        } else {
            warn!(%err, "session ended with error");
        }
    }
    .instrument(span)
    .await
}
