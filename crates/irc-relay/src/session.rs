use irc_codec::IrcCodec;
use irc_sanitizer::RuleTable;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio_util::codec::{FramedRead, FramedWrite};
use tracing::{debug, Instrument};

use crate::dialer::Dialer;
use crate::relay::{pump, Direction, RelayError};

/// Relay one client connection through a freshly dialed upstream.
///
/// Runs a client->upstream and an upstream->client pump concurrently. The
/// first pump to stop decides the result; the other is aborted at once,
/// which drops its stream halves and closes both connections before this
/// function returns. If the dial fails, no pump starts and `client` is
/// dropped on the way out.
pub async fn run_session<C>(
    client: C,
    dialer: &dyn Dialer,
    upstream_addr: &str,
    rules: &'static RuleTable,
    max_line_length: usize,
) -> RelayError
where
    C: AsyncRead + AsyncWrite + Send + Unpin + 'static,
{
    let upstream = match dialer.dial(upstream_addr).await {
        Ok(stream) => stream,
        Err(source) => {
            drop(client);
            return RelayError::Connect {
                addr: upstream_addr.to_string(),
                source,
            };
        }
    };
    let codec = IrcCodec::with_max_line_length(max_line_length);
    debug!(
        upstream = upstream_addr,
        max_line_length = codec.max_line_length(),
        "upstream connected"
    );

    let (client_read, client_write) = tokio::io::split(client);
    let (upstream_read, upstream_write) = tokio::io::split(upstream);

    let mut to_upstream = tokio::spawn(
        pump(
            FramedRead::new(client_read, codec.clone()),
            FramedWrite::new(upstream_write, codec.clone()),
            rules,
            Direction::ClientToUpstream,
        )
        .in_current_span(),
    );
    let mut to_client = tokio::spawn(
        pump(
            FramedRead::new(upstream_read, codec.clone()),
            FramedWrite::new(client_write, codec),
            rules,
            Direction::UpstreamToClient,
        )
        .in_current_span(),
    );

    let (first, laggard) = tokio::select! {
        result = &mut to_upstream => (result, to_client),
        result = &mut to_client => (result, to_upstream),
    };

    // The laggard is usually parked on a read; aborting drops its halves and
    // with them the last handle on each connection. Its outcome is discarded.
    laggard.abort();
    let _ = laggard.await;

    first.unwrap_or_else(RelayError::Task)
}
