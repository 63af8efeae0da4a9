use std::fmt;

use futures_util::{Sink, SinkExt, Stream, StreamExt};
use irc_codec::{CodecError, Message};
use irc_sanitizer::{sanitize, RuleTable, SanitizeError};
use tracing::debug;

/// Direction of message flow through a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Client -> upstream server
    ClientToUpstream,
    /// Upstream server -> client
    UpstreamToClient,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ClientToUpstream => write!(f, "client->upstream"),
            Self::UpstreamToClient => write!(f, "upstream->client"),
        }
    }
}

/// Why a pump or a whole session stopped.
///
/// Every variant is terminal: a session never outlives its first error.
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    /// The upstream could not be reached; no pump was started.
    #[error("failed to connect to upstream {addr}: {source}")]
    Connect {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    /// The source side reached a clean end of stream.
    #[error("{direction}: connection closed by peer")]
    Closed { direction: Direction },

    /// Reading or parsing a frame failed.
    #[error("{direction}: read failed: {source}")]
    Decode {
        direction: Direction,
        #[source]
        source: CodecError,
    },

    /// Serializing or writing a frame failed.
    #[error("{direction}: write failed: {source}")]
    Encode {
        direction: Direction,
        #[source]
        source: CodecError,
    },

    /// A message violated its command's shape requirements and was dropped.
    #[error("{direction}: dropped malformed message: {source}")]
    Sanitize {
        direction: Direction,
        #[source]
        source: SanitizeError,
    },

    /// A pump task panicked.
    #[error("relay task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl RelayError {
    /// `true` for an orderly hang-up by either peer.
    pub fn is_clean_close(&self) -> bool {
        matches!(self, Self::Closed { .. })
    }

    /// The direction that failed, if the error came from a pump.
    pub fn direction(&self) -> Option<Direction> {
        match self {
            Self::Closed { direction }
            | Self::Decode { direction, .. }
            | Self::Encode { direction, .. }
            | Self::Sanitize { direction, .. } => Some(*direction),
            Self::Connect { .. } | Self::Task(_) => None,
        }
    }
}

/// Move messages from `source` to `sink` until something fails.
///
/// Each iteration decodes one message, sanitizes it against `rules`, and
/// sends it (write + flush) before the next decode, so at most one message
/// is in flight and arrival order is kept. The pump never returns
/// successfully; the returned value is the failure that stopped it.
pub async fn pump<R, W>(
    mut source: R,
    mut sink: W,
    rules: &RuleTable,
    direction: Direction,
) -> RelayError
where
    R: Stream<Item = Result<Message, CodecError>> + Unpin,
    W: Sink<Message, Error = CodecError> + Unpin,
{
    let mut forwarded: u64 = 0;

    let err = loop {
        let msg = match source.next().await {
            Some(Ok(msg)) => msg,
            Some(Err(source)) => break RelayError::Decode { direction, source },
            None => break RelayError::Closed { direction },
        };

        let msg = match sanitize(msg, rules) {
            Ok(msg) => msg,
            Err(source) => break RelayError::Sanitize { direction, source },
        };

        if let Err(source) = sink.send(msg).await {
            break RelayError::Encode { direction, source };
        }
        forwarded += 1;
    };

    debug!(%direction, forwarded, %err, "pump stopped");
    err
}
