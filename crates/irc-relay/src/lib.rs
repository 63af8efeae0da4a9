//! Sanitizing IRC relay.
//!
//! Sits between plaintext IRC clients and a single upstream server reached
//! over TLS. Every message flowing through a session is decoded, passed
//! through [`irc_sanitizer::sanitize`], and re-encoded.
//!
//! # Architecture
//!
//! ```text
//! Client  <--TCP-->  irc-relay  <--TLS-->  Upstream
//!                        |
//!                  [two pumps per session]
//!                        |
//!                   [sanitizer]
//! ```
//!
//! The [`Proxy`] accepts connections and starts one session per client.
//! A session dials the upstream through a [`Dialer`] and runs two
//! concurrent pumps (client-to-upstream and upstream-to-client). The first
//! pump to fail ends the session and both connections are closed.

pub mod dialer;
pub mod listener;
pub mod relay;
pub mod session;

pub use dialer::{AsyncStream, Dialer, TcpDialer, TlsDialer, UpstreamStream};
pub use listener::{Proxy, ProxyConfig};
pub use relay::{pump, Direction, RelayError};
pub use session::run_session;
