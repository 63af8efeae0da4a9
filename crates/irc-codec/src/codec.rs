use std::borrow::Cow;

use bytes::{BufMut, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

use crate::message::{EncodeError, Message, ParseError};

/// Default upper bound on a single frame, terminator excluded.
///
/// RFC 1459 caps a line at 512 bytes, IRCv3 adds up to 8191 bytes of tags;
/// the default leaves room for both with margin for servers that overshoot.
pub const DEFAULT_MAX_LINE_LENGTH: usize = 16 * 1024;

/// Errors produced while reading or writing frames.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("frame exceeds {limit} bytes")]
    LineTooLong { limit: usize },

    #[error("stream ended in the middle of a frame")]
    UnterminatedFrame,

    #[error("malformed frame: {0}")]
    Malformed(#[from] ParseError),

    #[error("cannot encode message: {0}")]
    Encode(#[from] EncodeError),
}

/// Line codec for IRC traffic.
///
/// Decodes `\n`- or `\r\n`-terminated frames into [`Message`] values,
/// skipping blank lines, and encodes messages as `\r\n`-terminated lines.
/// A stray `\r` or NUL inside a frame is decoded as U+FFFD, like any other
/// byte that cannot be carried on the wire.
#[derive(Debug, Clone)]
pub struct IrcCodec {
    max_line_length: usize,
    /// Offset up to which the buffer is known to contain no `\n`.
    next_index: usize,
}

impl IrcCodec {
    pub fn new() -> Self {
        Self::with_max_line_length(DEFAULT_MAX_LINE_LENGTH)
    }

    pub fn with_max_line_length(max_line_length: usize) -> Self {
        Self {
            max_line_length,
            next_index: 0,
        }
    }

    pub fn max_line_length(&self) -> usize {
        self.max_line_length
    }
}

impl Default for IrcCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder for IrcCodec {
    type Item = Message;
    type Error = CodecError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Message>, CodecError> {
        loop {
            let Some(offset) = src[self.next_index..].iter().position(|b| *b == b'\n') else {
                // One extra byte of slack for a `\r` still waiting on its `\n`.
                if src.len() > self.max_line_length + 1 {
                    return Err(CodecError::LineTooLong {
                        limit: self.max_line_length,
                    });
                }
                self.next_index = src.len();
                return Ok(None);
            };

            let newline = self.next_index + offset;
            self.next_index = 0;

            let frame = src.split_to(newline + 1);
            let line = strip_terminator(&frame);
            if line.len() > self.max_line_length {
                return Err(CodecError::LineTooLong {
                    limit: self.max_line_length,
                });
            }

            let text = String::from_utf8_lossy(line);
            if text.trim_matches(|c| c == ' ' || c == '\r').is_empty() {
                continue;
            }

            return Ok(Some(Message::parse(&replace_stray_controls(text))?));
        }
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Message>, CodecError> {
        if let Some(msg) = self.decode(src)? {
            return Ok(Some(msg));
        }
        if src.iter().all(|b| matches!(b, b' ' | b'\r')) {
            src.clear();
            self.next_index = 0;
            return Ok(None);
        }
        Err(CodecError::UnterminatedFrame)
    }
}

impl Encoder<Message> for IrcCodec {
    type Error = CodecError;

    fn encode(&mut self, msg: Message, dst: &mut BytesMut) -> Result<(), CodecError> {
        let line = msg.to_line()?;
        dst.reserve(line.len() + 2);
        dst.put_slice(line.as_bytes());
        dst.put_slice(b"\r\n");
        Ok(())
    }
}

fn replace_stray_controls(text: Cow<'_, str>) -> Cow<'_, str> {
    if text.contains(['\r', '\0']) {
        Cow::Owned(text.replace(['\r', '\0'], "\u{FFFD}"))
    } else {
        text
    }
}

fn strip_terminator(frame: &[u8]) -> &[u8] {
    let line = frame.strip_suffix(b"\n").unwrap_or(frame);
    line.strip_suffix(b"\r").unwrap_or(line)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::Prefix;

    fn decode_all(codec: &mut IrcCodec, buf: &mut BytesMut) -> Vec<Message> {
        let mut out = Vec::new();
        while let Some(msg) = codec.decode(buf).unwrap() {
            out.push(msg);
        }
        out
    }

    #[test]
    fn decodes_crlf_and_bare_lf_frames() {
        let mut codec = IrcCodec::new();
        let mut buf = BytesMut::from("PING :a\r\nPING :b\n");
        let msgs = decode_all(&mut codec, &mut buf);
        assert_eq!(msgs.len(), 2);
        assert_eq!(msgs[0].params, vec!["a"]);
        assert_eq!(msgs[1].params, vec!["b"]);
        assert!(buf.is_empty());
    }

    #[test]
    fn waits_for_terminator_across_reads() {
        let mut codec = IrcCodec::new();
        let mut buf = BytesMut::from("PRIVMSG #c :hel");
        assert!(codec.decode(&mut buf).unwrap().is_none());

        buf.extend_from_slice(b"lo\r\n");
        let msg = codec.decode(&mut buf).unwrap().unwrap();
        assert_eq!(msg.params, vec!["#c", "hello"]);
    }

    #[test]
    fn skips_blank_lines() {
        let mut codec = IrcCodec::new();
        let mut buf = BytesMut::from("\r\n  \r\n\nNICK bob\r\n");
        let msg = codec.decode(&mut buf).unwrap().unwrap();
        assert_eq!(msg.command, "NICK");
    }

    #[test]
    fn invalid_utf8_is_replaced() {
        let mut codec = IrcCodec::new();
        let mut buf = BytesMut::from(&b"PRIVMSG #c :caf\xe9\r\n"[..]);
        let msg = codec.decode(&mut buf).unwrap().unwrap();
        assert_eq!(msg.params[1], "caf\u{FFFD}");
    }

    #[test]
    fn stray_cr_and_nul_are_replaced() {
        let mut codec = IrcCodec::new();
        let mut buf = BytesMut::from(&b"PRIVMSG #c :a\x00b\r\nPRIVMSG #c :a\rb\r\n"[..]);
        let msgs = decode_all(&mut codec, &mut buf);
        assert_eq!(msgs.len(), 2);
        assert_eq!(msgs[0].params[1], "a\u{FFFD}b");
        assert_eq!(msgs[1].params[1], "a\u{FFFD}b");

        let mut dst = BytesMut::new();
        for msg in msgs {
            codec.encode(msg, &mut dst).unwrap();
        }
        assert_eq!(&dst[..], "PRIVMSG #c a\u{FFFD}b\r\nPRIVMSG #c a\u{FFFD}b\r\n".as_bytes());
    }

    #[test]
    fn line_of_carriage_returns_is_blank() {
        let mut codec = IrcCodec::new();
        let mut buf = BytesMut::from("\r\r\nPING :x\r\n");
        let msgs = decode_all(&mut codec, &mut buf);
        assert_eq!(msgs.len(), 1);
        assert_eq!(msgs[0].command, "PING");
    }

    #[test]
    fn rejects_oversized_terminated_line() {
        let mut codec = IrcCodec::with_max_line_length(16);
        let mut buf = BytesMut::from("PRIVMSG #c :this is far too long\r\n");
        assert!(matches!(
            codec.decode(&mut buf),
            Err(CodecError::LineTooLong { limit: 16 })
        ));
    }

    #[test]
    fn rejects_oversized_partial_line() {
        let mut codec = IrcCodec::with_max_line_length(8);
        let mut buf = BytesMut::from("PRIVMSG #c :still going");
        assert!(matches!(
            codec.decode(&mut buf),
            Err(CodecError::LineTooLong { limit: 8 })
        ));
    }

    #[test]
    fn line_limit_defaults_and_overrides() {
        assert_eq!(IrcCodec::default().max_line_length(), DEFAULT_MAX_LINE_LENGTH);
        assert_eq!(IrcCodec::with_max_line_length(1024).max_line_length(), 1024);
    }

    #[test]
    fn line_at_limit_is_accepted() {
        let mut codec = IrcCodec::with_max_line_length(8);
        let mut buf = BytesMut::from("PING :ab\r\n");
        assert!(codec.decode(&mut buf).unwrap().is_some());
    }

    #[test]
    fn malformed_frame_is_an_error() {
        let mut codec = IrcCodec::new();
        let mut buf = BytesMut::from(":only.a.prefix\r\n");
        assert!(matches!(
            codec.decode(&mut buf),
            Err(CodecError::Malformed(ParseError::MissingCommand))
        ));
    }

    #[test]
    fn eof_with_partial_frame_is_an_error() {
        let mut codec = IrcCodec::new();
        let mut buf = BytesMut::from("PING :half");
        assert!(matches!(
            codec.decode_eof(&mut buf),
            Err(CodecError::UnterminatedFrame)
        ));
    }

    #[test]
    fn clean_eof_ends_the_stream() {
        let mut codec = IrcCodec::new();
        let mut buf = BytesMut::from("PING :x\r\n\r");
        assert!(codec.decode_eof(&mut buf).unwrap().is_some());
        assert!(codec.decode_eof(&mut buf).unwrap().is_none());
        assert!(buf.is_empty());
    }

    #[test]
    fn encodes_with_crlf() {
        let mut codec = IrcCodec::new();
        let mut dst = BytesMut::new();
        let msg = Message::new("PRIVMSG", ["#c", "hi there"]).with_prefix(Prefix::new("srv"));
        codec.encode(msg, &mut dst).unwrap();
        assert_eq!(&dst[..], b":srv PRIVMSG #c :hi there\r\n");
    }

    #[test]
    fn encode_refuses_frame_injection() {
        let mut codec = IrcCodec::new();
        let mut dst = BytesMut::new();
        let msg = Message::new("PRIVMSG", ["#c", "a\nQUIT"]);
        assert!(matches!(
            codec.encode(msg, &mut dst),
            Err(CodecError::Encode(EncodeError::ForbiddenChar { .. }))
        ));
        assert!(dst.is_empty());
    }

    #[tokio::test]
    async fn framed_read_yields_messages_then_ends() {
        use futures_util::StreamExt;
        use tokio::io::AsyncWriteExt;
        use tokio_util::codec::FramedRead;

        let (mut tx, rx) = tokio::io::duplex(64);
        let mut frames = FramedRead::new(rx, IrcCodec::new());

        tx.write_all(b"NICK alice\r\nUSER a 0 * :Alice\r\n").await.unwrap();
        drop(tx);

        let first = frames.next().await.unwrap().unwrap();
        let second = frames.next().await.unwrap().unwrap();
        assert_eq!(first.command, "NICK");
        assert_eq!(second.params, vec!["a", "0", "*", "Alice"]);
        assert!(frames.next().await.is_none());
    }
}
