// Length-prefixed message framing.
//
// Every message on the wire is `<decimal byte length>:<json payload>` with no
// trailing newline. The codec knows nothing about message semantics: callers
// pick the type to serialize or deserialize.

use std::io::{self, BufRead, Read, Write};

use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;
use tracing::trace;

use crate::error::Result;

/// Largest payload accepted from the peer (64 MB). Stateless-mode messages
/// carry the whole map twice over, so this leaves room for big maps while
/// still refusing absurd length prefixes.
pub const MAX_MESSAGE_SIZE: usize = 64 * 1024 * 1024;

// Digits of MAX_MESSAGE_SIZE plus the colon plus some stray whitespace.
const LENGTH_FIELD_LIMIT: u64 = 32;

#[derive(Debug, Error)]
pub enum FramingError {
    #[error("stream closed")]
    Closed,
    #[error("stream ended inside the length field")]
    MissingDelimiter,
    #[error("invalid length field {0:?}")]
    InvalidLength(String),
    #[error("message too large: {0} bytes (max {MAX_MESSAGE_SIZE})")]
    TooLarge(usize),
    #[error("stream ended after {received} of {expected} payload bytes")]
    Truncated { expected: usize, received: usize },
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Serialize `msg` and wrap it in a frame.
pub fn encode<T: ?Sized + Serialize>(msg: &T) -> Result<Vec<u8>> {
    let payload = serde_json::to_vec(msg)?;
    let mut frame = format!("{}:", payload.len()).into_bytes();
    frame.extend_from_slice(&payload);
    Ok(frame)
}

/// Deserialize a complete frame produced by `encode`.
pub fn decode<T: DeserializeOwned>(mut frame: &[u8]) -> Result<T> {
    recv_message(&mut frame)
}

pub fn send_message<W, T>(stream: &mut W, msg: &T) -> Result<()>
where
    W: Write,
    T: ?Sized + Serialize,
{
    let frame = encode(msg)?;
    trace!("sending {}", String::from_utf8_lossy(&frame));
    stream.write_all(&frame)?;
    stream.flush()?;
    Ok(())
}

/// Read one frame and return its raw payload.
pub fn recv_frame<R: BufRead>(stream: &mut R) -> std::result::Result<Vec<u8>, FramingError> {
    let mut buf = vec![];
    (&mut *stream)
        .take(LENGTH_FIELD_LIMIT)
        .read_until(b':', &mut buf)?;

    if buf.last() != Some(&b':') {
        if buf.iter().all(u8::is_ascii_whitespace) {
            return Err(FramingError::Closed);
        }
        if buf.len() as u64 == LENGTH_FIELD_LIMIT {
            return Err(FramingError::InvalidLength(
                String::from_utf8_lossy(&buf).into_owned(),
            ));
        }
        return Err(FramingError::MissingDelimiter);
    }
    buf.pop(); // Drop colon

    let field = String::from_utf8_lossy(&buf);
    let len = field
        .trim()
        .parse::<usize>()
        .map_err(|_| FramingError::InvalidLength(field.trim().to_owned()))?;
    if len > MAX_MESSAGE_SIZE {
        return Err(FramingError::TooLarge(len));
    }

    // A pipe or socket may hand back fewer bytes than asked for.
    let mut payload = vec![0u8; len];
    let mut received = 0;
    while received < len {
        match stream.read(&mut payload[received..]) {
            Ok(0) => {
                return Err(FramingError::Truncated {
                    expected: len,
                    received,
                })
            }
            Ok(n) => received += n,
            Err(ref e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e.into()),
        }
    }
    trace!("received {}:{}", len, String::from_utf8_lossy(&payload));
    Ok(payload)
}

pub fn recv_message<R, T>(stream: &mut R) -> Result<T>
where
    R: BufRead,
    T: DeserializeOwned,
{
    let payload = recv_frame(stream)?;
    Ok(serde_json::from_slice(&payload)?)
}
