//! Protocol codec
//!
//! Decoding of complete response buffers, and blocking stream helpers.
//!
//! ## Wire Format
//!
//! ### Request
//! ```text
//! <command> [args ...]\r\n
//! put <pri> <delay> <ttr> <bytes>\r\n<body>\r\n
//! ```
//!
//! ### Response
//! ```text
//! <STATUS> [meta ...]\r\n[<body>\r\n]
//! ```

use std::io::{ErrorKind, Read, Write};

use bytes::{Bytes, BytesMut};

use super::frame::{find_crlf, frame_len, declared_body_len, CRLF, CRLF_LEN};
use super::{Reply, Request, Status};
use crate::error::{Result, StalkError};

/// Read chunk size for stream helpers
pub const READ_CHUNK_SIZE: usize = 8 * 1024;

// =============================================================================
// Response Decoding
// =============================================================================

/// Decode a complete response buffer
///
/// When `expected` is given and the status differs, the result is
/// `StalkError::Status` carrying the actual status.
pub fn decode_reply(buf: &[u8], expected: Option<&Status>) -> Result<Reply> {
    let head_end = find_crlf(buf).ok_or_else(|| {
        StalkError::Malformed(format!(
            "no line terminator in {} byte response",
            buf.len()
        ))
    })?;

    let head = std::str::from_utf8(&buf[..head_end])
        .map_err(|_| StalkError::Malformed("status line is not UTF-8".to_string()))?;

    let mut tokens = head.split_ascii_whitespace();
    let status = Status::parse(
        tokens
            .next()
            .ok_or_else(|| StalkError::Malformed("empty status line".to_string()))?,
    );
    let meta: Vec<String> = tokens.map(str::to_string).collect();

    let body = split_body(buf, head_end)?;

    if let Some(index) = status.body_len_index() {
        let declared: usize = meta
            .get(index)
            .and_then(|token| token.parse().ok())
            .ok_or_else(|| {
                StalkError::Malformed(format!("{} reply without a body length", status))
            })?;

        let actual = body.as_ref().map_or(0, Bytes::len);
        if body.is_none() || actual != declared {
            return Err(StalkError::Malformed(format!(
                "{} reply declares {} body bytes, got {}",
                status, declared, actual
            )));
        }
    }

    if let Some(expected) = expected {
        if &status != expected {
            return Err(StalkError::Status(status));
        }
    }

    Ok(Reply { status, meta, body })
}

/// Body bytes between the head terminator and the trailing terminator
fn split_body(buf: &[u8], head_end: usize) -> Result<Option<Bytes>> {
    let body_start = head_end + CRLF_LEN;
    if buf.len() <= body_start {
        return Ok(None);
    }

    if buf.len() < body_start + CRLF_LEN || !buf.ends_with(CRLF) {
        return Err(StalkError::Malformed(
            "body is not terminated by CRLF".to_string(),
        ));
    }

    Ok(Some(Bytes::copy_from_slice(
        &buf[body_start..buf.len() - CRLF_LEN],
    )))
}

// =============================================================================
// Stream-based I/O helpers
// =============================================================================

/// Write a request to a stream
pub fn write_request<W: Write>(writer: &mut W, request: &Request) -> Result<()> {
    writer.write_all(&request.encode())?;
    writer.flush()?;
    Ok(())
}

/// Split the first complete response off `buf`, if there is one
///
/// Fails when the declared body exceeds `max_body_size`.
pub fn take_frame(buf: &mut BytesMut, max_body_size: usize) -> Result<Option<Bytes>> {
    if let Some(body_len) = declared_body_len(buf) {
        if body_len > max_body_size {
            return Err(StalkError::Malformed(format!(
                "response body too large: {} bytes (max {})",
                body_len, max_body_size
            )));
        }
    }

    match frame_len(buf) {
        Some(usize::MAX) => Err(StalkError::Malformed(
            "declared body length overflows the frame size".to_string(),
        )),
        Some(len) if buf.len() >= len => Ok(Some(buf.split_to(len).freeze())),
        _ => Ok(None),
    }
}

/// Read one complete response from a stream
///
/// Blocks until a complete response is buffered. Bytes past the response
/// stay in `buf` for the next call.
pub fn read_frame<R: Read>(reader: &mut R, buf: &mut BytesMut, max_body_size: usize) -> Result<Bytes> {
    let mut chunk = [0u8; READ_CHUNK_SIZE];

    loop {
        if let Some(frame) = take_frame(buf, max_body_size)? {
            return Ok(frame);
        }

        let n = reader.read(&mut chunk)?;
        if n == 0 {
            return Err(StalkError::Io(std::io::Error::new(
                ErrorKind::UnexpectedEof,
                "connection closed mid-response",
            )));
        }
        buf.extend_from_slice(&chunk[..n]);
    }
}

/// Send a request and read back its reply, outside any pipeline
pub fn round_trip<S: Read + Write>(
    stream: &mut S,
    buf: &mut BytesMut,
    request: &Request,
    expected: Option<&Status>,
    max_body_size: usize,
) -> Result<Reply> {
    write_request(stream, request)?;
    let frame = read_frame(stream, buf, max_body_size)?;
    decode_reply(&frame, expected)
}
