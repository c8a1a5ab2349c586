//! Frame boundary detection
//!
//! Decides, from the bytes received so far, whether a complete response
//! is available.
//!
//! ## Response Shapes
//! ```text
//! STATUS [meta ...]\r\n                          (no body)
//! RESERVED <id> <n>\r\n<n bytes>\r\n             (body length in meta[1])
//! FOUND <id> <n>\r\n<n bytes>\r\n                (body length in meta[1])
//! OK <n>\r\n<n bytes>\r\n                        (body length in meta[0])
//! ```
//!
//! Bodies are binary and may themselves contain `\r\n`, so only the first
//! terminator delimits the status line; the rest is length-driven.

use super::Status;

/// Line terminator
pub const CRLF: &[u8] = b"\r\n";

/// Length of the line terminator
pub const CRLF_LEN: usize = 2;

/// Position of the first `\r\n` in `buf`
pub fn find_crlf(buf: &[u8]) -> Option<usize> {
    buf.windows(CRLF_LEN).position(|w| w == CRLF)
}

/// Number of additional bytes required before `buf` holds a complete
/// response. Zero means complete.
///
/// While the status line itself is unfinished, the value is only a lower
/// bound (the bytes needed to terminate the line); treat it as "keep
/// reading", not as an exact count.
pub fn bytes_needed(buf: &[u8]) -> usize {
    match frame_len(buf) {
        Some(total) => total.saturating_sub(buf.len()),
        None if buf.last() == Some(&b'\r') => 1,
        None => CRLF_LEN,
    }
}

/// Total length of the first response in `buf`, once its status line is
/// complete
///
/// Unrecognized statuses and unreadable length tokens count as bodiless.
/// A declared length too large to address saturates at `usize::MAX`, so
/// such a frame never reads as complete.
pub fn frame_len(buf: &[u8]) -> Option<usize> {
    let head_end = find_crlf(buf)?;
    let head_len = head_end + CRLF_LEN;

    match body_len_in_head(&buf[..head_end]) {
        Some(body_len) => Some(
            head_len
                .checked_add(body_len)
                .and_then(|len| len.checked_add(CRLF_LEN))
                .unwrap_or(usize::MAX),
        ),
        None => Some(head_len),
    }
}

/// Body length declared by the status line, if the line is complete and
/// its status carries a body
pub fn declared_body_len(buf: &[u8]) -> Option<usize> {
    let head_end = find_crlf(buf)?;
    body_len_in_head(&buf[..head_end])
}

fn body_len_in_head(head: &[u8]) -> Option<usize> {
    let head = std::str::from_utf8(head).ok()?;
    let mut tokens = head.split_ascii_whitespace();
    let status = Status::parse(tokens.next()?);
    let index = status.body_len_index()?;
    tokens.nth(index)?.parse().ok()
}
