//! Line-Ending Transcoding
//!
//! Pure byte transforms between LF and CRLF text. Every result is a fresh,
//! NUL-terminated [`ClipboardPayload`]; input is never modified.
//!
//! Allocation goes through `try_reserve_exact` so an oversized request comes
//! back as [`ClipboardError::Transcode`] instead of aborting the process.

use crate::clipboard::error::{ClipboardError, Result};
use crate::clipboard::formats::{ClipboardPayload, LineEnding};

fn alloc(capacity: usize) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    buf.try_reserve_exact(capacity).map_err(|e| {
        ClipboardError::Transcode(format!("cannot allocate {} bytes: {}", capacity, e))
    })?;
    Ok(buf)
}

/// Number of `\n` bytes not preceded by `\r`
fn lone_lf_count(text: &[u8]) -> usize {
    let mut count = 0;
    let mut prev = 0u8;
    for &b in text {
        if b == b'\n' && prev != b'\r' {
            count += 1;
        }
        prev = b;
    }
    count
}

/// Convert every lone `\n` to `\r\n`.
///
/// Existing `\r\n` pairs are kept, so the transform is idempotent.
pub fn to_crlf(text: &[u8]) -> Result<ClipboardPayload> {
    let mut out = alloc(text.len() + lone_lf_count(text) + 1)?;
    let mut prev = 0u8;
    for &b in text {
        if b == b'\n' && prev != b'\r' {
            out.push(b'\r');
        }
        out.push(b);
        prev = b;
    }
    out.push(0);
    Ok(ClipboardPayload::from_nul_terminated(out))
}

/// Convert every `\r\n` to `\n`. A lone `\r` passes through.
pub fn to_lf(text: &[u8]) -> Result<ClipboardPayload> {
    let mut out = alloc(text.len() + 1)?;
    let mut iter = text.iter().copied().peekable();
    while let Some(b) = iter.next() {
        if b == b'\r' && iter.peek() == Some(&b'\n') {
            continue;
        }
        out.push(b);
    }
    out.push(0);
    Ok(ClipboardPayload::from_nul_terminated(out))
}

/// Convert `text` from one convention to another
pub fn convert(text: &[u8], from: LineEnding, to: LineEnding) -> Result<ClipboardPayload> {
    match (from, to) {
        (LineEnding::Lf, LineEnding::Crlf) => to_crlf(text),
        (LineEnding::Crlf, LineEnding::Lf) => to_lf(text),
        _ => {
            let mut out = alloc(text.len() + 1)?;
            out.extend_from_slice(text);
            out.push(0);
            Ok(ClipboardPayload::from_nul_terminated(out))
        }
    }
}

/// Content before the first NUL byte, or all of it
pub fn until_nul(text: &[u8]) -> &[u8] {
    match text.iter().position(|&b| b == 0) {
        Some(end) => &text[..end],
        None => text,
    }
}
