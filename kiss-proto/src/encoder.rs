//! Stateless KISS frame encoder.
//!
//! Produces `FEND, 0x00, <escaped payload>, FEND`: a data frame on HDLC
//! port 0. The command byte is emitted verbatim (escaping applies to
//! payload bytes only), and every payload byte value round-trips
//! through [`KissDecoder`](crate::KissDecoder).

use crate::{FEND, FESC, MAX_FRAME_LEN, TFEND, TFESC};

/// Worst-case encoded size of a maximum-length frame: every payload
/// byte escaped, plus two delimiters and the command byte.
pub const MAX_ENCODED_LEN: usize = 2 * MAX_FRAME_LEN + 3;

/// Error type for frame encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum EncodeError {
    /// Output buffer too small for the escaped frame.
    BufferTooSmall,
}

/// Exact encoded size of `payload`, delimiters and command byte
/// included.
#[must_use]
pub fn encoded_len(payload: &[u8]) -> usize {
    let escapes = payload
        .iter()
        .filter(|&&b| b == FEND || b == FESC)
        .count();
    payload.len() + escapes + 3
}

/// Encode `payload` as a KISS data frame into `out`.
///
/// Returns the number of bytes written. The whole frame is written in
/// one call so the transport sees it atomically; no other frame's bytes
/// can interleave.
pub fn encode(payload: &[u8], out: &mut [u8]) -> Result<usize, EncodeError> {
    if out.len() < encoded_len(payload) {
        return Err(EncodeError::BufferTooSmall);
    }

    out[0] = FEND;
    out[1] = 0x00; // port 0, command DATA
    let mut pos = 2;
    for &b in payload {
        match b {
            FEND => {
                out[pos] = FESC;
                out[pos + 1] = TFEND;
                pos += 2;
            }
            FESC => {
                out[pos] = FESC;
                out[pos + 1] = TFESC;
                pos += 2;
            }
            _ => {
                out[pos] = b;
                pos += 1;
            }
        }
    }
    out[pos] = FEND;
    Ok(pos + 1)
}

/// Encode `payload` into a `heapless::Vec`.
#[cfg(feature = "heapless")]
pub fn encode_to_vec<const N: usize>(
    payload: &[u8],
) -> Result<heapless::Vec<u8, N>, EncodeError> {
    let mut out = heapless::Vec::new();
    out.resize_default(encoded_len(payload))
        .map_err(|_| EncodeError::BufferTooSmall)?;
    let len = encode(payload, &mut out)?;
    out.truncate(len);
    Ok(out)
}
