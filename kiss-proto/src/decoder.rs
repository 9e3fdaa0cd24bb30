//! Byte-at-a-time KISS frame decoder.
//!
//! The decoder is fed one raw serial byte at a time and emits a
//! complete, unescaped payload whenever a data frame closes. Malformed
//! input never raises an error: any frame delimiter resynchronizes the
//! state machine, and oversized frames are silently truncated at
//! [`MAX_FRAME_LEN`](crate::MAX_FRAME_LEN).

use crate::{Command, FEND, FESC, MAX_FRAME_LEN, TFEND, TFESC};

/// A decoded KISS data frame, borrowed from the decoder's buffer.
///
/// Valid until the next call to [`KissDecoder::feed`].
#[derive(Debug, PartialEq, Eq)]
#[must_use]
pub struct Frame<'a> {
    /// HDLC port number from the high nibble of the command byte.
    pub port: u8,
    /// Unescaped frame payload. May be empty.
    pub payload: &'a [u8],
}

/// Decoder state for one KISS byte stream.
///
/// One long-lived instance per serial link; the buffer is reused across
/// frames. Between frames only `buffer[..frame_len]` is meaningful.
pub struct KissDecoder {
    buffer: [u8; MAX_FRAME_LEN],
    frame_len: usize,
    in_escape: bool,
    in_frame: bool,
    command: Command,
    hdlc_port: u8,
}

impl KissDecoder {
    /// Create a decoder in the out-of-frame state.
    #[must_use]
    pub fn new() -> Self {
        Self {
            buffer: [0u8; MAX_FRAME_LEN],
            frame_len: 0,
            in_escape: false,
            in_frame: false,
            command: Command::Unknown,
            hdlc_port: 0,
        }
    }

    /// The command code of the frame currently being decoded, or
    /// [`Command::Unknown`] before the command byte has arrived.
    #[inline]
    #[must_use]
    pub fn command(&self) -> Command {
        self.command
    }

    /// True while the decoder is between a frame-start and frame-end
    /// delimiter.
    #[inline]
    #[must_use]
    pub fn in_frame(&self) -> bool {
        self.in_frame
    }

    /// Feed one byte from the serial stream.
    ///
    /// Returns a completed [`Frame`] when this byte closed a data
    /// frame; the payload borrow is valid until the next `feed` call.
    ///
    /// Two consecutive delimiters read as "start a new frame", not "end
    /// then restart" - the standard tolerance for back-to-back and
    /// keep-alive delimiters means an empty delimiter pair emits
    /// nothing.
    pub fn feed(&mut self, byte: u8) -> Option<Frame<'_>> {
        if self.in_frame && byte == FEND && self.command == Command::Data {
            // End of a data frame.
            self.in_frame = false;
            return Some(Frame {
                port: self.hdlc_port >> 4,
                payload: &self.buffer[..self.frame_len],
            });
        }

        if byte == FEND {
            // Start of a frame (also resynchronizes after garbage or a
            // non-data frame).
            self.in_frame = true;
            self.command = Command::Unknown;
            self.frame_len = 0;
            return None;
        }

        // Bytes past the buffer capacity are dropped; the frame keeps
        // its header state so the closing delimiter still emits the
        // truncated payload.
        if self.in_frame && self.frame_len < MAX_FRAME_LEN {
            if self.frame_len == 0 && self.command == Command::Unknown {
                self.hdlc_port = byte & 0xF0;
                self.command = Command::from_nibble(byte);
            } else if self.command == Command::Data {
                if byte == FESC {
                    self.in_escape = true;
                } else {
                    let mut b = byte;
                    if self.in_escape {
                        if b == TFEND {
                            b = FEND;
                        }
                        if b == TFESC {
                            b = FESC;
                        }
                        self.in_escape = false;
                    }
                    self.buffer[self.frame_len] = b;
                    self.frame_len += 1;
                }
            }
            // Non-data commands carry no payload here: their parameter
            // bytes are recognized but inert.
        }

        None
    }
}

impl Default for KissDecoder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Feed a byte slice, collecting every emitted payload.
    fn feed_all(decoder: &mut KissDecoder, bytes: &[u8]) -> std::vec::Vec<std::vec::Vec<u8>> {
        let mut frames = std::vec::Vec::new();
        for &b in bytes {
            if let Some(frame) = decoder.feed(b) {
                frames.push(frame.payload.to_vec());
            }
        }
        frames
    }

    #[test]
    fn test_simple_data_frame() {
        let mut decoder = KissDecoder::new();
        let frames = feed_all(&mut decoder, &[0xC0, 0x00, 0x41, 0x42, 0xC0]);
        assert_eq!(frames, [[0x41, 0x42]]);
    }

    #[test]
    fn test_empty_delimiter_pair_emits_nothing() {
        // FEND FEND is "start a new frame", not a zero-length packet.
        let mut decoder = KissDecoder::new();
        assert!(feed_all(&mut decoder, &[0xC0, 0xC0]).is_empty());
        assert!(decoder.in_frame());
    }

    #[test]
    fn test_empty_data_frame_has_length_zero() {
        let mut decoder = KissDecoder::new();
        let frames = feed_all(&mut decoder, &[0xC0, 0x00, 0xC0]);
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].len(), 0);
    }

    #[test]
    fn test_escaped_fend_restored() {
        let mut decoder = KissDecoder::new();
        let frames = feed_all(&mut decoder, &[0xC0, 0x00, 0xDB, 0xDC, 0xC0]);
        assert_eq!(frames, [[0xC0]]);
    }

    #[test]
    fn test_escaped_fesc_restored() {
        let mut decoder = KissDecoder::new();
        let frames = feed_all(&mut decoder, &[0xC0, 0x00, 0xDB, 0xDD, 0xC0]);
        assert_eq!(frames, [[0xDB]]);
    }

    #[test]
    fn test_invalid_escape_passes_byte_through() {
        // FESC followed by anything other than TFEND/TFESC is a
        // protocol violation; the byte is stored unchanged.
        let mut decoder = KissDecoder::new();
        let frames = feed_all(&mut decoder, &[0xC0, 0x00, 0xDB, 0x41, 0xC0]);
        assert_eq!(frames, [[0x41]]);
    }

    #[test]
    fn test_non_data_command_emits_nothing() {
        // TXDELAY frame: the parameter byte is not accumulated and the
        // closing delimiter does not emit.
        let mut decoder = KissDecoder::new();
        let frames = feed_all(&mut decoder, &[0xC0, 0x01, 0x32, 0x33, 0xC0]);
        assert!(frames.is_empty());
        // The closing FEND opened a fresh frame instead.
        assert!(decoder.in_frame());
        assert_eq!(decoder.command(), Command::Unknown);
    }

    #[test]
    fn test_non_data_then_data_frame() {
        let mut decoder = KissDecoder::new();
        let frames = feed_all(
            &mut decoder,
            &[0xC0, 0x05, 0x01, 0xC0, 0x00, 0x41, 0xC0],
        );
        assert_eq!(frames, [[0x41]]);
    }

    #[test]
    fn test_port_nibble_extracted() {
        let mut decoder = KissDecoder::new();
        let mut port = None;
        for &b in &[0xC0, 0x50, 0x41, 0xC0] {
            if let Some(frame) = decoder.feed(b) {
                port = Some(frame.port);
                assert_eq!(frame.payload, &[0x41]);
            }
        }
        assert_eq!(port, Some(5));
    }

    #[test]
    fn test_command_byte_not_stored() {
        let mut decoder = KissDecoder::new();
        decoder.feed(0xC0);
        decoder.feed(0x00);
        assert_eq!(decoder.command(), Command::Data);
        let frames = feed_all(&mut decoder, &[0xC0]);
        assert_eq!(frames[0].len(), 0);
    }

    #[test]
    fn test_oversized_frame_truncated_at_capacity() {
        let mut decoder = KissDecoder::new();
        decoder.feed(0xC0);
        decoder.feed(0x00);
        // 400 payload bytes, 70 beyond capacity. Values stay clear of
        // FEND/FESC so nothing terminates the frame early.
        for i in 0..400u16 {
            assert!(decoder.feed((i % 64 + 1) as u8).is_none());
        }
        let frame = decoder.feed(0xC0).expect("truncated frame still emits");
        assert_eq!(frame.payload.len(), MAX_FRAME_LEN);
        // The retained prefix is intact.
        for (i, &b) in frame.payload.iter().enumerate() {
            assert_eq!(b, (i % 64 + 1) as u8);
        }
    }

    #[test]
    fn test_bytes_outside_frames_ignored() {
        // Garbage before the first delimiter never reaches the buffer.
        let mut decoder = KissDecoder::new();
        let frames = feed_all(&mut decoder, &[0x41, 0x42, 0xC0, 0x00, 0x43, 0xC0]);
        assert_eq!(frames, [[0x43]]);
    }

    #[test]
    fn test_back_to_back_frames_share_one_delimiter_pair() {
        // A closing FEND leaves the decoder out-of-frame; the next
        // frame needs its own opening delimiter.
        let mut decoder = KissDecoder::new();
        let frames = feed_all(
            &mut decoder,
            &[0xC0, 0x00, 0x43, 0xC0, 0xC0, 0x00, 0x44, 0xC0],
        );
        assert_eq!(frames, [[0x43], [0x44]]);
    }

    #[test]
    fn test_decoder_reusable_across_frames() {
        let mut decoder = KissDecoder::new();
        let frames = feed_all(&mut decoder, &[0xC0, 0x00, 0x01, 0xC0]);
        assert_eq!(frames, [[0x01]]);
        let frames = feed_all(&mut decoder, &[0xC0, 0x00, 0x02, 0x03, 0xC0]);
        assert_eq!(frames, [[0x02, 0x03]]);
    }
}
