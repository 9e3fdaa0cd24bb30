//! KISS TNC framing for serial packet-radio links.
//!
//! KISS carries link-layer packets over a raw serial byte stream using a
//! frame delimiter and a two-byte escape scheme:
//!
//! ```text
//! FEND <port|command> <escaped payload bytes...> FEND
//! ```
//!
//! This crate provides the two halves of the protocol engine:
//!
//! - [`KissDecoder`] - a byte-at-a-time state machine that turns an
//!   incoming serial stream into complete, unescaped payloads
//! - [`encode`] - stateless framing of a payload into an escaped,
//!   delimited byte stream
//!
//! # Example
//!
//! ```
//! use kiss_proto::{encode, KissDecoder};
//!
//! let mut framed = [0u8; 16];
//! let len = encode(&[0x41, 0xC0, 0x42], &mut framed).unwrap();
//!
//! let mut decoder = KissDecoder::new();
//! let mut decoded = None;
//! for &b in &framed[..len] {
//!     if let Some(frame) = decoder.feed(b) {
//!         decoded = Some((frame.port, frame.payload.len()));
//!         assert_eq!(frame.payload, &[0x41, 0xC0, 0x42]);
//!     }
//! }
//! assert_eq!(decoded, Some((0, 3)));
//! ```
//!
//! # Features
//!
//! - **`std`**: Enable standard library support (for host testing)
//! - **`defmt`**: Enable defmt formatting (for embedded logging)
//! - **`heapless`**: Enable `encode_to_vec()`
//!
//! # No-std Support
//!
//! This crate is `#![no_std]` by default and uses no heap allocations.

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(any(feature = "std", test))]
extern crate std;

pub mod decoder;
pub mod encoder;

pub use decoder::{Frame, KissDecoder};
pub use encoder::{encode, encoded_len, EncodeError, MAX_ENCODED_LEN};
#[cfg(feature = "heapless")]
pub use encoder::encode_to_vec;

/// Frame delimiter: marks the start and end of every KISS frame.
pub const FEND: u8 = 0xC0;

/// Escape marker: the following byte is an escaped literal.
pub const FESC: u8 = 0xDB;

/// Escaped form of [`FEND`] (follows an [`FESC`]).
pub const TFEND: u8 = 0xDC;

/// Escaped form of [`FESC`] (follows an [`FESC`]).
pub const TFESC: u8 = 0xDD;

/// Maximum decoded frame payload, sized for the largest AX.25 frame.
///
/// ax25.net recommends a 1 kB buffer; 330 covers the maximum AX.25
/// frame and matches deployed TNCs this implementation interoperates
/// with.
pub const MAX_FRAME_LEN: usize = 330;

/// KISS command code, taken from the low nibble of a frame's first byte.
///
/// Only [`Command::Data`] frames carry payload through the decoder; the
/// remaining codes are recognized so a conforming host can send them,
/// but they have no effect (this TNC has no software-controlled timing
/// parameters).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Command {
    /// Data frame (0x0): the payload is a link-layer packet.
    Data,
    /// Transmitter keyup delay (0x1).
    TxDelay,
    /// CSMA persistence parameter (0x2).
    Persistence,
    /// CSMA slot time (0x3).
    SlotTime,
    /// Transmitter tail time (0x4).
    TxTail,
    /// Full-duplex flag (0x5).
    FullDuplex,
    /// Hardware-specific command (0x6).
    SetHardware,
    /// Exit KISS mode (0xF).
    Return,
    /// Any other command nibble.
    Other(u8),
    /// No command byte has been read for the current frame yet.
    Unknown,
}

impl Command {
    /// Decode a command nibble (the low four bits of the frame's first
    /// byte).
    #[must_use]
    pub fn from_nibble(nibble: u8) -> Self {
        match nibble & 0x0F {
            0x0 => Command::Data,
            0x1 => Command::TxDelay,
            0x2 => Command::Persistence,
            0x3 => Command::SlotTime,
            0x4 => Command::TxTail,
            0x5 => Command::FullDuplex,
            0x6 => Command::SetHardware,
            0xF => Command::Return,
            other => Command::Other(other),
        }
    }
}
