//! Platform-agnostic core of a KISS TNC bridge.
//!
//! This crate contains everything between the serial port and the radio
//! that does not touch hardware:
//!
//! - [`serial`]: the [`SerialPort`] seam toward the host
//! - [`radio`]: the [`RadioLink`] seam toward the transceiver and the
//!   [`RadioPacket`] value it exchanges
//! - [`flag`]: the single [`ReceiveFlag`] shared with the receive
//!   notification handler
//! - [`bridge`]: the [`Bridge`] control loop - bounded queues, transmit
//!   pacing, chunking, and overrun policy
//! - [`link_quality`]: RSSI/LQI decoding of the transceiver's status
//!   bytes
//!
//! The bridge is a transparent byte pipe: KISS framing produced by the
//! host crosses the radio link unmodified and is reassembled by the
//! peer's host. Framing itself lives in the `kiss-proto` crate.
//!
//! # Features
//!
//! - **`std`**: Enable standard library support (for host testing)
//! - **`defmt`**: Enable defmt formatting (for embedded logging)
//!
//! # No-std Support
//!
//! This crate is `#![no_std]` by default and uses no heap allocations,
//! making it suitable for embedded systems with limited resources.

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(any(feature = "std", test))]
extern crate std;

pub mod bridge;
pub mod flag;
pub mod link_quality;
pub mod radio;
pub mod serial;

pub use bridge::{Bridge, BridgeCounters, INBOUND_QUEUE_LEN, OUTBOUND_QUEUE_LEN, TX_HOLDOFF_MS};
pub use flag::ReceiveFlag;
pub use link_quality::{lqi, rssi_dbm};
pub use radio::{RadioError, RadioLink, RadioPacket, MAX_RADIO_PACKET_LEN};
pub use serial::SerialPort;
