//! RP2040 glue for the KISS TNC bridge.
//!
//! The platform-agnostic control loop lives in `tnc-core`; this crate
//! provides the two hardware seams it needs:
//!
//! - [`HostSerial`]: `SerialPort` over a buffered UART toward the host
//! - [`Cc1101Radio`]: `RadioLink` over SPI to the CC1101 transceiver

#![no_std]

pub mod cc1101;
pub mod serial;

pub use cc1101::Cc1101Radio;
pub use serial::HostSerial;
