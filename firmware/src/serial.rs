//! Host serial transport over the RP2040's buffered UART.

use embassy_rp::uart::BufferedUart;
use embedded_io::{Read, ReadReady, Write};
use tnc_core::SerialPort;

/// `SerialPort` implementation backed by an interrupt-buffered UART.
///
/// The interrupt handler keeps the hardware FIFO drained into the
/// driver's ring buffer, so the bridge's polled reads never miss bytes
/// between iterations.
pub struct HostSerial<'d> {
    uart: BufferedUart<'d>,
}

impl<'d> HostSerial<'d> {
    /// Wrap a configured buffered UART.
    pub fn new(uart: BufferedUart<'d>) -> Self {
        Self { uart }
    }
}

impl SerialPort for HostSerial<'_> {
    fn bytes_available(&mut self) -> usize {
        // The buffered driver reports readiness, not a count; the
        // bridge only tests for emptiness.
        match self.uart.read_ready() {
            Ok(true) => 1,
            _ => 0,
        }
    }

    fn read_byte(&mut self) -> Option<u8> {
        if !matches!(self.uart.read_ready(), Ok(true)) {
            return None;
        }
        let mut byte = [0u8; 1];
        match self.uart.read(&mut byte) {
            Ok(n) if n > 0 => Some(byte[0]),
            _ => None,
        }
    }

    fn write_byte(&mut self, byte: u8) {
        // Write errors have no recovery path here; the next poll
        // retries naturally with fresh data.
        let _ = self.uart.write_all(&[byte]);
    }
}
