//! Serial transport seam toward the host.

/// Byte-level access to the host serial link.
///
/// This is a raw byte pipe: no framing is assumed at this layer. The
/// bridge polls it every loop iteration, so implementations must never
/// block - `read_byte` is only called after `bytes_available` reports
/// data, and `write_byte` is expected to complete in bounded time (a
/// hardware FIFO or interrupt-fed buffer behind it).
pub trait SerialPort {
    /// Number of received bytes ready to read without blocking.
    ///
    /// Implementations that cannot count buffered bytes may return any
    /// non-zero value while data is ready; the bridge only tests for
    /// emptiness.
    fn bytes_available(&mut self) -> usize;

    /// Read one received byte, or `None` if nothing is buffered.
    fn read_byte(&mut self) -> Option<u8>;

    /// Write one byte toward the host.
    fn write_byte(&mut self, byte: u8);
}
