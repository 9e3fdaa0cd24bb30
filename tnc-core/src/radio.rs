//! Radio link seam and the packet value exchanged across it.

/// Largest payload the transceiver moves in one over-the-air packet.
///
/// Sized below the CC1101's 61-byte FIFO ceiling; one serial-side KISS
/// frame may span several radio packets.
pub const MAX_RADIO_PACKET_LEN: usize = 48;

/// Error type for radio operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RadioError {
    /// Transceiver failed to initialize or identify itself.
    Init,
    /// SPI/register transaction failed.
    Io,
    /// Payload would exceed [`MAX_RADIO_PACKET_LEN`].
    PacketTooLong,
}

/// A transient over-the-air packet: payload bytes plus receive
/// metadata.
///
/// Created fresh per send or receive and discarded afterwards; never
/// persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RadioPacket {
    data: [u8; MAX_RADIO_PACKET_LEN],
    len: usize,
    /// Hardware CRC verdict for a received packet. Packets failing CRC
    /// are discarded by the bridge, never forwarded to the host.
    pub crc_ok: bool,
    /// Raw RSSI status byte appended by the transceiver on receive.
    /// Decode with [`rssi_dbm`](crate::link_quality::rssi_dbm).
    pub rssi_raw: u8,
    /// Raw LQI status byte appended on receive (low 7 bits). Decode
    /// with [`lqi`](crate::link_quality::lqi).
    pub lqi_raw: u8,
}

impl RadioPacket {
    /// Create an empty packet.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            data: [0u8; MAX_RADIO_PACKET_LEN],
            len: 0,
            crc_ok: true,
            rssi_raw: 0,
            lqi_raw: 0,
        }
    }

    /// Create a packet holding `payload`.
    ///
    /// Returns [`RadioError::PacketTooLong`] if the payload exceeds
    /// [`MAX_RADIO_PACKET_LEN`].
    pub fn from_payload(payload: &[u8]) -> Result<Self, RadioError> {
        if payload.len() > MAX_RADIO_PACKET_LEN {
            return Err(RadioError::PacketTooLong);
        }
        let mut packet = Self::new();
        packet.data[..payload.len()].copy_from_slice(payload);
        packet.len = payload.len();
        Ok(packet)
    }

    /// Append one payload byte.
    pub fn push(&mut self, byte: u8) -> Result<(), RadioError> {
        if self.len == MAX_RADIO_PACKET_LEN {
            return Err(RadioError::PacketTooLong);
        }
        self.data[self.len] = byte;
        self.len += 1;
        Ok(())
    }

    /// Payload bytes.
    #[inline]
    #[must_use]
    pub fn payload(&self) -> &[u8] {
        &self.data[..self.len]
    }

    /// Payload length in bytes.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    /// True if the packet carries no payload.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl Default for RadioPacket {
    fn default() -> Self {
        Self::new()
    }
}

/// Access to the physical radio transceiver.
///
/// The register-level driver behind this trait is an external
/// collaborator; the bridge only needs packet-granularity send and
/// receive plus control over the receive notification source.
///
/// `mask_receive_irq` / `unmask_receive_irq` bracket the bridge's two
/// critical regions (receive-intake drain and the send call) so the
/// notification cannot fire mid-transaction and corrupt shared
/// transceiver state. Implementations whose notification path cannot
/// preempt the bridge may make these no-ops.
pub trait RadioLink {
    /// Fetch the packet the transceiver has buffered, if any.
    ///
    /// Called after a receive notification, with the notification
    /// source masked.
    fn receive(&mut self) -> Result<Option<RadioPacket>, RadioError>;

    /// Transmit one packet. Blocks for the (short) duration of the
    /// transmission.
    fn send(&mut self, packet: &RadioPacket) -> Result<(), RadioError>;

    /// Suppress the packet-received notification.
    fn mask_receive_irq(&mut self);

    /// Re-enable the packet-received notification.
    fn unmask_receive_irq(&mut self);
}
