//! The bridge control loop between host serial and radio.
//!
//! One [`poll`](Bridge::poll) runs four concerns in a fixed order,
//! never blocking:
//!
//! 1. radio-receive intake (notification consume, CRC gate, outbound
//!    queue fill)
//! 2. host ingress (serial to inbound queue, capacity-gated)
//! 3. paced radio transmit (chunked drain of the inbound queue)
//! 4. host egress (full drain of the outbound queue)
//!
//! The bridge moves raw bytes in both directions: KISS frames produced
//! by the host cross the air as-is, split across radio packets as
//! needed, and the peer host's own KISS layer reassembles them. Loss is
//! tolerated by design - queue overruns and CRC failures drop data and
//! bump a counter rather than stall the loop.

use log::{debug, warn};

use crate::flag::ReceiveFlag;
use crate::link_quality::{lqi, rssi_dbm};
use crate::radio::{RadioLink, RadioPacket, MAX_RADIO_PACKET_LEN};
use crate::serial::SerialPort;
use heapless::Deque;

/// Host-to-radio queue capacity. Holds comfortably more than one
/// maximum-length KISS frame so serial ingress never stalls mid-frame.
pub const INBOUND_QUEUE_LEN: usize = 400;

/// Radio-to-host queue capacity. At least two radio packets; drained
/// completely every iteration.
pub const OUTBOUND_QUEUE_LEN: usize = 100;

/// Minimum gap between radio transmissions in milliseconds.
///
/// The transceiver cannot interleave transmit and receive on shared
/// hardware state, and back-to-back transmissions would flood the
/// channel before the peer's settling time elapses.
pub const TX_HOLDOFF_MS: u64 = 20;

/// Monotonic diagnostic counters.
///
/// The bridge never halts on data loss; these surface what was dropped.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BridgeCounters {
    /// Radio packets accepted and queued toward the host.
    pub rx_packets: u32,
    /// Radio packets handed to the transmitter.
    pub tx_packets: u32,
    /// Received packets discarded for failing the hardware CRC.
    pub crc_discards: u32,
    /// Host bytes rejected because the inbound queue was full.
    pub inbound_overruns: u32,
    /// Radio bytes dropped because the outbound queue was full.
    pub outbound_overruns: u32,
}

/// The TNC control loop: owns both byte queues and coordinates the
/// serial and radio seams.
///
/// Single-threaded by construction - only the notification handler runs
/// concurrently, and it touches nothing but the [`ReceiveFlag`].
pub struct Bridge<'a, S: SerialPort, R: RadioLink> {
    serial: S,
    radio: R,
    rx_pending: &'a ReceiveFlag,
    inbound: Deque<u8, INBOUND_QUEUE_LEN>,
    outbound: Deque<u8, OUTBOUND_QUEUE_LEN>,
    last_tx_ms: u64,
    counters: BridgeCounters,
}

impl<'a, S: SerialPort, R: RadioLink> Bridge<'a, S, R> {
    /// Create a bridge over the given seams.
    ///
    /// `rx_pending` is the flag the radio's receive notification
    /// handler raises; it usually lives in a `static`.
    pub fn new(serial: S, radio: R, rx_pending: &'a ReceiveFlag) -> Self {
        Self {
            serial,
            radio,
            rx_pending,
            inbound: Deque::new(),
            outbound: Deque::new(),
            last_tx_ms: 0,
            counters: BridgeCounters::default(),
        }
    }

    /// Run one loop iteration.
    ///
    /// `now_ms` is a monotonic millisecond counter; the caller supplies
    /// it so the core stays clock-agnostic. Completes in bounded time -
    /// there are no blocking operations on this path.
    pub fn poll(&mut self, now_ms: u64) {
        self.intake_radio_rx();
        self.pump_host_ingress();
        self.pump_radio_tx(now_ms);
        self.drain_host_egress();
    }

    /// Diagnostic counters.
    #[must_use]
    pub fn counters(&self) -> BridgeCounters {
        self.counters
    }

    /// Bytes currently queued toward the radio.
    #[must_use]
    pub fn inbound_len(&self) -> usize {
        self.inbound.len()
    }

    /// Bytes currently queued toward the host.
    #[must_use]
    pub fn outbound_len(&self) -> usize {
        self.outbound.len()
    }

    /// Get a mutable reference to the serial seam.
    pub fn serial_mut(&mut self) -> &mut S {
        &mut self.serial
    }

    /// Get a mutable reference to the radio seam.
    pub fn radio_mut(&mut self) -> &mut R {
        &mut self.radio
    }

    /// Decompose the bridge into its serial and radio seams.
    pub fn into_parts(self) -> (S, R) {
        (self.serial, self.radio)
    }

    /// Concern 1: consume a pending receive notification.
    ///
    /// The whole drain runs with the notification masked so it cannot
    /// re-fire while the transceiver's FIFO state is in flux.
    fn intake_radio_rx(&mut self) {
        if !self.rx_pending.pending() {
            return;
        }
        self.radio.mask_receive_irq();
        self.rx_pending.clear();

        match self.radio.receive() {
            Ok(Some(packet)) => {
                if !packet.crc_ok {
                    self.counters.crc_discards += 1;
                    debug!("radio rx: dropping {} bytes, CRC failed", packet.len());
                } else if !packet.is_empty() {
                    self.counters.rx_packets += 1;
                    debug!(
                        "radio rx: {} bytes, rssi {} dBm, lqi {}",
                        packet.len(),
                        rssi_dbm(packet.rssi_raw),
                        lqi(packet.lqi_raw)
                    );
                    for &byte in packet.payload() {
                        if self.outbound.push_back(byte).is_err() {
                            // Loss accepted: abandon the rest of this
                            // packet rather than stall the loop.
                            self.counters.outbound_overruns += 1;
                            warn!("outbound queue overrun, rest of packet dropped");
                            break;
                        }
                    }
                }
            }
            Ok(None) => {}
            Err(_) => warn!("radio receive failed"),
        }

        self.radio.unmask_receive_irq();
    }

    /// Concern 2: move host bytes into the inbound queue.
    fn pump_host_ingress(&mut self) {
        while self.serial.bytes_available() > 0 && !self.inbound.is_full() {
            let Some(byte) = self.serial.read_byte() else {
                break;
            };
            if self.inbound.push_back(byte).is_err() {
                // Should not happen while the capacity guard holds.
                self.counters.inbound_overruns += 1;
                warn!("inbound queue overrun");
                break;
            }
        }
    }

    /// Concern 3: transmit one paced chunk of the inbound queue.
    fn pump_radio_tx(&mut self, now_ms: u64) {
        if now_ms.saturating_sub(self.last_tx_ms) <= TX_HOLDOFF_MS {
            return;
        }
        let chunk = self.inbound.len().min(MAX_RADIO_PACKET_LEN);
        if chunk == 0 {
            return;
        }

        let mut packet = RadioPacket::new();
        while packet.len() < chunk {
            let Some(byte) = self.inbound.pop_front() else {
                break;
            };
            if packet.push(byte).is_err() {
                break;
            }
        }

        // Same critical region as receive intake: the notification must
        // not fire during the send transaction.
        self.radio.mask_receive_irq();
        match self.radio.send(&packet) {
            Ok(()) => {
                self.counters.tx_packets += 1;
                debug!("radio tx: {} bytes", packet.len());
            }
            Err(_) => warn!("radio send failed, {} bytes dropped", packet.len()),
        }
        self.radio.unmask_receive_irq();
        self.last_tx_ms = now_ms;
    }

    /// Concern 4: drain everything queued toward the host.
    ///
    /// No pacing here - this direction is not bandwidth-limited by
    /// radio timing.
    fn drain_host_egress(&mut self) {
        while let Some(byte) = self.outbound.pop_front() {
            self.serial.write_byte(byte);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::radio::RadioError;
    use std::collections::VecDeque;
    use std::vec::Vec;

    struct MockSerial {
        rx: VecDeque<u8>,
        tx: Vec<u8>,
    }

    impl MockSerial {
        fn new() -> Self {
            Self {
                rx: VecDeque::new(),
                tx: Vec::new(),
            }
        }

        fn feed(&mut self, bytes: &[u8]) {
            self.rx.extend(bytes);
        }
    }

    impl SerialPort for MockSerial {
        fn bytes_available(&mut self) -> usize {
            self.rx.len()
        }

        fn read_byte(&mut self) -> Option<u8> {
            self.rx.pop_front()
        }

        fn write_byte(&mut self, byte: u8) {
            self.tx.push(byte);
        }
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum RadioCall {
        Mask,
        Unmask,
        Receive,
        Send,
    }

    struct MockRadio {
        pending_rx: VecDeque<RadioPacket>,
        sent: Vec<RadioPacket>,
        calls: Vec<RadioCall>,
        fail_send: bool,
    }

    impl MockRadio {
        fn new() -> Self {
            Self {
                pending_rx: VecDeque::new(),
                sent: Vec::new(),
                calls: Vec::new(),
                fail_send: false,
            }
        }
    }

    impl RadioLink for MockRadio {
        fn receive(&mut self) -> Result<Option<RadioPacket>, RadioError> {
            self.calls.push(RadioCall::Receive);
            Ok(self.pending_rx.pop_front())
        }

        fn send(&mut self, packet: &RadioPacket) -> Result<(), RadioError> {
            self.calls.push(RadioCall::Send);
            if self.fail_send {
                return Err(RadioError::Io);
            }
            self.sent.push(*packet);
            Ok(())
        }

        fn mask_receive_irq(&mut self) {
            self.calls.push(RadioCall::Mask);
        }

        fn unmask_receive_irq(&mut self) {
            self.calls.push(RadioCall::Unmask);
        }
    }

    fn received(payload: &[u8], crc_ok: bool) -> RadioPacket {
        let mut packet = RadioPacket::from_payload(payload).unwrap();
        packet.crc_ok = crc_ok;
        packet
    }

    #[test]
    fn test_radio_rx_reaches_host() {
        let flag = ReceiveFlag::new();
        let mut radio = MockRadio::new();
        radio.pending_rx.push_back(received(&[1, 2, 3], true));
        let mut bridge = Bridge::new(MockSerial::new(), radio, &flag);

        flag.notify();
        bridge.poll(0);

        assert_eq!(bridge.serial_mut().tx, [1, 2, 3]);
        assert!(!flag.pending());
        assert_eq!(bridge.counters().rx_packets, 1);
        assert_eq!(bridge.outbound_len(), 0);
    }

    #[test]
    fn test_crc_failed_packet_discarded() {
        let flag = ReceiveFlag::new();
        let mut radio = MockRadio::new();
        radio.pending_rx.push_back(received(&[1, 2, 3], false));
        let mut bridge = Bridge::new(MockSerial::new(), radio, &flag);

        flag.notify();
        bridge.poll(0);

        assert!(bridge.serial_mut().tx.is_empty());
        assert_eq!(bridge.counters().crc_discards, 1);
        assert_eq!(bridge.counters().rx_packets, 0);
    }

    #[test]
    fn test_no_notification_no_receive_call() {
        let flag = ReceiveFlag::new();
        let mut bridge = Bridge::new(MockSerial::new(), MockRadio::new(), &flag);

        bridge.poll(0);

        assert!(bridge.radio_mut().calls.is_empty());
    }

    #[test]
    fn test_receive_intake_runs_masked() {
        let flag = ReceiveFlag::new();
        let mut radio = MockRadio::new();
        radio.pending_rx.push_back(received(&[9], true));
        let mut bridge = Bridge::new(MockSerial::new(), radio, &flag);

        flag.notify();
        bridge.poll(0);

        assert_eq!(
            bridge.radio_mut().calls,
            [RadioCall::Mask, RadioCall::Receive, RadioCall::Unmask]
        );
    }

    #[test]
    fn test_outbound_overrun_drops_rest_of_packet() {
        let flag = ReceiveFlag::new();
        let mut radio = MockRadio::new();
        for _ in 0..3 {
            radio.pending_rx.push_back(received(&[0x55; 48], true));
        }
        let mut bridge = Bridge::new(MockSerial::new(), radio, &flag);

        // Drive intake directly so egress cannot drain between packets.
        for _ in 0..3 {
            flag.notify();
            bridge.intake_radio_rx();
        }

        // 48 + 48 fit; the third packet overruns after 4 bytes.
        assert_eq!(bridge.outbound_len(), OUTBOUND_QUEUE_LEN);
        assert_eq!(bridge.counters().outbound_overruns, 1);

        // Previously queued bytes are intact and in order.
        bridge.drain_host_egress();
        assert_eq!(bridge.serial_mut().tx, [0x55; 100]);
    }

    #[test]
    fn test_host_ingress_fills_inbound_queue() {
        let flag = ReceiveFlag::new();
        let mut serial = MockSerial::new();
        serial.feed(&[0xC0, 0x00, 0x41, 0x42, 0xC0]);
        let mut bridge = Bridge::new(serial, MockRadio::new(), &flag);

        // Within the holdoff window: bytes are queued, nothing sent.
        bridge.poll(0);
        assert_eq!(bridge.inbound_len(), 5);
        assert!(bridge.radio_mut().sent.is_empty());
    }

    #[test]
    fn test_inbound_excess_stays_in_serial() {
        let flag = ReceiveFlag::new();
        let mut serial = MockSerial::new();
        let stream: Vec<u8> = (0..500u16).map(|i| (i % 251) as u8).collect();
        serial.feed(&stream);
        let mut bridge = Bridge::new(serial, MockRadio::new(), &flag);

        bridge.poll(0);

        // Queue holds exactly its capacity; the excess was not consumed
        // and nothing was reordered.
        assert_eq!(bridge.inbound_len(), INBOUND_QUEUE_LEN);
        assert_eq!(bridge.serial_mut().rx.len(), 100);
        assert_eq!(bridge.counters().inbound_overruns, 0);

        // Keep polling past the holdoff: the queue drains in chunks,
        // the held-back serial bytes follow, and FIFO order survives
        // the full-queue episode end to end.
        let mut sent = Vec::new();
        let mut now = 0;
        while bridge.inbound_len() > 0 || bridge.serial_mut().rx.len() > 0 {
            now += TX_HOLDOFF_MS + 1;
            bridge.poll(now);
        }
        for packet in &bridge.radio_mut().sent {
            sent.extend_from_slice(packet.payload());
        }
        assert_eq!(sent, stream);
    }

    #[test]
    fn test_tx_pacing_holdoff() {
        let flag = ReceiveFlag::new();
        let mut serial = MockSerial::new();
        serial.feed(&[0xAA; 120]);
        let mut bridge = Bridge::new(serial, MockRadio::new(), &flag);

        // Not yet past the holdoff relative to the start timestamp.
        bridge.poll(0);
        bridge.poll(TX_HOLDOFF_MS);
        assert!(bridge.radio_mut().sent.is_empty());

        // Eligible: exactly one chunk of at most one packet's worth.
        bridge.poll(TX_HOLDOFF_MS + 1);
        assert_eq!(bridge.radio_mut().sent.len(), 1);
        assert_eq!(bridge.radio_mut().sent[0].len(), MAX_RADIO_PACKET_LEN);

        // Holdoff restarts from the last transmission.
        bridge.poll(TX_HOLDOFF_MS + 2);
        assert_eq!(bridge.radio_mut().sent.len(), 1);

        bridge.poll(2 * (TX_HOLDOFF_MS + 1));
        assert_eq!(bridge.radio_mut().sent.len(), 2);

        // 120 = 48 + 48 + 24: the last chunk is the remainder.
        bridge.poll(3 * (TX_HOLDOFF_MS + 1));
        assert_eq!(bridge.radio_mut().sent.len(), 3);
        assert_eq!(bridge.radio_mut().sent[2].len(), 24);
        assert_eq!(bridge.counters().tx_packets, 3);
    }

    #[test]
    fn test_send_runs_masked() {
        let flag = ReceiveFlag::new();
        let mut serial = MockSerial::new();
        serial.feed(&[0x01]);
        let mut bridge = Bridge::new(serial, MockRadio::new(), &flag);

        bridge.poll(TX_HOLDOFF_MS + 1);

        assert_eq!(
            bridge.radio_mut().calls,
            [RadioCall::Mask, RadioCall::Send, RadioCall::Unmask]
        );
    }

    #[test]
    fn test_send_failure_keeps_running() {
        let flag = ReceiveFlag::new();
        let mut serial = MockSerial::new();
        serial.feed(&[0x01, 0x02]);
        let mut radio = MockRadio::new();
        radio.fail_send = true;
        let mut bridge = Bridge::new(serial, radio, &flag);

        bridge.poll(TX_HOLDOFF_MS + 1);

        // The chunk is lost, the loop continues, pacing still advances.
        assert_eq!(bridge.counters().tx_packets, 0);
        assert_eq!(bridge.inbound_len(), 0);
        bridge.serial_mut().feed(&[0x03]);
        bridge.radio_mut().fail_send = false;
        bridge.poll(2 * (TX_HOLDOFF_MS + 1));
        assert_eq!(bridge.radio_mut().sent.len(), 1);
        assert_eq!(bridge.radio_mut().sent[0].payload(), &[0x03]);
    }

    /// Full path: a KISS-framed payload from host A crosses two bridged
    /// radios and is reassembled by host B's decoder, even though the
    /// frame is split across multiple radio packets.
    #[test]
    fn test_end_to_end_kiss_transparency() {
        let payload: Vec<u8> = (0u16..100).map(|i| (i % 256) as u8).collect();
        let mut framed = [0u8; 256];
        let framed_len = kiss_proto::encode(&payload, &mut framed).unwrap();

        let flag_a = ReceiveFlag::new();
        let flag_b = ReceiveFlag::new();
        let mut serial_a = MockSerial::new();
        serial_a.feed(&framed[..framed_len]);
        let mut bridge_a = Bridge::new(serial_a, MockRadio::new(), &flag_a);
        let mut bridge_b = Bridge::new(MockSerial::new(), MockRadio::new(), &flag_b);

        let mut now = 0;
        for _ in 0..16 {
            now += TX_HOLDOFF_MS + 1;
            bridge_a.poll(now);
            // Shuttle everything A transmitted over the air to B.
            let in_flight: Vec<RadioPacket> = bridge_a.radio_mut().sent.drain(..).collect();
            for packet in in_flight {
                bridge_b.radio_mut().pending_rx.push_back(packet);
                flag_b.notify();
                bridge_b.poll(now);
            }
        }
        assert!(framed_len > MAX_RADIO_PACKET_LEN, "frame must span packets");

        let mut decoder = kiss_proto::KissDecoder::new();
        let mut decoded = Vec::new();
        for &byte in &bridge_b.serial_mut().tx {
            if let Some(frame) = decoder.feed(byte) {
                decoded.extend_from_slice(frame.payload);
            }
        }
        assert_eq!(decoded, payload);
        assert_eq!(bridge_b.counters().outbound_overruns, 0);
    }
}
