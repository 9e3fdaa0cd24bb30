//! CC1101 transceiver adapter.
//!
//! A thin `RadioLink` implementation over blocking SPI: reset and base
//! configuration, RX-FIFO drain with the appended RSSI/LQI status
//! bytes, TX-FIFO write. Modulation and frequency come from a fixed
//! SmartRF Studio register table (38.4 kbps GFSK at 433 MHz); tuning
//! them is out of scope for the bridge.

use embassy_rp::gpio::Output;
use embassy_rp::spi::{Blocking, Spi};
use embassy_time::{block_for, Duration};
use tnc_core::{RadioError, RadioLink, RadioPacket, MAX_RADIO_PACKET_LEN};

// Header bits.
const READ: u8 = 0x80;
const BURST: u8 = 0x40;

// Command strobes.
const SRES: u8 = 0x30;
const SRX: u8 = 0x34;
const STX: u8 = 0x35;
const SIDLE: u8 = 0x36;
const SFRX: u8 = 0x3A;
const SFTX: u8 = 0x3B;

// Configuration registers.
const IOCFG0: u8 = 0x02;
const SYNC1: u8 = 0x04;
const SYNC0: u8 = 0x05;
const PKTLEN: u8 = 0x06;
const PKTCTRL1: u8 = 0x07;
const PKTCTRL0: u8 = 0x08;
const FSCTRL1: u8 = 0x0B;
const FREQ2: u8 = 0x0D;
const FREQ1: u8 = 0x0E;
const FREQ0: u8 = 0x0F;
const MDMCFG4: u8 = 0x10;
const MDMCFG3: u8 = 0x11;
const MDMCFG2: u8 = 0x12;
const DEVIATN: u8 = 0x15;
const MCSM0: u8 = 0x18;
const FOCCFG: u8 = 0x19;

// Status registers (read with the burst bit set).
const VERSION: u8 = 0x31;
const MARCSTATE: u8 = 0x35;
const RXBYTES: u8 = 0x3B;

const PATABLE: u8 = 0x3E;
const FIFO: u8 = 0x3F;

const MARCSTATE_IDLE: u8 = 0x01;

/// Sync word shared by every node on this link.
const SYNC_WORD: [u8; 2] = [199, 10];

/// Low output power; enough for bench-distance links.
const PA_LOW_POWER: u8 = 0x03;

/// Base configuration: 38.4 kbps GFSK at 433 MHz, variable-length
/// packets with CRC and appended status, GDO0 deasserting at end of
/// packet. See SmartRF Studio for deriving other rates and bands.
const CONFIG: [(u8, u8); 14] = [
    (IOCFG0, 0x06),   // GDO0: assert on sync, deassert at packet end
    (PKTLEN, 0x3D),   // FIFO ceiling for variable-length packets
    (PKTCTRL1, 0x04), // append status bytes, no address check
    (PKTCTRL0, 0x05), // variable length, CRC enabled
    (FSCTRL1, 0x06),
    (FREQ2, 0x10), // 433.92 MHz carrier
    (FREQ1, 0xA7),
    (FREQ0, 0x62),
    (MDMCFG4, 0xCA), // 38.4 kbps, 101.6 kHz RX filter
    (MDMCFG3, 0x83),
    (MDMCFG2, 0x13), // GFSK, 30/32 sync bits
    (DEVIATN, 0x35),
    (MCSM0, 0x18), // autocal on idle-to-RX/TX
    (FOCCFG, 0x16),
];

/// How many status polls to spend waiting for a transmission to
/// finish before declaring the transaction failed.
const TX_DONE_POLL_LIMIT: u32 = 10_000;

/// `RadioLink` over a CC1101 on a blocking SPI bus.
///
/// The receive notification is the GDO0 falling edge; a separate
/// monitor task forwards it to the bridge's `ReceiveFlag`. That task
/// shares the cooperative executor with the bridge and only raises the
/// flag, so the mask/unmask hooks have nothing to suppress here.
pub struct Cc1101Radio<'d> {
    spi: Spi<'d, Blocking>,
    cs: Output<'d>,
}

impl<'d> Cc1101Radio<'d> {
    pub fn new(spi: Spi<'d, Blocking>, cs: Output<'d>) -> Self {
        Self { spi, cs }
    }

    /// Reset the transceiver, verify it responds, load the base
    /// configuration, and enter receive mode.
    pub fn init(&mut self) -> Result<(), RadioError> {
        self.strobe(SRES)?;
        block_for(Duration::from_micros(100));

        // A missing or unpowered chip reads all-zeros or all-ones.
        let version = self.read_status(VERSION)?;
        if version == 0x00 || version == 0xFF {
            return Err(RadioError::Init);
        }

        for (reg, value) in CONFIG {
            self.write_reg(reg, value)?;
        }
        self.write_reg(SYNC1, SYNC_WORD[0])?;
        self.write_reg(SYNC0, SYNC_WORD[1])?;
        self.write_reg(PATABLE, PA_LOW_POWER)?;

        self.strobe(SFRX)?;
        self.strobe(SRX)?;
        Ok(())
    }

    fn transfer(&mut self, buf: &mut [u8]) -> Result<(), RadioError> {
        self.cs.set_low();
        let result = self.spi.blocking_transfer_in_place(buf);
        self.cs.set_high();
        result.map_err(|_| RadioError::Io)
    }

    fn strobe(&mut self, strobe: u8) -> Result<(), RadioError> {
        let mut buf = [strobe];
        self.transfer(&mut buf)
    }

    fn write_reg(&mut self, reg: u8, value: u8) -> Result<(), RadioError> {
        let mut buf = [reg, value];
        self.transfer(&mut buf)
    }

    fn read_status(&mut self, reg: u8) -> Result<u8, RadioError> {
        // Status registers share addresses with strobes; the burst bit
        // selects the register.
        let mut buf = [reg | READ | BURST, 0];
        self.transfer(&mut buf)?;
        Ok(buf[1])
    }

    fn read_fifo(&mut self, out: &mut [u8]) -> Result<(), RadioError> {
        self.cs.set_low();
        let header = [FIFO | READ | BURST];
        let result = self
            .spi
            .blocking_write(&header)
            .and_then(|_| self.spi.blocking_read(out));
        self.cs.set_high();
        result.map_err(|_| RadioError::Io)
    }

    fn write_fifo(&mut self, len: u8, payload: &[u8]) -> Result<(), RadioError> {
        self.cs.set_low();
        let header = [FIFO | BURST, len];
        let result = self
            .spi
            .blocking_write(&header)
            .and_then(|_| self.spi.blocking_write(payload));
        self.cs.set_high();
        result.map_err(|_| RadioError::Io)
    }

    /// Flush the RX FIFO and re-enter receive mode.
    fn restart_rx(&mut self) -> Result<(), RadioError> {
        self.strobe(SIDLE)?;
        self.strobe(SFRX)?;
        self.strobe(SRX)
    }
}

impl RadioLink for Cc1101Radio<'_> {
    fn receive(&mut self) -> Result<Option<RadioPacket>, RadioError> {
        let available = self.read_status(RXBYTES)? & 0x7F;
        if available == 0 {
            return Ok(None);
        }

        // Variable-length mode: first FIFO byte is the payload length,
        // followed by the payload and the two appended status bytes.
        let mut length = [0u8];
        self.read_fifo(&mut length)?;
        let len = length[0] as usize;
        if len == 0 || len > MAX_RADIO_PACKET_LEN || (len + 2) > available as usize {
            // FIFO desync (overflow or noise burst): flush and rearm.
            self.restart_rx()?;
            return Ok(None);
        }

        let mut buf = [0u8; MAX_RADIO_PACKET_LEN + 2];
        self.read_fifo(&mut buf[..len + 2])?;

        let mut packet = RadioPacket::from_payload(&buf[..len])?;
        packet.rssi_raw = buf[len];
        packet.lqi_raw = buf[len + 1] & 0x7F;
        packet.crc_ok = buf[len + 1] & 0x80 != 0;

        self.strobe(SRX)?;
        Ok(Some(packet))
    }

    fn send(&mut self, packet: &RadioPacket) -> Result<(), RadioError> {
        self.strobe(SIDLE)?;
        self.strobe(SFTX)?;
        self.write_fifo(packet.len() as u8, packet.payload())?;
        self.strobe(STX)?;

        // The transmitter returns to idle once the packet is on the
        // air; a 48-byte packet at 38.4 kbps is gone in ~12 ms.
        for _ in 0..TX_DONE_POLL_LIMIT {
            if self.read_status(MARCSTATE)? & 0x1F == MARCSTATE_IDLE {
                self.strobe(SRX)?;
                return Ok(());
            }
            block_for(Duration::from_micros(50));
        }
        self.restart_rx()?;
        Err(RadioError::Io)
    }

    fn mask_receive_irq(&mut self) {
        // The GDO0 monitor is a cooperative task that only raises the
        // pending flag; it cannot preempt a bridge transaction.
    }

    fn unmask_receive_irq(&mut self) {}
}
