#![no_std]
#![no_main]

use defmt::{error, info, warn};
use defmt_rtt as _;
use embassy_executor::Spawner;
use embassy_futures::yield_now;
use embassy_rp::bind_interrupts;
use embassy_rp::gpio::{Input, Level, Output, Pull};
use embassy_rp::peripherals::UART0;
use embassy_rp::spi::{Config as SpiConfig, Spi};
use embassy_rp::uart::{BufferedInterruptHandler, BufferedUart, Config as UartConfig};
use embassy_time::{Instant, Timer};
use kiss_tnc::{Cc1101Radio, HostSerial};
use static_cell::StaticCell;
use tnc_core::{Bridge, BridgeCounters, ReceiveFlag};

#[cfg(feature = "dev-panic")]
use panic_probe as _;
#[cfg(feature = "prod-panic")]
use panic_reset as _;

bind_interrupts!(struct Irqs {
    UART0_IRQ => BufferedInterruptHandler<UART0>;
});

/// Host serial speed. Could go faster if desired.
const HOST_BAUD: u32 = 9_600;

/// Raised by the GDO0 monitor when the radio has a packet ready; the
/// bridge consumes it inside its receive-intake critical region.
static RX_PENDING: ReceiveFlag = ReceiveFlag::new();

/// Interrupt-fed UART ring buffers. RX is sized to absorb a burst of
/// host traffic across bridge iterations.
static UART_TX_BUF: StaticCell<[u8; 64]> = StaticCell::new();
static UART_RX_BUF: StaticCell<[u8; 256]> = StaticCell::new();

#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("KISS TNC starting...");

    let p = embassy_rp::init(embassy_rp::config::Config::default());

    // --- Host UART ---
    let mut uart_config = UartConfig::default();
    uart_config.baudrate = HOST_BAUD;

    let uart = BufferedUart::new(
        p.UART0,
        p.PIN_0, // TX
        p.PIN_1, // RX
        Irqs,
        UART_TX_BUF.init([0; 64]),
        UART_RX_BUF.init([0; 256]),
        uart_config,
    );
    let host = HostSerial::new(uart);

    // --- CC1101 SPI ---
    let mut spi_config = SpiConfig::default();
    spi_config.frequency = 5_000_000;

    let bus = Spi::new_blocking(
        p.SPI0,
        p.PIN_2, // SCK
        p.PIN_3, // MOSI
        p.PIN_4, // MISO
        spi_config,
    );
    let cs = Output::new(p.PIN_5, Level::High);

    let mut radio = Cc1101Radio::new(bus, cs);
    if let Err(e) = radio.init() {
        // Fatal at startup: without the transceiver this device is
        // inert, so park instead of bridging nothing.
        error!("CC1101 init failed: {:?}", e);
        loop {
            Timer::after_secs(1).await;
        }
    }
    info!("CC1101 radio initialized");

    // GDO0 deasserts at end of received packet.
    let gdo0 = Input::new(p.PIN_6, Pull::None);
    spawner.spawn(packet_ready_task(gdo0)).unwrap();

    info!("bridging, host at {} baud", HOST_BAUD);

    let mut bridge = Bridge::new(host, radio, &RX_PENDING);
    let mut reported = BridgeCounters::default();
    loop {
        bridge.poll(Instant::now().as_millis());

        let counters = bridge.counters();
        if counters.inbound_overruns != reported.inbound_overruns
            || counters.outbound_overruns != reported.outbound_overruns
        {
            warn!(
                "queue overrun: inbound {}, outbound {}",
                counters.inbound_overruns, counters.outbound_overruns
            );
        }
        if counters.crc_discards != reported.crc_discards {
            warn!("dropped {} packets with bad CRC", counters.crc_discards);
        }
        reported = counters;

        yield_now().await;
    }
}

/// Receive-notification handler: raise the flag and nothing else.
///
/// No buffer access, no SPI - heavier work here would race the bridge's
/// in-progress transceiver transactions.
#[embassy_executor::task]
async fn packet_ready_task(mut gdo0: Input<'static>) {
    loop {
        gdo0.wait_for_falling_edge().await;
        RX_PENDING.notify();
    }
}
