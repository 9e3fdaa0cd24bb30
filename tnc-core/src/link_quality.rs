//! Signal-quality decoding for the transceiver's appended status bytes.
//!
//! Pure conversions of the raw RSSI and LQI bytes the CC1101 appends to
//! received packets. Informational only - nothing in the bridge's
//! control flow depends on them - but the formulas must stay bit-exact
//! with TI application note SWRA114 so existing tooling keeps
//! interpreting the values correctly.

/// RSSI offset in dB for 38.4 kbps at 433 MHz, from the SWRA114 table.
///
/// Baud- and band-dependent; other radio configurations need the
/// matching table entry.
const RSSI_OFFSET_DB: i16 = 74;

/// Decode a raw RSSI status byte to dBm.
///
/// The raw byte is a two's-complement value in half-dB steps: values at
/// or above 128 read as negative, and the integer division truncates
/// toward zero exactly as the application note's reference code does.
#[must_use]
pub fn rssi_dbm(raw: u8) -> i16 {
    if raw >= 128 {
        (raw as i16 - 256) / 2 - RSSI_OFFSET_DB
    } else {
        raw as i16 / 2 - RSSI_OFFSET_DB
    }
}

/// Decode a raw LQI status byte.
///
/// The hardware reports an inverted scale; `0x3F - raw` restores
/// "higher is better". Raw values above 0x3F go negative, matching the
/// reference implementation.
#[must_use]
pub fn lqi(raw: u8) -> i16 {
    0x3F - raw as i16
}
