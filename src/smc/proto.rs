// Sensor wire protocol: fixed 77-byte request/response frames exchanged
// with the thermal-management service, plus the fixed-point decodings.

use super::SmcError;

pub const FRAME_LEN: usize = 77;

pub const KEY_OFFSET: usize = 0;
pub const DATA_SIZE_OFFSET: usize = 26;
pub const COMMAND_OFFSET: usize = 40;
pub const STATUS_OFFSET: usize = 41;
pub const VALUE_OFFSET: usize = 45;

/// "read key" command byte.
pub const CMD_READ_KEY: u8 = 5;
/// Data-size field value for all reads used here.
pub const READ_DATA_SIZE: u8 = 32;
/// Service result code for a successful read.
pub const STATUS_OK: u8 = 0;

/// Fixed-point encodings used by the sensor registers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    /// Signed, divided by 256; temperatures in °C.
    Sp78,
    /// Unsigned, divided by 4; fan speeds in RPM.
    Fpe2,
}

/// Builds a read-key request frame. The key must be exactly 4 ASCII
/// characters.
pub fn encode_read_key(key: &str) -> Result<[u8; FRAME_LEN], SmcError> {
    if key.len() != 4 || !key.is_ascii() {
        return Err(SmcError::BadKey(key.to_string()));
    }
    let mut frame = [0u8; FRAME_LEN];
    frame[KEY_OFFSET..KEY_OFFSET + 4].copy_from_slice(key.as_bytes());
    frame[DATA_SIZE_OFFSET] = READ_DATA_SIZE;
    frame[COMMAND_OFFSET] = CMD_READ_KEY;
    Ok(frame)
}

/// Raw big-endian 16-bit value from a response frame.
pub fn raw_value(frame: &[u8]) -> u16 {
    u16::from_be_bytes([frame[VALUE_OFFSET], frame[VALUE_OFFSET + 1]])
}

/// Decodes a response frame; wrong size or a non-success status is "no
/// reading", never an error.
pub fn decode_reading(frame: &[u8], encoding: Encoding) -> Option<f64> {
    if frame.len() != FRAME_LEN || frame[STATUS_OFFSET] != STATUS_OK {
        return None;
    }
    decode_raw(raw_value(frame), encoding)
}

pub fn decode_raw(raw: u16, encoding: Encoding) -> Option<f64> {
    match encoding {
        Encoding::Sp78 => decode_sp78(raw),
        Encoding::Fpe2 => decode_fpe2(raw),
    }
}

/// sp78: signed 16 bits over 256. Values outside (-10, 150) °C are sensor
/// noise and discarded.
pub fn decode_sp78(raw: u16) -> Option<f64> {
    let value = (raw as i16) as f64 / 256.0;
    (value > -10.0 && value < 150.0).then_some(value)
}

/// fpe2: unsigned 16 bits over 4. A stopped fan reads as no data.
pub fn decode_fpe2(raw: u16) -> Option<f64> {
    let value = raw as f64 / 4.0;
    (value > 0.0).then_some(value)
}
