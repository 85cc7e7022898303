//! Conversion between GATT payloads and typed values.
//!
//! Every multi-byte field is little endian and layouts have no padding:
//!
//! Payload        | Layout
//! -------------- | -----------------------------------------
//! Reading        | i16 temp/100, u8 humidity, i16 battery mV
//! Hourly record  | u32 index, u32 timestamp, i16 max/10, u8 max %, i16 min/10, u8 min %
//! Unit           | 1 byte
//! Clock / index  | u32
//!
//! Payloads longer than the layout are accepted and the excess ignored.

use crate::error::{Error, Result};
use crate::reading::{HistoryIndices, HourlyRecord, SensorReading, TemperatureUnit};

pub const READING_LEN: usize = 5;
pub const HOURLY_RECORD_LEN: usize = 14;
pub const U32_LEN: usize = 4;

fn require(what: &'static str, bytes: &[u8], expected: usize) -> Result<()> {
    if bytes.len() < expected {
        return Err(Error::Decode { what, expected, actual: bytes.len() });
    }
    Ok(())
}

fn i16_at(bytes: &[u8], offset: usize) -> i16 {
    i16::from_le_bytes([bytes[offset], bytes[offset + 1]])
}

fn u32_at(bytes: &[u8], offset: usize) -> u32 {
    u32::from_le_bytes([bytes[offset], bytes[offset + 1], bytes[offset + 2], bytes[offset + 3]])
}

pub fn decode_reading(bytes: &[u8]) -> Result<SensorReading> {
    require("reading", bytes, READING_LEN)?;
    Ok(SensorReading {
        temperature_raw: i16_at(bytes, 0),
        humidity: bytes[2],
        battery_mv: i16_at(bytes, 3),
    })
}

pub fn decode_hourly_record(bytes: &[u8]) -> Result<HourlyRecord> {
    require("hourly record", bytes, HOURLY_RECORD_LEN)?;
    Ok(HourlyRecord {
        index: u32_at(bytes, 0),
        timestamp: u32_at(bytes, 4),
        temperature_max_raw: i16_at(bytes, 8),
        humidity_max: bytes[10],
        temperature_min_raw: i16_at(bytes, 11),
        humidity_min: bytes[13],
    })
}

/// Decode the unit attribute. The firmware reports a raw 0 or 1.
pub fn decode_unit(byte: u8) -> Result<TemperatureUnit> {
    match byte {
        0x00 => Ok(TemperatureUnit::Celsius),
        0x01 => Ok(TemperatureUnit::Fahrenheit),
        value => Err(Error::UnrecognizedValue { what: "temperature unit", value }),
    }
}

pub fn decode_unit_payload(bytes: &[u8]) -> Result<TemperatureUnit> {
    require("temperature unit", bytes, 1)?;
    decode_unit(bytes[0])
}

pub fn encode_unit(unit: TemperatureUnit) -> [u8; 1] {
    match unit {
        TemperatureUnit::Celsius => [0x00],
        TemperatureUnit::Fahrenheit => [0x01],
    }
}

pub fn decode_battery(bytes: &[u8]) -> Result<i8> {
    require("battery", bytes, 1)?;
    Ok(bytes[0] as i8)
}

pub fn decode_u32(what: &'static str, bytes: &[u8]) -> Result<u32> {
    require(what, bytes, U32_LEN)?;
    Ok(u32_at(bytes, 0))
}

pub fn encode_u32(value: u32) -> [u8; 4] {
    value.to_le_bytes()
}

pub fn decode_history_indices(bytes: &[u8]) -> Result<HistoryIndices> {
    require("history indices", bytes, 2 * U32_LEN)?;
    Ok(HistoryIndices { last_calculated: u32_at(bytes, 0), next_index: u32_at(bytes, 4) })
}

#[test]
fn test_decode_reading() {
    // (2216, 23, 3001)
    let bytes = hex::decode("a80817b90b").unwrap();
    let reading = decode_reading(&bytes).unwrap();
    assert_eq!(reading, SensorReading { temperature_raw: 2216, humidity: 23, battery_mv: 3001 });
    assert_eq!(reading.temperature(), 22.16);
}

#[test]
fn test_decode_reading_negative_temperature() {
    let bytes = hex::decode("38ff50b80b").unwrap();
    let reading = decode_reading(&bytes).unwrap();
    assert_eq!(reading.temperature_raw, -200);
    assert_eq!(reading.temperature(), -2.0);
    assert_eq!(reading.humidity, 80);
    assert_eq!(reading.battery_mv, 3000);
}

#[test]
fn test_decode_reading_truncated() {
    let bytes = hex::decode("a80817b9").unwrap();
    let result = decode_reading(&bytes);
    assert!(matches!(result, Err(Error::Decode { expected: 5, actual: 4, .. })));
}

#[test]
fn test_decode_hourly_record() {
    let bytes = hex::decode("05000000e8030000fa003cb40028").unwrap();
    let record = decode_hourly_record(&bytes).unwrap();
    assert_eq!(
        record,
        HourlyRecord {
            index: 5,
            timestamp: 1000,
            temperature_max_raw: 250,
            humidity_max: 60,
            temperature_min_raw: 180,
            humidity_min: 40,
        }
    );
    assert_eq!(record.temperature_max(), 25.0);
    assert_eq!(record.temperature_min(), 18.0);
}

#[test]
fn test_decode_hourly_record_truncated() {
    let bytes = hex::decode("05000000e8030000fa003cb400").unwrap();
    let result = decode_hourly_record(&bytes);
    assert!(matches!(result, Err(Error::Decode { expected: 14, actual: 13, .. })));
    assert!(matches!(decode_hourly_record(&[]), Err(Error::Decode { actual: 0, .. })));
}

#[test]
fn test_decode_unit() {
    assert_eq!(decode_unit(0x00).unwrap(), TemperatureUnit::Celsius);
    assert_eq!(decode_unit(0x01).unwrap(), TemperatureUnit::Fahrenheit);
    assert!(matches!(decode_unit(b'0'), Err(Error::UnrecognizedValue { value: 0x30, .. })));
    assert!(matches!(decode_unit(b'1'), Err(Error::UnrecognizedValue { value: 0x31, .. })));
    assert!(matches!(decode_unit(0x02), Err(Error::UnrecognizedValue { value: 0x02, .. })));
    assert!(matches!(decode_unit(0xff), Err(Error::UnrecognizedValue { value: 0xff, .. })));
    assert!(matches!(decode_unit_payload(&[]), Err(Error::Decode { expected: 1, .. })));
}

#[test]
fn test_encode() {
    assert_eq!(encode_unit(TemperatureUnit::Celsius), [0x00]);
    assert_eq!(encode_unit(TemperatureUnit::Fahrenheit), [0x01]);
    assert_eq!(hex::encode(encode_u32(1_700_000_000)), "00f15365");
    assert_eq!(decode_u32("clock", &encode_u32(1_700_000_000)).unwrap(), 1_700_000_000);
}

#[test]
fn test_decode_history_indices() {
    let bytes = hex::decode("1100000012000000").unwrap();
    let indices = decode_history_indices(&bytes).unwrap();
    assert_eq!(indices, HistoryIndices { last_calculated: 17, next_index: 18 });
    assert!(matches!(decode_history_indices(&bytes[..7]), Err(Error::Decode { expected: 8, .. })));
}

#[test]
fn test_decode_battery() {
    assert_eq!(decode_battery(&[0x64]).unwrap(), 100);
    assert_eq!(decode_battery(&[0xff]).unwrap(), -1);
    assert!(matches!(decode_battery(&[]), Err(Error::Decode { .. })));
}
