//! GATT identifiers exposed by the LYWSD03MMC.
//!
//! All attributes live under a single vendor service. The UUIDs must match the
//! firmware exactly.

#![allow(clippy::unusual_byte_groupings)]

use bluest::Uuid;

/// The vendor service which hosts every attribute in [`Attribute`]
pub const SENSOR_SERVICE_UUID: Uuid = Uuid::from_u128(0xebe0ccb0_7a0a_4b0c_8a1a_6ff2997da3a6);

/// A readable, writable or notifying attribute of the sensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Attribute {
    /// Temperature, humidity and battery voltage (5 bytes)
    Reading,
    /// Battery level as reported by the firmware (1 signed byte)
    Battery,
    /// Display unit, Celsius or Fahrenheit (1 byte)
    TemperatureUnit,
    /// Device clock (u32)
    Clock,
    /// Index of the oldest history record still held (u32)
    FirstHistoryIndex,
    /// Last calculated hour index followed by the next index to be written (2 x u32)
    HistoryIndices,
    /// Notification channel streaming hourly records
    HistoryData,
    /// The most recently completed hourly record
    LastHourRecord,
}

impl Attribute {
    pub const ALL: [Attribute; 8] = [
        Attribute::Reading,
        Attribute::Battery,
        Attribute::TemperatureUnit,
        Attribute::Clock,
        Attribute::FirstHistoryIndex,
        Attribute::HistoryIndices,
        Attribute::HistoryData,
        Attribute::LastHourRecord,
    ];

    pub const fn uuid(self) -> Uuid {
        match self {
            Attribute::Reading => Uuid::from_u128(0xebe0ccc1_7a0a_4b0c_8a1a_6ff2997da3a6),
            Attribute::Battery => Uuid::from_u128(0xebe0ccc4_7a0a_4b0c_8a1a_6ff2997da3a6),
            Attribute::TemperatureUnit => Uuid::from_u128(0xebe0ccbe_7a0a_4b0c_8a1a_6ff2997da3a6),
            Attribute::Clock => Uuid::from_u128(0xebe0ccb7_7a0a_4b0c_8a1a_6ff2997da3a6),
            Attribute::FirstHistoryIndex => Uuid::from_u128(0xebe0ccba_7a0a_4b0c_8a1a_6ff2997da3a6),
            Attribute::HistoryIndices => Uuid::from_u128(0xebe0ccb9_7a0a_4b0c_8a1a_6ff2997da3a6),
            Attribute::HistoryData => Uuid::from_u128(0xebe0ccbc_7a0a_4b0c_8a1a_6ff2997da3a6),
            Attribute::LastHourRecord => Uuid::from_u128(0xebe0ccbb_7a0a_4b0c_8a1a_6ff2997da3a6),
        }
    }

    pub fn from_uuid(uuid: Uuid) -> Option<Attribute> {
        Self::ALL.into_iter().find(|attribute| attribute.uuid() == uuid)
    }
}

#[test]
fn test_uuids_match_firmware_table() {
    assert_eq!(
        Attribute::Reading.uuid(),
        Uuid::parse_str("EBE0CCC1-7A0A-4B0C-8A1A-6FF2997DA3A6").unwrap()
    );
    assert_eq!(
        Attribute::HistoryData.uuid(),
        Uuid::parse_str("EBE0CCBC-7A0A-4B0C-8A1A-6FF2997DA3A6").unwrap()
    );
    assert_eq!(
        Attribute::LastHourRecord.uuid(),
        Uuid::parse_str("EBE0CCBB-7A0A-4B0C-8A1A-6FF2997DA3A6").unwrap()
    );
}

#[test]
fn test_uuids_are_distinct() {
    for attribute in Attribute::ALL {
        assert_eq!(Attribute::from_uuid(attribute.uuid()), Some(attribute));
    }
    assert_eq!(Attribute::from_uuid(SENSOR_SERVICE_UUID), None);
}
