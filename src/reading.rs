use std::fmt;

/// A single temperature, humidity and battery voltage sample
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SensorReading {
    /// The temperature in °/100
    pub temperature_raw: i16,
    /// The relative humidity in %
    pub humidity: u8,
    /// The battery voltage in mV
    pub battery_mv: i16,
}

impl SensorReading {
    /// The temperature in degrees, in whichever unit the device displays
    pub fn temperature(&self) -> f64 {
        f64::from(self.temperature_raw) / 100.0
    }

    /// Battery level in % estimated from the voltage, taking 2.1V as empty.
    ///
    /// Capped at 100 but not floored, so voltages below 2.1V give a negative value.
    pub fn battery_percentage(&self) -> i32 {
        let volts_above_empty = f64::from(self.battery_mv) / 1000.0 - 2.1;
        // Round the exact binary value to two decimals, ties to even.
        let rounded = format!("{volts_above_empty:.2}")
            .parse::<f64>()
            .unwrap_or(volts_above_empty);
        ((rounded * 100.0) as i32).min(100)
    }
}

impl fmt::Display for SensorReading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "temperature_raw: {}, temperature: {}, humidity: {}, battery_mv: {}, battery_percentage: {}",
            self.temperature_raw,
            self.temperature(),
            self.humidity,
            self.battery_mv,
            self.battery_percentage()
        )
    }
}

/// Min/max aggregates the device keeps for one hour
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HourlyRecord {
    /// Sequence number assigned by the device
    pub index: u32,
    /// Device clock at the start of the hour
    pub timestamp: u32,
    /// Maximum temperature in °/10
    pub temperature_max_raw: i16,
    pub humidity_max: u8,
    /// Minimum temperature in °/10
    pub temperature_min_raw: i16,
    pub humidity_min: u8,
}

impl HourlyRecord {
    pub fn temperature_max(&self) -> f64 {
        f64::from(self.temperature_max_raw) / 10.0
    }

    pub fn temperature_min(&self) -> f64 {
        f64::from(self.temperature_min_raw) / 10.0
    }
}

impl fmt::Display for HourlyRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "index: {}, timestamp: {}, temperature_max: {}, humidity_max: {}, temperature_min: {}, humidity_min: {}",
            self.index,
            self.timestamp,
            self.temperature_max(),
            self.humidity_max,
            self.temperature_min(),
            self.humidity_min
        )
    }
}

/// The unit the device shows temperatures in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemperatureUnit {
    Celsius,
    Fahrenheit,
}

impl fmt::Display for TemperatureUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TemperatureUnit::Celsius => f.write_str("C"),
            TemperatureUnit::Fahrenheit => f.write_str("F"),
        }
    }
}

/// Bounds of the history buffer as reported by the device
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HistoryIndices {
    /// Index of the last hour the device has finished aggregating
    pub last_calculated: u32,
    /// Index the device will assign to the next record; exclusive upper bound of a drain
    pub next_index: u32,
}

#[cfg(test)]
fn reading_with_battery(battery_mv: i16) -> SensorReading {
    SensorReading { temperature_raw: 2216, humidity: 23, battery_mv }
}

#[test]
fn test_temperature_scale() {
    assert_eq!(reading_with_battery(3001).temperature(), 22.16);
    let negative = SensorReading { temperature_raw: -550, humidity: 80, battery_mv: 3000 };
    assert_eq!(negative.temperature(), -5.5);
}

#[test]
fn test_battery_percentage() {
    assert_eq!(reading_with_battery(2100).battery_percentage(), 0);
    assert_eq!(reading_with_battery(3000).battery_percentage(), 90);
    assert_eq!(reading_with_battery(3100).battery_percentage(), 100);
    assert_eq!(reading_with_battery(3300).battery_percentage(), 100);
}

#[test]
fn test_battery_percentage_between_steps() {
    // 2225 mV is exactly 0.125 above empty and rounds down to 0.12
    assert_eq!(reading_with_battery(2225).battery_percentage(), 12);
    assert_eq!(reading_with_battery(2245).battery_percentage(), 15);
    assert_eq!(reading_with_battery(2435).battery_percentage(), 33);
    // 0.58 * 100 truncates to 57
    assert_eq!(reading_with_battery(2685).battery_percentage(), 57);
    assert_eq!(reading_with_battery(2705).battery_percentage(), 60);
    assert_eq!(reading_with_battery(2895).battery_percentage(), 79);
    assert_eq!(reading_with_battery(2955).battery_percentage(), 85);
}

#[test]
fn test_battery_percentage_is_not_floored() {
    assert_eq!(reading_with_battery(2000).battery_percentage(), -10);
    assert_eq!(reading_with_battery(1000).battery_percentage(), -110);
}

#[test]
fn test_hourly_temperature_scale() {
    let record = HourlyRecord {
        index: 5,
        timestamp: 1000,
        temperature_max_raw: 250,
        humidity_max: 60,
        temperature_min_raw: 180,
        humidity_min: 40,
    };
    assert_eq!(record.temperature_max(), 25.0);
    assert_eq!(record.temperature_min(), 18.0);
}

#[test]
fn test_display() {
    assert_eq!(TemperatureUnit::Celsius.to_string(), "C");
    assert_eq!(TemperatureUnit::Fahrenheit.to_string(), "F");
    assert_eq!(
        reading_with_battery(3000).to_string(),
        "temperature_raw: 2216, temperature: 22.16, humidity: 23, battery_mv: 3000, battery_percentage: 90"
    );
}
