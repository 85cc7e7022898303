//! Read temperature, humidity, battery and hourly history from Xiaomi LYWSD03MMC
//! thermometers over Bluetooth Low Energy
//!
//! The device exposes a vendor GATT service with one characteristic per attribute.
//! Scalar attributes are plain reads and writes of small little endian payloads.
//! The hourly history buffer is downloaded by subscribing to a notification
//! characteristic and collecting records until the last expected index arrives.
//!
//! Currently the following data can be accessed:
//!
//! - Temperature (°), humidity (%) and battery voltage (mV)
//! - Battery level (%)
//! - Display unit (°C / °F), readable and writable
//! - Device clock, readable and writable
//! - Hourly min/max history
//!
//! # Example
//!
//! ```rust,no_run
//! # #[tokio::main]
//! # pub async fn main() -> lywsd03mmc::Result<()> {
//!     let mut client = lywsd03mmc::SensorClient::discover(Default::default()).await?;
//!     client.connect().await?;
//!     let reading = client.read_reading().await?;
//!     println!("{reading}");
//!     for record in client.drain_history_records().await? {
//!         println!("{record}");
//!     }
//!     client.disconnect().await?;
//! #   Ok(())
//! # }
//! ```

pub mod characteristics;
pub mod codec;
mod config;
mod error;
mod reading;
mod sensor_client;
pub mod transport;

pub use config::ClientConfig;
pub use error::{Error, Result};
pub use reading::{HistoryIndices, HourlyRecord, SensorReading, TemperatureUnit};
pub use sensor_client::SensorClient;
