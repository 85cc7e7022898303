use log::{debug, info, warn};
use tokio::sync::mpsc::error::TryRecvError;
use tokio::time::{sleep, Instant};

use crate::characteristics::Attribute;
use crate::codec;
use crate::config::ClientConfig;
use crate::error::{Error, Result};
use crate::reading::{HistoryIndices, HourlyRecord, SensorReading, TemperatureUnit};
use crate::transport::{BluestTransport, GattTransport, Notifications};

/// A session with one LYWSD03MMC.
///
/// Operations are sequential request/response exchanges over the transport.
/// Transport failures are returned as [`Error::Transport`] and never retried.
pub struct SensorClient<T = BluestTransport> {
    transport: T,
    config: ClientConfig,
}

impl SensorClient<BluestTransport> {
    /// Scan for the device named in `config` and wrap it. Call [`SensorClient::connect`] next.
    pub async fn discover(config: ClientConfig) -> Result<Self> {
        let transport = BluestTransport::discover(&config.device_name, config.scan_timeout).await?;
        Ok(Self::new(transport, config))
    }
}

impl<T: GattTransport> SensorClient<T> {
    pub fn new(transport: T, config: ClientConfig) -> Self {
        Self { transport, config }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Returns `false` if the connection could not be made within the configured timeout.
    pub async fn connect(&mut self) -> Result<bool> {
        Ok(self.transport.connect(self.config.connect_timeout).await?)
    }

    /// Disconnect if still connected. The client cannot be used afterwards.
    pub async fn disconnect(mut self) -> Result<()> {
        if self.transport.is_connected().await {
            self.transport.disconnect().await?;
        }
        Ok(())
    }

    /// Current temperature, humidity and battery voltage
    pub async fn read_reading(&self) -> Result<SensorReading> {
        let data = self.read(Attribute::Reading).await?;
        codec::decode_reading(&data)
    }

    /// Battery level in % as reported by the firmware
    pub async fn read_battery(&self) -> Result<i8> {
        let data = self.read(Attribute::Battery).await?;
        codec::decode_battery(&data)
    }

    pub async fn read_temperature_unit(&self) -> Result<TemperatureUnit> {
        let data = self.read(Attribute::TemperatureUnit).await?;
        codec::decode_unit_payload(&data)
    }

    pub async fn write_temperature_unit(&self, unit: TemperatureUnit) -> Result<()> {
        self.write(Attribute::TemperatureUnit, &codec::encode_unit(unit)).await
    }

    pub async fn set_celsius(&self) -> Result<()> {
        self.write_temperature_unit(TemperatureUnit::Celsius).await
    }

    pub async fn set_fahrenheit(&self) -> Result<()> {
        self.write_temperature_unit(TemperatureUnit::Fahrenheit).await
    }

    /// The raw device clock. No unit conversion is applied.
    pub async fn read_device_clock(&self) -> Result<u32> {
        let data = self.read(Attribute::Clock).await?;
        codec::decode_u32("clock", &data)
    }

    pub async fn write_device_clock(&self, value: u32) -> Result<()> {
        self.write(Attribute::Clock, &codec::encode_u32(value)).await
    }

    /// Index of the oldest record held. A device without history returns an
    /// empty value, which reads as 0.
    pub async fn read_first_history_index(&self) -> Result<u32> {
        let data = self.read(Attribute::FirstHistoryIndex).await?;
        if data.is_empty() {
            return Ok(0);
        }
        codec::decode_u32("first history index", &data)
    }

    pub async fn write_first_history_index(&self, index: u32) -> Result<()> {
        self.write(Attribute::FirstHistoryIndex, &codec::encode_u32(index)).await
    }

    pub async fn read_last_calculated_and_next_index(&self) -> Result<HistoryIndices> {
        let data = self.read(Attribute::HistoryIndices).await?;
        codec::decode_history_indices(&data)
    }

    /// The most recently completed hour, read directly rather than via notifications
    pub async fn read_last_hour_record(&self) -> Result<HourlyRecord> {
        let data = self.read(Attribute::LastHourRecord).await?;
        codec::decode_hourly_record(&data)
    }

    /// Download every hourly record the device pushes, up to but excluding `next_index`.
    ///
    /// The device starts streaming records as soon as the history characteristic
    /// is subscribed. After a grace period the received records are checked at
    /// every poll interval until the record at `next_index - 1` has arrived.
    ///
    /// Without a configured stall timeout this waits indefinitely for a device
    /// which stops streaming early. On any error the records received so far
    /// are discarded. The subscription is released on every exit path.
    pub async fn drain_history_records(&mut self) -> Result<Vec<HourlyRecord>> {
        let indices = self.read_last_calculated_and_next_index().await?;
        let Some(last_index) = indices.next_index.checked_sub(1) else {
            info!("Device holds no history");
            return Ok(Vec::new());
        };

        let uuid = Attribute::HistoryData.uuid();
        let mut notifications = self.transport.subscribe(uuid).await?;
        let collected = self.collect_history(&mut notifications, last_index).await;
        drop(notifications);
        let unsubscribed = self.transport.unsubscribe(uuid).await;

        let records = collected?;
        unsubscribed?;
        info!("Drained {} history records", records.len());
        Ok(records)
    }

    async fn collect_history(
        &self,
        notifications: &mut Notifications,
        last_index: u32,
    ) -> Result<Vec<HourlyRecord>> {
        let mut records = Vec::new();
        let mut last_progress = Instant::now();

        sleep(self.config.history_grace_period).await;
        loop {
            let received = records.len();
            if Self::take_pending(notifications, &mut records, last_index)? {
                return Ok(records);
            }

            if records.len() > received {
                last_progress = Instant::now();
            }
            if let Some(stall_timeout) = self.config.history_stall_timeout {
                if last_progress.elapsed() >= stall_timeout {
                    warn!("History drain stalled after {} records", records.len());
                    return Err(Error::HistoryStalled { received: records.len(), last_index });
                }
            }

            sleep(self.config.history_poll_interval).await;
        }
    }

    /// Move every notification already queued into `records`. Returns `true`
    /// once the record at `last_index` has been received.
    fn take_pending(
        notifications: &mut Notifications,
        records: &mut Vec<HourlyRecord>,
        last_index: u32,
    ) -> Result<bool> {
        loop {
            match notifications.try_recv() {
                Ok(data) => {
                    let record = codec::decode_hourly_record(&data?)?;
                    debug!("History record {record}");
                    records.push(record);
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    if is_complete(records, last_index) {
                        return Ok(true);
                    }
                    warn!("History notifications ended after {} records", records.len());
                    return Err(Error::NotificationStreamClosed);
                }
            }
        }
        Ok(is_complete(records, last_index))
    }

    async fn read(&self, attribute: Attribute) -> Result<Vec<u8>> {
        let data = self.transport.read(attribute.uuid()).await?;
        debug!("{attribute:?} = 0x{}", hex::encode(&data));
        Ok(data)
    }

    async fn write(&self, attribute: Attribute, value: &[u8]) -> Result<()> {
        debug!("{attribute:?} <- 0x{}", hex::encode(value));
        self.transport.write(attribute.uuid(), value).await?;
        Ok(())
    }
}

fn is_complete(records: &[HourlyRecord], last_index: u32) -> bool {
    records.last().is_some_and(|record| record.index >= last_index)
}
