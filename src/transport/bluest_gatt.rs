use std::collections::HashMap;
use std::time::Duration;

use anyhow::anyhow;
use async_trait::async_trait;
use bluest::Adapter;
use bluest::AdvertisingDevice;
use bluest::Characteristic;
use bluest::Device;
use bluest::Uuid;
use futures_util::StreamExt;
use log::{debug, info, warn};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::timeout;

use super::{GattTransport, Notifications};
use crate::characteristics::SENSOR_SERVICE_UUID;

/// [`GattTransport`] backed by the platform Bluetooth stack through `bluest`
pub struct BluestTransport {
    adapter: Adapter,
    device: Device,
    characteristics: HashMap<Uuid, Characteristic>,
    subscriptions: HashMap<Uuid, JoinHandle<()>>,
}

impl BluestTransport {
    /// Scan until a device advertising `name` is seen, without connecting to it.
    pub async fn discover(name: &str, scan_timeout: Duration) -> anyhow::Result<Self> {
        let adapter = Adapter::default()
            .await
            .ok_or(anyhow!("Default adapter not found"))?;
        adapter.wait_available().await?;

        let device = timeout(scan_timeout, Self::discover_device(name, &adapter))
            .await
            .map_err(|_| anyhow!("Device {name} not found"))??;
        info!("Found {name} (rssi {:?})", device.rssi);

        Ok(Self::new(adapter, device.device))
    }

    /// Wrap an already discovered device.
    pub fn new(adapter: Adapter, device: Device) -> Self {
        Self { adapter, device, characteristics: HashMap::new(), subscriptions: HashMap::new() }
    }

    pub fn device(&self) -> &Device {
        &self.device
    }

    async fn discover_device(name: &str, adapter: &Adapter) -> anyhow::Result<AdvertisingDevice> {
        let mut adapter_events = adapter.scan(&[]).await?;
        while let Some(device) = adapter_events.next().await {
            let device_name = match device.device.name_async().await {
                Ok(device_name) => device_name,
                Err(_) => continue,
            };
            if device_name == name {
                return Ok(device);
            }
        }

        Err(anyhow!("Device {name} not found"))
    }

    async fn discover_characteristics(&mut self) -> anyhow::Result<()> {
        let service = self
            .device
            .discover_services_with_uuid(SENSOR_SERVICE_UUID)
            .await?
            .first()
            .ok_or(anyhow!("The specified device does not expose the sensor service."))?
            .clone();
        self.characteristics = service
            .discover_characteristics()
            .await?
            .into_iter()
            .map(|characteristic| (characteristic.uuid(), characteristic))
            .collect();
        debug!("Discovered {} characteristics", self.characteristics.len());
        Ok(())
    }

    fn characteristic(&self, uuid: Uuid) -> anyhow::Result<&Characteristic> {
        self.characteristics
            .get(&uuid)
            .ok_or(anyhow!("Characteristic {uuid} not found"))
    }
}

#[async_trait]
impl GattTransport for BluestTransport {
    async fn connect(&mut self, connect_timeout: Duration) -> anyhow::Result<bool> {
        if !self.device.is_connected().await {
            match timeout(connect_timeout, self.adapter.connect_device(&self.device)).await {
                Ok(result) => result?,
                Err(_) => {
                    warn!("Connection not established within {connect_timeout:?}");
                    return Ok(false);
                }
            }
        }
        self.discover_characteristics().await?;
        info!("Connected");
        Ok(true)
    }

    async fn disconnect(&mut self) -> anyhow::Result<()> {
        for (_, task) in self.subscriptions.drain() {
            task.abort();
        }
        self.adapter.disconnect_device(&self.device).await?;
        info!("Disconnected");
        Ok(())
    }

    async fn is_connected(&self) -> bool {
        self.device.is_connected().await
    }

    async fn read(&self, uuid: Uuid) -> anyhow::Result<Vec<u8>> {
        let value = self.characteristic(uuid)?.read().await?;
        debug!("RX {uuid}: 0x{}", hex::encode(&value));
        Ok(value)
    }

    async fn write(&self, uuid: Uuid, value: &[u8]) -> anyhow::Result<()> {
        debug!("TX {uuid}: 0x{}", hex::encode(value));
        self.characteristic(uuid)?.write(value).await?;
        Ok(())
    }

    async fn subscribe(&mut self, uuid: Uuid) -> anyhow::Result<Notifications> {
        let characteristic = self.characteristic(uuid)?.clone();
        let (tx, rx) = mpsc::unbounded_channel();

        // Dropping the notify stream is what unsubscribes, so the stream lives
        // inside the task and aborting the task ends the subscription.
        let task = tokio::spawn(async move {
            let mut reader = match characteristic.notify().await {
                Ok(reader) => reader,
                Err(err) => {
                    let _ = tx.send(Err(err.into()));
                    return;
                }
            };
            while let Some(data) = reader.next().await {
                match &data {
                    Ok(data) => debug!("RX notification {uuid}: 0x{}", hex::encode(data)),
                    Err(err) => warn!("Notification error on {uuid}: {err}"),
                }
                if tx.send(data.map_err(anyhow::Error::from)).is_err() {
                    break;
                }
            }
            debug!("End of notification stream for {uuid}");
        });

        if let Some(previous) = self.subscriptions.insert(uuid, task) {
            previous.abort();
        }
        Ok(rx)
    }

    async fn unsubscribe(&mut self, uuid: Uuid) -> anyhow::Result<()> {
        match self.subscriptions.remove(&uuid) {
            Some(task) => {
                task.abort();
                Ok(())
            }
            None => Err(anyhow!("Not subscribed to {uuid}")),
        }
    }
}
