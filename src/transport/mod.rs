//! The boundary between the sensor protocol and the BLE stack.
//!
//! [`SensorClient`](crate::SensorClient) only needs to read, write and subscribe
//! to characteristics by UUID. Anything which can do that can drive a sensor,
//! which is also how the client is tested without hardware.

use std::time::Duration;

use async_trait::async_trait;
use bluest::Uuid;
use tokio::sync::mpsc;

mod bluest_gatt;

pub use bluest_gatt::BluestTransport;

/// Values pushed by the device after [`GattTransport::subscribe`], in arrival order.
///
/// The receiver closing means the subscription ended on the transport side.
pub type Notifications = mpsc::UnboundedReceiver<anyhow::Result<Vec<u8>>>;

/// A GATT client session with a single peripheral.
///
/// Implementations are not required to serialise concurrent calls; the client
/// never issues more than one at a time.
#[async_trait]
pub trait GattTransport: Send + Sync {
    /// Establish the connection. Returns `false` if it was not established within `timeout`.
    async fn connect(&mut self, timeout: Duration) -> anyhow::Result<bool>;

    async fn disconnect(&mut self) -> anyhow::Result<()>;

    async fn is_connected(&self) -> bool;

    async fn read(&self, characteristic: Uuid) -> anyhow::Result<Vec<u8>>;

    async fn write(&self, characteristic: Uuid, value: &[u8]) -> anyhow::Result<()>;

    /// Start forwarding notifications from `characteristic` into a channel.
    async fn subscribe(&mut self, characteristic: Uuid) -> anyhow::Result<Notifications>;

    /// Stop a subscription started by [`GattTransport::subscribe`].
    async fn unsubscribe(&mut self, characteristic: Uuid) -> anyhow::Result<()>;
}
