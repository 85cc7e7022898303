use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::anyhow;
use async_trait::async_trait;
use bluest::Uuid;
use lywsd03mmc::characteristics::Attribute;
use lywsd03mmc::transport::{GattTransport, Notifications};
use lywsd03mmc::{ClientConfig, Error, HourlyRecord, SensorClient, TemperatureUnit};
use tokio::sync::mpsc;

#[derive(Default)]
struct MockState {
    connected: bool,
    values: HashMap<Uuid, Vec<u8>>,
    reads: Vec<Uuid>,
    writes: Vec<(Uuid, Vec<u8>)>,
    notifications: Vec<anyhow::Result<Vec<u8>>>,
    close_after_notifications: bool,
    sender: Option<mpsc::UnboundedSender<anyhow::Result<Vec<u8>>>>,
    subscribed: Vec<Uuid>,
    unsubscribed: Vec<Uuid>,
    disconnects: usize,
}

/// In-memory peripheral. Notifications queued before a subscribe are delivered
/// as soon as it happens; the channel stays open until unsubscribe unless
/// `close_after_notifications` is set.
#[derive(Clone, Default)]
struct MockTransport(Arc<Mutex<MockState>>);

impl MockTransport {
    fn with_value(self, attribute: Attribute, value: &[u8]) -> Self {
        self.state().values.insert(attribute.uuid(), value.to_vec());
        self
    }

    fn with_history(self, last_calculated: u32, next_index: u32) -> Self {
        let mut value = last_calculated.to_le_bytes().to_vec();
        value.extend_from_slice(&next_index.to_le_bytes());
        self.with_value(Attribute::HistoryIndices, &value)
    }

    fn with_notification(self, data: anyhow::Result<Vec<u8>>) -> Self {
        self.state().notifications.push(data);
        self
    }

    fn state(&self) -> std::sync::MutexGuard<'_, MockState> {
        self.0.lock().unwrap()
    }

    fn push_notification(&self, data: Vec<u8>) {
        let state = self.state();
        state.sender.as_ref().unwrap().send(Ok(data)).unwrap();
    }
}

#[async_trait]
impl GattTransport for MockTransport {
    async fn connect(&mut self, _timeout: Duration) -> anyhow::Result<bool> {
        self.state().connected = true;
        Ok(true)
    }

    async fn disconnect(&mut self) -> anyhow::Result<()> {
        let mut state = self.state();
        state.connected = false;
        state.disconnects += 1;
        Ok(())
    }

    async fn is_connected(&self) -> bool {
        self.state().connected
    }

    async fn read(&self, characteristic: Uuid) -> anyhow::Result<Vec<u8>> {
        let mut state = self.state();
        state.reads.push(characteristic);
        state
            .values
            .get(&characteristic)
            .cloned()
            .ok_or(anyhow!("Characteristic {characteristic} not found"))
    }

    async fn write(&self, characteristic: Uuid, value: &[u8]) -> anyhow::Result<()> {
        self.state().writes.push((characteristic, value.to_vec()));
        Ok(())
    }

    async fn subscribe(&mut self, characteristic: Uuid) -> anyhow::Result<Notifications> {
        let mut state = self.state();
        state.subscribed.push(characteristic);
        let (tx, rx) = mpsc::unbounded_channel();
        for data in state.notifications.drain(..) {
            tx.send(data).unwrap();
        }
        if !state.close_after_notifications {
            state.sender = Some(tx);
        }
        Ok(rx)
    }

    async fn unsubscribe(&mut self, characteristic: Uuid) -> anyhow::Result<()> {
        let mut state = self.state();
        state.unsubscribed.push(characteristic);
        state.sender = None;
        Ok(())
    }
}

fn record(index: u32) -> HourlyRecord {
    HourlyRecord {
        index,
        timestamp: 1_700_000_000 + index * 3600,
        temperature_max_raw: 250,
        humidity_max: 60,
        temperature_min_raw: 180,
        humidity_min: 40,
    }
}

fn record_bytes(record: &HourlyRecord) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(14);
    bytes.extend_from_slice(&record.index.to_le_bytes());
    bytes.extend_from_slice(&record.timestamp.to_le_bytes());
    bytes.extend_from_slice(&record.temperature_max_raw.to_le_bytes());
    bytes.push(record.humidity_max);
    bytes.extend_from_slice(&record.temperature_min_raw.to_le_bytes());
    bytes.push(record.humidity_min);
    bytes
}

fn client(transport: &MockTransport) -> SensorClient<MockTransport> {
    SensorClient::new(transport.clone(), ClientConfig::default())
}

fn history_uuid() -> Uuid {
    Attribute::HistoryData.uuid()
}

#[tokio::test]
async fn test_read_reading() {
    let transport =
        MockTransport::default().with_value(Attribute::Reading, &hex::decode("a80817b90b").unwrap());
    let reading = client(&transport).read_reading().await.unwrap();
    assert_eq!(reading.temperature(), 22.16);
    assert_eq!(reading.humidity, 23);
    assert_eq!(reading.battery_mv, 3001);
    assert_eq!(transport.state().reads, vec![Attribute::Reading.uuid()]);
}

#[tokio::test]
async fn test_read_battery() {
    let transport = MockTransport::default().with_value(Attribute::Battery, &[0x5f]);
    assert_eq!(client(&transport).read_battery().await.unwrap(), 95);
}

#[tokio::test]
async fn test_read_temperature_unit() {
    let transport = MockTransport::default().with_value(Attribute::TemperatureUnit, &[0x01]);
    assert_eq!(
        client(&transport).read_temperature_unit().await.unwrap(),
        TemperatureUnit::Fahrenheit
    );

    let transport = MockTransport::default().with_value(Attribute::TemperatureUnit, &[0x07]);
    let result = client(&transport).read_temperature_unit().await;
    assert!(matches!(result, Err(Error::UnrecognizedValue { value: 0x07, .. })));
}

#[tokio::test]
async fn test_writes() {
    let transport = MockTransport::default();
    let client = client(&transport);
    client.set_celsius().await.unwrap();
    client.set_fahrenheit().await.unwrap();
    client.write_device_clock(1_700_000_000).await.unwrap();
    client.write_first_history_index(42).await.unwrap();

    assert_eq!(
        transport.state().writes,
        vec![
            (Attribute::TemperatureUnit.uuid(), vec![0x00]),
            (Attribute::TemperatureUnit.uuid(), vec![0x01]),
            (Attribute::Clock.uuid(), hex::decode("00f15365").unwrap()),
            (Attribute::FirstHistoryIndex.uuid(), vec![42, 0, 0, 0]),
        ]
    );
}

#[tokio::test]
async fn test_read_device_clock() {
    let transport =
        MockTransport::default().with_value(Attribute::Clock, &hex::decode("00f15365").unwrap());
    assert_eq!(client(&transport).read_device_clock().await.unwrap(), 1_700_000_000);
}

#[tokio::test]
async fn test_read_first_history_index_empty_is_zero() {
    let transport = MockTransport::default().with_value(Attribute::FirstHistoryIndex, &[]);
    assert_eq!(client(&transport).read_first_history_index().await.unwrap(), 0);

    let transport =
        MockTransport::default().with_value(Attribute::FirstHistoryIndex, &[0x10, 0x01, 0, 0]);
    assert_eq!(client(&transport).read_first_history_index().await.unwrap(), 272);
}

#[tokio::test]
async fn test_read_first_history_index_truncated() {
    let transport = MockTransport::default().with_value(Attribute::FirstHistoryIndex, &[0x10, 0x01]);
    let result = client(&transport).read_first_history_index().await;
    assert!(matches!(result, Err(Error::Decode { expected: 4, actual: 2, .. })));
}

#[tokio::test]
async fn test_read_last_calculated_and_next_index() {
    let transport = MockTransport::default().with_history(16, 17);
    let indices = client(&transport).read_last_calculated_and_next_index().await.unwrap();
    assert_eq!(indices.last_calculated, 16);
    assert_eq!(indices.next_index, 17);
}

#[tokio::test]
async fn test_read_last_hour_record() {
    let expected = record(9);
    let transport =
        MockTransport::default().with_value(Attribute::LastHourRecord, &record_bytes(&expected));
    let record = client(&transport).read_last_hour_record().await.unwrap();
    assert_eq!(record, expected);
    assert_eq!(record.temperature_max(), 25.0);
    assert!(transport.state().subscribed.is_empty());
}

#[tokio::test]
async fn test_transport_error_is_propagated_without_retry() {
    let transport = MockTransport::default();
    let result = client(&transport).read_reading().await;
    match result {
        Err(Error::Transport(err)) => assert!(err.to_string().contains("not found")),
        other => panic!("expected transport error, got {other:?}"),
    }
    assert_eq!(transport.state().reads.len(), 1);
}

#[tokio::test]
async fn test_disconnect_only_when_connected() {
    let transport = MockTransport::default();
    client(&transport).disconnect().await.unwrap();
    assert_eq!(transport.state().disconnects, 0);

    let mut connected = client(&transport);
    assert!(connected.connect().await.unwrap());
    connected.disconnect().await.unwrap();
    assert_eq!(transport.state().disconnects, 1);
    assert!(!transport.state().connected);
}

#[tokio::test(start_paused = true)]
async fn test_drain_history_records() {
    let transport = MockTransport::default()
        .with_history(2, 3)
        .with_notification(Ok(record_bytes(&record(0))))
        .with_notification(Ok(record_bytes(&record(1))))
        .with_notification(Ok(record_bytes(&record(2))));

    let records = client(&transport).drain_history_records().await.unwrap();

    assert_eq!(records, vec![record(0), record(1), record(2)]);
    let state = transport.state();
    assert_eq!(state.subscribed, vec![history_uuid()]);
    assert_eq!(state.unsubscribed, vec![history_uuid()]);
}

#[tokio::test(start_paused = true)]
async fn test_drain_history_records_from_nonzero_index() {
    let transport = MockTransport::default()
        .with_history(7, 8)
        .with_notification(Ok(record_bytes(&record(5))))
        .with_notification(Ok(record_bytes(&record(6))))
        .with_notification(Ok(record_bytes(&record(7))));

    let records = client(&transport).drain_history_records().await.unwrap();
    let indices: Vec<u32> = records.iter().map(|r| r.index).collect();
    assert_eq!(indices, vec![5, 6, 7]);
}

#[tokio::test(start_paused = true)]
async fn test_drain_waits_for_late_records() {
    let transport = MockTransport::default()
        .with_history(2, 3)
        .with_notification(Ok(record_bytes(&record(0))))
        .with_notification(Ok(record_bytes(&record(1))));

    let pusher = transport.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(10)).await;
        pusher.push_notification(record_bytes(&record(2)));
    });

    let started = tokio::time::Instant::now();
    let records = client(&transport).drain_history_records().await.unwrap();
    assert_eq!(records, vec![record(0), record(1), record(2)]);
    assert!(started.elapsed() >= Duration::from_secs(10));
    assert_eq!(transport.state().unsubscribed.len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_drain_without_history_does_not_subscribe() {
    let transport = MockTransport::default().with_history(0, 0);
    let records = client(&transport).drain_history_records().await.unwrap();
    assert!(records.is_empty());
    assert!(transport.state().subscribed.is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_drain_never_ends_when_device_stalls() {
    let transport = MockTransport::default()
        .with_history(2, 3)
        .with_notification(Ok(record_bytes(&record(0))))
        .with_notification(Ok(record_bytes(&record(1))));

    let mut client = client(&transport);
    let result =
        tokio::time::timeout(Duration::from_secs(3600), client.drain_history_records()).await;
    assert!(result.is_err());
}

#[tokio::test(start_paused = true)]
async fn test_drain_stall_timeout() {
    let transport = MockTransport::default()
        .with_history(2, 3)
        .with_notification(Ok(record_bytes(&record(0))))
        .with_notification(Ok(record_bytes(&record(1))));
    let config = ClientConfig::default().with_history_stall_timeout(Some(Duration::from_secs(30)));

    let result = SensorClient::new(transport.clone(), config).drain_history_records().await;

    assert!(matches!(result, Err(Error::HistoryStalled { received: 2, last_index: 2 })));
    assert_eq!(transport.state().unsubscribed, vec![history_uuid()]);
}

#[tokio::test(start_paused = true)]
async fn test_drain_failure_discards_received_records() {
    let transport = MockTransport::default()
        .with_history(2, 3)
        .with_notification(Ok(record_bytes(&record(0))))
        .with_notification(Err(anyhow!("link lost")));

    let result = client(&transport).drain_history_records().await;

    match result {
        Err(Error::Transport(err)) => assert_eq!(err.to_string(), "link lost"),
        other => panic!("expected transport error, got {other:?}"),
    }
    assert_eq!(transport.state().unsubscribed, vec![history_uuid()]);
}

#[tokio::test(start_paused = true)]
async fn test_drain_truncated_notification() {
    let mut truncated = record_bytes(&record(0));
    truncated.truncate(10);
    let transport = MockTransport::default()
        .with_history(0, 1)
        .with_notification(Ok(truncated));

    let result = client(&transport).drain_history_records().await;

    assert!(matches!(result, Err(Error::Decode { expected: 14, actual: 10, .. })));
    assert_eq!(transport.state().unsubscribed, vec![history_uuid()]);
}

#[tokio::test(start_paused = true)]
async fn test_drain_stream_closed_early() {
    let transport = MockTransport::default()
        .with_history(2, 3)
        .with_notification(Ok(record_bytes(&record(0))));
    transport.state().close_after_notifications = true;

    let result = client(&transport).drain_history_records().await;

    assert!(matches!(result, Err(Error::NotificationStreamClosed)));
    assert_eq!(transport.state().unsubscribed, vec![history_uuid()]);
}

#[tokio::test(start_paused = true)]
async fn test_drain_stream_closed_after_last_record() {
    let transport = MockTransport::default()
        .with_history(1, 2)
        .with_notification(Ok(record_bytes(&record(0))))
        .with_notification(Ok(record_bytes(&record(1))));
    transport.state().close_after_notifications = true;

    let records = client(&transport).drain_history_records().await.unwrap();
    assert_eq!(records, vec![record(0), record(1)]);
}
