use std::time::Duration;

use anyhow::anyhow;
use bluest::Adapter;
use futures_util::StreamExt;

async fn scan(adapter: &Adapter, duration: Duration) -> anyhow::Result<()> {
    let mut events = adapter.scan(&[]).await?;
    let deadline = tokio::time::Instant::now() + duration;
    while let Ok(Some(device)) = tokio::time::timeout_at(deadline, events.next()).await {
        let name = device.device.name_async().await.unwrap_or_default();
        println!("Name: {name}. RSSI: {:?}. Id: {:?}.", device.rssi, device.device.id());
    }
    Ok(())
}

#[tokio::main]
pub async fn main() -> anyhow::Result<()> {
    env_logger::init();
    let adapter = Adapter::default()
        .await
        .ok_or(anyhow!("Default adapter not found"))?;
    adapter.wait_available().await?;

    loop {
        scan(&adapter, Duration::from_secs(10)).await?;
        println!("next cycle");
    }
}
