use std::time::Duration;

use lywsd03mmc::{ClientConfig, SensorClient};

async fn read_once(config: ClientConfig) -> anyhow::Result<()> {
    let mut client = SensorClient::discover(config).await?;
    if !client.connect().await? {
        anyhow::bail!("connection timed out");
    }
    let reading = client.read_reading().await;
    client.disconnect().await?;
    println!("{}", reading?);
    Ok(())
}

#[tokio::main]
pub async fn main() -> anyhow::Result<()> {
    env_logger::init();
    let config = ClientConfig::from_env()?;
    loop {
        if let Err(err) = read_once(config.clone()).await {
            println!("Error: {err}");
        }
        tokio::time::sleep(Duration::from_secs(5)).await;
    }
}
