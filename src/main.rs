use lywsd03mmc::{ClientConfig, SensorClient};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .format_timestamp_secs()
        .init();

    let config = ClientConfig::from_env()?;
    let mut client = SensorClient::discover(config).await?;
    if !client.connect().await? {
        anyhow::bail!("Failed to connect to {}", client.config().device_name);
    }

    println!("Reading: {}", client.read_reading().await?);
    println!("Battery: {}%", client.read_battery().await?);
    println!("Unit: {}", client.read_temperature_unit().await?);
    println!("Clock: {}", client.read_device_clock().await?);
    println!("First history index: {}", client.read_first_history_index().await?);
    let indices = client.read_last_calculated_and_next_index().await?;
    println!("Last calculated index: {}, next index: {}", indices.last_calculated, indices.next_index);
    println!("Last hour: {}", client.read_last_hour_record().await?);

    for record in client.drain_history_records().await? {
        println!("{record}");
    }

    client.disconnect().await?;
    Ok(())
}
