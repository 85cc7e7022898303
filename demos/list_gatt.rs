use std::time::Duration;

use lywsd03mmc::characteristics::Attribute;
use lywsd03mmc::transport::{BluestTransport, GattTransport};
use lywsd03mmc::ClientConfig;

#[tokio::main]
pub async fn main() -> anyhow::Result<()> {
    env_logger::init();
    let config = ClientConfig::from_env()?;
    let mut transport = BluestTransport::discover(&config.device_name, config.scan_timeout).await?;
    if !transport.connect(config.connect_timeout).await? {
        anyhow::bail!("connection timed out");
    }

    for service in transport.device().discover_services().await? {
        println!("Service: {}", service.uuid());
        for characteristic in service.discover_characteristics().await? {
            let uuid = characteristic.uuid();
            let props = characteristic.properties().await?;
            let name = Attribute::from_uuid(uuid)
                .map(|attribute| format!("{attribute:?}"))
                .unwrap_or_default();
            println!("\tCh: {uuid} {name}");
            println!("\t\t{props:?}");
            if props.read {
                match tokio::time::timeout(Duration::from_secs(5), characteristic.read()).await {
                    Ok(Ok(value)) => println!("\t\tvalue: 0x{}", hex::encode(value)),
                    Ok(Err(err)) => println!("\t\terror: {err}"),
                    Err(_) => println!("\t\ttimeout"),
                }
            }
        }
    }

    transport.disconnect().await?;
    Ok(())
}
