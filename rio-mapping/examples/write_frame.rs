/// Encode an EY-EM510 configuration and write the frames verbatim to a file
use std::time::Duration;

use rio_mapping::device::{Em510Frame, EyEm510, RemoteIoTimeoutsFrame};
use rio_mapping::sink::write_frame;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), rio_mapping::Error> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let path = std::env::args().nth(1).unwrap_or_else(|| "em510.dat".to_string());

    let mut config = EyEm510::default();
    config.triac_01.safety_value = true;
    config.triac_03.polarity = true;
    config.relay_25.pulse_duration = Duration::from_millis(120);
    config.ai_23 = true;
    config.remote_io.slc_timeout = Duration::from_secs(15);

    let mut file = tokio::fs::File::create(&path).await?;
    let mut written = write_frame::<Em510Frame, _>(&mut file, &config).await?;
    written += write_frame::<RemoteIoTimeoutsFrame, _>(&mut file, &config).await?;

    println!("{written} bytes written to {path}");

    Ok(())
}
