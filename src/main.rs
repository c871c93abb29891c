use std::sync::Arc;

use anyhow::Error;
use log::{error, info};
use tokio::sync::{Mutex, Notify};

use glimmer::prelude::*;
use glimmer::{scheduler, server, strip};

#[tokio::main]
async fn main() -> Result<(), Error> {
    env_logger::init();

    info!("Starting config...");
    let config = Config::load()?;

    info!("Starting strip...");
    let strip_state = Arc::new(Mutex::new(StripState::new(config.led_count)));
    let frame_ready = Arc::new(Notify::new());

    #[cfg(feature = "pi")]
    let driver: Box<dyn StripDriver + Send> = Box::new(Ws2812Spi::new(config.led_count)?);
    #[cfg(not(feature = "pi"))]
    let driver: Box<dyn StripDriver + Send> = Box::new(NullStrip);

    let renderer_handle = tokio::spawn(strip::run_renderer(
        strip_state.clone(),
        frame_ready.clone(),
        driver,
    ));

    info!("Starting scheduler...");
    let machine = Arc::new(Mutex::new(Machine::new()));
    let wake = Arc::new(Notify::new());
    let scheduler_handle = tokio::spawn(scheduler::run(
        machine.clone(),
        strip_state.clone(),
        frame_ready.clone(),
        wake.clone(),
    ));

    info!("Starting server...");
    let state = AppState { machine, wake };
    let listen_addr = config.listen_addr.clone();
    let server_handle = tokio::spawn(async move {
        if let Err(e) = server::serve(&listen_addr, state).await {
            error!("control server exited: {}", e);
        }
    });

    info!("Joining...");
    let _ = tokio::join!(renderer_handle, scheduler_handle, server_handle);

    Ok(())
}
