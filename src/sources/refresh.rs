//! Periodic weather refresh
//!
//! Readings are fetched off the dispatcher and delivered to it as
//! commands, so weather sounds never block on the network when pressed.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::board::BoardCommand;

use super::{Location, Units, WeatherSource};

/// Fetch every location each `every`, forwarding successful readings
///
/// Returns when there is nothing to refresh or the dispatcher is gone.
pub async fn refresh_weather(
    source: Arc<dyn WeatherSource>,
    locations: Vec<Location>,
    units: Units,
    every: Duration,
    command_tx: mpsc::Sender<BoardCommand>,
) {
    if locations.is_empty() {
        debug!("no weather sounds, refresh disabled");
        return;
    }

    info!(locations = locations.len(), every_secs = every.as_secs(), "weather refresh started");

    let mut ticker = tokio::time::interval(every);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;

        for location in &locations {
            let fetch_source = Arc::clone(&source);
            let fetch_location = location.clone();
            let reading = tokio::task::spawn_blocking(move || {
                fetch_source.fetch_temperature(&fetch_location, units)
            })
            .await;

            let temperature = match reading {
                Ok(Some(t)) => t,
                Ok(None) => {
                    debug!(%location, "temperature unavailable, keeping last reading");
                    continue;
                }
                Err(e) => {
                    warn!(%location, ?e, "weather fetch task failed");
                    continue;
                }
            };

            let command = BoardCommand::UpdateTemperature {
                location: location.clone(),
                temperature,
            };
            if command_tx.send(command).await.is_err() {
                info!("dispatcher gone, weather refresh stopped");
                return;
            }
        }
    }
}
