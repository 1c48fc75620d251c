//! soundboard-daemon: Background daemon for a physical-button soundboard
//!
//! Buttons held together form a combo; each combo is bound to a sound from
//! the board file. The daemon provides:
//! - A controller listener turning button edges into press/release commands
//! - A single dispatcher that plays and ends sounds in event order
//! - An IPC server for triggering the board and querying its status
//! - Periodic weather readings for the spoken temperature report

mod audio;
mod board;
mod config;
mod events;
mod input;
mod ipc;
mod lifecycle;
mod sound;
mod sources;
mod speech;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::UNIX_EPOCH;

use anyhow::{Context, Result};
use rodio::OutputStream;
use tokio::sync::{broadcast, mpsc};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::audio::RodioMixer;
use crate::board::SoundSet;
use crate::config::{BoardConfig, Config};
use crate::events::BoardEvent;
use crate::input::InputListener;
use crate::ipc::{BoardStatus, Server};
use crate::lifecycle::ShutdownSignal;
use crate::sound::{Registry, SoundContext, SoundFactory};
use crate::sources::{OpenWeatherMap, ScheduledTransit, Units};
use crate::speech::WordFileTokenizer;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info"))
        )
        .init();

    info!(
        version = env!("CARGO_PKG_VERSION"),
        "soundboard-daemon starting"
    );

    // Load configuration
    let config = Config::load(std::env::args_os().nth(1).map(PathBuf::from))?;
    config.ensure_dirs()?;
    info!(?config.board_path, ?config.socket_path, "configuration loaded");

    let board_config = BoardConfig::from_file(&config.board_path)?;

    // The output stream must outlive every chunk
    let (_stream, stream_handle) =
        OutputStream::try_default().context("failed to open audio output")?;
    let mixer = RodioMixer::new(&stream_handle)?;

    let weather = Arc::new(OpenWeatherMap::new(
        config.weather.api_url.clone(),
        config.weather.api_key.clone(),
    ));

    // Sound types are registered before any sound is built
    let registry = Arc::new(Registry::with_builtin());
    let factory = SoundFactory::new(
        registry,
        SoundContext {
            mixer: Arc::new(mixer),
            base_dir: board_config.wav_directory.clone(),
            tokenizer: Arc::new(WordFileTokenizer::default()),
            weather: weather.clone(),
            transit: Arc::new(ScheduledTransit::default()),
        },
    );

    // Board events -> IPC status
    let (event_tx, _event_rx) = broadcast::channel::<BoardEvent>(64);

    // A broken board is worse than silence: any load error aborts here
    let mut sound_set = SoundSet::load(&board_config, &factory)
        .with_context(|| format!("failed to load board {}", config.board_path.display()))?
        .with_events(event_tx.clone());

    // Controller, IPC clients and weather refresh -> dispatcher
    let (command_tx, command_rx) = mpsc::channel(32);

    let input_listener = InputListener::new(command_tx.clone());
    match input_listener.start() {
        Ok(()) => {
            info!("input listener started");
        }
        Err(e) => {
            error!(?e, "failed to start input listener");
            warn!("continuing without controller input - IPC only");
        }
    }

    let weather_refresh = tokio::spawn(sources::refresh_weather(
        weather,
        sound_set.weather_locations(),
        Units::Metric,
        config.weather.refresh,
        command_tx.clone(),
    ));

    let status = BoardStatus {
        board: sound_set.name().to_string(),
        sounds: sound_set.len(),
        busy_time: sound_set
            .busy_time()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0),
        ..BoardStatus::default()
    };
    let server = Server::new(&config.socket_path, status, command_tx)?;

    let mut ipc_event_rx = event_tx.subscribe();
    let server_for_events = &server;

    let shutdown = ShutdownSignal::new();

    info!("daemon initialized, entering main loop");

    // Main event loop
    tokio::select! {
        // Run the dispatcher (processes button commands)
        _ = sound_set.run(command_rx) => {
            info!("dispatcher exited");
        }

        // Run the IPC server (accepts client connections)
        result = server.run() => {
            if let Err(e) = result {
                error!(?e, "IPC server error");
            }
        }

        // Mirror board events into the IPC status
        _ = async {
            loop {
                match ipc_event_rx.recv().await {
                    Ok(event) => {
                        info!(%event, "board event");
                        server_for_events.set_last_event(event).await;
                    }
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        warn!(skipped = n, "board event receiver lagged");
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        break;
                    }
                }
            }
        } => {
            info!("board event handler exited");
        }

        // Wait for shutdown signal
        result = shutdown.wait() => {
            match result {
                Ok(()) => info!("shutdown signal received"),
                Err(e) => error!(?e, "failed to register signal handlers"),
            }
        }
    }

    // Cleanup
    info!("shutting down...");

    input_listener.stop();
    weather_refresh.abort();
    server.shutdown().await;

    info!("soundboard-daemon stopped");

    Ok(())
}
