//! Nihongo Master: Rust learning core.
//!
//! Communicates with the UI shell via JSON-line IPC on stdin/stdout.
//! This is the entry point that initializes all subsystems and runs the
//! main event loop.

mod app;
mod audio;
mod chat;
mod config;
mod content;
mod exercise;
mod gemini;
mod ipc;
mod logger;
mod tts;

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{info, warn};

use app::App;
use audio::{AudioOutput, AudioPlayer};
use chat::RoleplayModel;
use config::read_app_config;
use gemini::GeminiClient;
use ipc::bridge::{emit_event, spawn_stdin_reader};
use ipc::AppEvent;
use tts::{SpeechPipeline, SpeechSynthesizer};

#[tokio::main]
async fn main() {
    let config = read_app_config();
    let _log_guard = logger::init(config.logging.file);

    // Emit starting event immediately so the UI knows we're alive.
    emit_event(&AppEvent::Starting {});

    emit_event(&AppEvent::Loading {
        step: "Reading configuration...".to_string(),
    });
    info!(
        chat_model = %config.gemini.chat_model,
        tts_model = %config.gemini.tts_model,
        seed = ?config.exercise.seed,
        "Configuration loaded"
    );

    let gemini = match config.api_key() {
        Some(key) => Some(Arc::new(GeminiClient::new(config.gemini.clone(), &key))),
        None => {
            warn!("No Gemini API key configured; speech and roleplay are disabled");
            None
        }
    };

    emit_event(&AppEvent::Loading {
        step: "Initializing audio...".to_string(),
    });
    let player = match AudioPlayer::new(config.speech.volume) {
        Ok(player) => Some(Arc::new(player)),
        Err(e) => {
            warn!("Audio output unavailable: {:#}", e);
            None
        }
    };

    let speech = match (&gemini, &player) {
        (Some(client), Some(player)) => {
            let synthesizer: Arc<dyn SpeechSynthesizer> = client.clone();
            let output: Arc<dyn AudioOutput> = player.clone();
            Some(SpeechPipeline::new(
                synthesizer,
                output,
                config.speech.timeouts(),
            ))
        }
        _ => None,
    };
    let chat_model = gemini.map(|client| client as Arc<dyn RoleplayModel>);

    emit_event(&AppEvent::Loading {
        step: "Starting IPC bridge...".to_string(),
    });
    let mut cmd_rx = spawn_stdin_reader();
    let (event_tx, mut event_rx) = mpsc::unbounded_channel();
    let (mut app, mut reply_rx) = App::new(config.exercise.seed, speech, chat_model, event_tx);

    emit_event(&AppEvent::Ready {});
    info!("Nihongo core ready");

    // Main loop: commands from the UI, finished chat replies, and events
    // from background tasks.
    loop {
        tokio::select! {
            cmd = cmd_rx.recv() => {
                match cmd {
                    Some(command) => {
                        let keep_running = app.handle_command(command);
                        while let Ok(event) = event_rx.try_recv() {
                            emit_event(&event);
                        }
                        if !keep_running {
                            break; // Stop command received
                        }
                    }
                    None => {
                        // stdin closed, parent process gone
                        info!("stdin closed, shutting down");
                        break;
                    }
                }
            }
            Some(reply) = reply_rx.recv() => app.complete_chat(reply),
            Some(event) = event_rx.recv() => emit_event(&event),
        }
    }

    info!("Nihongo core shutting down");
    if let Some(player) = player {
        player.shutdown();
    }
}
