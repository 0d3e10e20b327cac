use anyhow::{Context, Result};
use carechat::audio::AudioCapture;
use carechat::integration::{AppConfig, TurnController};
use carechat::llm::GeminiCompleter;
use carechat::speech::GoogleSpeechTranscriber;
use carechat::ui::ChatApp;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "carechat=debug,info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Health Care ChatBot");

    let config = AppConfig::from_env().context("failed to load configuration")?;

    let capture = if config.enable_audio_input {
        open_microphone()
    } else {
        None
    };

    let controller = TurnController::start(
        config.recording.clone(),
        capture,
        Arc::new(GoogleSpeechTranscriber::new(config.speech.clone())),
        Arc::new(GeminiCompleter::new(config.completion.clone())),
    )
    .context("failed to start turn worker")?;

    let shell = config.shell.clone();
    let title = shell.title.clone();
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title(&title)
            .with_inner_size([900.0, 640.0])
            .with_min_inner_size([480.0, 360.0]),
        ..Default::default()
    };

    eframe::run_native(
        &title,
        options,
        Box::new(move |cc| Ok(Box::new(ChatApp::new(cc, controller, shell)))),
    )
    .map_err(|e| anyhow::anyhow!("eframe error: {}", e))?;

    Ok(())
}

#[cfg(feature = "audio-io")]
fn open_microphone() -> Option<Box<dyn AudioCapture>> {
    match carechat::audio::MicrophoneCapture::new() {
        Ok(mic) => Some(Box::new(mic)),
        Err(e) => {
            warn!("Voice input unavailable: {}", e);
            None
        }
    }
}

#[cfg(not(feature = "audio-io"))]
fn open_microphone() -> Option<Box<dyn AudioCapture>> {
    warn!("Built without audio-io; voice input unavailable");
    None
}
