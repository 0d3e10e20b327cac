//! Scripted adapters shared by the integration and UI tests

#![allow(dead_code)]

use async_trait::async_trait;
use carechat::audio::{AudioCapture, AudioData};
use carechat::integration::{RecordingConfig, TurnController};
use carechat::llm::{Completer, CompletionResult};
use carechat::speech::{Transcriber, TranscriptionResult};
use carechat::{CareChatError, Result};
use crossbeam_channel::{unbounded, Receiver, Sender};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

pub const TIMEOUT: Duration = Duration::from_secs(5);

/// Blocks a scripted adapter until the test releases it
#[derive(Clone)]
pub struct Gate {
    tx: Sender<()>,
    rx: Receiver<()>,
}

impl Gate {
    pub fn new() -> Self {
        let (tx, rx) = unbounded();
        Self { tx, rx }
    }

    /// Let one waiting call through
    pub fn open(&self) {
        let _ = self.tx.send(());
    }

    fn wait(&self) {
        let _ = self.rx.recv_timeout(TIMEOUT);
    }
}

/// Completer that replays queued results, then echoes the prompt
#[derive(Clone, Default)]
pub struct ScriptedCompleter {
    script: Arc<Mutex<VecDeque<CompletionResult>>>,
    prompts: Arc<Mutex<Vec<String>>>,
    gate: Option<Gate>,
}

impl ScriptedCompleter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn then(self, result: CompletionResult) -> Self {
        self.script.lock().push_back(result);
        self
    }

    pub fn gated(mut self, gate: &Gate) -> Self {
        self.gate = Some(gate.clone());
        self
    }

    /// Every prompt received so far, in order
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().clone()
    }
}

#[async_trait]
impl Completer for ScriptedCompleter {
    async fn complete(&self, prompt: &str) -> CompletionResult {
        self.prompts.lock().push(prompt.to_string());
        if let Some(gate) = &self.gate {
            gate.wait();
        }
        let next = self.script.lock().pop_front();
        next.unwrap_or_else(|| Ok(format!("Answer to: {}", prompt)))
    }
}

/// Transcriber that replays queued results
#[derive(Clone, Default)]
pub struct ScriptedTranscriber {
    script: Arc<Mutex<VecDeque<TranscriptionResult>>>,
    calls: Arc<Mutex<usize>>,
    gate: Option<Gate>,
}

impl ScriptedTranscriber {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn then(self, result: TranscriptionResult) -> Self {
        self.script.lock().push_back(result);
        self
    }

    pub fn gated(mut self, gate: &Gate) -> Self {
        self.gate = Some(gate.clone());
        self
    }

    pub fn calls(&self) -> usize {
        *self.calls.lock()
    }
}

#[async_trait]
impl Transcriber for ScriptedTranscriber {
    async fn transcribe(&self, _audio: &AudioData) -> TranscriptionResult {
        *self.calls.lock() += 1;
        if let Some(gate) = &self.gate {
            gate.wait();
        }
        let next = self.script.lock().pop_front();
        next.unwrap_or(Ok(String::new()))
    }
}

/// Completer whose call panics, taking the worker thread down with it
pub struct PanickingCompleter;

#[async_trait]
impl Completer for PanickingCompleter {
    async fn complete(&self, _prompt: &str) -> CompletionResult {
        panic!("completion backend crashed");
    }
}

/// Returns silence of the requested length
pub struct SilentCapture;

impl AudioCapture for SilentCapture {
    fn capture(&mut self, duration: Duration, sample_rate: u32) -> Result<AudioData> {
        let frames = (duration.as_secs_f32() * sample_rate as f32) as usize;
        Ok(AudioData::new(vec![0; frames], sample_rate, 1))
    }
}

/// Simulates a missing microphone
pub struct BrokenCapture;

impl AudioCapture for BrokenCapture {
    fn capture(&mut self, _duration: Duration, _sample_rate: u32) -> Result<AudioData> {
        Err(CareChatError::AudioDeviceError(
            "No input device available".to_string(),
        ))
    }
}

fn short_recording() -> RecordingConfig {
    RecordingConfig {
        duration: Duration::from_millis(100),
        sample_rate: 16_000,
        ..Default::default()
    }
}

/// Controller wired to scripted adapters and a silent microphone
pub fn controller(transcriber: &ScriptedTranscriber, completer: &ScriptedCompleter) -> TurnController {
    controller_with_capture(transcriber, completer, Box::new(SilentCapture))
}

/// Controller whose completion calls panic
pub fn panicking_controller() -> TurnController {
    TurnController::start(
        short_recording(),
        Some(Box::new(SilentCapture)),
        Arc::new(ScriptedTranscriber::new()),
        Arc::new(PanickingCompleter),
    )
    .expect("worker should start")
}

pub fn controller_with_capture(
    transcriber: &ScriptedTranscriber,
    completer: &ScriptedCompleter,
    capture: Box<dyn AudioCapture>,
) -> TurnController {
    TurnController::start(
        short_recording(),
        Some(capture),
        Arc::new(transcriber.clone()),
        Arc::new(completer.clone()),
    )
    .expect("worker should start")
}
