//! Background worker for the blocking half of a turn
//!
//! Audio capture and both adapter calls run here, on a dedicated thread with
//! its own tokio runtime. The worker never touches the conversation history;
//! it only reports results back over a channel.

use crate::audio::AudioCapture;
use crate::integration::config::RecordingConfig;
use crate::llm::{Completer, CompletionResult};
use crate::speech::{Transcriber, TranscriptionResult};
use crate::{CareChatError, Result};
use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender, TryRecvError};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};
use tokio::runtime::Runtime;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Identifies one turn from input to answer
pub type TurnId = Uuid;

/// Commands sent to the worker
#[derive(Debug, Clone)]
pub enum WorkerCommand {
    /// Record a clip and transcribe it
    Transcribe { turn: TurnId },

    /// Send a prompt to the completion service
    Complete { turn: TurnId, prompt: String },

    /// Shutdown the worker
    Shutdown,
}

/// Events emitted by the worker
#[derive(Debug, Clone)]
pub enum WorkerEvent {
    /// Recording could not be made
    CaptureFailed { turn: TurnId, error: CareChatError },

    /// Transcription finished, successfully or not
    Transcribed {
        turn: TurnId,
        result: TranscriptionResult,
        elapsed_ms: u64,
    },

    /// Completion finished, successfully or not
    Completed {
        turn: TurnId,
        result: CompletionResult,
        elapsed_ms: u64,
    },

    /// Worker shut down
    Shutdown,
}

/// How long `shutdown` waits for a busy worker before detaching it
pub const SHUTDOWN_GRACE: Duration = Duration::from_millis(500);

fn worker_stopped() -> CareChatError {
    CareChatError::ChannelError("Turn worker stopped".to_string())
}

/// Handle for interacting with a running worker
pub struct WorkerHandle {
    command_tx: Sender<WorkerCommand>,
    event_rx: Receiver<WorkerEvent>,
    /// Never carries a value; disconnects when the worker thread exits
    stopped_rx: Receiver<()>,
    worker_handle: Option<JoinHandle<()>>,
    closed: bool,
}

impl WorkerHandle {
    /// Send a command to the worker
    pub fn send(&self, command: WorkerCommand) -> Result<()> {
        if self.closed {
            return Err(worker_stopped());
        }
        self.command_tx
            .send(command)
            .map_err(|e| CareChatError::ChannelError(format!("Failed to send command: {}", e)))
    }

    /// Try to receive an event without blocking
    ///
    /// Fails once the worker thread is gone and every buffered event has
    /// been drained.
    pub fn try_recv_event(&self) -> Result<Option<WorkerEvent>> {
        match self.event_rx.try_recv() {
            Ok(event) => Ok(Some(event)),
            Err(TryRecvError::Empty) => Ok(None),
            Err(TryRecvError::Disconnected) => Err(worker_stopped()),
        }
    }

    /// Receive an event, blocking for at most `timeout`
    pub fn recv_event_timeout(&self, timeout: Duration) -> Result<Option<WorkerEvent>> {
        match self.event_rx.recv_timeout(timeout) {
            Ok(event) => Ok(Some(event)),
            Err(RecvTimeoutError::Timeout) => Ok(None),
            Err(RecvTimeoutError::Disconnected) => Err(worker_stopped()),
        }
    }

    /// Stop the worker, waiting at most [`SHUTDOWN_GRACE`]
    pub fn shutdown(&mut self) -> Result<()> {
        self.shutdown_timeout(SHUTDOWN_GRACE)
    }

    /// Stop the worker
    ///
    /// A worker still blocked in an adapter call after `grace` is detached;
    /// it exits on its own once the call returns.
    pub fn shutdown_timeout(&mut self, grace: Duration) -> Result<()> {
        self.closed = true;
        let Some(handle) = self.worker_handle.take() else {
            return Ok(());
        };

        let _ = self.command_tx.try_send(WorkerCommand::Shutdown);
        match self.stopped_rx.recv_timeout(grace) {
            Err(RecvTimeoutError::Timeout) => {
                warn!("Turn worker still busy after {:?}, detaching", grace);
                Ok(())
            }
            _ => handle
                .join()
                .map_err(|_| CareChatError::ChannelError("Worker thread panicked".to_string())),
        }
    }

    /// Handle over raw channels, for driving a controller by hand
    #[cfg(test)]
    pub(crate) fn from_channels(
        command_tx: Sender<WorkerCommand>,
        event_rx: Receiver<WorkerEvent>,
    ) -> Self {
        let (_stopped_tx, stopped_rx) = bounded(0);
        Self {
            command_tx,
            event_rx,
            stopped_rx,
            worker_handle: None,
            closed: false,
        }
    }
}

impl Drop for WorkerHandle {
    fn drop(&mut self) {
        let _ = self.shutdown();
    }
}

/// Owns the adapters until the worker thread is started
pub struct TurnWorker {
    capture: Option<Box<dyn AudioCapture>>,
    transcriber: Arc<dyn Transcriber>,
    completer: Arc<dyn Completer>,
    recording: RecordingConfig,
}

impl TurnWorker {
    /// Create a worker without an audio source (text-only until
    /// [`TurnWorker::with_capture`] is called)
    pub fn new(
        transcriber: Arc<dyn Transcriber>,
        completer: Arc<dyn Completer>,
        recording: RecordingConfig,
    ) -> Self {
        Self {
            capture: None,
            transcriber,
            completer,
            recording,
        }
    }

    /// Attach the audio source used for voice turns
    pub fn with_capture(mut self, capture: Box<dyn AudioCapture>) -> Self {
        self.capture = Some(capture);
        self
    }

    /// Start the worker thread
    ///
    /// Returns a handle for sending commands and receiving events.
    pub fn start(self) -> Result<WorkerHandle> {
        let (command_tx, command_rx) = bounded::<WorkerCommand>(16);
        let (event_tx, event_rx) = bounded::<WorkerEvent>(16);
        let (stopped_tx, stopped_rx) = bounded::<()>(0);

        let runtime = Runtime::new()?;

        let worker_handle = std::thread::Builder::new()
            .name("carechat-turn-worker".to_string())
            .spawn(move || {
                // Dropped on exit, including unwinding from a panicking adapter
                let _stopped = stopped_tx;
                worker_loop(self, runtime, command_rx, event_tx);
            })?;

        Ok(WorkerHandle {
            command_tx,
            event_rx,
            stopped_rx,
            worker_handle: Some(worker_handle),
            closed: false,
        })
    }
}

fn worker_loop(
    mut worker: TurnWorker,
    runtime: Runtime,
    command_rx: Receiver<WorkerCommand>,
    event_tx: Sender<WorkerEvent>,
) {
    info!("Turn worker started");

    for command in command_rx.iter() {
        let event = match command {
            WorkerCommand::Transcribe { turn } => transcribe_turn(&mut worker, &runtime, turn),
            WorkerCommand::Complete { turn, prompt } => {
                let started = Instant::now();
                let result = runtime.block_on(worker.completer.complete(&prompt));
                WorkerEvent::Completed {
                    turn,
                    result,
                    elapsed_ms: started.elapsed().as_millis() as u64,
                }
            }
            WorkerCommand::Shutdown => break,
        };

        if event_tx.send(event).is_err() {
            error!("Event channel closed");
            break;
        }
    }

    let _ = event_tx.try_send(WorkerEvent::Shutdown);
    info!("Turn worker stopped");
}

fn transcribe_turn(worker: &mut TurnWorker, runtime: &Runtime, turn: TurnId) -> WorkerEvent {
    let Some(capture) = worker.capture.as_mut() else {
        return WorkerEvent::CaptureFailed {
            turn,
            error: CareChatError::AudioDeviceError("Audio input is disabled".to_string()),
        };
    };

    let audio = match capture.capture(worker.recording.duration, worker.recording.sample_rate) {
        Ok(audio) => audio,
        Err(error) => return WorkerEvent::CaptureFailed { turn, error },
    };
    debug!(
        "Captured {:.2}s of audio for turn {}",
        audio.duration_seconds(),
        turn
    );

    let started = Instant::now();
    let result = runtime.block_on(worker.transcriber.transcribe(&audio));
    WorkerEvent::Transcribed {
        turn,
        result,
        elapsed_ms: started.elapsed().as_millis() as u64,
    }
}
