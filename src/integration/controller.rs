//! Turn controller
//!
//! Owns the conversation history and sequences one turn at a time:
//! resolve the input (typed or transcribed), append it, ask the completion
//! service, append the answer. The controller lives on the UI thread; the
//! slow steps happen on a [`TurnWorker`](crate::integration::TurnWorker)
//! and come back as events through [`TurnController::poll_events`].

use crate::audio::AudioCapture;
use crate::integration::config::RecordingConfig;
use crate::integration::worker::{TurnId, TurnWorker, WorkerCommand, WorkerEvent, WorkerHandle};
use crate::llm::Completer;
use crate::messages::{ConversationHistory, HistorySnapshot, Message, MessageMetadata};
use crate::speech::Transcriber;
use crate::{CareChatError, Result};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Where the controller is within a turn
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnState {
    /// Waiting for input
    Idle,
    /// Capturing and transcribing a recording
    Resolving,
    /// Waiting for the completion service
    Completing,
}

impl TurnState {
    /// Status line shown while a turn is in flight
    pub fn status_text(&self) -> Option<&'static str> {
        match self {
            TurnState::Idle => None,
            TurnState::Resolving => Some("Recording..."),
            TurnState::Completing => Some("Thinking..."),
        }
    }
}

/// How the user text of a turn is obtained
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputSource {
    Typed,
    Transcribed,
}

/// The turn currently in flight
#[derive(Debug, Clone, PartialEq)]
pub struct TurnRequest {
    pub id: TurnId,
    pub source: InputSource,
    /// Resolved user text, once known
    pub text: Option<String>,
    pub started_at: DateTime<Utc>,
}

impl TurnRequest {
    fn new(source: InputSource, text: Option<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            source,
            text,
            started_at: Utc::now(),
        }
    }
}

/// A failure surfaced to the user; never written into the history
#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    pub error: CareChatError,
    pub raised_at: DateTime<Utc>,
}

impl Notification {
    fn new(error: CareChatError) -> Self {
        Self {
            error,
            raised_at: Utc::now(),
        }
    }

    /// Text shown in the error banner
    pub fn message(&self) -> String {
        self.error.user_message()
    }
}

/// Sequences turns against the conversation history
pub struct TurnController {
    history: ConversationHistory,
    state: TurnState,
    active: Option<TurnRequest>,
    notification: Option<Notification>,
    worker: WorkerHandle,
}

impl TurnController {
    /// Create a controller with an empty history
    pub fn new(worker: WorkerHandle) -> Self {
        Self::with_history(worker, ConversationHistory::new())
    }

    /// Spawn a worker for the given adapters and wrap it in a controller
    ///
    /// Without `capture` the session is text-only and voice turns fail with
    /// an audio device notification.
    pub fn start(
        recording: RecordingConfig,
        capture: Option<Box<dyn AudioCapture>>,
        transcriber: Arc<dyn Transcriber>,
        completer: Arc<dyn Completer>,
    ) -> Result<Self> {
        let mut worker = TurnWorker::new(transcriber, completer, recording);
        if let Some(capture) = capture {
            worker = worker.with_capture(capture);
        }
        Ok(Self::new(worker.start()?))
    }

    /// Create a controller over an existing history
    pub fn with_history(worker: WorkerHandle, history: ConversationHistory) -> Self {
        Self {
            history,
            state: TurnState::Idle,
            active: None,
            notification: None,
            worker,
        }
    }

    pub fn state(&self) -> TurnState {
        self.state
    }

    pub fn is_idle(&self) -> bool {
        self.state == TurnState::Idle
    }

    pub fn history(&self) -> &ConversationHistory {
        &self.history
    }

    /// Consistent view of the history for rendering
    pub fn snapshot(&self) -> HistorySnapshot {
        self.history.snapshot()
    }

    pub fn active_turn(&self) -> Option<&TurnRequest> {
        self.active.as_ref()
    }

    pub fn notification(&self) -> Option<&Notification> {
        self.notification.as_ref()
    }

    pub fn take_notification(&mut self) -> Option<Notification> {
        self.notification.take()
    }

    pub fn dismiss_notification(&mut self) {
        self.notification = None;
    }

    /// Start a turn from typed text
    ///
    /// The user message is appended immediately and the completion request
    /// goes out on the worker. Blank text is rejected without touching the
    /// history; input while a turn is in flight is dropped.
    pub fn submit_text(&mut self, text: &str) -> Result<()> {
        self.ensure_idle()?;

        let text = text.trim();
        if text.is_empty() {
            let error = CareChatError::InputValidation("message is empty".to_string());
            self.notify(error.clone());
            return Err(error);
        }

        let turn = TurnRequest::new(InputSource::Typed, Some(text.to_string()));
        info!("Turn {} started from typed input", turn.id);
        self.notification = None;
        self.history.append(Message::user(text));
        self.begin_completion(turn)
    }

    /// Start a turn from a fixed-length voice recording
    pub fn record_voice(&mut self) -> Result<()> {
        self.ensure_idle()?;

        let turn = TurnRequest::new(InputSource::Transcribed, None);
        info!("Turn {} started from voice input", turn.id);

        if let Err(e) = self.worker.send(WorkerCommand::Transcribe { turn: turn.id }) {
            self.notify(e.clone());
            return Err(e);
        }

        self.notification = None;
        self.active = Some(turn);
        self.state = TurnState::Resolving;
        Ok(())
    }

    /// Empty the history
    ///
    /// Allowed at any time. A turn already in flight still appends its
    /// messages when it completes.
    pub fn clear_history(&mut self) {
        info!("Clearing {} messages", self.history.len());
        self.history.clear();
    }

    /// Apply all pending worker events
    ///
    /// Returns `true` if anything changed.
    pub fn poll_events(&mut self) -> bool {
        let mut changed = false;
        loop {
            match self.worker.try_recv_event() {
                Ok(Some(event)) => changed |= self.apply(event),
                Ok(None) => return changed,
                Err(e) => return self.worker_lost(e) || changed,
            }
        }
    }

    /// Block for at most `timeout` until at least one event arrives
    pub fn wait_for_event(&mut self, timeout: Duration) -> bool {
        match self.worker.recv_event_timeout(timeout) {
            Ok(Some(event)) => {
                let changed = self.apply(event);
                self.poll_events() || changed
            }
            Ok(None) => false,
            Err(e) => self.worker_lost(e),
        }
    }

    /// Process events until the controller is idle or `timeout` passes
    pub fn wait_until_idle(&mut self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        while !self.is_idle() {
            let now = Instant::now();
            if now >= deadline {
                return false;
            }
            self.wait_for_event(deadline - now);
        }
        true
    }

    /// Stop the worker thread
    ///
    /// Does not wait out an adapter call in flight; that turn is abandoned
    /// and the controller returns to `Idle`.
    pub fn shutdown(&mut self) -> Result<()> {
        let result = self.worker.shutdown();
        if !self.is_idle() {
            self.fail_turn(CareChatError::ChannelError("Turn worker stopped".to_string()));
        }
        result
    }

    fn ensure_idle(&self) -> Result<()> {
        if self.state != TurnState::Idle {
            debug!("Dropping input while {:?}", self.state);
            return Err(CareChatError::TurnInFlight(self.state));
        }
        Ok(())
    }

    fn begin_completion(&mut self, turn: TurnRequest) -> Result<()> {
        let prompt = turn.text.clone().unwrap_or_default();
        let command = WorkerCommand::Complete {
            turn: turn.id,
            prompt,
        };

        self.active = Some(turn);
        self.state = TurnState::Completing;

        if let Err(e) = self.worker.send(command) {
            self.fail_turn(e.clone());
            return Err(e);
        }
        Ok(())
    }

    fn apply(&mut self, event: WorkerEvent) -> bool {
        let turn = match &event {
            WorkerEvent::CaptureFailed { turn, .. }
            | WorkerEvent::Transcribed { turn, .. }
            | WorkerEvent::Completed { turn, .. } => *turn,
            WorkerEvent::Shutdown => {
                if self.is_idle() {
                    return false;
                }
                self.fail_turn(CareChatError::ChannelError("Turn worker stopped".to_string()));
                return true;
            }
        };

        if self.active.as_ref().map(|t| t.id) != Some(turn) {
            debug!("Ignoring event for stale turn {}", turn);
            return false;
        }

        match event {
            WorkerEvent::CaptureFailed { error, .. } => self.fail_turn(error),

            WorkerEvent::Transcribed {
                result, elapsed_ms, ..
            } => match result {
                Ok(text) if text.trim().is_empty() => self.fail_turn(CareChatError::NoSpeech),
                Ok(text) => {
                    let text = text.trim().to_string();
                    debug!("Transcribed in {}ms: {:?}", elapsed_ms, text);
                    self.history.append(Message::user(&text).with_metadata(MessageMetadata {
                        is_speech: true,
                        processing_time_ms: Some(elapsed_ms),
                    }));

                    if let Some(mut active) = self.active.take() {
                        active.text = Some(text);
                        // A failed dispatch already raised its notification
                        if let Err(e) = self.begin_completion(active) {
                            debug!("Completion not dispatched: {}", e);
                        }
                    }
                }
                Err(failure) => self.fail_turn(failure.into()),
            },

            WorkerEvent::Completed {
                result, elapsed_ms, ..
            } => match result {
                Ok(text) => {
                    info!("Turn {} answered in {}ms", turn, elapsed_ms);
                    self.history.append(Message::assistant(text).with_metadata(
                        MessageMetadata {
                            is_speech: false,
                            processing_time_ms: Some(elapsed_ms),
                        },
                    ));
                    self.finish_turn();
                }
                Err(failure) => self.fail_turn(failure.into()),
            },

            WorkerEvent::Shutdown => {}
        }

        true
    }

    /// The worker thread is gone; a turn in flight can never finish
    fn worker_lost(&mut self, error: CareChatError) -> bool {
        if self.is_idle() {
            return false;
        }
        self.fail_turn(error);
        true
    }

    fn fail_turn(&mut self, error: CareChatError) {
        if let Some(turn) = &self.active {
            warn!("Turn {} failed while {:?}: {}", turn.id, self.state, error);
        }
        self.notify(error);
        self.finish_turn();
    }

    fn finish_turn(&mut self) {
        self.active = None;
        self.state = TurnState::Idle;
    }

    fn notify(&mut self, error: CareChatError) {
        self.notification = Some(Notification::new(error));
    }
}

impl Drop for TurnController {
    fn drop(&mut self) {
        let _ = self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam_channel::{bounded, Receiver, Sender};

    /// Controller over hand-driven channels, with no worker thread behind it
    fn manual_controller() -> (TurnController, Receiver<WorkerCommand>, Sender<WorkerEvent>) {
        let (command_tx, command_rx) = bounded(16);
        let (event_tx, event_rx) = bounded(16);
        let worker = WorkerHandle::from_channels(command_tx, event_rx);
        (
            TurnController::with_history(worker, ConversationHistory::new()),
            command_rx,
            event_tx,
        )
    }

    fn completed(turn: TurnId, text: &str) -> WorkerEvent {
        WorkerEvent::Completed {
            turn,
            result: Ok(text.to_string()),
            elapsed_ms: 1,
        }
    }

    #[test]
    fn test_event_for_other_turn_is_ignored() {
        let (mut controller, command_rx, event_tx) = manual_controller();
        controller.submit_text("Hello").unwrap();
        let active = match command_rx.try_recv().unwrap() {
            WorkerCommand::Complete { turn, .. } => turn,
            other => panic!("unexpected command: {:?}", other),
        };

        event_tx.send(completed(Uuid::new_v4(), "Not for you")).unwrap();
        assert!(!controller.poll_events());
        assert_eq!(controller.state(), TurnState::Completing);
        assert_eq!(controller.history().len(), 1);

        event_tx.send(completed(active, "For you")).unwrap();
        assert!(controller.poll_events());
        assert!(controller.is_idle());
        let snapshot = controller.snapshot();
        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot[1].content, "For you");
    }

    #[test]
    fn test_late_event_after_turn_finished_is_ignored() {
        let (mut controller, command_rx, event_tx) = manual_controller();
        controller.submit_text("Hello").unwrap();
        let Ok(WorkerCommand::Complete { turn, .. }) = command_rx.try_recv() else {
            panic!("expected a completion command");
        };

        event_tx.send(completed(turn, "First")).unwrap();
        event_tx.send(completed(turn, "Duplicate")).unwrap();
        controller.poll_events();

        assert!(controller.is_idle());
        assert_eq!(controller.history().len(), 2);
        assert_eq!(controller.snapshot()[1].content, "First");
    }

    #[test]
    fn test_disconnected_worker_ends_turn() {
        let (mut controller, _command_rx, event_tx) = manual_controller();
        controller.submit_text("Hello").unwrap();
        drop(event_tx);

        assert!(controller.wait_until_idle(Duration::from_secs(1)));
        assert!(matches!(
            controller.notification().map(|n| &n.error),
            Some(CareChatError::ChannelError(_))
        ));
        assert_eq!(controller.history().len(), 1);
    }

    #[test]
    fn test_status_text() {
        assert_eq!(TurnState::Idle.status_text(), None);
        assert_eq!(TurnState::Resolving.status_text(), Some("Recording..."));
        assert_eq!(TurnState::Completing.status_text(), Some("Thinking..."));
    }

    #[test]
    fn test_notification_message_uses_user_wording() {
        let n = Notification::new(CareChatError::NoSpeech);
        assert_eq!(n.message(), CareChatError::NoSpeech.user_message());
    }
}
