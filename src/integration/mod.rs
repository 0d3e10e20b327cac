//! Turn sequencing
//!
//! Connects the adapters to the conversation: input -> transcription ->
//! history -> completion -> history.

pub mod config;
mod controller;
mod worker;

pub use config::{AppConfig, RecordingConfig, ShellConfig};
pub use controller::{InputSource, Notification, TurnController, TurnRequest, TurnState};
pub use worker::{TurnId, TurnWorker, WorkerCommand, WorkerEvent, WorkerHandle};
