//! UI components and application module
//!
//! This module provides the egui/eframe-based chat window.

mod app;
pub mod components;
mod theme;

pub use app::ChatApp;
pub use components::InputAction;
pub use theme::Theme;
