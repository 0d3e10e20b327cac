//! Main application struct and eframe integration
//!
//! This module contains the ChatApp that implements eframe::App.

use crate::integration::{ShellConfig, TurnController};
use crate::ui::components::{ErrorBanner, InputAction, InputBar, MessageList, Sidebar};
use crate::ui::theme::Theme;
use egui::{self, CentralPanel, SidePanel, TopBottomPanel};
use std::time::Duration;
use tracing::{debug, info, warn};

/// How often to poll the worker while a turn is in flight
const BUSY_REPAINT_INTERVAL: Duration = Duration::from_millis(100);

/// Single-session chat window
pub struct ChatApp {
    controller: TurnController,
    shell: ShellConfig,
    theme: Theme,
    /// Contents of the text field
    input_text: String,
}

impl ChatApp {
    /// Create the application and apply the theme
    pub fn new(
        cc: &eframe::CreationContext<'_>,
        controller: TurnController,
        shell: ShellConfig,
    ) -> Self {
        let app = Self::from_parts(controller, shell);
        app.theme.apply(&cc.egui_ctx);
        info!("Chat window initialized");
        app
    }

    /// Build the application without an eframe context (used by tests)
    pub fn from_parts(controller: TurnController, shell: ShellConfig) -> Self {
        Self {
            controller,
            shell,
            theme: Theme::dark(),
            input_text: String::new(),
        }
    }

    pub fn controller(&self) -> &TurnController {
        &self.controller
    }

    pub fn controller_mut(&mut self) -> &mut TurnController {
        &mut self.controller
    }

    pub fn input_text(&self) -> &str {
        &self.input_text
    }

    /// Render one frame
    pub fn show(&mut self, ctx: &egui::Context) {
        self.controller.poll_events();

        self.show_sidebar(ctx);
        self.show_input_area(ctx);
        self.show_content(ctx);

        if !self.controller.is_idle() {
            ctx.request_repaint_after(BUSY_REPAINT_INTERVAL);
        }
    }

    fn show_sidebar(&mut self, ctx: &egui::Context) {
        let message_count = self.controller.history().len();
        let mut clear = false;

        SidePanel::left("sidebar")
            .resizable(false)
            .default_width(200.0)
            .frame(
                egui::Frame::none()
                    .fill(self.theme.bg_secondary)
                    .inner_margin(self.theme.spacing),
            )
            .show(ctx, |ui| {
                clear = Sidebar::new(&self.shell.title, message_count, &self.theme).show(ui);
            });

        if clear {
            self.controller.clear_history();
        }
    }

    fn show_input_area(&mut self, ctx: &egui::Context) {
        let state = self.controller.state();
        let mut action = InputAction::None;
        let mut dismissed = false;

        TopBottomPanel::bottom("input_area")
            .frame(
                egui::Frame::none()
                    .fill(self.theme.bg_primary)
                    .inner_margin(self.theme.spacing),
            )
            .show(ctx, |ui| {
                if let Some(notification) = self.controller.notification() {
                    dismissed = ErrorBanner::new(notification, &self.theme).show(ui);
                    ui.add_space(self.theme.spacing_sm);
                }

                action = InputBar::new(
                    &mut self.input_text,
                    state,
                    &self.shell.input_hint,
                    &self.theme,
                )
                .show(ui);
            });

        if dismissed {
            self.controller.dismiss_notification();
        }

        match action {
            InputAction::None => {}
            InputAction::Record => {
                if let Err(e) = self.controller.record_voice() {
                    warn!("Voice input rejected: {}", e);
                }
            }
            InputAction::Send(text) => match self.controller.submit_text(&text) {
                Ok(()) => {
                    debug!("Submitted {} characters", text.len());
                    self.input_text.clear();
                }
                Err(e) => warn!("Text input rejected: {}", e),
            },
        }

        if self.controller.state() != state {
            ctx.request_repaint();
        }
    }

    fn show_content(&mut self, ctx: &egui::Context) {
        let snapshot = self.controller.snapshot();
        let state = self.controller.state();

        CentralPanel::default()
            .frame(egui::Frame::none().fill(self.theme.bg_primary))
            .show(ctx, |ui| {
                MessageList::new(&snapshot, state, &self.shell, &self.theme).show(ui);
            });
    }
}

impl eframe::App for ChatApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.show(ctx);
    }

    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        info!("Chat window closing");
        if let Err(e) = self.controller.shutdown() {
            warn!("Worker did not shut down cleanly: {}", e);
        }
    }
}
