//! Message list component
//!
//! Renders a history snapshot, oldest first, with role markers and times.

use crate::integration::{ShellConfig, TurnState};
use crate::messages::{HistorySnapshot, Message};
use crate::ui::theme::Theme;
use egui::{self, Align, Color32, RichText};

/// Message list component
pub struct MessageList<'a> {
    snapshot: &'a HistorySnapshot,
    state: TurnState,
    shell: &'a ShellConfig,
    theme: &'a Theme,
}

impl<'a> MessageList<'a> {
    pub fn new(
        snapshot: &'a HistorySnapshot,
        state: TurnState,
        shell: &'a ShellConfig,
        theme: &'a Theme,
    ) -> Self {
        Self {
            snapshot,
            state,
            shell,
            theme,
        }
    }

    pub fn show(self, ui: &mut egui::Ui) {
        egui::ScrollArea::vertical()
            .id_salt("message_list")
            .auto_shrink([false, false])
            .stick_to_bottom(true)
            .show(ui, |ui| {
                ui.vertical(|ui| {
                    ui.add_space(self.theme.spacing);

                    if self.snapshot.is_empty() && self.state == TurnState::Idle {
                        self.show_empty_state(ui);
                    } else {
                        for message in self.snapshot {
                            self.show_message(ui, message);
                            ui.add_space(self.theme.spacing_sm);
                        }
                    }

                    if let Some(status) = self.state.status_text() {
                        self.show_busy_indicator(ui, status);
                    }

                    ui.add_space(self.theme.spacing);
                });
            });
    }

    fn show_empty_state(&self, ui: &mut egui::Ui) {
        ui.vertical_centered(|ui| {
            ui.add_space(100.0);
            ui.label(
                RichText::new(&self.shell.title)
                    .size(24.0)
                    .color(self.theme.text_primary),
            );
            ui.add_space(self.theme.spacing_sm);
            ui.label(
                RichText::new("Type a question or record your voice to get started.")
                    .size(14.0)
                    .color(self.theme.text_muted),
            );
        });
    }

    fn show_message(&self, ui: &mut egui::Ui, message: &Message) {
        let is_user = message.is_user();
        let (marker, bubble_color, text_color, align, a11y_prefix) = if is_user {
            (
                &self.shell.user_marker,
                self.theme.user_bubble,
                Color32::WHITE,
                Align::RIGHT,
                "User message",
            )
        } else {
            (
                &self.shell.assistant_marker,
                self.theme.assistant_bubble,
                self.theme.text_primary,
                Align::LEFT,
                "Assistant response",
            )
        };

        ui.with_layout(egui::Layout::top_down(align), |ui| {
            let max_width = ui.available_width() * 0.75;

            egui::Frame::none()
                .fill(bubble_color)
                .rounding(self.theme.bubble_rounding)
                .inner_margin(egui::Margin::symmetric(12.0, 8.0))
                .show(ui, |ui| {
                    ui.set_max_width(max_width);
                    ui.horizontal_wrapped(|ui| {
                        ui.label(RichText::new(marker.as_str()).size(18.0));
                        let label = ui.label(RichText::new(&message.content).color(text_color));
                        let a11y = format!("{}: {}", a11y_prefix, message.content);
                        label.widget_info(|| {
                            egui::WidgetInfo::labeled(egui::WidgetType::Label, true, &a11y)
                        });
                    });
                });

            let mut meta = message
                .timestamp
                .with_timezone(&chrono::Local)
                .format("%H:%M")
                .to_string();
            if message.metadata.is_speech {
                meta.push_str(" · 🎤");
            }
            ui.label(RichText::new(meta).size(10.0).color(self.theme.text_muted));
        });
    }

    fn show_busy_indicator(&self, ui: &mut egui::Ui, status: &str) {
        ui.with_layout(egui::Layout::top_down(Align::LEFT), |ui| {
            ui.horizontal(|ui| {
                ui.spinner();
                let label = ui.label(
                    RichText::new(status)
                        .italics()
                        .color(self.theme.text_muted),
                );
                label.widget_info(|| {
                    egui::WidgetInfo::labeled(egui::WidgetType::Label, true, status)
                });
            });
        });
    }
}
