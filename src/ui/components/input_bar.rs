//! Input bar component
//!
//! Provides the record button, text input and send controls.

use crate::integration::TurnState;
use crate::ui::theme::Theme;
use egui::{self, Key, RichText, Vec2};

/// What the user asked for this frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputAction {
    None,
    Record,
    Send(String),
}

/// Input bar component for text and voice input
pub struct InputBar<'a> {
    text: &'a mut String,
    state: TurnState,
    hint: &'a str,
    theme: &'a Theme,
}

impl<'a> InputBar<'a> {
    pub fn new(text: &'a mut String, state: TurnState, hint: &'a str, theme: &'a Theme) -> Self {
        Self {
            text,
            state,
            hint,
            theme,
        }
    }

    pub fn show(mut self, ui: &mut egui::Ui) -> InputAction {
        let mut action = InputAction::None;
        let idle = self.state == TurnState::Idle;

        egui::Frame::none()
            .fill(self.theme.bg_secondary)
            .rounding(self.theme.card_rounding)
            .inner_margin(self.theme.spacing_sm)
            .show(ui, |ui| {
                ui.horizontal(|ui| {
                    let record = egui::Button::new(RichText::new("🎤 Record Voice").size(14.0))
                        .min_size(Vec2::new(0.0, 36.0))
                        .rounding(self.theme.button_rounding);
                    let record_response = ui.add_enabled(idle, record);
                    record_response.widget_info(|| {
                        egui::WidgetInfo::labeled(egui::WidgetType::Button, idle, "Record voice")
                    });
                    if record_response.clicked() {
                        action = InputAction::Record;
                    }

                    ui.add_space(self.theme.spacing_sm);

                    // Reserve space for the send button
                    let available_width = (ui.available_width() - 80.0).max(80.0);
                    let text_edit = egui::TextEdit::singleline(&mut *self.text)
                        .hint_text(self.hint)
                        .desired_width(available_width)
                        .id(egui::Id::new("message_input"))
                        .margin(egui::Margin::symmetric(12.0, 8.0));
                    let text_response = ui.add_enabled(idle, text_edit);
                    text_response.widget_info(|| {
                        egui::WidgetInfo::labeled(egui::WidgetType::TextEdit, idle, "Message input")
                    });

                    let can_send = idle && !self.text.trim().is_empty();
                    let enter_pressed = text_response.lost_focus()
                        && ui.input(|i| i.key_pressed(Key::Enter));

                    let send = egui::Button::new(
                        RichText::new("Send").size(14.0).color(egui::Color32::WHITE),
                    )
                    .min_size(Vec2::new(64.0, 36.0))
                    .rounding(self.theme.button_rounding)
                    .fill(if can_send {
                        self.theme.primary
                    } else {
                        self.theme.bg_tertiary
                    });
                    let send_response = ui.add_enabled(can_send, send);
                    send_response.widget_info(|| {
                        egui::WidgetInfo::labeled(egui::WidgetType::Button, can_send, "Send message")
                    });

                    if can_send && (send_response.clicked() || enter_pressed) {
                        action = InputAction::Send(self.text.trim().to_string());
                    }
                });
            });

        action
    }
}
