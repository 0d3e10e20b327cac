//! Inline error banner

use crate::integration::Notification;
use crate::ui::theme::Theme;
use egui::{self, RichText};

pub struct ErrorBanner<'a> {
    notification: &'a Notification,
    theme: &'a Theme,
}

impl<'a> ErrorBanner<'a> {
    pub fn new(notification: &'a Notification, theme: &'a Theme) -> Self {
        Self {
            notification,
            theme,
        }
    }

    /// Returns `true` when dismissed
    pub fn show(self, ui: &mut egui::Ui) -> bool {
        let mut dismissed = false;
        let message = self.notification.message();

        egui::Frame::none()
            .fill(self.theme.error.gamma_multiply(0.2))
            .stroke(egui::Stroke::new(1.0, self.theme.error))
            .rounding(self.theme.card_rounding)
            .inner_margin(self.theme.spacing_sm)
            .show(ui, |ui| {
                ui.horizontal(|ui| {
                    let label = ui.label(RichText::new(&message).color(self.theme.text_primary));
                    let a11y = format!("Error: {}", message);
                    label.widget_info(|| {
                        egui::WidgetInfo::labeled(egui::WidgetType::Label, true, &a11y)
                    });

                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        let close = ui.small_button("✕");
                        close.widget_info(|| {
                            egui::WidgetInfo::labeled(egui::WidgetType::Button, true, "Dismiss error")
                        });
                        dismissed = close.clicked();
                    });
                });
            });

        dismissed
    }
}
