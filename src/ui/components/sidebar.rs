//! Side panel with session actions

use crate::ui::theme::Theme;
use egui::{self, RichText};

pub struct Sidebar<'a> {
    title: &'a str,
    message_count: usize,
    theme: &'a Theme,
}

impl<'a> Sidebar<'a> {
    pub fn new(title: &'a str, message_count: usize, theme: &'a Theme) -> Self {
        Self {
            title,
            message_count,
            theme,
        }
    }

    /// Returns `true` when the user asked to delete the history
    pub fn show(self, ui: &mut egui::Ui) -> bool {
        ui.add_space(self.theme.spacing);
        ui.label(
            RichText::new(self.title)
                .heading()
                .strong()
                .color(self.theme.text_primary),
        );
        ui.add_space(self.theme.spacing_sm);
        ui.label(
            RichText::new(format!("{} messages", self.message_count))
                .size(12.0)
                .color(self.theme.text_muted),
        );

        ui.add_space(self.theme.spacing_lg);

        let button = egui::Button::new("Delete Chat History").rounding(self.theme.button_rounding);
        let response = ui.add(button);
        response.widget_info(|| {
            egui::WidgetInfo::labeled(egui::WidgetType::Button, true, "Delete chat history")
        });
        response.clicked()
    }
}
