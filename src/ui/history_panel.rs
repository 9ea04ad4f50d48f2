//! Word history panel
//!
//! Shows the most recently submitted words and the clear-history control.

use eframe::egui::{self, Color32, RichText, Ui};

use crate::history::WordHistory;

/// How many submitted words the panel shows
const VISIBLE_WORDS: usize = 3;

/// Word history panel
pub struct HistoryPanel;

impl HistoryPanel {
    pub fn new() -> Self {
        Self
    }

    /// Show the recent words. Returns `true` when the user asked to clear
    /// the history.
    pub fn show(&mut self, ui: &mut Ui, history: &WordHistory) -> bool {
        let mut clear_requested = false;

        ui.horizontal(|ui| {
            ui.heading("Word History");
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                if ui.button("Clear History").clicked() {
                    clear_requested = true;
                }
            });
        });
        ui.separator();

        if history.is_empty() {
            ui.label(RichText::new("No words submitted yet").color(Color32::DARK_GRAY));
        } else {
            for entry in history.recent(VISIBLE_WORDS) {
                ui.horizontal(|ui| {
                    ui.label(RichText::new(&entry.word).strong());
                    ui.label(
                        RichText::new(entry.timestamp.format("%Y-%m-%d %H:%M:%S").to_string())
                            .color(Color32::GRAY),
                    );
                });
            }
            if history.len() > VISIBLE_WORDS {
                ui.label(
                    RichText::new(format!("… and {} more", history.len() - VISIBLE_WORDS))
                        .color(Color32::DARK_GRAY),
                );
            }
        }

        clear_requested
    }
}

impl Default for HistoryPanel {
    fn default() -> Self {
        Self::new()
    }
}
