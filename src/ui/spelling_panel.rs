//! Spelling panel
//!
//! Shows the in-progress word, the currently-held sign with its hold
//! progress, and the manual word operations.

use eframe::egui::{Button, Color32, ProgressBar, RichText, Ui};

use crate::spelling::Speller;

/// Manual word operations requested from the panel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpellingAction {
    /// Remove the last letter
    Undo,
    /// Append a word separator
    Space,
    /// Empty the word
    Clear,
    /// Persist the word to history and start over
    Submit,
}

/// Spelling panel
pub struct SpellingPanel;

impl SpellingPanel {
    pub fn new() -> Self {
        Self
    }

    /// Show the word and its controls
    pub fn show(&mut self, ui: &mut Ui, speller: &Speller) -> Option<SpellingAction> {
        let mut action = None;

        ui.heading("Spelling");
        ui.separator();

        ui.horizontal(|ui| {
            let word = if speller.word().is_empty() {
                RichText::new("—").size(32.0).color(Color32::DARK_GRAY)
            } else {
                RichText::new(speller.word()).size(32.0).strong()
            };
            ui.label(word);
        });

        // Hold progress for the current candidate
        match speller.hold_progress() {
            Some((letter, progress)) => {
                ui.add(
                    ProgressBar::new(progress)
                        .text(format!("Holding {letter}"))
                        .desired_width(220.0),
                );
            }
            None => {
                ui.add(
                    ProgressBar::new(0.0)
                        .text("Hold a sign to add a letter")
                        .desired_width(220.0),
                );
            }
        }

        ui.add_space(4.0);

        ui.horizontal(|ui| {
            if ui.button("⬅ Back").clicked() {
                action = Some(SpellingAction::Undo);
            }
            if ui.button("Space").clicked() {
                action = Some(SpellingAction::Space);
            }
            if ui.button("Clear").clicked() {
                action = Some(SpellingAction::Clear);
            }
            let submit_enabled = !speller.word().is_empty();
            if ui
                .add_enabled(submit_enabled, Button::new("✔ Submit"))
                .clicked()
            {
                action = Some(SpellingAction::Submit);
            }
        });

        action
    }
}

impl Default for SpellingPanel {
    fn default() -> Self {
        Self::new()
    }
}
