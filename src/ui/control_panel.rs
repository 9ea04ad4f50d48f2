//! Capture controls
//!
//! Camera selection, start/stop, and the detection confidence slider.

use eframe::egui::{ComboBox, Slider, Ui};

use crate::camera::CameraInfo;
use crate::settings::AppSettings;

/// Cross-cutting operations requested from the control panel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlAction {
    /// Start or stop detection
    ToggleDetection,
    /// Re-enumerate capture devices
    RefreshCameras,
}

/// Capture control panel
pub struct ControlPanel;

impl ControlPanel {
    pub fn new() -> Self {
        Self
    }

    /// Show the controls. Camera selection is locked while detection runs;
    /// switching requires stop, reselect, start.
    pub fn show(
        &mut self,
        ui: &mut Ui,
        settings: &mut AppSettings,
        cameras: &[CameraInfo],
        running: bool,
    ) -> Option<ControlAction> {
        let mut action = None;

        ui.horizontal(|ui| {
            ui.label("Camera:");

            let selected_name = cameras
                .iter()
                .find(|c| c.index == settings.camera_index)
                .map(|c| format!("{}: {}", c.index, c.name))
                .unwrap_or_else(|| "No camera".to_string());

            ui.add_enabled_ui(!running, |ui| {
                ComboBox::from_id_source("camera-select")
                    .selected_text(selected_name)
                    .width(220.0)
                    .show_ui(ui, |ui| {
                        for camera in cameras {
                            ui.selectable_value(
                                &mut settings.camera_index,
                                camera.index,
                                format!("{}: {}", camera.index, camera.name),
                            );
                        }
                    });

                if ui.button("🔄").on_hover_text("Refresh camera list").clicked() {
                    action = Some(ControlAction::RefreshCameras);
                }
            });

            let label = if running { "⏹ Stop" } else { "▶ Start" };
            if ui.button(label).clicked() {
                action = Some(ControlAction::ToggleDetection);
            }

            ui.separator();

            ui.label("Confidence:");
            ui.add(
                Slider::new(&mut settings.confidence_threshold, 0.01..=1.0)
                    .fixed_decimals(2),
            );
        });

        action
    }
}

impl Default for ControlPanel {
    fn default() -> Self {
        Self::new()
    }
}
