//! Live camera preview
//!
//! Paints the latest camera frame and overlays the current detection's
//! bounding box and label.

use eframe::egui::{self, Align2, Color32, FontId, Pos2, Rect, Stroke, TextureHandle, Vec2};

use crate::detect::Detection;

/// Box outline color
const BOX_COLOR: Color32 = Color32::from_rgb(255, 255, 0);
/// Detection label color
const LABEL_COLOR: Color32 = Color32::from_rgb(0, 255, 0);

/// Camera preview panel
pub struct PreviewPanel {
    /// Show the frame info overlay
    pub show_info: bool,
}

impl Default for PreviewPanel {
    fn default() -> Self {
        Self { show_info: true }
    }
}

impl PreviewPanel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Show the preview area
    pub fn show(
        &mut self,
        ui: &mut egui::Ui,
        texture: Option<&TextureHandle>,
        detection: Option<&Detection>,
        detector_ready: bool,
    ) {
        // Header with controls
        ui.horizontal(|ui| {
            ui.heading("📷 Preview");
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                ui.checkbox(&mut self.show_info, "Info");
            });
        });
        ui.separator();

        let aspect_ratio = texture
            .map(|t| {
                let [w, h] = t.size();
                w as f32 / h.max(1) as f32
            })
            .unwrap_or(4.0 / 3.0);

        let available = ui.available_size();
        let preview_width = available.x.min(available.y * aspect_ratio);
        let preview_size = Vec2::new(preview_width, preview_width / aspect_ratio);

        let (response, painter) = ui.allocate_painter(preview_size, egui::Sense::hover());
        let rect = response.rect;

        // Background
        painter.rect_filled(rect, 4.0, Color32::from_gray(20));

        match texture {
            Some(texture) => {
                painter.image(
                    texture.id(),
                    rect,
                    Rect::from_min_max(Pos2::new(0.0, 0.0), Pos2::new(1.0, 1.0)),
                    Color32::WHITE,
                );

                if let Some(detection) = detection {
                    self.draw_detection(&painter, rect, detection);
                }
            }
            None => {
                painter.text(
                    rect.center(),
                    Align2::CENTER_CENTER,
                    "No camera feed",
                    FontId::proportional(18.0),
                    Color32::from_gray(120),
                );
            }
        }

        // Border
        painter.rect_stroke(rect, 4.0, Stroke::new(2.0, Color32::from_gray(60)));

        if self.show_info {
            self.draw_info_overlay(&painter, rect, texture, detector_ready);
        }
    }

    /// Box plus `"X 97.3%"` label above it
    fn draw_detection(&self, painter: &egui::Painter, rect: Rect, detection: &Detection) {
        let [x1, y1, x2, y2] = detection.bbox;
        let box_rect = Rect::from_min_max(
            rect.min + Vec2::new(x1 * rect.width(), y1 * rect.height()),
            rect.min + Vec2::new(x2 * rect.width(), y2 * rect.height()),
        );

        painter.rect_stroke(box_rect, 0.0, Stroke::new(2.0, BOX_COLOR));
        painter.text(
            box_rect.left_top() + Vec2::new(0.0, -8.0),
            Align2::LEFT_BOTTOM,
            format!("{} {:.1}%", detection.label, detection.confidence * 100.0),
            FontId::proportional(16.0),
            LABEL_COLOR,
        );
    }

    /// Frame dimensions and detector state in the corner
    fn draw_info_overlay(
        &self,
        painter: &egui::Painter,
        rect: Rect,
        texture: Option<&TextureHandle>,
        detector_ready: bool,
    ) {
        let mut lines = Vec::new();
        if let Some(texture) = texture {
            let [w, h] = texture.size();
            lines.push(format!("{}x{}", w, h));
        }
        lines.push(if detector_ready {
            "detector ready".to_string()
        } else {
            "detector unavailable".to_string()
        });

        painter.text(
            rect.left_top() + Vec2::new(8.0, 8.0),
            Align2::LEFT_TOP,
            lines.join("  ·  "),
            FontId::monospace(12.0),
            Color32::from_gray(200),
        );
    }
}
