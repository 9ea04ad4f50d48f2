//! Main application state and UI
//!
//! Owns the capture, detection, and spelling components and wires them
//! together once per UI frame: pull the latest camera frame, hand it to the
//! detection worker, feed the worker's result into the speller, refresh the
//! preview. Everything that mutates spelling state runs here on the UI
//! thread.

use chrono::Local;
use eframe::egui::{self, ColorImage, TextureHandle, TextureOptions};
use std::path::PathBuf;

use crate::camera::{CameraCapture, CameraFrame, CameraInfo};
use crate::detect::{Detection, DetectWorker, DetectorParams};
use crate::history::WordHistory;
use crate::settings::AppSettings;
use crate::spelling::Speller;
use crate::ui::{
    ControlAction, ControlPanel, HistoryPanel, PreviewPanel, SpellingAction, SpellingPanel,
};

/// Main application state
pub struct SignSpellerApp {
    // Core components
    settings: AppSettings,
    cameras: Vec<CameraInfo>,
    capture: Option<CameraCapture>,
    detector: Option<DetectWorker>,
    speller: Speller,
    history: WordHistory,

    // UI panels
    control_panel: ControlPanel,
    spelling_panel: SpellingPanel,
    history_panel: HistoryPanel,
    preview: PreviewPanel,

    // Per-frame bookkeeping
    running: bool,
    preview_texture: Option<TextureHandle>,
    last_frame: Option<CameraFrame>,
    last_detection_seq: Option<u64>,
    current_detection: Option<Detection>,
    status: String,
}

impl SignSpellerApp {
    /// Create a new application instance
    pub fn new(_cc: &eframe::CreationContext<'_>) -> Self {
        log::info!("Initializing Sign Speller...");

        let settings = AppSettings::load();
        let cameras = CameraCapture::list_cameras();
        log::info!("Found {} camera(s)", cameras.len());

        let history = WordHistory::load(settings.history_path.clone());
        let speller = Speller::new(settings.hold_frames);

        // The worker loads the model on its own thread; if the model is
        // missing the app still runs, just without detections
        let detector =
            match DetectWorker::spawn(settings.model_path.clone(), DetectorParams::default()) {
                Ok(worker) => Some(worker),
                Err(e) => {
                    log::warn!("Failed to start detection worker: {}", e);
                    None
                }
            };

        log::info!("Sign Speller initialized");
        Self {
            settings,
            cameras,
            capture: None,
            detector,
            speller,
            history,

            control_panel: ControlPanel::new(),
            spelling_panel: SpellingPanel::new(),
            history_panel: HistoryPanel::new(),
            preview: PreviewPanel::new(),

            running: false,
            preview_texture: None,
            last_frame: None,
            last_detection_seq: None,
            current_detection: None,
            status: "Ready".to_string(),
        }
    }

    /// One pass of the capture -> detect -> spell pipeline
    fn tick(&mut self, ctx: &egui::Context) {
        // A failed device halts the loop; the in-progress word stays
        if self.running {
            if let Some(capture) = &self.capture {
                if capture.has_failed() {
                    self.capture = None;
                    self.running = false;
                    self.current_detection = None;
                    self.status =
                        format!("Error: camera {} stopped delivering frames", self.settings.camera_index);
                }
            }
        }

        // Latest camera frame: refresh the preview and queue it for
        // inference with the current threshold
        let new_frame = match &self.capture {
            Some(capture) => capture.latest_frame().filter(|frame| {
                self.last_frame
                    .as_ref()
                    .map_or(true, |last| last.frame_number != frame.frame_number)
            }),
            None => None,
        };
        if let Some(frame) = new_frame {
            self.upload_frame(ctx, &frame);
            if self.running {
                if let Some(worker) = &self.detector {
                    worker.submit(&frame, self.settings.confidence_threshold);
                }
            }
            self.last_frame = Some(frame);
        }

        // Latest detection: each processed frame's result drives exactly one
        // speller transition
        if let Some(worker) = &self.detector {
            if let Some(update) = worker.latest() {
                if self.last_detection_seq != Some(update.sequence) {
                    self.last_detection_seq = Some(update.sequence);
                    self.current_detection = update.detection;
                    if self.running {
                        let seen = update.detection.map(|d| d.label);
                        if let Some(letter) = self.speller.observe(seen) {
                            self.status =
                                format!("Added {} to word: {}", letter, self.speller.word());
                        }
                    }
                }
            }
        }
    }

    /// Upload an RGBA frame into the preview texture
    fn upload_frame(&mut self, ctx: &egui::Context, frame: &CameraFrame) {
        let image = ColorImage::from_rgba_unmultiplied(
            [frame.width as usize, frame.height as usize],
            &frame.data,
        );
        match &mut self.preview_texture {
            Some(texture) => texture.set(image, TextureOptions::LINEAR),
            None => {
                self.preview_texture =
                    Some(ctx.load_texture("camera-preview", image, TextureOptions::LINEAR));
            }
        }
    }

    /// Start or stop detection
    fn toggle_detection(&mut self) {
        if self.running {
            self.stop_detection();
        } else {
            self.start_detection();
        }
    }

    /// Open the selected camera if needed and start the loop
    fn start_detection(&mut self) {
        if self.cameras.is_empty() {
            self.status = "No camera available. Connect one and refresh.".to_string();
            return;
        }

        // Reopen if the selection changed while stopped
        let needs_open = self
            .capture
            .as_ref()
            .map_or(true, |capture| capture.index() != self.settings.camera_index);
        if needs_open {
            self.capture = None;
            match CameraCapture::open(self.settings.camera_index) {
                Ok(capture) => self.capture = Some(capture),
                Err(e) => {
                    self.status = format!("Error: {}", e);
                    return;
                }
            }
        }

        self.running = true;
        self.status = "Detection running. Hold a sign to spell; press S to save a frame.".to_string();
    }

    /// Halt frame acquisition. The in-progress word is preserved.
    fn stop_detection(&mut self) {
        self.running = false;
        self.capture = None;
        self.current_detection = None;
        self.status = "Detection stopped".to_string();
    }

    /// Apply a manual word operation
    fn apply_spelling_action(&mut self, action: SpellingAction) {
        match action {
            SpellingAction::Undo => {
                self.status = match self.speller.undo() {
                    Some(letter) => format!("Removed {}", letter),
                    None => "No letter to remove".to_string(),
                };
            }
            SpellingAction::Space => {
                self.speller.space();
                self.status = "Added space".to_string();
            }
            SpellingAction::Clear => {
                self.speller.clear();
                self.status = "Word cleared".to_string();
            }
            SpellingAction::Submit => self.submit_word(),
        }
    }

    /// Persist the word, then clear it. On a write failure the word is kept
    /// so the next submit can retry.
    fn submit_word(&mut self) {
        if self.speller.word().is_empty() {
            self.status = "No word to submit".to_string();
            return;
        }

        let word = self.speller.word().to_string();
        match self.history.submit(&word, Local::now().naive_local()) {
            Ok(()) => {
                self.speller.clear();
                self.status = format!("Submitted word: {}", word);
            }
            Err(e) => {
                log::warn!("Failed to save word: {:#}", e);
                self.status = format!("Warning: could not save word ({}); word kept", e);
            }
        }
    }

    /// Truncate the history log
    fn clear_history(&mut self) {
        match self.history.clear() {
            Ok(()) => self.status = "Word history cleared".to_string(),
            Err(e) => {
                log::warn!("Failed to clear history: {:#}", e);
                self.status = format!("Warning: could not clear history ({})", e);
            }
        }
    }

    /// Save the current frame as a PNG next to the history log
    fn save_snapshot(&mut self) {
        let Some(frame) = self.last_frame.clone() else {
            self.status = "No frame to save".to_string();
            return;
        };
        match self.write_snapshot(&frame) {
            Ok(path) => self.status = format!("Saved frame to {:?}", path),
            Err(e) => {
                log::warn!("Failed to save frame: {:#}", e);
                self.status = format!("Warning: could not save frame ({})", e);
            }
        }
    }

    fn write_snapshot(&self, frame: &CameraFrame) -> anyhow::Result<PathBuf> {
        let dir = self
            .settings
            .history_path
            .parent()
            .map(|p| p.to_path_buf())
            .unwrap_or_else(|| PathBuf::from("."));
        std::fs::create_dir_all(&dir)?;

        let name = format!("frame_{}.png", Local::now().format("%Y%m%d_%H%M%S"));
        let path = dir.join(name);
        let image = image::RgbaImage::from_raw(frame.width, frame.height, frame.data.clone())
            .ok_or_else(|| anyhow::anyhow!("frame buffer does not match its dimensions"))?;
        image.save(&path)?;
        log::info!("Saved frame to {:?}", path);
        Ok(path)
    }
}

impl eframe::App for SignSpellerApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // Keyboard shortcut: S saves the current frame
        if ctx.input(|i| i.key_pressed(egui::Key::S)) {
            self.save_snapshot();
        }

        self.tick(ctx);

        egui::TopBottomPanel::top("controls").show(ctx, |ui| {
            ui.add_space(4.0);
            let action =
                self.control_panel
                    .show(ui, &mut self.settings, &self.cameras, self.running);
            ui.add_space(4.0);

            match action {
                Some(ControlAction::ToggleDetection) => self.toggle_detection(),
                Some(ControlAction::RefreshCameras) => {
                    self.cameras = CameraCapture::list_cameras();
                    self.status = format!("Found {} camera(s)", self.cameras.len());
                }
                None => {}
            }
            self.settings.sanitize();
        });

        egui::TopBottomPanel::bottom("status").show(ctx, |ui| {
            ui.add_space(2.0);
            ui.label(&self.status);
            ui.add_space(2.0);
        });

        egui::SidePanel::right("spelling")
            .resizable(false)
            .default_width(280.0)
            .show(ctx, |ui| {
                if let Some(action) = self.spelling_panel.show(ui, &self.speller) {
                    self.apply_spelling_action(action);
                }

                ui.add_space(12.0);

                if self.history_panel.show(ui, &self.history) {
                    self.clear_history();
                }
            });

        egui::CentralPanel::default().show(ctx, |ui| {
            let detector_ready = self.detector.as_ref().map_or(false, |d| d.is_ready());
            self.preview.show(
                ui,
                self.preview_texture.as_ref(),
                self.current_detection.as_ref(),
                detector_ready,
            );
        });

        // Drive the loop at the display cadence while capturing
        if self.running {
            ctx.request_repaint();
        }
    }

    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        if let Err(e) = self.settings.save() {
            log::warn!("Failed to save settings: {:#}", e);
        }
    }
}
