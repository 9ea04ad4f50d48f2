//! Letter detection
//!
//! Wraps the ONNX letter-detection model behind a narrow contract: one frame
//! plus a confidence threshold in, at most one `(letter, confidence)` out.
//! Inference runs on a dedicated thread fed through a bounded channel, so
//! the capture cadence never blocks on the model; frames that arrive while
//! the model is busy are dropped rather than queued.

pub mod yolo;

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crossbeam_channel::{Receiver, Sender};
use ndarray::Array4;
use parking_lot::Mutex;
use thiserror::Error;

use crate::camera::CameraFrame;

/// Errors from the detector boundary
#[derive(Error, Debug)]
pub enum DetectError {
    #[error("model not found: {0}")]
    ModelNotFound(PathBuf),
    #[error("failed to initialize ONNX Runtime: {0}")]
    Init(String),
    #[error("inference failed: {0}")]
    Inference(String),
}

/// One frame's best detection
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Detection {
    /// Detected letter
    pub label: char,
    /// Confidence in `[0, 1]`
    pub confidence: f32,
    /// Bounding box `[x1, y1, x2, y2]`, normalized to the frame
    pub bbox: [f32; 4],
}

/// Detector tuning
#[derive(Clone, Copy, Debug)]
pub struct DetectorParams {
    /// Square model input edge in pixels
    pub input_size: u32,
    /// NMS overlap threshold
    pub iou_threshold: f32,
}

impl Default for DetectorParams {
    fn default() -> Self {
        Self {
            input_size: 640,
            iou_threshold: 0.45,
        }
    }
}

/// The result published for one processed frame. `detection` is `None` when
/// nothing scored at or above the threshold.
#[derive(Clone, Copy, Debug)]
pub struct DetectionUpdate {
    pub detection: Option<Detection>,
    /// Capture frame number this result belongs to
    pub frame_number: u64,
    /// Monotonic result counter. Capture frame numbers restart when a camera
    /// is reopened; this never does, so consumers dedup against it.
    pub sequence: u64,
}

/// ONNX letter detector
pub struct Detector {
    session: ort::session::Session,
    params: DetectorParams,
}

impl Detector {
    /// Load the model at `path` into an ONNX Runtime session
    pub fn load(path: &Path, params: DetectorParams) -> Result<Self, DetectError> {
        if !path.exists() {
            return Err(DetectError::ModelNotFound(path.to_path_buf()));
        }

        ort::init()
            .with_name("SignSpeller")
            .commit()
            .map_err(|e| DetectError::Init(e.to_string()))?;

        let session = ort::session::Session::builder()
            .map_err(|e| DetectError::Init(e.to_string()))?
            .with_intra_threads(2)
            .map_err(|e| DetectError::Init(e.to_string()))?
            .commit_from_file(path)
            .map_err(|e| DetectError::Init(e.to_string()))?;

        log::info!("Loaded letter model from {:?}", path);
        Ok(Self { session, params })
    }

    /// Run the model on one RGBA frame and return the best detection at or
    /// above `conf_threshold`, if any
    pub fn infer(
        &mut self,
        data: &[u8],
        width: u32,
        height: u32,
        conf_threshold: f32,
    ) -> Result<Option<Detection>, DetectError> {
        let size = self.params.input_size as usize;
        let input = yolo::preprocess_rgba(data, width, height, self.params.input_size);

        let input_array = Array4::from_shape_vec((1, 3, size, size), input)
            .map_err(|e| DetectError::Inference(e.to_string()))?;
        let input_tensor = ort::value::Tensor::from_array(input_array)
            .map_err(|e| DetectError::Inference(e.to_string()))?;

        let outputs = self
            .session
            .run(ort::inputs![input_tensor].map_err(|e| DetectError::Inference(e.to_string()))?)
            .map_err(|e| DetectError::Inference(e.to_string()))?;

        let output = outputs
            .iter()
            .next()
            .ok_or_else(|| DetectError::Inference("model produced no output".to_string()))?;
        let (shape, raw) = output
            .1
            .try_extract_raw_tensor::<f32>()
            .map_err(|e| DetectError::Inference(e.to_string()))?;

        let dims: Vec<usize> = shape.iter().map(|&d| d as usize).collect();
        yolo::best_detection(raw, &dims, &self.params, conf_threshold)
            .map_err(|e| DetectError::Inference(e.to_string()))
    }
}

/// A frame queued for inference
struct DetectJob {
    data: Vec<u8>,
    width: u32,
    height: u32,
    frame_number: u64,
    conf_threshold: f32,
}

/// Runs a [`Detector`] on a background thread
pub struct DetectWorker {
    latest: Arc<Mutex<Option<DetectionUpdate>>>,
    job_sender: Option<Sender<DetectJob>>,
    ready: Arc<AtomicBool>,
    thread_handle: Option<std::thread::JoinHandle<()>>,
}

impl DetectWorker {
    /// Spawn the inference thread. Model loading happens on the thread; a
    /// load failure disables detection but leaves the app running.
    pub fn spawn(model_path: PathBuf, params: DetectorParams) -> Result<Self, DetectError> {
        let latest = Arc::new(Mutex::new(None));
        let ready = Arc::new(AtomicBool::new(false));

        // Capacity 2: the frame in flight plus one waiting. Anything beyond
        // that is stale by the time the model gets to it.
        let (job_sender, job_receiver) = crossbeam_channel::bounded::<DetectJob>(2);

        let thread_latest = latest.clone();
        let thread_ready = ready.clone();

        let thread_handle = std::thread::Builder::new()
            .name("letter-detect".to_string())
            .spawn(move || {
                Self::worker_loop(model_path, params, job_receiver, thread_latest, thread_ready);
            })
            .map_err(|e| DetectError::Init(e.to_string()))?;

        Ok(Self {
            latest,
            job_sender: Some(job_sender),
            ready,
            thread_handle: Some(thread_handle),
        })
    }

    /// Inference thread body
    fn worker_loop(
        model_path: PathBuf,
        params: DetectorParams,
        job_receiver: Receiver<DetectJob>,
        latest: Arc<Mutex<Option<DetectionUpdate>>>,
        ready: Arc<AtomicBool>,
    ) {
        log::info!("Letter detection thread started");

        let mut detector = match Detector::load(&model_path, params) {
            Ok(detector) => {
                ready.store(true, Ordering::Release);
                Some(detector)
            }
            Err(e) => {
                log::warn!("Detector unavailable: {}. Letter detection disabled.", e);
                None
            }
        };

        let mut sequence: u64 = 0;
        while let Ok(job) = job_receiver.recv() {
            let Some(detector) = detector.as_mut() else {
                continue;
            };
            match detector.infer(&job.data, job.width, job.height, job.conf_threshold) {
                Ok(detection) => {
                    sequence += 1;
                    *latest.lock() = Some(DetectionUpdate {
                        detection,
                        frame_number: job.frame_number,
                        sequence,
                    });
                }
                Err(e) => {
                    // Single-frame fault: skip this frame, keep going
                    log::warn!("Inference error on frame {}: {}", job.frame_number, e);
                }
            }
        }

        ready.store(false, Ordering::Release);
        log::info!("Letter detection thread stopped");
    }

    /// Queue a frame for inference. Non-blocking; the frame is dropped if
    /// the model is still busy with earlier ones.
    pub fn submit(&self, frame: &CameraFrame, conf_threshold: f32) {
        if let Some(ref sender) = self.job_sender {
            let _ = sender.try_send(DetectJob {
                data: frame.data.clone(),
                width: frame.width,
                height: frame.height,
                frame_number: frame.frame_number,
                conf_threshold,
            });
        }
    }

    /// The most recently published result
    pub fn latest(&self) -> Option<DetectionUpdate> {
        *self.latest.lock()
    }

    /// Whether the model loaded and inference is available
    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::Acquire)
    }

    /// Stop the inference thread
    pub fn stop(&mut self) {
        // Dropping the sender ends the receive loop
        self.job_sender = None;
        if let Some(handle) = self.thread_handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for DetectWorker {
    fn drop(&mut self) {
        self.stop();
    }
}
