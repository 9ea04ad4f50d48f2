//! Webcam capture
//!
//! Cross-platform camera capture using the nokhwa crate. Frames are decoded
//! to RGBA on a background thread and published through a small ring of
//! buffers; the UI thread pulls the latest complete frame each tick.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use nokhwa::pixel_format::RgbAFormat;
use nokhwa::utils::{ApiBackend, CameraIndex, RequestedFormat, RequestedFormatType, Resolution};
use nokhwa::Camera;
use parking_lot::Mutex;
use thiserror::Error;

/// Consecutive capture failures before the device is considered gone
const MAX_CONSECUTIVE_ERRORS: u32 = 30;

/// Errors from the camera boundary
#[derive(Error, Debug)]
pub enum CameraError {
    #[error("failed to open camera {index}: {reason}")]
    OpenFailed { index: u32, reason: String },
    #[error("failed to start camera stream: {0}")]
    StreamFailed(String),
    #[error("failed to spawn capture thread: {0}")]
    SpawnFailed(#[from] std::io::Error),
}

/// One captured frame in RGBA
#[derive(Clone)]
pub struct CameraFrame {
    /// RGBA pixel data, `width * height * 4` bytes
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
    /// Monotonic capture counter
    pub frame_number: u64,
    pub timestamp: Instant,
}

/// An enumerable capture device
#[derive(Clone, Debug)]
pub struct CameraInfo {
    pub index: u32,
    pub name: String,
}

/// Handle to a running capture thread
pub struct CameraCapture {
    /// Small ring of decoded frames; `latest_index` points at the newest
    /// complete one
    buffers: [Arc<Mutex<Option<CameraFrame>>>; 3],
    latest_index: Arc<AtomicU64>,
    running: Arc<AtomicBool>,
    /// Set by the capture thread when the device stops delivering frames
    failed: Arc<AtomicBool>,
    thread_handle: Option<std::thread::JoinHandle<()>>,
    index: u32,
}

impl CameraCapture {
    /// Enumerate available capture devices
    pub fn list_cameras() -> Vec<CameraInfo> {
        match nokhwa::query(ApiBackend::Auto) {
            Ok(devices) => devices
                .iter()
                .enumerate()
                .map(|(index, info)| CameraInfo {
                    index: index as u32,
                    name: info.human_name().to_string(),
                })
                .collect(),
            Err(e) => {
                log::warn!("Failed to enumerate cameras: {:?}", e);
                Vec::new()
            }
        }
    }

    /// Open the device at `index` and start capturing. The device itself is
    /// opened on the capture thread; an open failure shows up as a failed
    /// capture rather than an `Err` here, since nokhwa devices are not
    /// movable across threads on every backend.
    pub fn open(index: u32) -> Result<Self, CameraError> {
        let buffers: [Arc<Mutex<Option<CameraFrame>>>; 3] = Default::default();
        let latest_index = Arc::new(AtomicU64::new(0));
        let running = Arc::new(AtomicBool::new(true));
        let failed = Arc::new(AtomicBool::new(false));

        let thread_buffers = buffers.clone();
        let thread_latest = latest_index.clone();
        let thread_running = running.clone();
        let thread_failed = failed.clone();

        let thread_handle = std::thread::Builder::new()
            .name(format!("camera-capture-{index}"))
            .spawn(move || {
                if let Err(e) = Self::capture_loop(
                    index,
                    thread_buffers,
                    thread_latest,
                    thread_running.clone(),
                ) {
                    log::error!("Camera {}: {}", index, e);
                    thread_failed.store(true, Ordering::Release);
                }
                thread_running.store(false, Ordering::Release);
            })?;

        Ok(Self {
            buffers,
            latest_index,
            running,
            failed,
            thread_handle: Some(thread_handle),
            index,
        })
    }

    /// Capture thread body: open the device, then decode frames until told
    /// to stop or the device stops responding
    fn capture_loop(
        index: u32,
        buffers: [Arc<Mutex<Option<CameraFrame>>>; 3],
        latest_index: Arc<AtomicU64>,
        running: Arc<AtomicBool>,
    ) -> Result<(), CameraError> {
        let mut camera = Self::open_device(index)?;
        camera
            .open_stream()
            .map_err(|e| CameraError::StreamFailed(e.to_string()))?;

        log::info!(
            "Camera opened: {} ({}x{})",
            camera.info().human_name(),
            camera.resolution().width(),
            camera.resolution().height()
        );

        let mut write_index: u64 = 0;
        let mut consecutive_errors: u32 = 0;

        while running.load(Ordering::Acquire) {
            match camera.frame() {
                Ok(buffer) => match buffer.decode_image::<RgbAFormat>() {
                    Ok(image) => {
                        consecutive_errors = 0;
                        let frame = CameraFrame {
                            width: buffer.resolution().width(),
                            height: buffer.resolution().height(),
                            data: image.into_raw(),
                            frame_number: write_index,
                            timestamp: Instant::now(),
                        };

                        let slot = (write_index % 3) as usize;
                        *buffers[slot].lock() = Some(frame);
                        latest_index.store(write_index, Ordering::Release);
                        write_index = write_index.wrapping_add(1);
                    }
                    Err(e) => {
                        // A single undecodable frame is not fatal
                        log::warn!("Failed to decode frame: {:?}", e);
                    }
                },
                Err(e) => {
                    consecutive_errors += 1;
                    if consecutive_errors >= MAX_CONSECUTIVE_ERRORS {
                        return Err(CameraError::StreamFailed(format!(
                            "device stopped delivering frames: {e}"
                        )));
                    }
                    log::warn!("Failed to capture frame: {:?}", e);
                    std::thread::sleep(std::time::Duration::from_millis(10));
                }
            }
        }

        log::info!("Camera {} capture stopped", index);
        Ok(())
    }

    /// Open the device, preferring the highest resolution it offers and
    /// falling back to whatever format it will accept
    fn open_device(index: u32) -> Result<Camera, CameraError> {
        let camera_index = CameraIndex::Index(index);

        let attempts = [
            RequestedFormatType::AbsoluteHighestResolution,
            RequestedFormatType::HighestResolution(Resolution::new(640, 480)),
            RequestedFormatType::None,
        ];

        let mut last_error = String::new();
        for format_type in attempts {
            let requested = RequestedFormat::new::<RgbAFormat>(format_type);
            match Camera::new(camera_index.clone(), requested) {
                Ok(camera) => return Ok(camera),
                Err(e) => last_error = e.to_string(),
            }
        }

        Err(CameraError::OpenFailed {
            index,
            reason: last_error,
        })
    }

    /// The latest complete frame, if any has been captured yet
    pub fn latest_frame(&self) -> Option<CameraFrame> {
        let index = self.latest_index.load(Ordering::Acquire);
        let slot = (index % 3) as usize;
        self.buffers[slot].lock().clone()
    }

    /// Whether the capture thread is still delivering frames
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Whether the device failed (open error or mid-run disconnect)
    pub fn has_failed(&self) -> bool {
        self.failed.load(Ordering::Acquire)
    }

    /// Device index this capture was opened on
    pub fn index(&self) -> u32 {
        self.index
    }

    /// Stop capturing and join the thread. The last captured frame stays
    /// readable until the capture is dropped.
    pub fn stop(&mut self) {
        self.running.store(false, Ordering::Release);
        if let Some(handle) = self.thread_handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for CameraCapture {
    fn drop(&mut self) {
        self.stop();
    }
}
