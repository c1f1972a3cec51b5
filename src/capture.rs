use crate::command_loop::StopSignal;
use crate::detector::{detect_faces, FaceDetector};
use crate::error::{Error, Result};
use crate::faces::SharedFaces;
use crossbeam_channel::Receiver;
use opencv::core::Mat;
use opencv::prelude::*;
use opencv::{highgui, videoio};

pub const DETECTION_WINDOW: &str = "Face Detection";
pub const VIEWER_WINDOW: &str = "Captured Face";

const ESCAPE_KEY: i32 = 27;
const KEY_POLL_MS: i32 = 10;

/// Source of BGR frames. `None` marks the end of the stream.
pub trait FrameSource {
    fn next_frame(&mut self) -> Result<Option<Mat>>;
}

pub struct CameraSource {
    camera: videoio::VideoCapture,
}

impl CameraSource {
    pub fn new(index: i32) -> Result<Self> {
        let camera = videoio::VideoCapture::new(index, videoio::CAP_ANY).map_err(|err| {
            log::error!("Failed to create capture for camera {index}: {err}");
            Error::CameraUnavailable(index)
        })?;
        let opened = videoio::VideoCapture::is_opened(&camera)?;
        if !opened {
            return Err(Error::CameraUnavailable(index));
        }
        log::info!("Opened camera {index}");
        Ok(Self { camera })
    }
}

impl FrameSource for CameraSource {
    fn next_frame(&mut self) -> Result<Option<Mat>> {
        let mut frame = Mat::default();
        if !self.camera.read(&mut frame)? || frame.empty() {
            return Ok(None);
        }
        Ok(Some(frame))
    }
}

/// Surface the annotated frames are rendered to.
pub trait FrameDisplay {
    fn show(&mut self, frame: &Mat) -> Result<()>;
    /// Waits briefly for input, `true` once the operator asked to quit.
    fn cancel_requested(&mut self) -> Result<bool>;
}

pub struct HighguiDisplay;

impl HighguiDisplay {
    pub fn new() -> Result<Self> {
        highgui::named_window_def(DETECTION_WINDOW)?;
        Ok(Self)
    }
}

impl FrameDisplay for HighguiDisplay {
    fn show(&mut self, frame: &Mat) -> Result<()> {
        highgui::imshow(DETECTION_WINDOW, frame)?;
        Ok(())
    }

    fn cancel_requested(&mut self) -> Result<bool> {
        Ok(highgui::wait_key(KEY_POLL_MS)? == ESCAPE_KEY)
    }
}

/// Shows faces to the operator one at a time.
pub trait FaceViewer {
    /// Blocks until the operator has seen `face`.
    fn view(&mut self, face: &Mat) -> Result<()>;
    fn close(&mut self) -> Result<()>;
}

pub struct HighguiViewer;

impl FaceViewer for HighguiViewer {
    fn view(&mut self, face: &Mat) -> Result<()> {
        highgui::imshow(VIEWER_WINDOW, face)?;
        highgui::wait_key(0)?;
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        highgui::destroy_window(VIEWER_WINDOW)?;
        Ok(())
    }
}

/// Faces queued by `show`, displayed by the capture loop between frames so
/// that all window handling stays on one thread.
struct ViewerQueue {
    viewer: Box<dyn FaceViewer>,
    requests: Receiver<Vec<Mat>>,
}

impl ViewerQueue {
    fn drain(&mut self) -> Result<()> {
        for faces in self.requests.try_iter() {
            for face in &faces {
                self.viewer.view(face)?;
            }
            self.viewer.close()?;
        }
        Ok(())
    }
}

/// Why the capture loop returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureEnd {
    StreamEnded,
    Cancelled,
    StopRequested,
}

pub struct CaptureLoop<S, D, V> {
    source: S,
    detector: D,
    display: V,
    faces: SharedFaces,
    viewer: Option<ViewerQueue>,
}

impl<S, D, V> CaptureLoop<S, D, V>
where
    S: FrameSource,
    D: FaceDetector,
    V: FrameDisplay,
{
    pub fn new(source: S, detector: D, display: V, faces: SharedFaces) -> Self {
        Self {
            source,
            detector,
            display,
            faces,
            viewer: None,
        }
    }

    /// Displays faces sent on `requests` with `viewer` between frames.
    pub fn with_viewer(
        mut self,
        viewer: Box<dyn FaceViewer>,
        requests: Receiver<Vec<Mat>>,
    ) -> Self {
        self.viewer = Some(ViewerQueue { viewer, requests });
        self
    }

    /// Replaces the buffered faces with those found in `frame` and annotates
    /// it. Detection runs with the buffer locked.
    pub fn process_frame(&mut self, frame: &mut Mat) -> Result<usize> {
        let mut faces = self.faces.lock();
        faces.clear();
        let found = detect_faces(frame, &mut self.detector, faces.max_faces())?;
        faces.replace(found);
        Ok(faces.len())
    }

    /// Pulls frames until the stream ends, the operator cancels, or `stop` is
    /// set elsewhere. Sets `stop` itself on the way out.
    pub fn run(&mut self, stop: &StopSignal) -> Result<CaptureEnd> {
        let end = self.run_until_stopped(stop);
        stop.stop();
        end
    }

    fn run_until_stopped(&mut self, stop: &StopSignal) -> Result<CaptureEnd> {
        loop {
            if stop.is_stopped() {
                return Ok(CaptureEnd::StopRequested);
            }
            let Some(mut frame) = self.source.next_frame()? else {
                return Ok(CaptureEnd::StreamEnded);
            };

            self.process_frame(&mut frame)?;

            self.display.show(&frame)?;
            if self.display.cancel_requested()? {
                return Ok(CaptureEnd::Cancelled);
            }

            if let Some(viewer) = &mut self.viewer {
                if let Err(err) = viewer.drain() {
                    log::warn!("Failed to show captured faces: {err}");
                }
            }
        }
    }
}
