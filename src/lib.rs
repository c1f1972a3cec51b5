pub mod app;
pub mod capture;
pub mod command;
pub mod command_loop;
pub mod config;
pub mod detector;
pub mod error;
pub mod faces;
pub mod handler;
pub mod storage;

pub use app::{run, run_session, Lifecycle};
pub use capture::{
    CameraSource, CaptureEnd, CaptureLoop, FaceViewer, FrameDisplay, FrameSource, HighguiDisplay,
    HighguiViewer,
};
pub use command::Command;
pub use command_loop::StopSignal;
pub use config::Config;
pub use detector::{
    convert_to_grayscale, detect_faces, CascadeFaceDetector, FaceDetector, CANONICAL_FACE_SIZE,
};
pub use error::{Error, Result};
pub use faces::{FaceBuffer, SharedFaces};
pub use handler::{CommandHandler, Response};
pub use storage::CaptureDirectory;
