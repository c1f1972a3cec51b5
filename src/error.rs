use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("OpenCV error {0:?}")]
    OpenCv(#[from] opencv::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Unable to open camera {0}")]
    CameraUnavailable(i32),
    #[error("Failed to load cascade classifier from {0:?}")]
    ClassifierLoad(String),
    #[error("Capture directory {0:?} does not exist or is not a directory")]
    CaptureDirectory(PathBuf),
    #[error("Failed to write image {0:?}")]
    ImageWrite(PathBuf),
    #[error("Invalid face count {0:?}, expected a non-negative integer")]
    InvalidMaxFaces(String),
    #[error("Invalid file name {0:?}")]
    InvalidName(String),
    #[error("Face viewer is no longer running")]
    ViewerUnavailable,
    #[error("Refusing to overwrite existing file {0:?}")]
    RenameTargetExists(PathBuf),
}

pub type Result<T> = std::result::Result<T, Error>;
