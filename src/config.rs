use crate::faces::DEFAULT_MAX_FACES;
use crate::storage::DEFAULT_IMAGE_FORMAT;
use clap::Parser;
use std::path::PathBuf;

pub const DEFAULT_CASCADE: &str = "haarcascades/haarcascade_frontalface_default.xml";

/// Capture faces from a webcam and manage them from the console.
#[derive(Parser, Debug, Clone)]
#[command(version, about)]
pub struct Config {
    /// Camera device index.
    #[clap(long, env = "FACE_CAPTURE_CAMERA", default_value_t = 0)]
    pub camera: i32,

    /// Haar cascade file, looked up in the OpenCV data directory if not found
    /// as given.
    #[clap(long, env = "FACE_CAPTURE_CASCADE", default_value = DEFAULT_CASCADE)]
    pub cascade: String,

    /// Existing directory captured faces are written to.
    #[clap(long, env = "FACE_CAPTURE_DIR", default_value = "images")]
    pub capture_dir: PathBuf,

    /// Faces buffered per frame until changed with `setmax`.
    #[clap(long, env = "FACE_CAPTURE_MAX_FACES", default_value_t = DEFAULT_MAX_FACES)]
    pub max_faces: usize,

    /// Image format extension used for captured faces.
    #[clap(long, env = "FACE_CAPTURE_IMAGE_FORMAT", default_value = DEFAULT_IMAGE_FORMAT)]
    pub image_format: String,
}
