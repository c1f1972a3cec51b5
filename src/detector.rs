use crate::error::{Error, Result};
use opencv::core::{self, Mat, Rect, Size, Vector};
use opencv::prelude::*;
use opencv::{imgproc, objdetect};
use std::path::Path;

/// Edge length of every buffered face crop.
pub const CANONICAL_FACE_SIZE: i32 = 200;

/// Finds face-like regions in a grayscale image.
///
/// Regions are in image coordinates. No ordering is promised beyond what the
/// implementation happens to return.
pub trait FaceDetector {
    fn detect(&mut self, gray: &Mat) -> Result<Vec<Rect>>;
}

pub struct CascadeFaceDetector {
    classifier: objdetect::CascadeClassifier,
}

impl CascadeFaceDetector {
    /// Loads a Haar cascade. `model` is used as-is when it names an existing
    /// file, otherwise it is looked up in OpenCV's data search path.
    pub fn new(model: &str) -> Result<Self> {
        let xml = resolve_model(model)?;
        let classifier = objdetect::CascadeClassifier::new(&xml)
            .map_err(|_| Error::ClassifierLoad(xml.clone()))?;
        if classifier.empty()? {
            return Err(Error::ClassifierLoad(xml));
        }
        log::info!("Loaded cascade classifier from {xml}");
        Ok(Self { classifier })
    }
}

impl FaceDetector for CascadeFaceDetector {
    fn detect(&mut self, gray: &Mat) -> Result<Vec<Rect>> {
        let mut faces = Vector::<Rect>::new();

        self.classifier.detect_multi_scale(
            gray,
            &mut faces,
            1.1,
            3,
            objdetect::CASCADE_SCALE_IMAGE,
            core::Size {
                width: 30,
                height: 30,
            },
            core::Size {
                width: 0,
                height: 0,
            },
        )?;
        Ok(faces.to_vec())
    }
}

fn resolve_model(model: &str) -> Result<String> {
    if Path::new(model).is_file() {
        return Ok(model.to_owned());
    }
    match core::find_file_def(model) {
        Ok(found) if !found.is_empty() => Ok(found),
        _ => Err(Error::ClassifierLoad(model.to_owned())),
    }
}

/// Runs detection on a BGR frame.
///
/// Every detected region is outlined on `frame`, but only the first
/// `max_faces` are cropped from the grayscale image and normalized to
/// [`CANONICAL_FACE_SIZE`].
pub fn detect_faces(
    frame: &mut Mat,
    detector: &mut dyn FaceDetector,
    max_faces: usize,
) -> Result<Vec<Mat>> {
    let gray = convert_to_grayscale(frame)?;
    let regions = detector.detect(&gray)?;

    // draw on debug frame
    for region in &regions {
        imgproc::rectangle(
            frame,
            *region,
            (255, 0, 0).into(),
            2,
            imgproc::LINE_8,
            0,
        )?;
    }

    let frame_size = gray.size()?;
    let mut faces = Vec::with_capacity(regions.len().min(max_faces));
    for region in regions.into_iter().take(max_faces) {
        match clip_to_frame(region, frame_size) {
            Some(clipped) => faces.push(crop_face(&gray, clipped)?),
            None => log::debug!("Skipping region {region:?} outside of frame"),
        }
    }
    Ok(faces)
}

pub fn convert_to_grayscale(image: &Mat) -> Result<Mat> {
    let mut gray: Mat = Mat::default();
    imgproc::cvt_color_def(image, &mut gray, imgproc::COLOR_BGR2GRAY)?;
    Ok(gray)
}

fn crop_face(gray: &Mat, region: Rect) -> Result<Mat> {
    let roi = Mat::roi(gray, region)?;
    let mut face = Mat::default();
    imgproc::resize(
        &roi,
        &mut face,
        Size::new(CANONICAL_FACE_SIZE, CANONICAL_FACE_SIZE),
        0.0,
        0.0,
        imgproc::INTER_LINEAR,
    )?;
    Ok(face)
}

/// Intersects `region` with the frame, `None` when nothing is left.
fn clip_to_frame(region: Rect, frame: Size) -> Option<Rect> {
    let left = region.x.max(0);
    let top = region.y.max(0);
    let right = (region.x + region.width).min(frame.width);
    let bottom = (region.y + region.height).min(frame.height);
    if right <= left || bottom <= top {
        return None;
    }
    Some(Rect::new(left, top, right - left, bottom - top))
}
