use opencv::core::Mat;
use parking_lot::{Mutex, MutexGuard};
use std::sync::Arc;

pub const DEFAULT_MAX_FACES: usize = 1;

/// Faces found in the most recently processed frame together with the limit
/// that applies to the next one.
pub struct FaceBuffer {
    faces: Vec<Mat>,
    max_faces: usize,
}

impl FaceBuffer {
    pub fn new(max_faces: usize) -> Self {
        Self {
            faces: Vec::new(),
            max_faces,
        }
    }

    pub fn faces(&self) -> &[Mat] {
        &self.faces
    }

    pub fn len(&self) -> usize {
        self.faces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.faces.is_empty()
    }

    pub fn max_faces(&self) -> usize {
        self.max_faces
    }

    /// Changes the limit. Faces beyond a lowered limit are dropped at once.
    pub fn set_max_faces(&mut self, max_faces: usize) {
        self.max_faces = max_faces;
        self.faces.truncate(max_faces);
    }

    /// Replaces the buffered faces with those of a new frame, keeping at most
    /// `max_faces` of them.
    pub fn replace(&mut self, mut faces: Vec<Mat>) {
        faces.truncate(self.max_faces);
        self.faces = faces;
    }

    pub fn clear(&mut self) {
        self.faces.clear();
    }
}

impl Default for FaceBuffer {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_FACES)
    }
}

/// Handle to the face buffer shared by the capture and command loops.
#[derive(Clone, Default)]
pub struct SharedFaces {
    inner: Arc<Mutex<FaceBuffer>>,
}

impl SharedFaces {
    pub fn new(max_faces: usize) -> Self {
        Self {
            inner: Arc::new(Mutex::new(FaceBuffer::new(max_faces))),
        }
    }

    pub fn lock(&self) -> MutexGuard<'_, FaceBuffer> {
        self.inner.lock()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use opencv::core::{Scalar, CV_8UC1};
    use opencv::prelude::*;
    use std::thread;

    fn face(value: f64) -> Mat {
        Mat::new_rows_cols_with_default(200, 200, CV_8UC1, Scalar::all(value)).unwrap()
    }

    #[test]
    fn defaults_to_one_face() {
        assert_eq!(FaceBuffer::default().max_faces(), 1);
        assert!(FaceBuffer::default().is_empty());
    }

    #[test]
    fn replace_truncates_to_limit() {
        let mut buffer = FaceBuffer::new(2);
        buffer.replace(vec![face(1.0), face(2.0), face(3.0)]);
        assert_eq!(buffer.len(), 2);
    }

    #[test]
    fn replace_does_not_accumulate() {
        let mut buffer = FaceBuffer::new(5);
        buffer.replace(vec![face(1.0), face(2.0), face(3.0)]);
        buffer.replace(vec![face(4.0)]);
        assert_eq!(buffer.len(), 1);
        let value = *buffer.faces()[0].at_2d::<u8>(0, 0).unwrap();
        assert_eq!(value, 4);
    }

    #[test]
    fn lowering_limit_drops_extra_faces() {
        let mut buffer = FaceBuffer::new(3);
        buffer.replace(vec![face(1.0), face(2.0), face(3.0)]);
        buffer.set_max_faces(1);
        assert_eq!(buffer.len(), 1);
        assert_eq!(*buffer.faces()[0].at_2d::<u8>(0, 0).unwrap(), 1);

        buffer.set_max_faces(4);
        assert_eq!(buffer.len(), 1);
    }

    #[test]
    fn clear_keeps_limit() {
        let mut buffer = FaceBuffer::new(3);
        buffer.replace(vec![face(1.0)]);
        buffer.clear();
        assert!(buffer.is_empty());
        assert_eq!(buffer.max_faces(), 3);
    }

    #[test]
    fn readers_never_see_partial_frames() {
        let shared = SharedFaces::new(4);
        let writer = {
            let shared = shared.clone();
            thread::spawn(move || {
                for round in 0..200 {
                    let count = if round % 2 == 0 { 4 } else { 2 };
                    let value = f64::from(round % 250);
                    let mut buffer = shared.lock();
                    buffer.clear();
                    let faces = (0..count).map(|_| face(value)).collect();
                    buffer.replace(faces);
                }
            })
        };

        for _ in 0..200 {
            let buffer = shared.lock();
            assert!(matches!(buffer.len(), 0 | 2 | 4));
            // all faces in the buffer come from the same frame
            let values: Vec<u8> = buffer
                .faces()
                .iter()
                .map(|f| *f.at_2d::<u8>(0, 0).unwrap())
                .collect();
            assert!(values.windows(2).all(|w| w[0] == w[1]));
        }
        writer.join().unwrap();
    }
}
