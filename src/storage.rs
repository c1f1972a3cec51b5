use crate::error::{Error, Result};
use chrono::Local;
use opencv::core::{Mat, Vector};
use opencv::imgcodecs;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

pub const DEFAULT_IMAGE_FORMAT: &str = "png";

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d_%H-%M-%S";

/// Directory that captured faces are written to and managed in.
///
/// The directory is expected to exist already, nothing here creates it.
#[derive(Debug, Clone)]
pub struct CaptureDirectory {
    path: PathBuf,
    image_format: String,
}

impl CaptureDirectory {
    pub fn new(path: impl Into<PathBuf>, image_format: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            image_format: image_format.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.is_dir()
    }

    /// Writes each face to `face_<timestamp>_<index>.<format>`.
    ///
    /// Indexes already taken for the same timestamp are skipped, so two
    /// captures within one second never overwrite each other.
    pub fn save_faces(&self, faces: &[Mat]) -> Result<Vec<PathBuf>> {
        self.ensure_exists()?;
        let timestamp = Local::now().format(TIMESTAMP_FORMAT).to_string();
        let params = Vector::<i32>::new();

        let mut written = Vec::with_capacity(faces.len());
        let mut index = 0;
        for face in faces {
            let path = loop {
                let candidate = self.face_path(&timestamp, index);
                index += 1;
                if !candidate.exists() {
                    break candidate;
                }
            };
            let filename = path.to_string_lossy();
            if !imgcodecs::imwrite(&filename, face, &params)? {
                return Err(Error::ImageWrite(path));
            }
            log::debug!("Wrote face to {path:?}");
            written.push(path);
        }
        Ok(written)
    }

    /// Deletes every regular file in the directory, returns how many.
    pub fn remove_files(&self) -> Result<usize> {
        self.ensure_exists()?;
        let mut removed = 0;
        for path in self.regular_files()? {
            fs::remove_file(&path)?;
            removed += 1;
        }
        Ok(removed)
    }

    /// Renames the most recently modified regular file to `<name>.<its
    /// extension>`. Returns the old and new paths, or `None` when there are no
    /// files to rename.
    pub fn rename_latest(&self, name: &str) -> Result<Option<(PathBuf, PathBuf)>> {
        validate_name(name)?;
        self.ensure_exists()?;

        let mut latest: Option<(SystemTime, PathBuf)> = None;
        for path in self.regular_files()? {
            let modified = fs::metadata(&path)?.modified()?;
            if latest.as_ref().map_or(true, |(time, _)| modified > *time) {
                latest = Some((modified, path));
            }
        }
        let Some((_, source)) = latest else {
            return Ok(None);
        };

        let mut target = self.path.join(name);
        if let Some(extension) = source.extension() {
            let mut file_name = target.into_os_string();
            file_name.push(".");
            file_name.push(extension);
            target = PathBuf::from(file_name);
        }
        if target == source {
            return Ok(Some((source, target)));
        }
        if target.exists() {
            return Err(Error::RenameTargetExists(target));
        }
        fs::rename(&source, &target)?;
        Ok(Some((source, target)))
    }

    fn face_path(&self, timestamp: &str, index: usize) -> PathBuf {
        self.path
            .join(format!("face_{timestamp}_{index}.{}", self.image_format))
    }

    fn regular_files(&self) -> Result<Vec<PathBuf>> {
        let mut files = Vec::new();
        for entry in fs::read_dir(&self.path)? {
            let entry = entry?;
            if entry.file_type()?.is_file() {
                files.push(entry.path());
            }
        }
        files.sort();
        Ok(files)
    }

    fn ensure_exists(&self) -> Result<()> {
        if self.exists() {
            Ok(())
        } else {
            Err(Error::CaptureDirectory(self.path.clone()))
        }
    }
}

fn validate_name(name: &str) -> Result<()> {
    let invalid = name.is_empty()
        || name == "."
        || name == ".."
        || name.contains(|c| c == '/' || c == '\\');
    if invalid {
        Err(Error::InvalidName(name.to_owned()))
    } else {
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use opencv::core::{Scalar, CV_8UC1};
    use opencv::prelude::*;
    use std::fs::File;
    use std::time::Duration;

    pub(crate) fn gray_face() -> Mat {
        Mat::new_rows_cols_with_default(200, 200, CV_8UC1, Scalar::all(128.0)).unwrap()
    }

    pub(crate) fn file_names(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    fn touch(path: &Path, age_secs: u64) {
        let file = File::create(path).unwrap();
        let modified = SystemTime::now() - Duration::from_secs(age_secs);
        file.set_modified(modified).unwrap();
    }

    #[test]
    fn save_writes_one_file_per_face() {
        let dir = tempfile::tempdir().unwrap();
        let storage = CaptureDirectory::new(dir.path(), "png");
        let written = storage.save_faces(&[gray_face(), gray_face()]).unwrap();
        assert_eq!(written.len(), 2);
        for name in file_names(dir.path()) {
            assert!(name.starts_with("face_"), "{name}");
            assert!(name.ends_with(".png"), "{name}");
        }
        assert_eq!(file_names(dir.path()).len(), 2);
    }

    #[test]
    fn file_name_carries_timestamp_and_index() {
        let dir = tempfile::tempdir().unwrap();
        let storage = CaptureDirectory::new(dir.path(), "png");
        let written = storage.save_faces(&[gray_face()]).unwrap();
        let name = written[0].file_name().unwrap().to_string_lossy().into_owned();
        // face_YYYY-MM-DD_HH-MM-SS_0.png
        let stamp = &name["face_".len()..name.len() - "_0.png".len()];
        assert!(chrono::NaiveDateTime::parse_from_str(stamp, TIMESTAMP_FORMAT).is_ok());
        assert!(name.ends_with("_0.png"));
    }

    #[test]
    fn save_does_not_overwrite_within_same_second() {
        let dir = tempfile::tempdir().unwrap();
        let storage = CaptureDirectory::new(dir.path(), "png");
        for _ in 0..3 {
            storage.save_faces(&[gray_face()]).unwrap();
        }
        assert_eq!(file_names(dir.path()).len(), 3);
    }

    #[test]
    fn save_nothing_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let storage = CaptureDirectory::new(dir.path(), "png");
        assert!(storage.save_faces(&[]).unwrap().is_empty());
        assert!(file_names(dir.path()).is_empty());
    }

    #[test]
    fn save_into_missing_directory_fails() {
        let dir = tempfile::tempdir().unwrap();
        let storage = CaptureDirectory::new(dir.path().join("missing"), "png");
        let result = storage.save_faces(&[gray_face()]);
        assert!(matches!(result, Err(Error::CaptureDirectory(_))));
    }

    #[test]
    fn remove_files_leaves_subdirectories() {
        let dir = tempfile::tempdir().unwrap();
        touch(&dir.path().join("a.png"), 0);
        touch(&dir.path().join("b.jpg"), 0);
        fs::create_dir(dir.path().join("nested")).unwrap();
        touch(&dir.path().join("nested").join("kept.png"), 0);

        let storage = CaptureDirectory::new(dir.path(), "png");
        assert_eq!(storage.remove_files().unwrap(), 2);
        assert_eq!(file_names(dir.path()), vec!["nested".to_owned()]);
        assert!(dir.path().join("nested").join("kept.png").exists());
    }

    #[test]
    fn rename_targets_most_recent_file() {
        let dir = tempfile::tempdir().unwrap();
        touch(&dir.path().join("old.png"), 300);
        touch(&dir.path().join("newest.jpg"), 10);
        touch(&dir.path().join("middle.png"), 100);

        let storage = CaptureDirectory::new(dir.path(), "png");
        let (from, to) = storage.rename_latest("foo").unwrap().unwrap();
        assert_eq!(from, dir.path().join("newest.jpg"));
        assert_eq!(to, dir.path().join("foo.jpg"));
        assert_eq!(
            file_names(dir.path()),
            vec!["foo.jpg".to_owned(), "middle.png".to_owned(), "old.png".to_owned()]
        );
    }

    #[test]
    fn rename_without_extension_keeps_bare_name() {
        let dir = tempfile::tempdir().unwrap();
        touch(&dir.path().join("snapshot"), 0);
        let storage = CaptureDirectory::new(dir.path(), "png");
        storage.rename_latest("alice").unwrap().unwrap();
        assert_eq!(file_names(dir.path()), vec!["alice".to_owned()]);
    }

    #[test]
    fn rename_in_empty_directory_is_noop() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("only_a_dir")).unwrap();
        let storage = CaptureDirectory::new(dir.path(), "png");
        assert!(storage.rename_latest("foo").unwrap().is_none());
    }

    #[test]
    fn rename_refuses_to_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        touch(&dir.path().join("foo.png"), 100);
        touch(&dir.path().join("latest.png"), 0);
        let storage = CaptureDirectory::new(dir.path(), "png");
        let result = storage.rename_latest("foo");
        assert!(matches!(result, Err(Error::RenameTargetExists(_))));
        assert!(dir.path().join("latest.png").exists());
    }

    #[test]
    fn rename_rejects_path_like_names() {
        let dir = tempfile::tempdir().unwrap();
        touch(&dir.path().join("latest.png"), 0);
        let storage = CaptureDirectory::new(dir.path(), "png");
        for name in ["", "..", "../escape", "a/b"] {
            assert!(matches!(
                storage.rename_latest(name),
                Err(Error::InvalidName(_))
            ));
        }
        assert!(dir.path().join("latest.png").exists());
    }
}
