use crate::command::{help_text, Command, UNKNOWN_COMMAND_HINT};
use crate::error::{Error, Result};
use crate::faces::SharedFaces;
use crate::storage::CaptureDirectory;
use crossbeam_channel::Sender;
use opencv::core::Mat;
use opencv::prelude::*;

/// What the command loop should do after a command ran.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    Message(String),
    Exit,
}

/// Executes operator commands against the shared faces and the capture
/// directory.
///
/// `show` does no GUI work itself: it hands copies of the buffered faces to
/// the capture loop, which owns every window.
pub struct CommandHandler {
    faces: SharedFaces,
    storage: CaptureDirectory,
    show_requests: Sender<Vec<Mat>>,
}

impl CommandHandler {
    pub fn new(
        faces: SharedFaces,
        storage: CaptureDirectory,
        show_requests: Sender<Vec<Mat>>,
    ) -> Self {
        Self {
            faces,
            storage,
            show_requests,
        }
    }

    /// Runs `command` with the face buffer locked for its whole duration.
    pub fn execute(&mut self, command: &Command) -> Result<Response> {
        let message = match command {
            Command::Capture => self.capture()?,
            Command::Clear => self.clear()?,
            Command::Show => self.show()?,
            Command::SetMax(argument) => self.set_max(argument)?,
            Command::Rename(name) => self.rename(name)?,
            Command::Help => help_text(),
            Command::Exit => return Ok(Response::Exit),
            Command::Unknown(_) => UNKNOWN_COMMAND_HINT.to_owned(),
        };
        Ok(Response::Message(message))
    }

    fn capture(&mut self) -> Result<String> {
        let faces = self.faces.lock();
        if faces.is_empty() {
            return Ok("No faces detected, nothing captured.".to_owned());
        }
        let written = self.storage.save_faces(faces.faces())?;
        log::info!("Captured {} face(s)", written.len());
        let dir = self.storage.path().display();
        Ok(format!("Captured {} face(s) to {dir}", written.len()))
    }

    fn clear(&mut self) -> Result<String> {
        let mut faces = self.faces.lock();
        // the buffer is only emptied once the files are gone
        let removed = self.storage.remove_files()?;
        faces.clear();
        log::info!("Cleared {removed} captured file(s)");
        Ok(format!("Captured faces cleared ({removed} file(s) removed)."))
    }

    fn show(&mut self) -> Result<String> {
        let faces = self.faces.lock();
        if faces.is_empty() {
            return Ok("No faces to show.".to_owned());
        }
        let copies = faces
            .faces()
            .iter()
            .map(|face| face.try_clone())
            .collect::<opencv::Result<Vec<Mat>>>()?;
        let count = copies.len();
        self.show_requests.send(copies).map_err(|_| Error::ViewerUnavailable)?;
        Ok(format!("Showing {count} face(s), press a key in the viewer to advance."))
    }

    fn set_max(&mut self, argument: &str) -> Result<String> {
        let max_faces: usize = argument
            .parse()
            .map_err(|_| Error::InvalidMaxFaces(argument.to_owned()))?;
        self.faces.lock().set_max_faces(max_faces);
        log::info!("Max faces set to {max_faces}");
        Ok(format!("Maximum number of faces to detect set to {max_faces}"))
    }

    fn rename(&mut self, name: &str) -> Result<String> {
        let _faces = self.faces.lock();
        match self.storage.rename_latest(name)? {
            Some((from, to)) => {
                log::info!("Renamed {from:?} to {to:?}");
                Ok(format!("File renamed to: {}", to.display()))
            }
            None => Ok("No files found in the directory.".to_owned()),
        }
    }
}
