use crate::capture::{
    CameraSource, CaptureEnd, CaptureLoop, FrameDisplay, FrameSource, HighguiDisplay,
    HighguiViewer,
};
use crate::command::Command;
use crate::command_loop::{spawn_command_loop, spawn_input_reader, StopSignal, PROMPT_DELAY};
use crate::config::Config;
use crate::detector::{CascadeFaceDetector, FaceDetector};
use crate::error::Result;
use crate::faces::SharedFaces;
use crate::handler::CommandHandler;
use crate::storage::CaptureDirectory;
use crossbeam_channel::Receiver;
use std::io::{self, BufReader};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    Initializing,
    Running,
    Stopping,
    Terminated,
}

fn enter(state: Lifecycle) {
    log::info!("Session {state:?}");
}

/// Opens the camera and classifier described by `config` and runs an
/// interactive session on stdin/stdout until it stops.
///
/// Failing to load the classifier or open the camera returns before either
/// loop has started.
pub fn run(config: &Config) -> Result<CaptureEnd> {
    enter(Lifecycle::Initializing);

    let storage = CaptureDirectory::new(&config.capture_dir, &config.image_format);
    if !storage.exists() {
        log::warn!(
            "Capture directory {:?} does not exist, capture commands will fail",
            storage.path()
        );
    }

    let init = CascadeFaceDetector::new(&config.cascade).and_then(|detector| {
        let camera = CameraSource::new(config.camera)?;
        let display = HighguiDisplay::new()?;
        Ok((detector, camera, display))
    });
    let (detector, camera, display) = match init {
        Ok(parts) => parts,
        Err(err) => {
            enter(Lifecycle::Terminated);
            return Err(err);
        }
    };

    let faces = SharedFaces::new(config.max_faces);
    let (show_tx, show_rx) = crossbeam_channel::unbounded();
    let handler = CommandHandler::new(faces.clone(), storage, show_tx);
    let capture = CaptureLoop::new(camera, detector, display, faces)
        .with_viewer(Box::new(HighguiViewer), show_rx);

    let (command_tx, command_rx) = crossbeam_channel::unbounded();
    let stop = StopSignal::new();
    // blocked console reads cannot be cancelled, the reader is left detached
    _ = spawn_input_reader(
        BufReader::new(io::stdin()),
        io::stdout(),
        command_tx,
        stop.clone(),
        PROMPT_DELAY,
    );

    let end = run_session(capture, handler, command_rx, stop);
    enter(Lifecycle::Terminated);
    end
}

/// Runs the command loop on a background thread and the capture loop on the
/// calling one. Returns once both have finished.
pub fn run_session<S, D, V>(
    mut capture: CaptureLoop<S, D, V>,
    handler: CommandHandler,
    commands: Receiver<Command>,
    stop: StopSignal,
) -> Result<CaptureEnd>
where
    S: FrameSource,
    D: FaceDetector,
    V: FrameDisplay,
{
    enter(Lifecycle::Running);
    let command_thread = spawn_command_loop(handler, commands, stop.clone(), io::stdout());

    let end = capture.run(&stop);
    match &end {
        Ok(reason) => log::info!("Capture loop ended: {reason:?}"),
        Err(err) => log::error!("Capture loop failed: {err}"),
    }

    enter(Lifecycle::Stopping);
    stop.stop();
    if command_thread.join().is_err() {
        log::error!("Command loop panicked");
    }
    end
}
