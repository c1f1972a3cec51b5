use crate::command::Command;
use crate::handler::{CommandHandler, Response};
use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};
use std::io::{BufRead, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

pub const PROMPT: &str = "Enter command: ";
pub const PROMPT_DELAY: Duration = Duration::from_secs(1);

const STOP_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Process wide request to shut down, shared by every loop.
#[derive(Clone, Default)]
pub struct StopSignal(Arc<AtomicBool>);

impl StopSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stop(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_stopped(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Reads operator lines from `input` and forwards parsed commands.
///
/// Ends after forwarding `exit`, at end of input, or once nobody is listening.
/// A read blocked on the console cannot be interrupted, so the returned handle
/// is not expected to be joined on shutdown.
pub fn spawn_input_reader<R, W>(
    mut input: R,
    mut prompt: W,
    commands: Sender<Command>,
    stop: StopSignal,
    prompt_delay: Duration,
) -> JoinHandle<()>
where
    R: BufRead + Send + 'static,
    W: Write + Send + 'static,
{
    thread::spawn(move || {
        let mut line = String::new();
        while !stop.is_stopped() {
            thread::sleep(prompt_delay);
            _ = write!(prompt, "{PROMPT}");
            _ = prompt.flush();

            line.clear();
            match input.read_line(&mut line) {
                Ok(0) => {
                    log::info!("Console input closed");
                    break;
                }
                Ok(_) => {}
                Err(err) => {
                    log::error!("Failed to read console input: {err}");
                    break;
                }
            }

            let Some(command) = Command::parse(&line) else {
                continue;
            };
            let exit = command == Command::Exit;
            if commands.send(command).is_err() || exit {
                break;
            }
        }
        log::debug!("Input reader finished");
    })
}

/// Runs commands from `commands` until `exit`, a stop request, or until the
/// input side goes away. Replies are written to `output`.
pub fn run_command_loop<W: Write>(
    mut handler: CommandHandler,
    commands: Receiver<Command>,
    stop: StopSignal,
    mut output: W,
) {
    while !stop.is_stopped() {
        let command = match commands.recv_timeout(STOP_POLL_INTERVAL) {
            Ok(command) => command,
            Err(RecvTimeoutError::Timeout) => continue,
            Err(RecvTimeoutError::Disconnected) => break,
        };
        log::debug!("Executing {command:?}");
        match handler.execute(&command) {
            Ok(Response::Message(message)) => {
                _ = writeln!(output, "{message}");
            }
            Ok(Response::Exit) => {
                log::info!("Exit requested");
                stop.stop();
            }
            Err(err) => {
                log::warn!("Command {command:?} failed: {err}");
                _ = writeln!(output, "Error: {err}");
            }
        }
        _ = output.flush();
    }
    log::debug!("Command loop finished");
}

pub fn spawn_command_loop<W>(
    handler: CommandHandler,
    commands: Receiver<Command>,
    stop: StopSignal,
    output: W,
) -> JoinHandle<()>
where
    W: Write + Send + 'static,
{
    thread::spawn(move || run_command_loop(handler, commands, stop, output))
}
