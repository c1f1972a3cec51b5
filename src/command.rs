use std::fmt::Write;

/// Operator command read from the console.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Capture,
    Clear,
    Show,
    /// Raw argument of `setmax`, validated by the handler so a bad value can
    /// be reported without tearing down the input loop.
    SetMax(String),
    Rename(String),
    Exit,
    Help,
    Unknown(String),
}

impl Command {
    /// Parses one console line. Surrounding whitespace is ignored, `None` for
    /// a blank line.
    pub fn parse(line: &str) -> Option<Self> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }
        let command = match line {
            "capture" => Command::Capture,
            "clear" => Command::Clear,
            "show" => Command::Show,
            "exit" => Command::Exit,
            "help" => Command::Help,
            _ => {
                if let Some(argument) = line.strip_prefix("setmax ") {
                    Command::SetMax(argument.trim().to_owned())
                } else if let Some(name) = line.strip_prefix("rename ") {
                    Command::Rename(name.trim().to_owned())
                } else {
                    Command::Unknown(line.to_owned())
                }
            }
        };
        Some(command)
    }
}

pub const UNKNOWN_COMMAND_HINT: &str =
    "Unknown command. Type 'help' for a list of available commands.";

const HELP_ENTRIES: &[(&str, &str)] = &[
    ("capture", "Manually capture detected faces"),
    ("clear", "Clear captured faces"),
    ("show", "Show captured faces"),
    ("setmax <number>", "Set max number of faces to detect"),
    ("rename <name>", "Rename the most recently captured file"),
    ("help", "Show this table"),
    ("exit", "Exit the program"),
];

const HELP_COLUMN_WIDTH: usize = 30;

pub fn help_text() -> String {
    let rule = "-".repeat(HELP_COLUMN_WIDTH * 2 + 4);
    let mut text = String::new();
    _ = writeln!(text, "{rule}");
    _ = writeln!(text, "{:<HELP_COLUMN_WIDTH$}| Description", "Command");
    _ = writeln!(text, "{rule}");
    for (command, description) in HELP_ENTRIES {
        _ = writeln!(text, "{command:<HELP_COLUMN_WIDTH$}| {description}");
    }
    _ = write!(text, "{rule}");
    text
}
