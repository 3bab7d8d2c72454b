// Clipboard module: hands the uploaded link to an external program that owns
// the system clipboard (`wl-copy` on Wayland by default). The program reads
// the text on stdin and must exit successfully.

use crate::error::ClipboardError;
use std::io::Write;
use std::process::{Command, Stdio};

/// Command used when none is given on the command line (Wayland).
pub const DEFAULT_CLIPBOARD_COMMAND: &str = "wl-copy";

/// Destination for uploaded links.
pub trait ClipboardSink {
    fn write_text(&self, text: &str) -> Result<(), ClipboardError>;
}

impl<C: ClipboardSink + ?Sized> ClipboardSink for &C {
    fn write_text(&self, text: &str) -> Result<(), ClipboardError> {
        (**self).write_text(text)
    }
}

/// Sets the clipboard by piping text into an external program such as
/// `wl-copy` or `xclip -selection clipboard`.
#[derive(Debug, Clone)]
pub struct CommandClipboard {
    program: String,
    args: Vec<String>,
}

impl CommandClipboard {
    /// Split a shell-style command line into program and arguments.
    pub fn parse(command_line: &str) -> Result<Self, ClipboardError> {
        let mut words = shell_words::split(command_line)
            .map_err(|e| ClipboardError::Command(format!("{}: {}", command_line, e)))?;
        if words.is_empty() {
            return Err(ClipboardError::Command("empty command".to_string()));
        }
        let program = words.remove(0);
        Ok(CommandClipboard {
            program,
            args: words,
        })
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }
}

impl Default for CommandClipboard {
    fn default() -> Self {
        CommandClipboard {
            program: DEFAULT_CLIPBOARD_COMMAND.to_string(),
            args: Vec::new(),
        }
    }
}

impl ClipboardSink for CommandClipboard {
    fn write_text(&self, text: &str) -> Result<(), ClipboardError> {
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .spawn()
            .map_err(|source| ClipboardError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        // Taking stdin drops it at the end of the block, closing the pipe so
        // the child sees EOF.
        let written = match child.stdin.take() {
            Some(mut stdin) => stdin.write_all(text.as_bytes()),
            None => Ok(()),
        };

        let status = child.wait()?;
        written?;
        if !status.success() {
            return Err(ClipboardError::Exit(status));
        }
        log::debug!("Copied {} bytes with {}", text.len(), self.program);
        Ok(())
    }
}
