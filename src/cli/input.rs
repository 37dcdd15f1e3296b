// Copyright (c) 2024-2025 Jesse Morgan
// Licensed under the MIT License. See LICENSE file for details.

//! Line input for the interactive shell.
//!
//! The rustyline editor blocks, so it lives on its own thread. The shell asks
//! for one line at a time with [`LineReader::request`] and awaits the answer
//! with [`LineReader::next`], which lets it `select!` between typing and
//! session monitor events. Only one line is requested at a time, so nothing
//! reads the terminal while a command (or one of its prompts) is running.

use anyhow::{Context, Result};
use rustyline::history::DefaultHistory;
use rustyline::{Config, EditMode, Editor};
use std::path::PathBuf;
use std::sync::mpsc as std_mpsc;
use std::thread;
use tokio::sync::mpsc;

/// History file name in config directory.
const HISTORY_FILE: &str = "history.txt";

/// Maximum history entries to keep.
const MAX_HISTORY_ENTRIES: usize = 1000;

/// What the reader thread produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputLine {
    Line(String),
    /// Ctrl+D or a closed terminal.
    Eof,
    Failed(String),
}

/// Rustyline editor with history in `~/.optrack/history.txt`.
pub struct InteractiveInput {
    editor: Editor<(), DefaultHistory>,
    history_path: Option<PathBuf>,
}

impl InteractiveInput {
    pub fn new() -> Result<Self> {
        let config = Config::builder()
            .history_ignore_space(true)
            .history_ignore_dups(true)?
            .edit_mode(EditMode::Emacs)
            .auto_add_history(true)
            .max_history_size(MAX_HISTORY_ENTRIES)?
            .build();

        let mut editor = Editor::with_config(config).context("Failed to create input editor")?;

        let history_path = dirs::home_dir().map(|home| home.join(".optrack").join(HISTORY_FILE));
        if let Some(ref path) = history_path {
            if path.exists() {
                let _ = editor.load_history(path);
            }
        }

        Ok(Self { editor, history_path })
    }

    /// Read one line. Ctrl+C gives an empty line, Ctrl+D gives [`InputLine::Eof`].
    pub fn read_line(&mut self, prompt: &str) -> InputLine {
        match self.editor.readline(prompt) {
            Ok(line) => {
                self.save_history();
                InputLine::Line(line)
            }
            Err(rustyline::error::ReadlineError::Interrupted) => InputLine::Line(String::new()),
            Err(rustyline::error::ReadlineError::Eof) => InputLine::Eof,
            Err(e) => InputLine::Failed(e.to_string()),
        }
    }

    fn save_history(&mut self) {
        if let Some(ref path) = self.history_path {
            if let Some(parent) = path.parent() {
                let _ = std::fs::create_dir_all(parent);
            }
            let _ = self.editor.save_history(path);
        }
    }
}

/// Handle to the reader thread.
pub struct LineReader {
    prompts: std_mpsc::Sender<String>,
    lines: mpsc::Receiver<InputLine>,
}

impl LineReader {
    /// Start the reader thread. Editor creation errors surface as the first
    /// [`InputLine::Failed`].
    pub fn spawn() -> Result<Self> {
        let (prompt_tx, prompt_rx) = std_mpsc::channel::<String>();
        let (line_tx, line_rx) = mpsc::channel::<InputLine>(1);

        thread::Builder::new()
            .name("optrack-input".to_string())
            .spawn(move || {
                let mut input = match InteractiveInput::new() {
                    Ok(input) => input,
                    Err(e) => {
                        let _ = line_tx.blocking_send(InputLine::Failed(e.to_string()));
                        return;
                    }
                };
                while let Ok(prompt) = prompt_rx.recv() {
                    let line = input.read_line(&prompt);
                    let done = line == InputLine::Eof;
                    if line_tx.blocking_send(line).is_err() || done {
                        break;
                    }
                }
            })
            .context("Failed to start input thread")?;

        Ok(Self { prompts: prompt_tx, lines: line_rx })
    }

    /// Ask the thread to show `prompt` and read a line.
    pub fn request(&self, prompt: impl Into<String>) {
        // A dead thread shows up as Eof on the next `next()`.
        let _ = self.prompts.send(prompt.into());
    }

    /// Wait for the requested line. Cancel-safe.
    pub async fn next(&mut self) -> InputLine {
        self.lines.recv().await.unwrap_or(InputLine::Eof)
    }
}
