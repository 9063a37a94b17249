//! Capabilities injected into the console session
//!
//! Notifications, confirmation prompts and the clipboard are supplied as
//! trait objects so the session can be driven without a terminal.

use std::io::{BufRead, Write};
use std::sync::Arc;

use anyhow::Context;
use async_trait::async_trait;
use colored::Colorize;
use serde::Serialize;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, Lines};
use tokio::sync::{mpsc, Mutex};
use tracing::{debug, error, warn};

use crate::errors::KeyVaultError;

const STDIN_BUFFER: usize = 16;

/// Notification severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Success,
    Error,
    Info,
}

/// A transient, display-only message
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub message: String,
    pub level: Level,
}

impl Notification {
    pub fn new(message: impl Into<String>, level: Level) -> Self {
        Self {
            message: message.into(),
            level,
        }
    }
}

/// Fire-and-forget notification sink
pub trait Notifier: Send + Sync {
    fn notify(&self, notification: Notification);

    fn success(&self, message: &str) {
        self.notify(Notification::new(message, Level::Success));
    }

    fn error(&self, message: &str) {
        self.notify(Notification::new(message, Level::Error));
    }

    fn info(&self, message: &str) {
        self.notify(Notification::new(message, Level::Info));
    }
}

/// Prints notifications as coloured lines on stdout
#[derive(Debug, Default)]
pub struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn notify(&self, notification: Notification) {
        debug!("Notification ({:?}): {}", notification.level, notification.message);
        let line = match notification.level {
            Level::Success => format!("[ok] {}", notification.message).green(),
            Level::Error => format!("[error] {}", notification.message).red(),
            Level::Info => format!("[info] {}", notification.message).cyan(),
        };
        println!("{}", line);
    }
}

/// Yes/no confirmation prompt
#[async_trait]
pub trait Confirm: Send + Sync {
    async fn confirm(&self, message: &str) -> bool;
}

/// Operator input, one line at a time
pub struct LineInput {
    source: Mutex<LineSource>,
}

enum LineSource {
    Reader(Lines<Box<dyn AsyncBufRead + Unpin + Send>>),
    Channel(mpsc::Receiver<String>),
}

impl LineInput {
    pub fn new(reader: impl AsyncBufRead + Unpin + Send + 'static) -> Self {
        let reader: Box<dyn AsyncBufRead + Unpin + Send> = Box::new(reader);
        Self {
            source: Mutex::new(LineSource::Reader(reader.lines())),
        }
    }

    /// Lines pushed by another producer; input ends when every sender is dropped
    pub fn from_receiver(lines: mpsc::Receiver<String>) -> Self {
        Self {
            source: Mutex::new(LineSource::Channel(lines)),
        }
    }

    /// Read from the process stdin
    ///
    /// Stdin is read on a detached OS thread, so a pending read never holds
    /// up runtime shutdown.
    pub fn stdin() -> Self {
        let (tx, rx) = mpsc::channel(STDIN_BUFFER);
        let spawned = std::thread::Builder::new()
            .name("keyvault-stdin".to_string())
            .spawn(move || {
                for line in std::io::stdin().lock().lines() {
                    let line = match line {
                        Ok(line) => line,
                        Err(e) => {
                            warn!("Failed to read operator input: {}", e);
                            return;
                        }
                    };
                    if tx.blocking_send(line).is_err() {
                        return;
                    }
                }
            });
        if let Err(e) = spawned {
            error!("Failed to start stdin reader: {}", e);
        }
        Self::from_receiver(rx)
    }

    /// Next line, or `None` at end of input
    pub async fn next_line(&self) -> Option<String> {
        let mut source = self.source.lock().await;
        match &mut *source {
            LineSource::Reader(lines) => match lines.next_line().await {
                Ok(line) => line,
                Err(e) => {
                    warn!("Failed to read operator input: {}", e);
                    None
                }
            },
            LineSource::Channel(lines) => lines.recv().await,
        }
    }
}

/// Asks on stdout and reads the answer from the shared operator input;
/// only `y`/`yes` confirm
pub struct PromptConfirm {
    input: Arc<LineInput>,
}

impl PromptConfirm {
    pub fn new(input: Arc<LineInput>) -> Self {
        Self { input }
    }
}

#[async_trait]
impl Confirm for PromptConfirm {
    async fn confirm(&self, message: &str) -> bool {
        print!("{}\n{} ", message, "Confirm [y/N]:".bold());
        if std::io::stdout().flush().is_err() {
            return false;
        }

        match self.input.next_line().await {
            Some(answer) => matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"),
            None => false,
        }
    }
}

/// Clipboard write access
pub trait Clipboard: Send + Sync {
    fn write_text(&self, text: &str) -> Result<(), KeyVaultError>;
}

/// System clipboard backed by `arboard`
///
/// A handle is opened per write, so a console without a display server
/// still starts; copying then fails with an error notification.
#[derive(Debug, Default)]
pub struct SystemClipboard;

impl Clipboard for SystemClipboard {
    fn write_text(&self, text: &str) -> Result<(), KeyVaultError> {
        let mut clipboard = arboard::Clipboard::new().context("Unable to open the clipboard")?;
        clipboard
            .set_text(text)
            .map_err(|e| KeyVaultError::ClipboardError(e.to_string()))
    }
}
