//! Non-blocking resize prompt
//!
//! Reading a width and height from the console blocks, so it runs on its
//! own thread. The frame loop only polls the channel; a finished answer
//! is applied at the next frame boundary. At most one prompt is in flight.

use std::io::{self, BufRead, Write};
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::sync::Mutex;
use std::thread;

use anyhow::{ensure, Result};
use bevy::prelude::Resource;

use crate::visualization::view::parse_resolution;

/// Outcome of one prompt: a validated `(width, height)` or the reason it was rejected
pub type ResizeResult = Result<(u32, u32)>;

#[derive(Resource)]
pub struct ResizePrompt {
    tx: Sender<ResizeResult>,
    rx: Mutex<Receiver<ResizeResult>>, // Receiver is not Sync
    pending: bool,
}

impl Default for ResizePrompt {
    fn default() -> Self {
        Self::new()
    }
}

impl ResizePrompt {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel();
        Self {
            tx,
            rx: Mutex::new(rx),
            pending: false,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.pending
    }

    /// Ask for a new size on the console. Returns `false` if a prompt is
    /// already waiting for input.
    pub fn request(&mut self) -> bool {
        self.request_with(read_resolution_from_console)
    }

    /// Run `read` on a background thread and queue its result
    pub fn request_with<F>(&mut self, read: F) -> bool
    where
        F: FnOnce() -> ResizeResult + Send + 'static,
    {
        if self.pending {
            return false;
        }
        self.pending = true;

        let tx = self.tx.clone();
        thread::spawn(move || {
            // The receiver lives as long as the app; a failed send means we are shutting down
            let _ = tx.send(read());
        });

        true
    }

    /// The queued answer, if the reader has finished. Never blocks.
    pub fn poll(&mut self) -> Option<ResizeResult> {
        let received = match self.rx.lock() {
            Ok(rx) => rx.try_recv(),
            Err(_) => Err(TryRecvError::Disconnected),
        };

        match received {
            Ok(result) => {
                self.pending = false;
                Some(result)
            }
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => {
                self.pending = false;
                None
            }
        }
    }
}

fn read_resolution_from_console() -> ResizeResult {
    let width = prompt_line("Enter window width: ")?;
    let height = prompt_line("Enter window height: ")?;
    parse_resolution(&width, &height)
}

fn prompt_line(label: &str) -> Result<String> {
    let mut stdout = io::stdout();
    write!(stdout, "{label}")?;
    stdout.flush()?;

    let mut line = String::new();
    let read = io::stdin().lock().read_line(&mut line)?;
    ensure!(read > 0, "console input closed");

    Ok(line)
}
