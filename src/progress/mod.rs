//! Progress reporting for long-running reconciliation
//!
//! The orchestrator only ever calls [`ProgressSink::log`]. In interactive mode
//! the work runs on a blocking worker and its log lines travel over a bounded
//! channel to a render loop that owns the terminal.

use std::io::{self, Write};
use std::time::Duration;

use crossterm::{
    cursor::MoveToPreviousLine,
    queue,
    style::{Print, Stylize},
    terminal::{self, Clear, ClearType},
};
use tokio::sync::mpsc;

use crate::error::{Result, SevenError};

const SPINNER_FRAMES: &[char] = &['◐', '◓', '◑', '◒'];
const TICK: Duration = Duration::from_millis(120);
const VISIBLE_LINES: usize = 6;
const CHANNEL_CAPACITY: usize = 64;

/// Receives human-readable progress lines such as `[seven up] sprite exists`.
pub trait ProgressSink: Send + Sync {
    fn log(&self, line: &str);
}

/// Prints each line as it arrives.
#[derive(Debug, Default, Clone, Copy)]
pub struct PrintSink {
    styled: bool,
}

impl PrintSink {
    pub fn plain() -> Self {
        Self { styled: false }
    }

    pub fn styled() -> Self {
        Self { styled: true }
    }
}

impl ProgressSink for PrintSink {
    fn log(&self, line: &str) {
        if self.styled {
            println!("{}", format_bullet_log(line));
        } else {
            println!("{}", line);
        }
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl ProgressSink for NullSink {
    fn log(&self, _line: &str) {}
}

pub enum ProgressEvent<T> {
    Log(String),
    Completed(Result<T>),
}

/// Forwards lines to the render loop. Must only be used off the async
/// runtime (inside `spawn_blocking`).
pub struct ChannelSink<T> {
    tx: mpsc::Sender<ProgressEvent<T>>,
}

impl<T> ChannelSink<T> {
    pub fn new(tx: mpsc::Sender<ProgressEvent<T>>) -> Self {
        Self { tx }
    }
}

impl<T: Send> ProgressSink for ChannelSink<T> {
    fn log(&self, line: &str) {
        // The receiver only goes away when the process is exiting.
        let _ = self.tx.blocking_send(ProgressEvent::Log(line.to_string()));
    }
}

/// Split `[seven up] rest` into `("[seven up]", "rest")`.
pub fn split_log_prefix(line: &str) -> Option<(&str, &str)> {
    if !line.starts_with('[') {
        return None;
    }
    let end = line.find(']')?;
    Some((&line[..=end], line[end + 1..].trim()))
}

pub fn format_styled_log(line: &str) -> String {
    match split_log_prefix(line) {
        Some((prefix, rest)) => format!("{} {}", prefix.blue().bold(), rest.dark_grey()),
        None => line.to_string(),
    }
}

pub fn format_bullet_log(line: &str) -> String {
    format!("{} {}", "•".dark_grey(), format_styled_log(line))
}

/// Spinner header plus the most recent log lines, redrawn in place.
pub struct ProgressView {
    title: String,
    lines: Vec<String>,
    frame: usize,
    drawn: u16,
}

impl ProgressView {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            lines: Vec::new(),
            frame: 0,
            drawn: 0,
        }
    }

    pub fn push(&mut self, line: String) {
        self.lines.push(line);
    }

    pub fn tick(&mut self) {
        self.frame = self.frame.wrapping_add(1);
    }

    pub fn visible_lines(&self) -> &[String] {
        let start = self.lines.len().saturating_sub(VISIBLE_LINES);
        &self.lines[start..]
    }

    fn header(&self, failed: Option<bool>) -> String {
        match failed {
            Some(true) => format!("! {}", self.title),
            Some(false) => format!("✓ {}", self.title),
            None => format!(
                "{} {}",
                SPINNER_FRAMES[self.frame % SPINNER_FRAMES.len()],
                self.title
            ),
        }
    }

    fn draw_with(&mut self, out: &mut impl Write, failed: Option<bool>) -> io::Result<()> {
        if self.drawn > 0 {
            queue!(
                out,
                MoveToPreviousLine(self.drawn),
                Clear(ClearType::FromCursorDown)
            )?;
        }

        let width = terminal::size().map(|(w, _)| w as usize).unwrap_or(80);
        let header = self.header(failed);
        queue!(out, Print(format!("{}\r\n", header.bold())))?;
        let mut drawn = 1u16;
        for line in self.visible_lines() {
            let line = truncate(line, width.saturating_sub(2));
            queue!(out, Print(format!("{}\r\n", format_bullet_log(&line))))?;
            drawn += 1;
        }
        self.drawn = drawn;
        out.flush()
    }

    pub fn draw(&mut self, out: &mut impl Write) -> io::Result<()> {
        self.draw_with(out, None)
    }

    pub fn finish(&mut self, out: &mut impl Write, error: Option<&SevenError>) -> io::Result<()> {
        self.draw_with(out, Some(error.is_some()))?;
        if let Some(err) = error {
            queue!(out, Print(format!("\r\n{} {}\r\n", "error:".red().bold(), err)))?;
            out.flush()?;
        }
        Ok(())
    }
}

fn truncate(line: &str, max: usize) -> String {
    if line.chars().count() <= max {
        return line.to_string();
    }
    let mut cut: String = line.chars().take(max.saturating_sub(1)).collect();
    cut.push('…');
    cut
}

/// Run `work` on a blocking worker while rendering its progress.
///
/// Ctrl-C exits the process immediately with status 130; the worker's
/// external commands receive the same interrupt from the terminal.
pub async fn run_with_progress<T, F>(title: &str, work: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce(&dyn ProgressSink) -> Result<T> + Send + 'static,
{
    let (tx, mut rx) = mpsc::channel::<ProgressEvent<T>>(CHANNEL_CAPACITY);

    let worker = tokio::task::spawn_blocking(move || {
        let sink = ChannelSink::new(tx.clone());
        let result = work(&sink);
        let _ = tx.blocking_send(ProgressEvent::Completed(result));
    });

    let mut view = ProgressView::new(title);
    let mut stdout = io::stdout();
    let mut tick = tokio::time::interval(TICK);
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    let result = loop {
        tokio::select! {
            event = rx.recv() => match event {
                Some(ProgressEvent::Log(line)) => {
                    tracing::debug!("progress: {}", line);
                    view.push(line);
                    view.draw(&mut stdout)?;
                }
                Some(ProgressEvent::Completed(result)) => break result,
                None => {
                    break Err(SevenError::CommandFailed {
                        command: title.to_string(),
                        detail: "worker exited without a result".to_string(),
                    })
                }
            },
            _ = tick.tick() => {
                view.tick();
                view.draw(&mut stdout)?;
            }
            _ = &mut ctrl_c => {
                let _ = view.finish(&mut stdout, None);
                std::process::exit(130);
            }
        }
    };

    if let Err(e) = worker.await {
        tracing::warn!("Progress worker did not shut down cleanly: {}", e);
    }
    view.finish(&mut stdout, result.as_ref().err())?;
    result
}
