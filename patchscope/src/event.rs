//! Event bus for patchscope.
//!
//! Terminal input, the render clock and the results of background work all
//! arrive as [`AppEvent`]s on one tokio unbounded channel. The main loop is the
//! only consumer and the only place application state is mutated, which is
//! what keeps the inspection state machine single-threaded.

use std::sync::Arc;
use std::time::Duration;

use crossterm::event::{Event, EventStream, KeyEvent, KeyEventKind, MouseEvent};
use futures::{FutureExt, StreamExt};
use patchscope_core::{CommitRef, GitBackend, LoadCompletion};
use tokio::sync::mpsc;
use tokio::time::interval;

use crate::highlight::HighlightedPatch;
use crate::shell::ShellCommand;

/// Frame interval (≈30 FPS).
const RENDER_INTERVAL: Duration = Duration::from_millis(33);

/// Highlighted hunks for one patch, tagged with the request that asked for them.
#[derive(Debug)]
pub struct HunksPayload {
    pub token: u64,
    pub result: Result<HighlightedPatch, String>,
}

/// Everything the main loop reacts to.
#[derive(Debug)]
pub enum AppEvent {
    /// Key press (`KeyEventKind::Press` only; release/repeat are filtered out).
    Key(KeyEvent),
    Mouse(MouseEvent),
    Resize(u16, u16),
    /// Time to draw a frame.
    Render,
    /// Commit history of the open repository.
    HistoryLoaded(Result<Vec<CommitRef>, String>),
    /// A patch-list load finished; may be stale.
    PatchesLoaded(LoadCompletion),
    /// Hunks for the selected patch are ready; may be stale.
    HunksLoaded(Box<HunksPayload>),
    /// A clone/init/open dialog produced a repository (or failed to).
    RepositoryOpened(Result<Arc<GitBackend>, String>),
    /// Request from the menu layer to open one of the repository dialogs.
    Shell(ShellCommand),
}

/// Sender and receiver of the event channel.
///
/// Clone `tx` into every background task that reports back; `rx` belongs to
/// the main loop.
pub struct EventHandler {
    pub tx: mpsc::UnboundedSender<AppEvent>,
    pub rx: mpsc::UnboundedReceiver<AppEvent>,
}

impl EventHandler {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self { tx, rx }
    }
}

impl Default for EventHandler {
    fn default() -> Self {
        Self::new()
    }
}

/// Spawns the task that forwards terminal input and render ticks.
///
/// Exits when the crossterm stream ends or the receiver is gone.
pub fn spawn_event_task(tx: mpsc::UnboundedSender<AppEvent>) {
    tokio::spawn(async move {
        let mut render = interval(RENDER_INTERVAL);
        let mut reader = EventStream::new();

        loop {
            // fuse() so a finished stream is not polled again by select!.
            let next = reader.next().fuse();
            let event = tokio::select! {
                _ = render.tick() => AppEvent::Render,
                maybe = next => match maybe {
                    Some(Ok(Event::Key(key))) if key.kind == KeyEventKind::Press => AppEvent::Key(key),
                    Some(Ok(Event::Mouse(mouse))) => AppEvent::Mouse(mouse),
                    Some(Ok(Event::Resize(w, h))) => AppEvent::Resize(w, h),
                    Some(Ok(_)) => continue,
                    Some(Err(e)) => {
                        tracing::warn!(error = %e, "terminal event stream error");
                        continue;
                    }
                    None => break,
                },
            };
            if tx.send(event).is_err() {
                break;
            }
        }
    });
}
