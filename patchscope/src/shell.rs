//! Repository dialogs: clone, init and open.
//!
//! A [`ShellCommand`] asks the shell to show one of the dialogs. The dialog
//! collects text fields, and on submit the repository work runs on the
//! blocking pool; the outcome comes back as [`AppEvent::RepositoryOpened`].

use std::path::PathBuf;
use std::sync::Arc;

use crossterm::event::{KeyCode, KeyEvent};
use patchscope_core::GitBackend;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{info, warn};

use crate::event::AppEvent;

/// Dialog triggers. They carry no payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShellCommand {
    OpenCloneRepo,
    OpenInitRepo,
    OpenOpenRepo,
}

impl ShellCommand {
    fn title(self) -> &'static str {
        match self {
            ShellCommand::OpenCloneRepo => " Clone repository ",
            ShellCommand::OpenInitRepo => " Initialize repository ",
            ShellCommand::OpenOpenRepo => " Open repository ",
        }
    }
}

/// One labelled text input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    pub label: &'static str,
    pub value: String,
}

impl Field {
    fn new(label: &'static str) -> Self {
        Self { label, value: String::new() }
    }
}

/// What a key press did to the dialog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialogOutcome {
    Editing,
    Cancelled,
    Submitted,
}

#[derive(Debug, Clone)]
pub struct Dialog {
    pub command: ShellCommand,
    pub fields: Vec<Field>,
    pub focused: usize,
    /// Validation or repository error from the last submit.
    pub error: Option<String>,
    /// Set while the clone/init/open job is running.
    pub busy: bool,
}

impl Dialog {
    pub fn new(command: ShellCommand) -> Self {
        let fields = match command {
            ShellCommand::OpenCloneRepo => vec![Field::new("URL"), Field::new("Directory")],
            ShellCommand::OpenInitRepo | ShellCommand::OpenOpenRepo => vec![Field::new("Directory")],
        };
        Self { command, fields, focused: 0, error: None, busy: false }
    }

    pub fn title(&self) -> &'static str {
        self.command.title()
    }

    /// Feeds one key to the dialog.
    ///
    /// Typing edits the focused field; Tab/BackTab move between fields; Enter
    /// submits once every field is filled; Esc cancels. Keys are ignored while
    /// a submit is in flight, except Esc.
    pub fn handle_key(&mut self, key: KeyEvent) -> DialogOutcome {
        if key.code == KeyCode::Esc {
            return DialogOutcome::Cancelled;
        }
        if self.busy {
            return DialogOutcome::Editing;
        }
        match key.code {
            KeyCode::Tab | KeyCode::Down => {
                self.focused = (self.focused + 1) % self.fields.len();
            }
            KeyCode::BackTab | KeyCode::Up => {
                self.focused = (self.focused + self.fields.len() - 1) % self.fields.len();
            }
            KeyCode::Backspace => {
                self.fields[self.focused].value.pop();
            }
            KeyCode::Char(c) => {
                self.fields[self.focused].value.push(c);
                self.error = None;
            }
            KeyCode::Enter => {
                if let Some(empty) = self.fields.iter().position(|f| f.value.trim().is_empty()) {
                    self.error = Some(format!("{} is required", self.fields[empty].label));
                    self.focused = empty;
                } else {
                    return DialogOutcome::Submitted;
                }
            }
            _ => {}
        }
        DialogOutcome::Editing
    }

    fn value(&self, index: usize) -> String {
        self.fields.get(index).map(|f| f.value.trim().to_owned()).unwrap_or_default()
    }

    /// Starts the repository job for a submitted dialog and marks it busy.
    pub fn submit(&mut self, tx: UnboundedSender<AppEvent>) {
        self.busy = true;
        self.error = None;
        let command = self.command;
        let (url, dir) = match command {
            ShellCommand::OpenCloneRepo => (self.value(0), expand_home(&self.value(1))),
            _ => (String::new(), expand_home(&self.value(0))),
        };
        info!(?command, dir = %dir.display(), "repository dialog submitted");

        tokio::spawn(async move {
            let job = tokio::task::spawn_blocking(move || match command {
                ShellCommand::OpenCloneRepo => GitBackend::clone_from(&url, &dir),
                ShellCommand::OpenInitRepo => GitBackend::init(&dir),
                ShellCommand::OpenOpenRepo => GitBackend::open(&dir),
            });
            let result = match job.await {
                Ok(Ok(backend)) => Ok(Arc::new(backend)),
                Ok(Err(e)) => Err(e.to_string()),
                Err(e) => Err(format!("repository job aborted: {e}")),
            };
            if let Err(e) = &result {
                warn!(?command, error = %e, "repository dialog failed");
            }
            let _ = tx.send(AppEvent::RepositoryOpened(result));
        });
    }

    /// Puts a failed submit back into editing with the error shown.
    pub fn fail(&mut self, error: String) {
        self.busy = false;
        self.error = Some(error);
    }
}

fn expand_home(raw: &str) -> PathBuf {
    match raw.strip_prefix("~/") {
        Some(rest) => std::env::var("HOME")
            .map(|home| PathBuf::from(home).join(rest))
            .unwrap_or_else(|_| PathBuf::from(raw)),
        None => PathBuf::from(raw),
    }
}
