//! Application state.
//!
//! Everything the renderer reads and the key dispatcher mutates lives in
//! [`AppState`]. Background work (history walks, patch loads, hunk loads) is
//! spawned from here and reports back through the event channel; the results
//! are applied by the `apply_*` methods on the main loop.

use std::sync::Arc;

use patchscope_core::selection::{find_selected, report_selection};
use patchscope_core::{CommitInspector, CommitRef, GitBackend, LoadCompletion, PatchDescriptor, SimilarityOptions};
use ratatui::layout::Rect;
use ratatui::widgets::ListState;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::event::{AppEvent, HunksPayload};
use crate::highlight::{self, HighlightedPatch};
use crate::shell::{Dialog, ShellCommand};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    #[default]
    Normal,
    HelpOverlay,
    /// A repository dialog is open; see [`AppState::dialog`].
    Dialog,
}

/// Panel receiving navigation keys. Cycles History → Patches → Diff.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum PanelFocus {
    #[default]
    History,
    Patches,
    Diff,
}

impl PanelFocus {
    pub fn next(self) -> Self {
        match self {
            PanelFocus::History => PanelFocus::Patches,
            PanelFocus::Patches => PanelFocus::Diff,
            PanelFocus::Diff => PanelFocus::History,
        }
    }

    pub fn prev(self) -> Self {
        match self {
            PanelFocus::History => PanelFocus::Diff,
            PanelFocus::Patches => PanelFocus::History,
            PanelFocus::Diff => PanelFocus::Patches,
        }
    }
}

pub struct AppState {
    pub mode: Mode,
    pub focus: PanelFocus,
    tx: UnboundedSender<AppEvent>,

    /// `None` until a repository is open.
    pub inspector: Option<CommitInspector<GitBackend>>,
    similarity: SimilarityOptions,
    history_limit: usize,
    start_rev: Option<String>,

    pub history: Vec<CommitRef>,
    pub history_state: ListState,
    pub history_loading: bool,

    /// Cursor in the patch list.
    pub patch_state: ListState,
    /// The patch the user picked last. Kept across commit switches and matched
    /// against each new patch list by path.
    pub selected_patch: Option<PatchDescriptor>,

    pub diff: HighlightedPatch,
    pub diff_scroll: usize,
    pub hunk_cursor: usize,
    pub diff_loading: bool,
    /// Bumped on every hunk request; older answers are dropped.
    hunk_token: u64,

    pub dialog: Option<Dialog>,
    pub help_scroll: u16,
    pub status_message: Option<String>,
    /// Why the displayed commit's patches could not be loaded. Cleared as
    /// soon as another load for any commit starts.
    pub load_notice: Option<String>,

    /// Inner panel heights from the last frame, for page-wise scrolling.
    pub history_viewport_height: u16,
    pub patches_viewport_height: u16,
    pub diff_viewport_height: u16,
    /// Outer rects of history, patches and diff from the last frame.
    pub panel_rects: [Rect; 3],
}

impl AppState {
    pub fn new(tx: UnboundedSender<AppEvent>, config: &Config, start_rev: Option<String>) -> Self {
        Self {
            mode: Mode::default(),
            focus: PanelFocus::default(),
            tx,
            inspector: None,
            similarity: config.similarity,
            history_limit: config.history_limit,
            start_rev,
            history: Vec::new(),
            history_state: ListState::default(),
            history_loading: false,
            patch_state: ListState::default(),
            selected_patch: None,
            diff: HighlightedPatch::default(),
            diff_scroll: 0,
            hunk_cursor: 0,
            diff_loading: false,
            hunk_token: 0,
            dialog: None,
            help_scroll: 0,
            status_message: None,
            load_notice: None,
            history_viewport_height: 0,
            patches_viewport_height: 0,
            diff_viewport_height: 0,
            panel_rects: [Rect::default(); 3],
        }
    }

    pub fn backend(&self) -> Option<&Arc<GitBackend>> {
        self.inspector.as_ref().map(CommitInspector::backend)
    }

    pub fn patches(&self) -> &[PatchDescriptor] {
        self.inspector.as_ref().map(CommitInspector::current_patches).unwrap_or_default()
    }

    // -----------------------------------------------------------------------
    // Repository and history
    // -----------------------------------------------------------------------

    /// Switches to `backend`, dropping all state tied to the previous repository.
    pub fn open_repository(&mut self, backend: Arc<GitBackend>) {
        info!(root = %backend.root().display(), "opening repository");
        if let Some(old) = self.inspector.as_mut() {
            old.reset();
        }
        self.inspector = Some(CommitInspector::new(backend, self.similarity));
        self.history.clear();
        self.history_state = ListState::default();
        self.patch_state = ListState::default();
        self.selected_patch = None;
        self.load_notice = None;
        self.clear_diff();
        self.focus = PanelFocus::History;
        self.reload_history();
    }

    /// Walks the history again from the configured start revision.
    pub fn reload_history(&mut self) {
        let Some(backend) = self.backend().cloned() else {
            self.status_message = Some("No repository open (o to open one)".into());
            return;
        };
        self.history_loading = true;
        let start = self.start_rev.clone();
        let limit = self.history_limit;
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let result = backend.history(start, limit).await.map_err(|e| e.to_string());
            let _ = tx.send(AppEvent::HistoryLoaded(result));
        });
    }

    pub fn apply_history(&mut self, result: Result<Vec<CommitRef>, String>) {
        self.history_loading = false;
        match result {
            Ok(commits) => {
                debug!(count = commits.len(), "history loaded");
                let keep = self
                    .selected_commit()
                    .and_then(|c| commits.iter().position(|n| n.id() == c.id()));
                self.history = commits;
                if self.history.is_empty() {
                    self.history_state.select(None);
                    self.status_message = Some("Repository has no commits yet".into());
                    return;
                }
                self.select_commit(keep.unwrap_or(0));
            }
            Err(e) => {
                warn!(error = %e, "history walk failed");
                self.status_message = Some(format!("Could not read history: {e}"));
            }
        }
    }

    pub fn selected_commit(&self) -> Option<&CommitRef> {
        self.history_state.selected().and_then(|i| self.history.get(i))
    }

    /// Points the history cursor at `index` and inspects that commit.
    ///
    /// Re-selecting the commit already on display does nothing; selecting a
    /// new one starts a load whose result arrives as `PatchesLoaded`.
    pub fn select_commit(&mut self, index: usize) {
        let Some(commit) = self.history.get(index).cloned() else {
            return;
        };
        self.history_state.select(Some(index));
        let Some(inspector) = self.inspector.as_mut() else {
            return;
        };
        if let Some(load) = inspector.set_commit(commit) {
            self.load_notice = None;
            self.patch_state.select(None);
            self.clear_diff();
            let tx = self.tx.clone();
            tokio::spawn(async move {
                let _ = tx.send(AppEvent::PatchesLoaded(load.await));
            });
        }
    }

    /// Retries the patch load of the current commit after a failure.
    pub fn retry(&mut self) {
        let Some(inspector) = self.inspector.as_mut() else {
            return;
        };
        if let Some(load) = inspector.retry() {
            self.load_notice = None;
            let tx = self.tx.clone();
            tokio::spawn(async move {
                let _ = tx.send(AppEvent::PatchesLoaded(load.await));
            });
        }
    }

    // -----------------------------------------------------------------------
    // Patches and selection
    // -----------------------------------------------------------------------

    /// Hands a finished load to the inspector and re-syncs the patch cursor.
    pub fn apply_patches(&mut self, completion: LoadCompletion) {
        let Some(inspector) = self.inspector.as_mut() else {
            return;
        };
        if !inspector.complete(completion) {
            return;
        }
        self.load_notice = inspector
            .state()
            .failure()
            .map(|err| format!("Patches unavailable: {err} (r to retry)"));
        match find_selected(self.patches(), self.selected_patch.as_ref()) {
            Some(index) => {
                self.patch_state.select(Some(index));
                // Same file, different commit: its hunks have changed.
                if let Some(patch) = self.patches().get(index).cloned() {
                    self.load_hunks(&patch);
                }
            }
            None => {
                let first = (!self.patches().is_empty()).then_some(0);
                self.patch_state.select(first);
                self.clear_diff();
            }
        }
    }

    /// Moves the patch cursor to `index` and reports it as the new selection.
    pub fn choose_patch(&mut self, index: usize) {
        let mut chosen = None;
        report_selection(self.patches(), index, |patch| chosen = Some(patch.clone()));
        if let Some(patch) = chosen {
            self.patch_state.select(Some(index));
            self.on_patch_select(patch);
        }
    }

    /// Selection callback: remembers the patch and loads its hunks.
    pub fn on_patch_select(&mut self, patch: PatchDescriptor) {
        debug!(path = patch.new_path(), "patch selected");
        self.load_hunks(&patch);
        self.selected_patch = Some(patch);
    }

    fn load_hunks(&mut self, patch: &PatchDescriptor) {
        let Some(backend) = self.backend().cloned() else {
            return;
        };
        self.hunk_token += 1;
        self.diff_loading = true;
        let token = self.hunk_token;
        let handle = patch.handle().clone();
        let path = patch.new_path().to_owned();
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let result = match backend.hunks(handle).await {
                Ok(hunks) => tokio::task::spawn_blocking(move || highlight::highlight_patch(&path, &hunks))
                    .await
                    .map_err(|e| format!("highlighting aborted: {e}")),
                Err(e) => Err(e.to_string()),
            };
            let _ = tx.send(AppEvent::HunksLoaded(Box::new(HunksPayload { token, result })));
        });
    }

    /// Installs highlighted hunks if they answer the latest request.
    pub fn apply_hunks(&mut self, payload: HunksPayload) {
        if payload.token != self.hunk_token {
            return;
        }
        self.diff_loading = false;
        self.diff_scroll = 0;
        self.hunk_cursor = 0;
        match payload.result {
            Ok(diff) => self.diff = diff,
            Err(e) => {
                warn!(error = %e, "hunk load failed");
                self.diff = HighlightedPatch::default();
                self.status_message = Some(format!("Could not load diff: {e}"));
            }
        }
    }

    fn clear_diff(&mut self) {
        // Invalidate any hunk request still in flight.
        self.hunk_token += 1;
        self.diff = HighlightedPatch::default();
        self.diff_loading = false;
        self.diff_scroll = 0;
        self.hunk_cursor = 0;
    }

    // -----------------------------------------------------------------------
    // Dialogs
    // -----------------------------------------------------------------------

    pub fn open_dialog(&mut self, command: ShellCommand) {
        self.dialog = Some(Dialog::new(command));
        self.mode = Mode::Dialog;
    }

    pub fn close_dialog(&mut self) {
        self.dialog = None;
        self.mode = Mode::Normal;
    }

    pub fn submit_dialog(&mut self) {
        let tx = self.tx.clone();
        if let Some(dialog) = self.dialog.as_mut() {
            dialog.submit(tx);
        }
    }

    pub fn apply_repository(&mut self, result: Result<Arc<GitBackend>, String>) {
        match result {
            Ok(backend) => {
                self.close_dialog();
                self.status_message = Some(format!("Opened {}", backend.root().display()));
                self.open_repository(backend);
            }
            Err(e) => match self.dialog.as_mut() {
                Some(dialog) => dialog.fail(e),
                None => self.status_message = Some(e),
            },
        }
    }

    // -----------------------------------------------------------------------
    // Navigation
    // -----------------------------------------------------------------------

    /// Moves the cursor of the focused list (or scrolls the diff) by `delta` rows.
    pub fn move_by(&mut self, delta: isize) {
        match self.focus {
            PanelFocus::History => {
                if let Some(index) = step(self.history_state.selected(), delta, self.history.len()) {
                    self.select_commit(index);
                }
            }
            PanelFocus::Patches => {
                if let Some(index) = step(self.patch_state.selected(), delta, self.patches().len()) {
                    self.choose_patch(index);
                }
            }
            PanelFocus::Diff => {
                self.diff_scroll = self.diff_scroll.saturating_add_signed(delta);
                self.clamp_diff_scroll();
            }
        }
    }

    pub fn move_to_top(&mut self) {
        match self.focus {
            PanelFocus::History if !self.history.is_empty() => self.select_commit(0),
            PanelFocus::Patches if !self.patches().is_empty() => self.choose_patch(0),
            PanelFocus::Diff => {
                self.diff_scroll = 0;
                self.hunk_cursor = 0;
            }
            _ => {}
        }
    }

    pub fn move_to_bottom(&mut self) {
        match self.focus {
            PanelFocus::History => {
                if let Some(last) = self.history.len().checked_sub(1) {
                    self.select_commit(last);
                }
            }
            PanelFocus::Patches => {
                if let Some(last) = self.patches().len().checked_sub(1) {
                    self.choose_patch(last);
                }
            }
            PanelFocus::Diff => {
                self.diff_scroll = self.diff.lines.len().saturating_sub(1);
                self.hunk_cursor = self.diff.hunk_offsets.len().saturating_sub(1);
            }
        }
    }

    /// Half a viewport of the focused panel, at least one row.
    pub fn half_page(&self) -> isize {
        let height = match self.focus {
            PanelFocus::History => self.history_viewport_height,
            PanelFocus::Patches => self.patches_viewport_height,
            PanelFocus::Diff => self.diff_viewport_height,
        };
        isize::try_from(height / 2).unwrap_or(isize::MAX).max(1)
    }

    pub fn prev_hunk(&mut self) {
        if self.diff.hunk_offsets.is_empty() {
            return;
        }
        self.hunk_cursor = self.hunk_cursor.saturating_sub(1);
        self.diff_scroll = self.diff.hunk_offsets[self.hunk_cursor];
    }

    pub fn next_hunk(&mut self) {
        if self.diff.hunk_offsets.is_empty() {
            return;
        }
        self.hunk_cursor = (self.hunk_cursor + 1).min(self.diff.hunk_offsets.len() - 1);
        self.diff_scroll = self.diff.hunk_offsets[self.hunk_cursor];
    }

    fn clamp_diff_scroll(&mut self) {
        self.diff_scroll = self.diff_scroll.min(self.diff.lines.len().saturating_sub(1));
    }
}

/// Next cursor position after moving `delta` rows in a list of `len`, clamped.
fn step(current: Option<usize>, delta: isize, len: usize) -> Option<usize> {
    let last = len.checked_sub(1)?;
    let next = match current {
        Some(i) => i.saturating_add_signed(delta),
        None => 0,
    };
    Some(next.min(last))
}
