//! Docking session manager
//!
//! Maps each open docking panel to its session record, drives panel
//! creation (process spawn + window adoption), persists the docking
//! arrangement as a layout document, and recreates panels on restore.
//! Restore is best-effort: entries whose session has been deleted since
//! the last run are dropped silently, and a workspace that would come up
//! empty gets the session tree opened instead.

use std::path::PathBuf;
use std::sync::Arc;

use tracing::{debug, info, warn};
use uuid::Uuid;

use termdock_session::{DockState, SessionRecord, SessionStore};
use termdock_utils::{Result, TermdockError};

use crate::embed::{CancelToken, WindowEmbedder};
use crate::events::{EventProxy, UiEvent};
use crate::layout::{LayoutDocument, LayoutEntry, PanelKind};
use crate::panel::DockPanel;
use crate::process::ProcessHost;
use crate::winsys::{WindowId, WindowSystem};

/// Boundary onto the pre-existing docking capability: container windows,
/// chrome, and tab arrangement belong to it; the manager only asks for
/// containers and gives them back.
pub trait DockingHost {
    /// Create a container window for a new panel
    fn create_container(&mut self, title: &str, dock_state: DockState) -> Result<WindowId>;
    /// Remove a panel's container from the workspace
    fn remove_container(&mut self, container: WindowId);
}

/// Accounting for one best-effort layout restore
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RestoreSummary {
    /// Terminal panels materialized
    pub terminals: usize,
    /// Session-tree panels restored
    pub trees: usize,
    /// Entries dropped (deleted session, failed launch/adoption)
    pub dropped: usize,
}

impl RestoreSummary {
    pub fn describe(&self) -> String {
        if self.dropped == 0 {
            format!("restored {} terminal panel(s)", self.terminals)
        } else {
            format!(
                "restored {} terminal panel(s), dropped {} stale entr(ies)",
                self.terminals, self.dropped
            )
        }
    }
}

pub struct DockingSessionManager {
    store: SessionStore,
    winsys: Arc<dyn WindowSystem>,
    embedder: WindowEmbedder,
    dock: Box<dyn DockingHost>,
    events: EventProxy,
    terminal_exe: PathBuf,
    host_frame: WindowId,
    panels: Vec<DockPanel>,
}

impl DockingSessionManager {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        store: SessionStore,
        winsys: Arc<dyn WindowSystem>,
        embedder: WindowEmbedder,
        dock: Box<dyn DockingHost>,
        events: EventProxy,
        terminal_exe: PathBuf,
        host_frame: WindowId,
    ) -> Self {
        Self {
            store,
            winsys,
            embedder,
            dock,
            events,
            terminal_exe,
            host_frame,
            panels: Vec::new(),
        }
    }

    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut SessionStore {
        &mut self.store
    }

    pub fn panels(&self) -> &[DockPanel] {
        &self.panels
    }

    pub fn panel(&self, panel_id: Uuid) -> Option<&DockPanel> {
        self.panels.iter().find(|p| p.id() == panel_id)
    }

    pub fn open_terminal_count(&self) -> usize {
        self.panels
            .iter()
            .filter(|p| p.kind() == PanelKind::Terminal && !p.is_closed())
            .count()
    }

    fn has_open_session(&self, session_id: &str) -> bool {
        self.panels
            .iter()
            .any(|p| !p.is_closed() && p.session_id() == Some(session_id))
    }

    /// Open a new terminal panel for the given session. A panel for the
    /// same session may already be open; duplicates are supported, each
    /// with its own process and embedded window.
    pub fn create_panel(&mut self, session_id: &str) -> Result<Uuid> {
        let record = self
            .store
            .get(session_id)
            .cloned()
            .ok_or_else(|| TermdockError::SessionNotFound(session_id.to_string()))?;
        let dock_state = record.last_dock_state;
        self.create_panel_for(record, dock_state)
    }

    fn create_panel_for(&mut self, record: SessionRecord, dock_state: DockState) -> Result<Uuid> {
        let panel_id = Uuid::new_v4();
        let container = self.dock.create_container(&record.session_id, dock_state)?;

        info!(
            session = %record.session_id,
            args = %record.redacted_args().join(" "),
            "launching terminal"
        );

        let host = match ProcessHost::start(
            &self.terminal_exe,
            &record.launch_args(),
            panel_id,
            self.events.clone(),
        ) {
            Ok(host) => host,
            Err(e) => {
                self.dock.remove_container(container);
                return Err(e);
            }
        };

        let cancel = CancelToken::new();
        let embedded = match self.embedder.adopt(container, host.pid(), &cancel) {
            Ok(window) => window,
            Err(e) => {
                host.close();
                self.dock.remove_container(container);
                return Err(e);
            }
        };

        self.panels.push(DockPanel::terminal(
            panel_id, record, container, host, embedded, dock_state,
        ));
        Ok(panel_id)
    }

    /// Open the fixed session-tree panel; returns the existing one if it
    /// is already open.
    pub fn open_session_tree(&mut self) -> Result<Uuid> {
        if let Some(panel) = self
            .panels
            .iter()
            .find(|p| p.kind() == PanelKind::SessionTree && !p.is_closed())
        {
            return Ok(panel.id());
        }
        let container = self.dock.create_container("Sessions", DockState::DockRight)?;
        let panel = DockPanel::session_tree(container);
        let id = panel.id();
        self.panels.push(panel);
        Ok(id)
    }

    /// Record a dock-state change reported by the docking chrome
    pub fn set_panel_dock_state(&mut self, panel_id: Uuid, state: DockState) {
        if let Some(panel) = self.panels.iter_mut().find(|p| p.id() == panel_id) {
            panel.set_dock_state(state);
        }
    }

    /// Close a panel. Idempotent: closing an unknown or already-closed
    /// panel is a no-op, because a user close and a process-exit
    /// notification can both request it. The panel's last dock state is
    /// written back to the session record exactly once, and only if it
    /// changed and is not transient.
    pub fn close_panel(&mut self, panel_id: Uuid) -> Result<()> {
        let Some(panel) = self.panels.iter_mut().find(|p| p.id() == panel_id) else {
            return Ok(());
        };
        if !panel.close(&self.embedder) {
            return Ok(());
        }

        let container = panel.container();
        let dock_state = panel.dock_state();
        let session_id = panel.session_id().map(str::to_owned);

        self.dock.remove_container(container);
        self.panels.retain(|p| !p.is_closed());

        if let Some(session_id) = session_id {
            self.persist_dock_state(&session_id, dock_state)?;
        }
        Ok(())
    }

    fn persist_dock_state(&mut self, session_id: &str, state: DockState) -> Result<()> {
        if !state.is_persistable() {
            return Ok(());
        }
        // the session may have been deleted while the panel was open
        let Some(current) = self.store.get(session_id) else {
            return Ok(());
        };
        if current.last_dock_state == state {
            return Ok(());
        }
        let mut updated = current.clone();
        updated.last_dock_state = state;
        debug!(session = session_id, %state, "persisting last dock state");
        self.store.save(updated)
    }

    /// Close every open panel (host shutdown)
    pub fn close_all(&mut self) {
        let ids: Vec<Uuid> = self.panels.iter().map(|p| p.id()).collect();
        for id in ids {
            if let Err(e) = self.close_panel(id) {
                warn!(panel = %id, "close failed during shutdown: {}", e);
            }
        }
    }

    /// Handle a notification marshaled onto the UI thread
    pub fn handle_event(&mut self, event: UiEvent) -> Result<()> {
        match event {
            UiEvent::ProcessExited { panel_id } => {
                debug!(panel = %panel_id, "process exited; closing panel");
                self.close_panel(panel_id)
            }
        }
    }

    /// Re-fit every embedded window after a host frame resize
    pub fn sync_panel_geometry(&mut self) {
        let host_frame = self.host_frame;
        for panel in &mut self.panels {
            if let Err(e) = panel.on_container_resized(&self.embedder, host_frame) {
                warn!(panel = %panel.id(), "resize sync failed: {}", e);
            }
        }
    }

    /// Push focus to a panel's embedded window (active-document change),
    /// retrying once if the first attempt reports focus still needed.
    pub fn focus_panel(&mut self, panel_id: Uuid) {
        if let Some(panel) = self.panels.iter().find(|p| p.id() == panel_id) {
            if panel.refocus(&self.embedder) {
                let _ = panel.refocus(&self.embedder);
            }
        }
    }

    /// Snapshot the open panels (and host frame rectangle) as a layout
    /// document, in panel-creation order.
    pub fn serialize_layout(&self) -> LayoutDocument {
        LayoutDocument {
            frame: Some(self.winsys.window_rect(self.host_frame)),
            entries: self
                .panels
                .iter()
                .filter(|p| !p.is_closed())
                .map(|p| LayoutEntry {
                    persist_id: p.persist_id(),
                    dock_state: p.dock_state(),
                })
                .collect(),
        }
    }

    /// Materialize panels from a layout document, best-effort.
    pub fn restore_layout(&mut self, doc: &LayoutDocument) -> RestoreSummary {
        if let Some(rect) = doc.frame {
            if let Err(e) = self.winsys.move_window(self.host_frame, rect) {
                warn!("failed to restore frame rectangle: {}", e);
            }
        }

        let mut summary = RestoreSummary::default();
        for entry in &doc.entries {
            match entry.persist_id.panel_kind {
                PanelKind::SessionTree => match self.open_session_tree() {
                    Ok(_) => summary.trees += 1,
                    Err(e) => {
                        warn!("failed to restore session tree: {}", e);
                        summary.dropped += 1;
                    }
                },
                PanelKind::Terminal => {
                    let Some(session_id) = entry.persist_id.session_id.as_deref() else {
                        summary.dropped += 1;
                        continue;
                    };
                    let Some(record) = self.store.get(session_id).cloned() else {
                        debug!(session = session_id, "dropping stale layout entry");
                        summary.dropped += 1;
                        continue;
                    };
                    match self.create_panel_for(record, entry.dock_state) {
                        Ok(_) => summary.terminals += 1,
                        Err(e) => {
                            warn!(session = session_id, "failed to restore panel: {}", e);
                            summary.dropped += 1;
                        }
                    }
                }
            }
        }

        if summary.terminals == 0 {
            // never leave the user with an empty workspace
            if let Err(e) = self.open_session_tree() {
                warn!("failed to open session tree: {}", e);
            }
        }

        info!("{}", summary.describe());
        summary
    }

    /// Open panels for auto-start sessions that are not already open.
    /// Returns how many were started.
    pub fn start_auto_sessions(&mut self) -> usize {
        let pending: Vec<SessionRecord> = self
            .store
            .list()
            .iter()
            .filter(|r| r.auto_start && !self.has_open_session(&r.session_id))
            .cloned()
            .collect();

        let mut started = 0;
        for record in pending {
            let dock_state = record.last_dock_state;
            match self.create_panel_for(record.clone(), dock_state) {
                Ok(_) => started += 1,
                Err(e) => warn!(session = %record.session_id, "auto-start failed: {}", e),
            }
        }
        started
    }
}
