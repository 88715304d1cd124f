//! Dock panels
//!
//! A panel is one tab/tool window in the docking workspace. Terminal
//! panels own a hosted emulator process and the usage relation to its
//! embedded window; the session-tree panel is a fixed chrome panel with
//! neither. Closing is idempotent: a user-initiated close and a
//! process-exited notification can race, and the second close must be a
//! no-op.

use uuid::Uuid;

use termdock_session::{DockState, SessionRecord};
use termdock_utils::Result;

use crate::embed::WindowEmbedder;
use crate::layout::{PanelKind, PersistId};
use crate::process::ProcessHost;
use crate::winsys::{FrameState, WindowId};

pub struct DockPanel {
    id: Uuid,
    kind: PanelKind,
    session: Option<SessionRecord>,
    dock_state: DockState,
    container: WindowId,
    host: Option<ProcessHost>,
    embedded: Option<WindowId>,
    /// Host frame state cached from the previous resize event, used to
    /// detect the minimize→normal restore edge
    prev_frame_state: FrameState,
    closed: bool,
}

impl DockPanel {
    /// A terminal panel with its process and adopted window
    pub fn terminal(
        id: Uuid,
        session: SessionRecord,
        container: WindowId,
        host: ProcessHost,
        embedded: WindowId,
        dock_state: DockState,
    ) -> Self {
        Self {
            id,
            kind: PanelKind::Terminal,
            session: Some(session),
            dock_state,
            container,
            host: Some(host),
            embedded: Some(embedded),
            prev_frame_state: FrameState::Normal,
            closed: false,
        }
    }

    /// The fixed session-tree panel
    pub fn session_tree(container: WindowId) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind: PanelKind::SessionTree,
            session: None,
            dock_state: DockState::DockRight,
            container,
            host: None,
            embedded: None,
            prev_frame_state: FrameState::Normal,
            closed: false,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn kind(&self) -> PanelKind {
        self.kind
    }

    pub fn session(&self) -> Option<&SessionRecord> {
        self.session.as_ref()
    }

    pub fn session_id(&self) -> Option<&str> {
        self.session.as_ref().map(|s| s.session_id.as_str())
    }

    pub fn container(&self) -> WindowId {
        self.container
    }

    pub fn embedded(&self) -> Option<WindowId> {
        self.embedded
    }

    pub fn dock_state(&self) -> DockState {
        self.dock_state
    }

    /// Record a dock-state change coming from the docking chrome
    pub fn set_dock_state(&mut self, state: DockState) {
        self.dock_state = state;
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Persisted identity contributed to the layout document
    pub fn persist_id(&self) -> PersistId {
        match self.kind {
            PanelKind::SessionTree => PersistId::session_tree(),
            PanelKind::Terminal => PersistId::terminal(
                self.session_id().unwrap_or_default(),
            ),
        }
    }

    /// Container resize: re-fit the embedded window per the suspension
    /// rule, updating the cached host frame state. Returns whether a
    /// resize was applied.
    pub fn on_container_resized(
        &mut self,
        embedder: &WindowEmbedder,
        host_frame: WindowId,
    ) -> Result<bool> {
        let Some(window) = self.embedded else {
            return Ok(false);
        };
        let (resized, state) =
            embedder.sync_bounds(window, self.container, host_frame, self.prev_frame_state)?;
        self.prev_frame_state = state;
        Ok(resized)
    }

    /// Push focus back to the embedded window (active-panel change).
    /// Returns whether a focus change is still needed (see
    /// [`WindowEmbedder::refocus`]).
    pub fn refocus(&self, embedder: &WindowEmbedder) -> bool {
        match self.embedded {
            Some(window) => embedder.refocus(window),
            None => false,
        }
    }

    /// Close the panel: release the embedded window and end the hosted
    /// process. Idempotent; returns whether *this* call performed the
    /// close (the caller persists dock state only on that first close).
    pub fn close(&mut self, embedder: &WindowEmbedder) -> bool {
        if self.closed {
            return false;
        }
        self.closed = true;

        if let Some(window) = self.embedded.take() {
            embedder.detach(window);
        }
        if let Some(host) = self.host.take() {
            host.close();
        }
        true
    }
}
