//! In-memory window system for tests
//!
//! Models just enough of a window tree to exercise embedding, geometry
//! synchronization, and focus arbitration without a display.

use std::collections::HashMap;

use parking_lot::Mutex;

use termdock_utils::{Result, TermdockError};

use super::{FrameState, Rect, WindowId, WindowSystem, WS_BORDER, WS_THICKFRAME, WS_VSCROLL};

#[derive(Debug, Clone)]
struct MockWindow {
    class: String,
    parent: Option<WindowId>,
    style: u32,
    bounds: Rect,
    client: Option<Rect>,
    frame_state: FrameState,
    visible: bool,
    alive: bool,
    shown_maximized: bool,
    /// `None` matches any pid (used when the spawned pid is not known
    /// to the test up front)
    pid: Option<u32>,
    top_level: bool,
}

#[derive(Default)]
struct MockState {
    windows: HashMap<WindowId, MockWindow>,
    next_id: isize,
    foreground: Option<WindowId>,
    refuse_foreground: bool,
    system_commands: Vec<(WindowId, u32)>,
    wakes: usize,
}

/// Test double for [`WindowSystem`]
#[derive(Default)]
pub struct MockWindowSystem {
    state: Mutex<MockState>,
}

impl MockWindowSystem {
    pub fn new() -> Self {
        Self::default()
    }

    fn insert(&self, window: MockWindow) -> WindowId {
        let mut state = self.state.lock();
        state.next_id += 1;
        let id = WindowId(state.next_id);
        state.windows.insert(id, window);
        id
    }

    fn blank(class: &str) -> MockWindow {
        MockWindow {
            class: class.to_string(),
            parent: None,
            style: WS_BORDER | WS_THICKFRAME | WS_VSCROLL,
            bounds: Rect::of_size(800, 600),
            client: None,
            frame_state: FrameState::Normal,
            visible: true,
            alive: true,
            shown_maximized: false,
            pid: None,
            top_level: false,
        }
    }

    /// Add a top-level window not owned by any tracked process
    pub fn add_window(&self, class: &str) -> WindowId {
        self.insert(MockWindow {
            top_level: false,
            ..Self::blank(class)
        })
    }

    /// Add a top-level window owned by the given process id
    pub fn add_process_window(&self, pid: u32, class: &str) -> WindowId {
        self.insert(MockWindow {
            pid: Some(pid),
            top_level: true,
            ..Self::blank(class)
        })
    }

    /// Add a top-level window that matches any queried process id
    pub fn add_wildcard_window(&self, class: &str) -> WindowId {
        self.insert(MockWindow {
            top_level: true,
            ..Self::blank(class)
        })
    }

    /// Add a child window under `parent`
    pub fn add_child(&self, class: &str, parent: WindowId) -> WindowId {
        self.insert(MockWindow {
            parent: Some(parent),
            ..Self::blank(class)
        })
    }

    pub fn set_client_rect(&self, window: WindowId, rect: Rect) {
        if let Some(w) = self.state.lock().windows.get_mut(&window) {
            w.client = Some(rect);
        }
    }

    pub fn set_frame_state(&self, window: WindowId, state: FrameState) {
        if let Some(w) = self.state.lock().windows.get_mut(&window) {
            w.frame_state = state;
        }
    }

    pub fn set_visible(&self, window: WindowId, visible: bool) {
        if let Some(w) = self.state.lock().windows.get_mut(&window) {
            w.visible = visible;
        }
    }

    pub fn set_foreground_window(&self, window: Option<WindowId>) {
        self.state.lock().foreground = window;
    }

    /// Make subsequent `set_foreground` calls fail (focus refused by the OS)
    pub fn refuse_foreground(&self, refuse: bool) {
        self.state.lock().refuse_foreground = refuse;
    }

    /// Destroy a window (the owning process exited)
    pub fn destroy_window(&self, window: WindowId) {
        if let Some(w) = self.state.lock().windows.get_mut(&window) {
            w.alive = false;
        }
    }

    pub fn parent_of(&self, window: WindowId) -> Option<WindowId> {
        self.state.lock().windows.get(&window).and_then(|w| w.parent)
    }

    pub fn bounds_of(&self, window: WindowId) -> Rect {
        self.state
            .lock()
            .windows
            .get(&window)
            .map(|w| w.bounds)
            .unwrap_or_default()
    }

    pub fn style_of(&self, window: WindowId) -> u32 {
        self.state.lock().windows.get(&window).map(|w| w.style).unwrap_or(0)
    }

    pub fn was_shown_maximized(&self, window: WindowId) -> bool {
        self.state
            .lock()
            .windows
            .get(&window)
            .map(|w| w.shown_maximized)
            .unwrap_or(false)
    }

    pub fn system_commands(&self) -> Vec<(WindowId, u32)> {
        self.state.lock().system_commands.clone()
    }

    pub fn wake_count(&self) -> usize {
        self.state.lock().wakes
    }
}

impl WindowSystem for MockWindowSystem {
    fn top_level_windows_of(&self, pid: u32) -> Vec<WindowId> {
        let state = self.state.lock();
        let mut ids: Vec<_> = state
            .windows
            .iter()
            .filter(|(_, w)| {
                w.alive && w.top_level && w.parent.is_none() && w.pid.map_or(true, |p| p == pid)
            })
            .map(|(id, _)| *id)
            .collect();
        ids.sort_by_key(|id| id.0);
        ids
    }

    fn class_name(&self, window: WindowId) -> String {
        self.state
            .lock()
            .windows
            .get(&window)
            .map(|w| w.class.clone())
            .unwrap_or_default()
    }

    fn is_window(&self, window: WindowId) -> bool {
        self.state.lock().windows.get(&window).map(|w| w.alive).unwrap_or(false)
    }

    fn parent(&self, window: WindowId) -> Option<WindowId> {
        self.state.lock().windows.get(&window).and_then(|w| w.parent)
    }

    fn set_parent(&self, child: WindowId, parent: WindowId) -> Result<()> {
        let mut state = self.state.lock();
        let window = state
            .windows
            .get_mut(&child)
            .filter(|w| w.alive)
            .ok_or_else(|| TermdockError::window("set_parent on dead window"))?;
        window.parent = Some(parent);
        Ok(())
    }

    fn detach(&self, child: WindowId) -> Result<()> {
        let mut state = self.state.lock();
        let window = state
            .windows
            .get_mut(&child)
            .filter(|w| w.alive)
            .ok_or_else(|| TermdockError::window("detach on dead window"))?;
        window.parent = None;
        Ok(())
    }

    fn show_maximized(&self, window: WindowId) {
        if let Some(w) = self.state.lock().windows.get_mut(&window) {
            w.shown_maximized = true;
            w.visible = true;
        }
    }

    fn style(&self, window: WindowId) -> u32 {
        self.style_of(window)
    }

    fn set_style(&self, window: WindowId, style: u32) {
        if let Some(w) = self.state.lock().windows.get_mut(&window) {
            w.style = style;
        }
    }

    fn move_window(&self, window: WindowId, bounds: Rect) -> Result<()> {
        let mut state = self.state.lock();
        let w = state
            .windows
            .get_mut(&window)
            .filter(|w| w.alive)
            .ok_or_else(|| TermdockError::window("move_window on dead window"))?;
        w.bounds = bounds;
        Ok(())
    }

    fn client_rect(&self, window: WindowId) -> Rect {
        let state = self.state.lock();
        state
            .windows
            .get(&window)
            .map(|w| {
                w.client
                    .unwrap_or_else(|| Rect::of_size(w.bounds.width, w.bounds.height))
            })
            .unwrap_or_default()
    }

    fn window_rect(&self, window: WindowId) -> Rect {
        self.bounds_of(window)
    }

    fn frame_state(&self, window: WindowId) -> FrameState {
        self.state
            .lock()
            .windows
            .get(&window)
            .map(|w| w.frame_state)
            .unwrap_or_default()
    }

    fn is_visible(&self, window: WindowId) -> bool {
        self.state.lock().windows.get(&window).map(|w| w.visible).unwrap_or(false)
    }

    fn foreground_window(&self) -> Option<WindowId> {
        self.state.lock().foreground
    }

    fn set_foreground(&self, window: WindowId) -> bool {
        let mut state = self.state.lock();
        if state.refuse_foreground {
            return false;
        }
        state.foreground = Some(window);
        true
    }

    fn post_system_command(&self, window: WindowId, command: u32) {
        self.state.lock().system_commands.push((window, command));
    }

    fn post_wake(&self, _window: WindowId) {
        self.state.lock().wakes += 1;
    }
}
