//! Window-system layer
//!
//! Everything the host does to OS windows goes through the [`WindowSystem`]
//! trait: enumerating a process's top-level windows, reparenting, restyling,
//! moving, and foreground arbitration. The Win32 backend lives in
//! [`win32`]; tests use the in-memory mock. Window handles are opaque: the
//! host holds a usage relation to foreign windows, never ownership.

#[cfg(test)]
pub mod mock;
#[cfg(windows)]
pub mod win32;

use std::fmt;

use termdock_utils::Result;

/// Opaque OS window identifier
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct WindowId(pub isize);

impl fmt::Debug for WindowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "WindowId(0x{:x})", self.0)
    }
}

/// Rectangle in pixels; screen or client coordinates depending on context
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Rect {
    pub fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self { x, y, width, height }
    }

    /// A rectangle at the origin with the given size
    pub fn of_size(width: i32, height: i32) -> Self {
        Self { x: 0, y: 0, width, height }
    }
}

/// Presentation state of a top-level window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FrameState {
    #[default]
    Normal,
    Minimized,
    Maximized,
}

// Win32 window style bits
pub const WS_BORDER: u32 = 0x0080_0000;
pub const WS_THICKFRAME: u32 = 0x0004_0000;
pub const WS_VSCROLL: u32 = 0x0020_0000;

/// Decoration bits stripped from an adopted window so it renders as a
/// borderless fill of its container
pub const EMBEDDED_STYLE_MASK: u32 = WS_BORDER | WS_THICKFRAME | WS_VSCROLL;

/// Capability surface over the OS window tree.
///
/// Implementations are cheap handles; all methods take `&self` and the
/// backend carries no per-window state.
pub trait WindowSystem: Send + Sync {
    /// Top-level windows owned by the given process id
    fn top_level_windows_of(&self, pid: u32) -> Vec<WindowId>;

    /// Window class name, empty if unavailable
    fn class_name(&self, window: WindowId) -> String;

    /// Whether the handle still refers to a live window
    fn is_window(&self, window: WindowId) -> bool;

    /// Parent (or owner) link, `None` at the top of the chain
    fn parent(&self, window: WindowId) -> Option<WindowId>;

    /// Reparent `child` under `parent`
    fn set_parent(&self, child: WindowId, parent: WindowId) -> Result<()>;

    /// Release a previously reparented window back to the desktop
    fn detach(&self, child: WindowId) -> Result<()>;

    /// Force the window into the maximized presentation state
    fn show_maximized(&self, window: WindowId);

    /// Window style bits
    fn style(&self, window: WindowId) -> u32;

    /// Replace the window style bits
    fn set_style(&self, window: WindowId, style: u32);

    /// Move/resize relative to the parent's client area
    fn move_window(&self, window: WindowId, bounds: Rect) -> Result<()>;

    /// Client-area rectangle (origin is always 0,0)
    fn client_rect(&self, window: WindowId) -> Rect;

    /// Screen rectangle of the window including decorations
    fn window_rect(&self, window: WindowId) -> Rect;

    /// Minimized/maximized/normal state of a top-level window
    fn frame_state(&self, window: WindowId) -> FrameState;

    /// Whether the window is currently visible
    fn is_visible(&self, window: WindowId) -> bool;

    /// The window that currently has foreground focus
    fn foreground_window(&self) -> Option<WindowId>;

    /// Attempt to give the window foreground focus; false if refused
    fn set_foreground(&self, window: WindowId) -> bool;

    /// Post a WM_SYSCOMMAND verb to the window without waiting
    fn post_system_command(&self, window: WindowId, command: u32);

    /// Post a no-op message to wake the window's event loop
    fn post_wake(&self, window: WindowId);
}

/// Walk `candidate`'s ancestor chain and report whether `root` appears in
/// it. This is the "is the host frame tree foreground" test: the foreground
/// window may be a descendant (an embedded terminal) of the host's window
/// tree, so an exact handle comparison is not enough.
pub fn is_in_window_tree(ws: &dyn WindowSystem, root: WindowId, candidate: WindowId) -> bool {
    let mut current = Some(candidate);
    let mut hops = 0;
    while let Some(window) = current {
        if window == root {
            return true;
        }
        // guard against parent-link cycles in a hostile window tree
        hops += 1;
        if hops > 64 {
            return false;
        }
        current = ws.parent(window);
    }
    false
}
