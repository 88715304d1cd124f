//! WindowEmbedder: discovery, adoption, and geometry synchronization
//!
//! The emulator's top-level window does not exist at spawn time; discovery
//! polls the process's window list at a short fixed interval until the
//! recognized class appears, bounded by a deadline and a cancellation
//! token. Adoption reparents the window into the panel container, strips
//! its decorations, and sizes it to exactly fill the container's client
//! area. The embedder holds a usage relation only: teardown detaches the
//! window, it never destroys it; ending the owning process is what closes
//! the window.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, trace};

use termdock_utils::{Result, TermdockError};

use crate::winsys::{FrameState, Rect, WindowId, WindowSystem, EMBEDDED_STYLE_MASK};

/// Bounded retry policy for window discovery
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiscoveryPolicy {
    /// Sleep between enumeration attempts
    pub interval: Duration,
    /// Give up after this long
    pub deadline: Duration,
}

impl Default for DiscoveryPolicy {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(10),
            deadline: Duration::from_secs(10),
        }
    }
}

impl DiscoveryPolicy {
    pub fn new(interval: Duration, deadline: Duration) -> Self {
        Self { interval, deadline }
    }
}

/// Cancellation token for a discovery poll in progress
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Adopts foreign emulator windows and keeps them fitted to their container
pub struct WindowEmbedder {
    winsys: Arc<dyn WindowSystem>,
    class_name: String,
    policy: DiscoveryPolicy,
}

impl WindowEmbedder {
    pub fn new(winsys: Arc<dyn WindowSystem>, class_name: impl Into<String>, policy: DiscoveryPolicy) -> Self {
        Self {
            winsys,
            class_name: class_name.into(),
            policy,
        }
    }

    /// Discover the process's emulator window and adopt it into `container`.
    ///
    /// Blocks the calling (UI) thread for the discovery duration, sleeping
    /// at the policy interval between enumeration attempts.
    pub fn adopt(&self, container: WindowId, pid: u32, cancel: &CancelToken) -> Result<WindowId> {
        let window = self.discover(pid, cancel)?;
        debug!(?window, ?container, pid, "adopting emulator window");
        self.attach(window, container)?;
        Ok(window)
    }

    fn discover(&self, pid: u32, cancel: &CancelToken) -> Result<WindowId> {
        let start = Instant::now();
        loop {
            if cancel.is_cancelled() {
                return Err(TermdockError::DiscoveryCancelled);
            }
            if let Some(found) = self.find_window(pid) {
                return Ok(found);
            }
            if start.elapsed() >= self.policy.deadline {
                return Err(TermdockError::DiscoveryTimeout {
                    class: self.class_name.clone(),
                    pid,
                    millis: self.policy.deadline.as_millis() as u64,
                });
            }
            std::thread::sleep(self.policy.interval);
        }
    }

    fn find_window(&self, pid: u32) -> Option<WindowId> {
        self.winsys
            .top_level_windows_of(pid)
            .into_iter()
            .find(|w| self.winsys.class_name(*w) == self.class_name)
    }

    /// Reparent, maximize, strip decorations, fill the client area.
    /// The window must be shown before its style bits are rewritten.
    fn attach(&self, window: WindowId, container: WindowId) -> Result<()> {
        self.winsys.set_parent(window, container)?;
        self.winsys.show_maximized(window);

        let style = self.winsys.style(window);
        self.winsys.set_style(window, style & !EMBEDDED_STYLE_MASK);

        self.fit(window, container)
    }

    /// Size the embedded window to exactly cover the container's client area
    pub fn fit(&self, window: WindowId, container: WindowId) -> Result<()> {
        let client = self.winsys.client_rect(container);
        self.winsys
            .move_window(window, Rect::of_size(client.width, client.height))
    }

    /// Re-fit after a container resize, honoring the suspension rule.
    ///
    /// `previous` is the host frame state cached from the last resize event
    /// (kept per panel); the return value carries the state to cache next.
    /// Returns whether a resize was actually applied.
    pub fn sync_bounds(
        &self,
        window: WindowId,
        container: WindowId,
        host_frame: WindowId,
        previous: FrameState,
    ) -> Result<(bool, FrameState)> {
        let state = self.winsys.frame_state(host_frame);
        let visible = self.winsys.is_visible(host_frame);

        if should_resize(visible, state, previous) {
            self.fit(window, container)?;
            trace!(?window, "embedded window re-fitted");
            Ok((true, state))
        } else {
            trace!(?window, ?state, "resize suspended");
            Ok((false, state))
        }
    }

    /// Push foreground focus to the embedded window. Returns true when a
    /// focus change is *still needed* after the attempt, i.e. the window
    /// was not foreground and the OS refused to make it so. The caller
    /// may retry.
    pub fn refocus(&self, window: WindowId) -> bool {
        self.winsys.foreground_window() != Some(window) && !self.winsys.set_foreground(window)
    }

    /// Release the usage relation: hand the window back to the desktop.
    /// Never destroys it: the window's lifetime belongs to its process.
    pub fn detach(&self, window: WindowId) {
        if self.winsys.is_window(window) {
            if let Err(e) = self.winsys.detach(window) {
                debug!(?window, "detach failed: {}", e);
            }
        }
    }

    /// Forward a system-menu verb (emulator menu passthrough) to the
    /// embedded window.
    pub fn send_system_command(&self, window: WindowId, command: u32) {
        self.winsys.post_system_command(window, command);
    }
}

/// Geometry suspension rule: re-fit only while the host frame is visible
/// and in the normal state, and not on the restore edge out of a minimize.
/// Suspension covers geometry only; focus is never suspended.
pub fn should_resize(host_visible: bool, state: FrameState, previous: FrameState) -> bool {
    host_visible
        && state != FrameState::Maximized
        && state != FrameState::Minimized
        && !(previous == FrameState::Minimized && state == FrameState::Normal)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::winsys::mock::MockWindowSystem;
    use crate::winsys::{WS_BORDER, WS_THICKFRAME, WS_VSCROLL};

    const PID: u32 = 4242;

    fn fast_policy() -> DiscoveryPolicy {
        DiscoveryPolicy::new(Duration::from_millis(1), Duration::from_millis(50))
    }

    fn embedder(ws: &Arc<MockWindowSystem>) -> WindowEmbedder {
        WindowEmbedder::new(ws.clone() as Arc<dyn WindowSystem>, "PuTTY", fast_policy())
    }

    // ==================== Discovery Tests ====================

    #[test]
    fn test_adopt_finds_window_by_class() {
        let ws = Arc::new(MockWindowSystem::new());
        let container = ws.add_window("container");
        ws.add_process_window(PID, "ConsoleWindowClass");
        let terminal = ws.add_process_window(PID, "PuTTY");

        let adopted = embedder(&ws)
            .adopt(container, PID, &CancelToken::new())
            .unwrap();
        assert_eq!(adopted, terminal);
    }

    #[test]
    fn test_adopt_ignores_other_processes() {
        let ws = Arc::new(MockWindowSystem::new());
        let container = ws.add_window("container");
        ws.add_process_window(7777, "PuTTY");

        let err = embedder(&ws)
            .adopt(container, PID, &CancelToken::new())
            .err()
            .unwrap();
        assert!(matches!(err, TermdockError::DiscoveryTimeout { pid: PID, .. }));
    }

    #[test]
    fn test_discovery_waits_for_late_window() {
        let ws = Arc::new(MockWindowSystem::new());
        let container = ws.add_window("container");

        let late = ws.clone();
        let spawner = std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(15));
            late.add_process_window(PID, "PuTTY")
        });

        let embedder = WindowEmbedder::new(
            ws.clone() as Arc<dyn WindowSystem>,
            "PuTTY",
            DiscoveryPolicy::new(Duration::from_millis(1), Duration::from_secs(2)),
        );
        let adopted = embedder.adopt(container, PID, &CancelToken::new()).unwrap();
        assert_eq!(adopted, spawner.join().unwrap());
    }

    #[test]
    fn test_discovery_timeout() {
        let ws = Arc::new(MockWindowSystem::new());
        let container = ws.add_window("container");

        let err = embedder(&ws)
            .adopt(container, PID, &CancelToken::new())
            .err()
            .unwrap();
        assert!(matches!(err, TermdockError::DiscoveryTimeout { .. }));
        assert!(err.is_recoverable());
    }

    #[test]
    fn test_discovery_cancel() {
        let ws = Arc::new(MockWindowSystem::new());
        let container = ws.add_window("container");
        let cancel = CancelToken::new();
        cancel.cancel();

        let err = embedder(&ws).adopt(container, PID, &cancel).err().unwrap();
        assert!(matches!(err, TermdockError::DiscoveryCancelled));
    }

    // ==================== Adoption Tests ====================

    #[test]
    fn test_adopt_reparents_maximizes_and_strips_styles() {
        let ws = Arc::new(MockWindowSystem::new());
        let container = ws.add_window("container");
        ws.set_client_rect(container, Rect::of_size(640, 400));
        let terminal = ws.add_process_window(PID, "PuTTY");

        let adopted = embedder(&ws)
            .adopt(container, PID, &CancelToken::new())
            .unwrap();

        assert_eq!(ws.parent_of(adopted), Some(container));
        assert!(ws.was_shown_maximized(adopted));

        let style = ws.style_of(adopted);
        assert_eq!(style & WS_BORDER, 0);
        assert_eq!(style & WS_THICKFRAME, 0);
        assert_eq!(style & WS_VSCROLL, 0);

        assert_eq!(ws.bounds_of(adopted), Rect::of_size(640, 400));
        let _ = terminal;
    }

    // ==================== Resize Synchronization Tests ====================

    fn adopted_setup() -> (Arc<MockWindowSystem>, WindowEmbedder, WindowId, WindowId, WindowId) {
        let ws = Arc::new(MockWindowSystem::new());
        let frame = ws.add_window("frame");
        let container = ws.add_child("container", frame);
        ws.set_client_rect(container, Rect::of_size(640, 400));
        ws.add_process_window(PID, "PuTTY");

        let embedder = embedder(&ws);
        let window = embedder.adopt(container, PID, &CancelToken::new()).unwrap();
        (ws, embedder, frame, container, window)
    }

    #[test]
    fn test_resize_in_normal_state_fits_client_area() {
        let (ws, embedder, frame, container, window) = adopted_setup();
        ws.set_client_rect(container, Rect::of_size(1024, 700));

        let (resized, state) = embedder
            .sync_bounds(window, container, frame, FrameState::Normal)
            .unwrap();
        assert!(resized);
        assert_eq!(state, FrameState::Normal);
        assert_eq!(ws.bounds_of(window), Rect::of_size(1024, 700));
    }

    #[test]
    fn test_resize_while_minimized_is_suspended() {
        let (ws, embedder, frame, container, window) = adopted_setup();
        let before = ws.bounds_of(window);

        ws.set_frame_state(frame, FrameState::Minimized);
        ws.set_client_rect(container, Rect::of_size(10, 10));

        let (resized, state) = embedder
            .sync_bounds(window, container, frame, FrameState::Normal)
            .unwrap();
        assert!(!resized);
        assert_eq!(state, FrameState::Minimized);
        assert_eq!(ws.bounds_of(window), before);
    }

    #[test]
    fn test_resize_while_maximized_is_suspended() {
        let (ws, embedder, frame, container, window) = adopted_setup();
        let before = ws.bounds_of(window);

        ws.set_frame_state(frame, FrameState::Maximized);
        ws.set_client_rect(container, Rect::of_size(1920, 1080));

        let (resized, _) = embedder
            .sync_bounds(window, container, frame, FrameState::Normal)
            .unwrap();
        assert!(!resized);
        assert_eq!(ws.bounds_of(window), before);
    }

    #[test]
    fn test_restore_from_minimize_skips_one_resize() {
        let (ws, embedder, frame, container, window) = adopted_setup();
        ws.set_client_rect(container, Rect::of_size(900, 500));

        // the first resize event after restoring out of a minimize is
        // suppressed; the next one applies
        let (resized, state) = embedder
            .sync_bounds(window, container, frame, FrameState::Minimized)
            .unwrap();
        assert!(!resized);

        let (resized, _) = embedder
            .sync_bounds(window, container, frame, state)
            .unwrap();
        assert!(resized);
        assert_eq!(ws.bounds_of(window), Rect::of_size(900, 500));
    }

    #[test]
    fn test_resize_with_hidden_host_is_suspended() {
        let (ws, embedder, frame, container, window) = adopted_setup();
        ws.set_visible(frame, false);

        let (resized, _) = embedder
            .sync_bounds(window, container, frame, FrameState::Normal)
            .unwrap();
        assert!(!resized);
    }

    #[test]
    fn test_should_resize_table() {
        use FrameState::*;
        // (visible, current, previous) -> expected
        let cases = [
            (true, Normal, Normal, true),
            (true, Normal, Maximized, true),
            (true, Normal, Minimized, false),
            (true, Minimized, Normal, false),
            (true, Maximized, Normal, false),
            (false, Normal, Normal, false),
        ];
        for (visible, state, previous, expected) in cases {
            assert_eq!(
                should_resize(visible, state, previous),
                expected,
                "visible={} state={:?} previous={:?}",
                visible,
                state,
                previous
            );
        }
    }

    // ==================== Focus Tests ====================

    #[test]
    fn test_refocus_noop_when_already_foreground() {
        let (ws, embedder, _, _, window) = adopted_setup();
        ws.set_foreground_window(Some(window));
        assert!(!embedder.refocus(window));
    }

    #[test]
    fn test_refocus_succeeds() {
        let (ws, embedder, frame, _, window) = adopted_setup();
        ws.set_foreground_window(Some(frame));
        assert!(!embedder.refocus(window));
        assert_eq!(ws.foreground_window(), Some(window));
    }

    #[test]
    fn test_refocus_reports_when_still_needed() {
        let (ws, embedder, frame, _, window) = adopted_setup();
        ws.set_foreground_window(Some(frame));
        ws.refuse_foreground(true);
        // focus change attempted and refused: still needed
        assert!(embedder.refocus(window));
    }

    // ==================== Teardown Tests ====================

    #[test]
    fn test_detach_releases_but_does_not_destroy() {
        let (ws, embedder, _, _, window) = adopted_setup();
        embedder.detach(window);
        assert_eq!(ws.parent_of(window), None);
        assert!(ws.is_window(window));
    }

    #[test]
    fn test_detach_dead_window_is_noop() {
        let (ws, embedder, _, _, window) = adopted_setup();
        ws.destroy_window(window);
        embedder.detach(window);
    }

    #[test]
    fn test_send_system_command() {
        let (ws, embedder, _, _, window) = adopted_setup();
        embedder.send_system_command(window, 0xF120);
        assert_eq!(ws.system_commands(), vec![(window, 0xF120)]);
    }
}
