//! Global input hook service
//!
//! A single process-wide pair of low-level interceptors (one keyboard,
//! one mouse) installed exactly once at startup and removed exactly once
//! at shutdown. The hooks observe and react but never swallow: every event
//! is passed to the next hook in the chain. Arbitration itself is a pair
//! of pure decision functions so it can be tested without installing
//! anything.
//!
//! Keyboard: a shift system-key-down while the host frame tree is
//! foreground surfaces the auto-hidden menu and focuses it; that is how
//! the menu is reached while an embedded terminal owns the keyboard.
//! Mouse: a left/right button-up while the host frame tree is foreground
//! raises the host frame and, unless the pointer sits over the menu, hands
//! focus to the docking container so an embedded terminal cannot silently
//! steal z-order.

use std::sync::Arc;

use tracing::{info, warn};

use termdock_utils::{Result, TermdockError};

use crate::winsys::{is_in_window_tree, WindowId, WindowSystem};

// Hook-observed message and key codes (Win32 values)
pub const WM_SYSKEYDOWN: u32 = 0x0104;
pub const WM_LBUTTONUP: u32 = 0x0202;
pub const WM_RBUTTONUP: u32 = 0x0205;
pub const VK_SHIFT: u32 = 0x10;
pub const VK_LSHIFT: u32 = 0xA0;

/// Host-chrome actions the arbitration can request
pub trait FocusSink: Send + Sync {
    /// Make the (auto-hidden) menu visible and give it focus
    fn surface_menu(&self);
    /// Bring the host frame to the front of the z-order
    fn raise_host(&self);
    /// Hand keyboard focus to the docking container
    fn focus_dock(&self);
    /// Whether the pointer is currently over the menu or an open submenu
    fn pointer_over_menu(&self) -> bool;
}

/// Outcome of observing one keyboard event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyboardAction {
    SurfaceMenu,
    Pass,
}

/// Outcome of observing one mouse event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MouseAction {
    RaiseHost { focus_dock: bool },
    Pass,
}

/// Pure keyboard arbitration. `code` is the hook-chain processing code;
/// negative codes must pass through uninspected per the chain contract.
pub fn keyboard_decision(
    code: i32,
    message: u32,
    virtual_key: u32,
    host_tree_foreground: bool,
) -> KeyboardAction {
    if code >= 0
        && message == WM_SYSKEYDOWN
        && host_tree_foreground
        && matches!(virtual_key, VK_SHIFT | VK_LSHIFT)
    {
        KeyboardAction::SurfaceMenu
    } else {
        KeyboardAction::Pass
    }
}

/// Pure mouse arbitration, same chain contract as [`keyboard_decision`].
pub fn mouse_decision(
    code: i32,
    message: u32,
    host_tree_foreground: bool,
    pointer_over_menu: bool,
) -> MouseAction {
    if code >= 0
        && matches!(message, WM_LBUTTONUP | WM_RBUTTONUP)
        && host_tree_foreground
    {
        MouseAction::RaiseHost {
            focus_dock: !pointer_over_menu,
        }
    } else {
        MouseAction::Pass
    }
}

/// Shared state the platform hook callbacks dispatch against
pub(crate) struct HookShared {
    winsys: Arc<dyn WindowSystem>,
    frame: WindowId,
    sink: Arc<dyn FocusSink>,
}

impl HookShared {
    fn host_tree_foreground(&self) -> bool {
        self.winsys
            .foreground_window()
            .map(|fg| is_in_window_tree(&*self.winsys, self.frame, fg))
            .unwrap_or(false)
    }

    pub(crate) fn on_keyboard(&self, code: i32, message: u32, virtual_key: u32) {
        let action = keyboard_decision(code, message, virtual_key, self.host_tree_foreground());
        if action == KeyboardAction::SurfaceMenu {
            self.sink.surface_menu();
        }
    }

    pub(crate) fn on_mouse(&self, code: i32, message: u32) {
        let action = mouse_decision(
            code,
            message,
            self.host_tree_foreground(),
            self.sink.pointer_over_menu(),
        );
        if let MouseAction::RaiseHost { focus_dock } = action {
            self.sink.raise_host();
            if focus_dock {
                self.sink.focus_dock();
            }
        }
    }
}

/// Owns the process-wide hook pair. One instance per application; install
/// failure is non-fatal (focus arbitration degrades to nothing) but is
/// returned so the caller can log it.
pub struct InputHookService {
    winsys: Arc<dyn WindowSystem>,
    frame: WindowId,
    sink: Arc<dyn FocusSink>,
    installed: bool,
}

impl InputHookService {
    pub fn new(winsys: Arc<dyn WindowSystem>, frame: WindowId, sink: Arc<dyn FocusSink>) -> Self {
        Self {
            winsys,
            frame,
            sink,
            installed: false,
        }
    }

    /// Install both interceptors. Errors if already installed or if the OS
    /// refuses either hook (in which case neither stays installed).
    pub fn install(&mut self) -> Result<()> {
        if self.installed {
            return Err(TermdockError::hook("hooks already installed"));
        }
        platform::install(HookShared {
            winsys: self.winsys.clone(),
            frame: self.frame,
            sink: self.sink.clone(),
        })?;
        self.installed = true;
        info!("global input hooks installed");
        Ok(())
    }

    /// Remove both interceptors; a no-op when not installed.
    pub fn uninstall(&mut self) {
        if self.installed {
            platform::uninstall();
            self.installed = false;
            info!("global input hooks removed");
        }
    }

    pub fn is_installed(&self) -> bool {
        self.installed
    }
}

impl Drop for InputHookService {
    fn drop(&mut self) {
        if self.installed {
            warn!("input hook service dropped while installed; removing hooks");
            self.uninstall();
        }
    }
}

#[cfg(windows)]
mod platform {
    //! Win32 low-level hook plumbing.
    //!
    //! Hook callbacks carry no user data, so the shared state lives in a
    //! process-wide slot. The callbacks run on the installing (UI) thread's
    //! message loop.

    use std::sync::atomic::{AtomicIsize, Ordering::SeqCst};
    use std::sync::Arc;

    use parking_lot::Mutex;

    use windows::Win32::Foundation::{HINSTANCE, LPARAM, LRESULT, WPARAM};
    use windows::Win32::System::LibraryLoader::GetModuleHandleW;
    use windows::Win32::UI::WindowsAndMessaging::{
        CallNextHookEx, SetWindowsHookExW, UnhookWindowsHookEx, HHOOK, KBDLLHOOKSTRUCT,
        WH_KEYBOARD_LL, WH_MOUSE_LL,
    };

    use termdock_utils::{Result, TermdockError};

    use super::HookShared;

    static SHARED: Mutex<Option<Arc<HookShared>>> = Mutex::new(None);
    static KB_HOOK: AtomicIsize = AtomicIsize::new(0);
    static MOUSE_HOOK: AtomicIsize = AtomicIsize::new(0);

    fn shared() -> Option<Arc<HookShared>> {
        SHARED.lock().clone()
    }

    pub(super) fn install(state: HookShared) -> Result<()> {
        let module = unsafe { GetModuleHandleW(None) }
            .map_err(|e| TermdockError::hook(format!("GetModuleHandle failed: {}", e)))?;
        let hinst: HINSTANCE = module.into();

        let kb = unsafe { SetWindowsHookExW(WH_KEYBOARD_LL, Some(keyboard_proc), hinst, 0) }
            .map_err(|e| TermdockError::hook(format!("keyboard hook refused: {}", e)))?;

        let mouse = match unsafe {
            SetWindowsHookExW(WH_MOUSE_LL, Some(mouse_proc), hinst, 0)
        } {
            Ok(handle) => handle,
            Err(e) => {
                unsafe {
                    let _ = UnhookWindowsHookEx(kb);
                }
                return Err(TermdockError::hook(format!("mouse hook refused: {}", e)));
            }
        };

        KB_HOOK.store(kb.0 as isize, SeqCst);
        MOUSE_HOOK.store(mouse.0 as isize, SeqCst);
        *SHARED.lock() = Some(Arc::new(state));
        Ok(())
    }

    pub(super) fn uninstall() {
        *SHARED.lock() = None;
        let kb = KB_HOOK.swap(0, SeqCst);
        let mouse = MOUSE_HOOK.swap(0, SeqCst);
        unsafe {
            if kb != 0 {
                let _ = UnhookWindowsHookEx(HHOOK(kb as *mut _));
            }
            if mouse != 0 {
                let _ = UnhookWindowsHookEx(HHOOK(mouse as *mut _));
            }
        }
    }

    unsafe extern "system" fn keyboard_proc(code: i32, wparam: WPARAM, lparam: LPARAM) -> LRESULT {
        if let Some(state) = shared() {
            let kbd = &*(lparam.0 as *const KBDLLHOOKSTRUCT);
            state.on_keyboard(code, wparam.0 as u32, kbd.vkCode);
        }
        // observe only; always hand the event to the next hook
        let hook = HHOOK(KB_HOOK.load(SeqCst) as *mut _);
        CallNextHookEx(hook, code, wparam, lparam)
    }

    unsafe extern "system" fn mouse_proc(code: i32, wparam: WPARAM, lparam: LPARAM) -> LRESULT {
        if let Some(state) = shared() {
            state.on_mouse(code, wparam.0 as u32);
        }
        let hook = HHOOK(MOUSE_HOOK.load(SeqCst) as *mut _);
        CallNextHookEx(hook, code, wparam, lparam)
    }
}

#[cfg(not(windows))]
mod platform {
    //! Low-level hooks only exist on the targeted desktop; elsewhere the
    //! service degrades to the documented no-arbitration mode.

    use termdock_utils::{Result, TermdockError};

    use super::HookShared;

    pub(super) fn install(_state: HookShared) -> Result<()> {
        Err(TermdockError::hook(
            "low-level input hooks are unavailable on this platform",
        ))
    }

    pub(super) fn uninstall() {}
}
